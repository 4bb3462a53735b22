//! Static-then-dynamic discovery.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use savescout_paths::{CompatTranslator, ExpandContext, OsStrategy, TargetOs, expand};
use savescout_save_watch::{
    ObserverConfig, ProcessSupervisor, RuntimeWriteObserver, SystemSupervisor, WatchError,
    WatchPlan,
};
use savescout_wiki::{PageSource, is_app_id, parse_page};
use tokio::sync::{Mutex, oneshot};

use crate::DiscoveryError;
use crate::reporter::{DiscoveryEvent, NoopReporter, Reporter, Step};
use crate::types::{Degradation, DiscoveryResult, ResolutionStrategy, SaveLocationCandidate};

/// Finds where a game keeps its saves.
///
/// Cloning is cheap; clones share the dynamic-run lock, so at most one
/// game runs under observation per session.
#[derive(Clone)]
pub struct Discovery {
    source: Arc<dyn PageSource>,
    strategy: Arc<dyn OsStrategy>,
    compat: Option<CompatTranslator>,
    supervisor: Arc<dyn ProcessSupervisor>,
    observer: ObserverConfig,
    reporter: Arc<dyn Reporter>,
    account_hint: Option<String>,
    dynamic: bool,
    session: Arc<Mutex<()>>,
}

impl Discovery {
    /// Creates a discovery session expanding for `strategy`'s system.
    ///
    /// On systems that run Windows games through Proton, Windows
    /// templates are also translated into the game's prefix.
    pub fn new(source: Arc<dyn PageSource>, strategy: Arc<dyn OsStrategy>) -> Self {
        let compat = strategy
            .translates_windows()
            .then(|| CompatTranslator::from_host(strategy.host()));
        Self {
            source,
            strategy,
            compat,
            supervisor: Arc::new(SystemSupervisor),
            observer: ObserverConfig::default(),
            reporter: Arc::new(NoopReporter),
            account_hint: None,
            dynamic: true,
            session: Arc::new(Mutex::new(())),
        }
    }

    /// Replaces the prefix translator, or disables translation with `None`.
    pub fn with_compat(mut self, compat: Option<CompatTranslator>) -> Self {
        self.compat = compat;
        self
    }

    pub fn with_supervisor(mut self, supervisor: Arc<dyn ProcessSupervisor>) -> Self {
        self.supervisor = supervisor;
        self
    }

    pub fn with_observer_config(mut self, config: ObserverConfig) -> Self {
        self.observer = config;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Account folder name used when none can be found on disk.
    pub fn with_account_hint(mut self, hint: Option<String>) -> Self {
        self.account_hint = hint;
        self
    }

    /// Enables or disables the supervised-run fallback.
    pub fn with_dynamic(mut self, enabled: bool) -> Self {
        self.dynamic = enabled;
        self
    }

    fn emit(&self, event: DiscoveryEvent) {
        self.reporter.report(&event);
    }

    fn degrade(&self, result: &mut DiscoveryResult, degradation: Degradation) {
        self.emit(DiscoveryEvent::Degraded(degradation.clone()));
        result.degradations.push(degradation);
    }

    fn step(&self, game_id: &str, step: Step) {
        self.emit(DiscoveryEvent::StepStarted {
            game_id: game_id.to_string(),
            step,
        });
    }

    /// Resolves the save locations of `game_id`.
    ///
    /// Only an empty identifier is an error. Every other failure degrades
    /// the affected step and is listed in the result.
    pub async fn discover(
        &self,
        game_id: &str,
        exe: Option<&Path>,
    ) -> Result<DiscoveryResult, DiscoveryError> {
        let game_id = game_id.trim();
        if game_id.is_empty() {
            return Err(DiscoveryError::InvalidInput("game id is empty".into()));
        }

        let mut result = DiscoveryResult::empty();
        self.resolve_static(game_id, exe, &mut result).await;

        let static_found = !result.expanded_paths.is_empty() || !result.existing_paths.is_empty();
        if static_found {
            result.resolution_strategy = ResolutionStrategy::Static;
        } else if let Some(exe) = exe.filter(|_| self.dynamic) {
            self.resolve_dynamic(game_id, exe, &mut result).await;
        }

        self.emit(DiscoveryEvent::StrategySelected(result.resolution_strategy));
        tracing::info!(
            game_id,
            strategy = %result.resolution_strategy,
            expanded = result.expanded_paths.len(),
            existing = result.existing_paths.len(),
            "discovery finished"
        );
        Ok(result)
    }

    /// Runs [`discover`](Self::discover) on a background task.
    ///
    /// The receiver completes once the result is ready.
    pub fn spawn(
        &self,
        game_id: impl Into<String>,
        exe: Option<PathBuf>,
    ) -> oneshot::Receiver<Result<DiscoveryResult, DiscoveryError>> {
        let this = self.clone();
        let game_id = game_id.into();
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            let result = this.discover(&game_id, exe.as_deref()).await;
            // Receiver dropped means nobody waits for the result.
            let _ = tx.send(result);
        });
        rx
    }

    async fn resolve_static(&self, game_id: &str, exe: Option<&Path>, result: &mut DiscoveryResult) {
        self.step(game_id, Step::Fetch);

        match self.source.fetch_title(game_id).await {
            Ok(title) => result.game_title = title,
            Err(e) => self.degrade(
                result,
                Degradation::NetworkUnavailable {
                    detail: e.to_string(),
                },
            ),
        }

        let page = match self.source.fetch_page(game_id).await {
            Ok(Some(page)) => page,
            Ok(None) => {
                tracing::info!(game_id, "no documentation page");
                return;
            }
            Err(e) => {
                self.degrade(
                    result,
                    Degradation::NetworkUnavailable {
                        detail: e.to_string(),
                    },
                );
                return;
            }
        };

        self.step(game_id, Step::Parse);
        let parsed = parse_page(&page);
        if result.game_title.is_none() {
            result.game_title = parsed.title;
        }
        if parsed.locations.is_empty() {
            self.degrade(result, Degradation::MalformedDocument);
            return;
        }
        result.candidates_by_os = parsed.locations;

        self.step(game_id, Step::Expand);
        let game_dir = exe
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| p.to_string_lossy().into_owned());
        let app_id = is_app_id(game_id).then_some(game_id);
        let ctx = ExpandContext {
            app_id,
            game_dir: game_dir.as_deref(),
            account_hint: self.account_hint.as_deref(),
        };

        let target = self.strategy.target();
        let templates = result.candidates_by_os.get(target).to_vec();
        for raw in &templates {
            let expansion = expand(raw, self.strategy.as_ref(), &ctx);
            if expansion.ambiguous_account {
                self.degrade(
                    result,
                    Degradation::AmbiguousAccountFolder {
                        template: raw.clone(),
                    },
                );
            }
            if expansion.unresolved {
                self.degrade(
                    result,
                    Degradation::UnresolvedPlaceholder {
                        path: expansion.path.clone(),
                    },
                );
            }
            self.add_candidate(result, target, raw, expansion.path, false, expansion.unresolved);
        }

        if let (Some(compat), Some(app_id)) = (&self.compat, app_id) {
            let windows = result.candidates_by_os.get(TargetOs::Windows).to_vec();
            for raw in &windows {
                match compat.translate(raw, app_id, ctx.account_hint) {
                    Some(path) => self.add_candidate(result, TargetOs::Windows, raw, path, true, false),
                    None => tracing::debug!(template = %raw, "no prefix translation"),
                }
            }
        }
    }

    fn add_candidate(
        &self,
        result: &mut DiscoveryResult,
        os: TargetOs,
        raw: &str,
        path: String,
        translated: bool,
        unresolved: bool,
    ) {
        // Existence is checked only on fully expanded paths.
        let exists = !unresolved && Path::new(&path).exists();
        tracing::debug!(os = %os, template = raw, path = %path, exists, "candidate");
        result.push_path(&path, exists);
        result.candidates.push(SaveLocationCandidate {
            template_os: os,
            raw_template: raw.to_string(),
            expanded_path: path,
            exists,
            translated,
            unresolved,
        });
    }

    async fn resolve_dynamic(&self, game_id: &str, exe: &Path, result: &mut DiscoveryResult) {
        let _session = self.session.lock().await;
        self.step(game_id, Step::Observe);

        let plan = WatchPlan::for_strategy(self.strategy.as_ref(), exe);
        let mut observer = RuntimeWriteObserver::new(self.observer, Arc::clone(&self.supervisor));

        let observation = match observer.run(exe, &plan).await {
            Ok(observation) => observation,
            Err(WatchError::Launch(detail)) => {
                self.degrade(result, Degradation::ProcessLaunchFailure { detail });
                return;
            }
            Err(e) => {
                self.degrade(
                    result,
                    Degradation::WatchSubscriptionFailure {
                        detail: e.to_string(),
                    },
                );
                return;
            }
        };

        for root in &observation.skipped_roots {
            self.degrade(
                result,
                Degradation::WatchSubscriptionFailure {
                    detail: root.display().to_string(),
                },
            );
        }

        for path in &observation.paths {
            result.push_path(path, Path::new(path).exists());
        }
        if !observation.paths.is_empty() {
            result.resolution_strategy = ResolutionStrategy::Dynamic;
        }
    }
}
