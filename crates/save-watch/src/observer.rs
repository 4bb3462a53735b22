//! Supervised run: launch, watch, drain, rank.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use savescout_paths::{NoisePath, OsStrategy};
use tokio::time::{Instant, MissedTickBehavior};

use crate::WatchError;
use crate::config::ObserverConfig;
use crate::process::ProcessSupervisor;
use crate::rank::{filter_system_paths, rank};
use crate::watch::{WatchSet, parent_of};

/// Phase of a supervised run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverState {
    Idle,
    Watching,
    Draining,
    Done,
}

/// One recorded write.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedWriteEvent {
    /// Directory containing the written entry.
    pub parent: String,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
}

/// Where to look and what to ignore.
#[derive(Debug, Clone, Default)]
pub struct WatchPlan {
    pub roots: Vec<PathBuf>,
    pub denylist: Vec<NoisePath>,
}

impl WatchPlan {
    /// Candidate roots and denylist of a target system.
    pub fn for_strategy(strategy: &dyn OsStrategy, exe: &Path) -> Self {
        Self {
            roots: strategy.candidate_roots(exe.parent()),
            denylist: strategy.denylist(),
        }
    }
}

/// Outcome of a supervised run.
#[derive(Debug, Default)]
pub struct Observation {
    /// Ranked, filtered directories.
    pub paths: Vec<String>,
    /// Writes recorded after the grace period.
    pub events: usize,
    /// Roots that could not be watched.
    pub skipped_roots: Vec<PathBuf>,
    /// True if the run was cut short by the maximum wait.
    pub timed_out: bool,
}

/// Watches where a game writes while it runs.
pub struct RuntimeWriteObserver {
    config: ObserverConfig,
    supervisor: Arc<dyn ProcessSupervisor>,
    state: ObserverState,
}

impl RuntimeWriteObserver {
    pub fn new(config: ObserverConfig, supervisor: Arc<dyn ProcessSupervisor>) -> Self {
        Self {
            config,
            supervisor,
            state: ObserverState::Idle,
        }
    }

    /// Current phase.
    pub fn state(&self) -> ObserverState {
        self.state
    }

    fn enter(&mut self, state: ObserverState) {
        tracing::debug!(from = ?self.state, to = ?state, "observer state");
        self.state = state;
    }

    /// Runs `exe` to completion (or the maximum wait) and returns the
    /// directories it wrote to.
    ///
    /// Subscriptions are released and the child is killed on every exit
    /// path, including early returns and cancellation of the future.
    pub async fn run(&mut self, exe: &Path, plan: &WatchPlan) -> Result<Observation, WatchError> {
        self.enter(ObserverState::Idle);

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let watches = WatchSet::subscribe(&plan.roots, tx)?;
        let skipped_roots = watches.failed().iter().map(|(p, _)| p.clone()).collect();

        let cwd = exe
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let start = Instant::now();
        let mut process = self.supervisor.launch(exe, cwd)?;
        self.enter(ObserverState::Watching);

        let mut events = Vec::new();
        let deadline = start + self.config.max_wait;
        let mut poll = tokio::time::interval(self.config.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut timed_out = false;

        loop {
            tokio::select! {
                Some(path) = rx.recv() => {
                    if start.elapsed() >= self.config.grace {
                        record(&mut events, &path);
                    }
                }
                _ = poll.tick() => {
                    if process.child_alive() {
                        continue;
                    }
                    if !self.supervisor.is_running(process.name()).await {
                        tracing::info!(name = process.name(), "game exited");
                        break;
                    }
                }
                _ = tokio::time::sleep_until(deadline) => {
                    tracing::warn!(
                        name = process.name(),
                        max_wait_secs = self.config.max_wait.as_secs(),
                        "maximum wait reached, stopping game"
                    );
                    process.terminate();
                    timed_out = true;
                    break;
                }
            }
        }

        self.enter(ObserverState::Draining);
        let quiet_until = Instant::now() + self.config.quiesce;
        loop {
            tokio::select! {
                Some(path) = rx.recv() => {
                    if start.elapsed() >= self.config.grace {
                        record(&mut events, &path);
                    }
                }
                _ = tokio::time::sleep_until(quiet_until) => break,
            }
        }

        drop(watches);
        drop(process);
        self.enter(ObserverState::Done);

        let mut paths = filter_system_paths(rank(&events), &plan.denylist);
        paths.truncate(self.config.max_results);
        tracing::info!(events = events.len(), candidates = paths.len(), "run observed");

        Ok(Observation {
            paths,
            events: events.len(),
            skipped_roots,
            timed_out,
        })
    }
}

fn record(events: &mut Vec<ObservedWriteEvent>, path: &Path) {
    let Some(parent) = parent_of(path) else {
        return;
    };
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);
    events.push(ObservedWriteEvent {
        parent: parent.to_string_lossy().into_owned(),
        timestamp,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{BoxFuture, ProcessHandle};
    use std::fs;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Pretends to run a game that writes `files` shortly after launch and
    /// stays alive for `runs_for`.
    struct FakeGame {
        files: Vec<PathBuf>,
        write_after: Duration,
        runs_for: Duration,
        started: Mutex<Option<std::time::Instant>>,
        fail_launch: bool,
    }

    impl FakeGame {
        fn new(files: Vec<PathBuf>, runs_for: Duration) -> Self {
            Self {
                files,
                write_after: Duration::from_millis(150),
                runs_for,
                started: Mutex::new(None),
                fail_launch: false,
            }
        }
    }

    impl ProcessSupervisor for FakeGame {
        fn launch(&self, exe: &Path, _cwd: &Path) -> Result<ProcessHandle, WatchError> {
            if self.fail_launch {
                return Err(WatchError::Launch(exe.display().to_string()));
            }
            *self.started.lock().unwrap() = Some(std::time::Instant::now());
            let files = self.files.clone();
            let delay = self.write_after;
            std::thread::spawn(move || {
                std::thread::sleep(delay);
                for file in files {
                    fs::write(&file, b"save").unwrap();
                }
            });
            Ok(ProcessHandle::detached("fakegame"))
        }

        fn is_running<'a>(&'a self, _name: &'a str) -> BoxFuture<'a, bool> {
            let running = self
                .started
                .lock()
                .unwrap()
                .is_some_and(|t| t.elapsed() < self.runs_for);
            Box::pin(async move { running })
        }
    }

    fn quick() -> ObserverConfig {
        ObserverConfig {
            grace: Duration::from_millis(20),
            quiesce: Duration::from_millis(300),
            poll_interval: Duration::from_millis(50),
            max_wait: Duration::from_secs(10),
            max_results: 20,
        }
    }

    #[tokio::test]
    async fn ranks_directory_with_most_writes_first() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let saves = root.join("Saves");
        let other = root.join("Other");
        fs::create_dir_all(&saves).unwrap();
        fs::create_dir_all(&other).unwrap();

        let game = FakeGame::new(
            vec![
                saves.join("slot1.sav"),
                saves.join("slot2.sav"),
                saves.join("slot3.sav"),
                other.join("log.txt"),
            ],
            Duration::from_millis(600),
        );
        let mut observer = RuntimeWriteObserver::new(quick(), Arc::new(game));
        let plan = WatchPlan {
            roots: vec![root.clone()],
            denylist: Vec::new(),
        };

        let observation = observer.run(&root.join("game.exe"), &plan).await.unwrap();

        assert_eq!(observer.state(), ObserverState::Done);
        assert!(!observation.timed_out);
        let saves_text = saves.to_string_lossy().into_owned();
        let other_text = other.to_string_lossy().into_owned();
        assert_eq!(observation.paths.first(), Some(&saves_text));
        assert!(observation.paths.contains(&other_text));
    }

    #[tokio::test]
    async fn denylisted_directories_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let cache = root.join("shadercache");
        let saves = root.join("Saves");
        fs::create_dir_all(&cache).unwrap();
        fs::create_dir_all(&saves).unwrap();

        let game = FakeGame::new(
            vec![cache.join("a.bin"), cache.join("b.bin"), saves.join("s.sav")],
            Duration::from_millis(500),
        );
        let mut observer = RuntimeWriteObserver::new(quick(), Arc::new(game));
        let plan = WatchPlan {
            roots: vec![root.clone()],
            denylist: vec![NoisePath::segment("shadercache")],
        };

        let observation = observer.run(&root.join("game"), &plan).await.unwrap();
        assert_eq!(observation.paths, vec![saves.to_string_lossy().into_owned()]);
    }

    #[tokio::test]
    async fn startup_writes_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();

        let mut game = FakeGame::new(vec![root.join("early.cfg")], Duration::from_millis(400));
        game.write_after = Duration::from_millis(0);
        let config = ObserverConfig {
            grace: Duration::from_secs(2),
            max_wait: Duration::from_secs(10),
            ..quick()
        };
        let mut observer = RuntimeWriteObserver::new(config, Arc::new(game));
        let plan = WatchPlan {
            roots: vec![root.clone()],
            denylist: Vec::new(),
        };

        let observation = observer.run(&root.join("game"), &plan).await.unwrap();
        assert_eq!(observation.events, 0);
        assert!(observation.paths.is_empty());
    }

    #[tokio::test]
    async fn max_wait_ends_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();

        let game = FakeGame::new(Vec::new(), Duration::from_secs(3600));
        let config = ObserverConfig {
            max_wait: Duration::from_millis(300),
            ..quick()
        };
        let mut observer = RuntimeWriteObserver::new(config, Arc::new(game));
        let plan = WatchPlan {
            roots: vec![root.clone()],
            denylist: Vec::new(),
        };

        let observation = observer.run(&root.join("game"), &plan).await.unwrap();
        assert!(observation.timed_out);
        assert_eq!(observer.state(), ObserverState::Done);
    }

    #[tokio::test]
    async fn launch_failure_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut game = FakeGame::new(Vec::new(), Duration::ZERO);
        game.fail_launch = true;
        let mut observer = RuntimeWriteObserver::new(quick(), Arc::new(game));
        let plan = WatchPlan {
            roots: vec![dir.path().to_path_buf()],
            denylist: Vec::new(),
        };

        let err = observer.run(&dir.path().join("game"), &plan).await.unwrap_err();
        assert!(matches!(err, WatchError::Launch(_)));
    }

    #[tokio::test]
    async fn no_watchable_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let game = FakeGame::new(Vec::new(), Duration::ZERO);
        let mut observer = RuntimeWriteObserver::new(quick(), Arc::new(game));
        let plan = WatchPlan {
            roots: vec![dir.path().join("missing")],
            denylist: Vec::new(),
        };

        let err = observer.run(&dir.path().join("game"), &plan).await.unwrap_err();
        assert!(matches!(err, WatchError::NoRoots));
    }
}
