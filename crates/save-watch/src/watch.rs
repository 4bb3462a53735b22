//! Recursive directory subscriptions scoped to one run.

use std::path::{Path, PathBuf};

use notify::event::{AccessKind, AccessMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::UnboundedSender;

use crate::WatchError;

/// Active subscriptions. Dropping the set unsubscribes every root.
pub struct WatchSet {
    watcher: RecommendedWatcher,
    roots: Vec<PathBuf>,
    failed: Vec<(PathBuf, WatchError)>,
}

impl WatchSet {
    /// Subscribes to every existing root, forwarding changed paths to `tx`.
    ///
    /// Missing roots and roots nested under another root are skipped. A
    /// root that cannot be watched is recorded in [`failed`](Self::failed)
    /// and the others proceed; it is an error only if none succeeds.
    pub fn subscribe(roots: &[PathBuf], tx: UnboundedSender<PathBuf>) -> Result<Self, WatchError> {
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) if is_change(&event.kind) => {
                for path in event.paths {
                    // Receiver gone means the run is over.
                    let _ = tx.send(path);
                }
            }
            Ok(_) => {}
            Err(e) => tracing::debug!(error = %e, "watch error"),
        })
        .map_err(|e| WatchError::Watch(e.to_string()))?;

        let mut watched = Vec::new();
        let mut failed = Vec::new();
        for root in distinct_roots(roots) {
            match watcher.watch(&root, RecursiveMode::Recursive) {
                Ok(()) => {
                    tracing::debug!(root = %root.display(), "watching");
                    watched.push(root);
                }
                Err(e) => {
                    tracing::warn!(root = %root.display(), error = %e, "cannot watch root");
                    let err = WatchError::Watch(format!("{}: {e}", root.display()));
                    failed.push((root, err));
                }
            }
        }

        if watched.is_empty() {
            return Err(WatchError::NoRoots);
        }

        Ok(Self {
            watcher,
            roots: watched,
            failed,
        })
    }

    /// Roots currently subscribed.
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Roots whose subscription failed.
    pub fn failed(&self) -> &[(PathBuf, WatchError)] {
        &self.failed
    }
}

impl Drop for WatchSet {
    fn drop(&mut self) {
        for root in &self.roots {
            if let Err(e) = self.watcher.unwatch(root) {
                tracing::debug!(root = %root.display(), error = %e, "unwatch failed");
            }
        }
        tracing::debug!(count = self.roots.len(), "watches released");
    }
}

/// Existing roots, canonicalized, without duplicates or nested entries.
pub(crate) fn distinct_roots(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut existing: Vec<PathBuf> = roots
        .iter()
        .filter(|r| r.is_dir())
        .map(|r| r.canonicalize().unwrap_or_else(|_| r.clone()))
        .collect();
    existing.sort();
    existing.dedup();

    let mut distinct: Vec<PathBuf> = Vec::new();
    for root in existing {
        if !distinct.iter().any(|kept: &PathBuf| root.starts_with(kept)) {
            distinct.push(root);
        }
    }
    distinct
}

/// True for events that reflect a write, not a read.
fn is_change(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => true,
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => true,
        _ => false,
    }
}

/// Parent directory of a changed path.
pub(crate) fn parent_of(path: &Path) -> Option<PathBuf> {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
}
