//! Dynamic save discovery: run the game, watch where it writes.
//!
//! The observer launches the executable, subscribes to a set of candidate
//! directories and records the parent directory of every write. Once the
//! game exits the directories are ranked by activity and noisy system
//! locations are dropped.

mod config;
mod observer;
mod process;
mod rank;
mod watch;

pub use config::ObserverConfig;
pub use observer::{Observation, ObservedWriteEvent, ObserverState, RuntimeWriteObserver, WatchPlan};
pub use process::{BoxFuture, ProcessHandle, ProcessSupervisor, SystemSupervisor};
pub use rank::{filter_system_paths, rank};
pub use watch::WatchSet;

/// Errors for a supervised run.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("failed to launch executable: {0}")]
    Launch(String),

    #[error("failed to watch directory: {0}")]
    Watch(String),

    #[error("no candidate directory could be watched")]
    NoRoots,
}
