//! Save location discovery.
//!
//! [`Discovery`] first reads the game's documentation page and expands the
//! save templates it lists for the target system. When that yields no
//! path and an executable is known, it runs the game under observation and
//! ranks the directories it writes to.

pub mod orchestrator;
pub mod reporter;
pub mod types;

// Re-export primary types.
pub use orchestrator::Discovery;
pub use reporter::{DiscoveryEvent, NoopReporter, Reporter, Step, TracingReporter};
pub use types::{Degradation, DiscoveryResult, ResolutionStrategy, SaveLocationCandidate};

/// Errors for discovery operations.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
