//! Progress reporting for a discovery run.

use crate::types::{Degradation, ResolutionStrategy};

/// Phase of a discovery run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Fetch,
    Parse,
    Expand,
    Observe,
}

/// Something worth telling the caller about.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryEvent {
    StepStarted { game_id: String, step: Step },
    Degraded(Degradation),
    StrategySelected(ResolutionStrategy),
}

/// Receives [`DiscoveryEvent`]s.
pub trait Reporter: Send + Sync {
    fn report(&self, event: &DiscoveryEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn report(&self, _event: &DiscoveryEvent) {}
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &DiscoveryEvent) {
        match event {
            DiscoveryEvent::StepStarted { game_id, step } => {
                tracing::debug!(game_id = %game_id, step = ?step, "step started");
            }
            DiscoveryEvent::Degraded(degradation) => {
                tracing::warn!(%degradation, "step degraded");
            }
            DiscoveryEvent::StrategySelected(strategy) => {
                tracing::info!(%strategy, "resolution finished");
            }
        }
    }
}
