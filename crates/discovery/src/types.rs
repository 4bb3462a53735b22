use std::fmt;

use savescout_wiki::{SaveLocations, TargetOs};
use serde::Serialize;

/// Which resolution produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ResolutionStrategy {
    Static,
    Dynamic,
    None,
}

impl fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionStrategy::Static => write!(f, "static"),
            ResolutionStrategy::Dynamic => write!(f, "dynamic"),
            ResolutionStrategy::None => write!(f, "none"),
        }
    }
}

/// One expanded template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveLocationCandidate {
    pub template_os: TargetOs,
    pub raw_template: String,
    pub expanded_path: String,
    pub exists: bool,
    /// Produced by translating a Windows template into a Proton prefix.
    pub translated: bool,
    pub unresolved: bool,
}

/// A step that fell back to an empty contribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    NetworkUnavailable { detail: String },
    MalformedDocument,
    AmbiguousAccountFolder { template: String },
    UnresolvedPlaceholder { path: String },
    ProcessLaunchFailure { detail: String },
    WatchSubscriptionFailure { detail: String },
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Degradation::NetworkUnavailable { detail } => write!(f, "network unavailable: {detail}"),
            Degradation::MalformedDocument => write!(f, "page has no recognizable save locations"),
            Degradation::AmbiguousAccountFolder { template } => {
                write!(f, "several account folders for {template}")
            }
            Degradation::UnresolvedPlaceholder { path } => write!(f, "unresolved placeholder in {path}"),
            Degradation::ProcessLaunchFailure { detail } => write!(f, "launch failed: {detail}"),
            Degradation::WatchSubscriptionFailure { detail } => write!(f, "watch failed: {detail}"),
        }
    }
}

/// Outcome of one discovery call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveryResult {
    pub game_title: Option<String>,
    /// Raw templates per system, in page order.
    pub candidates_by_os: SaveLocations,
    pub candidates: Vec<SaveLocationCandidate>,
    /// Every concrete path, static first, without duplicates.
    pub expanded_paths: Vec<String>,
    /// The expanded paths present on disk.
    pub existing_paths: Vec<String>,
    pub resolution_strategy: ResolutionStrategy,
    pub degradations: Vec<Degradation>,
}

impl DiscoveryResult {
    pub(crate) fn empty() -> Self {
        Self {
            game_title: None,
            candidates_by_os: SaveLocations::default(),
            candidates: Vec::new(),
            expanded_paths: Vec::new(),
            existing_paths: Vec::new(),
            resolution_strategy: ResolutionStrategy::None,
            degradations: Vec::new(),
        }
    }

    /// Best path to use: the first existing one, else the first expanded.
    pub fn best_path(&self) -> Option<&str> {
        self.existing_paths
            .first()
            .or_else(|| self.expanded_paths.first())
            .map(String::as_str)
    }

    /// Adds a concrete path, keeping the first occurrence.
    pub(crate) fn push_path(&mut self, path: &str, exists: bool) {
        if self.expanded_paths.iter().any(|p| p == path) {
            return;
        }
        self.expanded_paths.push(path.to_string());
        if exists {
            self.existing_paths.push(path.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_path_dedups_and_tracks_existence() {
        let mut result = DiscoveryResult::empty();
        result.push_path("/a", false);
        result.push_path("/b", true);
        result.push_path("/a", true);
        assert_eq!(result.expanded_paths, ["/a", "/b"]);
        assert_eq!(result.existing_paths, ["/b"]);
        assert_eq!(result.best_path(), Some("/b"));
    }

    #[test]
    fn degradation_serializes_with_kind() {
        let json = serde_json::to_value(Degradation::MalformedDocument).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "malformed_document"}));
    }

    #[test]
    fn empty_result_json_shape() {
        let json = serde_json::to_value(DiscoveryResult::empty()).unwrap();
        assert_eq!(json["resolution_strategy"], "None");
        assert_eq!(json["candidates_by_os"]["Windows"], serde_json::json!([]));
        assert!(json["game_title"].is_null());
    }
}
