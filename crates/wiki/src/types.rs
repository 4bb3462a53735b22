//! Shared types and API response shapes.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Operating system a save path template is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TargetOs {
    Windows,
    #[serde(rename = "macOS")]
    MacOs,
    Linux,
}

impl TargetOs {
    /// Returns all target systems in display order.
    pub fn all() -> &'static [TargetOs] {
        &[TargetOs::Windows, TargetOs::MacOs, TargetOs::Linux]
    }

    /// Maps a wiki label (`"Windows"`, `"OS X"`, `"linux"`...) to a target.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "windows" | "win" => Some(TargetOs::Windows),
            "macos" | "os x" | "osx" | "mac os x" | "mac" => Some(TargetOs::MacOs),
            "linux" => Some(TargetOs::Linux),
            _ => None,
        }
    }
}

impl fmt::Display for TargetOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetOs::Windows => write!(f, "Windows"),
            TargetOs::MacOs => write!(f, "macOS"),
            TargetOs::Linux => write!(f, "Linux"),
        }
    }
}

impl FromStr for TargetOs {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| format!("unknown operating system: {s}"))
    }
}

/// Raw save path templates grouped by target system.
///
/// Every target is always present; sequences keep first-seen order and
/// never hold the same template twice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SaveLocations(BTreeMap<TargetOs, Vec<String>>);

impl Default for SaveLocations {
    fn default() -> Self {
        Self(TargetOs::all().iter().map(|os| (*os, Vec::new())).collect())
    }
}

impl SaveLocations {
    /// Adds a template unless it is empty or already recorded for `os`.
    ///
    /// Returns true if it was added.
    pub fn push(&mut self, os: TargetOs, template: &str) -> bool {
        let template = template.trim();
        if template.is_empty() {
            return false;
        }
        let list = self.0.entry(os).or_default();
        if list.iter().any(|t| t == template) {
            return false;
        }
        list.push(template.to_string());
        true
    }

    /// Templates recorded for `os`.
    pub fn get(&self, os: TargetOs) -> &[String] {
        self.0.get(&os).map(Vec::as_slice).unwrap_or_default()
    }

    /// True when no target has any template.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    /// Total number of templates across targets.
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    /// Iterates `(os, templates)` in target order.
    pub fn iter(&self) -> impl Iterator<Item = (TargetOs, &[String])> {
        self.0.iter().map(|(os, list)| (*os, list.as_slice()))
    }
}

// --- MediaWiki API responses ---

/// `action=cargoquery` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CargoQueryResponse {
    #[serde(default)]
    pub cargoquery: Vec<CargoRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CargoRow {
    pub title: CargoTitle,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CargoTitle {
    #[serde(rename = "PageID", default)]
    pub page_id: Option<serde_json::Value>,
}

impl CargoTitle {
    /// The page id as text; the API returns it as a string but older
    /// deployments emit a number.
    pub fn page_id(&self) -> Option<String> {
        match self.page_id.as_ref()? {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// `action=parse&prop=wikitext` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParseResponse {
    #[serde(default)]
    pub parse: Option<ParseBody>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParseBody {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub wikitext: Option<Wikitext>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Wikitext {
    #[serde(rename = "*")]
    pub content: String,
}

// --- Storefront responses ---

/// `appdetails` response, keyed by AppID.
pub type StoreResponse = HashMap<String, StoreEntry>;

#[derive(Debug, Clone, Deserialize)]
pub struct StoreEntry {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<StoreData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub name: String,
}
