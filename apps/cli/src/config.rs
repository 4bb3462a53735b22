//! CLI configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/savescout/config.toml`
//! - Windows: `%APPDATA%/savescout/config.toml`
//! - macOS: `~/Library/Application Support/savescout/config.toml`

use std::path::{Path, PathBuf};
use std::time::Duration;

use savescout_save_watch::ObserverConfig;
use savescout_wiki::client::{DEFAULT_STORE_URL, DEFAULT_WIKI_URL, default_user_agent};
use serde::{Deserialize, Serialize};

/// Discovery configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// MediaWiki API endpoint of the community wiki.
    #[serde(default = "default_wiki_api_url")]
    pub wiki_api_url: String,

    /// Storefront app details endpoint.
    #[serde(default = "default_store_api_url")]
    pub store_api_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Longest a game may run under observation.
    #[serde(default = "default_max_wait")]
    pub max_wait_secs: u64,

    /// Quiet period after the game exits.
    #[serde(default = "default_two")]
    pub quiesce_secs: u64,

    /// Writes this soon after launch are ignored.
    #[serde(default = "default_two")]
    pub grace_secs: u64,

    #[serde(default = "default_two")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Steam library folders not listed in `libraryfolders.vdf`.
    #[serde(default)]
    pub extra_library_roots: Vec<PathBuf>,

    /// Account folder name used when none is found on disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_hint: Option<String>,
}

fn default_wiki_api_url() -> String {
    DEFAULT_WIKI_URL.into()
}

fn default_store_api_url() -> String {
    DEFAULT_STORE_URL.into()
}

fn default_request_timeout() -> u64 {
    15
}

fn default_max_wait() -> u64 {
    300
}

fn default_two() -> u64 {
    2
}

fn default_max_results() -> usize {
    20
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wiki_api_url: default_wiki_api_url(),
            store_api_url: default_store_api_url(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout(),
            max_wait_secs: default_max_wait(),
            quiesce_secs: default_two(),
            grace_secs: default_two(),
            poll_interval_secs: default_two(),
            max_results: default_max_results(),
            extra_library_roots: Vec::new(),
            account_hint: None,
        }
    }
}

impl Config {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Loads `path`, writing the defaults there first if it is missing.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Timing and limits of the supervised run.
    pub fn observer(&self) -> ObserverConfig {
        ObserverConfig {
            grace: Duration::from_secs(self.grace_secs),
            quiesce: Duration::from_secs(self.quiesce_secs),
            // A zero period would make the poll interval panic.
            poll_interval: Duration::from_secs(self.poll_interval_secs.max(1)),
            max_wait: Duration::from_secs(self.max_wait_secs),
            max_results: self.max_results,
        }
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata = std::env::var("APPDATA")
            .map_err(|_| anyhow::anyhow!("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("savescout").join("config.toml"))
    }

    #[cfg(target_os = "macos")]
    {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join("Library")
            .join("Application Support")
            .join("savescout")
            .join("config.toml"))
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        let base = match std::env::var("XDG_CONFIG_HOME") {
            Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => {
                let home =
                    std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME is not set"))?;
                PathBuf::from(home).join(".config")
            }
        };
        Ok(base.join("savescout").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.wiki_api_url, DEFAULT_WIKI_URL);
        assert!(config.user_agent.starts_with("savescout/"));
        assert_eq!(config.request_timeout_secs, 15);
        assert_eq!(config.max_wait_secs, 300);
        assert_eq!(config.max_results, 20);
        assert!(config.extra_library_roots.is_empty());
        assert!(config.account_hint.is_none());
    }

    #[test]
    fn config_partial_toml() {
        let toml_str = r#"
max_wait_secs = 60
extra_library_roots = ["/mnt/games"]
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.max_wait_secs, 60);
        assert_eq!(config.extra_library_roots, [PathBuf::from("/mnt/games")]);
        assert_eq!(config.grace_secs, 2);
        assert_eq!(config.store_api_url, DEFAULT_STORE_URL);
    }

    #[test]
    fn first_load_writes_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config, Config::default());

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded, config);
    }

    #[test]
    fn saved_edits_survive_reload() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");

        let config = Config {
            account_hint: Some("1234567".into()),
            max_results: 5,
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.account_hint.as_deref(), Some("1234567"));
        assert_eq!(loaded.max_results, 5);
    }

    #[test]
    fn observer_config_from_seconds() {
        let config = Config {
            poll_interval_secs: 0,
            max_wait_secs: 30,
            ..Config::default()
        };
        let observer = config.observer();
        assert_eq!(observer.poll_interval, Duration::from_secs(1));
        assert_eq!(observer.max_wait, Duration::from_secs(30));
        assert_eq!(observer.grace, Duration::from_secs(2));
    }

    #[test]
    fn config_path_not_empty() {
        let path = config_path().unwrap();
        assert!(path.to_string_lossy().contains("savescout"));
    }
}
