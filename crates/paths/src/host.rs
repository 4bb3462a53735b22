//! Directories of the machine templates are expanded against.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::placeholders::WinRoot;

/// Home, environment and Steam layout of the expansion host.
///
/// Values are captured once per session so expansion stays a pure
/// function of this snapshot. Tests build one by hand.
#[derive(Debug, Clone, Default)]
pub struct HostDirs {
    pub home: PathBuf,
    pub username: String,
    pub env: BTreeMap<String, String>,
    pub steam_root: Option<PathBuf>,
    pub steam_libraries: Vec<PathBuf>,
}

impl HostDirs {
    /// Captures the current process environment and Steam install.
    pub fn detect() -> Self {
        let env: BTreeMap<String, String> = std::env::vars().collect();

        let home = ["HOME", "USERPROFILE"]
            .iter()
            .find_map(|k| env.get(*k).filter(|v| !v.is_empty()))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/tmp"));

        let username = ["USERNAME", "USER"]
            .iter()
            .find_map(|k| env.get(*k).filter(|v| !v.is_empty()).cloned())
            .unwrap_or_default();

        let mut host = Self {
            home,
            username,
            env,
            steam_root: None,
            steam_libraries: Vec::new(),
        };

        match savescout_steam::Paths::new() {
            Ok(paths) => {
                host.steam_libraries = paths.library_roots();
                host.steam_root = Some(paths.base_dir().clone());
                tracing::debug!(
                    steam = %paths.base_dir().display(),
                    libraries = host.steam_libraries.len(),
                    "steam install detected"
                );
            }
            Err(e) => tracing::debug!(error = %e, "no steam install"),
        }

        host
    }

    /// A Windows host whose user profile lives at `profile`.
    pub fn for_windows_profile(profile: &str) -> Self {
        let username = profile
            .rsplit(['\\', '/'])
            .find(|s| !s.is_empty())
            .unwrap_or_default()
            .to_string();
        Self {
            home: PathBuf::from(profile),
            username,
            ..Self::default()
        }
    }

    /// A Unix host whose home directory is `home`.
    pub fn for_unix_home(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let username = home
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            home,
            username,
            ..Self::default()
        }
    }

    /// Sets the Steam install and its library roots.
    pub fn with_steam(mut self, root: impl Into<PathBuf>, libraries: Vec<PathBuf>) -> Self {
        self.steam_root = Some(root.into());
        self.steam_libraries = libraries;
        self
    }

    /// Adds an environment variable.
    pub fn with_env(mut self, name: &str, value: &str) -> Self {
        self.env.insert(name.to_string(), value.to_string());
        self
    }

    /// Looks up an environment variable, falling back to a
    /// case-insensitive match.
    pub fn var(&self, name: &str) -> Option<&str> {
        self.env
            .get(name)
            .or_else(|| {
                self.env
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(name))
                    .map(|(_, v)| v)
            })
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    fn var_or(&self, name: &str, default: impl FnOnce() -> String) -> String {
        self.var(name).map(str::to_string).unwrap_or_else(default)
    }

    /// The user profile directory as a Windows path.
    pub fn profile(&self) -> String {
        self.var_or("USERPROFILE", || self.home.to_string_lossy().into_owned())
    }

    /// Resolves a Windows root, preferring the environment and falling
    /// back to the stock layout under the profile.
    pub fn win_root(&self, root: WinRoot) -> String {
        let profile = self.profile();
        match root {
            WinRoot::UserProfile => profile,
            WinRoot::AppData => self.var_or("APPDATA", || format!("{profile}\\AppData\\Roaming")),
            WinRoot::LocalAppData => {
                self.var_or("LOCALAPPDATA", || format!("{profile}\\AppData\\Local"))
            }
            WinRoot::Documents => format!("{profile}\\Documents"),
            WinRoot::SavedGames => format!("{profile}\\Saved Games"),
            WinRoot::ProgramData => self.var_or("PROGRAMDATA", || "C:\\ProgramData".to_string()),
            WinRoot::ProgramFiles => {
                self.var_or("PROGRAMFILES", || "C:\\Program Files".to_string())
            }
            WinRoot::ProgramFilesX86 => {
                self.var_or("PROGRAMFILES(X86)", || "C:\\Program Files (x86)".to_string())
            }
            WinRoot::Public => self.var_or("PUBLIC", || "C:\\Users\\Public".to_string()),
            WinRoot::UserName => self.var_or("USERNAME", || self.username.clone()),
            WinRoot::WinDir => self.var_or("WINDIR", || {
                self.var_or("SYSTEMROOT", || "C:\\Windows".to_string())
            }),
            WinRoot::Temp => self.var_or("TEMP", || {
                format!("{}\\Temp", self.win_root(WinRoot::LocalAppData))
            }),
            WinRoot::Steam => self
                .steam_root
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("{}\\Steam", self.win_root(WinRoot::ProgramFilesX86))),
            WinRoot::SteamUserData => format!("{}\\userdata", self.win_root(WinRoot::Steam)),
        }
    }
}
