//! Per-OS expansion behavior, selected once per session.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use savescout_wiki::TargetOs;

use crate::host::HostDirs;
use crate::placeholders::{PERCENT_VAR, WinRoot};

static UNIX_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
        .expect("unix var pattern is valid")
});

static MISSING_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(compatdata/\d+)/drive_c(/|$)").expect("compatdata pattern is valid")
});

static BACKSLASH_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\{2,}").expect("separator pattern is valid"));

static SLASH_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/{2,}").expect("separator pattern is valid"));

/// Fragments marking directories whose writes are never save data.
const WINDOWS_NOISE: &[&str] = &[
    "AppData\\Local\\Temp",
    "AppData\\Roaming\\Microsoft",
    "AppData\\Local\\Package Cache",
    "AppData\\Local\\Packages",
    "AppData\\Local\\Microsoft",
    "AppData\\Local\\Backup",
    "AppData\\Local\\CEF",
    "AppData\\Local\\NVIDIA",
    "AppData\\Local\\Steam",
];

const UNIX_NOISE: &[&str] = &[
    ".cache",
    ".local/share/Trash",
    ".local/share/recently-used",
    "Library/Caches",
    ".steam/steam/logs",
    "Steam/logs",
    "shadercache",
];

/// Directories whose writes are noise wherever they are mounted.
const UNIX_NOISE_ROOTS: &[&str] = &["/proc"];

/// A directory whose writes are never save data.
///
/// Matching ignores case, treats `\` and `/` alike and only breaks at
/// path component boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoisePath {
    /// Components appearing anywhere in a path, e.g. `AppData\Local\Temp`.
    Segment(String),
    /// An absolute directory and everything below it, e.g. `/tmp`.
    Root(String),
}

impl NoisePath {
    pub fn segment(text: impl Into<String>) -> Self {
        NoisePath::Segment(text.into())
    }

    pub fn root(text: impl Into<String>) -> Self {
        NoisePath::Root(text.into())
    }

    /// True if `path` lies in this directory.
    pub fn matches(&self, path: &str) -> bool {
        let path = fold_components(path);
        match self {
            NoisePath::Segment(segment) => {
                let segment = fold_components(segment);
                !segment.is_empty() && format!("/{path}/").contains(&format!("/{segment}/"))
            }
            NoisePath::Root(root) => {
                let root = fold_components(root);
                !root.is_empty() && format!("{path}/").starts_with(&format!("{root}/"))
            }
        }
    }
}

/// Lowercase, forward slashes, no trailing separator.
fn fold_components(text: &str) -> String {
    SLASH_RUN
        .replace_all(&text.replace('\\', "/"), "/")
        .trim_end_matches('/')
        .to_lowercase()
}

/// Placeholder roots, separators and watch roots of one target system.
pub trait OsStrategy: Send + Sync {
    /// The system templates are expanded for.
    fn target(&self) -> TargetOs;

    /// Host snapshot the strategy expands against.
    fn host(&self) -> &HostDirs;

    /// Preferred path separator.
    fn separator(&self) -> char;

    /// Replaces environment-style placeholders with concrete roots.
    ///
    /// Unknown placeholders are left untouched.
    fn expand_placeholders(&self, template: &str) -> String;

    /// Converts separators to the native form and collapses doubled ones.
    fn normalize_separators(&self, path: &str) -> String;

    /// Directories worth watching while a game runs.
    fn candidate_roots(&self, exe_dir: Option<&Path>) -> Vec<PathBuf>;

    /// Directories whose writes are noise.
    fn denylist(&self) -> Vec<NoisePath>;

    /// True if Windows templates should also be translated into a
    /// compatibility prefix on this system.
    fn translates_windows(&self) -> bool {
        false
    }
}

/// Returns the system the process is running on.
pub fn native_target() -> TargetOs {
    if cfg!(target_os = "windows") {
        TargetOs::Windows
    } else if cfg!(target_os = "macos") {
        TargetOs::MacOs
    } else {
        TargetOs::Linux
    }
}

/// Builds the strategy for `target`.
pub fn strategy_for(target: TargetOs, host: HostDirs) -> Box<dyn OsStrategy> {
    match target {
        TargetOs::Windows => Box::new(WindowsStrategy::new(host)),
        TargetOs::MacOs | TargetOs::Linux => Box::new(UnixStrategy::new(target, host)),
    }
}

/// Windows: `%VAR%` placeholders and backslash paths.
#[derive(Debug, Clone)]
pub struct WindowsStrategy {
    host: HostDirs,
}

impl WindowsStrategy {
    pub fn new(host: HostDirs) -> Self {
        Self { host }
    }
}

impl OsStrategy for WindowsStrategy {
    fn target(&self) -> TargetOs {
        TargetOs::Windows
    }

    fn host(&self) -> &HostDirs {
        &self.host
    }

    fn separator(&self) -> char {
        '\\'
    }

    fn expand_placeholders(&self, template: &str) -> String {
        PERCENT_VAR
            .replace_all(template, |caps: &Captures<'_>| {
                let name = &caps[1];
                if let Some(root) = WinRoot::from_var(name) {
                    return self.host.win_root(root);
                }
                match self.host.var(name) {
                    Some(value) => value.to_string(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    fn normalize_separators(&self, path: &str) -> String {
        let path = path.replace('/', "\\");
        // Keep a leading UNC `\\server` prefix intact.
        match path.strip_prefix("\\\\") {
            Some(rest) => format!("\\\\{}", BACKSLASH_RUN.replace_all(rest, "\\")),
            None => BACKSLASH_RUN.replace_all(&path, "\\").into_owned(),
        }
    }

    fn candidate_roots(&self, exe_dir: Option<&Path>) -> Vec<PathBuf> {
        let h = &self.host;
        let program_files = h.win_root(WinRoot::ProgramFiles);
        let program_files_x86 = h.win_root(WinRoot::ProgramFilesX86);

        let mut roots: Vec<PathBuf> = [
            h.win_root(WinRoot::AppData),
            h.win_root(WinRoot::LocalAppData),
            h.win_root(WinRoot::Documents),
            h.win_root(WinRoot::SavedGames),
        ]
        .into_iter()
        .map(PathBuf::from)
        .collect();

        roots.extend(exe_dir.map(Path::to_path_buf));
        roots.extend(
            [
                h.win_root(WinRoot::SteamUserData),
                format!("{}\\VirtualStore", h.win_root(WinRoot::LocalAppData)),
                format!("{}\\steamapps\\common", h.win_root(WinRoot::Steam)),
                format!("{program_files}\\Epic Games"),
                format!("{program_files_x86}\\GOG Galaxy\\Games"),
                format!("{program_files}\\EA Games"),
                format!("{program_files_x86}\\Ubisoft\\Ubisoft Game Launcher"),
            ]
            .into_iter()
            .map(PathBuf::from),
        );
        roots
    }

    fn denylist(&self) -> Vec<NoisePath> {
        let mut list: Vec<NoisePath> = WINDOWS_NOISE.iter().map(|s| NoisePath::segment(*s)).collect();
        list.push(NoisePath::root(self.host.win_root(WinRoot::WinDir)));
        list.extend(self.host.var("SYSTEMROOT").map(NoisePath::root));
        list.push(NoisePath::root(self.host.win_root(WinRoot::Temp)));
        list
    }
}

/// Linux and macOS: `~`, `$VAR` and forward slashes.
#[derive(Debug, Clone)]
pub struct UnixStrategy {
    target: TargetOs,
    host: HostDirs,
}

impl UnixStrategy {
    pub fn new(target: TargetOs, host: HostDirs) -> Self {
        Self { target, host }
    }

    fn home(&self) -> String {
        self.host.home.to_string_lossy().into_owned()
    }

    fn steam_root(&self) -> String {
        if let Some(root) = &self.host.steam_root {
            return root.to_string_lossy().into_owned();
        }
        let home = self.home();
        match self.target {
            TargetOs::MacOs => format!("{home}/Library/Application Support/Steam"),
            _ => format!("{home}/.steam/steam"),
        }
    }

    fn home_join(&self, rel: &str) -> PathBuf {
        self.host.home.join(rel)
    }
}

impl OsStrategy for UnixStrategy {
    fn target(&self) -> TargetOs {
        self.target
    }

    fn host(&self) -> &HostDirs {
        &self.host
    }

    fn separator(&self) -> char {
        '/'
    }

    fn expand_placeholders(&self, template: &str) -> String {
        let text = if template == "~" {
            self.home()
        } else if let Some(rest) = template
            .strip_prefix("~/")
            .or_else(|| template.strip_prefix("~\\"))
        {
            format!("{}/{rest}", self.home())
        } else {
            template.to_string()
        };

        let text = PERCENT_VAR.replace_all(&text, |caps: &Captures<'_>| {
            match WinRoot::from_var(&caps[1]) {
                Some(WinRoot::Steam) => self.steam_root(),
                Some(WinRoot::SteamUserData) => format!("{}/userdata", self.steam_root()),
                _ => caps[0].to_string(),
            }
        });

        UNIX_VAR
            .replace_all(&text, |caps: &Captures<'_>| {
                let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
                match self.host.env.get(name) {
                    Some(value) => value.clone(),
                    None if name == "HOME" => self.home(),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    fn normalize_separators(&self, path: &str) -> String {
        let path = path.replace('\\', "/");
        let path = SLASH_RUN.replace_all(&path, "/");
        if self.target == TargetOs::Linux {
            MISSING_PREFIX
                .replace_all(&path, "$1/pfx/drive_c$2")
                .into_owned()
        } else {
            path.into_owned()
        }
    }

    fn candidate_roots(&self, exe_dir: Option<&Path>) -> Vec<PathBuf> {
        let mut roots = match self.target {
            TargetOs::MacOs => vec![
                self.home_join("Library/Application Support"),
                self.home_join("Library/Containers"),
                self.home_join("Library/Preferences"),
                self.home_join("Documents"),
            ],
            _ => vec![
                self.home_join(".local/share"),
                self.home_join(".config"),
                self.home_join("Documents"),
            ],
        };
        roots.extend(exe_dir.map(Path::to_path_buf));
        if self.target == TargetOs::Linux {
            roots.extend(
                self.host
                    .steam_libraries
                    .iter()
                    .map(|lib| savescout_steam::paths::compatdata_dir(lib)),
            );
        }
        roots
    }

    fn denylist(&self) -> Vec<NoisePath> {
        let tmp = self
            .host
            .var("TMPDIR")
            .filter(|dir| !dir.is_empty())
            .unwrap_or("/tmp");
        let mut list: Vec<NoisePath> = UNIX_NOISE.iter().map(|s| NoisePath::segment(*s)).collect();
        list.push(NoisePath::root(tmp));
        list.extend(UNIX_NOISE_ROOTS.iter().map(|s| NoisePath::root(*s)));
        list
    }

    fn translates_windows(&self) -> bool {
        self.target == TargetOs::Linux
    }
}
