//! Placeholder vocabulary shared by every expansion target.
//!
//! Wiki path tokens (`{{p|appdata}}`) are first rewritten into
//! environment-style placeholders (`%APPDATA%`, `~`, `<userid>`). Each
//! target then maps those placeholders to its own roots.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static WIKI_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*(?:((?i:p))\s*\|\s*)?([^{}|]+?)\s*\}\}").expect("wiki token pattern is valid")
});

/// `{{cn|A|B}}`: literal path components.
static COMPONENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\{\{\s*cn\s*\|([^{}]*)\}\}").expect("components pattern is valid")
});

static LEFTOVER_TEMPLATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{[^{}]*\}\}").expect("template pattern is valid"));

static ACCOUNT_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(?:userid|user-id|steamid|steam-id|uid)>").expect("marker pattern is valid")
});

static ANGLE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^<>]*>").expect("angle pattern is valid"));

/// `%NAME%` environment-style placeholder.
pub(crate) static PERCENT_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%([^%/\\]+)%").expect("percent pattern is valid"));

/// Stand-in for `{{p|game}}` when the executable folder is unknown.
pub(crate) const GAME_DIR_MARKER: &str = "%GAMEDIR%";

static APP_ID_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<app-?id>").expect("app id pattern is valid"));

/// Windows roots a template can be anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WinRoot {
    AppData,
    LocalAppData,
    UserProfile,
    Documents,
    SavedGames,
    ProgramData,
    ProgramFiles,
    ProgramFilesX86,
    Public,
    UserName,
    WinDir,
    Temp,
    Steam,
    SteamUserData,
}

impl WinRoot {
    /// Maps a placeholder name (without `%`) to a root, ignoring case.
    pub fn from_var(name: &str) -> Option<Self> {
        let root = match name.trim().to_ascii_uppercase().as_str() {
            "APPDATA" => WinRoot::AppData,
            "LOCALAPPDATA" => WinRoot::LocalAppData,
            "USERPROFILE" | "HOME" => WinRoot::UserProfile,
            "DOCUMENTS" | "MYDOCUMENTS" => WinRoot::Documents,
            "SAVED GAMES" | "SAVEDGAMES" => WinRoot::SavedGames,
            "PROGRAMDATA" | "ALLUSERSPROFILE" | "COMMONAPPDATA" => WinRoot::ProgramData,
            "PROGRAMFILES" | "PROGRAMW6432" => WinRoot::ProgramFiles,
            "PROGRAMFILES(X86)" => WinRoot::ProgramFilesX86,
            "PUBLIC" => WinRoot::Public,
            "USERNAME" => WinRoot::UserName,
            "WINDIR" | "SYSTEMROOT" => WinRoot::WinDir,
            "TEMP" | "TMP" => WinRoot::Temp,
            "STEAM" => WinRoot::Steam,
            "STEAMUSERDATA" => WinRoot::SteamUserData,
            _ => return None,
        };
        Some(root)
    }

    /// Location of the root inside a Proton prefix, relative to `pfx/`.
    ///
    /// Steam roots are not inside the prefix; they map to `None` and are
    /// resolved against the native install.
    pub fn prefix_relative(self) -> Option<&'static str> {
        let rel = match self {
            WinRoot::AppData => "drive_c/users/steamuser/AppData/Roaming",
            WinRoot::LocalAppData => "drive_c/users/steamuser/AppData/Local",
            WinRoot::UserProfile => "drive_c/users/steamuser",
            WinRoot::Documents => "drive_c/users/steamuser/Documents",
            WinRoot::SavedGames => "drive_c/users/steamuser/Saved Games",
            WinRoot::ProgramData => "drive_c/ProgramData",
            WinRoot::ProgramFiles => "drive_c/Program Files",
            WinRoot::ProgramFilesX86 => "drive_c/Program Files (x86)",
            WinRoot::Public => "drive_c/users/Public",
            WinRoot::UserName => "steamuser",
            WinRoot::WinDir => "drive_c/windows",
            WinRoot::Temp => "drive_c/users/steamuser/AppData/Local/Temp",
            WinRoot::Steam | WinRoot::SteamUserData => return None,
        };
        Some(rel)
    }
}

/// Replacement for a `{{p|name}}` token, keyed by lowercase name.
fn path_token(name: &str, game_dir: Option<&str>) -> Option<String> {
    let replacement = match name {
        "appdata" => "%APPDATA%",
        "localappdata" => "%LOCALAPPDATA%",
        "userprofile" => "%USERPROFILE%",
        "documents" | "userprofile\\documents" | "userprofile/documents" => {
            "%USERPROFILE%\\Documents"
        }
        "savedgames" | "saved games" | "userprofile\\saved games" => "%USERPROFILE%\\Saved Games",
        "programdata" | "commonappdata" | "allusersprofile" => "%PROGRAMDATA%",
        "programfiles" => "%PROGRAMFILES%",
        "public" => "%PUBLIC%",
        "windir" => "%WINDIR%",
        "steam" => "%STEAM%",
        "steamapps" => "%STEAM%\\steamapps",
        "steamuserdata" => "%STEAMUSERDATA%",
        "virtualstore" => "%LOCALAPPDATA%\\VirtualStore",
        "epicgames" => "%PROGRAMFILES%\\Epic Games",
        "gog" => "%PROGRAMFILES(X86)%\\GOG Galaxy\\Games",
        "ea" => "%PROGRAMFILES%\\EA Games",
        "ubisoft" => "%PROGRAMFILES(X86)%\\Ubisoft\\Ubisoft Game Launcher",
        "uid" | "userid" => "<userid>",
        "steamid" => "<steamid>",
        "username" => "%USERNAME%",
        "linuxhome" | "osxhome" | "home" => "~",
        "xdgdatahome" | ".local/share" => "~/.local/share",
        "xdgconfighome" | ".config" => "~/.config",
        "library/application support" => "~/Library/Application Support",
        "library/containers" => "~/Library/Containers",
        ".steam" => "~/.steam",
        ".steam/steam/steamapps/compatdata" => "~/.steam/steam/steamapps/compatdata",
        ".local/share/steam/steamapps/compatdata" => "~/.local/share/Steam/steamapps/compatdata",
        "proton" => "~/.steam/steam/steamapps/compatdata/<appid>/pfx/drive_c",
        "game" => return Some(game_dir.unwrap_or(GAME_DIR_MARKER).to_string()),
        _ => return None,
    };
    Some(replacement.to_string())
}

/// Replacement for a bare `{{name}}` token.
fn bare_token(name: &str) -> Option<&'static str> {
    match name {
        "uid" | "userid" => Some("<userid>"),
        "steamid" => Some("<steamid>"),
        "username" => Some("%USERNAME%"),
        _ => None,
    }
}

/// Rewrites wiki path tokens into environment-style placeholders and
/// strips any template the vocabulary does not cover.
///
/// `{{cn|A|B}}` becomes the components `A` and `B` joined by `sep`.
/// `{{p|game}}` becomes `game_dir` when known, and `%GAMEDIR%` otherwise
/// so the expansion is reported unresolved.
pub fn normalize_wiki_tokens(raw: &str, game_dir: Option<&str>, sep: char) -> String {
    let mut text = map_tokens(raw, game_dir);
    while COMPONENTS.is_match(&text) {
        let joined = COMPONENTS.replace_all(&text, |caps: &Captures<'_>| {
            caps[1]
                .split('|')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(&sep.to_string())
        });
        text = map_tokens(&joined, game_dir);
    }

    strip_templates(&text).trim().to_string()
}

fn map_tokens(text: &str, game_dir: Option<&str>) -> String {
    WIKI_TOKEN
        .replace_all(text, |caps: &Captures<'_>| {
            let name = caps[2].trim().to_ascii_lowercase();
            let replacement = if caps.get(1).is_some() {
                path_token(&name, game_dir)
            } else {
                bare_token(&name).map(str::to_string)
            };
            replacement.unwrap_or_default()
        })
        .into_owned()
}

/// Removes every `{{...}}` template, innermost first.
pub fn strip_templates(text: &str) -> String {
    let mut out = text.to_string();
    while LEFTOVER_TEMPLATE.is_match(&out) {
        out = LEFTOVER_TEMPLATE.replace_all(&out, "").into_owned();
    }
    out
}

/// Removes every `<...>` placeholder.
pub fn strip_angle_placeholders(text: &str) -> String {
    ANGLE_PLACEHOLDER.replace_all(text, "").into_owned()
}

/// True if `text` still holds an account-id marker.
pub fn has_account_marker(text: &str) -> bool {
    ACCOUNT_MARKER.is_match(text)
}

/// Substitutes the application id for `<appid>` markers.
pub(crate) fn fill_app_id(text: &str, app_id: &str) -> String {
    APP_ID_MARKER
        .replace_all(text, regex::NoExpand(app_id))
        .into_owned()
}

/// True if `text` still holds an application id marker.
pub(crate) fn has_app_id_marker(text: &str) -> bool {
    APP_ID_MARKER.is_match(text)
}

/// Splits `text` around its first account-id marker.
pub(crate) fn split_at_account_marker(text: &str) -> Option<(&str, &str)> {
    let m = ACCOUNT_MARKER.find(text)?;
    Some((&text[..m.start()], &text[m.end()..]))
}
