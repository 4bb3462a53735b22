//! Windows templates rewritten into a Proton prefix.
//!
//! A Windows game run through the compatibility layer keeps its data in
//! `<library>/steamapps/compatdata/<app_id>/pfx`, a tree that mimics a
//! Windows drive for the fixed user `steamuser`.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use savescout_steam::paths::{compatdata_dir, prefix_dir};
use savescout_steam::{is_account_folder_name, resolve_account_folder};

use crate::host::HostDirs;
use crate::placeholders::{
    PERCENT_VAR, WinRoot, normalize_wiki_tokens, split_at_account_marker,
    strip_angle_placeholders, strip_templates,
};

static DRIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]:[\\/]*").expect("drive pattern is valid"));

static ANCHORED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[A-Za-z]:|%([^%]+)%)").expect("anchor pattern is valid"));

static SLASH_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/{2,}").expect("separator pattern is valid"));

/// Maps Windows templates into the prefix of a Steam app.
#[derive(Debug, Clone, Default)]
pub struct CompatTranslator {
    libraries: Vec<PathBuf>,
    steam_root: Option<PathBuf>,
}

impl CompatTranslator {
    /// Creates a translator over the given Steam library roots.
    pub fn new(libraries: Vec<PathBuf>) -> Self {
        Self {
            libraries,
            steam_root: None,
        }
    }

    /// Uses the libraries and Steam install of `host`.
    pub fn from_host(host: &HostDirs) -> Self {
        Self {
            libraries: host.steam_libraries.clone(),
            steam_root: host.steam_root.clone(),
        }
    }

    /// Sets the native Steam install that `%STEAM%` points to.
    pub fn with_steam_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.steam_root = Some(root.into());
        self
    }

    /// Library roots searched for prefixes.
    pub fn libraries(&self) -> &[PathBuf] {
        &self.libraries
    }

    /// Finds the prefix of `app_id`.
    ///
    /// The first library holding the prefix wins. Failing that, the first
    /// library with a `compatdata` folder is assumed to be the one the
    /// game will use.
    pub fn sandbox_for(&self, app_id: &str) -> Option<PathBuf> {
        if let Some(lib) = self
            .libraries
            .iter()
            .find(|lib| prefix_dir(lib, app_id).is_dir())
        {
            return Some(prefix_dir(lib, app_id));
        }
        self.libraries
            .iter()
            .find(|lib| compatdata_dir(lib).is_dir())
            .map(|lib| prefix_dir(lib, app_id))
    }

    /// Translates a Windows template into the prefix of `app_id`.
    ///
    /// Returns `None` when no prefix can be located or the template is
    /// not anchored at a drive or a known root. The result never holds a
    /// placeholder.
    pub fn translate(&self, raw: &str, app_id: &str, account_hint: Option<&str>) -> Option<String> {
        let sandbox = self.sandbox_for(app_id)?;
        let text = normalize_wiki_tokens(raw, None, '/');
        let Some(anchor) = ANCHORED.captures(&text) else {
            tracing::debug!(template = raw, "template not anchored, skipping translation");
            return None;
        };
        if let Some(var) = anchor.get(1) {
            if self.root_in_sandbox(var.as_str(), &sandbox).is_none() {
                tracing::debug!(template = raw, root = var.as_str(), "root unknown in prefix");
                return None;
            }
        }

        let drive_c = path_text(&sandbox.join("drive_c"));
        let text = DRIVE.replace(&text, |_: &Captures<'_>| format!("{drive_c}/"));
        let text = PERCENT_VAR.replace_all(&text, |caps: &Captures<'_>| {
            self.root_in_sandbox(&caps[1], &sandbox).unwrap_or_default()
        });
        let mut path = to_forward(&text);

        while let Some((before, after)) = split_at_account_marker(&path) {
            let base = before.trim_end_matches('/');
            let rest = after.trim_start_matches('/');
            let account = resolve_account_folder(Path::new(base))
                .map(|p| path_text(&p))
                .or_else(|| {
                    account_hint
                        .filter(|h| is_account_folder_name(h))
                        .map(|h| format!("{base}/{h}"))
                })
                .unwrap_or_else(|| base.to_string());
            path = format!("{account}/{rest}");
        }

        let path = strip_angle_placeholders(&strip_templates(&path));
        let path = PERCENT_VAR.replace_all(&path, "");
        let path = to_forward(&path);
        let path = path.trim_end_matches('/').to_string();

        tracing::debug!(app_id, template = raw, path = %path, "translated into prefix");
        Some(path)
    }

    fn root_in_sandbox(&self, var: &str, sandbox: &Path) -> Option<String> {
        let root = WinRoot::from_var(var)?;
        match root {
            WinRoot::UserName => Some("steamuser".to_string()),
            WinRoot::Steam => self.steam_root.as_deref().map(path_text),
            WinRoot::SteamUserData => self
                .steam_root
                .as_ref()
                .map(|r| path_text(&r.join("userdata"))),
            _ => root.prefix_relative().map(|rel| path_text(&sandbox.join(rel))),
        }
    }
}

fn path_text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn to_forward(text: &str) -> String {
    SLASH_RUN
        .replace_all(&text.replace('\\', "/"), "/")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn library_with_prefix(app_id: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let pfx = prefix_dir(dir.path(), app_id);
        fs::create_dir_all(&pfx).unwrap();
        (dir, pfx)
    }

    #[test]
    fn appdata_into_prefix() {
        let (dir, pfx) = library_with_prefix("620");
        let t = CompatTranslator::new(vec![dir.path().to_path_buf()]);
        let out = t.translate("{{p|appdata}}\\MyGame", "620", None).unwrap();
        let expected = pfx.join("drive_c/users/steamuser/AppData/Roaming/MyGame");
        assert_eq!(out, expected.to_string_lossy());
    }

    #[test]
    fn component_template_inside_prefix() {
        let (dir, pfx) = library_with_prefix("50");
        let t = CompatTranslator::new(vec![dir.path().to_path_buf()]);
        let out = t
            .translate("{{p|appdata}}\\{{cn|Microsoft|Halo}}\\Saves", "50", None)
            .unwrap();
        let expected = pfx.join("drive_c/users/steamuser/AppData/Roaming/Microsoft/Halo/Saves");
        assert_eq!(out, expected.to_string_lossy());
    }

    #[test]
    fn drive_letter_maps_to_drive_c() {
        let (dir, pfx) = library_with_prefix("70");
        let t = CompatTranslator::new(vec![dir.path().to_path_buf()]);
        let out = t.translate("C:\\Games\\Half-Life\\save", "70", None).unwrap();
        assert_eq!(out, pfx.join("drive_c/Games/Half-Life/save").to_string_lossy());
    }

    #[test]
    fn prefers_library_holding_the_prefix() {
        let empty = tempfile::tempdir().unwrap();
        fs::create_dir_all(compatdata_dir(empty.path())).unwrap();
        let (dir, pfx) = library_with_prefix("620");

        let t = CompatTranslator::new(vec![empty.path().to_path_buf(), dir.path().to_path_buf()]);
        assert_eq!(t.sandbox_for("620"), Some(pfx));
        assert_eq!(t.sandbox_for("999"), Some(prefix_dir(empty.path(), "999")));
    }

    #[test]
    fn no_library_means_no_translation() {
        let t = CompatTranslator::new(Vec::new());
        assert_eq!(t.translate("{{p|appdata}}\\MyGame", "620", None), None);

        let missing = tempfile::tempdir().unwrap();
        let t = CompatTranslator::new(vec![missing.path().join("nope")]);
        assert_eq!(t.sandbox_for("620"), None);
    }

    #[test]
    fn relative_template_is_skipped() {
        let (dir, _) = library_with_prefix("620");
        let t = CompatTranslator::new(vec![dir.path().to_path_buf()]);
        assert_eq!(t.translate("{{p|game}}\\saves", "620", None), None);
    }

    #[test]
    fn output_never_holds_placeholders() {
        let (dir, _) = library_with_prefix("620");
        let t = CompatTranslator::new(vec![dir.path().to_path_buf()]);
        let templates = [
            "{{p|steam}}\\userdata\\{{p|uid}}\\620\\remote",
            "{{p|appdata}}\\Game\\<steamid>\\{{note|x}}",
            "%USERPROFILE%\\Documents\\%UNKNOWN%\\Game",
            "{{p|localappdata}}\\{{p|username}}\\saves",
        ];
        for template in templates {
            if let Some(out) = t.translate(template, "620", None) {
                assert!(!out.contains('<'), "{out}");
                assert!(!out.contains('>'), "{out}");
                assert!(!out.contains("{{"), "{out}");
                assert!(!out.contains('%'), "{out}");
            }
        }
    }

    #[test]
    fn account_resolved_inside_steam_root() {
        let (dir, _) = library_with_prefix("620");
        let steam = tempfile::tempdir().unwrap();
        fs::create_dir_all(steam.path().join("userdata").join("4444444")).unwrap();

        let t = CompatTranslator::new(vec![dir.path().to_path_buf()]).with_steam_root(steam.path());
        let out = t
            .translate("{{p|steam}}\\userdata\\{{p|uid}}\\620", "620", None)
            .unwrap();
        assert_eq!(
            out,
            steam.path().join("userdata/4444444/620").to_string_lossy()
        );
    }

    #[test]
    fn steam_root_needed_for_steam_templates() {
        let (dir, _) = library_with_prefix("620");
        let t = CompatTranslator::new(vec![dir.path().to_path_buf()]);
        assert_eq!(
            t.translate("{{p|steam}}\\userdata\\{{p|uid}}\\620", "620", None),
            None
        );
    }

    #[test]
    fn username_is_steamuser() {
        let (dir, pfx) = library_with_prefix("620");
        let t = CompatTranslator::new(vec![dir.path().to_path_buf()]);
        let out = t
            .translate("C:\\Users\\{{p|username}}\\Game", "620", None)
            .unwrap();
        assert_eq!(out, pfx.join("drive_c/Users/steamuser/Game").to_string_lossy());
    }
}
