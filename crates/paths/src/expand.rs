//! Raw template to concrete path.

use std::path::Path;

use savescout_steam::{account_candidates, is_account_folder_name, pick_account};

use crate::placeholders::{
    PERCENT_VAR, fill_app_id, has_account_marker, has_app_id_marker, normalize_wiki_tokens,
    split_at_account_marker,
};
use crate::strategy::OsStrategy;

/// Per-game inputs to expansion.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpandContext<'a> {
    /// Numeric application id, filled into `<appid>` markers.
    pub app_id: Option<&'a str>,
    /// Folder of the game executable, substituted for `{{p|game}}`.
    pub game_dir: Option<&'a str>,
    /// Account folder name used when none can be discovered on disk.
    pub account_hint: Option<&'a str>,
}

/// Result of expanding one template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub path: String,
    /// A placeholder survived expansion; the path is not trustworthy.
    pub unresolved: bool,
    /// Several account folders were found and one was picked.
    pub ambiguous_account: bool,
}

/// Expands a raw template for the strategy's target system.
///
/// Never fails: unknown placeholders stay in the output and mark the
/// expansion unresolved.
pub fn expand(raw: &str, strategy: &dyn OsStrategy, ctx: &ExpandContext<'_>) -> Expansion {
    let mut text = normalize_wiki_tokens(raw, ctx.game_dir, strategy.separator());
    if let Some(app_id) = ctx.app_id {
        text = fill_app_id(&text, app_id);
    }

    let text = strategy.expand_placeholders(&text);
    let mut path = strategy.normalize_separators(&text);
    let sep = strategy.separator();
    let mut ambiguous_account = false;

    while let Some((before, after)) = split_at_account_marker(&path) {
        let base = before.trim_end_matches(sep);
        let rest = after.trim_start_matches(sep);

        let candidates = account_candidates(Path::new(base));
        ambiguous_account |= candidates.len() > 1;
        let found = pick_account(candidates).map(|p| p.to_string_lossy().into_owned());
        let hinted = || {
            ctx.account_hint
                .filter(|h| is_account_folder_name(h))
                .map(|h| format!("{base}{sep}{h}"))
        };
        let Some(account) = found.or_else(hinted) else {
            tracing::debug!(template = raw, base, "account folder not resolved");
            break;
        };
        path = if rest.is_empty() {
            account
        } else {
            format!("{account}{sep}{rest}")
        };
    }

    let unresolved =
        has_account_marker(&path) || has_app_id_marker(&path) || PERCENT_VAR.is_match(&path);
    Expansion {
        path,
        unresolved,
        ambiguous_account,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::HostDirs;
    use crate::strategy::{UnixStrategy, WindowsStrategy};
    use savescout_wiki::TargetOs;
    use std::fs;

    fn windows() -> WindowsStrategy {
        WindowsStrategy::new(HostDirs::for_windows_profile("C:\\Users\\tester"))
    }

    #[test]
    fn appdata_template_on_windows() {
        let out = expand("{{p|appdata}}\\Save", &windows(), &ExpandContext::default());
        assert_eq!(out.path, "C:\\Users\\tester\\AppData\\Roaming\\Save");
        assert!(!out.unresolved);
        assert!(!out.path.contains('%'));
        assert!(!out.path.contains("{{"));
    }

    #[test]
    fn plain_paths_are_idempotent() {
        let ctx = ExpandContext::default();
        let win = windows();
        assert_eq!(expand("D:\\Games\\Foo", &win, &ctx).path, "D:\\Games\\Foo");
        assert_eq!(expand("D:/Games//Foo", &win, &ctx).path, "D:\\Games\\Foo");

        let unix = UnixStrategy::new(TargetOs::Linux, HostDirs::for_unix_home("/home/deck"));
        let once = expand("/opt/game//saves", &unix, &ctx).path;
        assert_eq!(once, "/opt/game/saves");
        assert_eq!(expand(&once, &unix, &ctx).path, once);
    }

    #[test]
    fn account_marker_resolved_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let userdata = dir.path().join("userdata");
        fs::create_dir_all(userdata.join("76561197960287930")).unwrap();
        fs::create_dir_all(userdata.join("12345")).unwrap();

        let host = HostDirs::for_unix_home("/home/deck").with_steam(dir.path(), Vec::new());
        let unix = UnixStrategy::new(TargetOs::Linux, host);
        let out = expand(
            "{{p|steam}}/userdata/{{p|uid}}/620/remote",
            &unix,
            &ExpandContext::default(),
        );

        let expected = userdata.join("76561197960287930").join("620").join("remote");
        assert_eq!(out.path, expected.to_string_lossy());
        assert!(!out.unresolved);
        assert!(!out.ambiguous_account);
    }

    #[test]
    fn several_accounts_flag_ambiguity() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("userdata").join("1000001")).unwrap();
        fs::create_dir_all(dir.path().join("userdata").join("1000002")).unwrap();

        let host = HostDirs::for_unix_home("/home/deck").with_steam(dir.path(), Vec::new());
        let unix = UnixStrategy::new(TargetOs::Linux, host);
        let out = expand("%STEAMUSERDATA%/<userid>/7", &unix, &ExpandContext::default());
        assert!(out.ambiguous_account);
        assert!(!out.unresolved);
    }

    #[test]
    fn account_hint_used_when_nothing_on_disk() {
        let ctx = ExpandContext {
            account_hint: Some("1234567"),
            ..Default::default()
        };
        let out = expand("{{p|steam}}\\userdata\\{{p|uid}}\\620", &windows(), &ctx);
        assert_eq!(
            out.path,
            "C:\\Program Files (x86)\\Steam\\userdata\\1234567\\620"
        );
        assert!(!out.unresolved);
    }

    #[test]
    fn unresolved_account_marker_stays_visible() {
        let out = expand(
            "{{p|steam}}\\userdata\\{{p|uid}}\\620",
            &windows(),
            &ExpandContext::default(),
        );
        assert!(out.path.contains("<userid>"));
        assert!(out.unresolved);
    }

    #[test]
    fn game_dir_and_app_id() {
        let ctx = ExpandContext {
            app_id: Some("620"),
            game_dir: Some("/games/portal"),
            account_hint: None,
        };
        let unix = UnixStrategy::new(TargetOs::Linux, HostDirs::for_unix_home("/home/deck"));
        assert_eq!(
            expand("{{p|game}}/save", &unix, &ctx).path,
            "/games/portal/save"
        );
        assert_eq!(
            expand("{{p|proton}}/users/steamuser", &unix, &ctx).path,
            "/home/deck/.steam/steam/steamapps/compatdata/620/pfx/drive_c/users/steamuser"
        );
    }

    #[test]
    fn token_names_ignore_case() {
        let out = expand("{{P|AppData}}\\Game", &windows(), &ExpandContext::default());
        assert_eq!(out.path, "C:\\Users\\tester\\AppData\\Roaming\\Game");
        assert!(!out.unresolved);
    }

    #[test]
    fn component_template_keeps_folders() {
        let out = expand(
            "{{p|appdata}}\\{{cn|Microsoft|Halo}}\\Saves",
            &windows(),
            &ExpandContext::default(),
        );
        assert_eq!(
            out.path,
            "C:\\Users\\tester\\AppData\\Roaming\\Microsoft\\Halo\\Saves"
        );
    }

    #[test]
    fn game_token_without_executable_is_unresolved() {
        let ctx = ExpandContext::default();
        let win = expand("{{p|game}}\\saves", &windows(), &ctx);
        assert_eq!(win.path, "%GAMEDIR%\\saves");
        assert!(win.unresolved);

        let unix = UnixStrategy::new(TargetOs::Linux, HostDirs::for_unix_home("/home/deck"));
        let out = expand("{{p|game}}/saves", &unix, &ctx);
        assert!(!out.path.starts_with('/'));
        assert!(out.unresolved);
    }

    #[test]
    fn unknown_variable_flags_unresolved() {
        let out = expand("%MYGAMEDIR%\\Save", &windows(), &ExpandContext::default());
        assert_eq!(out.path, "%MYGAMEDIR%\\Save");
        assert!(out.unresolved);
    }
}
