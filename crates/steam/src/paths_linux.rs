use std::path::{Path, PathBuf};

use crate::SteamError;

/// Returns the Steam base directory on Linux/Unix systems.
pub(crate) fn get_base_dir() -> Result<PathBuf, SteamError> {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or(SteamError::NotFound)?;

    candidate_base_dirs(&home)
        .into_iter()
        .find(|dir| dir.join("steamapps").is_dir() || dir.join("userdata").is_dir())
        .ok_or(SteamError::NotFound)
}

/// Known install locations, most common first: the `~/.steam/steam`
/// symlink, the XDG data dir, then Flatpak and Snap sandboxes.
pub(crate) fn candidate_base_dirs(home: &Path) -> Vec<PathBuf> {
    vec![
        home.join(".steam").join("steam"),
        home.join(".local").join("share").join("Steam"),
        home.join(".var")
            .join("app")
            .join("com.valvesoftware.Steam")
            .join(".local")
            .join("share")
            .join("Steam"),
        home.join("snap")
            .join("steam")
            .join("common")
            .join(".local")
            .join("share")
            .join("Steam"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_start_with_dot_steam() {
        let dirs = candidate_base_dirs(Path::new("/home/deck"));
        assert_eq!(dirs[0], PathBuf::from("/home/deck/.steam/steam"));
        assert!(dirs.iter().any(|d| d.to_string_lossy().contains("com.valvesoftware.Steam")));
    }
}
