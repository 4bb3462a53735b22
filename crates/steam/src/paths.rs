use std::path::{Path, PathBuf};

use crate::SteamError;

/// Directory name of the per-app compatibility prefixes inside a library.
pub const COMPATDATA_DIR: &str = "compatdata";

/// Sub-directory of a compatdata entry holding the emulated Windows root.
pub const PREFIX_DIR: &str = "pfx";

/// Provides access to Steam directory paths.
#[derive(Debug, Clone)]
pub struct Paths {
    base_dir: PathBuf,
}

impl Paths {
    /// Creates a new `Paths` instance with auto-detected Steam directory.
    pub fn new() -> Result<Self, SteamError> {
        let base_dir = get_base_dir()?;
        Ok(Self { base_dir })
    }

    /// Creates a new `Paths` instance with a custom base directory.
    pub fn with_base(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Returns the Steam base directory.
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Returns the userdata directory.
    pub fn user_data_dir(&self) -> PathBuf {
        self.base_dir.join("userdata")
    }

    /// Returns the `steamapps` directory of the default library.
    pub fn steamapps_dir(&self) -> PathBuf {
        steamapps_dir(&self.base_dir)
    }

    /// Candidate locations of the library registry manifest, newest layout first.
    pub fn library_manifests(&self) -> [PathBuf; 2] {
        [
            self.base_dir.join("config").join("libraryfolders.vdf"),
            self.steamapps_dir().join("libraryfolders.vdf"),
        ]
    }

    /// Returns every known library root: the install itself followed by
    /// the additional libraries declared in the registry manifest.
    ///
    /// Duplicates are removed, keeping the first occurrence.
    pub fn library_roots(&self) -> Vec<PathBuf> {
        let mut roots = vec![self.base_dir.clone()];
        for manifest in self.library_manifests() {
            for root in crate::vdf::library_paths(&manifest) {
                if !roots.iter().any(|r| same_dir(r, &root)) {
                    roots.push(root);
                }
            }
        }
        roots
    }
}

/// Returns `<library>/steamapps`.
pub fn steamapps_dir(library_root: &Path) -> PathBuf {
    library_root.join("steamapps")
}

/// Returns `<library>/steamapps/compatdata`.
pub fn compatdata_dir(library_root: &Path) -> PathBuf {
    steamapps_dir(library_root).join(COMPATDATA_DIR)
}

/// Returns the emulated Windows root of an app: `<library>/steamapps/compatdata/<app_id>/pfx`.
pub fn prefix_dir(library_root: &Path, app_id: &str) -> PathBuf {
    compatdata_dir(library_root).join(app_id).join(PREFIX_DIR)
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

// Platform-specific base directory detection.
#[cfg(target_os = "linux")]
fn get_base_dir() -> Result<PathBuf, SteamError> {
    crate::paths_linux::get_base_dir()
}

#[cfg(target_os = "windows")]
fn get_base_dir() -> Result<PathBuf, SteamError> {
    crate::paths_windows::get_base_dir()
}

#[cfg(target_os = "macos")]
fn get_base_dir() -> Result<PathBuf, SteamError> {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or(SteamError::NotFound)?;
    let steam_dir = home
        .join("Library")
        .join("Application Support")
        .join("Steam");
    if steam_dir.exists() {
        return Ok(steam_dir);
    }
    Err(SteamError::NotFound)
}

#[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
fn get_base_dir() -> Result<PathBuf, SteamError> {
    Err(SteamError::NotFound)
}
