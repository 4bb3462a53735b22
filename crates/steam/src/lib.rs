//! Steam filesystem layout: install detection, library folders and
//! per-account `userdata` directories.

pub mod paths;
#[cfg(target_os = "linux")]
mod paths_linux;
#[cfg(target_os = "windows")]
mod paths_windows;
pub mod users;
pub mod vdf;

// Re-export primary types.
pub use paths::Paths;
pub use users::{
    ACCOUNT_ID_MIN_LEN, AccountCandidate, account_candidates, is_account_folder_name, pick_account,
    resolve_account_folder,
};
pub use vdf::{library_paths, parse_library_paths};

/// Errors for Steam operations.
#[derive(Debug, thiserror::Error)]
pub enum SteamError {
    #[error("steam installation not found")]
    NotFound,
}
