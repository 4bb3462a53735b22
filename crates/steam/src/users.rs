//! Per-account folder resolution.
//!
//! Launchers store per-user data under a directory named after the numeric
//! account id. The id of the current user is not known up front, so the
//! folder is picked heuristically: the most recently modified one wins,
//! ties go to the folder with the most entries.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Shortest directory name accepted as an account id.
pub const ACCOUNT_ID_MIN_LEN: usize = 6;

/// A numeric sub-directory considered as the account folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountCandidate {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub entries: usize,
}

/// Returns true if `name` looks like an account id folder.
pub fn is_account_folder_name(name: &str) -> bool {
    name.len() >= ACCOUNT_ID_MIN_LEN && name.bytes().all(|b| b.is_ascii_digit())
}

/// Lists the numeric folders directly under `base`.
///
/// Empty when `base` is unreadable.
pub fn account_candidates(base: &Path) -> Vec<AccountCandidate> {
    let entries = match fs::read_dir(base) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(base = %base.display(), error = %e, "account base not readable");
            return Vec::new();
        }
    };

    let mut candidates = Vec::new();
    for entry in entries.filter_map(Result::ok) {
        if !entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name();
        if !is_account_folder_name(&name.to_string_lossy()) {
            continue;
        }

        let path = entry.path();
        let modified = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        let entries = fs::read_dir(&path).map(|d| d.count()).unwrap_or(0);
        candidates.push(AccountCandidate {
            path,
            modified,
            entries,
        });
    }
    candidates
}

/// Returns the most plausible account folder directly under `base`.
///
/// `None` when `base` is unreadable or holds no numeric folder.
pub fn resolve_account_folder(base: &Path) -> Option<PathBuf> {
    let candidates = account_candidates(base);
    if candidates.len() > 1 {
        tracing::debug!(
            base = %base.display(),
            count = candidates.len(),
            "several account folders, picking the most recent"
        );
    }
    pick_account(candidates)
}

/// Picks the winning candidate: newest modification time, then most entries.
///
/// Full ties keep the lexicographically smallest path so the choice does
/// not depend on directory iteration order.
pub fn pick_account(mut candidates: Vec<AccountCandidate>) -> Option<PathBuf> {
    candidates.sort_by(|a, b| a.path.cmp(&b.path));
    candidates
        .into_iter()
        .reduce(|best, c| {
            if (c.modified, c.entries) > (best.modified, best.entries) {
                c
            } else {
                best
            }
        })
        .map(|c| c.path)
}
