//! Library registry manifest (`libraryfolders.vdf`).
//!
//! The manifest is text VDF. Only the repeated `"path" "<value>"` pairs are
//! needed, so the file is scanned with a pattern instead of being parsed
//! into a tree.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

static PATH_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)"path"\s+"((?:[^"\\]|\\.)*)""#).expect("library path pattern is valid")
});

/// Reads a manifest file and returns the library roots it declares.
///
/// A missing or unreadable manifest yields an empty list.
pub fn library_paths(manifest: &Path) -> Vec<PathBuf> {
    match fs::read_to_string(manifest) {
        Ok(content) => parse_library_paths(&content),
        Err(e) => {
            tracing::debug!(path = %manifest.display(), error = %e, "library manifest not readable");
            Vec::new()
        }
    }
}

/// Extracts every `"path"` value from manifest text, in file order.
pub fn parse_library_paths(content: &str) -> Vec<PathBuf> {
    PATH_ENTRY
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| unescape(m.as_str()))
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// VDF strings escape backslashes and quotes.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
