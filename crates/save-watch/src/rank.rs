//! Turning raw write events into a shortlist.

use std::collections::HashMap;
use std::fs;
use std::time::SystemTime;

use savescout_paths::NoisePath;

use crate::observer::ObservedWriteEvent;

/// Orders directories by write count, then by on-disk modification time,
/// newest first.
pub fn rank(events: &[ObservedWriteEvent]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for event in events {
        *counts.entry(event.parent.as_str()).or_default() += 1;
    }

    let mut ranked: Vec<(&str, usize, SystemTime)> = counts
        .into_iter()
        .map(|(path, count)| {
            let modified = fs::metadata(path)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (path, count, modified)
        })
        .collect();

    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(b.2.cmp(&a.2)).then(a.0.cmp(b.0)));
    ranked.into_iter().map(|(path, ..)| path.to_string()).collect()
}

/// Drops paths lying in a denylisted directory.
pub fn filter_system_paths(paths: Vec<String>, denylist: &[NoisePath]) -> Vec<String> {
    paths
        .into_iter()
        .filter(|path| match denylist.iter().find(|noise| noise.matches(path)) {
            Some(noise) => {
                tracing::trace!(path = %path, ?noise, "dropped noisy path");
                false
            }
            None => true,
        })
        .collect()
}
