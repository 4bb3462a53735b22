//! Save-location template extraction from wikitext.
//!
//! Pages are community-authored, so there is no formal grammar to parse.
//! Instead a handful of template shapes are recognized:
//!
//! - positional rows: `{{Game data/saves|Windows|{{p|appdata}}\Game}}`
//!   (also `Game data/row/PC/Save game data location` and `Path/Steam game data`)
//! - the keyed block: `{{Save game data location|Windows=...|Linux=...}}`
//! - looser keyed blocks: `{{SaveFiles|...}}`, `{{Save files|...}}`, `{{Save game data|...}}`
//!
//! All shapes are first searched inside the "Save game data location"
//! section. If that yields nothing the whole page is searched.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{SaveLocations, TargetOs};

static SAVE_SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)==\s*Save game data location\s*==(.*?)(?:\n==|\z)")
        .expect("section pattern is valid")
});

static GAME_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\|\s*game\s*=\s*([^\n|{}]+)").expect("title pattern is valid")
});

/// Positional row templates: `{{name|OS|path}}`.
const POSITIONAL_FORMS: &[&str] = &[
    "game data/saves",
    "game data/row/pc/save game data location",
    "path/steam game data",
];

/// Keyed block templates: `{{name|OS=path|...}}`.
const KEYED_FORMS: &[&str] = &["save game data location"];

/// Looser keyed blocks seen on older or hand-written pages.
const LOOSE_KEYED_FORMS: &[&str] = &["savefiles", "save files", "save game data"];

/// Result of parsing one documentation page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    pub title: Option<String>,
    pub locations: SaveLocations,
}

/// Extracts the game title and raw save templates from page text.
///
/// Finding nothing is not an error: the returned locations are empty.
pub fn parse_page(text: &str) -> ParsedPage {
    let title = GAME_TITLE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty());

    let mut locations = SaveLocations::default();
    if let Some(section) = SAVE_SECTION.captures(text).and_then(|caps| caps.get(1)) {
        collect_templates(section.as_str(), &mut locations);
    }

    if locations.is_empty() {
        tracing::debug!("no templates in save section, scanning whole page");
        collect_templates(text, &mut locations);
    }

    tracing::debug!(
        windows = locations.get(TargetOs::Windows).len(),
        macos = locations.get(TargetOs::MacOs).len(),
        linux = locations.get(TargetOs::Linux).len(),
        "save templates extracted"
    );

    ParsedPage { title, locations }
}

fn collect_templates(text: &str, locations: &mut SaveLocations) {
    for body in templates(text) {
        let parts = split_top_level(body);
        let Some(name) = parts.first() else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();

        if POSITIONAL_FORMS.contains(&name.as_str()) {
            collect_positional(&parts, locations);
        } else if KEYED_FORMS.contains(&name.as_str()) || LOOSE_KEYED_FORMS.contains(&name.as_str())
        {
            collect_keyed(&parts, locations);
        }
    }
}

/// `{{name|OS|path|path2...}}`: the first non-empty path is taken.
fn collect_positional(parts: &[&str], locations: &mut SaveLocations) {
    let Some(os) = parts.get(1).and_then(|label| TargetOs::from_label(label)) else {
        return;
    };
    if let Some(path) = parts[2.min(parts.len())..]
        .iter()
        .map(|p| p.trim())
        .find(|p| !p.is_empty())
    {
        locations.push(os, path);
    }
}

/// `{{name|OS=path|...}}`: one entry per OS per block, first key wins.
fn collect_keyed(parts: &[&str], locations: &mut SaveLocations) {
    let mut seen: Vec<TargetOs> = Vec::new();
    for part in &parts[1.min(parts.len())..] {
        let Some((key, value)) = part.split_once('=') else {
            continue;
        };
        let Some(os) = TargetOs::from_label(key) else {
            continue;
        };
        if seen.contains(&os) {
            continue;
        }
        let value = value.trim().lines().next().unwrap_or_default().trim();
        if locations.push(os, value) || !value.is_empty() {
            seen.push(os);
        }
    }
}

/// Returns the bodies of every balanced `{{...}}` template in `text`,
/// including nested ones, in order of their opening braces.
fn templates(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while let Some(offset) = text[i..].find("{{") {
        let open = i + offset;
        if let Some(close) = matching_close(bytes, open) {
            out.push(&text[open + 2..close]);
        }
        i = open + 2;
    }
    out
}

/// Index of the `}}` closing the template opened at `open`.
fn matching_close(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut j = open;
    while j + 1 < bytes.len() {
        match (bytes[j], bytes[j + 1]) {
            (b'{', b'{') => {
                depth += 1;
                j += 2;
            }
            (b'}', b'}') => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(j);
                }
                j += 2;
            }
            _ => j += 1,
        }
    }
    None
}

/// Splits a template body on `|` that are not inside a nested template
/// or a `[[link|label]]`.
fn split_top_level(body: &str) -> Vec<&str> {
    let bytes = body.as_bytes();
    let mut parts = Vec::new();
    let mut braces = 0usize;
    let mut links = 0usize;
    let mut start = 0;
    let mut j = 0;
    while j < bytes.len() {
        let pair = bytes.get(j + 1).map(|next| (bytes[j], *next));
        match pair {
            Some((b'{', b'{')) => {
                braces += 1;
                j += 2;
                continue;
            }
            Some((b'}', b'}')) => {
                braces = braces.saturating_sub(1);
                j += 2;
                continue;
            }
            Some((b'[', b'[')) => {
                links += 1;
                j += 2;
                continue;
            }
            Some((b']', b']')) => {
                links = links.saturating_sub(1);
                j += 2;
                continue;
            }
            _ => {}
        }
        if bytes[j] == b'|' && braces == 0 && links == 0 {
            parts.push(&body[start..j]);
            start = j + 1;
        }
        j += 1;
    }
    parts.push(&body[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn windows(page: &ParsedPage) -> Vec<&str> {
        page.locations
            .get(TargetOs::Windows)
            .iter()
            .map(String::as_str)
            .collect()
    }

    #[test]
    fn positional_form_in_section() {
        let text = "==Save game data location==\n{{Game data/saves|Windows|{{p|appdata}}\\MyGame}}\n";
        let page = parse_page(text);
        assert_eq!(windows(&page), vec!["{{p|appdata}}\\MyGame"]);
        assert!(page.locations.get(TargetOs::Linux).is_empty());
    }

    #[test]
    fn positional_form_all_systems_inside_wrapper() {
        let text = r"===Save game data location===
{{Game data|
{{Game data/saves|Windows|{{p|localappdata}}\Foo\Saved\SaveGames}}
{{Game data/saves|OS X|{{p|osxhome}}/Library/Application Support/Foo}}
{{Game data/saves|Linux|{{p|xdgdatahome}}/Foo}}
}}

===Config===
{{Game data/config|Windows|{{p|localappdata}}\Foo\Config}}
";
        let page = parse_page(text);
        assert_eq!(windows(&page), vec![r"{{p|localappdata}}\Foo\Saved\SaveGames"]);
        assert_eq!(
            page.locations.get(TargetOs::MacOs),
            ["{{p|osxhome}}/Library/Application Support/Foo"]
        );
        assert_eq!(page.locations.get(TargetOs::Linux), ["{{p|xdgdatahome}}/Foo"]);
    }

    #[test]
    fn row_and_steam_variants() {
        let text = "== save GAME data location ==\n\
            {{Game data/row/PC/Save game data location|Windows|{{p|documents}}\\Bar}}\n\
            {{Path/Steam game data|Windows|{{p|steam}}\\userdata\\{{p|uid}}\\620\\remote}}\n";
        let page = parse_page(text);
        assert_eq!(
            windows(&page),
            vec![
                "{{p|documents}}\\Bar",
                "{{p|steam}}\\userdata\\{{p|uid}}\\620\\remote",
            ]
        );
    }

    #[test]
    fn nested_tokens_are_not_truncated() {
        let text = "==Save game data location==\n{{Game data/saves|Windows|{{p|userprofile}}\\{{cn|Saves|Sub}}\\x}}";
        let page = parse_page(text);
        assert_eq!(windows(&page), vec!["{{p|userprofile}}\\{{cn|Saves|Sub}}\\x"]);
    }

    #[test]
    fn positional_takes_first_path_only() {
        let text = "==Save game data location==\n{{Game data/saves|Windows|{{p|appdata}}\\A|{{p|appdata}}\\B}}";
        assert_eq!(windows(&parse_page(text)), vec!["{{p|appdata}}\\A"]);
    }

    #[test]
    fn duplicates_are_suppressed_in_order() {
        let text = "==Save game data location==\n\
            {{Game data/saves|Windows|B}}\n{{Game data/saves|Windows|A}}\n{{Game data/saves|Windows|B}}";
        assert_eq!(windows(&parse_page(text)), vec!["B", "A"]);
    }

    #[test]
    fn keyed_form() {
        let text = "==Save game data location==\n{{Save game data location\n\
            |Windows = {{p|appdata}}\\Keyed\n\
            |macOS = ~/Library/Keyed\n\
            |Linux = ~/.local/share/keyed\n}}";
        let page = parse_page(text);
        assert_eq!(windows(&page), vec!["{{p|appdata}}\\Keyed"]);
        assert_eq!(page.locations.get(TargetOs::MacOs), ["~/Library/Keyed"]);
        assert_eq!(page.locations.get(TargetOs::Linux), ["~/.local/share/keyed"]);
    }

    #[test]
    fn keyed_form_first_key_wins() {
        let text = "==Save game data location==\n{{Save game data location|Windows=first|Windows=second}}";
        assert_eq!(windows(&parse_page(text)), vec!["first"]);
    }

    #[test]
    fn loose_forms_found_outside_section() {
        let text = "Intro text\n{{SaveFiles|Windows=%USERPROFILE%\\Loose|Linux=~/loose}}\n";
        let page = parse_page(text);
        assert_eq!(windows(&page), vec!["%USERPROFILE%\\Loose"]);
        assert_eq!(page.locations.get(TargetOs::Linux), ["~/loose"]);
    }

    #[test]
    fn loose_form_case_insensitive() {
        let text = "{{save FILES|Windows=C:\\Games\\X}}";
        assert_eq!(windows(&parse_page(text)), vec!["C:\\Games\\X"]);
    }

    #[test]
    fn section_results_suppress_global_scan() {
        let text = "{{SaveFiles|Windows=outside}}\n==Save game data location==\n{{Game data/saves|Windows|inside}}\n==Other==\n";
        assert_eq!(windows(&parse_page(text)), vec!["inside"]);
    }

    #[test]
    fn section_ends_at_next_heading() {
        let text = "==Save game data location==\nnothing here\n==Other==\n{{Game data/saves|Windows|later}}";
        // The section is empty, so the global scan picks up the later row.
        assert_eq!(windows(&parse_page(text)), vec!["later"]);
    }

    #[test]
    fn no_templates_is_empty_not_error() {
        let page = parse_page("== Gameplay ==\nJust prose, no templates.");
        assert!(page.locations.is_empty());
        assert_eq!(page.title, None);
    }

    #[test]
    fn unknown_os_labels_are_ignored() {
        let text = "==Save game data location==\n{{Game data/saves|Steam|{{p|steam}}\\x}}";
        assert!(parse_page(text).locations.is_empty());
    }

    #[test]
    fn extracts_title() {
        let text = "{{Infobox game\n|cover = Foo.jpg\n}}\n{{Game data|\n|game = Foo Quest\n}}";
        assert_eq!(parse_page(text).title.as_deref(), Some("Foo Quest"));
    }

    #[test]
    fn unbalanced_template_is_skipped() {
        let text = "==Save game data location==\n{{Game data/saves|Windows|{{p|appdata}\\broken\n";
        assert!(parse_page(text).locations.is_empty());
    }

    #[test]
    fn split_respects_nesting_and_links() {
        let parts = split_top_level("a|{{p|b}}|[[c|d]]|e");
        assert_eq!(parts, vec!["a", "{{p|b}}", "[[c|d]]", "e"]);
    }
}
