//! Canonical song-name normalization.
//!
//! Pure string transforms, no I/O. The entry point is
//! [`build_correct_song_name`], which turns raw artist/title tags into the
//! deterministic `"Artist1, Artist2 - Title"` form used for renames and for
//! the identity hash. Re-applying the pipeline to an already-normalized name
//! yields the same name.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use any_ascii::any_ascii;
use regex::Regex;

/// Small connector words kept lowercase unless they start the name.
const LOWERCASE_CONNECTORS: &[&str] = &["and", "at", "of", "the", "is"];

static CYRILLIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\u{0400}-\u{04ff}]").expect("cyrillic regex"));

static ORIGINAL_MIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\(\s*original(\s+mix)?\s*\)\s*$").expect("orig mix regex"));

// Featuring markers in their three positional shapes: parenthesized,
// mid-string before a " - ", and trailing.
static FEAT_PAREN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[(\[]\s*\b(?:featuring|feat\.?|ft\.)\s+([^)\]]+)[)\]]").expect("feat regex")
});
static FEAT_DASH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:featuring|feat\.?|ft\.)\s+(.+?)\s+-").expect("feat regex")
});
static FEAT_TRAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:featuring|feat\.?|ft\.)\s+([^)\]]+?)[)\]]?\s*$").expect("feat regex")
});

/// Whether `text` contains characters from the Cyrillic Unicode block.
pub fn has_cyrillic(text: &str) -> bool {
    CYRILLIC_RE.is_match(text)
}

/// Replace filesystem-hostile characters.
///
/// `? : . _ \ / | < >` and the stray control characters become spaces, `*`
/// becomes `x`, and the resulting `( ` / ` )` gaps are squeezed shut.
pub fn remove_special_characters(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '?' | ':' | '.' | '_' | '\\' | '/' | '|' | '<' | '>' | '\u{19}' | '\u{1}' => {
                out.push(' ')
            }
            '*' => out.push('x'),
            _ => out.push(ch),
        }
    }
    out.replace("( ", "(").replace(" )", ")")
}

/// Collapse runs of whitespace into single spaces, trimming the ends.
pub fn multi_space_removal(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip a trailing `(original mix)` / `(original)` marker, case-insensitive,
/// tolerating extra internal whitespace. Anything else is left untouched.
pub fn remove_original_mix(text: &str) -> String {
    ORIGINAL_MIX_RE.replace(text, "").trim().to_string()
}

fn split_artist_names(raw: &str) -> Vec<String> {
    raw.split([',', '&'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Pull "featuring" credits out of `text`.
///
/// Returns the text with the credit removed plus the extracted artist names.
/// A string without a marker passes through unchanged.
pub fn extract_featured_artists(text: &str) -> (String, Vec<String>) {
    let mut out = text.to_string();
    let mut found = Vec::new();

    if let Some(caps) = FEAT_PAREN_RE.captures(&out) {
        found.extend(split_artist_names(&caps[1]));
        let range = caps.get(0).expect("whole match").range();
        out.replace_range(range, " ");
    }
    if let Some(caps) = FEAT_DASH_RE.captures(&out) {
        found.extend(split_artist_names(&caps[1]));
        let range = caps.get(0).expect("whole match").range();
        out.replace_range(range, "-");
    }
    if let Some(caps) = FEAT_TRAIL_RE.captures(&out) {
        found.extend(split_artist_names(&caps[1]));
        let range = caps.get(0).expect("whole match").range();
        out.replace_range(range, "");
    }

    (multi_space_removal(&out), found)
}

fn capitalize_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn recapitalize_after_openers(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending = false;
    for ch in text.chars() {
        if pending {
            if ch.is_alphabetic() {
                out.extend(ch.to_uppercase());
                pending = false;
                continue;
            }
            if !ch.is_whitespace() && !matches!(ch, '(' | '[' | ',' | '\'' | '"') {
                pending = false;
            }
        }
        if matches!(ch, '(' | '[' | ',' | '\'' | '"') {
            pending = true;
        }
        out.push(ch);
    }
    out
}

/// Title-case every word, lowercase the small connector words (never at the
/// start), then restore capitals directly after an opening paren, bracket,
/// comma or quote so things like `(Jake Remix)` survive the connector pass.
pub fn style_song_name(text: &str) -> String {
    let mut words: Vec<String> = text.split_whitespace().map(capitalize_word).collect();
    for word in words.iter_mut().skip(1) {
        if LOWERCASE_CONNECTORS.contains(&word.to_lowercase().as_str()) {
            *word = word.to_lowercase();
        }
    }
    recapitalize_after_openers(&words.join(" "))
}

fn base_clean(text: &str) -> String {
    multi_space_removal(&remove_special_characters(&any_ascii(text)))
}

/// Build the canonical `"Artists - Title"` name from raw tag values.
///
/// Artists are individually cleaned and styled (the `(original mix)` strip
/// applies to the title only), featuring credits found in the title or inside
/// any artist string are merged into the artist set, and the final set is
/// deduplicated case-insensitively and sorted alphabetically.
pub fn build_correct_song_name(artists: &[String], title: &str) -> String {
    let mut pool: Vec<String> = Vec::new();

    for artist in artists {
        let cleaned = base_clean(artist);
        let (primary, featured) = extract_featured_artists(&cleaned);
        if !primary.is_empty() {
            pool.push(style_song_name(&primary));
        }
        pool.extend(featured.iter().map(|name| style_song_name(name)));
    }

    let cleaned_title = remove_original_mix(&base_clean(title));
    let (stripped_title, featured) = extract_featured_artists(&cleaned_title);
    pool.extend(featured.iter().map(|name| style_song_name(name)));
    let styled_title = style_song_name(&stripped_title);

    // Case-insensitive dedupe, alphabetical order, first casing wins.
    let mut unique: BTreeMap<String, String> = BTreeMap::new();
    for name in pool {
        unique.entry(name.to_lowercase()).or_insert(name);
    }
    let joined: Vec<&str> = unique.values().map(String::as_str).collect();

    format!("{} - {}", joined.join(", "), styled_title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_cyrillic_text() {
        assert!(!has_cyrillic("Hello, world!"));
        assert!(has_cyrillic("Привет, мир!"));
    }

    #[test]
    fn removes_special_characters() {
        let text = "Hi?my:name.is\u{19}a\u{1}big|j( * )dp>and<this/is\\my_crib..";
        assert_eq!(
            "Hi my name is a big j(x)dp and this is my crib  ",
            remove_special_characters(text)
        );
    }

    #[test]
    fn collapses_multiple_spaces() {
        let text = "What do  you    think about too many    spaces?";
        assert_eq!(
            "What do you think about too many spaces?",
            multi_space_removal(text)
        );
    }

    #[test]
    fn strips_original_mix_suffix() {
        assert_eq!("test", remove_original_mix("test (original mix)"));
        assert_eq!("test", remove_original_mix("test (ORIGINAL  Mix )"));
        assert_eq!("test", remove_original_mix("test (original)"));
        // No trailing marker, nothing to strip.
        assert_eq!(
            "original mix (OriginAl MiXalot)",
            remove_original_mix("original mix (OriginAl MiXalot)")
        );
    }

    #[test]
    fn extracts_parenthesized_featuring() {
        let (rest, found) = extract_featured_artists("Song Name (feat. Jake)");
        assert_eq!("Song Name", rest);
        assert_eq!(vec!["Jake"], found);

        let (rest, found) = extract_featured_artists("Song [ft. A, B]");
        assert_eq!("Song", rest);
        assert_eq!(vec!["A", "B"], found);
    }

    #[test]
    fn extracts_trailing_featuring() {
        let (rest, found) = extract_featured_artists("Song Name featuring Jake & Jane");
        assert_eq!("Song Name", rest);
        assert_eq!(vec!["Jake", "Jane"], found);
    }

    #[test]
    fn extracts_featuring_before_dash() {
        let (rest, found) = extract_featured_artists("Artist feat Jake - Song");
        assert_eq!("Artist - Song", rest);
        assert_eq!(vec!["Jake"], found);
    }

    #[test]
    fn leaves_text_without_marker_alone() {
        let (rest, found) = extract_featured_artists("A Feature Film");
        assert_eq!("A Feature Film", rest);
        assert!(found.is_empty());
    }

    #[test]
    fn styles_words_with_connectors() {
        assert_eq!("Best of the Best", style_song_name("best OF THE best"));
        assert_eq!("The Start", style_song_name("the start"));
        assert_eq!("Song (Jake Remix)", style_song_name("SONG (jake remix)"));
    }

    #[test]
    fn builds_sorted_deduplicated_artist_list() {
        let artists = vec!["JDP".to_string(), "JakeDaPhunk".to_string()];
        assert_eq!(
            "Jakedaphunk, Jdp - Frequencies",
            build_correct_song_name(&artists, "frequencies")
        );
    }

    #[test]
    fn merges_featured_artists_from_title() {
        let artists = vec!["jdp".to_string()];
        assert_eq!(
            "Jdp, Mc Gee - Cool Song",
            build_correct_song_name(&artists, "cool song (feat. MC Gee)")
        );
    }

    #[test]
    fn merges_featured_artists_from_artist_string() {
        let artists = vec!["JDP feat. Jane".to_string()];
        assert_eq!(
            "Jane, Jdp - Tune",
            build_correct_song_name(&artists, "tune")
        );
    }

    #[test]
    fn transliterates_to_ascii() {
        let artists = vec!["Motörhead".to_string()];
        assert_eq!(
            "Motorhead - Ubertune",
            build_correct_song_name(&artists, "übertune")
        );
    }

    #[test]
    fn canonical_name_is_idempotent() {
        let artists = vec!["JDP".to_string(), "JakeDaPhunk".to_string()];
        let first = build_correct_song_name(&artists, "frequencies (Original Mix)");
        let (raw_artists, raw_title) = first.split_once(" - ").expect("separator");
        let reparsed: Vec<String> = raw_artists.split(',').map(|a| a.trim().to_string()).collect();
        let second = build_correct_song_name(&reparsed, raw_title);
        assert_eq!(first, second);
    }

    #[test]
    fn deduplicates_artists_case_insensitively() {
        let artists = vec!["jdp".to_string(), "JDP".to_string()];
        assert_eq!("Jdp - Track", build_correct_song_name(&artists, "track"));
    }
}
