//! Title normalization utilities
//!
//! Pure text helpers used for matching noisy track titles against provider
//! track listings and for presenting consistent capitalization.

use once_cell::sync::Lazy;
use regex::Regex;

/// Words kept lowercase when title-casing.
const STOP_WORDS: [&str; 6] = ["a", "an", "of", "the", "is", "am"];

/// Leading `"1999 - "` style year prefix.
static YEAR_DASH_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}\s*-\s*(.+)$").unwrap());

/// Leading `"(1999)"` style year prefix.
static YEAR_PAREN_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\(\d{4}\)(.+)$").unwrap());

/// Trailing parenthetical suffix: `"Intro (Live)"` -> `"Intro "`.
static TRAILING_PAREN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+)\(.*\)$").unwrap());

/// A bare four-digit year, as it appears among provider tags.
static BARE_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}$").unwrap());

/// Any four-digit run inside a longer date string.
static YEAR_ANYWHERE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").unwrap());

/// Capitalize every whitespace-separated word except a fixed stop-word set.
///
/// Each non-stop word has its first character uppercased and the remainder
/// lowercased; stop words are lowercased entirely. Idempotent.
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let lower = word.to_lowercase();
            if STOP_WORDS.contains(&lower.as_str()) {
                lower
            } else {
                capitalize(word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}

/// Strip decorations from a track or album title so it can be matched against
/// a provider track listing.
///
/// Applied in order, each against the current value (cumulative): leading
/// `"<year> - "` prefix, leading `"(<year>)"` prefix, trailing `"(...)"`
/// suffix, then residual `- _` punctuation. A pattern that does not match
/// passes the value through unchanged. Mojibake apostrophes are normalized to
/// `'` before any pattern runs, and the result is passed through
/// [`title_case`].
pub fn clean_title(title: &str) -> String {
    let title = title.replace("\u{e2}\u{20ac}\u{2122}", "'").replace('\u{2019}', "'");

    let mut value = title.as_str();
    value = strip_match(value, &YEAR_DASH_PREFIX);
    value = strip_match(value, &YEAR_PAREN_PREFIX);
    value = strip_match(value, &TRAILING_PAREN);
    let value = value.trim_matches(|c| c == '-' || c == ' ' || c == '_');

    title_case(value)
}

/// Extract a group-1 match, or pass the value through untouched.
fn strip_match<'a>(value: &'a str, pattern: &Regex) -> &'a str {
    pattern
        .captures(value)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(value)
}

/// Pull the year out of a date tag that may carry a full timestamp
/// (`"2003-05-01"` -> `"2003"`). Returns the last four-digit run so ranges
/// like `"1999/2003"` resolve to the release year.
pub fn extract_year(date: &str) -> Option<String> {
    YEAR_ANYWHERE
        .find_iter(date)
        .last()
        .map(|m| m.as_str().to_string())
}

/// Whether a provider tag is nothing but a four-digit year.
pub fn is_bare_year(tag: &str) -> bool {
    BARE_YEAR.is_match(tag)
}
