//! Text normalization applied to both sides of every comparison.
//!
//! Recommendation text and candidate text go through the same function before
//! they are scored; raw strings are never compared. Titles and artists use
//! slightly different rules: artist credits are cut at ensemble and
//! featuring connectors ("and His Orchestra", "& Louis Armstrong"), while
//! titles keep their connectors and only lose qualifiers.

use regex::Regex;
use std::sync::LazyLock;

/// Parenthesised, bracketed and braced qualifiers: "(Live)", "[Remastered]".
static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)|\[[^\]]*\]|\{[^}]*\}").unwrap());

/// Dash-separated qualifiers: "- Remastered 2003", "- Live at Birdland", "- Take 2".
/// A slash only introduces a bare year ("/ 1961"); "A / B" is a medley.
static DASH_QUALIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:\s+[-–—]\s+(?:\d{4}\s+)?(?:(?:(?:digital(?:ly)?\s+)?remaster(?:ed)?|live|mono|stereo|alternate|version|edit|single|bonus|mastered)\b|take\s*\d+\b|\d{4}\b)|\s+/\s+\d{4}\s*$).*$",
    )
    .unwrap()
});

/// Featuring suffix on a title: "Desafinado feat. João Gilberto".
static TITLE_FEATURING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+(?:feat\.?|ft\.?|featuring)\s+.*$").unwrap());

/// Everything from the first secondary-credit connector in an artist credit.
static ARTIST_CONNECTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\s+(?:feat\.?|ft\.?|featuring|with|and)\s+|\s*[&,/+;]\s*).*$").unwrap()
});

/// Normalize a track or work title for comparison.
///
/// Lower-cases, drops bracketed and dash-separated qualifiers and featuring
/// suffixes, spells out `&`, strips punctuation and collapses whitespace.
/// A title made only of qualifiers, like "(Untitled)", falls back to its
/// punctuation-stripped text instead of becoming empty.
///
/// ```rust
/// use standards_playlist::normalize::normalize_title;
///
/// assert_eq!(normalize_title("Waltz For Debby (Live)"), "waltz for debby");
/// assert_eq!(normalize_title("Body & Soul - Remastered 2003"), "body and soul");
/// ```
pub fn normalize_title(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = BRACKETED.replace_all(&lowered, " ");
    let stripped = DASH_QUALIFIER.replace(&stripped, "");
    let stripped = TITLE_FEATURING.replace(&stripped, "");

    let cleaned = clean(&stripped.replace('&', " and "));
    if cleaned.is_empty() {
        clean(&lowered.replace('&', " and "))
    } else {
        cleaned
    }
}

/// Normalize an artist credit for comparison.
///
/// Keeps only the lead credit: "Duke Ellington and His Orchestra" and
/// "Duke Ellington & Johnny Hodges" both become "duke ellington".
///
/// ```rust
/// use standards_playlist::normalize::normalize_artist;
///
/// assert_eq!(normalize_artist("Stan Getz feat. João Gilberto"), "stan getz");
/// assert_eq!(normalize_artist("Thelonious Monk"), "thelonious monk");
/// ```
pub fn normalize_artist(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = BRACKETED.replace_all(&lowered, " ");
    let stripped = ARTIST_CONNECTOR.replace(stripped.trim(), "");

    let cleaned = clean(&stripped);
    if cleaned.is_empty() {
        clean(&lowered)
    } else {
        cleaned
    }
}

/// Drop apostrophes, turn other punctuation into spaces, collapse whitespace.
fn clean(text: &str) -> String {
    let spaced: String = text
        .chars()
        .filter(|c| !matches!(c, '\'' | '’' | '‘' | '`'))
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}
