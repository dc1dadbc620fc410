//! String similarity scores in `[0, 1]`.
//!
//! All functions are pure and expect already-normalized input (see
//! [`crate::normalize`]). Edit-distance ratios come from `strsim`; the
//! token-based variants make the score tolerant of word order and of extra
//! words on one side ("Bill Evans" vs "Bill Evans Trio").

use std::collections::BTreeSet;
use strsim::normalized_levenshtein;

/// Edit-distance ratio between two strings.
///
/// Two empty strings are identical; an empty string against a non-empty one
/// scores 0.
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    normalized_levenshtein(a, b)
}

/// Ratio after sorting the words of both strings.
///
/// ```rust
/// use standards_playlist::similarity::token_sort_ratio;
///
/// assert_eq!(token_sort_ratio("davis miles", "miles davis"), 1.0);
/// ```
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Ratio over shared and differing word sets.
///
/// Scores 1 when the words of one string are a subset of the other's, so an
/// ensemble name still matches its leader.
///
/// ```rust
/// use standards_playlist::similarity::token_set_ratio;
///
/// assert_eq!(token_set_ratio("bill evans", "bill evans trio"), 1.0);
/// assert!(token_set_ratio("bill evans", "gil evans") < 1.0);
/// ```
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return ratio(a.trim(), b.trim());
    }

    let shared = join(tokens_a.intersection(&tokens_b).copied());
    let only_a = join(tokens_a.difference(&tokens_b).copied());
    let only_b = join(tokens_b.difference(&tokens_a).copied());

    let with_a = join_nonempty(&shared, &only_a);
    let with_b = join_nonempty(&shared, &only_b);

    let mut best = ratio(&with_a, &with_b);
    if !shared.is_empty() {
        best = best.max(ratio(&shared, &with_a)).max(ratio(&shared, &with_b));
    }
    best
}

/// Title similarity: plain ratio, or sorted-word ratio when words are reordered.
///
/// Titles do not use the subset rule: "blue" must not fully
/// match "blue in green".
pub fn title_similarity(a: &str, b: &str) -> f64 {
    ratio(a, b).max(token_sort_ratio(a, b))
}

/// Artist similarity: word-set ratio, so "miles davis" fully matches
/// "miles davis quintet".
pub fn artist_similarity(a: &str, b: &str) -> f64 {
    token_set_ratio(a, b)
}

fn sorted_tokens(text: &str) -> String {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn join<'a>(tokens: impl Iterator<Item = &'a str>) -> String {
    tokens.collect::<Vec<_>>().join(" ")
}

fn join_nonempty(head: &str, tail: &str) -> String {
    match (head.is_empty(), tail.is_empty()) {
        (true, _) => tail.to_string(),
        (_, true) => head.to_string(),
        _ => format!("{head} {tail}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_ratio_edges() {
        assert_eq!(ratio("", ""), 1.0);
        assert_eq!(ratio("", "so what"), 0.0);
        assert_eq!(ratio("so what", "so what"), 1.0);
        // one substitution in ten characters
        assert!(approx(ratio("abcdefghij", "abcdefghiX"), 0.9));
    }

    #[test]
    fn test_minor_spelling_tolerated() {
        let score = title_similarity("waltz for debby", "waltz for debbie");
        assert!(score >= 0.85, "score was {score}");
        assert!(score < 1.0);
    }

    #[test]
    fn test_word_order_tolerated() {
        assert_eq!(title_similarity("debby waltz for", "waltz for debby"), 1.0);
    }

    #[test]
    fn test_title_subset_is_not_full_match() {
        assert!(title_similarity("blue", "blue in green") < 0.6);
    }

    #[test]
    fn test_artist_subset_is_full_match() {
        assert_eq!(artist_similarity("miles davis", "miles davis quintet"), 1.0);
        assert_eq!(artist_similarity("bill evans trio", "bill evans"), 1.0);
    }

    #[test]
    fn test_unrelated_strings_score_low() {
        assert!(artist_similarity("miles davis", "john coltrane") < 0.5);
        assert!(title_similarity("so what", "giant steps") < 0.6);
    }

    #[test]
    fn test_disjoint_token_sets() {
        let score = token_set_ratio("abc", "xyz");
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_scores_symmetric() {
        let pairs = [
            ("bill evans", "bill evans trio"),
            ("so what", "so what live"),
            ("ella fitzgerald", "ella"),
        ];
        for (a, b) in pairs {
            assert!(approx(artist_similarity(a, b), artist_similarity(b, a)));
            assert!(approx(title_similarity(a, b), title_similarity(b, a)));
        }
    }
}
