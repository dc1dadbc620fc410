use crate::{CandidateTrack, Recommendation, Result};
use async_trait::async_trait;

/// Searches the streaming catalog for tracks that might be a recommendation.
///
/// A searcher has several query strategies per recommendation. `attempt`
/// selects one, starting at 0, and `Ok(None)` means every strategy has been
/// tried. Callers move to the next attempt when the results hold nothing
/// usable.
///
/// Implementations own their rate limiting: callers may invoke `search`
/// back to back. A failed search is a [`crate::PlaylistError::Search`].
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait(?Send)]
pub trait CandidateSearcher {
    async fn search(
        &self,
        recommendation: &Recommendation,
        attempt: usize,
    ) -> Result<Option<Vec<CandidateTrack>>>;
}

/// Search queries to try for a recommendation, most specific first.
///
/// A fielded `track:"…" artist:"…"` query, then plain `artist title`, then
/// `artist album` when the album is known. Double quotes inside the names
/// are dropped so they cannot break the fielded query.
pub fn search_queries(recommendation: &Recommendation) -> Vec<String> {
    let artist = strip_quotes(&recommendation.artist);
    let title = strip_quotes(&recommendation.title);

    let mut queries = vec![
        format!("track:\"{title}\" artist:\"{artist}\""),
        format!("{artist} {title}"),
    ];
    if let Some(album) = recommendation.album.as_deref() {
        let album = strip_quotes(album);
        if !album.is_empty() {
            queries.push(format!("{artist} {album}"));
        }
    }
    queries
}

fn strip_quotes(text: &str) -> String {
    text.replace('"', "").trim().to_string()
}
