//! Data types for standards, recommended recordings and streaming candidates.
//!
//! This module contains the records produced by the source catalog and the
//! candidate searcher, the decision produced by the matcher, and the counters
//! reported at the end of a run.

use std::fmt;

// ================================================================================================
// SOURCE CATALOG RECORDS
// ================================================================================================

/// A named musical work from the curated standards list.
///
/// Identity is the title as scraped. `rank` is the 1-based position on the
/// source list and drives playlist order.
///
/// # Examples
///
/// ```rust
/// use standards_playlist::Standard;
///
/// let standard = Standard::new(
///     1,
///     "Body and Soul",
///     "https://www.jazzstandards.com/compositions-0/bodyandsoul.htm",
/// );
///
/// assert_eq!(standard.rank, 1);
/// assert_eq!(standard.to_string(), "#1 Body and Soul");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Standard {
    /// 1-based position on the source list
    pub rank: usize,
    /// Title as scraped
    pub title: String,
    /// Absolute URL of the standard's page
    pub url: String,
}

impl Standard {
    pub fn new(rank: usize, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            rank,
            title: title.into(),
            url: url.into(),
        }
    }
}

impl fmt::Display for Standard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.rank, self.title)
    }
}

/// A specific recorded performance of a standard, as suggested by the source.
///
/// The parent standard is referenced by rank and title rather than owned.
/// `source_text` keeps the scraped text the recommendation came from so it can
/// be shown when a match needs confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Recommendation {
    pub artist: String,
    pub title: String,
    pub album: Option<String>,
    pub year: Option<u16>,
    /// Rank of the parent standard
    pub standard_rank: usize,
    /// Title of the parent standard
    pub standard_title: String,
    /// Scraped text this recommendation was extracted from
    pub source_text: String,
}

impl Recommendation {
    /// Create a recommendation of `standard` performed by `artist`.
    ///
    /// The title is the standard's title and `source_text` defaults to
    /// "artist - title".
    pub fn for_standard(standard: &Standard, artist: impl Into<String>) -> Self {
        let artist = artist.into();
        let source_text = format!("{} - {}", artist, standard.title);
        Self {
            artist,
            title: standard.title.clone(),
            album: None,
            year: None,
            standard_rank: standard.rank,
            standard_title: standard.title.clone(),
            source_text,
        }
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_year(mut self, year: u16) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_source_text(mut self, source_text: impl Into<String>) -> Self {
        self.source_text = source_text.into();
        self
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' by {}", self.title, self.artist)?;
        if let Some(album) = &self.album {
            write!(f, " [{album}]")?;
        }
        if let Some(year) = self.year {
            write!(f, " ({year})")?;
        }
        Ok(())
    }
}

// ================================================================================================
// STREAMING PLATFORM RECORDS
// ================================================================================================

/// A search result from the streaming platform.
///
/// Produced fresh per search call. `id` is opaque and unique within the
/// platform; `artists` keeps the platform's credit order.
///
/// # Examples
///
/// ```rust
/// use standards_playlist::CandidateTrack;
///
/// let candidate = CandidateTrack::new("1", vec!["Bill Evans Trio".to_string()], "Waltz for Debby")
///     .with_album("Waltz for Debby")
///     .with_release_year(1961)
///     .with_popularity(63);
///
/// assert_eq!(candidate.primary_artist(), "Bill Evans Trio");
/// assert_eq!(candidate.uri(), "spotify:track:1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CandidateTrack {
    /// Platform track ID
    pub id: String,
    pub artists: Vec<String>,
    pub title: String,
    pub album: Option<String>,
    pub release_year: Option<u16>,
    /// Platform popularity signal, higher is more popular
    pub popularity: Option<u32>,
}

impl CandidateTrack {
    pub fn new(id: impl Into<String>, artists: Vec<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            artists,
            title: title.into(),
            album: None,
            release_year: None,
            popularity: None,
        }
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_release_year(mut self, year: u16) -> Self {
        self.release_year = Some(year);
        self
    }

    pub fn with_popularity(mut self, popularity: u32) -> Self {
        self.popularity = Some(popularity);
        self
    }

    /// First credited artist, or an empty string for uncredited tracks.
    pub fn primary_artist(&self) -> &str {
        self.artists.first().map(String::as_str).unwrap_or("")
    }

    /// All credited artists joined for display.
    pub fn artist_display(&self) -> String {
        self.artists.join(", ")
    }

    /// Platform URI used by playlist write calls.
    pub fn uri(&self) -> String {
        track_uri(&self.id)
    }
}

/// Build the platform URI for a track ID.
pub fn track_uri(track_id: &str) -> String {
    format!("spotify:track:{track_id}")
}

// ================================================================================================
// MATCHING
// ================================================================================================

/// Outcome of matching one recommendation against its candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchDecision {
    /// A strong match was accepted without asking.
    Accepted(String),
    /// No candidate was close enough to bother asking.
    Rejected,
    /// An uncertain match was confirmed by the user.
    UserAccepted(String),
    /// An uncertain match was declined by the user.
    UserRejected,
}

impl MatchDecision {
    /// Track ID to add to the playlist, if the decision accepted one.
    pub fn track_id(&self) -> Option<&str> {
        match self {
            MatchDecision::Accepted(id) | MatchDecision::UserAccepted(id) => Some(id),
            MatchDecision::Rejected | MatchDecision::UserRejected => None,
        }
    }

    /// Whether a human was asked to produce this decision.
    pub fn was_prompted(&self) -> bool {
        matches!(
            self,
            MatchDecision::UserAccepted(_) | MatchDecision::UserRejected
        )
    }
}

/// What the user sees when a match needs confirmation.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MatchSummary {
    /// Original scraped text of the recommendation
    pub recommendation: String,
    pub standard_title: String,
    pub candidate_id: String,
    pub candidate_artists: String,
    pub candidate_title: String,
    pub candidate_album: Option<String>,
    pub candidate_year: Option<u16>,
    pub title_similarity: f64,
    pub artist_similarity: f64,
    /// The candidate is already in the playlist being built
    pub already_in_playlist: bool,
}

impl fmt::Display for MatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "   Looking for: {}", self.recommendation)?;
        writeln!(
            f,
            "   Candidate:   {} - {}",
            self.candidate_artists, self.candidate_title
        )?;
        if let Some(album) = &self.candidate_album {
            match self.candidate_year {
                Some(year) => writeln!(f, "   Album:       {album} ({year})")?,
                None => writeln!(f, "   Album:       {album}")?,
            }
        } else if let Some(year) = self.candidate_year {
            writeln!(f, "   Year:        {year}")?;
        }
        write!(
            f,
            "   Similarity:  title {:.2}, artist {:.2}",
            self.title_similarity, self.artist_similarity
        )?;
        if self.already_in_playlist {
            write!(f, " (already in playlist)")?;
        }
        Ok(())
    }
}

// ================================================================================================
// RUN REPORTING
// ================================================================================================

/// Counters collected while assembling a playlist.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct RunStats {
    pub standards_processed: usize,
    /// Standards skipped because their page could not be fetched, with the reason
    pub standards_skipped: Vec<(String, String)>,
    pub recommendations_searched: usize,
    /// Recommendations past the per-standard ceiling that were never searched
    pub recommendations_over_ceiling: usize,
    pub auto_accepted: usize,
    pub user_accepted: usize,
    pub user_rejected: usize,
    pub rejected: usize,
    pub search_failures: usize,
    pub duplicates_skipped: usize,
    pub tracks_added: usize,
}

impl RunStats {
    pub(crate) fn record_decision(&mut self, decision: &MatchDecision) {
        match decision {
            MatchDecision::Accepted(_) => self.auto_accepted += 1,
            MatchDecision::UserAccepted(_) => self.user_accepted += 1,
            MatchDecision::UserRejected => self.user_rejected += 1,
            MatchDecision::Rejected => self.rejected += 1,
        }
    }
}

/// Result of committing the assembled track list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CommitReport {
    pub chunks_committed: usize,
    pub tracks_committed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_track_id() {
        assert_eq!(MatchDecision::Accepted("a".into()).track_id(), Some("a"));
        assert_eq!(MatchDecision::UserAccepted("b".into()).track_id(), Some("b"));
        assert_eq!(MatchDecision::Rejected.track_id(), None);
        assert_eq!(MatchDecision::UserRejected.track_id(), None);
        assert!(MatchDecision::UserRejected.was_prompted());
        assert!(!MatchDecision::Accepted("a".into()).was_prompted());
    }

    #[test]
    fn test_recommendation_display() {
        let standard = Standard::new(4, "Autumn Leaves", "https://example.com/autumn.htm");
        let rec = Recommendation::for_standard(&standard, "Cannonball Adderley")
            .with_album("Somethin' Else")
            .with_year(1958);

        assert_eq!(
            rec.to_string(),
            "'Autumn Leaves' by Cannonball Adderley [Somethin' Else] (1958)"
        );
        assert_eq!(rec.standard_rank, 4);
        assert_eq!(rec.source_text, "Cannonball Adderley - Autumn Leaves");
    }

    #[test]
    fn test_summary_display_marks_duplicates() {
        let summary = MatchSummary {
            recommendation: "Miles Davis (1959".to_string(),
            standard_title: "So What".to_string(),
            candidate_id: "x".to_string(),
            candidate_artists: "Miles Davis".to_string(),
            candidate_title: "So What - Live".to_string(),
            candidate_album: Some("Live at Newport".to_string()),
            candidate_year: Some(1963),
            title_similarity: 0.7,
            artist_similarity: 1.0,
            already_in_playlist: true,
        };

        let text = summary.to_string();
        assert!(text.contains("Miles Davis - So What - Live"));
        assert!(text.contains("Live at Newport (1963)"));
        assert!(text.contains("title 0.70, artist 1.00"));
        assert!(text.ends_with("(already in playlist)"));
    }
}
