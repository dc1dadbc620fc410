//! Cross-catalog track matching.
//!
//! Decides whether a candidate returned by the streaming platform's search is
//! the recording a recommendation describes. There is no shared identifier
//! between the two catalogs, so the decision rests on normalized title and
//! artist similarity:
//!
//! - **strong** match (title ≥ 0.9 and artist ≥ 0.85): accepted without asking
//! - **weak** match (title ≥ 0.6 and artist ≥ 0.5): the user is asked
//! - anything else: not a match, and nobody is interrupted
//!
//! Candidates are considered in search order, which the platform returns
//! most-relevant-first.

use crate::normalize::{normalize_artist, normalize_title};
use crate::prompt::InteractionPrompt;
use crate::similarity::{artist_similarity, title_similarity};
use crate::types::{CandidateTrack, MatchDecision, MatchSummary, Recommendation};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Scores within this distance are treated as tied.
const SCORE_EPSILON: f64 = 1e-9;

/// Similarity thresholds separating strong, weak and non-matches.
///
/// All bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchThresholds {
    pub strong_title: f64,
    pub strong_artist: f64,
    pub weak_title: f64,
    pub weak_artist: f64,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            strong_title: 0.9,
            strong_artist: 0.85,
            weak_title: 0.6,
            weak_artist: 0.5,
        }
    }
}

impl MatchThresholds {
    /// Classify a pair of similarity scores.
    pub fn classify(&self, scores: MatchScores) -> MatchStrength {
        if scores.title >= self.strong_title && scores.artist >= self.strong_artist {
            MatchStrength::Strong
        } else if scores.title >= self.weak_title && scores.artist >= self.weak_artist {
            MatchStrength::Weak
        } else {
            MatchStrength::NoMatch
        }
    }
}

/// Title and artist similarity of one candidate, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchScores {
    pub title: f64,
    pub artist: f64,
}

impl MatchScores {
    pub fn new(title: f64, artist: f64) -> Self {
        Self { title, artist }
    }

    /// Score used to rank weak candidates against each other.
    pub fn combined(&self) -> f64 {
        (self.title + self.artist) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrength {
    Strong,
    Weak,
    NoMatch,
}

/// Produces similarity scores for a recommendation/candidate pair.
///
/// Any `Fn(&Recommendation, &CandidateTrack) -> MatchScores` is a scorer,
/// which lets tests pin exact scores.
pub trait SimilarityScorer {
    fn score(&self, recommendation: &Recommendation, candidate: &CandidateTrack) -> MatchScores;
}

impl<F> SimilarityScorer for F
where
    F: Fn(&Recommendation, &CandidateTrack) -> MatchScores,
{
    fn score(&self, recommendation: &Recommendation, candidate: &CandidateTrack) -> MatchScores {
        self(recommendation, candidate)
    }
}

/// Default scorer: normalized text compared with edit-distance and word-set ratios.
///
/// The artist score is the best score against any credited artist, so a
/// recording credited to "Stan Getz, João Gilberto" matches either name.
#[derive(Debug, Clone, Copy, Default)]
pub struct FuzzyScorer;

impl SimilarityScorer for FuzzyScorer {
    fn score(&self, recommendation: &Recommendation, candidate: &CandidateTrack) -> MatchScores {
        let title = title_similarity(
            &normalize_title(&recommendation.title),
            &normalize_title(&candidate.title),
        );

        let wanted_artist = normalize_artist(&recommendation.artist);
        let artist = candidate
            .artists
            .iter()
            .map(|name| artist_similarity(&wanted_artist, &normalize_artist(name)))
            .fold(0.0, f64::max);

        MatchScores { title, artist }
    }
}

/// A candidate with its position in the search results and its scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredCandidate {
    /// Index into the candidate list as returned by search
    pub index: usize,
    pub scores: MatchScores,
    pub strength: MatchStrength,
}

/// Result of scoring all candidates, before anyone is asked anything.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    /// The search returned nothing.
    NoCandidates,
    /// First strong match in search order.
    Strong(ScoredCandidate),
    /// Best-scoring weak match; needs confirmation.
    Uncertain(ScoredCandidate),
    /// Candidates exist but none reaches the weak thresholds.
    NoMatch,
}

impl Evaluation {
    /// Whether some candidate is worth accepting or asking about.
    pub fn is_match(&self) -> bool {
        matches!(self, Evaluation::Strong(_) | Evaluation::Uncertain(_))
    }
}

/// Matches recommendations against search candidates.
///
/// # Examples
///
/// ```rust
/// use standards_playlist::matcher::{Evaluation, TrackMatcher};
/// use standards_playlist::{CandidateTrack, Recommendation, Standard};
///
/// let standard = Standard::new(1, "Waltz For Debby", "https://example.com/debby.htm");
/// let rec = Recommendation::for_standard(&standard, "Bill Evans");
/// let candidates = vec![CandidateTrack::new(
///     "4vLYewWIvqHfKtJDk8c8tq",
///     vec!["Bill Evans Trio".to_string()],
///     "Waltz for Debby - Live at the Village Vanguard",
/// )];
///
/// let matcher = TrackMatcher::new();
/// assert!(matches!(matcher.evaluate(&rec, &candidates), Evaluation::Strong(_)));
/// ```
#[derive(Debug, Clone)]
pub struct TrackMatcher<S = FuzzyScorer> {
    thresholds: MatchThresholds,
    scorer: S,
}

impl Default for TrackMatcher<FuzzyScorer> {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackMatcher<FuzzyScorer> {
    pub fn new() -> Self {
        Self::with_scorer(FuzzyScorer, MatchThresholds::default())
    }
}

impl<S: SimilarityScorer> TrackMatcher<S> {
    pub fn with_scorer(scorer: S, thresholds: MatchThresholds) -> Self {
        Self { thresholds, scorer }
    }

    pub fn thresholds(&self) -> &MatchThresholds {
        &self.thresholds
    }

    /// Score and classify every candidate in search order.
    pub fn score_all(
        &self,
        recommendation: &Recommendation,
        candidates: &[CandidateTrack],
    ) -> Vec<ScoredCandidate> {
        candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| {
                let scores = self.scorer.score(recommendation, candidate);
                ScoredCandidate {
                    index,
                    scores,
                    strength: self.thresholds.classify(scores),
                }
            })
            .collect()
    }

    /// Pick the candidate to accept or ask about, without asking.
    pub fn evaluate(
        &self,
        recommendation: &Recommendation,
        candidates: &[CandidateTrack],
    ) -> Evaluation {
        if candidates.is_empty() {
            return Evaluation::NoCandidates;
        }

        let scored = self.score_all(recommendation, candidates);
        for candidate in &scored {
            log::debug!(
                "  candidate {}: '{}' by {} -> title {:.2}, artist {:.2} ({:?})",
                candidate.index,
                candidates[candidate.index].title,
                candidates[candidate.index].artist_display(),
                candidate.scores.title,
                candidate.scores.artist,
                candidate.strength
            );
        }

        if let Some(strong) = scored
            .iter()
            .find(|c| c.strength == MatchStrength::Strong)
        {
            return Evaluation::Strong(*strong);
        }

        let mut best: Option<&ScoredCandidate> = None;
        for candidate in scored.iter().filter(|c| c.strength != MatchStrength::NoMatch) {
            best = match best {
                Some(current)
                    if rank(candidate, current, candidates) != Ordering::Greater =>
                {
                    Some(current)
                }
                _ => Some(candidate),
            };
        }

        match best {
            Some(candidate) => Evaluation::Uncertain(*candidate),
            None => Evaluation::NoMatch,
        }
    }

    /// Decide on one recommendation, asking `prompt` when the match is uncertain.
    ///
    /// `accepted` holds the track IDs already in the playlist being built.
    /// Candidates in it stay eligible (the assembler drops the duplicate);
    /// the set only annotates what the user is shown.
    pub fn decide(
        &self,
        recommendation: &Recommendation,
        candidates: &[CandidateTrack],
        accepted: &HashSet<String>,
        prompt: &dyn InteractionPrompt,
    ) -> MatchDecision {
        match self.evaluate(recommendation, candidates) {
            Evaluation::NoCandidates => {
                log::info!("No candidates for {recommendation}");
                MatchDecision::Rejected
            }
            Evaluation::NoMatch => {
                log::info!(
                    "No candidate close enough for {recommendation} ({} checked)",
                    candidates.len()
                );
                MatchDecision::Rejected
            }
            Evaluation::Strong(scored) => {
                let candidate = &candidates[scored.index];
                log::info!(
                    "Strong match for {recommendation}: {} - {}",
                    candidate.artist_display(),
                    candidate.title
                );
                MatchDecision::Accepted(candidate.id.clone())
            }
            Evaluation::Uncertain(scored) => {
                let candidate = &candidates[scored.index];
                let summary = summarize(recommendation, candidate, scored.scores, accepted);
                if prompt.ask(&summary) {
                    log::info!(
                        "User accepted {} - {} for {recommendation}",
                        candidate.artist_display(),
                        candidate.title
                    );
                    MatchDecision::UserAccepted(candidate.id.clone())
                } else {
                    log::info!("User rejected the match for {recommendation}");
                    MatchDecision::UserRejected
                }
            }
        }
    }
}

/// Order two scored candidates: higher combined score wins, then higher
/// popularity when both have one. `Equal` keeps the earlier candidate.
fn rank(a: &ScoredCandidate, b: &ScoredCandidate, candidates: &[CandidateTrack]) -> Ordering {
    let diff = a.scores.combined() - b.scores.combined();
    if diff.abs() > SCORE_EPSILON {
        return if diff > 0.0 {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }

    match (
        candidates[a.index].popularity,
        candidates[b.index].popularity,
    ) {
        (Some(pa), Some(pb)) => pa.cmp(&pb),
        _ => Ordering::Equal,
    }
}

fn summarize(
    recommendation: &Recommendation,
    candidate: &CandidateTrack,
    scores: MatchScores,
    accepted: &HashSet<String>,
) -> MatchSummary {
    MatchSummary {
        recommendation: recommendation.source_text.clone(),
        standard_title: recommendation.standard_title.clone(),
        candidate_id: candidate.id.clone(),
        candidate_artists: candidate.artist_display(),
        candidate_title: candidate.title.clone(),
        candidate_album: candidate.album.clone(),
        candidate_year: candidate.release_year,
        title_similarity: scores.title,
        artist_similarity: scores.artist,
        already_in_playlist: accepted.contains(&candidate.id),
    }
}
