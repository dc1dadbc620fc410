use crate::matcher::{FuzzyScorer, SimilarityScorer, TrackMatcher};
use crate::playlist::PlaylistTarget;
use crate::prompt::InteractionPrompt;
use crate::search::CandidateSearcher;
use crate::source::SourceCatalog;
use crate::{
    CandidateTrack, CommitReport, PlaylistError, Recommendation, Result, RunStats, Standard,
};
use std::collections::HashSet;

// ================================================================================================
// BUILD STATE
// ================================================================================================

/// Outcome of offering a track to the build state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// Accepted earlier in this run
    Duplicate,
    /// Already in the target playlist before the run started
    AlreadyInPlaylist,
}

/// Tracks accepted so far, in playlist order.
///
/// `seen` always holds exactly the IDs in `order`, so no ID is queued twice.
/// Tracks found in an existing playlist live in `preexisting`; they suppress
/// duplicates but are never queued for commit.
#[derive(Debug, Clone, Default)]
pub struct PlaylistBuildState {
    order: Vec<String>,
    seen: HashSet<String>,
    preexisting: HashSet<String>,
    present: HashSet<String>,
}

impl PlaylistBuildState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State for appending to a playlist that already holds `track_ids`.
    pub fn with_existing(track_ids: impl IntoIterator<Item = String>) -> Self {
        let preexisting: HashSet<String> = track_ids.into_iter().collect();
        Self {
            present: preexisting.clone(),
            preexisting,
            ..Self::default()
        }
    }

    /// Queue `track_id` unless it is already queued or already in the playlist.
    pub fn try_add(&mut self, track_id: &str) -> AddOutcome {
        if self.seen.contains(track_id) {
            return AddOutcome::Duplicate;
        }
        if self.preexisting.contains(track_id) {
            return AddOutcome::AlreadyInPlaylist;
        }
        self.order.push(track_id.to_string());
        self.seen.insert(track_id.to_string());
        self.present.insert(track_id.to_string());
        AddOutcome::Added
    }

    /// Queued track IDs, in the order they will be committed.
    pub fn track_ids(&self) -> &[String] {
        &self.order
    }

    /// Every ID the playlist will hold once committed, old and new.
    pub fn present(&self) -> &HashSet<String> {
        &self.present
    }

    pub fn contains(&self, track_id: &str) -> bool {
        self.present.contains(track_id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

// ================================================================================================
// ASSEMBLER
// ================================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblerConfig {
    /// Recommendations searched per standard; the rest are skipped unsearched
    pub max_recommendations_per_standard: usize,
    /// Tracks per add call, at most [`AssemblerConfig::MAX_CHUNK_SIZE`]
    pub chunk_size: usize,
}

impl AssemblerConfig {
    pub const DEFAULT_MAX_RECOMMENDATIONS: usize = 6;
    pub const MAX_CHUNK_SIZE: usize = 100;

    fn effective_chunk_size(&self) -> usize {
        self.chunk_size.clamp(1, Self::MAX_CHUNK_SIZE)
    }
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            max_recommendations_per_standard: Self::DEFAULT_MAX_RECOMMENDATIONS,
            chunk_size: Self::MAX_CHUNK_SIZE,
        }
    }
}

/// Walks the standards in rank order and collects one track per matched
/// recommendation, then commits the collected tracks in batches.
///
/// Everything runs sequentially so prompts appear in a single stream and the
/// playlist mirrors the source ranking. A standard whose page can't be
/// fetched is skipped; a failed search leaves that recommendation unmatched.
pub struct PlaylistAssembler<'a, S = FuzzyScorer> {
    source: &'a dyn SourceCatalog,
    searcher: &'a dyn CandidateSearcher,
    prompt: &'a dyn InteractionPrompt,
    matcher: TrackMatcher<S>,
    config: AssemblerConfig,
}

impl<'a> PlaylistAssembler<'a, FuzzyScorer> {
    pub fn new(
        source: &'a dyn SourceCatalog,
        searcher: &'a dyn CandidateSearcher,
        prompt: &'a dyn InteractionPrompt,
        config: AssemblerConfig,
    ) -> Self {
        Self::with_matcher(source, searcher, prompt, TrackMatcher::new(), config)
    }
}

impl<'a, S: SimilarityScorer> PlaylistAssembler<'a, S> {
    pub fn with_matcher(
        source: &'a dyn SourceCatalog,
        searcher: &'a dyn CandidateSearcher,
        prompt: &'a dyn InteractionPrompt,
        matcher: TrackMatcher<S>,
        config: AssemblerConfig,
    ) -> Self {
        Self {
            source,
            searcher,
            prompt,
            matcher,
            config,
        }
    }

    /// Resolve every standard's recommendations into `state`.
    pub async fn assemble(&self, standards: &[Standard], state: &mut PlaylistBuildState) -> RunStats {
        let mut ordered: Vec<&Standard> = standards.iter().collect();
        ordered.sort_by_key(|standard| standard.rank);

        let mut stats = RunStats::default();
        let ceiling = self.config.max_recommendations_per_standard;

        for standard in ordered {
            log::info!("Processing standard {standard}");

            let recommendations = match self.source.fetch_recommendations(standard).await {
                Ok(recommendations) => recommendations,
                Err(e) => {
                    log::warn!("Skipping standard '{}': {e}", standard.title);
                    stats
                        .standards_skipped
                        .push((standard.title.clone(), e.to_string()));
                    continue;
                }
            };
            stats.standards_processed += 1;

            if recommendations.is_empty() {
                log::info!("No recommended recordings found for '{}'", standard.title);
            }
            if recommendations.len() > ceiling {
                log::debug!(
                    "'{}' lists {} recordings, searching the first {ceiling}",
                    standard.title,
                    recommendations.len()
                );
                stats.recommendations_over_ceiling += recommendations.len() - ceiling;
            }

            for recommendation in recommendations.iter().take(ceiling) {
                stats.recommendations_searched += 1;

                let Some(candidates) = self.find_candidates(recommendation, &mut stats).await
                else {
                    continue;
                };

                let decision =
                    self.matcher
                        .decide(recommendation, &candidates, state.present(), self.prompt);
                stats.record_decision(&decision);

                let Some(track_id) = decision.track_id() else {
                    continue;
                };
                match state.try_add(track_id) {
                    AddOutcome::Added => stats.tracks_added += 1,
                    AddOutcome::Duplicate | AddOutcome::AlreadyInPlaylist => {
                        log::info!("Skipping duplicate track {track_id} for {recommendation}");
                        stats.duplicates_skipped += 1;
                    }
                }
            }
        }

        log::info!(
            "Processed {} standards ({} skipped), {} tracks queued",
            stats.standards_processed,
            stats.standards_skipped.len(),
            state.len()
        );
        stats
    }

    /// Run the searcher's queries in order until one returns a candidate
    /// worth accepting or asking about, or the queries run out.
    ///
    /// Returns the last result list searched, or `None` after a failed search.
    async fn find_candidates(
        &self,
        recommendation: &Recommendation,
        stats: &mut RunStats,
    ) -> Option<Vec<CandidateTrack>> {
        let mut candidates = Vec::new();
        for attempt in 0.. {
            match self.searcher.search(recommendation, attempt).await {
                Ok(Some(found)) => {
                    candidates = found;
                    if self.matcher.evaluate(recommendation, &candidates).is_match() {
                        break;
                    }
                    log::debug!("Nothing usable for {recommendation}, trying the next query");
                }
                Ok(None) => break,
                Err(e) => {
                    log::warn!("Search failed for {recommendation}: {e}");
                    stats.search_failures += 1;
                    return None;
                }
            }
        }
        Some(candidates)
    }

    /// Add the queued tracks to `playlist_id`, one call per chunk, in order.
    ///
    /// Stops at the first failed chunk. Chunks committed before it stay in
    /// the playlist; the error carries the failed chunk's index and IDs.
    pub async fn commit(
        &self,
        target: &dyn PlaylistTarget,
        playlist_id: &str,
        state: &PlaylistBuildState,
    ) -> Result<CommitReport> {
        let chunk_size = self.config.effective_chunk_size();
        let total_chunks = state.len().div_ceil(chunk_size);
        let mut report = CommitReport::default();

        for (chunk_index, chunk) in state.track_ids().chunks(chunk_size).enumerate() {
            target
                .add_tracks(playlist_id, chunk)
                .await
                .map_err(|e| PlaylistError::Commit {
                    chunk_index,
                    track_ids: chunk.to_vec(),
                    message: e.to_string(),
                })?;

            report.chunks_committed += 1;
            report.tracks_committed += chunk.len();
            log::info!(
                "Added chunk {}/{total_chunks} ({} tracks)",
                chunk_index + 1,
                chunk.len()
            );
        }

        Ok(report)
    }
}
