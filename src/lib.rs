//! Builds a Spotify playlist from the recommended recordings of the top jazz
//! standards on jazzstandards.com.
//!
//! The source lists, for each standard, the recordings its editors recommend.
//! Each recommendation is searched on Spotify, the results are fuzzily
//! matched against it by [`TrackMatcher`], and accepted tracks are collected
//! in ranking order by [`PlaylistAssembler`] before being added to the
//! playlist in batches.

pub mod assembler;
pub mod auth;
pub mod config;
pub mod error;
pub mod headers;
pub mod matcher;
pub mod normalize;
pub mod parsing;
pub mod playlist;
pub mod prompt;
pub mod retry;
pub mod search;
pub mod similarity;
pub mod source;
pub mod spotify;
pub mod throttle;
pub mod types;

pub use assembler::{AddOutcome, AssemblerConfig, PlaylistAssembler, PlaylistBuildState};
pub use auth::{AccessToken, SpotifyAuth, TokenStore};
pub use config::{PromptMode, RunConfig, SpotifyCredentials};
pub use error::PlaylistError;
pub use matcher::{MatchThresholds, TrackMatcher};
pub use playlist::{CreatedPlaylist, NewPlaylist, PlaylistTarget};
pub use prompt::{FixedAnswer, InteractionPrompt, LinePrompt};
pub use search::CandidateSearcher;
pub use source::{JazzStandardsClient, SourceCatalog};
pub use spotify::SpotifyClient;
pub use types::{
    CandidateTrack, CommitReport, MatchDecision, MatchSummary, Recommendation, RunStats, Standard,
};

#[cfg(feature = "mock")]
pub use playlist::MockPlaylistTarget;
#[cfg(feature = "mock")]
pub use prompt::MockInteractionPrompt;
#[cfg(feature = "mock")]
pub use search::MockCandidateSearcher;
#[cfg(feature = "mock")]
pub use source::MockSourceCatalog;

pub type Result<T> = std::result::Result<T, PlaylistError>;
