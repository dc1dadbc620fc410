use thiserror::Error;

/// Error types for building a playlist from the standards list.
///
/// The variants follow the phases of a run. Errors local to one standard or
/// one recommendation (`Fetch`, `Search`) are recovered by the assembler and
/// never abort the run. Setup errors (`Config`, `Auth`, `PlaylistCreate`) and
/// commit errors (`Commit`) terminate it.
///
/// # Error Handling Examples
///
/// ```rust
/// use standards_playlist::PlaylistError;
///
/// let err = PlaylistError::Commit {
///     chunk_index: 2,
///     track_ids: vec!["4vLYewWIvqHfKtJDk8c8tq".to_string()],
///     message: "HTTP 502".to_string(),
/// };
///
/// assert!(!err.is_setup_failure());
/// assert_eq!(err.to_string(), "Failed to add chunk 2 (1 tracks) to playlist: HTTP 502");
/// ```
#[derive(Error, Debug)]
pub enum PlaylistError {
    /// HTTP/network related errors.
    ///
    /// Connection failures, timeouts, DNS errors and unreadable bodies.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authorization with the streaming platform failed.
    ///
    /// # Common Causes
    /// - Invalid client ID or secret
    /// - Redirect URI not registered for the application
    /// - The authorization code was already used or has expired
    /// - A cached refresh token was revoked
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A response (HTML page or JSON body) could not be parsed.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The platform asked us to slow down.
    #[error("Rate limited, retry after {retry_after} seconds")]
    RateLimit {
        /// Number of seconds to wait before retrying
        retry_after: u64,
    },

    /// The platform answered with a non-success status.
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message reported by the platform, or the raw body
        message: String,
    },

    /// A standard's page could not be fetched or parsed.
    ///
    /// Recovered by skipping the standard.
    #[error("Failed to fetch recordings for '{standard}': {message}")]
    Fetch {
        /// Title of the standard being processed
        standard: String,
        message: String,
    },

    /// A search call failed for a recommendation.
    ///
    /// Recovered by treating the recommendation as rejected.
    #[error("Search failed for '{query}': {message}")]
    Search { query: String, message: String },

    /// The target playlist could not be created or opened.
    #[error("Failed to create playlist: {0}")]
    PlaylistCreate(String),

    /// A chunk of tracks could not be added to the playlist.
    ///
    /// Chunks committed before this one stay in the playlist. The track IDs
    /// of the failed chunk are carried so the add can be retried by hand.
    #[error("Failed to add chunk {chunk_index} ({} tracks) to playlist: {message}", .track_ids.len())]
    Commit {
        /// Zero-based index of the failed chunk
        chunk_index: usize,
        /// Track IDs that were in the failed chunk
        track_ids: Vec<String>,
        message: String,
    },

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system I/O errors (token cache, terminal prompt).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlaylistError {
    /// Whether this error belongs to the setup phase of a run.
    ///
    /// Setup failures abort the run before any standard is processed.
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            PlaylistError::Config(_) | PlaylistError::Auth(_) | PlaylistError::PlaylistCreate(_)
        )
    }
}
