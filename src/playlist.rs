use crate::Result;
use async_trait::async_trait;

/// Settings for a playlist about to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPlaylist {
    pub name: String,
    pub description: String,
    pub public: bool,
}

impl NewPlaylist {
    pub const DEFAULT_NAME: &'static str = "Top 100 Jazz Standards - Recommended Recordings";
    pub const DEFAULT_DESCRIPTION: &'static str =
        "Recommended recordings of the top 100 jazz standards from jazzstandards.com";

    pub fn new(name: impl Into<String>, description: impl Into<String>, public: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            public,
        }
    }
}

impl Default for NewPlaylist {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NAME, Self::DEFAULT_DESCRIPTION, true)
    }
}

/// A playlist that exists on the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPlaylist {
    pub id: String,
    /// Link for humans, when the platform reports one
    pub url: Option<String>,
}

/// The playlist side of the streaming platform.
///
/// `add_tracks` is given at most one batch at a time; splitting into batches
/// is the assembler's job.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait(?Send)]
pub trait PlaylistTarget {
    async fn create_playlist(&self, playlist: &NewPlaylist) -> Result<CreatedPlaylist>;

    /// Track IDs already in an existing playlist, in playlist order.
    async fn playlist_track_ids(&self, playlist_id: &str) -> Result<Vec<String>>;

    /// Append tracks (by ID) to the end of a playlist.
    async fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<()>;
}
