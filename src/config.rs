use crate::assembler::AssemblerConfig;
use crate::playlist::NewPlaylist;
use crate::{PlaylistError, Result};
use std::fmt;
use std::time::Duration;

/// Spotify application credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl SpotifyCredentials {
    pub const CLIENT_ID_VAR: &'static str = "SPOTIFY_CLIENT_ID";
    pub const CLIENT_SECRET_VAR: &'static str = "SPOTIFY_CLIENT_SECRET";
    pub const REDIRECT_URI_VAR: &'static str = "SPOTIFY_REDIRECT_URI";
    pub const DEFAULT_REDIRECT_URI: &'static str = "http://127.0.0.1:8888/callback";

    /// Read credentials from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through `lookup`; empty values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let missing: Vec<&str> = [Self::CLIENT_ID_VAR, Self::CLIENT_SECRET_VAR]
            .into_iter()
            .filter(|name| get(*name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(PlaylistError::Config(format!(
                "Missing environment variable(s): {}. Create an app at \
                 https://developer.spotify.com/dashboard and export its credentials.",
                missing.join(", ")
            )));
        }

        Ok(Self {
            client_id: get(Self::CLIENT_ID_VAR).unwrap_or_default(),
            client_secret: get(Self::CLIENT_SECRET_VAR).unwrap_or_default(),
            redirect_uri: get(Self::REDIRECT_URI_VAR)
                .unwrap_or_else(|| Self::DEFAULT_REDIRECT_URI.to_string()),
        })
    }
}

impl fmt::Debug for SpotifyCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpotifyCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .finish()
    }
}

/// How uncertain matches are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptMode {
    /// Ask on the terminal
    #[default]
    Ask,
    AcceptAll,
    RejectAll,
}

/// Settings for one playlist run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Recommendations searched per standard
    pub max_recommendations_per_standard: usize,
    /// Minimum delay between search calls
    pub search_interval: Duration,
    pub max_standards: usize,
    pub playlist: NewPlaylist,
    /// Append to this playlist instead of creating one
    pub playlist_id: Option<String>,
    pub prompt_mode: PromptMode,
    pub dry_run: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            max_recommendations_per_standard: AssemblerConfig::DEFAULT_MAX_RECOMMENDATIONS,
            search_interval: Duration::from_millis(500),
            max_standards: 100,
            playlist: NewPlaylist::default(),
            playlist_id: None,
            prompt_mode: PromptMode::Ask,
            dry_run: false,
        }
    }
}

impl RunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_recommendations_per_standard == 0 {
            return Err(PlaylistError::Config(
                "max recordings per standard must be at least 1".to_string(),
            ));
        }
        if self.max_standards == 0 {
            return Err(PlaylistError::Config(
                "max standards must be at least 1".to_string(),
            ));
        }
        if self.playlist_id.is_none() && self.playlist.name.trim().is_empty() {
            return Err(PlaylistError::Config("playlist name is empty".to_string()));
        }
        Ok(())
    }

    pub fn assembler_config(&self) -> AssemblerConfig {
        AssemblerConfig {
            max_recommendations_per_standard: self.max_recommendations_per_standard,
            ..AssemblerConfig::default()
        }
    }
}
