use crate::headers;
use crate::playlist::{CreatedPlaylist, NewPlaylist, PlaylistTarget};
use crate::retry::{self, RetryConfig};
use crate::search::{search_queries, CandidateSearcher};
use crate::throttle::Throttle;
use crate::types::track_uri;
use crate::{CandidateTrack, PlaylistError, Recommendation, Result};
use async_trait::async_trait;
use http_client::{HttpClient, Request};
use http_types::{Method, Url};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// SpotifyClient
// =============================================================================

/// Client for the parts of the Spotify Web API a playlist run needs.
///
/// Every call waits on a shared [`Throttle`] first and is retried when the
/// API answers 429. Holds a ready bearer token; obtaining and refreshing it
/// is [`crate::auth`]'s job.
///
/// # Examples
///
/// ```rust,no_run
/// use standards_playlist::{CandidateSearcher, Recommendation, SpotifyClient, Standard};
///
/// # tokio_test::block_on(async {
/// let http_client = http_client::native::NativeClient::new();
/// let spotify = SpotifyClient::new(Box::new(http_client), "BQD...".to_string());
///
/// let standard = Standard::new(1, "Body and Soul", "https://www.jazzstandards.com/compositions-0/bodyandsoul.htm");
/// let rec = Recommendation::for_standard(&standard, "Coleman Hawkins");
/// let mut attempt = 0;
/// while let Some(tracks) = spotify.search(&rec, attempt).await? {
///     for track in &tracks {
///         println!("{} - {}", track.artist_display(), track.title);
///     }
///     attempt += 1;
/// }
/// # Ok::<(), standards_playlist::PlaylistError>(())
/// # });
/// ```
#[derive(Clone)]
pub struct SpotifyClient {
    client: Arc<dyn HttpClient + Send + Sync>,
    api_base: String,
    access_token: String,
    retry: RetryConfig,
    throttle: Arc<Throttle>,
}

impl SpotifyClient {
    pub const DEFAULT_API_BASE: &'static str = "https://api.spotify.com/v1";
    /// Tracks accepted by one add-items call.
    pub const MAX_TRACKS_PER_REQUEST: usize = 100;
    pub const SEARCH_LIMIT: u32 = 10;
    pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(500);
    /// Used when a 429 arrives without a usable Retry-After header.
    const DEFAULT_RETRY_AFTER: u64 = 5;

    pub fn new(client: Box<dyn HttpClient + Send + Sync>, access_token: String) -> Self {
        Self {
            client: Arc::from(client),
            api_base: Self::DEFAULT_API_BASE.to_string(),
            access_token,
            retry: RetryConfig::default(),
            throttle: Arc::new(Throttle::new(Self::DEFAULT_MIN_INTERVAL)),
        }
    }

    pub fn with_api_base(mut self, api_base: String) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    /// Minimum delay between API calls.
    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.throttle = Arc::new(Throttle::new(interval));
        self
    }

    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// ID of the user the token belongs to.
    pub async fn current_user_id(&self) -> Result<String> {
        let url = format!("{}/me", self.api_base);
        let body = self.send(Method::Get, &url, None, "current user").await?;
        let user: ApiUser =
            serde_json::from_str(&body).map_err(|e| PlaylistError::Parse(e.to_string()))?;
        Ok(user.id)
    }

    /// Run a single search query, returning candidates in relevance order.
    pub async fn search_tracks(&self, query: &str) -> Result<Vec<CandidateTrack>> {
        let url = format!(
            "{}/search?q={}&type=track&limit={}",
            self.api_base,
            urlencoding::encode(query),
            Self::SEARCH_LIMIT
        );
        let body = self.send(Method::Get, &url, None, "search").await?;
        parse_search_response(&body)
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<String>,
        operation: &str,
    ) -> Result<String> {
        retry::retry_operation(&self.retry, operation, || {
            let body = body.clone();
            async move { self.send_once(method, url, body).await }
        })
        .await
    }

    async fn send_once(&self, method: Method, url: &str, body: Option<String>) -> Result<String> {
        self.throttle.wait().await;

        let parsed = url
            .parse::<Url>()
            .map_err(|e| PlaylistError::Http(format!("Invalid URL '{url}': {e}")))?;
        let mut request = Request::new(method, parsed);
        headers::add_api_headers(&mut request, &self.access_token);
        if let Some(body) = body {
            headers::add_json_body_headers(&mut request);
            request.set_body(body);
        }

        log::debug!("{method} {url}");
        let mut response = self
            .client
            .send(request)
            .await
            .map_err(|e| PlaylistError::Http(e.to_string()))?;

        if response.status() == 429 {
            let retry_after = response
                .header("Retry-After")
                .and_then(|values| values.last().as_str().trim().parse::<u64>().ok())
                .unwrap_or(Self::DEFAULT_RETRY_AFTER);
            log::warn!("Rate limited by Spotify, retry after {retry_after}s");
            return Err(PlaylistError::RateLimit { retry_after });
        }

        let status = response.status();
        let text = response
            .body_string()
            .await
            .map_err(|e| PlaylistError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(PlaylistError::Api {
                status: status.into(),
                message: parse_api_error(&text),
            });
        }

        Ok(text)
    }
}

#[async_trait(?Send)]
impl CandidateSearcher for SpotifyClient {
    async fn search(
        &self,
        recommendation: &Recommendation,
        attempt: usize,
    ) -> Result<Option<Vec<CandidateTrack>>> {
        let Some(query) = search_queries(recommendation).into_iter().nth(attempt) else {
            return Ok(None);
        };

        let tracks = self
            .search_tracks(&query)
            .await
            .map_err(|e| PlaylistError::Search {
                query: query.clone(),
                message: e.to_string(),
            })?;
        log::debug!("{} candidates for query: {query}", tracks.len());
        Ok(Some(tracks))
    }
}

#[async_trait(?Send)]
impl PlaylistTarget for SpotifyClient {
    async fn create_playlist(&self, playlist: &NewPlaylist) -> Result<CreatedPlaylist> {
        let create = async {
            let user_id = self.current_user_id().await?;
            let url = format!(
                "{}/users/{}/playlists",
                self.api_base,
                urlencoding::encode(&user_id)
            );
            let request = ApiCreatePlaylistRequest {
                name: &playlist.name,
                description: &playlist.description,
                public: playlist.public,
            };
            let body =
                serde_json::to_string(&request).map_err(|e| PlaylistError::Parse(e.to_string()))?;
            let response = self
                .send(Method::Post, &url, Some(body), "create playlist")
                .await?;
            parse_created_playlist(&response)
        };

        let created = create
            .await
            .map_err(|e| PlaylistError::PlaylistCreate(e.to_string()))?;
        log::info!("Created playlist '{}' ({})", playlist.name, created.id);
        Ok(created)
    }

    async fn playlist_track_ids(&self, playlist_id: &str) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut next = Some(format!(
            "{}/playlists/{}/tracks?fields=items(track(id)),next&limit=100",
            self.api_base,
            urlencoding::encode(playlist_id)
        ));

        while let Some(url) = next {
            let body = self.send(Method::Get, &url, None, "playlist items").await?;
            let page = parse_playlist_items_page(&body)?;
            ids.extend(page.track_ids);
            next = page.next;
        }

        log::debug!("Playlist {playlist_id} already holds {} tracks", ids.len());
        Ok(ids)
    }

    async fn add_tracks(&self, playlist_id: &str, track_ids: &[String]) -> Result<()> {
        let url = format!(
            "{}/playlists/{}/tracks",
            self.api_base,
            urlencoding::encode(playlist_id)
        );

        for chunk in track_ids.chunks(Self::MAX_TRACKS_PER_REQUEST) {
            let request = ApiAddTracksRequest {
                uris: chunk.iter().map(|id| track_uri(id)).collect(),
            };
            let body =
                serde_json::to_string(&request).map_err(|e| PlaylistError::Parse(e.to_string()))?;
            self.send(Method::Post, &url, Some(body), "add tracks").await?;
            log::debug!("Added {} tracks to playlist {playlist_id}", chunk.len());
        }
        Ok(())
    }
}

// =============================================================================
// API payloads
// =============================================================================

#[derive(Deserialize)]
pub struct ApiUser {
    pub id: String,
}

#[derive(Deserialize)]
pub struct ApiSearchResponse {
    pub tracks: ApiTrackPage,
}

#[derive(Deserialize)]
pub struct ApiTrackPage {
    #[serde(default)]
    pub items: Vec<Option<ApiTrack>>,
}

#[derive(Deserialize)]
pub struct ApiTrack {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ApiArtist>,
    pub album: Option<ApiAlbum>,
    pub popularity: Option<u32>,
}

#[derive(Deserialize)]
pub struct ApiArtist {
    pub name: String,
}

#[derive(Deserialize)]
pub struct ApiAlbum {
    pub name: String,
    pub release_date: Option<String>,
}

#[derive(Serialize)]
struct ApiCreatePlaylistRequest<'a> {
    name: &'a str,
    description: &'a str,
    public: bool,
}

#[derive(Deserialize)]
pub struct ApiPlaylist {
    pub id: String,
    #[serde(default)]
    pub external_urls: Option<ApiExternalUrls>,
}

#[derive(Deserialize)]
pub struct ApiExternalUrls {
    pub spotify: Option<String>,
}

#[derive(Deserialize)]
pub struct ApiPlaylistItems {
    #[serde(default)]
    pub items: Vec<ApiPlaylistItem>,
    pub next: Option<String>,
}

#[derive(Deserialize)]
pub struct ApiPlaylistItem {
    pub track: Option<ApiPlaylistTrack>,
}

#[derive(Deserialize)]
pub struct ApiPlaylistTrack {
    pub id: Option<String>,
}

#[derive(Serialize)]
struct ApiAddTracksRequest {
    uris: Vec<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// One page of playlist contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistItemsPage {
    pub track_ids: Vec<String>,
    /// URL of the following page, if any
    pub next: Option<String>,
}

pub fn parse_search_response(json: &str) -> Result<Vec<CandidateTrack>> {
    let response: ApiSearchResponse =
        serde_json::from_str(json).map_err(|e| PlaylistError::Parse(e.to_string()))?;

    let tracks = response
        .tracks
        .items
        .into_iter()
        .flatten()
        .filter_map(|t| {
            // local and unavailable tracks have no ID and can't be added
            let id = t.id?;
            let artists = t.artists.into_iter().map(|a| a.name).collect();
            let mut track = CandidateTrack::new(id, artists, t.name);
            if let Some(album) = t.album {
                if let Some(year) = album.release_date.as_deref().and_then(release_year) {
                    track = track.with_release_year(year);
                }
                track = track.with_album(album.name);
            }
            if let Some(popularity) = t.popularity {
                track = track.with_popularity(popularity);
            }
            Some(track)
        })
        .collect();

    Ok(tracks)
}

pub fn parse_created_playlist(json: &str) -> Result<CreatedPlaylist> {
    let playlist: ApiPlaylist =
        serde_json::from_str(json).map_err(|e| PlaylistError::Parse(e.to_string()))?;
    Ok(CreatedPlaylist {
        id: playlist.id,
        url: playlist.external_urls.and_then(|urls| urls.spotify),
    })
}

pub fn parse_playlist_items_page(json: &str) -> Result<PlaylistItemsPage> {
    let page: ApiPlaylistItems =
        serde_json::from_str(json).map_err(|e| PlaylistError::Parse(e.to_string()))?;
    Ok(PlaylistItemsPage {
        track_ids: page
            .items
            .into_iter()
            .filter_map(|item| item.track?.id)
            .collect(),
        next: page.next,
    })
}

/// Error message from a Spotify error body, or the raw body when it isn't one.
pub fn parse_api_error(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.error.message,
        Err(_) => body.trim().to_string(),
    }
}

/// Year from a release date of `YYYY`, `YYYY-MM` or `YYYY-MM-DD` precision.
fn release_year(date: &str) -> Option<u16> {
    date.get(..4)?.parse().ok()
}
