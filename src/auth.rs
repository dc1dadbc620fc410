//! Spotify authorization-code flow and token persistence.
//!
//! The flow is the one Spotify documents for command-line tools without a
//! local web server: print an authorize URL, let the user approve the app in
//! a browser, and have them paste the URL they were redirected to. The code
//! in that URL is exchanged for an access token and a refresh token. Tokens
//! are cached on disk so later runs only need a refresh.

use crate::config::SpotifyCredentials;
use crate::headers;
use crate::{PlaylistError, Result};
use chrono::{DateTime, Duration, Utc};
use http_client::{HttpClient, Request};
use http_types::{Method, Url};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const AUTHORIZE_URL: &str = "https://accounts.spotify.com/authorize";
pub const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Scopes needed to create playlists, read them back and add tracks.
pub const SCOPES: &str = "playlist-modify-public playlist-modify-private playlist-read-private";

/// Tokens this close to expiry are refreshed before use.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// A bearer token with the data needed to renew it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl AccessToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECS) >= self.expires_at
    }

    /// Whether the token was granted every scope in `required`.
    ///
    /// Tokens cached without scope information are assumed sufficient.
    pub fn covers_scopes(&self, required: &str) -> bool {
        match &self.scope {
            Some(granted) => {
                let granted: Vec<&str> = granted.split_whitespace().collect();
                required.split_whitespace().all(|s| granted.contains(&s))
            }
            None => true,
        }
    }
}

#[derive(Deserialize)]
struct ApiTokenResponse {
    access_token: String,
    expires_in: i64,
    refresh_token: Option<String>,
    scope: Option<String>,
}

#[derive(Deserialize)]
struct ApiTokenError {
    error: String,
    error_description: Option<String>,
}

/// Parse a token endpoint response received at `now`.
///
/// Refresh responses may omit the refresh token, in which case
/// `previous_refresh` is carried over.
pub fn parse_token_response(
    json: &str,
    now: DateTime<Utc>,
    previous_refresh: Option<&str>,
) -> Result<AccessToken> {
    let response: ApiTokenResponse = serde_json::from_str(json)
        .map_err(|e| PlaylistError::Auth(format!("Unexpected token response: {e}")))?;

    Ok(AccessToken {
        access_token: response.access_token,
        refresh_token: response
            .refresh_token
            .or_else(|| previous_refresh.map(str::to_string)),
        expires_at: now + Duration::seconds(response.expires_in),
        scope: response.scope,
    })
}

fn parse_token_error(body: &str) -> String {
    match serde_json::from_str::<ApiTokenError>(body) {
        Ok(err) => match err.error_description {
            Some(description) => format!("{}: {description}", err.error),
            None => err.error,
        },
        Err(_) => body.trim().to_string(),
    }
}

/// URL the user opens to approve the application.
pub fn authorize_url(credentials: &SpotifyCredentials, state: &str) -> String {
    format!(
        "{AUTHORIZE_URL}?client_id={}&response_type=code&redirect_uri={}&scope={}&state={}",
        urlencoding::encode(&credentials.client_id),
        urlencoding::encode(&credentials.redirect_uri),
        urlencoding::encode(SCOPES),
        urlencoding::encode(state)
    )
}

/// Opaque value tying a redirect to the authorize request that caused it.
pub fn new_state() -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64;
    format!("{:x}{:x}", nanos, std::process::id())
}

/// Extract the authorization code from the URL the browser was redirected to.
///
/// A bare code (no scheme, no spaces) is accepted as-is. When the redirect
/// carries a `state`, it must equal `expected_state`.
pub fn parse_redirect(input: &str, expected_state: &str) -> Result<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(PlaylistError::Auth("No redirect URL provided".to_string()));
    }

    let url = match Url::parse(input) {
        Ok(url) => url,
        Err(_) if !input.contains(char::is_whitespace) && !input.contains('=') => {
            return Ok(input.to_string());
        }
        Err(e) => {
            return Err(PlaylistError::Auth(format!("Invalid redirect URL: {e}")));
        }
    };

    let mut code = None;
    let mut state = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => {
                return Err(PlaylistError::Auth(format!(
                    "Authorization was denied: {value}"
                )));
            }
            _ => {}
        }
    }

    if let Some(state) = state {
        if state != expected_state {
            return Err(PlaylistError::Auth(
                "State mismatch in redirect URL; start the login again".to_string(),
            ));
        }
    }

    code.ok_or_else(|| PlaylistError::Auth("Redirect URL has no authorization code".to_string()))
}

/// Talks to the Spotify accounts service.
#[derive(Clone)]
pub struct SpotifyAuth {
    client: Arc<dyn HttpClient + Send + Sync>,
    credentials: SpotifyCredentials,
    token_url: String,
}

impl SpotifyAuth {
    pub fn new(client: Box<dyn HttpClient + Send + Sync>, credentials: SpotifyCredentials) -> Self {
        Self {
            client: Arc::from(client),
            credentials,
            token_url: TOKEN_URL.to_string(),
        }
    }

    pub fn with_token_url(mut self, token_url: String) -> Self {
        self.token_url = token_url;
        self
    }

    pub fn credentials(&self) -> &SpotifyCredentials {
        &self.credentials
    }

    pub fn authorize_url(&self, state: &str) -> String {
        authorize_url(&self.credentials, state)
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<AccessToken> {
        log::debug!("Exchanging authorization code for tokens");
        let body = self
            .request_token(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.credentials.redirect_uri.as_str()),
            ])
            .await?;
        parse_token_response(&body, Utc::now(), None)
    }

    /// Renew an access token with its refresh token.
    pub async fn refresh(&self, token: &AccessToken) -> Result<AccessToken> {
        let refresh_token = token
            .refresh_token
            .as_deref()
            .ok_or_else(|| PlaylistError::Auth("Cached token has no refresh token".to_string()))?;

        log::debug!("Refreshing access token");
        let body = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
            ])
            .await?;
        parse_token_response(&body, Utc::now(), Some(refresh_token))
    }

    async fn request_token(&self, fields: &[(&str, &str)]) -> Result<String> {
        let url = self
            .token_url
            .parse::<Url>()
            .map_err(|e| PlaylistError::Auth(format!("Invalid token URL: {e}")))?;

        let mut form = fields.to_vec();
        form.push(("client_id", self.credentials.client_id.as_str()));
        form.push(("client_secret", self.credentials.client_secret.as_str()));

        let mut request = Request::new(Method::Post, url);
        headers::add_form_headers(&mut request);
        request.set_body(headers::encode_form(&form));

        let mut response = self
            .client
            .send(request)
            .await
            .map_err(|e| PlaylistError::Http(e.to_string()))?;
        let status = response.status();
        let body = response
            .body_string()
            .await
            .map_err(|e| PlaylistError::Http(e.to_string()))?;

        if !status.is_success() {
            return Err(PlaylistError::Auth(format!(
                "Token request failed ({status}): {}",
                parse_token_error(&body)
            )));
        }
        Ok(body)
    }
}

/// Token cache on disk.
///
/// Lives at `~/.local/share/standards-playlist/token.json` unless a path is
/// given.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store in the XDG data directory.
    pub fn default_location() -> Result<Self> {
        let data_dir = dirs::data_dir().ok_or_else(|| {
            PlaylistError::Config("Cannot determine XDG data directory".to_string())
        })?;
        Ok(Self::new(data_dir.join("standards-playlist").join("token.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn save(&self, token: &AccessToken) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(token)
            .map_err(|e| PlaylistError::Parse(format!("Failed to serialize token: {e}")))?;
        fs::write(&self.path, json)?;
        log::debug!("Token saved to: {}", self.path.display());
        Ok(())
    }

    pub fn load(&self) -> Result<AccessToken> {
        let json = fs::read_to_string(&self.path)?;
        let token = serde_json::from_str(&json)
            .map_err(|e| PlaylistError::Parse(format!("Failed to parse token file: {e}")))?;
        log::debug!("Token loaded from: {}", self.path.display());
        Ok(token)
    }

    pub fn remove(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            log::debug!("Token removed from: {}", self.path.display());
        }
        Ok(())
    }
}
