#![allow(dead_code)]
use async_trait::async_trait;
use http_client::{HttpClient, Request};
use http_types::{Method, Response, Url};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// A request the scripted client received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: Url,
    pub body: String,
    pub authorization: Option<String>,
}

impl RecordedRequest {
    /// Decoded value of a query parameter.
    pub fn query(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

#[derive(Debug, Clone)]
struct CannedResponse {
    status: u16,
    body: String,
    headers: Vec<(String, String)>,
}

#[derive(Debug)]
struct Route {
    method: Method,
    path: String,
    responses: VecDeque<CannedResponse>,
}

#[derive(Debug, Default)]
struct Script {
    routes: Vec<Route>,
    requests: Vec<RecordedRequest>,
}

/// HTTP client that answers from a script instead of the network.
///
/// Responses are keyed by method and URL path. Each route replays its
/// responses in order and keeps repeating the last one. Unknown routes get
/// a 404.
#[derive(Debug, Clone, Default)]
pub struct ScriptedHttpClient {
    script: Arc<Mutex<Script>>,
}

impl ScriptedHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, method: Method, path: &str, status: u16, body: &str) -> &Self {
        self.on_with_headers(method, path, status, body, &[])
    }

    pub fn on_with_headers(
        &self,
        method: Method,
        path: &str,
        status: u16,
        body: &str,
        headers: &[(&str, &str)],
    ) -> &Self {
        let response = CannedResponse {
            status,
            body: body.to_string(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };

        let mut script = self.script.lock().unwrap();
        match script
            .routes
            .iter_mut()
            .find(|r| r.method == method && r.path == path)
        {
            Some(route) => route.responses.push_back(response),
            None => script.routes.push(Route {
                method,
                path: path.to_string(),
                responses: VecDeque::from([response]),
            }),
        }
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.script.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.path() == path)
            .collect()
    }

    pub fn boxed(&self) -> Box<dyn HttpClient + Send + Sync> {
        Box::new(self.clone())
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn send(&self, mut req: Request) -> Result<Response, http_types::Error> {
        let body = req.body_string().await.unwrap_or_default();
        let authorization = req
            .header("Authorization")
            .map(|values| values.last().as_str().to_string());

        let canned = {
            let mut script = self.script.lock().unwrap();
            script.requests.push(RecordedRequest {
                method: req.method(),
                url: req.url().clone(),
                body,
                authorization,
            });

            let path = req.url().path().to_string();
            script
                .routes
                .iter_mut()
                .find(|r| r.method == req.method() && r.path == path)
                .and_then(|route| {
                    if route.responses.len() > 1 {
                        route.responses.pop_front()
                    } else {
                        route.responses.front().cloned()
                    }
                })
        };

        let Some(canned) = canned else {
            let mut response = Response::new(404);
            response.set_body(format!("no scripted response for {}", req.url()));
            return Ok(response);
        };

        let mut response = Response::new(canned.status);
        for (name, value) in &canned.headers {
            let _ = response.insert_header(name.as_str(), value.as_str());
        }
        response.set_body(canned.body);
        Ok(response)
    }
}

pub const SPOTIFY_BASE: &str = "http://spotify.test/v1";
pub const JAZZ_BASE: &str = "http://jazz.test";

/// Spotify search response with one track per `(id, artist, title)`.
pub fn search_json(tracks: &[(&str, &str, &str)]) -> String {
    let items: Vec<serde_json::Value> = tracks
        .iter()
        .map(|(id, artist, title)| {
            serde_json::json!({
                "id": id,
                "name": title,
                "popularity": 50,
                "artists": [{"name": artist}],
                "album": {"name": "Album", "release_date": "1959-01-01"}
            })
        })
        .collect();
    serde_json::json!({"tracks": {"items": items}}).to_string()
}

/// Standards index page linking each title to `/compositions-0/<slug>.htm`.
pub fn index_html(titles: &[&str]) -> String {
    let rows: String = titles
        .iter()
        .map(|title| {
            format!(
                r#"<tr><td><a href="../compositions-0/{}.htm">{title}</a></td></tr>"#,
                slug(title)
            )
        })
        .collect();
    format!("<html><body><table>{rows}</table></body></html>")
}

/// A standard's page listing recordings as "Artist (Year), Album".
pub fn standard_html(recordings: &[(&str, u16)]) -> String {
    let items: String = recordings
        .iter()
        .map(|(artist, year)| format!("<li><b>{artist}</b> ({year}), Some Album</li>"))
        .collect();
    format!("<html><body><p>History of the song.</p><h2>Recommended Recordings</h2><ul>{items}</ul></body></html>")
}

pub fn slug(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_lowercase()
}

pub fn standard_path(title: &str) -> String {
    format!("/compositions-0/{}.htm", slug(title))
}
