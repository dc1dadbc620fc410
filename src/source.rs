use crate::headers;
use crate::parsing::SourceParser;
use crate::throttle::Throttle;
use crate::{PlaylistError, Recommendation, Result, Standard};
use async_trait::async_trait;
use http_client::{HttpClient, Request};
use http_types::{Method, Url};
use scraper::Html;
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// SourceCatalog trait
// =============================================================================

/// Where standards and their recommended recordings come from.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait(?Send)]
pub trait SourceCatalog {
    /// The ranked list of standards, best first.
    async fn fetch_standards(&self) -> Result<Vec<Standard>>;

    /// Recommended recordings for one standard, in the order the source lists
    /// them. Failures are reported as [`PlaylistError::Fetch`].
    async fn fetch_recommendations(&self, standard: &Standard) -> Result<Vec<Recommendation>>;
}

// =============================================================================
// jazzstandards.com client
// =============================================================================

/// Scraping client for jazzstandards.com.
#[derive(Clone)]
pub struct JazzStandardsClient {
    client: Arc<dyn HttpClient + Send + Sync>,
    base_url: String,
    max_standards: usize,
    parser: SourceParser,
    politeness: Arc<Throttle>,
}

impl JazzStandardsClient {
    pub const DEFAULT_BASE_URL: &'static str = "https://www.jazzstandards.com";
    pub const INDEX_PATH: &'static str = "/compositions/index.htm";
    pub const DEFAULT_MAX_STANDARDS: usize = 100;
    pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(500);

    pub fn new(client: Box<dyn HttpClient + Send + Sync>) -> Self {
        Self::with_base_url(client, Self::DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(client: Box<dyn HttpClient + Send + Sync>, base_url: String) -> Self {
        Self {
            client: Arc::from(client),
            base_url: base_url.trim_end_matches('/').to_string(),
            max_standards: Self::DEFAULT_MAX_STANDARDS,
            parser: SourceParser::new(),
            politeness: Arc::new(Throttle::new(Self::DEFAULT_PAGE_DELAY)),
        }
    }

    /// Limit how many standards are read from the index.
    pub fn with_max_standards(mut self, max_standards: usize) -> Self {
        self.max_standards = max_standards;
        self
    }

    /// Minimum delay between page fetches.
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.politeness = Arc::new(Throttle::new(delay));
        self
    }

    pub fn index_url(&self) -> String {
        format!("{}{}", self.base_url, Self::INDEX_PATH)
    }

    async fn get_page(&self, url: &str) -> Result<String> {
        self.politeness.wait().await;

        let parsed = url
            .parse::<Url>()
            .map_err(|e| PlaylistError::Http(format!("Invalid URL '{url}': {e}")))?;
        let mut request = Request::new(Method::Get, parsed);
        headers::add_page_headers(&mut request);

        log::debug!("Fetching page: {url}");
        let mut response = self
            .client
            .send(request)
            .await
            .map_err(|e| PlaylistError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PlaylistError::Http(format!(
                "HTTP {} fetching {url}",
                response.status()
            )));
        }

        response
            .body_string()
            .await
            .map_err(|e| PlaylistError::Http(e.to_string()))
    }
}

#[async_trait(?Send)]
impl SourceCatalog for JazzStandardsClient {
    async fn fetch_standards(&self) -> Result<Vec<Standard>> {
        let index_url = self.index_url();
        log::info!("Fetching standards index from {index_url}");

        let body = self.get_page(&index_url).await?;
        let document = Html::parse_document(&body);
        let standards =
            self.parser
                .parse_standards_index(&document, &index_url, self.max_standards)?;

        if standards.is_empty() {
            return Err(PlaylistError::Parse(format!(
                "No standards found on {index_url}"
            )));
        }

        log::info!("Found {} standards", standards.len());
        Ok(standards)
    }

    async fn fetch_recommendations(&self, standard: &Standard) -> Result<Vec<Recommendation>> {
        let body = self
            .get_page(&standard.url)
            .await
            .map_err(|e| PlaylistError::Fetch {
                standard: standard.title.clone(),
                message: e.to_string(),
            })?;

        let document = Html::parse_document(&body);
        Ok(self.parser.parse_recommendations(&document, standard))
    }
}
