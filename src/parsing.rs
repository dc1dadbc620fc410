//! HTML parsing utilities for the jazz standards source site.
//!
//! Pure functions from parsed documents to [`Standard`] and
//! [`Recommendation`] records. The index page links every standard's page;
//! each standard's page names its recommended recordings in running text,
//! which is mined with a few artist patterns.

use crate::{PlaylistError, Recommendation, Result, Standard};
use http_types::Url;
use regex::{Captures, Regex};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Links to individual standard pages.
static STANDARD_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"compositions-0/.*\.htm").unwrap());

/// Heading introducing the recordings section of a standard's page.
static RECORDINGS_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)recommended\s+recordings").unwrap());

/// "Artist Name (1959"
static ARTIST_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<artist>[A-Z][a-z]+ [A-Z][a-z]+(?: [A-Z][a-z]+)?)\s*\((?P<year>\d{4})")
        .unwrap()
});

/// "Artist Name - Album title"
static ARTIST_INFO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<artist>[A-Z][a-z]+ [A-Z][a-z]+(?: [A-Z][a-z]+)?)\s*[-–]\s*(?P<info>[^(\n]+)")
        .unwrap()
});

/// "Artist Name and His Orchestra"
static ARTIST_ORCHESTRA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<artist>[A-Z][a-z]+ [A-Z][a-z]+(?: [A-Z][a-z]+)?)\s+and\s+His\s+Orchestra")
        .unwrap()
});

/// Parser for source site pages.
///
/// Stateless; kept as a struct so the fetcher owns one the way it owns its
/// HTTP client.
#[derive(Debug, Clone, Default)]
pub struct SourceParser;

impl SourceParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse the standards index page.
    ///
    /// Keeps links whose href points at a standard page, in page order,
    /// deduplicated by resolved URL, up to `limit` entries. Relative hrefs are
    /// resolved against `page_url`. Ranks start at 1.
    pub fn parse_standards_index(
        &self,
        document: &Html,
        page_url: &str,
        limit: usize,
    ) -> Result<Vec<Standard>> {
        let base = Url::parse(page_url)
            .map_err(|e| PlaylistError::Parse(format!("Invalid index URL '{page_url}': {e}")))?;
        let link_selector = Selector::parse("a[href]").unwrap();

        let mut seen_urls = HashSet::new();
        let mut standards = Vec::new();

        for link in document.select(&link_selector) {
            if standards.len() >= limit {
                break;
            }

            let Some(href) = link.value().attr("href") else {
                continue;
            };
            if !STANDARD_LINK.is_match(href) {
                continue;
            }

            let title = collapse_whitespace(&link.text().collect::<String>());
            if title.is_empty() {
                log::debug!("Skipping standard link without text: {href}");
                continue;
            }

            let url = match base.join(href) {
                Ok(url) => url.to_string(),
                Err(e) => {
                    log::debug!("Skipping unresolvable standard link '{href}': {e}");
                    continue;
                }
            };
            if !seen_urls.insert(url.clone()) {
                continue;
            }

            log::debug!("Found standard: {title}");
            standards.push(Standard::new(standards.len() + 1, title, url));
        }

        log::debug!("Parsed {} standards from index", standards.len());
        Ok(standards)
    }

    /// Parse the recommended recordings from a standard's page.
    ///
    /// Returns every recording found, in page order; callers apply their own
    /// ceiling.
    pub fn parse_recommendations(&self, document: &Html, standard: &Standard) -> Vec<Recommendation> {
        let text = document
            .root_element()
            .text()
            .collect::<Vec<_>>()
            .join("\n");
        self.extract_recommendations_from_text(&text, standard)
    }

    /// Mine recommendations out of page text.
    ///
    /// Only the text after a "Recommended Recordings" heading is used when the
    /// page has one. Matches from all patterns are merged in text order and
    /// deduplicated by artist (case-insensitive); a later match for the same
    /// artist fills in a missing year or album.
    pub fn extract_recommendations_from_text(
        &self,
        text: &str,
        standard: &Standard,
    ) -> Vec<Recommendation> {
        let section = match RECORDINGS_HEADING.find(text) {
            Some(heading) => &text[heading.end()..],
            None => {
                log::debug!("No recordings heading on page for '{}'", standard.title);
                text
            }
        };

        let mut found: Vec<(usize, Recommendation)> = Vec::new();
        for caps in ARTIST_YEAR.captures_iter(section) {
            let year = caps["year"].parse::<u16>().ok().filter(is_plausible_year);
            found.push(recording(&caps, standard, |rec| match year {
                Some(year) => rec.with_year(year),
                None => rec,
            }));
        }
        for caps in ARTIST_INFO.captures_iter(section) {
            let info = collapse_whitespace(&caps["info"]);
            let is_album = !info.is_empty() && !info.eq_ignore_ascii_case(&standard.title);
            found.push(recording(&caps, standard, |rec| {
                if is_album {
                    rec.with_album(info.clone())
                } else {
                    rec
                }
            }));
        }
        for caps in ARTIST_ORCHESTRA.captures_iter(section) {
            found.push(recording(&caps, standard, |rec| rec));
        }
        found.sort_by_key(|(position, _)| *position);

        let mut recordings: Vec<Recommendation> = Vec::new();
        for (_, rec) in found {
            let key = rec.artist.to_lowercase();
            if key == standard.title.to_lowercase() {
                continue;
            }
            match recordings.iter_mut().find(|r| r.artist.to_lowercase() == key) {
                Some(existing) => {
                    if existing.year.is_none() {
                        existing.year = rec.year;
                    }
                    if existing.album.is_none() {
                        existing.album = rec.album;
                    }
                }
                None => recordings.push(rec),
            }
        }

        log::debug!(
            "Found {} recommended recordings for '{}'",
            recordings.len(),
            standard.title
        );
        recordings
    }
}

fn recording(
    caps: &Captures<'_>,
    standard: &Standard,
    finish: impl FnOnce(Recommendation) -> Recommendation,
) -> (usize, Recommendation) {
    let whole = caps.get(0).map(|m| (m.start(), m.as_str())).unwrap_or((0, ""));
    let rec = Recommendation::for_standard(standard, caps["artist"].trim())
        .with_source_text(collapse_whitespace(whole.1));
    (whole.0, finish(rec))
}

fn is_plausible_year(year: &u16) -> bool {
    (1900..=2100).contains(year)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX_URL: &str = "https://www.jazzstandards.com/compositions/index.htm";

    fn standard(title: &str) -> Standard {
        Standard::new(1, title, "https://www.jazzstandards.com/compositions-0/x.htm")
    }

    #[test]
    fn test_parse_standards_index() {
        let html = r#"
            <html><body>
              <a href="/history/index.htm">History</a>
              <table>
                <tr><td>1</td><td><a href="../compositions-0/bodyandsoul.htm">Body and Soul</a></td></tr>
                <tr><td>2</td><td><a href="/compositions-0/allthethingsyouare.htm">All the
                    Things You Are</a></td></tr>
                <tr><td>3</td><td><a href="https://www.jazzstandards.com/compositions-0/bodyandsoul.htm">Body and Soul</a></td></tr>
                <tr><td>4</td><td><a href="../compositions-0/empty.htm"> </a></td></tr>
                <tr><td>5</td><td><a href="../compositions-1/other.htm">Other list</a></td></tr>
                <tr><td>6</td><td><a href="../compositions-0/autumnleaves.htm">Autumn Leaves</a></td></tr>
              </table>
            </body></html>
        "#;
        let document = Html::parse_document(html);

        let standards = SourceParser::new()
            .parse_standards_index(&document, INDEX_URL, 100)
            .unwrap();

        assert_eq!(standards.len(), 3);
        assert_eq!(standards[0].title, "Body and Soul");
        assert_eq!(
            standards[0].url,
            "https://www.jazzstandards.com/compositions-0/bodyandsoul.htm"
        );
        assert_eq!(standards[1].title, "All the Things You Are");
        assert_eq!(standards[2].title, "Autumn Leaves");
        assert_eq!(
            standards.iter().map(|s| s.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn test_parse_standards_index_limit() {
        let links: String = (0..120)
            .map(|i| format!(r#"<a href="/compositions-0/s{i}.htm">Standard {i}</a>"#))
            .collect();
        let document = Html::parse_document(&format!("<html><body>{links}</body></html>"));

        let standards = SourceParser::new()
            .parse_standards_index(&document, INDEX_URL, 100)
            .unwrap();
        assert_eq!(standards.len(), 100);
        assert_eq!(standards[99].title, "Standard 99");
    }

    #[test]
    fn test_invalid_index_url() {
        let document = Html::parse_document("<html></html>");
        let result = SourceParser::new().parse_standards_index(&document, "not a url", 10);
        assert!(matches!(result, Err(PlaylistError::Parse(_))));
    }

    #[test]
    fn test_parse_recommendations_section() {
        let html = r#"
            <html><body>
              <p>Written by Johnny Green (1930) for Gertrude Lawrence.</p>
              <h3>Recommended Recordings</h3>
              <ul>
                <li><b>Coleman Hawkins</b> (1939), Body and Soul, Bluebird</li>
                <li>Billie Holiday - Billie Holiday's Greatest Hits (Columbia)</li>
                <li>Sarah Vaughan (1954), Swingin' Easy</li>
                <li>Benny Goodman and His Orchestra, live</li>
                <li>Coleman Hawkins - The Complete Recordings</li>
              </ul>
            </body></html>
        "#;
        let document = Html::parse_document(html);
        let standard = standard("Body and Soul");

        let recs = SourceParser::new().parse_recommendations(&document, &standard);
        let artists: Vec<&str> = recs.iter().map(|r| r.artist.as_str()).collect();

        // the composer before the heading is ignored
        assert_eq!(
            artists,
            vec!["Coleman Hawkins", "Billie Holiday", "Sarah Vaughan", "Benny Goodman"]
        );

        assert_eq!(recs[0].year, Some(1939));
        assert_eq!(recs[0].album.as_deref(), Some("The Complete Recordings"));
        assert_eq!(recs[1].album.as_deref(), Some("Billie Holiday's Greatest Hits"));
        assert_eq!(recs[1].year, None);
        assert_eq!(recs[2].year, Some(1954));
        assert!(recs.iter().all(|r| r.title == "Body and Soul"));
        assert!(recs.iter().all(|r| r.standard_rank == 1));
    }

    #[test]
    fn test_page_without_heading_uses_whole_text() {
        let standard = standard("Take Five");
        let recs = SourceParser::new()
            .extract_recommendations_from_text("Dave Brubeck (1959) on Time Out", &standard);

        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].artist, "Dave Brubeck");
        assert_eq!(recs[0].year, Some(1959));
        assert_eq!(recs[0].source_text, "Dave Brubeck (1959");
    }

    #[test]
    fn test_info_matching_standard_title_is_not_an_album() {
        let standard = standard("Blue Monk");
        let recs = SourceParser::new()
            .extract_recommendations_from_text("Recommended Recordings\nThelonious Monk - Blue Monk", &standard);

        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].album, None);
    }

    #[test]
    fn test_implausible_year_ignored() {
        let standard = standard("Stardust");
        let recs = SourceParser::new()
            .extract_recommendations_from_text("Recommended Recordings Louis Armstrong (0001)", &standard);

        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].year, None);
    }

    #[test]
    fn test_page_without_recordings() {
        let document = Html::parse_document("<html><body><p>nothing here</p></body></html>");
        let recs = SourceParser::new().parse_recommendations(&document, &standard("Solar"));
        assert!(recs.is_empty());
    }
}
