mod common;

use common::{index_html, standard_html, standard_path, ScriptedHttpClient, JAZZ_BASE};
use http_types::Method;
use standards_playlist::{JazzStandardsClient, PlaylistError, SourceCatalog};
use std::time::Duration;

fn client(http: &ScriptedHttpClient) -> JazzStandardsClient {
    JazzStandardsClient::with_base_url(http.boxed(), JAZZ_BASE.to_string())
        .with_page_delay(Duration::ZERO)
}

#[test_log::test(tokio::test)]
async fn fetch_standards_from_index() {
    let http = ScriptedHttpClient::new();
    http.on(
        Method::Get,
        "/compositions/index.htm",
        200,
        &index_html(&["Body and Soul", "All the Things You Are", "Autumn Leaves"]),
    );

    let standards = client(&http).fetch_standards().await.unwrap();

    assert_eq!(standards.len(), 3);
    assert_eq!(standards[0].rank, 1);
    assert_eq!(standards[0].title, "Body and Soul");
    assert_eq!(standards[0].url, format!("{JAZZ_BASE}/compositions-0/bodyandsoul.htm"));
    assert_eq!(standards[2].title, "Autumn Leaves");

    let request = &http.requests()[0];
    assert!(request.url.as_str().ends_with("/compositions/index.htm"));
}

#[test_log::test(tokio::test)]
async fn max_standards_limits_index() {
    let http = ScriptedHttpClient::new();
    http.on(
        Method::Get,
        "/compositions/index.htm",
        200,
        &index_html(&["Body and Soul", "All the Things You Are", "Autumn Leaves"]),
    );

    let standards = client(&http)
        .with_max_standards(2)
        .fetch_standards()
        .await
        .unwrap();
    assert_eq!(standards.len(), 2);
}

#[test_log::test(tokio::test)]
async fn empty_index_is_an_error() {
    let http = ScriptedHttpClient::new();
    http.on(
        Method::Get,
        "/compositions/index.htm",
        200,
        "<html><body>Under maintenance</body></html>",
    );

    let result = client(&http).fetch_standards().await;
    assert!(matches!(result, Err(PlaylistError::Parse(_))));
}

#[test_log::test(tokio::test)]
async fn fetch_recommendations_from_standard_page() {
    let http = ScriptedHttpClient::new();
    http.on(
        Method::Get,
        "/compositions/index.htm",
        200,
        &index_html(&["Body and Soul"]),
    )
    .on(
        Method::Get,
        &standard_path("Body and Soul"),
        200,
        &standard_html(&[("Coleman Hawkins", 1939), ("Billie Holiday", 1940)]),
    );

    let source = client(&http);
    let standards = source.fetch_standards().await.unwrap();
    let recs = source.fetch_recommendations(&standards[0]).await.unwrap();

    assert_eq!(recs.len(), 2);
    assert_eq!(recs[0].artist, "Coleman Hawkins");
    assert_eq!(recs[0].title, "Body and Soul");
    assert_eq!(recs[0].year, Some(1939));
    assert_eq!(recs[1].artist, "Billie Holiday");
}

#[test_log::test(tokio::test)]
async fn missing_page_is_a_fetch_error() {
    let http = ScriptedHttpClient::new();
    http.on(
        Method::Get,
        "/compositions/index.htm",
        200,
        &index_html(&["Solar"]),
    );

    let source = client(&http);
    let standards = source.fetch_standards().await.unwrap();
    let err = source.fetch_recommendations(&standards[0]).await.unwrap_err();

    match err {
        PlaylistError::Fetch { standard, message } => {
            assert_eq!(standard, "Solar");
            assert!(message.contains("404"));
        }
        other => panic!("expected fetch error, got {other:?}"),
    }
}

#[test_log::test(tokio::test(start_paused = true))]
async fn page_fetches_are_spaced_out() {
    let http = ScriptedHttpClient::new();
    http.on(
        Method::Get,
        "/compositions/index.htm",
        200,
        &index_html(&["Solar", "Nardis"]),
    );

    let source = JazzStandardsClient::with_base_url(http.boxed(), JAZZ_BASE.to_string());
    let start = tokio::time::Instant::now();
    let standards = source.fetch_standards().await.unwrap();
    for standard in &standards {
        let _ = source.fetch_recommendations(standard).await;
    }

    assert_eq!(http.requests().len(), 3);
    assert!(start.elapsed() >= Duration::from_millis(1000));
}
