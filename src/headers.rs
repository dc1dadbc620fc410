use http_client::Request;

/// Browser user agent for source site page requests
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// User agent for streaming platform API calls
const API_USER_AGENT: &str = concat!("standards-playlist/", env!("CARGO_PKG_VERSION"));

/// Add headers for fetching a regular HTML page from the source site
pub fn add_page_headers(request: &mut Request) {
    let _ = request.insert_header("User-Agent", USER_AGENT);
    let _ = request.insert_header(
        "Accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    );
    let _ = request.insert_header("Accept-Language", "en-US,en;q=0.9");
}

/// Add bearer authorization and JSON headers for a platform API call
pub fn add_api_headers(request: &mut Request, access_token: &str) {
    let _ = request.insert_header("User-Agent", API_USER_AGENT);
    let _ = request.insert_header("Authorization", format!("Bearer {access_token}"));
    let _ = request.insert_header("Accept", "application/json");
}

/// Add headers for a JSON request body
pub fn add_json_body_headers(request: &mut Request) {
    let _ = request.insert_header("Content-Type", "application/json");
}

/// Add headers for a URL-encoded form body (token endpoint)
pub fn add_form_headers(request: &mut Request) {
    let _ = request.insert_header("User-Agent", API_USER_AGENT);
    let _ = request.insert_header("Content-Type", "application/x-www-form-urlencoded");
    let _ = request.insert_header("Accept", "application/json");
}

/// Encode key/value pairs as an `application/x-www-form-urlencoded` body
pub fn encode_form(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
