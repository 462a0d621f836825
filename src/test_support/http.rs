//! A local origin for tests that need a real HTTP round trip.

use httpmock::prelude::*;
use httpmock::MockServer;

/// Starts an origin answering GET on each `(path, status, body)` route. The
/// content type follows the path's extension, like a static file host.
pub async fn asset_origin(routes: &[(&str, u16, &str)]) -> MockServer {
    let server = MockServer::start_async().await;
    for &(path, status, body) in routes {
        server
            .mock_async(|when, then| {
                when.method(GET).path(path);
                then.status(status)
                    .header("content-type", content_type(path))
                    .body(body);
            })
            .await;
    }
    server
}

fn content_type(path: &str) -> &'static str {
    match path.rsplit_once('.').map(|(_, ext)| ext) {
        Some("png") => "image/png",
        Some("json") => "application/manifest+json",
        Some("js") => "text/javascript",
        Some("woff2") => "font/woff2",
        Some("html") => "text/html",
        _ if path.ends_with('/') => "text/html",
        _ => "text/plain",
    }
}
