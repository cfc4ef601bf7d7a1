//! Serving of the embedded frontend bundle.

use axum::{
    body::Body,
    http::{Response, StatusCode, Uri, header},
    response::{Html, IntoResponse},
};
use tracing::{debug, instrument};

use crate::static_assets::Assets;

/// Serve an embedded asset, falling back to `index.html` so client-side
/// routes resolve after a hard refresh.
#[instrument]
pub async fn serve_embedded_asset(uri: Uri) -> impl IntoResponse {
    let mut path = uri.path().trim_start_matches('/');

    if path.is_empty() || path.ends_with('/') {
        path = "index.html";
    }

    if let Some(content) = Assets::get(path) {
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        // Hashed bundle output under assets/ never changes; everything else
        // (index.html in particular) must be revalidated
        let cache_control = if path.starts_with("assets/") {
            "public, max-age=31536000, immutable"
        } else {
            "no-cache"
        };

        return Response::builder()
            .header(header::CONTENT_TYPE, mime.as_ref())
            .header(header::CACHE_CONTROL, cache_control)
            .body(Body::from(content.data.into_owned()))
            .unwrap();
    }

    if let Some(index) = Assets::get("index.html") {
        return Response::builder()
            .header(header::CONTENT_TYPE, "text/html")
            .header(header::CACHE_CONTROL, "no-cache")
            .body(Body::from(index.data.into_owned()))
            .unwrap();
    }

    Response::builder().status(StatusCode::NOT_FOUND).body(Body::empty()).unwrap()
}

/// Bare SPA fallback used as the innermost handler in the fallback chain
#[instrument(err)]
pub async fn spa_fallback(uri: Uri) -> Result<Html<String>, StatusCode> {
    debug!("Serving SPA shell for: {}", uri.path());

    if let Some(index) = Assets::get("index.html") {
        Ok(Html(String::from_utf8_lossy(&index.data).to_string()))
    } else {
        Err(StatusCode::INTERNAL_SERVER_ERROR)
    }
}
