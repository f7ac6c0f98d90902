//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::assets;
use crate::live_reload;
use crate::middleware::headers;
use crate::state::AppState;

/// Create the application router.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/event_source", get(live_reload::event_source))
        .fallback(assets::serve_asset)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(headers::no_store_layer()),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use futures::StreamExt;
    use pretty_assertions::assert_eq;
    use siteloop_build::UpdateMarker;
    use std::path::Path;
    use std::time::Duration;
    use tower::ServiceExt;

    use crate::assets::RELOAD_SCRIPT;

    fn router(output_dir: &Path, marker: &Arc<UpdateMarker>) -> Router {
        create_router(Arc::new(AppState {
            output_dir: output_dir.to_path_buf(),
            marker: Arc::clone(marker),
            poll_interval: Duration::from_millis(10),
        }))
    }

    async fn get_path(app: Router, path: &str) -> axum::response::Response {
        app.oneshot(Request::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn test_html_page_gets_reload_script() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("index.html"),
            "<html><body><h1>Blog</h1></body></html>",
        )
        .unwrap();
        let marker = Arc::new(UpdateMarker::new());

        let response = get_path(router(dir.path(), &marker), "/").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
        let body = String::from_utf8(body_bytes(response).await).unwrap();
        assert_eq!(
            body,
            format!("<html><body><h1>Blog</h1>{RELOAD_SCRIPT}</body></html>")
        );
    }

    #[tokio::test]
    async fn test_latin1_page_keeps_its_own_charset() {
        let dir = tempfile::tempdir().unwrap();
        let page = b"<html><head><meta charset=\"iso-8859-1\"></head><body>Caf\xe9</body></html>";
        std::fs::write(dir.path().join("cafe.html"), page).unwrap();
        let marker = Arc::new(UpdateMarker::new());

        let response = get_path(router(dir.path(), &marker), "/cafe.html").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/html");
        let mut expected =
            b"<html><head><meta charset=\"iso-8859-1\"></head><body>Caf\xe9".to_vec();
        expected.extend_from_slice(RELOAD_SCRIPT.as_bytes());
        expected.extend_from_slice(b"</body></html>");
        assert_eq!(body_bytes(response).await, expected);
    }

    #[tokio::test]
    async fn test_html_without_body_close_is_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("fragment.html"), "<p>partial</p>").unwrap();
        let marker = Arc::new(UpdateMarker::new());

        let response = get_path(router(dir.path(), &marker), "/fragment.html").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"<p>partial</p>");
    }

    #[tokio::test]
    async fn test_non_html_asset_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("theme/css")).unwrap();
        let css = "body { color: black; }\n/* </body> */\n";
        std::fs::write(dir.path().join("theme/css/main.css"), css).unwrap();
        let marker = Arc::new(UpdateMarker::new());

        let response = get_path(router(dir.path(), &marker), "/theme/css/main.css").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/css");
        assert_eq!(body_bytes(response).await, css.as_bytes());
    }

    #[tokio::test]
    async fn test_directory_serves_index() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("archives")).unwrap();
        std::fs::write(
            dir.path().join("archives/index.html"),
            "<body>Archives</body>",
        )
        .unwrap();
        let marker = Arc::new(UpdateMarker::new());

        let response = get_path(router(dir.path(), &marker), "/archives/").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = String::from_utf8(body_bytes(response).await).unwrap();
        assert_eq!(body, format!("<body>Archives{RELOAD_SCRIPT}</body>"));
    }

    #[tokio::test]
    async fn test_directory_without_index_is_404() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("images")).unwrap();
        let marker = Arc::new(UpdateMarker::new());

        let response = get_path(router(dir.path(), &marker), "/images/").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_file_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let marker = Arc::new(UpdateMarker::new());

        let response = get_path(router(dir.path(), &marker), "/no-such-post.html").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_responses_are_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<body></body>").unwrap();
        let marker = Arc::new(UpdateMarker::new());

        let found = get_path(router(dir.path(), &marker), "/").await;
        let missing = get_path(router(dir.path(), &marker), "/missing").await;

        assert_eq!(found.headers()[header::CACHE_CONTROL], "no-store");
        assert_eq!(missing.headers()[header::CACHE_CONTROL], "no-store");
    }

    #[tokio::test]
    async fn test_event_source_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let marker = Arc::new(UpdateMarker::new());

        let response = get_path(router(dir.path(), &marker), "/event_source").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );
    }

    #[tokio::test]
    async fn test_event_source_sends_update_after_rebuild() {
        let dir = tempfile::tempdir().unwrap();
        let marker = Arc::new(UpdateMarker::new());

        let response = get_path(router(dir.path(), &marker), "/event_source").await;
        let mut frames = response.into_body().into_data_stream();

        marker.advance();

        let frame = tokio::time::timeout(Duration::from_secs(2), frames.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(
            String::from_utf8(frame.to_vec()).unwrap(),
            "event: update\ndata: _\n\n"
        );
    }

    #[tokio::test]
    async fn test_event_source_collapses_rebuilds_between_polls() {
        let dir = tempfile::tempdir().unwrap();
        let marker = Arc::new(UpdateMarker::new());

        let response = get_path(router(dir.path(), &marker), "/event_source").await;
        let mut frames = response.into_body().into_data_stream();

        marker.advance();
        marker.advance();

        let first = tokio::time::timeout(Duration::from_secs(2), frames.next()).await;
        assert!(first.is_ok());
        let second = tokio::time::timeout(Duration::from_millis(200), frames.next()).await;
        assert!(second.is_err());
    }
}
