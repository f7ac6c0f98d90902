//! Output file serving.
//!
//! Maps request paths onto the build output directory. HTML pages get the
//! live reload client spliced in before their closing body tag; every other
//! file is served as-is with static file semantics.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use percent_encoding::percent_decode_str;
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::error::ServerError;
use crate::state::AppState;

/// File served for directory requests.
const INDEX_FILE: &str = "index.html";

/// Closing tag the reload client is inserted in front of.
const BODY_CLOSE: &[u8] = b"</body>";

/// Live reload client injected into every HTML page.
pub(crate) const RELOAD_SCRIPT: &str = "<script>
var event_source = new EventSource('/event_source');
event_source.addEventListener('update', function () {
    location.reload();
});
</script>
";

/// Serve a file from the output directory.
pub(crate) async fn serve_asset(
    State(state): State<Arc<AppState>>,
    req: Request,
) -> Result<Response, ServerError> {
    let file = resolve(&state.output_dir, req.uri().path()).await?;

    if is_html(&file) {
        let content = tokio::fs::read(&file).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ServerError::NotFound(req.uri().path().to_owned())
            } else {
                ServerError::Io(e)
            }
        })?;
        // No charset: pages keep whatever their own <meta charset> declares.
        return Ok((
            [(header::CONTENT_TYPE, "text/html")],
            inject_reload_script(&content),
        )
            .into_response());
    }

    let Ok(response) = ServeFile::new(&file).oneshot(req).await;
    Ok(response.map(Body::new))
}

/// Resolve a request path to an existing file under `output_dir`.
///
/// Directories resolve to their index file. Paths with `..` components are
/// rejected rather than normalized.
async fn resolve(output_dir: &Path, request_path: &str) -> Result<PathBuf, ServerError> {
    let not_found = || ServerError::NotFound(request_path.to_owned());

    let decoded = percent_decode_str(request_path)
        .decode_utf8()
        .map_err(|_| not_found())?;

    let mut path = output_dir.to_path_buf();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => return Err(not_found()),
            segment if segment.contains('\\') || segment.contains('\0') => {
                return Err(not_found());
            }
            segment => path.push(segment),
        }
    }

    let mut metadata = tokio::fs::metadata(&path).await.map_err(|_| not_found())?;
    if metadata.is_dir() {
        path.push(INDEX_FILE);
        metadata = tokio::fs::metadata(&path).await.map_err(|_| not_found())?;
    }

    if metadata.is_file() {
        Ok(path)
    } else {
        Err(not_found())
    }
}

fn is_html(path: &Path) -> bool {
    mime_guess::from_path(path)
        .first()
        .is_some_and(|mime| mime.essence_str() == "text/html")
}

/// Insert [`RELOAD_SCRIPT`] before the last `</body>`.
///
/// Content without a closing body tag is returned unchanged.
pub(crate) fn inject_reload_script(content: &[u8]) -> Vec<u8> {
    let Some(at) = content
        .windows(BODY_CLOSE.len())
        .rposition(|window| window == BODY_CLOSE)
    else {
        return content.to_vec();
    };

    let mut injected = Vec::with_capacity(content.len() + RELOAD_SCRIPT.len());
    injected.extend_from_slice(&content[..at]);
    injected.extend_from_slice(RELOAD_SCRIPT.as_bytes());
    injected.extend_from_slice(&content[at..]);
    injected
}
