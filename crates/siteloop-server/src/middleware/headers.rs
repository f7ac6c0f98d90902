//! Response header middleware.
//!
//! Every response is marked uncacheable so a reload always refetches the
//! freshly built output.

use axum::http::HeaderValue;
use axum::http::header::CACHE_CONTROL;
use tower_http::set_header::SetResponseHeaderLayer;

/// Cache-Control header value.
const NO_STORE: &str = "no-store";

/// Create layer that adds `Cache-Control: no-store`.
pub(crate) fn no_store_layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(CACHE_CONTROL, HeaderValue::from_static(NO_STORE))
}
