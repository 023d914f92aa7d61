use std::sync::{Arc, OnceLock};

use axum::{
    extract::{RawQuery, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use regex::Regex;
use serde_json::json;
use tracing::{info, warn};

use crate::models::{PathRequest, PathResponse};
use crate::services::PathProvider;

pub type SharedPathProvider = Arc<dyn PathProvider>;

/// Answer `GET /?slat,slng,tlat,tlng[&callback=name]` with the path between
/// the two endpoints.
///
/// Without `callback` the body is plain JSON `{"path": [...]}`; with it the
/// JSON is wrapped as `name({...})` for script-tag clients.
pub async fn compute_path(
    State(provider): State<SharedPathProvider>,
    RawQuery(query): RawQuery,
) -> Response {
    let query = query.unwrap_or_default();

    let request = match PathRequest::from_query(&query) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejected path query {:?}: {}", query, e);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };

    let path = provider.path_between(&request);
    info!(
        "Path {} → {}: {} points, {:.0}m",
        request.source,
        request.target,
        path.points().len(),
        path.length_meters()
    );

    let wire = PathResponse::new(path).to_wire();

    match callback_name(&query) {
        Some(callback) => {
            let body = match serde_json::to_string(&wire) {
                Ok(body) => body,
                Err(e) => {
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Failed to encode path: {}", e),
                    )
                        .into_response()
                }
            };

            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/javascript")],
                format!("{}({})", callback, body),
            )
                .into_response()
        }
        None => Json(wire).into_response(),
    }
}

/// The `callback` parameter, if present and a plain identifier
fn callback_name(query: &str) -> Option<&str> {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    let ident = IDENT.get_or_init(|| {
        Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$.]*$").expect("callback regex is valid")
    });

    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "callback")
        .map(|(_, value)| value)
        .filter(|value| ident.is_match(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_name() {
        assert_eq!(callback_name("1,2,3,4&callback=redrawLine"), Some("redrawLine"));
        assert_eq!(callback_name("1,2,3,4&_=17&callback=jQuery123_456"), Some("jQuery123_456"));
        assert_eq!(callback_name("1,2,3,4"), None);
        assert_eq!(callback_name("1,2,3,4&callback=alert(1)"), None);
        assert_eq!(callback_name("1,2,3,4&callback="), None);
    }
}
