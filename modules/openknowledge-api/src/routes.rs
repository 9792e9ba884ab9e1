use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query as QueryParams, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures::StreamExt;
use serde::Deserialize;
use tracing::info;

use openknowledge_common::{Query, StreamEvent};
use openknowledge_engine::StreamCoordinator;

pub const NDJSON: &str = "application/x-ndjson";

pub struct AppState {
    pub coordinator: StreamCoordinator,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: Option<String>,
}

pub fn router(coordinator: StreamCoordinator) -> Router {
    let state = Arc::new(AppState { coordinator });

    Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        .route("/search", get(search))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // method + path only; the query string carries user input
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

/// One JSON object per line, flushed as each source finishes.
async fn search(
    State(state): State<Arc<AppState>>,
    QueryParams(params): QueryParams<SearchParams>,
) -> Response {
    let query = match Query::parse(params.query.as_deref().unwrap_or_default()) {
        Ok(q) => q,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };
    info!(query = %query, "search requested");

    let lines = state.coordinator.start(query).map(|event| {
        let mut line = serde_json::to_string(&StreamEvent::from(&event))?;
        line.push('\n');
        Ok::<_, serde_json::Error>(line)
    });

    (
        [(header::CONTENT_TYPE, NDJSON)],
        Body::from_stream(lines),
    )
        .into_response()
}
