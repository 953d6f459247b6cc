use axum::{extract::{Path, Query, State}, http::StatusCode, routing::get, Json, Router};
use minisearch_core::{SearchEngine, SearchHit};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod repl;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
}

type ApiError = (StatusCode, String);

fn internal(e: anyhow::Error) -> ApiError {
    tracing::error!(error = %e, "request failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// HTTP surface over one loaded index. Handlers only read, so every request shares
/// the same engine.
pub fn build_app(engine: Arc<SearchEngine>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .with_state(AppState { engine })
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let hits = state.engine.search(&params.q).map_err(internal)?;
    let total_hits = hits.len();
    let k = params.k.clamp(1, 100);
    let results = hits.into_iter().take(k).collect();
    Ok(Json(SearchResponse { query: params.q, took_s: start.elapsed().as_secs_f64(), total_hits, results }))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<u32>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match state.engine.store().get(doc_id).map_err(internal)? {
        Some(doc) => Ok(Json(serde_json::json!({
            "doc_id": doc.id,
            "url": doc.url,
            "crawled_at": doc.crawled_at,
            "text": doc.text_content,
        }))),
        None => Err((StatusCode::NOT_FOUND, format!("no document {doc_id}"))),
    }
}
