//! HTTP request handlers

use super::state::AppState;
use crate::results::SearchResult;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Query parameters for search
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Search query
    pub q: Option<String>,
    /// Result bound for a fresh fetch
    pub max_results: Option<usize>,
}

/// Search results response
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub number_of_results: usize,
    pub results: Vec<SearchResult>,
}

/// Search handler
pub async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let query = match params.q {
        Some(q) if !q.trim().is_empty() => q,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "missing query parameter 'q'" })),
            )
                .into_response()
        }
    };

    let limits = &state.settings.search;
    let max_results = params
        .max_results
        .unwrap_or(limits.default_max_results)
        .clamp(1, limits.max_results_limit.max(1));

    let results = state.search.search(&query, max_results).await;

    Json(SearchResponse {
        query,
        number_of_results: results.len(),
        results,
    })
    .into_response()
}

/// Stats handler
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.search.metrics().snapshot())
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "instance": state.instance_name(),
        "version": crate::VERSION
    }))
}
