// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// Every endpoint is a read-only GET under `/api/`. Filters are read from the
// raw query pairs: a repeated key resolves to its last value, unknown keys are
// ignored, and nothing here rejects a request. Responses serialise borrowed
// records straight out of the shared dataset.
//
// CORS is fully permissive: any origin, method, and header.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::debug;

use crate::app_state::AppState;
use crate::dataset::ScenarioFilter;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        // ── Signals ─────────────────────────────────────────────────
        .route("/api/signals", get(sample_signals))
        .route("/api/signals/filter", get(filter_signals))
        // ── Scenarios ───────────────────────────────────────────────
        .route("/api/scenarios", get(list_scenarios))
        .route("/api/scenarios/filter", get(filter_scenarios))
        .route("/api/scenarios/combinations", get(scenario_combinations))
        // ── Middleware & State ───────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Query parameters
// =============================================================================

/// Query string as decoded key/value pairs, in request order.
type QueryPairs = Vec<(String, String)>;

/// Value of the last occurrence of `key`, if any.
fn last_param(pairs: &[(String, String)], key: &str) -> Option<String> {
    pairs
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
}

// =============================================================================
// Health
// =============================================================================

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.health())
}

// =============================================================================
// Signals
// =============================================================================

async fn sample_signals(State(state): State<Arc<AppState>>) -> Response {
    let sample = state
        .dataset
        .sample_signals(&mut rand::thread_rng(), state.signal_sample_size);
    debug!(returned = sample.len(), "signals sampled");
    Json(sample).into_response()
}

async fn filter_signals(
    State(state): State<Arc<AppState>>,
    query: Option<Query<QueryPairs>>,
) -> Response {
    let pairs = query.map(|Query(p)| p).unwrap_or_default();
    let ids = last_param(&pairs, "ids");
    let signals = state.dataset.filter_signals_by_ids(ids.as_deref());
    debug!(ids = ?ids, returned = signals.len(), "signals filtered");
    Json(signals).into_response()
}

// =============================================================================
// Scenarios
// =============================================================================

async fn list_scenarios(State(state): State<Arc<AppState>>) -> Response {
    Json(state.dataset.scenarios()).into_response()
}

async fn filter_scenarios(
    State(state): State<Arc<AppState>>,
    query: Option<Query<QueryPairs>>,
) -> Response {
    let pairs = query.map(|Query(p)| p).unwrap_or_default();
    let filter = ScenarioFilter {
        polarity: last_param(&pairs, "polarity"),
        likelihood: last_param(&pairs, "likelihood"),
    };
    let scenarios = state.dataset.filter_scenarios(&filter);
    debug!(
        polarity = ?filter.polarity,
        likelihood = ?filter.likelihood,
        returned = scenarios.len(),
        "scenarios filtered"
    );
    Json(scenarios).into_response()
}

async fn scenario_combinations(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.dataset.combination_counts())
}

// =============================================================================
// Tests
// =============================================================================
