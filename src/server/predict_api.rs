//! Prediction HTTP API.
//!
//! Routes:
//! - POST /predict
//! - GET /v1/model
//! - GET /health
//! - GET /metrics

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::inference::classifier::Classifier;
use crate::inference::ranking::{predict_top_k, RankedClass};
use crate::metrics::{Outcome, ServerMetrics};
use crate::server::error::ApiError;
use crate::server::request::parse_features;

/// Application state shared across handlers.
pub struct AppState {
    pub model: Arc<dyn Classifier>,
    pub config: Arc<Config>,
    pub metrics: ServerMetrics,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(model: Arc<dyn Classifier>, config: Arc<Config>) -> prometheus::Result<Self> {
        Ok(Self {
            model,
            config,
            metrics: ServerMetrics::new()?,
            start_time: Instant::now(),
        })
    }
}

/// Build the axum router with all API routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    let server = &state.config.server;
    let body_limit = DefaultBodyLimit::max(server.max_body_bytes);
    let permissive_cors = server.permissive_cors;

    let router = Router::new()
        .route("/predict", post(predict))
        .route("/v1/model", get(model_info))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(body_limit)
        .with_state(state);

    let router = if permissive_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    };
    router.layer(TraceLayer::new_for_http())
}

// ─── Response Types ────────────────────────────────────────────────────────

/// Ranked prediction: `{"1": "('rice', 0.91)", "2": ..., "3": ...}`.
///
/// Keys are written in rank order, so "10" follows "9".
#[derive(Debug)]
pub struct PredictResponse(pub Vec<(String, String)>);

impl Serialize for PredictResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (rank, entry) in &self.0 {
            map.serialize_entry(rank, entry)?;
        }
        map.end()
    }
}

impl PredictResponse {
    pub fn from_ranking(ranking: &[RankedClass]) -> Self {
        Self(
            ranking
                .iter()
                .enumerate()
                .map(|(i, entry)| ((i + 1).to_string(), entry.to_string()))
                .collect(),
        )
    }
}

/// Loaded model description.
#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub model_type: String,
    pub classes: Vec<String>,
    pub feature_names: Option<Vec<String>>,
    pub n_features: usize,
    pub top_k: usize,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub model_type: String,
    pub n_classes: usize,
}

// ─── Route Handlers ────────────────────────────────────────────────────────

async fn predict(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<PredictResponse>, ApiError> {
    let request_id = Uuid::new_v4().to_string();
    let started = Instant::now();

    let result = score(&state, &body);
    let outcome = match &result {
        Ok(_) => Outcome::Ok,
        Err(ApiError::Scoring(_)) => Outcome::ScoringError,
        Err(_) => Outcome::ClientError,
    };
    state.metrics.observe(outcome, started.elapsed());

    match result {
        Ok(ranking) => {
            info!(
                request_id = request_id,
                ranking = ?ranking,
                elapsed_us = started.elapsed().as_micros() as u64,
                "Prediction scored"
            );
            Ok(Json(PredictResponse::from_ranking(&ranking)))
        }
        Err(e) => {
            if e.status().is_server_error() {
                warn!(request_id = request_id, error = %e, "Prediction failed");
            } else {
                debug!(request_id = request_id, error = %e, "Rejected prediction request");
            }
            Err(e)
        }
    }
}

/// Validate the body and score it against the shared model.
fn score(state: &AppState, body: &[u8]) -> Result<Vec<RankedClass>, ApiError> {
    let model_cfg = &state.config.model;
    let features = parse_features(body, model_cfg.n_features)?;
    let ranking = predict_top_k(state.model.as_ref(), &features, model_cfg.top_k)?;
    Ok(ranking)
}

async fn model_info(State(state): State<Arc<AppState>>) -> Json<ModelInfo> {
    let model = &state.model;
    Json(ModelInfo {
        model_type: model.model_type().to_string(),
        classes: model.classes().to_vec(),
        feature_names: model.feature_names().map(<[String]>::to_vec),
        n_features: model.n_features(),
        top_k: state.config.model.top_k,
    })
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        model_type: state.model.model_type().to_string(),
        n_classes: state.model.classes().len(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.render() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
