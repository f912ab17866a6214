//! ═══════════════════════════════════════════════════════════════════════════════
//! SERVER — HTTP Query Surface
//! ═══════════════════════════════════════════════════════════════════════════════
//!
//! Provides HTTP server exposing:
//! - GET /health              — Health check
//! - GET /api/v1/prediction   — Current forecast (or a waiting placeholder)
//! - GET /api/v1/history      — The rolling round history
//! - GET /api/v1/predictions  — The prediction ledger, newest first
//! - GET /api/v1/stats        — Accuracy figures, overall and per detector
//! - GET /api/v1/learning     — Adaptive confidence table
//! - GET /api/v1/break        — Latest break-risk assessment
//!
//! The polling loop owns the single writer; handlers only take read locks, so
//! every response is a consistent snapshot between cycles.
//! ═══════════════════════════════════════════════════════════════════════════════

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::anomaly::BreakAssessment;
use crate::engine::{Engine, StatsReport};
use crate::event::Event;
use crate::ledger::PredictionEntry;

// ═══════════════════════════════════════════════════════════════════════════════
// SERVER STATE
// ═══════════════════════════════════════════════════════════════════════════════

/// Shared server state. The engine write lock belongs to the polling loop.
pub struct ServerState {
    pub engine: RwLock<Engine>,
    pub start_time: Instant,
}

impl ServerState {
    pub fn new(engine: Engine) -> Self {
        Self {
            engine: RwLock::new(engine),
            start_time: Instant::now(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// API TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
}

/// Current forecast, or a waiting placeholder before the first one is issued
#[derive(Serialize)]
#[serde(untagged)]
pub enum PredictionResponse {
    Ready(PredictionEntry),
    Waiting { status: String, message: String },
}

#[derive(Serialize)]
pub struct LearningEntry {
    pub detector: String,
    pub total: u32,
    pub correct: u32,
    pub accuracy: String,
    pub confidence_adjustment: i32,
}

#[derive(Serialize)]
pub struct LearningResponse {
    pub learning_enabled: bool,
    pub detectors: Vec<LearningEntry>,
    pub total_learning_sessions: u32,
}

#[derive(Serialize)]
pub struct BreakResponse {
    #[serde(flatten)]
    pub assessment: BreakAssessment,
    pub consecutive_wrong: u32,
}

// ═══════════════════════════════════════════════════════════════════════════════
// HANDLERS
// ═══════════════════════════════════════════════════════════════════════════════

/// GET /health - Liveness/readiness probe
async fn health_handler(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// GET /api/v1/prediction - The latest forecast, resolved or pending
async fn prediction_handler(State(state): State<Arc<ServerState>>) -> Json<PredictionResponse> {
    let engine = state.engine.read().await;
    match engine.current_prediction() {
        Some(entry) => Json(PredictionResponse::Ready(entry.clone())),
        None => Json(PredictionResponse::Waiting {
            status: "waiting".to_string(),
            message: "No prediction issued yet - collecting history".to_string(),
        }),
    }
}

/// GET /api/v1/history - Rolling window of observed rounds, newest first
async fn history_handler(State(state): State<Arc<ServerState>>) -> Json<Vec<Event>> {
    let engine = state.engine.read().await;
    Json(engine.history().events().to_vec())
}

/// GET /api/v1/predictions - The full ledger, newest first
async fn predictions_handler(State(state): State<Arc<ServerState>>) -> Json<Vec<PredictionEntry>> {
    let engine = state.engine.read().await;
    Json(engine.ledger().entries().cloned().collect())
}

/// GET /api/v1/stats - Aggregate accuracy figures
async fn stats_handler(State(state): State<Arc<ServerState>>) -> Json<StatsReport> {
    let engine = state.engine.read().await;
    Json(engine.stats())
}

/// GET /api/v1/learning - Adaptive confidence table, catalogue order
async fn learning_handler(State(state): State<Arc<ServerState>>) -> Json<LearningResponse> {
    let engine = state.engine.read().await;
    let learning = engine.learning();

    let mut detectors = Vec::new();
    for id in crate::detectors::DetectorId::ALL {
        let Some(record) = learning.record(id) else {
            continue;
        };
        let accuracy = if record.attempts > 0 {
            format!("{:.1}%", record.lifetime_accuracy() * 100.0)
        } else {
            "0%".to_string()
        };
        detectors.push(LearningEntry {
            detector: id.as_str().to_string(),
            total: record.attempts,
            correct: record.correct,
            accuracy,
            confidence_adjustment: record.adjustment,
        });
    }

    Json(LearningResponse {
        learning_enabled: true,
        detectors,
        total_learning_sessions: learning.total_attempts(),
    })
}

/// GET /api/v1/break - Latest break-risk assessment
async fn break_handler(State(state): State<Arc<ServerState>>) -> Json<BreakResponse> {
    let engine = state.engine.read().await;
    Json(BreakResponse {
        assessment: engine.break_assessment().clone(),
        consecutive_wrong: engine.anomaly_state().consecutive_wrong,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// SERVER
// ═══════════════════════════════════════════════════════════════════════════════

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/prediction", get(prediction_handler))
        .route("/api/v1/history", get(history_handler))
        .route("/api/v1/predictions", get(predictions_handler))
        .route("/api/v1/stats", get(stats_handler))
        .route("/api/v1/learning", get(learning_handler))
        .route("/api/v1/break", get(break_handler))
        .with_state(state)
}

/// Start the HTTP server over shared state
pub async fn run_server(
    state: Arc<ServerState>,
    bind_addr: SocketAddr,
) -> crate::error::AugurResult<()> {
    let app = router(state);

    println!("Starting augur server on {}", bind_addr);
    println!("  Health:     http://{}/health", bind_addr);
    println!("  Prediction: http://{}/api/v1/prediction", bind_addr);
    println!("  Stats:      http://{}/api/v1/stats", bind_addr);
    println!("  Break:      http://{}/api/v1/break", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════
