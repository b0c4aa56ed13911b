use crate::api_errors::AppError;
use crate::core_engine::CoreEngine;
use crate::policy_gate::Decision;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub command: String,
}

/// Router for the generate, validate, status and health endpoints
pub fn build_router(engine: Arc<CoreEngine>) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/v1/generate", post(generate))
        .route("/v1/validate", post(validate))
        .route("/v1/status", get(status))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(engine)
}

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| AppError::bad_request(format!("Invalid JSON: {}", e.body_text())))
}

/// The pipeline blocks on the model and on audit file writes, so it runs on
/// the blocking pool. The task completes (audit included) even if the client
/// goes away and this future is dropped.
async fn run_pipeline<T, F>(engine: Arc<CoreEngine>, job: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&CoreEngine) -> T + Send + 'static,
{
    tokio::task::spawn_blocking(move || job(engine.as_ref()))
        .await
        .map_err(|e| AppError::internal(format!("pipeline task failed: {e}")))
}

async fn ping() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn generate(
    State(engine): State<Arc<CoreEngine>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    let req = parse_body(payload)?;
    let generation = run_pipeline(engine, move |engine| engine.generate(&req.prompt)).await??;
    Ok(Json(GenerateResponse {
        response: generation.response,
    }))
}

async fn validate(
    State(engine): State<Arc<CoreEngine>>,
    payload: Result<Json<ValidateRequest>, JsonRejection>,
) -> Result<Json<Decision>, AppError> {
    let req = parse_body(payload)?;
    let decision = run_pipeline(engine, move |engine| engine.validate_command(&req.command)).await?;
    Ok(Json(decision))
}

async fn status(State(engine): State<Arc<CoreEngine>>) -> Json<serde_json::Value> {
    Json(engine.status())
}

async fn not_found() -> AppError {
    AppError::not_found("not found")
}
