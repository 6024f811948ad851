//! API Routes
//!
//! Each handler maps a request onto exactly one record store operation.
//!
//! Not-found lookups answer with a success status and a body-level
//! `{"error": ...}` object; the mobile client branches on payload shape, not
//! on the status code. Malformed bodies are rejected by the Json extractor
//! with a client-error status before any store access.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::error::Result;
use crate::record_store::{
    DetectionEvent, DetectionEventCreate, Screenshot, ScreenshotCreate, ScreenshotMeta,
    SessionLog, SessionLogUpdate, StatusCheck, StatusCheckCreate,
};
use crate::state::AppState;

/// Create API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(super::health_check))
        // Root
        .route("/api/", get(root))
        // Status checks
        .route("/api/status", post(create_status_check))
        .route("/api/status", get(list_status_checks))
        // Detection events
        .route("/api/detections", post(create_detection))
        .route("/api/detections", get(list_detections))
        .route("/api/detections/:id", get(get_detection))
        .route("/api/detections/:id", delete(delete_detection))
        // Session logs
        .route("/api/sessions", post(create_session))
        .route("/api/sessions", get(list_sessions))
        .route("/api/sessions/:id", put(update_session))
        // Screenshots
        .route("/api/screenshots", post(save_screenshot))
        .route("/api/screenshots", get(list_screenshots))
        .route("/api/screenshots/:id", get(get_screenshot))
        .with_state(state)
}

/// Limit query for listing endpoints (flat cap, no paging cursor)
#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<u32>,
}

async fn root() -> impl IntoResponse {
    Json(json!({"message": "GhostTube SLS Camera API"}))
}

// ========================================
// StatusCheck Handlers
// ========================================

async fn create_status_check(
    State(state): State<AppState>,
    Json(req): Json<StatusCheckCreate>,
) -> Result<Json<StatusCheck>> {
    let check = StatusCheck::new(req);
    state.records.insert_status(&check).await?;

    Ok(Json(check))
}

async fn list_status_checks(State(state): State<AppState>) -> Result<Json<Vec<StatusCheck>>> {
    let checks = state.records.list_status().await?;

    Ok(Json(checks))
}

// ========================================
// DetectionEvent Handlers
// ========================================

async fn create_detection(
    State(state): State<AppState>,
    Json(req): Json<DetectionEventCreate>,
) -> Result<Json<DetectionEvent>> {
    let event = DetectionEvent::new(req);
    state.records.insert_detection(&event).await?;

    tracing::info!(
        id = %event.id,
        detection_type = %event.detection_type,
        "Detection event saved"
    );

    Ok(Json(event))
}

async fn list_detections(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<DetectionEvent>>> {
    let limit = query.limit.unwrap_or(50);
    let events = state.records.list_detections(limit).await?;

    Ok(Json(events))
}

async fn get_detection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    match state.records.get_detection(&id).await? {
        Some(event) => Ok(Json(event).into_response()),
        None => Ok(Json(json!({"error": "Detection not found"})).into_response()),
    }
}

async fn delete_detection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    if state.records.delete_detection(&id).await? {
        Ok(Json(json!({"message": "Detection deleted successfully"})).into_response())
    } else {
        Ok(Json(json!({"error": "Detection not found"})).into_response())
    }
}

// ========================================
// SessionLog Handlers
// ========================================

async fn create_session(State(state): State<AppState>) -> Result<Json<SessionLog>> {
    let session = SessionLog::new();
    state.records.insert_session(&session).await?;

    tracing::info!(id = %session.id, "Session started");

    Ok(Json(session))
}

async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<SessionLog>>> {
    let limit = query.limit.unwrap_or(20);
    let sessions = state.records.list_sessions(limit).await?;

    Ok(Json(sessions))
}

async fn update_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<SessionLogUpdate>,
) -> Result<Response> {
    match state.records.update_session(&id, &update).await? {
        Some(session) => Ok(Json(session).into_response()),
        None => Ok(Json(json!({"error": "Session not found"})).into_response()),
    }
}

// ========================================
// Screenshot Handlers
// ========================================

async fn save_screenshot(
    State(state): State<AppState>,
    Json(req): Json<ScreenshotCreate>,
) -> Result<Json<serde_json::Value>> {
    let shot = Screenshot::new(req);
    state.records.insert_screenshot(&shot).await?;

    Ok(Json(json!({"id": shot.id, "message": "Screenshot saved"})))
}

async fn list_screenshots(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ScreenshotMeta>>> {
    let limit = query.limit.unwrap_or(20);
    let shots = state.records.list_screenshots(limit).await?;

    Ok(Json(shots))
}

async fn get_screenshot(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    match state.records.get_screenshot(&id).await? {
        Some(shot) => Ok(Json(shot).into_response()),
        None => Ok(Json(json!({"error": "Screenshot not found"})).into_response()),
    }
}
