//! REST API surface for the wealth coaching agent
//!
//! Exposes the dialogue manager over HTTP. The session map here is the
//! "caller" that owns ConversationState between turns; it lives in
//! memory only and dies with the process.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::dialogue::DialogueManager;
use crate::models::ConversationState;
use crate::report::ReportExporter;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ReportRequest {
    pub session_id: String,
    pub display_name: String,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub manager: Arc<DialogueManager>,
    pub exporter: Arc<dyn ReportExporter>,
    sessions: Arc<RwLock<HashMap<uuid::Uuid, ConversationState>>>,
}

impl ApiState {
    pub fn new(manager: Arc<DialogueManager>, exporter: Arc<dyn ReportExporter>) -> Self {
        Self {
            manager,
            exporter,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

/// =============================
/// Helpers — Session Ids
/// =============================

fn stable_uuid_from_string(input: &str) -> uuid::Uuid {
    use sha2::{Digest, Sha256};

    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    uuid::Uuid::from_bytes(bytes)
}

fn resolve_session_id(value: Option<&str>) -> uuid::Uuid {
    match value {
        Some(v) if !v.trim().is_empty() => {
            uuid::Uuid::parse_str(v).unwrap_or_else(|_| stable_uuid_from_string(v))
        }
        _ => uuid::Uuid::new_v4(),
    }
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Chat Endpoint
/// =============================

async fn chat_handler(
    State(state): State<ApiState>,
    Json(req): Json<ChatRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let session_id = resolve_session_id(req.session_id.as_deref());

    let conversation = {
        let sessions = state.sessions.read().await;
        sessions
            .get(&session_id)
            .cloned()
            .unwrap_or_else(ConversationState::new)
    };

    info!(%session_id, stage = %conversation.stage, "Received chat turn");

    match state.manager.handle_turn(conversation, &req.message).await {
        Ok((reply, updated)) => {
            let stage = updated.stage;
            {
                let mut sessions = state.sessions.write().await;
                sessions.insert(session_id, updated);
            }

            (
                StatusCode::OK,
                Json(ApiResponse::success(serde_json::json!({
                    "session_id": session_id,
                    "reply": reply.text,
                    "source": reply.source,
                    "stage": stage,
                }))),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Turn processing failed: {}", e))),
        ),
    }
}

/// =============================
/// Report Endpoint
/// =============================

async fn report_handler(
    State(state): State<ApiState>,
    Json(req): Json<ReportRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let session_id = resolve_session_id(Some(&req.session_id));

    let conversation = {
        let sessions = state.sessions.read().await;
        sessions.get(&session_id).cloned()
    };

    let Some(conversation) = conversation else {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Unknown session".into())),
        );
    };

    let Some(projection) = conversation.projection.as_ref() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(
                "Projection not computed yet for this session".into(),
            )),
        );
    };

    let profile = match conversation.profile.freeze() {
        Ok(profile) => profile,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Profile invalid: {}", e))),
            )
        }
    };

    match state
        .exporter
        .export(&profile, projection, &req.display_name)
        .await
    {
        Ok(location) => (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({
                "session_id": session_id,
                "location": location.reference,
            }))),
        ),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(ApiResponse::error(format!("Report export failed: {}", e))),
        ),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(manager: Arc<DialogueManager>, exporter: Arc<dyn ReportExporter>) -> Router {
    let state = ApiState::new(manager, exporter);

    Router::new()
        .route("/health", axum::routing::get(health))
        .route("/api/chat", post(chat_handler))
        .route("/api/report", post(report_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    manager: Arc<DialogueManager>,
    exporter: Arc<dyn ReportExporter>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(manager, exporter);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
