//! HTTP API.
//!
//! Routes:
//! - `POST /api/sessions` - open a conversation
//! - `GET /api/sessions/:id` - inspect a conversation
//! - `DELETE /api/sessions/:id` - close a conversation
//! - `POST /api/chat/:session_id` - send one user turn
//! - `GET /health`, `GET /ready` - liveness and readiness

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use travel_agent_config::ServerConfig;

use crate::session::SessionManager;
use crate::ServerError;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
}

#[derive(Serialize)]
struct SessionCreated {
    session_id: String,
}

#[derive(Serialize)]
struct SessionInfo {
    session_id: String,
    turn_count: u32,
    destination: Option<String>,
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Serialize)]
struct ChatResponse {
    response: String,
    turn_count: u32,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Capacity => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// Build the application router
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/api/sessions", post(create_session))
        .route(
            "/api/sessions/:id",
            get(get_session).delete(delete_session),
        )
        .route("/api/chat/:session_id", post(chat))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.timeout_seconds,
        )))
        .with_state(state);

    if config.cors_enabled {
        let origin = if config.cors_origins.is_empty() {
            AllowOrigin::any()
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            AllowOrigin::list(origins)
        };
        let cors = CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any);
        router = router.layer(cors);
    }

    router
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn ready(State(state): State<AppState>) -> Response {
    if state.sessions.llm_available().await {
        Json(serde_json::json!({ "status": "ready" })).into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "status": "llm unavailable" })),
        )
            .into_response()
    }
}

async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionCreated>), ServerError> {
    let session = state.sessions.create()?;
    Ok((
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id: session.id.clone(),
        }),
    ))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionInfo>, ServerError> {
    let session = state
        .sessions
        .get(&id)
        .ok_or_else(|| ServerError::SessionNotFound(id.clone()))?;

    let snapshot = session.agent.state_snapshot();
    Ok(Json(SessionInfo {
        session_id: session.id.clone(),
        turn_count: snapshot.turn_count,
        destination: snapshot.destination,
    }))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    if state.sessions.remove(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ServerError::SessionNotFound(id))
    }
}

async fn chat(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ServerError> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ServerError::InvalidRequest(
            "message cannot be empty".to_string(),
        ));
    }

    let session = state
        .sessions
        .get(&session_id)
        .ok_or_else(|| ServerError::SessionNotFound(session_id.clone()))?;
    session.touch();

    let response = session.agent.process(message).await;
    Ok(Json(ChatResponse {
        response,
        turn_count: session.agent.turn_count(),
    }))
}
