//! HTTP transport for sessions.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
};
use log::{debug, error, trace};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use super::error::FrontendError;
use super::session::SessionManager;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSessionRequest {
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSessionResponse {
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl From<FrontendError> for ErrorResponse {
    fn from(error: FrontendError) -> Self {
        Self {
            error: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub open_sessions: usize,
}

pub fn error_to_status_code(error_code: &str) -> StatusCode {
    match error_code {
        "invalid_credentials" => StatusCode::UNAUTHORIZED,
        "session_not_found" => StatusCode::NOT_FOUND,
        "protocol_error" => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Route prefix for a configured HTTP path; an empty path mounts at the root.
pub fn route_base(http_path: &str) -> String {
    let trimmed = http_path.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

type AppState = Arc<SessionManager>;

pub fn create_router(http_path: &str, sessions: Arc<SessionManager>) -> Router {
    let base = route_base(http_path);
    Router::new()
        .route(&format!("{base}/sessions"), post(open_session))
        .route(&format!("{base}/sessions/{{session_id}}"), delete(close_session))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(sessions)
}

pub async fn serve(listener: TcpListener, router: Router, mut shutdown: watch::Receiver<bool>) {
    let result = axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.changed().await;
        })
        .await;
    match result {
        Ok(()) => debug!("HTTP transport stopped"),
        Err(e) => error!("HTTP transport terminated: {e}"),
    }
}

fn error_reply(error: FrontendError) -> (StatusCode, Json<ErrorResponse>) {
    let response = ErrorResponse::from(error);
    (error_to_status_code(&response.error), Json(response))
}

#[tracing::instrument(level = "debug", skip(sessions, request), fields(user = %request.user))]
async fn open_session(
    State(sessions): State<AppState>,
    Json(request): Json<OpenSessionRequest>,
) -> Result<(StatusCode, Json<OpenSessionResponse>), (StatusCode, Json<ErrorResponse>)> {
    match sessions.open(&request.user, &request.password) {
        Ok(session_id) => {
            trace!("POST /sessions - opened {session_id}");
            Ok((StatusCode::CREATED, Json(OpenSessionResponse { session_id })))
        }
        Err(e) => {
            debug!("POST /sessions failed: {e}");
            Err(error_reply(e))
        }
    }
}

#[tracing::instrument(level = "debug", skip(sessions))]
async fn close_session(
    State(sessions): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    match sessions.close(&session_id) {
        Ok(_) => {
            trace!("DELETE /sessions/{session_id} - closed");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(e) => {
            debug!("DELETE /sessions/{session_id} failed: {e}");
            Err(error_reply(e))
        }
    }
}

async fn health(State(sessions): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        open_sessions: sessions.len(),
    })
}
