use super::state::AppState;
use crate::companion::{CompanionQuery, NewCompanion};
use crate::provider::ProviderFactory;
use crate::session::{CallStatus, SessionController, SessionDescriptor, SessionSnapshot, Utterance};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ListCompanionsQuery {
    /// Case-insensitive subject filter
    pub subject: Option<String>,

    /// Case-insensitive filter matching topic or companion name
    pub topic: Option<String>,

    /// Page size (default: 10)
    pub limit: Option<usize>,

    /// 1-based page (default: 1)
    pub page: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct BookmarkRequest {
    pub bookmarked: bool,
}

#[derive(Debug, Deserialize)]
pub struct LaunchSessionRequest {
    pub user_id: String,
    pub user_name: String,
    pub user_image: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LaunchSessionResponse {
    pub companion_id: Uuid,
    pub status: CallStatus,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub status: CallStatus,
    pub speaking: bool,
    pub muted: bool,
    pub mic_interactive: bool,
    pub avatar_live: bool,
    pub avatar_resting: bool,
    pub connecting_pulse: bool,
    pub notice: Option<String>,
    pub transcript: Vec<Utterance>,
}

impl From<SessionSnapshot> for SessionStatusResponse {
    fn from(snapshot: SessionSnapshot) -> Self {
        Self {
            status: snapshot.status,
            speaking: snapshot.speaking,
            muted: snapshot.muted,
            mic_interactive: snapshot.mic_interactive(),
            avatar_live: snapshot.avatar_live(),
            avatar_resting: snapshot.avatar_resting(),
            connecting_pulse: snapshot.connecting_pulse(),
            notice: snapshot.notice,
            transcript: snapshot.transcript,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MuteResponse {
    pub muted: bool,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Maximum entries to return (default: 10)
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Companion Handlers
// ============================================================================

/// POST /companions
/// Create a new companion
pub async fn create_companion(
    State(state): State<AppState>,
    Json(req): Json<NewCompanion>,
) -> impl IntoResponse {
    let companion = state.companions.create(req).await;
    (StatusCode::CREATED, Json(companion))
}

/// GET /companions
/// List companions with optional subject/topic filters
pub async fn list_companions(
    State(state): State<AppState>,
    Query(query): Query<ListCompanionsQuery>,
) -> impl IntoResponse {
    let defaults = CompanionQuery::default();
    let query = CompanionQuery {
        subject: query.subject,
        topic: query.topic,
        limit: query.limit.unwrap_or(defaults.limit),
        page: query.page.unwrap_or(defaults.page),
    };

    Json(state.companions.list(&query).await)
}

/// GET /companions/:companion_id
pub async fn get_companion(
    State(state): State<AppState>,
    Path(companion_id): Path<Uuid>,
) -> impl IntoResponse {
    match state.companions.get(companion_id).await {
        Some(companion) => (StatusCode::OK, Json(companion)).into_response(),
        None => companion_not_found(companion_id),
    }
}

/// GET /companions/users/:user_id
/// Companions created by one user, bookmarked ordering then recency
pub async fn user_companions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    Json(state.companions.for_author(&user_id).await)
}

/// POST /companions/:companion_id/bookmark
pub async fn bookmark_companion(
    State(state): State<AppState>,
    Path(companion_id): Path<Uuid>,
    Json(req): Json<BookmarkRequest>,
) -> impl IntoResponse {
    match state
        .companions
        .set_bookmarked(companion_id, req.bookmarked)
        .await
    {
        Ok(companion) => (StatusCode::OK, Json(companion)).into_response(),
        Err(_) => companion_not_found(companion_id),
    }
}

// ============================================================================
// Session Handlers
// ============================================================================

/// POST /sessions/:companion_id/start
/// Launch a voice-lesson session with a companion
pub async fn launch_session(
    State(state): State<AppState>,
    Path(companion_id): Path<Uuid>,
    Json(req): Json<LaunchSessionRequest>,
) -> impl IntoResponse {
    let Some(companion) = state.companions.get(companion_id).await else {
        return companion_not_found(companion_id);
    };

    // Reject a double-launch while a session is connecting or live
    {
        let sessions = state.sessions.read().await;
        if let Some(existing) = sessions.get(&companion_id) {
            let snapshot = existing.snapshot().await;
            if matches!(snapshot.status, CallStatus::Connecting | CallStatus::Active) {
                return (
                    StatusCode::CONFLICT,
                    Json(ErrorResponse {
                        error: format!("Companion {} is already in a session", companion_id),
                    }),
                )
                    .into_response();
            }
        }
    }

    let provider = match ProviderFactory::create(state.provider_kind) {
        Ok(provider) => provider,
        Err(e) => {
            error!("Failed to create voice backend: {:#}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to create voice backend: {}", e),
                }),
            )
                .into_response();
        }
    };

    let descriptor = SessionDescriptor {
        companion,
        user_id: req.user_id,
        user_name: req.user_name,
        user_image: req.user_image,
    };
    let controller = Arc::new(SessionController::new(
        descriptor,
        provider,
        Arc::clone(&state.history),
    ));

    if let Err(e) = controller.start().await {
        error!("Failed to start session: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response();
    }

    let snapshot = controller.snapshot().await;

    // Replaces any previous (ended) session for this companion
    {
        let mut sessions = state.sessions.write().await;
        sessions.insert(companion_id, controller);
    }

    info!("Session launched for companion {}", companion_id);

    (
        StatusCode::OK,
        Json(LaunchSessionResponse {
            companion_id,
            status: snapshot.status,
            message: format!("Session started for companion {}", companion_id),
        }),
    )
        .into_response()
}

/// POST /sessions/:companion_id/stop
/// End the session with a companion
pub async fn stop_session(
    State(state): State<AppState>,
    Path(companion_id): Path<Uuid>,
) -> impl IntoResponse {
    let Some(controller) = lookup_session(&state, companion_id).await else {
        return session_not_found(companion_id);
    };

    match controller.stop().await {
        Ok(()) => {
            let snapshot = controller.snapshot().await;
            (StatusCode::OK, Json(SessionStatusResponse::from(snapshot))).into_response()
        }
        Err(e) => {
            error!("Failed to stop session: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// POST /sessions/:companion_id/mute
/// Toggle the local microphone
pub async fn toggle_microphone(
    State(state): State<AppState>,
    Path(companion_id): Path<Uuid>,
) -> impl IntoResponse {
    let Some(controller) = lookup_session(&state, companion_id).await else {
        return session_not_found(companion_id);
    };

    let muted = controller.toggle_mute().await;
    (StatusCode::OK, Json(MuteResponse { muted })).into_response()
}

/// GET /sessions/:companion_id
/// Current session state, including derived UI signals and the transcript
pub async fn get_session(
    State(state): State<AppState>,
    Path(companion_id): Path<Uuid>,
) -> impl IntoResponse {
    let Some(controller) = lookup_session(&state, companion_id).await else {
        return session_not_found(companion_id);
    };

    let snapshot = controller.snapshot().await;
    (StatusCode::OK, Json(SessionStatusResponse::from(snapshot))).into_response()
}

// ============================================================================
// History Handlers
// ============================================================================

/// GET /history/recent
pub async fn recent_sessions(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    Json(state.history.recent(query.limit.unwrap_or(10)).await)
}

/// GET /history/users/:user_id
pub async fn user_sessions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> impl IntoResponse {
    Json(
        state
            .history
            .for_user(&user_id, query.limit.unwrap_or(10))
            .await,
    )
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

// ============================================================================
// Helpers
// ============================================================================

async fn lookup_session(state: &AppState, companion_id: Uuid) -> Option<Arc<SessionController>> {
    let sessions = state.sessions.read().await;
    sessions.get(&companion_id).cloned()
}

fn companion_not_found(companion_id: Uuid) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Companion {} not found", companion_id),
        }),
    )
        .into_response()
}

fn session_not_found(companion_id: Uuid) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("No session for companion {}", companion_id),
        }),
    )
        .into_response()
}
