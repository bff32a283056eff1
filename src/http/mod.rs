//! HTTP API server for the companion-tutoring frontend
//!
//! This module provides a REST API over the catalog, sessions, and history:
//! - POST /companions - Create a companion
//! - GET  /companions - List companions (subject/topic filters, pagination)
//! - GET  /companions/:id - Fetch one companion
//! - GET  /companions/users/:user_id - One user's companions
//! - POST /companions/:id/bookmark - Toggle a bookmark
//! - POST /sessions/:id/start - Launch a voice-lesson session
//! - POST /sessions/:id/stop - End a session
//! - POST /sessions/:id/mute - Toggle the microphone
//! - GET  /sessions/:id - Session state + transcript
//! - GET  /history/recent - Recent sessions across users
//! - GET  /history/users/:user_id - One user's sessions
//! - GET  /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
