//! HTTP server for the travel-planning assistant.

pub mod http;
pub mod session;

pub use http::{create_router, AppState};
pub use session::{Session, SessionManager};

use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session capacity reached")]
    Capacity,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}
