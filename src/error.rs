//! Error types for the wealth coaching agent

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Failure categories raised by the external responder collaborator.
///
/// Each category maps to a distinct, non-technical user-facing message in
/// the dialogue layer; retry bookkeeping never reaches the message body.
#[derive(Error, Debug)]
pub enum ResponderError {
    #[error("responder timed out")]
    Timeout,

    #[error("responder rate limit reached")]
    RateLimited,

    #[error("responder credentials rejected")]
    InvalidCredential,

    #[error("responder failed: {0}")]
    Failed(String),
}

#[derive(Error, Debug)]
pub enum AgentError {

    // =============================
    // Core Errors
    // =============================

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Incomplete profile: missing {0}")]
    IncompleteProfile(&'static str),

    #[error("Report export error: {0}")]
    ReportError(String),

    #[error("Responder error: {0}")]
    Responder(#[from] ResponderError),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
