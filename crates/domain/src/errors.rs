//! Error types used throughout the pipeline

use std::time::Duration;

use thiserror::Error;

/// Main error type for the SUNAT pipeline
///
/// Every variant is a *local* failure. A remote `Error` status (`99`) is a
/// business outcome and travels as [`crate::Outcome::Rejected`] instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SunatError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Authentication timed out after {0:?}")]
    AuthTimeout(Duration),

    #[error("Authentication rejected by SUNAT: {status} | {body}")]
    AuthRejected { status: u16, body: String },

    #[error("Submission timed out after {0:?}")]
    SubmissionTimeout(Duration),

    #[error("Submission rejected by SUNAT: {status} | {body}")]
    SubmissionRejected { status: u16, body: String },

    #[error("Status query for ticket {ticket} failed: {reason}")]
    StatusQuery { ticket: String, reason: String },

    #[error("Ticket unresolved after {elapsed:?} ({attempts} attempts, last code {})", .last_code.as_deref().unwrap_or("none"))]
    Timeout { elapsed: Duration, attempts: u32, last_code: Option<String> },

    #[error("Polling cancelled before SUNAT resolved the ticket")]
    Unreachable,

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("Archive contains no entries")]
    EmptyArchive,

    #[error("Malformed response while {context}: {body}")]
    MalformedResponse { context: String, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl SunatError {
    /// Stable label suitable for structured log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::AuthTimeout(_) => "auth_timeout",
            Self::AuthRejected { .. } => "auth_rejected",
            Self::SubmissionTimeout(_) => "submission_timeout",
            Self::SubmissionRejected { .. } => "submission_rejected",
            Self::StatusQuery { .. } => "status_query",
            Self::Timeout { .. } => "timeout",
            Self::Unreachable => "unreachable",
            Self::Decode(_) => "decode",
            Self::Archive(_) => "archive",
            Self::EmptyArchive => "empty_archive",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::Network(_) => "network",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
        }
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, SunatError>;
