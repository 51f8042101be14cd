//! Error types for SharePoint Knife

use thiserror::Error;

/// Result type alias
pub type SpkResult<T> = Result<T, SpkError>;

/// Boxed underlying cause of a transport failure
pub type TransportCause = Box<dyn std::error::Error + Send + Sync>;

/// Main error type
#[derive(Error, Debug)]
pub enum SpkError {
    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Expected file, found directory: {0}")]
    NotAFile(String),

    #[error("Expected directory, found file: {0}")]
    NotADirectory(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Remote error {status} ({code}): {message}")]
    Remote {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Transport failure{}: {source}", status_suffix(.status))]
    Transport {
        status: Option<u16>,
        source: TransportCause,
    },

    #[error("Cannot create directory {segment}: {message}")]
    DirectoryCreation { segment: String, message: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl SpkError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SpkError::NotFound(_))
    }

    /// File operation hit a directory, or the other way round
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, SpkError::NotAFile(_) | SpkError::NotADirectory(_))
    }

    /// HTTP status carried by the error, when one is known
    pub fn status(&self) -> Option<u16> {
        match self {
            SpkError::Remote { status, .. } => Some(*status),
            SpkError::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Remote error code (e.g. `nameAlreadyExists`)
    pub fn remote_code(&self) -> Option<&str> {
        match self {
            SpkError::Remote { code, .. } => Some(code),
            _ => None,
        }
    }
}
