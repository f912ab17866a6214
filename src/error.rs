//! ═══════════════════════════════════════════════════════════════════════════════
//! ERROR — Unified Error Type for Augur
//! ═══════════════════════════════════════════════════════════════════════════════
//! Centralized error handling. No scattered .unwrap() or .expect() calls.
//! ═══════════════════════════════════════════════════════════════════════════════

use std::fmt;

/// The unified error type for the Augur crate
#[derive(Debug)]
pub enum AugurError {
    /// I/O error (learning file, network socket)
    Io(std::io::Error),
    /// JSON serialization/deserialization error
    Json(serde_json::Error),
    /// Upstream feed error
    Feed(FeedError),
    /// Persistence error (non-fatal at call sites; in-memory state is kept)
    Persistence(PersistenceError),
    /// Internal error (should not happen)
    Internal(String),
}

impl std::error::Error for AugurError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AugurError::Io(e) => Some(e),
            AugurError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for AugurError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AugurError::Io(e) => write!(f, "I/O error: {}", e),
            AugurError::Json(e) => write!(f, "JSON error: {}", e),
            AugurError::Feed(e) => write!(f, "Feed error: {}", e),
            AugurError::Persistence(e) => write!(f, "Persistence error: {}", e),
            AugurError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl From<std::io::Error> for AugurError {
    fn from(err: std::io::Error) -> Self {
        AugurError::Io(err)
    }
}

impl From<serde_json::Error> for AugurError {
    fn from(err: serde_json::Error) -> Self {
        AugurError::Json(err)
    }
}

/// Feed-specific errors
#[derive(Debug)]
pub enum FeedError {
    /// Transport failure (timeout, DNS, connection refused)
    Transport(reqwest::Error),
    /// Response body was not the expected JSON array
    BadPayload(String),
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::Transport(e) => write!(f, "transport: {}", e),
            FeedError::BadPayload(msg) => write!(f, "bad payload: {}", msg),
        }
    }
}

impl std::error::Error for FeedError {}

impl From<reqwest::Error> for FeedError {
    fn from(err: reqwest::Error) -> Self {
        FeedError::Transport(err)
    }
}

impl From<FeedError> for AugurError {
    fn from(err: FeedError) -> Self {
        AugurError::Feed(err)
    }
}

/// Persistence-specific errors
#[derive(Debug)]
pub enum PersistenceError {
    /// Could not read the learning snapshot
    Load { path: String, message: String },
    /// Could not write the learning snapshot
    Save { path: String, message: String },
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Load { path, message } => {
                write!(f, "load '{}' failed: {}", path, message)
            }
            PersistenceError::Save { path, message } => {
                write!(f, "save '{}' failed: {}", path, message)
            }
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<PersistenceError> for AugurError {
    fn from(err: PersistenceError) -> Self {
        AugurError::Persistence(err)
    }
}

/// Type alias for Result with AugurError
pub type AugurResult<T> = Result<T, AugurError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AugurError::Persistence(PersistenceError::Load {
            path: "learning.json".to_string(),
            message: "no such file".to_string(),
        });
        assert!(err.to_string().contains("learning.json"));

        let err = AugurError::Internal("bad state".to_string());
        assert!(err.to_string().contains("bad state"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let augur_err: AugurError = io_err.into();
        assert!(matches!(augur_err, AugurError::Io(_)));
    }
}
