// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the scanner

use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for session and capture source operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Main application error type
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Scanning session errors
    Session(SessionError),
    /// Configuration errors
    Config(String),
    /// Filesystem errors
    Io(String),
}

/// Errors that end a scanning session
///
/// None of these are retried automatically. Authorization in particular is
/// reported upward so the presentation layer can ask the user to act.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Camera access was denied or is restricted
    AuthorizationDenied,
    /// No capture device, cannot attach an output, unreadable input, ...
    PipelineConfigurationFailed(String),
    /// `start()` called on a session that is already running
    AlreadyRunning,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Session(e) => write!(f, "Session error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::AuthorizationDenied => write!(f, "Camera authorization denied"),
            SessionError::PipelineConfigurationFailed(msg) => {
                write!(f, "Pipeline configuration failed: {}", msg)
            }
            SessionError::AlreadyRunning => write!(f, "Session is already running"),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for SessionError {}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        AppError::Session(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::PipelineConfigurationFailed(err.to_string())
    }
}
