use serde::Serialize;
use thiserror::Error;

/// Structured error type for the relay. Every failure (transport, validation,
/// execution, internal) is one of these, so it can be returned as a value
/// all the way up to the boundary that produced the original call.
#[derive(Debug, Clone, Serialize, Error, PartialEq)]
#[serde(tag = "code", content = "detail")]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
pub enum AppError {
    // ── Transport ────────────────────────────────────────────────
    #[error("Not connected to host")]
    NotConnected,
    #[error("Connection timeout - is the host running at {endpoint}?")]
    ConnectTimeout { endpoint: String },
    #[error("Command timeout after {timeout_ms}ms")]
    CommandTimeout { timeout_ms: u64 },
    #[error("Disconnected from host")]
    Disconnected,
    #[error("I/O error: {message}")]
    Io { message: String },
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    // ── Validation ───────────────────────────────────────────────
    #[error("{message}")]
    Validation { message: String },

    // ── Execution ────────────────────────────────────────────────
    #[error("{what} not found")]
    NotFound { what: String },
    #[error("No unlocked layer available")]
    NoUnlockedLayer,
    #[error("{message}")]
    InvalidValue { message: String },
    #[error("{service} failed: {message}")]
    Collaborator { service: String, message: String },
    #[error("Persistence error: {message}")]
    Persistence { message: String },

    // ── Internal ─────────────────────────────────────────────────
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation {
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::InvalidValue {
            message: message.into(),
        }
    }

    pub fn element_not_found(id: &str) -> Self {
        AppError::NotFound {
            what: format!("element \"{id}\""),
        }
    }

    pub fn layer_not_found(id: &str) -> Self {
        AppError::NotFound {
            what: format!("layer \"{id}\""),
        }
    }

    pub fn collaborator(service: &str, message: impl Into<String>) -> Self {
        AppError::Collaborator {
            service: service.to_string(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io {
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Protocol {
            message: e.to_string(),
        }
    }
}

impl From<crate::project::ProjectError> for AppError {
    fn from(e: crate::project::ProjectError) -> Self {
        AppError::Persistence {
            message: e.to_string(),
        }
    }
}

/// Allow converting AppError to String for the wire `error` field.
impl From<AppError> for String {
    fn from(e: AppError) -> String {
        e.to_string()
    }
}
