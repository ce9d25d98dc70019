//! Wire shapes shared by host and client.
//!
//! Every frame is `{correlationId, payload}`. Request payloads are canonical
//! messages `{type, payload}`; response payloads are
//! `{success: true, data}` or `{success: false, error, ...}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

/// Canonical type of the batch entry point.
pub const BATCH_EXECUTE: &str = "batch:execute";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub correlation_id: String,
    pub payload: T,
}

/// A canonical command as it travels over the wire, before it is parsed into
/// a typed [`crate::registry::Command`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

impl Message {
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// A `batch:execute` message carrying `ops`.
    pub fn batch(ops: Value) -> Self {
        Self::new(BATCH_EXECUTE, serde_json::json!({ "ops": ops }))
    }
}

/// The failing side of a [`Response`]. Batch failures also say which op
/// failed (1-based) and how many ops had completed before it.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub error: String,
    pub failed_op: Option<usize>,
    pub completed_ops: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawResponse", into = "RawResponse")]
pub enum Response {
    Success(Value),
    Failure(Failure),
}

impl Response {
    pub fn ok(data: Value) -> Self {
        Response::Success(data)
    }

    pub fn err(error: impl Into<String>) -> Self {
        Response::Failure(Failure {
            error: error.into(),
            failed_op: None,
            completed_ops: None,
        })
    }

    pub fn from_result(result: Result<Value, AppError>) -> Self {
        match result {
            Ok(data) => Response::ok(data),
            Err(e) => Response::err(e),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            Response::Success(data) => Some(data),
            Response::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Response::Success(_) => None,
            Response::Failure(f) => Some(&f.error),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResponse {
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    failed_op: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_ops: Option<usize>,
}

impl From<Response> for RawResponse {
    fn from(response: Response) -> Self {
        match response {
            Response::Success(data) => RawResponse {
                success: true,
                data: Some(data),
                error: None,
                failed_op: None,
                completed_ops: None,
            },
            Response::Failure(f) => RawResponse {
                success: false,
                data: None,
                error: Some(f.error),
                failed_op: f.failed_op,
                completed_ops: f.completed_ops,
            },
        }
    }
}

impl TryFrom<RawResponse> for Response {
    type Error = String;

    fn try_from(raw: RawResponse) -> Result<Self, Self::Error> {
        if raw.success {
            return Ok(Response::Success(raw.data.unwrap_or(Value::Null)));
        }
        let error = raw
            .error
            .ok_or_else(|| "failure response without an error".to_string())?;
        Ok(Response::Failure(Failure {
            error,
            failed_op: raw.failed_op,
            completed_ops: raw.completed_ops,
        }))
    }
}
