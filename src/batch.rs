//! All-or-nothing execution of a list of Ops.
//!
//! Every Op is validated before anything runs. The store is then
//! checkpointed, the Ops run strictly in order, and the first failure puts
//! the checkpoint back, including the history entries the batch had pushed.

use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::AppError;
use crate::protocol::{Failure, Response};
use crate::registry::execute::{execute, panic_message};
use crate::registry::normalize::normalize;
use crate::registry::validation::validate_ops;
use crate::registry::{Command, CommandOutput};
use crate::state::HostState;

/// Run one already-validated Op.
async fn run_op(state: &mut HostState, op: &Value) -> Result<Value, AppError> {
    let fields = op
        .as_object()
        .ok_or_else(|| AppError::validation("must be an object"))?;
    let canonical = normalize(fields);
    let cmd = Command::parse(&canonical.kind, Value::Object(canonical.payload))?;
    execute(state, cmd).await.and_then(CommandOutput::into_value)
}

/// Execute the `ops` list of a `batch:execute` payload.
pub async fn execute_batch(state: &mut HostState, payload: &Value) -> Response {
    let ops = match validate_ops(payload.get("ops").unwrap_or(&Value::Null)) {
        Ok(ops) => ops,
        Err(e) => {
            warn!(event = "batch_rejected", error = %e);
            return Response::err(e);
        }
    };

    let checkpoint = state.store.checkpoint();
    let mut results = Vec::with_capacity(ops.len());
    for (i, op) in ops.iter().enumerate() {
        let n = i + 1;
        let outcome = match AssertUnwindSafe(run_op(state, op)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => Err(AppError::Internal {
                message: panic_message(&*panic),
            }),
        };
        match outcome {
            Ok(data) => results.push(json!({ "success": true, "data": data })),
            Err(e) => {
                state.store.restore(checkpoint);
                warn!(event = "batch_rolled_back", failed_op = n, completed_ops = i, error = %e);
                return Response::Failure(Failure {
                    error: format!("op {n}: {e}"),
                    failed_op: Some(n),
                    completed_ops: Some(i),
                });
            }
        }
    }

    info!(event = "batch_committed", ops = results.len());
    Response::ok(Value::Array(results))
}
