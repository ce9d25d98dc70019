use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use tracing::{debug, error};

use crate::batch;
use crate::error::AppError;
use crate::protocol::{Message, Response, BATCH_EXECUTE};
use crate::state::HostState;

use super::{Command, CommandOutput};

/// Execute a Command against the host state.
/// This is the single dispatch point for top-level messages and batch ops.
pub async fn execute(state: &mut HostState, cmd: Command) -> Result<CommandOutput, AppError> {
    let kind = cmd.kind();
    let result = cmd.dispatch(state).await;
    match &result {
        Ok(out) => debug!(event = "command_executed", kind, message = %out.message),
        Err(e) => debug!(event = "command_failed", kind, error = %e),
    }
    result
}

/// Handle one top-level message, either a batch or a single canonical
/// command. Every outcome, including a panicking handler, becomes a Response.
pub async fn handle_message(state: &mut HostState, message: Message) -> Response {
    let kind = message.kind.clone();
    match AssertUnwindSafe(route(state, message)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            let message = panic_message(&*panic);
            error!(event = "handler_panicked", kind = %kind, message = %message);
            Response::err(AppError::Internal { message })
        }
    }
}

async fn route(state: &mut HostState, message: Message) -> Response {
    if message.kind == BATCH_EXECUTE {
        return batch::execute_batch(state, &message.payload).await;
    }
    let result = match Command::parse(&message.kind, message.payload) {
        Ok(cmd) => execute(state, cmd).await.and_then(CommandOutput::into_value),
        Err(e) => Err(e),
    };
    Response::from_result(result)
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use serde_json::{json, Value};

    use super::*;
    use crate::services::fake::FakeServices;

    fn host() -> HostState {
        HostState::new(Arc::new(FakeServices::default()), 50)
    }

    #[tokio::test]
    async fn single_command_round_trip() {
        let mut state = host();
        let response = handle_message(
            &mut state,
            Message::new("shape:rectangle", json!({ "x": 1, "y": 2, "width": 30 })),
        )
        .await;
        let id = response.data().unwrap()["elementId"].as_str().unwrap().to_string();
        assert!(state.store.document().element(&id).is_some());
    }

    #[tokio::test]
    async fn unknown_command_is_a_failure_response() {
        let mut state = host();
        let response = handle_message(&mut state, Message::new("canvas:explode", json!({}))).await;
        assert_eq!(response.error(), Some("Unknown command: canvas:explode"));
    }

    #[tokio::test]
    async fn execution_errors_become_failure_responses() {
        let mut state = host();
        let response = handle_message(
            &mut state,
            Message::new("element:delete", json!({ "elementId": "ghost" })),
        )
        .await;
        assert_eq!(response.error(), Some("element \"ghost\" not found"));
    }

    #[tokio::test]
    async fn get_state_reports_history() {
        let mut state = host();
        handle_message(&mut state, Message::new("shape:ellipse", Value::Null)).await;
        let response = handle_message(&mut state, Message::new("canvas:get-state", Value::Null)).await;
        let data = response.data().unwrap();
        assert_eq!(data["history"], json!({ "canUndo": true, "canRedo": false }));
        assert_eq!(data["project"]["layers"][0]["elements"][0]["type"], "ellipse");
    }

    #[test]
    fn panic_payloads_are_readable() {
        assert_eq!(panic_message(&"boom"), "boom");
        assert_eq!(panic_message(&String::from("bang")), "bang");
        assert_eq!(panic_message(&42_u8), "handler panicked");
    }

    #[tokio::test]
    async fn panicking_handler_becomes_internal_failure() {
        let services = FakeServices {
            panic_capture: true,
            ..Default::default()
        };
        let mut state = HostState::new(Arc::new(services), 50);
        let response = handle_message(&mut state, Message::new("canvas:screenshot", Value::Null)).await;
        assert_eq!(response.error(), Some("Internal error: renderer aborted"));

        let after = handle_message(&mut state, Message::new("shape:ellipse", Value::Null)).await;
        assert!(after.is_success());
    }
}
