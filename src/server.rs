//! Host side of the channel.
//!
//! One actor task owns the [`HostState`]. Connection tasks forward each
//! request to it over a queue and wait for the reply, so commands run one at
//! a time in arrival order and a batch can never interleave with anything.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::net::UnixStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::protocol::{Envelope, Message, Response};
use crate::registry::execute::handle_message;
use crate::state::HostState;
use crate::transport::{Frame, FrameReader, FrameWriter, Listener};

const QUEUE_DEPTH: usize = 64;

type Job = (Message, oneshot::Sender<Response>);

/// Handle for submitting messages to the dispatch actor.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    jobs: mpsc::Sender<Job>,
}

impl Dispatcher {
    /// Start the actor. It runs until every `Dispatcher` clone is dropped,
    /// then hands the state back through the join handle.
    pub fn spawn(mut state: HostState) -> (Self, JoinHandle<HostState>) {
        let (jobs, mut queue) = mpsc::channel::<Job>(QUEUE_DEPTH);
        let actor = tokio::spawn(async move {
            while let Some((message, reply)) = queue.recv().await {
                let response = handle_message(&mut state, message).await;
                if reply.send(response).is_err() {
                    debug!(event = "reply_dropped");
                }
            }
            state
        });
        (Self { jobs }, actor)
    }

    pub async fn dispatch(&self, message: Message) -> Response {
        let (reply, response) = oneshot::channel();
        if self.jobs.send((message, reply)).await.is_err() {
            return Response::err(AppError::Internal {
                message: "dispatcher stopped".into(),
            });
        }
        response.await.unwrap_or_else(|_| {
            Response::err(AppError::Internal {
                message: "dispatcher dropped the request".into(),
            })
        })
    }
}

/// Accept clients on `listener` until `shutdown` turns true. Only one client
/// is served at a time; extra connections are closed straight away.
pub async fn serve(listener: Listener, state: HostState, mut shutdown: watch::Receiver<bool>) {
    let (dispatcher, _actor) = Dispatcher::spawn(state);
    let busy = Arc::new(AtomicBool::new(false));

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let stream = match accepted {
                    Ok(stream) => stream,
                    Err(e) => {
                        warn!(event = "accept_failed", error = %e);
                        continue;
                    }
                };
                if busy.swap(true, Ordering::SeqCst) {
                    warn!(event = "connection_rejected", reason = "a client is already connected");
                    drop(stream);
                    continue;
                }
                let dispatcher = dispatcher.clone();
                let busy = Arc::clone(&busy);
                tokio::spawn(async move {
                    info!(event = "client_attached");
                    serve_connection(stream, &dispatcher).await;
                    busy.store(false, Ordering::SeqCst);
                    info!(event = "client_detached");
                });
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }
    info!(event = "host_stopped", path = %listener.path().display());
}

async fn serve_connection(stream: UnixStream, dispatcher: &Dispatcher) {
    let (read_half, write_half) = stream.into_split();
    let mut frames = FrameReader::new(read_half);
    let mut writer = FrameWriter::new(write_half);

    loop {
        let (correlation_id, response) = match frames.next_frame().await {
            Ok(Some(Frame::Text(line))) => match serde_json::from_str::<Envelope<Message>>(line) {
                Ok(request) => {
                    let response = dispatcher.dispatch(request.payload).await;
                    (request.correlation_id, response)
                }
                Err(e) => match correlation_id_of(line) {
                    Some(id) => (id, Response::err(AppError::from(e))),
                    None => {
                        warn!(event = "frame_malformed", error = %e);
                        continue;
                    }
                },
            },
            Ok(Some(Frame::Garbled(lossy))) => match correlation_id_of(&lossy) {
                Some(id) => {
                    let error = AppError::Protocol {
                        message: "frame is not valid UTF-8".into(),
                    };
                    (id, Response::err(error))
                }
                None => {
                    warn!(event = "frame_malformed", error = "invalid UTF-8");
                    continue;
                }
            },
            Ok(None) => break,
            Err(e) => {
                warn!(event = "client_read_failed", error = %e);
                break;
            }
        };

        let frame = Envelope {
            correlation_id,
            payload: response,
        };
        if let Err(e) = writer.send(&frame).await {
            warn!(event = "client_write_failed", error = %e);
            break;
        }
    }
}

/// Recover the correlation id of a frame whose payload did not parse, so the
/// failure can still be answered.
fn correlation_id_of(line: &str) -> Option<String> {
    let value: Value = serde_json::from_str(line).ok()?;
    value.get("correlationId")?.as_str().map(str::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use serde_json::json;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    use super::*;
    use crate::client::HostClient;
    use crate::protocol::Failure;
    use crate::services::fake::FakeServices;

    struct RunningHost {
        path: PathBuf,
        stop: watch::Sender<bool>,
        task: JoinHandle<()>,
        _dir: tempfile::TempDir,
    }

    fn start_host() -> RunningHost {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.sock");
        let listener = Listener::bind(&path).unwrap();
        let state = HostState::new(Arc::new(FakeServices::default()), 50);
        let (stop, shutdown) = watch::channel(false);
        let task = tokio::spawn(serve(listener, state, shutdown));
        RunningHost {
            path,
            stop,
            task,
            _dir: dir,
        }
    }

    async fn connect(host: &RunningHost) -> HostClient {
        HostClient::connect_at(&host.path, Duration::from_secs(2)).await.unwrap()
    }

    async fn element_count(client: &HostClient) -> usize {
        let response = client
            .send(Message::new("canvas:get-state", json!({})))
            .await
            .unwrap();
        response.data().unwrap()["project"]["layers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|layer| layer["elements"].as_array().unwrap().len())
            .sum()
    }

    #[tokio::test]
    async fn batch_commits_and_rolls_back_over_the_wire() {
        let host = start_host();
        let client = connect(&host).await;

        let committed = client
            .send(Message::batch(json!([
                { "target": "layer", "op": "create", "name": "Top" },
                { "target": "shape", "op": "rect", "x": 0, "y": 0, "w": 100, "h": 50 }
            ])))
            .await
            .unwrap();
        let results = committed.data().unwrap().as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[1]["data"]["elementId"].is_string());
        assert_eq!(element_count(&client).await, 1);

        let rolled_back = client
            .send(Message::batch(json!([
                { "target": "shape", "op": "ellipse", "x": 5, "y": 5 },
                { "target": "element", "op": "delete", "id": "does-not-exist" }
            ])))
            .await
            .unwrap();
        let Response::Failure(Failure {
            failed_op,
            completed_ops,
            ..
        }) = rolled_back
        else {
            panic!("expected the batch to fail");
        };
        assert_eq!(failed_op, Some(2));
        assert_eq!(completed_ops, Some(1));
        assert_eq!(element_count(&client).await, 1);
    }

    #[tokio::test]
    async fn single_commands_and_history_over_the_wire() {
        let host = start_host();
        let client = connect(&host).await;

        client
            .send(Message::new("shape:ellipse", json!({ "x": 1, "y": 1 })))
            .await
            .unwrap();
        let undone = client
            .send(Message::new("history:undo", json!({})))
            .await
            .unwrap();
        assert_eq!(undone.data(), Some(&json!({ "canUndo": false, "canRedo": true })));
        assert_eq!(element_count(&client).await, 0);

        let unknown = client
            .send(Message::new("shape:hexagon", json!({})))
            .await
            .unwrap();
        assert_eq!(unknown.error(), Some("Unknown command: shape:hexagon"));
    }

    #[tokio::test]
    async fn second_client_is_turned_away() {
        let host = start_host();
        let first = connect(&host).await;
        assert_eq!(element_count(&first).await, 0);

        let second = connect(&host).await;
        tokio::time::timeout(Duration::from_secs(2), second.closed())
            .await
            .unwrap();
        assert!(!second.is_connected());
        assert_eq!(element_count(&first).await, 0);

        drop(first);
        let mut third = None;
        for _ in 0..50 {
            let candidate = connect(&host).await;
            let reply = candidate
                .send(Message::new("canvas:get-state", json!({})))
                .await;
            if reply.is_ok() {
                third = Some(candidate);
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(third.is_some());
    }

    #[tokio::test]
    async fn malformed_payload_is_answered_under_its_id() {
        let host = start_host();
        let stream = UnixStream::connect(&host.path).await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        write_half.write_all(b"not json at all\n").await.unwrap();
        write_half
            .write_all(b"{\"correlationId\":\"c-1\",\"payload\":{\"payload\":{}}}\n")
            .await
            .unwrap();

        let mut lines = BufReader::new(read_half).lines();
        let line = lines.next_line().await.unwrap().unwrap();
        let frame: Envelope<Response> = serde_json::from_str(&line).unwrap();
        assert_eq!(frame.correlation_id, "c-1");
        assert!(frame.payload.error().unwrap().starts_with("Protocol error"));
    }

    #[tokio::test]
    async fn non_utf8_frame_is_answered_and_connection_survives() {
        let host = start_host();
        let stream = UnixStream::connect(&host.path).await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        write_half
            .write_all(b"{\"correlationId\":\"c-7\",\"payload\":{\"type\":\"\xfe\"}}\n")
            .await
            .unwrap();
        write_half
            .write_all(b"{\"correlationId\":\"c-8\",\"payload\":{\"type\":\"canvas:get-state\"}}\n")
            .await
            .unwrap();

        let mut lines = BufReader::new(read_half).lines();
        let first: Envelope<Response> =
            serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(first.correlation_id, "c-7");
        assert_eq!(first.payload.error(), Some("Protocol error: frame is not valid UTF-8"));

        let second: Envelope<Response> =
            serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(second.correlation_id, "c-8");
        assert!(second.payload.is_success());
    }

    #[tokio::test]
    async fn shutdown_stops_accepting() {
        let host = start_host();
        host.stop.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(2), host.task)
            .await
            .unwrap()
            .unwrap();
        assert!(!host.path.exists());
    }
}
