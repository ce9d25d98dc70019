//! Automation-client side of the channel: turns one-way frames into awaitable
//! request/response pairs keyed by correlation id.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::AppError;
use crate::paths;
use crate::protocol::{Envelope, Message, Response};
use crate::settings::DEFAULT_REQUEST_TIMEOUT_MS;
use crate::transport::{self, Frame, FrameReader, FrameWriter};

type Pending = Arc<Mutex<HashMap<String, oneshot::Sender<Response>>>>;

/// A live connection to a host. Safe to share across tasks; every `send`
/// is independent and may be awaited concurrently.
pub struct HostClient {
    writer: tokio::sync::Mutex<FrameWriter<OwnedWriteHalf>>,
    pending: Pending,
    connected: Arc<AtomicBool>,
    closed: watch::Receiver<bool>,
    request_timeout: Duration,
    reader: JoinHandle<()>,
}

impl HostClient {
    /// Connect to the host registered under `name`.
    pub async fn connect(name: &str, timeout: Duration) -> Result<Self, AppError> {
        Self::connect_at(&paths::socket_path(name), timeout).await
    }

    pub async fn connect_at(path: &Path, timeout: Duration) -> Result<Self, AppError> {
        let stream = transport::connect(path, timeout).await?;
        let (read_half, write_half) = stream.into_split();

        let pending: Pending = Arc::default();
        let connected = Arc::new(AtomicBool::new(true));
        let (closed_tx, closed) = watch::channel(false);
        let reader = tokio::spawn(read_responses(
            read_half,
            Arc::clone(&pending),
            Arc::clone(&connected),
            closed_tx,
        ));
        info!(event = "client_connected", path = %path.display());

        Ok(Self {
            writer: tokio::sync::Mutex::new(FrameWriter::new(write_half)),
            pending,
            connected,
            closed,
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            reader,
        })
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Resolves once the host side of the connection has gone away.
    pub async fn closed(&self) {
        let mut closed = self.closed.clone();
        while !*closed.borrow_and_update() {
            if closed.changed().await.is_err() {
                break;
            }
        }
    }

    /// Send one message and wait for its response.
    ///
    /// Fails with [`AppError::NotConnected`] without touching the wire when
    /// the host is gone, [`AppError::CommandTimeout`] when the request cannot
    /// be written or answered in time, and [`AppError::Disconnected`] when the connection drops while
    /// the request is in flight. A late response to a timed-out request is
    /// dropped by the reader.
    pub async fn send(&self, message: Message) -> Result<Response, AppError> {
        if !self.is_connected() {
            return Err(AppError::NotConnected);
        }

        let (tx, rx) = oneshot::channel();
        let id = self.register(tx);
        let _entry = PendingEntry {
            pending: &self.pending,
            id: &id,
        };
        // The reader drains `pending` after clearing `connected`, so an entry
        // registered past that point would never be resolved.
        if !self.is_connected() {
            return Err(AppError::NotConnected);
        }

        let frame = Envelope {
            correlation_id: id.clone(),
            payload: message,
        };
        // The deadline covers queueing for the writer and a stalled write as
        // well as the wait for the answer.
        let exchange = async {
            self.writer.lock().await.send(&frame).await?;
            let response = rx.await.map_err(|_| AppError::Disconnected)?;
            Ok::<_, AppError>(response)
        };

        match tokio::time::timeout(self.request_timeout, exchange).await {
            Ok(result) => result,
            Err(_) => {
                let timeout_ms = u64::try_from(self.request_timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(event = "request_timed_out", correlation_id = %id, timeout_ms);
                Err(AppError::CommandTimeout { timeout_ms })
            }
        }
    }

    fn register(&self, tx: oneshot::Sender<Response>) -> String {
        let mut pending = self.pending.lock();
        let mut id = Uuid::new_v4().to_string();
        while pending.contains_key(&id) {
            id = Uuid::new_v4().to_string();
        }
        pending.insert(id.clone(), tx);
        id
    }
}

impl Drop for HostClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

impl std::fmt::Debug for HostClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostClient")
            .field("connected", &self.is_connected())
            .field("in_flight", &self.pending.lock().len())
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

/// Removes a correlation entry when its `send` finishes or is dropped.
struct PendingEntry<'a> {
    pending: &'a Pending,
    id: &'a str,
}

impl Drop for PendingEntry<'_> {
    fn drop(&mut self) {
        self.pending.lock().remove(self.id);
    }
}

async fn read_responses(
    read_half: OwnedReadHalf,
    pending: Pending,
    connected: Arc<AtomicBool>,
    closed: watch::Sender<bool>,
) {
    let mut frames = FrameReader::new(read_half);
    loop {
        match frames.next_frame().await {
            Ok(Some(Frame::Text(line))) => match serde_json::from_str::<Envelope<Response>>(line) {
                Ok(frame) => {
                    let waiter = pending.lock().remove(&frame.correlation_id);
                    match waiter {
                        Some(tx) => {
                            let _ = tx.send(frame.payload);
                        }
                        None => debug!(event = "response_unmatched", correlation_id = %frame.correlation_id),
                    }
                }
                Err(e) => warn!(event = "response_malformed", error = %e),
            },
            Ok(Some(Frame::Garbled(_))) => warn!(event = "response_malformed", error = "invalid UTF-8"),
            Ok(None) => {
                info!(event = "host_disconnected");
                break;
            }
            Err(e) => {
                warn!(event = "host_read_failed", error = %e);
                break;
            }
        }
    }

    connected.store(false, Ordering::SeqCst);
    let rejected = {
        let mut pending = pending.lock();
        let count = pending.len();
        // Dropping the senders fails every waiter with `Disconnected`.
        pending.clear();
        count
    };
    if rejected > 0 {
        warn!(event = "pending_rejected", count = rejected);
    }
    let _ = closed.send(true);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::HashSet;

    use futures_util::future::join_all;
    use serde_json::json;

    use super::*;
    use crate::transport::Listener;

    /// Answers requests in reverse arrival order once `hold` of them have
    /// queued up, echoing each payload back. Returns every correlation id seen.
    async fn reverse_echo(listener: Listener, hold: usize) -> Vec<String> {
        let stream = listener.accept().await.unwrap();
        let (read_half, write_half) = stream.into_split();
        let mut frames = FrameReader::new(read_half);
        let mut writer = FrameWriter::new(write_half);
        let mut held = Vec::new();
        let mut seen = Vec::new();
        while let Ok(Some(Frame::Text(line))) = frames.next_frame().await {
            let request: Envelope<Message> = serde_json::from_str(line).unwrap();
            seen.push(request.correlation_id.clone());
            held.push(request);
            if held.len() == hold {
                for request in held.drain(..).rev() {
                    let reply = Envelope {
                        correlation_id: request.correlation_id,
                        payload: Response::ok(request.payload.payload),
                    };
                    writer.send(&reply).await.unwrap();
                }
            }
        }
        seen
    }

    fn socket(dir: &tempfile::TempDir) -> Listener {
        Listener::bind(dir.path().join("host.sock")).unwrap()
    }

    #[tokio::test]
    async fn concurrent_requests_route_to_their_callers() {
        const COUNT: usize = 10_000;
        let dir = tempfile::tempdir().unwrap();
        let listener = socket(&dir);
        let path = listener.path().to_path_buf();
        let server = tokio::spawn(reverse_echo(listener, COUNT));

        let client = HostClient::connect_at(&path, Duration::from_secs(2)).await.unwrap();
        let responses = join_all((0..COUNT).map(|n| {
            let client = &client;
            async move { (n, client.send(Message::new("canvas:get-state", json!({ "n": n }))).await) }
        }))
        .await;

        for (n, response) in responses {
            assert_eq!(response.unwrap().data(), Some(&json!({ "n": n })));
        }
        assert!(client.pending.lock().is_empty());

        drop(client);
        let ids = server.await.unwrap();
        assert_eq!(ids.len(), COUNT);
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), COUNT);
    }

    #[tokio::test]
    async fn unanswered_request_times_out_and_is_forgotten() {
        let dir = tempfile::tempdir().unwrap();
        let listener = socket(&dir);
        let path = listener.path().to_path_buf();
        let _server = tokio::spawn(reverse_echo(listener, usize::MAX));

        let client = HostClient::connect_at(&path, Duration::from_secs(2))
            .await
            .unwrap()
            .with_request_timeout(Duration::from_millis(100));
        let err = client
            .send(Message::new("history:undo", json!({})))
            .await
            .unwrap_err();
        assert_eq!(err, AppError::CommandTimeout { timeout_ms: 100 });
        assert!(client.pending.lock().is_empty());
        assert!(client.is_connected());
    }

    #[tokio::test]
    async fn stalled_write_still_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let listener = socket(&dir);
        let path = listener.path().to_path_buf();
        // Accepts and holds the connection without ever reading from it.
        let server = tokio::spawn(async move {
            let stream = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
            drop(stream);
        });

        let client = HostClient::connect_at(&path, Duration::from_secs(2))
            .await
            .unwrap()
            .with_request_timeout(Duration::from_millis(200));
        let bulky = "x".repeat(8 * 1024 * 1024);
        let outcome = tokio::time::timeout(
            Duration::from_secs(3),
            client.send(Message::new("text:create", json!({ "x": 0, "y": 0, "content": bulky }))),
        )
        .await
        .expect("send outlived its request timeout");
        assert_eq!(outcome.unwrap_err(), AppError::CommandTimeout { timeout_ms: 200 });
        assert!(client.pending.lock().is_empty());

        let after = client
            .send(Message::new("canvas:get-state", json!({})))
            .await
            .unwrap_err();
        assert!(matches!(after, AppError::Io { .. }));
        server.abort();
    }

    #[tokio::test]
    async fn dropped_send_removes_its_entry() {
        let dir = tempfile::tempdir().unwrap();
        let listener = socket(&dir);
        let path = listener.path().to_path_buf();
        let _server = tokio::spawn(reverse_echo(listener, usize::MAX));

        let client = HostClient::connect_at(&path, Duration::from_secs(2)).await.unwrap();
        let abandoned = tokio::time::timeout(
            Duration::from_millis(50),
            client.send(Message::new("canvas:get-state", json!({}))),
        )
        .await;
        assert!(abandoned.is_err());
        assert!(client.pending.lock().is_empty());
    }

    #[tokio::test]
    async fn disconnect_rejects_in_flight_and_later_requests() {
        let dir = tempfile::tempdir().unwrap();
        let listener = socket(&dir);
        let path = listener.path().to_path_buf();
        let server = tokio::spawn(async move {
            let stream = listener.accept().await.unwrap();
            let mut frames = FrameReader::new(stream);
            frames.next_frame().await.unwrap();
        });

        let client = HostClient::connect_at(&path, Duration::from_secs(2)).await.unwrap();
        let err = client
            .send(Message::new("canvas:clear", json!({})))
            .await
            .unwrap_err();
        assert_eq!(err, AppError::Disconnected);
        server.await.unwrap();

        client.closed().await;
        assert!(!client.is_connected());
        let err = client
            .send(Message::new("canvas:get-state", json!({})))
            .await
            .unwrap_err();
        assert_eq!(err, AppError::NotConnected);
    }

    #[tokio::test]
    async fn connecting_to_an_absent_host_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let err = HostClient::connect_at(&dir.path().join("nobody.sock"), Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ConnectTimeout { .. }));
    }
}
