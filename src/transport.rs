//! Channel transport: a Unix domain socket carrying newline-delimited JSON.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::error::AppError;

/// Delay between connection attempts while waiting for the host to appear.
const CONNECT_RETRY: Duration = Duration::from_millis(100);

/// One line read off the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame<'a> {
    Text(&'a str),
    /// The line was not valid UTF-8. Carries a lossy decoding so the sender's
    /// correlation id can still be recovered.
    Garbled(String),
}

/// Reads one frame per line. Blank lines are skipped.
pub struct FrameReader<R> {
    inner: BufReader<R>,
    line: Vec<u8>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
            line: Vec::new(),
        }
    }

    /// The next non-empty line, or `None` once the peer has closed. A line
    /// that is not UTF-8 is returned as [`Frame::Garbled`] and the stream
    /// stays usable.
    pub async fn next_frame(&mut self) -> Result<Option<Frame<'_>>, AppError> {
        loop {
            self.line.clear();
            if self.inner.read_until(b'\n', &mut self.line).await? == 0 {
                return Ok(None);
            }
            if !self.line.trim_ascii().is_empty() {
                break;
            }
        }
        let bytes = self.line.trim_ascii_end();
        Ok(Some(match std::str::from_utf8(bytes) {
            Ok(text) => Frame::Text(text),
            Err(_) => Frame::Garbled(String::from_utf8_lossy(bytes).into_owned()),
        }))
    }
}

/// Writes one frame per line. A write cut off part way (its future dropped
/// mid-frame) leaves the stream unusable, so every later send fails.
pub struct FrameWriter<W> {
    inner: W,
    torn: bool,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, torn: false }
    }

    pub async fn send<T: Serialize>(&mut self, frame: &T) -> Result<(), AppError> {
        if self.torn {
            return Err(AppError::Io {
                message: "stream holds a partially written frame".into(),
            });
        }
        let mut bytes = serde_json::to_vec(frame)?;
        bytes.push(b'\n');
        self.torn = true;
        self.inner.write_all(&bytes).await?;
        self.inner.flush().await?;
        self.torn = false;
        Ok(())
    }
}

/// Connect to the host socket, retrying until `timeout` elapses. A host that
/// is not running yet surfaces as [`AppError::ConnectTimeout`].
pub async fn connect(path: &Path, timeout: Duration) -> Result<UnixStream, AppError> {
    let deadline = Instant::now() + timeout;
    loop {
        match UnixStream::connect(path).await {
            Ok(stream) => {
                debug!(event = "transport_connected", path = %path.display());
                return Ok(stream);
            }
            Err(e) if Instant::now() + CONNECT_RETRY < deadline => {
                debug!(event = "transport_connect_retry", path = %path.display(), error = %e);
                sleep(CONNECT_RETRY).await;
            }
            Err(_) => {
                return Err(AppError::ConnectTimeout {
                    endpoint: path.display().to_string(),
                })
            }
        }
    }
}

/// Bound host socket. The socket file is removed when the listener drops.
pub struct Listener {
    inner: UnixListener,
    path: PathBuf,
}

impl Listener {
    /// Bind at `path`, replacing a stale socket left by a previous run.
    pub fn bind(path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let path = path.into();
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let inner = UnixListener::bind(&path)?;
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600));
        }
        info!(event = "transport_listening", path = %path.display());
        Ok(Self { inner, path })
    }

    pub async fn accept(&self) -> Result<UnixStream, AppError> {
        let (stream, _) = self.inner.accept().await?;
        Ok(stream)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
