//! External collaborators the executor calls out to: rendering, asset loading
//! and durable storage. The host wires in [`LocalServices`]; tests use fakes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use tracing::{debug, info};

use crate::error::AppError;
use crate::model::Document;
use crate::project;

/// File used by save/load when no explicit path is given.
pub const DEFAULT_DOCUMENT_FILE: &str = "document.json";

/// An image file loaded for embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    /// `data:<mime>;base64,...`
    pub data_url: String,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

/// A serialized document read back from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Retrieved {
    pub content: String,
    pub path: String,
}

#[async_trait]
pub trait HostServices: Send + Sync {
    /// Render the document and return the path of the written image.
    async fn capture_visual(&self, document: &Document, scale: f64) -> Result<String, AppError>;

    async fn load_asset(&self, path: &str) -> Result<Asset, AppError>;

    /// Persist the document. `Ok(None)` means the user cancelled.
    async fn persist(&self, document: &Document, path: Option<&str>) -> Result<Option<String>, AppError>;

    async fn retrieve(&self, path: Option<&str>) -> Result<Retrieved, AppError>;
}

// ── Local filesystem implementation ────────────────────────────────

#[derive(Debug, Clone)]
pub struct LocalServices {
    data_dir: PathBuf,
}

impl LocalServices {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Relative paths resolve against the data directory.
    fn resolve(&self, path: Option<&str>) -> PathBuf {
        match path {
            Some(p) if Path::new(p).is_absolute() => PathBuf::from(p),
            Some(p) => self.data_dir.join(p),
            None => self.data_dir.join(DEFAULT_DOCUMENT_FILE),
        }
    }
}

#[async_trait]
impl HostServices for LocalServices {
    async fn capture_visual(&self, _document: &Document, _scale: f64) -> Result<String, AppError> {
        Err(AppError::collaborator("capture", "no renderer attached"))
    }

    async fn load_asset(&self, path: &str) -> Result<Asset, AppError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::collaborator("load asset", format!("{path}: {e}")))?;
        let (width, height) = png_dimensions(&bytes).unzip();
        let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
        debug!(event = "asset_loaded", path, bytes = bytes.len(), ?width, ?height);
        Ok(Asset {
            data_url: format!("data:{};base64,{encoded}", mime_for(path)),
            width,
            height,
        })
    }

    async fn persist(&self, document: &Document, path: Option<&str>) -> Result<Option<String>, AppError> {
        let target = self.resolve(path);
        let content = project::serialize_document(document)?;
        let write_path = target.clone();
        tokio::task::spawn_blocking(move || project::atomic_write(&write_path, content.as_bytes()))
            .await
            .map_err(|e| AppError::Internal {
                message: e.to_string(),
            })??;
        let shown = target.display().to_string();
        info!(event = "document_saved", path = %shown);
        Ok(Some(shown))
    }

    async fn retrieve(&self, path: Option<&str>) -> Result<Retrieved, AppError> {
        let source = self.resolve(path);
        let content = tokio::fs::read_to_string(&source)
            .await
            .map_err(|e| AppError::Persistence {
                message: format!("{}: {e}", source.display()),
            })?;
        info!(event = "document_read", path = %source.display());
        Ok(Retrieved {
            content,
            path: source.display().to_string(),
        })
    }
}

fn mime_for(path: &str) -> &'static str {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Width and height from a PNG's IHDR chunk.
fn png_dimensions(bytes: &[u8]) -> Option<(f64, f64)> {
    if bytes.get(..8)? != PNG_SIGNATURE || bytes.get(12..16)? != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(bytes.get(16..20)?.try_into().ok()?);
    let height = u32::from_be_bytes(bytes.get(20..24)?.try_into().ok()?);
    Some((f64::from(width), f64::from(height)))
}

// ── Test fake ───────────────────────────────────────────────────────
