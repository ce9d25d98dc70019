use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Document, Element};

/// Document file format version.
const DOCUMENT_VERSION: u32 = 1;

// ── Error type ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

// ── JSON envelope ───────────────────────────────────────────────────

#[derive(Serialize)]
struct DocumentFileRef<'a> {
    version: u32,
    document: &'a Document,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DocumentFile {
    Versioned { version: u32, document: Document },
    Bare(Document),
}

/// Serialize a document into its on-disk form.
pub fn serialize_document(document: &Document) -> Result<String, ProjectError> {
    Ok(serde_json::to_string_pretty(&DocumentFileRef {
        version: DOCUMENT_VERSION,
        document,
    })?)
}

/// Parse a document file. Accepts the versioned envelope or a bare document.
pub fn parse_document(content: &str) -> Result<Document, ProjectError> {
    match serde_json::from_str::<DocumentFile>(content)? {
        DocumentFile::Versioned { version, .. } if version > DOCUMENT_VERSION => {
            Err(ProjectError::InvalidDocument(format!(
                "Document version {version} is newer than supported version {DOCUMENT_VERSION}"
            )))
        }
        DocumentFile::Versioned { document, .. } | DocumentFile::Bare(document) => {
            if document.layers.is_empty() {
                return Err(ProjectError::InvalidDocument("document has no layers".into()));
            }
            check_unique_ids(&document)?;
            Ok(document)
        }
    }
}

/// Layer ids, and element ids at any depth, must each be unique: commands
/// address both by id.
fn check_unique_ids(document: &Document) -> Result<(), ProjectError> {
    let mut layer_ids = HashSet::new();
    let mut element_ids = HashSet::new();
    let mut stack: Vec<&Element> = Vec::new();
    for layer in &document.layers {
        if !layer_ids.insert(layer.id.as_str()) {
            return Err(ProjectError::InvalidDocument(format!(
                "duplicate layer id \"{}\"",
                layer.id
            )));
        }
        stack.extend(&layer.elements);
        while let Some(element) = stack.pop() {
            if !element_ids.insert(element.id()) {
                return Err(ProjectError::InvalidDocument(format!(
                    "duplicate element id \"{}\"",
                    element.id()
                )));
            }
            if let Element::Group(group) = element {
                stack.extend(&group.children);
            }
        }
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────

/// The host is the only writer of its files; one lock keeps concurrent saves
/// from interleaving their temp and backup renames.
static WRITE_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Replace `path` with `data` without ever exposing a half-written file.
/// The new bytes go to a fsynced `.tmp` sibling first; the previous file, if
/// any, is kept as `.bak`.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<(), ProjectError> {
    let _guard = WRITE_LOCK.lock();
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let staged = sibling(path, "tmp");
    let mut file = fs::File::create(&staged)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    if path.exists() {
        let _ = fs::rename(path, sibling(path, "bak"));
    }
    fs::rename(&staged, path)?;
    Ok(())
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ProjectError> {
    let json = serde_json::to_string_pretty(value)?;
    atomic_write(path, json.as_bytes())
}

pub(crate) fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ProjectError> {
    let data = fs::read_to_string(path)?;
    let value = serde_json::from_str(&data)?;
    Ok(value)
}
