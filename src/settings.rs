use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::project::{read_json, write_json, ProjectError};

pub const DEFAULT_CHANNEL_NAME: &str = "canvas-relay";
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_LOG_FILTER: &str = "info";

const SETTINGS_VERSION: u32 = 1;

// ── Host settings ────────────────────────────────────────────────

/// Settings shared by the host and the CLI, stored as `settings.json` in the
/// config directory. Every field has a default, so a partial file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSettings {
    pub version: u32,
    /// Stable host name; the socket is `<runtime_dir>/<channel_name>.sock`.
    pub channel_name: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub history_limit: usize,
    /// Where documents are saved when no explicit path is given.
    /// None = `<config_dir>/documents`.
    pub data_dir: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            channel_name: DEFAULT_CHANNEL_NAME.to_string(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            history_limit: DEFAULT_HISTORY_LIMIT,
            data_dir: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl HostSettings {
    pub fn data_dir(&self, config_dir: &Path) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| crate::paths::documents_dir(config_dir))
    }

    pub fn socket_path(&self) -> PathBuf {
        crate::paths::socket_path(&self.channel_name)
    }
}

/// Load settings from the config directory. Returns defaults if no settings
/// file exists; a file that exists but does not parse is an error.
pub fn load_settings(config_dir: &Path) -> Result<HostSettings, ProjectError> {
    let path = crate::paths::settings_path(config_dir);
    if !path.exists() {
        return Ok(HostSettings::default());
    }
    read_json(&path)
}

/// Load settings, writing a default `settings.json` first if none exists so
/// the host leaves an editable file behind. The flag reports whether it did.
pub fn load_or_init_settings(config_dir: &Path) -> Result<(HostSettings, bool), ProjectError> {
    if crate::paths::settings_path(config_dir).exists() {
        return Ok((load_settings(config_dir)?, false));
    }
    let settings = HostSettings::default();
    save_settings(config_dir, &settings)?;
    Ok((settings, true))
}

/// Save settings to the config directory.
pub fn save_settings(config_dir: &Path, settings: &HostSettings) -> Result<(), ProjectError> {
    std::fs::create_dir_all(config_dir)?;
    write_json(&crate::paths::settings_path(config_dir), settings)
}
