//! Centralized path definitions for config files, documents and the host socket.
//!
//! This module is the single source of truth for leaf filenames, directory names,
//! and path-building functions. No other module should hard-code these strings.

use std::path::{Path, PathBuf};

// ── Application identity ─────────────────────────────────────────

pub const APP_DIR_NAME: &str = "canvas-relay";

// ── Leaf filenames ───────────────────────────────────────────────

pub const SETTINGS_FILE: &str = "settings.json";
pub const SOCKET_EXTENSION: &str = "sock";

// ── Directory names ──────────────────────────────────────────────

pub const DOCUMENTS_DIR: &str = "documents";

// ── Config-dir functions (take config_dir) ───────────────────────

/// `$XDG_CONFIG_HOME/canvas-relay`, falling back to `~/.config/canvas-relay`
/// and finally the temp dir.
pub fn default_config_dir() -> PathBuf {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .unwrap_or_else(std::env::temp_dir);
    base.join(APP_DIR_NAME)
}

pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join(SETTINGS_FILE)
}

pub fn documents_dir(config_dir: &Path) -> PathBuf {
    config_dir.join(DOCUMENTS_DIR)
}

// ── Runtime functions ────────────────────────────────────────────

/// `$XDG_RUNTIME_DIR`, or the temp dir when unset.
pub fn runtime_dir() -> PathBuf {
    std::env::var_os("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .filter(|p| p.is_dir())
        .unwrap_or_else(std::env::temp_dir)
}

/// Socket the host named `channel_name` listens on.
pub fn socket_path(channel_name: &str) -> PathBuf {
    socket_path_in(&runtime_dir(), channel_name)
}

pub fn socket_path_in(runtime_dir: &Path, channel_name: &str) -> PathBuf {
    runtime_dir.join(format!("{channel_name}.{SOCKET_EXTENSION}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_named_after_channel() {
        assert_eq!(
            socket_path_in(Path::new("/run/user/1000"), "canvas-relay"),
            PathBuf::from("/run/user/1000/canvas-relay.sock")
        );
    }

    #[test]
    fn config_children() {
        let dir = Path::new("/cfg");
        assert_eq!(settings_path(dir), PathBuf::from("/cfg/settings.json"));
        assert_eq!(documents_dir(dir), PathBuf::from("/cfg/documents"));
        assert!(default_config_dir().ends_with(APP_DIR_NAME));
    }
}
