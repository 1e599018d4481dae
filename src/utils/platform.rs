//! Platform-specific paths for BorgorTube
//!
//! - Configuration: settings.json in the platform config dir
//! - Data: cookies.txt and the player log
//! - Runtime: control sockets for running player processes

use std::path::PathBuf;

const APP_DIR: &str = "borgortube";

/// Returns the configuration directory
/// - macOS: ~/Library/Application Support/borgortube
/// - Windows: %APPDATA%\borgortube
/// - Linux: ~/.config/borgortube
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Returns the data directory (credential file, player log)
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Returns the directory control sockets are created in.
///
/// Prefers `$XDG_RUNTIME_DIR`. Elsewhere unix uses `/tmp` rather than
/// `$TMPDIR`, which on macOS is too deep for a socket path.
pub fn runtime_dir() -> PathBuf {
    dirs::runtime_dir()
        .unwrap_or_else(fallback_runtime_base)
        .join(APP_DIR)
}

#[cfg(unix)]
fn fallback_runtime_base() -> PathBuf {
    PathBuf::from("/tmp")
}

#[cfg(not(unix))]
fn fallback_runtime_base() -> PathBuf {
    std::env::temp_dir()
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_are_namespaced() {
        assert!(config_dir().ends_with(APP_DIR));
        assert!(data_dir().ends_with(APP_DIR));
        assert!(runtime_dir().ends_with(APP_DIR));
        assert!(settings_path().ends_with("settings.json"));
    }

    #[cfg(unix)]
    #[test]
    fn test_runtime_fallback_is_shallow() {
        assert_eq!(fallback_runtime_base(), PathBuf::from("/tmp"));
    }
}
