//! Configuration paths
//!
//! The config file location can be overridden with `TEST_LISTENER_CONFIG`.

use std::path::PathBuf;

/// Name used for the project directories
const APP_NAME: &str = "test-listener";

/// Environment variable overriding the config file path
pub const CONFIG_ENV: &str = "TEST_LISTENER_CONFIG";

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/test-listener/`
/// - macOS: `~/Library/Application Support/test-listener/`
/// - Windows: `%APPDATA%\test-listener\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    config_dir().map(|dir| dir.join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_path_ends_with_file_name() {
        if std::env::var(CONFIG_ENV).is_err() {
            if let Some(path) = config_path() {
                assert!(path.ends_with("config.toml"));
            }
        }
    }
}
