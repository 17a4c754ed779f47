use std::path::PathBuf;

use crate::transport::RequestOptions;

/// Default name of the per-run log file under the install root.
pub const DEFAULT_LOG_FILENAME: &str = "updater-log.txt";

/// Fixed filename the downloaded package is staged under.
pub const UPDATE_FILENAME: &str = "update.zip";

/// Session configuration, set once at construction and read-only during
/// a run.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Update-metadata endpoint. Not validated eagerly; a missing
    /// endpoint surfaces as a connect failure at check time.
    pub endpoint: Option<String>,
    /// Installation root: manifest location, download target, and
    /// extraction destination.
    pub install_dir: PathBuf,
    /// Log filename under the install root; `None` disables the file
    /// sink (events still reach the process-wide log).
    pub log_file: Option<String>,
    /// Transport options merged into every outbound request. Copied and
    /// extended per request, never mutated in place.
    pub request_options: RequestOptions,
}

impl SessionConfig {
    pub fn new(install_dir: impl Into<PathBuf>) -> Self {
        Self {
            endpoint: None,
            install_dir: install_dir.into(),
            log_file: Some(DEFAULT_LOG_FILENAME.to_string()),
            request_options: RequestOptions::default(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}
