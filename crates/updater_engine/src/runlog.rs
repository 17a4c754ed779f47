use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use updater_logging::{updater_info, updater_warn};

/// Appends one timestamped, human-readable line per significant event to
/// the session log file, mirroring each line to the process-wide log.
/// The file sink is fire-and-forget; its failures are never reported as
/// run outcomes.
pub(crate) struct RunLog {
    path: Option<PathBuf>,
}

impl RunLog {
    pub(crate) fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub(crate) fn line(&self, text: &str) {
        updater_info!("Updater: {}", text);

        let Some(path) = &self.path else {
            return;
        };
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut file| writeln!(file, "[{timestamp}] {text}"));
        if let Err(err) = result {
            updater_warn!("Could not append to {:?}: {}", path, err);
        }
    }
}
