use std::path::PathBuf;

use crate::Outcome;

/// Suspending operations requested by the state machine. The driver
/// executes each one and feeds the result back as a [`crate::Msg`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// POST the metadata request, sending the local version as `current`.
    FetchMetadata { current: String },
    /// GET the update package from its source URL.
    DownloadPackage { url: String },
    /// Unpack the staged archive over the installation root.
    ExtractArchive { archive: PathBuf },
    /// Deliver the terminal outcome. Emitted exactly once per run.
    Report { outcome: Outcome },
}
