use std::path::PathBuf;

/// Parsed metadata response. Both fields are optional at the wire level;
/// validation happens in the transition function so that a missing field
/// and an unparseable body surface through the same path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetadataReply {
    pub last: Option<String>,
    pub source: Option<String>,
}

/// Failure at the metadata stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckFailure {
    /// Timeout, DNS, connection refused, or a non-2xx status.
    Transport,
    /// Empty body or body that is not the expected structured document.
    InvalidResponse,
}

/// Failure at the download stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadFailure {
    /// The package could not be fetched from its source URL.
    Fetch,
    /// The fetched bytes could not be durably written to disk.
    Store,
}

/// Failure at the apply stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyFailure {
    Extraction,
}

/// Inputs to the state machine, fed by the driver as each suspending
/// operation completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Local version read from the installation manifest; `None` when the
    /// manifest is missing, unreadable, or carries an empty version.
    LocalVersion { version: Option<String> },
    /// Metadata request finished.
    MetadataResult(Result<MetadataReply, CheckFailure>),
    /// Package download finished; on success, the staged file path.
    DownloadResult(Result<PathBuf, DownloadFailure>),
    /// Archive extraction finished.
    ExtractResult(Result<(), ApplyFailure>),
}
