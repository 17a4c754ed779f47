use std::fmt;

/// Closed taxonomy of run outcomes, one kind per failure point, in
/// pipeline order. `NoUpdateAvailable` is a normal terminal outcome,
/// not a defect; it shares the reporting channel with true failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    VersionNotSpecified,
    CannotConnectToApi,
    NoUpdateAvailable,
    ApiResponseNotValid,
    UpdateFileNotFound,
    FailedToDownloadUpdate,
    FailedToApplyUpdate,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::VersionNotSpecified => write!(f, "local version not specified"),
            ErrorKind::CannotConnectToApi => write!(f, "cannot connect to the update api"),
            ErrorKind::NoUpdateAvailable => write!(f, "no update available"),
            ErrorKind::ApiResponseNotValid => write!(f, "api response is not valid"),
            ErrorKind::UpdateFileNotFound => write!(f, "update file not found"),
            ErrorKind::FailedToDownloadUpdate => write!(f, "failed to download the update"),
            ErrorKind::FailedToApplyUpdate => write!(f, "failed to apply the update"),
        }
    }
}

/// Terminal result of one run: either success carrying the new version,
/// or exactly one [`ErrorKind`] plus the latest version known at the
/// point of failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub error: Option<ErrorKind>,
    pub latest_version: Option<String>,
}

impl Outcome {
    pub fn success(latest_version: impl Into<String>) -> Self {
        Self {
            error: None,
            latest_version: Some(latest_version.into()),
        }
    }

    pub fn failure(kind: ErrorKind, latest_version: Option<String>) -> Self {
        Self {
            error: Some(kind),
            latest_version,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
