//! Updater engine: transport, packaging, and the session driver.
mod config;
mod extract;
mod handle;
mod manifest;
mod persist;
mod report;
mod runlog;
mod session;
mod transport;

pub use config::{SessionConfig, DEFAULT_LOG_FILENAME, UPDATE_FILENAME};
pub use extract::{ExtractError, Extractor, ZipExtractor};
pub use handle::UpdateHandle;
pub use manifest::{ManifestReader, PackageJsonManifest, MANIFEST_FILENAME};
pub use persist::{PackageStore, PersistError, StagedPackageStore};
pub use report::{OutcomeReporter, UpdateCallback};
pub use session::UpdateSession;
pub use transport::{ReqwestTransport, RequestOptions, Transport, TransportError};
// Re-export the core vocabulary so embedders need only this crate.
pub use updater_core::{ErrorKind, Outcome, UpdateDescriptor};
