use std::collections::VecDeque;
use std::path::Path;

use updater_core::{
    step, ApplyFailure, CheckFailure, DownloadFailure, Effect, ErrorKind, Msg, Outcome,
    SessionState, UpdateDescriptor,
};
use updater_logging::updater_debug;

use crate::config::{SessionConfig, UPDATE_FILENAME};
use crate::extract::{Extractor, ZipExtractor};
use crate::manifest::{ManifestReader, PackageJsonManifest};
use crate::persist::{PackageStore, StagedPackageStore};
use crate::report::{OutcomeReporter, UpdateCallback};
use crate::runlog::RunLog;
use crate::transport::{ReqwestTransport, Transport};

/// Stateful orchestrator for the check → download → apply pipeline.
///
/// One session runs one check at a time: `check` borrows the session
/// mutably for the whole run, so overlapping runs on the same session
/// are rejected at compile time rather than left to race.
pub struct UpdateSession {
    config: SessionConfig,
    transport: Box<dyn Transport>,
    store: Box<dyn PackageStore>,
    extractor: Box<dyn Extractor>,
    manifest: Box<dyn ManifestReader>,
    callback: Option<UpdateCallback>,
    descriptor: UpdateDescriptor,
}

impl UpdateSession {
    pub fn new(config: SessionConfig) -> Self {
        let manifest = Box::new(PackageJsonManifest::new(config.install_dir.clone()));
        let store = Box::new(StagedPackageStore::new(config.install_dir.clone()));
        Self::with_parts(
            config,
            Box::new(ReqwestTransport),
            store,
            Box::new(ZipExtractor),
            manifest,
        )
    }

    /// Constructor with explicit collaborators, for embedders that bring
    /// their own transport, packaging format, or manifest source.
    pub fn with_parts(
        config: SessionConfig,
        transport: Box<dyn Transport>,
        store: Box<dyn PackageStore>,
        extractor: Box<dyn Extractor>,
        manifest: Box<dyn ManifestReader>,
    ) -> Self {
        Self {
            config,
            transport,
            store,
            extractor,
            manifest,
            callback: None,
            descriptor: UpdateDescriptor::default(),
        }
    }

    pub fn set_callback(&mut self, callback: UpdateCallback) {
        self.callback = Some(callback);
    }

    /// Descriptor of the most recent run, for inspection.
    pub fn descriptor(&self) -> &UpdateDescriptor {
        &self.descriptor
    }

    /// Runs one full update check and resolves to its terminal outcome.
    ///
    /// A call-time callback replaces the session callback for this and
    /// subsequent runs. Exactly one outcome is delivered per run, through
    /// the callback (when one is registered) and the returned value
    /// alike; no error crosses this boundary any other way.
    pub async fn check(&mut self, callback: Option<UpdateCallback>) -> Outcome {
        if let Some(callback) = callback {
            self.callback = Some(callback);
        }

        let log = RunLog::new(
            self.config
                .log_file
                .as_ref()
                .map(|name| self.config.install_dir.join(name)),
        );
        let outcome = self.drive(&log).await;

        let mut reporter = OutcomeReporter::new(self.callback.take());
        reporter.report(&outcome);
        self.callback = reporter.into_callback();
        outcome
    }

    /// Drives the core state machine: executes each requested effect and
    /// feeds its result back as the next message.
    async fn drive(&mut self, log: &RunLog) -> Outcome {
        let mut state = SessionState::new();
        let mut queue = VecDeque::new();
        queue.push_back(Msg::LocalVersion {
            version: self.manifest.local_version(),
        });

        let mut outcome = None;
        while let Some(msg) = queue.pop_front() {
            let (next, effects) = step(state, msg);
            state = next;
            for effect in effects {
                match effect {
                    Effect::FetchMetadata { current } => {
                        queue.push_back(self.fetch_metadata(&current, log).await);
                    }
                    Effect::DownloadPackage { url } => {
                        let latest = state.descriptor().latest_version.as_deref();
                        log.line(&format!(
                            "Update available: {}",
                            latest.unwrap_or("(unknown)")
                        ));
                        queue.push_back(self.download_package(&url, log).await);
                    }
                    Effect::ExtractArchive { archive } => {
                        queue.push_back(self.extract_archive(&archive, log));
                    }
                    Effect::Report { outcome: terminal } => {
                        match terminal.error {
                            None => log.line("End of update."),
                            Some(ErrorKind::VersionNotSpecified) => log.line(
                                "The \"version\" field is not specified in the application manifest",
                            ),
                            Some(ErrorKind::ApiResponseNotValid) => {
                                log.line("API response is not valid")
                            }
                            Some(ErrorKind::NoUpdateAvailable) => log.line("No updates available"),
                            // Connection, download and extraction failures
                            // were already logged with their error detail
                            // at the failing stage.
                            Some(_) => {}
                        }
                        outcome = Some(terminal);
                    }
                }
            }
        }

        self.descriptor = state.into_descriptor();
        // The state machine emits exactly one Report per run started with
        // a LocalVersion message.
        outcome.expect("run finished without a terminal report")
    }

    async fn fetch_metadata(&self, current: &str, log: &RunLog) -> Msg {
        let endpoint = self.config.endpoint.clone().unwrap_or_default();
        match self
            .transport
            .fetch_metadata(&endpoint, &self.config.request_options, current)
            .await
        {
            Ok(reply) => {
                log.line(&format!("Connected to {endpoint}"));
                Msg::MetadataResult(Ok(reply))
            }
            Err(err) if err.is_invalid_body() => {
                // The transport reached the endpoint; only the body was bad.
                log.line(&format!("Connected to {endpoint}"));
                updater_debug!("Metadata body rejected: {}", err);
                Msg::MetadataResult(Err(CheckFailure::InvalidResponse))
            }
            Err(err) => {
                log.line(&format!("Could not connect, {err}"));
                Msg::MetadataResult(Err(CheckFailure::Transport))
            }
        }
    }

    async fn download_package(&self, url: &str, log: &RunLog) -> Msg {
        log.line(&format!("Downloading {url}"));

        let bytes = match self
            .transport
            .download_package(url, &self.config.request_options)
            .await
        {
            Ok(bytes) => bytes,
            Err(err) => {
                log.line(&format!("Could not find the update file, {err}"));
                return Msg::DownloadResult(Err(DownloadFailure::Fetch));
            }
        };

        match self.store.store(UPDATE_FILENAME, &bytes) {
            Ok(path) => {
                log.line(&format!("Update downloaded: {}", path.display()));
                Msg::DownloadResult(Ok(path))
            }
            Err(err) => {
                log.line(&format!("Failed to download the update to a local file, {err}"));
                Msg::DownloadResult(Err(DownloadFailure::Store))
            }
        }
    }

    fn extract_archive(&self, archive: &Path, log: &RunLog) -> Msg {
        log.line("Extracting the new update files.");
        match self.extractor.extract(archive, &self.config.install_dir) {
            Ok(()) => {
                log.line("New update files were extracted.");
                Msg::ExtractResult(Ok(()))
            }
            Err(err) => {
                log.line(&format!("Extraction error: {err}"));
                Msg::ExtractResult(Err(ApplyFailure::Extraction))
            }
        }
    }
}
