use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("install directory missing or not writable: {0}")]
    InstallDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Durably writes downloaded package bytes under the install root.
pub trait PackageStore: Send + Sync {
    fn store(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, PersistError>;
}

/// Stages the download through a temp file in the install root, then
/// renames it over the target so a torn write never leaves a partial
/// package behind.
pub struct StagedPackageStore {
    dir: PathBuf,
}

impl StagedPackageStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn check_dir(dir: &Path) -> Result<(), PersistError> {
        let meta = fs::metadata(dir).map_err(|err| PersistError::InstallDir(err.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::InstallDir("path is not a directory".into()));
        }
        Ok(())
    }
}

impl PackageStore for StagedPackageStore {
    fn store(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, PersistError> {
        Self::check_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target).map_err(|err| PersistError::Io(err.error))?;
        Ok(target)
    }
}
