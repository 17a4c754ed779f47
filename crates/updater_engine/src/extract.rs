use std::fs::{self, File};
use std::io;
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("archive entry escapes the destination: {0}")]
    UnsafeEntry(String),
}

/// Unpacks a local archive into a destination directory, overwriting
/// existing files in place.
pub trait Extractor: Send + Sync {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<(), ExtractError>;
}

/// Zip-backed extractor. Entries whose names would resolve outside the
/// destination are rejected rather than trusted.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipExtractor;

impl Extractor for ZipExtractor {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<(), ExtractError> {
        let file = File::open(archive)?;
        let mut zip = zip::ZipArchive::new(file)?;

        for index in 0..zip.len() {
            let mut entry = zip.by_index(index)?;
            let relative = entry
                .enclosed_name()
                .ok_or_else(|| ExtractError::UnsafeEntry(entry.name().to_string()))?;
            let target = dest.join(relative);

            if entry.is_dir() {
                fs::create_dir_all(&target)?;
                continue;
            }
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&target)?;
            io::copy(&mut entry, &mut out)?;
        }
        Ok(())
    }
}
