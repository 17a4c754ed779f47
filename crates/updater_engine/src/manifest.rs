use std::fs;
use std::path::PathBuf;

use updater_logging::updater_warn;

/// Name of the packaging manifest under the install root.
pub const MANIFEST_FILENAME: &str = "package.json";

/// Source of the locally installed version string.
pub trait ManifestReader: Send + Sync {
    /// Installed version, or `None` when the manifest is missing,
    /// unreadable, or carries an empty `version` field.
    fn local_version(&self) -> Option<String>;
}

/// Reads the `version` field of `package.json` under the install root.
pub struct PackageJsonManifest {
    root: PathBuf,
}

impl PackageJsonManifest {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl ManifestReader for PackageJsonManifest {
    fn local_version(&self) -> Option<String> {
        let path = self.root.join(MANIFEST_FILENAME);
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                updater_warn!("Failed to read manifest {:?}: {}", path, err);
                return None;
            }
        };

        let document: serde_json::Value = match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(err) => {
                updater_warn!("Failed to parse manifest {:?}: {}", path, err);
                return None;
            }
        };

        document
            .get("version")
            .and_then(|value| value.as_str())
            .map(str::trim)
            .filter(|version| !version.is_empty())
            .map(ToOwned::to_owned)
    }
}
