//! Package validator: enforces the archive's required top-level shape and
//! the manifest schema before any extraction or installation proceeds.

use crate::archive::Archive;
use crate::errors::PackageError;
use lifeforge_manifest::{Manifest, ManifestError};
use tracing::debug;

/// The exact set of files every module archive carries at its top level.
pub const REQUIRED_FILES: [&str; 3] = ["README.md", "LICENSE", "manifest.json"];

/// The exact set of folders every module archive carries at its top level.
pub const REQUIRED_FOLDERS: [&str; 3] = ["frontend/", "backend/", "assets/"];

/// Check an archive against the module format contract.
///
/// The required sets are both necessary and sufficient: any extra top-level
/// file or folder, or any missing required one, invalidates the whole
/// archive. Checks stop at the first failure so the operator sees exactly
/// one reason per run; the returned error names the offending item.
///
/// On success the parsed, schema-valid manifest is returned so callers
/// never re-validate.
pub fn validate_package(archive: &Archive) -> Result<Manifest, PackageError> {
    let top_level_files: Vec<&str> = archive
        .entry_names()
        .filter(|name| !name.contains('/'))
        .collect();
    let top_level_folders: Vec<&str> = archive
        .entry_names()
        .filter(|name| name.ends_with('/') && name.matches('/').count() == 1)
        .collect();

    for file in &top_level_files {
        if !REQUIRED_FILES.contains(file) {
            return Err(PackageError::UnexpectedFile {
                found: (*file).to_string(),
                expected: REQUIRED_FILES.join(", "),
            });
        }
    }
    for file in REQUIRED_FILES {
        if !top_level_files.contains(&file) {
            return Err(PackageError::MissingFile {
                missing: file.to_string(),
                expected: REQUIRED_FILES.join(", "),
            });
        }
    }

    for folder in &top_level_folders {
        if !REQUIRED_FOLDERS.contains(folder) {
            return Err(PackageError::UnexpectedFolder {
                found: (*folder).to_string(),
                expected: REQUIRED_FOLDERS.join(", "),
            });
        }
    }
    for folder in REQUIRED_FOLDERS {
        if !top_level_folders.contains(&folder) {
            return Err(PackageError::MissingFolder {
                missing: folder.to_string(),
                expected: REQUIRED_FOLDERS.join(", "),
            });
        }
    }

    let content = archive.file("manifest.json").ok_or(ManifestError::Invalid)?;
    let text = std::str::from_utf8(content).map_err(|_| ManifestError::Invalid)?;
    let manifest = Manifest::from_json_str(text)?;

    debug!("Archive validated as module '{}'", manifest.name);
    Ok(manifest)
}
