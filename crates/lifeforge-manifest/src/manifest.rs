//! Module manifest: the identity record carried as `manifest.json` at the
//! top level of every module archive.
//!
//! The schema is closed: exactly the required fields, nothing else. The
//! module name doubles as the unique module identifier and the folder name
//! under the host's apps directory, so it must be PascalCase alphanumeric.

use crate::errors::ManifestError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Field order here is the check order reported to the operator.
pub const REQUIRED_FIELDS: [&str; 5] = ["name", "icon", "version", "description", "author"];

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[A-Z][a-zA-Z0-9]*$").expect("name pattern is valid"));

/// Identity record for a module.
///
/// Constructed by the packaging pipeline, serialized into an archive's
/// `manifest.json`, read back and re-validated by the installation pipeline
/// before any mutation occurs. Never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    pub icon: String,
    pub version: String,
    pub description: String,
    pub author: String,
}

impl Manifest {
    /// Validate an untyped JSON value against the manifest schema.
    ///
    /// Checks run in order and stop at the first failure: every required
    /// field present and non-empty, no field outside the required set, and
    /// the name pattern. Deterministic, no side effects.
    pub fn validate(raw: &Value) -> Result<Self, ManifestError> {
        let Some(object) = raw.as_object() else {
            return Err(ManifestError::Invalid);
        };

        for field in REQUIRED_FIELDS {
            let present = object
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|s| !s.is_empty());
            if !present {
                return Err(ManifestError::MissingField(field));
            }
        }

        for field in object.keys() {
            if !REQUIRED_FIELDS.contains(&field.as_str()) {
                return Err(ManifestError::UnknownField(field.clone()));
            }
        }

        let manifest: Manifest =
            serde_json::from_value(raw.clone()).map_err(|_| ManifestError::Invalid)?;

        if !NAME_PATTERN.is_match(&manifest.name) {
            return Err(ManifestError::InvalidName(manifest.name));
        }

        debug!("Validated manifest for module '{}'", manifest.name);
        Ok(manifest)
    }

    /// Parse and validate manifest JSON text.
    ///
    /// Malformed JSON is reported as a generic invalid-manifest failure,
    /// distinct from the per-field schema failures.
    pub fn from_json_str(content: &str) -> Result<Self, ManifestError> {
        let raw: Value = serde_json::from_str(content).map_err(|_| ManifestError::Invalid)?;
        Self::validate(&raw)
    }

    /// Load and validate a `manifest.json` file.
    pub fn load_from_path(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Serialize to the pretty JSON form written into archives.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}
