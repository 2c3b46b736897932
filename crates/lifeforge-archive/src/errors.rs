use lifeforge_manifest::ManifestError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur transcoding an archive
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Archive not found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unsafe entry path in archive: {0}")]
    UnsafePath(String),

    #[error("Unsafe archive entry type {entry_type} at {path}")]
    UnsafeEntry { entry_type: String, path: String },
}

/// Errors reported by the package validator, one per failed check.
///
/// The validator stops at the first failure, so exactly one of these
/// reaches the operator per run.
#[derive(Error, Debug)]
pub enum PackageError {
    #[error("Invalid file: {found}. Expected one of: {expected}")]
    UnexpectedFile { found: String, expected: String },

    #[error("Missing required file: {missing}. Expected one of: {expected}")]
    MissingFile { missing: String, expected: String },

    #[error("Invalid folder: {found}. Expected one of: {expected}")]
    UnexpectedFolder { found: String, expected: String },

    #[error("Missing required folder: {missing}. Expected one of: {expected}")]
    MissingFolder { missing: String, expected: String },

    #[error(transparent)]
    Manifest(#[from] ManifestError),
}
