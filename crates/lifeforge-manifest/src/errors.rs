use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur validating or loading a module manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid manifest.json file")]
    Invalid,

    #[error("Missing required field in manifest.json: {0}")]
    MissingField(&'static str),

    #[error("Invalid field in manifest.json: {0}")]
    UnknownField(String),

    #[error("Invalid name in manifest.json: {0}. Only alphanumeric characters are allowed and it must be in PascalCase.")]
    InvalidName(String),
}

/// Errors that can occur reading or mutating the route registry
#[derive(Error, Debug)]
pub enum RoutesError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse routes file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Routes file not found at {}. Please ensure the path is correct.", .0.display())]
    NotFound(PathBuf),

    #[error("Target category \"{0}\" not found in routes file. Please ensure the category exists.")]
    CategoryNotFound(String),
}
