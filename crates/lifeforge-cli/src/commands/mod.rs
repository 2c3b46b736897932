//! Command handlers for the CLI subcommands.

use colored::Colorize;
use lifeforge_manifest::Manifest;

pub mod config;
pub mod install;
pub mod package;

/// Terminal outcome of an operator-driven pipeline run.
///
/// Cancellation is not a failure: the operator declined at a confirmation
/// gate before any side effects, and the run unwinds cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Cancelled,
}

/// Show the manifest the way the operator will be asked to confirm it.
pub(crate) fn display_manifest(manifest: &Manifest) {
    eprintln!();
    display_row("Name", &manifest.name);
    display_row("Description", &manifest.description);
    display_row("Author", &manifest.author);
    display_row("Icon", &manifest.icon);
    display_row("Version", &manifest.version);
    eprintln!();
}

pub(crate) fn display_row(key: &str, value: &str) {
    eprintln!("  {:<22} {}", key.bold(), value);
}
