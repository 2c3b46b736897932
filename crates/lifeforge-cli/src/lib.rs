//! Lifeforge CLI library - expose modules for testing
//!
//! The binary in `main.rs` is a thin dispatcher; the pipelines and their
//! collaborator interfaces live here so integration tests can drive them
//! with stub implementations.

pub mod commands;
pub mod common;
pub mod config_manager;
pub mod prompt;
pub mod remote;
pub mod staging;
