//! Lifeforge manifest management
//!
//! This crate holds the data contracts of a Lifeforge module: the
//! `manifest.json` identity record with its schema validation, and the host
//! frontend's route registry (`routes.json`) with its mutation logic.
//!
//! Both documents are plain JSON. Validation is pure (no I/O) so the
//! package validator and the packaging pipeline share one schema.

pub mod errors;
pub mod manifest;
pub mod routes;

pub use errors::{ManifestError, RoutesError};
pub use manifest::Manifest;
pub use routes::{Registered, RouteCategory, RouteRegistry};
