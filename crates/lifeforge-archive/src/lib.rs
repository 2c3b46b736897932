//! Lifeforge module archive format
//!
//! A module archive is a flat set of `/`-separated entries: files plus
//! explicit folder entries (trailing `/`), so the folder layout is
//! discoverable without extraction. On disk and on the wire the archive is
//! a gzip-compressed tarball.
//!
//! This crate implements exactly the subset of archive operations the
//! module format needs: recursive directory bundling, in-memory
//! extraction, and enforcement of the required top-level shape.

pub mod archive;
pub mod errors;
pub mod validate;

pub use archive::{Archive, Entry};
pub use errors::{ArchiveError, PackageError};
pub use validate::{validate_package, REQUIRED_FILES, REQUIRED_FOLDERS};
