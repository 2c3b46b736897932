//! In-memory archive representation and the directory transcoder.

use crate::errors::ArchiveError;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Component, Path};
use tracing::debug;
use walkdir::WalkDir;

/// One archive entry: a regular file with its bytes, or a folder marker.
///
/// Symlinks and permission bits are out of scope for the module format;
/// everything is a plain file or directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    File(Vec<u8>),
    Dir,
}

/// A module archive as a flat, ordered set of named entries.
///
/// Entry names use `/` separators; folder entries carry a trailing `/`.
/// Folders are recorded explicitly (even when empty) so the archive's
/// folder set is discoverable without extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Archive {
    entries: BTreeMap<String, Entry>,
}

impl Archive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file entry. The name is used as-is, so callers pass
    /// `/`-separated paths relative to the archive root.
    pub fn insert_file(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.entries.insert(name.into(), Entry::File(bytes));
    }

    /// Add a folder entry, normalizing to a trailing `/`.
    pub fn insert_dir(&mut self, name: impl Into<String>) {
        let mut name = name.into();
        if !name.ends_with('/') {
            name.push('/');
        }
        self.entries.insert(name, Entry::Dir);
    }

    /// All entry names, in sorted order.
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Bytes of a file entry, if present.
    pub fn file(&self, name: &str) -> Option<&[u8]> {
        match self.entries.get(name) {
            Some(Entry::File(bytes)) => Some(bytes),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Recursively bundle a directory tree.
    ///
    /// Every regular file becomes an entry keyed by its path relative to
    /// the walk root; every directory becomes an explicit folder entry,
    /// including empty ones.
    pub fn bundle_dir(root: &Path) -> Result<Self, ArchiveError> {
        if !root.is_dir() {
            return Err(ArchiveError::NotFound(root.to_path_buf()));
        }

        let mut archive = Archive::new();
        for entry in WalkDir::new(root).min_depth(1) {
            let entry = entry.map_err(std::io::Error::from)?;
            let relative = entry
                .path()
                .strip_prefix(root)
                .map_err(|_| ArchiveError::UnsafePath(entry.path().display().to_string()))?;
            let name = relative_name(relative);

            if entry.file_type().is_dir() {
                archive.insert_dir(name);
            } else if entry.file_type().is_file() {
                let bytes = std::fs::read(entry.path())?;
                archive.insert_file(name, bytes);
            }
            // Anything else (symlinks, sockets) is outside the format.
        }

        debug!("Bundled {} entries from {}", archive.len(), root.display());
        Ok(archive)
    }

    /// Extract every entry into `dest`, creating parent directories as
    /// needed.
    ///
    /// A partially-written destination after a mid-extraction failure is
    /// not rolled back; the caller wipes the destination before calling
    /// and treats a failed extraction as unusable.
    pub fn extract_to(&self, dest: &Path) -> Result<(), ArchiveError> {
        for (name, entry) in &self.entries {
            validate_entry_name(name)?;
            let target = dest.join(name.trim_end_matches('/'));
            match entry {
                Entry::Dir => std::fs::create_dir_all(&target)?,
                Entry::File(bytes) => {
                    if let Some(parent) = target.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&target, bytes)?;
                }
            }
        }

        debug!("Extracted {} entries into {}", self.len(), dest.display());
        Ok(())
    }

    /// Materialize the archive as gzip-compressed tar bytes at maximum
    /// compression effort, for transport or disk.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ArchiveError> {
        let encoder = GzEncoder::new(Vec::new(), Compression::best());
        let mut builder = tar::Builder::new(encoder);

        for (name, entry) in &self.entries {
            let mut header = tar::Header::new_gnu();
            match entry {
                Entry::Dir => {
                    header.set_entry_type(tar::EntryType::Directory);
                    header.set_size(0);
                    header.set_mode(0o755);
                    header.set_cksum();
                    builder.append_data(&mut header, name, std::io::empty())?;
                }
                Entry::File(bytes) => {
                    header.set_size(bytes.len() as u64);
                    header.set_mode(0o644);
                    header.set_cksum();
                    builder.append_data(&mut header, name, bytes.as_slice())?;
                }
            }
        }

        let encoder = builder.into_inner()?;
        Ok(encoder.finish()?)
    }

    /// Load an archive from gzip-compressed tar bytes.
    ///
    /// Entry paths are validated before being admitted: absolute paths and
    /// `..` components are rejected, as are entry types other than regular
    /// files and directories.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArchiveError> {
        let decoder = GzDecoder::new(bytes);
        let mut reader = tar::Archive::new(decoder);

        let mut archive = Archive::new();
        for entry in reader.entries()? {
            let mut entry = entry?;
            let path = entry.path()?.into_owned();
            let name = relative_name(&path);
            validate_entry_name(&name)?;

            match entry.header().entry_type() {
                tar::EntryType::Directory => archive.insert_dir(name),
                tar::EntryType::Regular => {
                    let mut bytes = Vec::with_capacity(entry.size() as usize);
                    entry.read_to_end(&mut bytes)?;
                    archive.insert_file(name, bytes);
                }
                other => {
                    return Err(ArchiveError::UnsafeEntry {
                        entry_type: format!("{:?}", other),
                        path: name,
                    });
                }
            }
        }

        Ok(archive)
    }

    /// Load an archive file from disk.
    pub fn from_path(path: &Path) -> Result<Self, ArchiveError> {
        if !path.is_file() {
            return Err(ArchiveError::NotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Graft every entry of `other` into this archive under `prefix`
    /// (e.g. `backend/`), creating the prefix folder entry itself.
    pub fn merge_under(&mut self, prefix: &str, other: &Archive) {
        let prefix = prefix.trim_end_matches('/');
        self.insert_dir(prefix);
        for (name, entry) in &other.entries {
            let merged = format!("{}/{}", prefix, name);
            match entry {
                Entry::Dir => self.insert_dir(merged),
                Entry::File(bytes) => self.insert_file(merged, bytes.clone()),
            }
        }
    }
}

/// Render a filesystem-relative path as a `/`-separated entry name.
fn relative_name(relative: &Path) -> String {
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    parts.join("/")
}

/// Reject entry names that could escape the extraction destination.
fn validate_entry_name(name: &str) -> Result<(), ArchiveError> {
    if name.is_empty() {
        return Err(ArchiveError::UnsafePath(name.to_string()));
    }

    let path = Path::new(name);
    if path.is_absolute() {
        return Err(ArchiveError::UnsafePath(name.to_string()));
    }
    for component in path.components() {
        if matches!(
            component,
            Component::ParentDir | Component::Prefix(_) | Component::RootDir
        ) {
            return Err(ArchiveError::UnsafePath(name.to_string()));
        }
    }
    Ok(())
}
