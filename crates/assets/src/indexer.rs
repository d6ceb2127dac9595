//! File indexing for upload.
//!
//! Recursively walks a directory and produces one fingerprinted record
//! per file, with relative paths normalized to forward slashes. The walk
//! is read-only and runs before any network activity.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::AssetError;
use crate::fingerprint::{content_type_for, extension_of, fingerprint_bytes};
use crate::limits::PlatformLimits;

/// Well-known entries never included in a deployment.
pub const IGNORED_ENTRIES: &[&str] = &[".git", ".DS_Store", "node_modules", "Thumbs.db"];

/// One indexed file, keyed by its logical path within the deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// POSIX-style relative path, `/`-separated on every platform.
    pub logical_path: String,
    /// Raw file contents, read once during indexing.
    pub bytes: Vec<u8>,
    /// File size in bytes.
    pub size: u64,
    /// MIME type inferred from the extension.
    pub content_type: &'static str,
    /// Content fingerprint (dedup and storage key).
    pub fingerprint: String,
}

/// Mapping from logical path to [`FileRecord`], immutable once built.
pub type DeploymentIndex = BTreeMap<String, FileRecord>;

/// Walks `root` and builds the deployment index.
///
/// Symbolic links are never followed. An oversized file, an unreadable
/// file, or a deployment exceeding the file-count ceiling aborts the
/// whole operation before anything is uploaded.
pub fn index_directory(
    root: &Path,
    limits: &PlatformLimits,
) -> Result<DeploymentIndex, AssetError> {
    let mut index = BTreeMap::new();
    walk_dir(root, root, limits, &mut index)?;

    if index.len() > limits.max_file_count {
        return Err(AssetError::TooManyFiles {
            count: index.len(),
            max: limits.max_file_count,
        });
    }

    debug!(files = index.len(), "indexed deployment directory");
    Ok(index)
}

fn walk_dir(
    root: &Path,
    current: &Path,
    limits: &PlatformLimits,
    index: &mut DeploymentIndex,
) -> Result<(), AssetError> {
    for entry in std::fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();

        let name = entry.file_name();
        if let Some(name) = name.to_str()
            && IGNORED_ENTRIES.contains(&name)
        {
            continue;
        }

        // symlink_metadata so links are visible and never followed.
        let metadata = std::fs::symlink_metadata(&path)?;
        if metadata.file_type().is_symlink() {
            continue;
        }

        if metadata.is_dir() {
            walk_dir(root, &path, limits, index)?;
        } else if metadata.is_file() {
            let rel_path = path.strip_prefix(root).map_err(std::io::Error::other)?;
            let rel_str = rel_path.to_string_lossy().replace('\\', "/");

            let size = metadata.len();
            if size > limits.max_file_size {
                return Err(AssetError::FileTooLarge {
                    path: rel_str,
                    size,
                    max: limits.max_file_size,
                });
            }

            let bytes = std::fs::read(&path)?;
            let extension = extension_of(&rel_str).to_string();
            let fingerprint = fingerprint_bytes(&bytes, &extension);

            index.insert(
                rel_str.clone(),
                FileRecord {
                    logical_path: rel_str,
                    size,
                    content_type: content_type_for(&extension),
                    fingerprint,
                    bytes,
                },
            );
        }
    }

    Ok(())
}
