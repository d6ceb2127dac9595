//! Content indexing and fingerprinting for static-site deployments.
//!
//! This crate owns the read-only half of the deploy pipeline: walking a
//! local directory tree, fingerprinting every file, enforcing platform
//! limits, and producing the final path→fingerprint manifest. Nothing in
//! here touches the network.

mod fingerprint;
mod indexer;
mod limits;
mod manifest;

pub use fingerprint::{FINGERPRINT_LEN, content_type_for, extension_of, fingerprint_bytes};
pub use indexer::{DeploymentIndex, FileRecord, IGNORED_ENTRIES, index_directory};
pub use limits::PlatformLimits;
pub use manifest::{Manifest, build_manifest};

/// Errors produced while indexing site assets.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file too large: {path} is {size} bytes (max {max})")]
    FileTooLarge { path: String, size: u64, max: u64 },

    #[error("too many files: {count} (max {max})")]
    TooManyFiles { count: usize, max: usize },
}
