//! Platform limits the upload pipeline must honor.

use serde::{Deserialize, Serialize};

/// Hard platform limits for a deployment.
///
/// The defaults mirror the hosting platform's published ceilings. Tests
/// override individual fields to exercise boundary behavior without
/// creating gigabytes of fixture data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformLimits {
    /// Maximum size of a single file in bytes.
    pub max_file_size: u64,
    /// Maximum number of files in one deployment.
    pub max_file_count: usize,
    /// Maximum total byte size of one upload batch.
    pub max_batch_bytes: u64,
    /// Maximum number of files in one upload batch.
    pub max_batch_files: usize,
    /// Concurrent upload workers (also the initial batch count).
    pub concurrency: usize,
    /// Maximum attempts per batch before the run fails.
    pub max_upload_attempts: u32,
}

impl Default for PlatformLimits {
    fn default() -> Self {
        Self {
            max_file_size: 25 * 1024 * 1024,
            max_file_count: 20_000,
            max_batch_bytes: 50 * 1024 * 1024,
            max_batch_files: 5_000,
            concurrency: 3,
            max_upload_attempts: 5,
        }
    }
}
