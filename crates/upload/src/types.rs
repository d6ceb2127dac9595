//! Data types for the upload pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use sitedeploy_assets::{FileRecord, Manifest};

/// A short-lived bearer token scoped to one deployment's asset namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadCredential {
    pub token: String,
}

impl UploadCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

/// A capacity-bounded group of files uploaded in a single call.
///
/// Created by the planner, consumed exactly once by one scheduler worker.
#[derive(Debug)]
pub struct UploadBatch {
    files: Vec<FileRecord>,
    remaining_bytes: u64,
}

impl UploadBatch {
    /// Creates an empty batch with the given byte capacity.
    pub fn new(capacity_bytes: u64) -> Self {
        Self {
            files: Vec::new(),
            remaining_bytes: capacity_bytes,
        }
    }

    /// Whether a file of `size` bytes still fits under both ceilings.
    pub fn fits(&self, size: u64, max_files: usize) -> bool {
        self.remaining_bytes >= size && self.files.len() < max_files
    }

    /// Adds a file, consuming its size from the remaining capacity.
    pub fn push(&mut self, record: FileRecord) {
        self.remaining_bytes = self.remaining_bytes.saturating_sub(record.size);
        self.files.push(record);
    }

    /// Files in this batch, larger first.
    pub fn files(&self) -> &[FileRecord] {
        &self.files
    }

    /// Bytes still available before the batch is full.
    pub fn remaining_bytes(&self) -> u64 {
        self.remaining_bytes
    }

    /// Total byte size of the files placed so far.
    pub fn byte_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Retry policy for batch uploads: linear backoff, fixed attempt ceiling.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum attempts per batch (first attempt included).
    pub max_attempts: u32,
    /// Backoff unit; the n-th retry waits `(n - 1) × base_delay`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay before the n-th retry (1-based): 0s, 1×base, 2×base, …
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        self.base_delay * retry.saturating_sub(1)
    }
}

/// Progress and lifecycle events emitted during a deployment.
#[derive(Debug, Clone)]
pub enum DeployEvent {
    /// Completed-file count advanced (includes files skipped by dedup).
    Progress { completed: u64, total: u64 },
    /// Deployment finished successfully.
    Completed,
    /// Deployment failed.
    Failed { error: String },
    /// The commit bookkeeping call failed; a future deployment may
    /// re-upload, but this run still succeeded.
    CommitStale,
}

/// Result of a successful deployment run.
#[derive(Debug, Clone)]
pub struct DeployOutcome {
    /// Path→fingerprint mapping covering every indexed file.
    pub manifest: Manifest,
    /// Files actually uploaded this run.
    pub uploaded: u64,
    /// Files skipped because the store already held their content.
    pub skipped: u64,
    /// Whether the fingerprint commit succeeded (false = stale bookkeeping).
    pub committed: bool,
}
