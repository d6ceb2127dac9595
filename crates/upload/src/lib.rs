//! Bulk asset upload pipeline for site deployments.
//!
//! This crate implements the **business logic** for pushing a fingerprinted
//! asset index to the remote store. It is a library crate with no transport
//! dependencies — the caller provides a [`StoreClient`] implementation that
//! bridges to the actual wire protocol.
//!
//! # Pipeline
//!
//! 1. **Index** — walk the site directory and fingerprint every file
//! 2. **Dedup** — ask the store which fingerprints it is missing
//! 3. **Plan** — pack the upload set into size/count-bounded batches
//! 4. **Schedule** — drain batches with bounded concurrency, retry, and
//!    credential refresh
//! 5. **Finalize** — commit the fingerprint set and return the manifest

pub mod client;
pub mod deploy;
pub mod error;
pub mod finalize;
pub mod planner;
pub mod progress;
pub mod scheduler;
pub mod types;

// Re-export primary types for convenience.
pub use client::{AssetPayload, PayloadMetadata, StoreClient, StoreError};
pub use deploy::Deployer;
pub use error::UploadError;
pub use finalize::CommitOutcome;
pub use planner::plan_batches;
pub use progress::ProgressReporter;
pub use scheduler::{CredentialHandle, UploadScheduler};
pub use types::{DeployEvent, DeployOutcome, RetryPolicy, UploadBatch, UploadCredential};
