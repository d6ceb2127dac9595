//! Remote store client trait and wire payload types.
//!
//! `StoreClient` is implemented by the CLI to bridge the upload logic to
//! the actual HTTP transport. Using a trait keeps the pipeline decoupled
//! from the wire format and testable with mocks.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use sitedeploy_assets::FileRecord;

use crate::types::UploadCredential;

/// Errors reported by the remote store or its transport.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The short-lived upload credential is no longer valid.
    #[error("authorization expired")]
    AuthExpired,

    /// The store rejected the call, optionally with a platform error code.
    #[error("remote error: {message}")]
    Remote { code: Option<u32>, message: String },

    /// The call never reached the store.
    #[error("transport error: {0}")]
    Transport(String),
}

impl StoreError {
    /// Whether this failure means the credential must be refreshed.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthExpired)
    }

    /// Remote error code, if the store reported one.
    pub fn code(&self) -> Option<u32> {
        match self {
            Self::Remote { code, .. } => *code,
            _ => None,
        }
    }
}

/// Metadata attached to one uploaded asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadMetadata {
    #[serde(rename = "contentType")]
    pub content_type: String,
}

/// Wire form of one file within a batch upload call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPayload {
    /// Content fingerprint — the remote storage key.
    pub key: String,
    /// Base64-encoded file contents.
    pub value: String,
    pub metadata: PayloadMetadata,
    /// Always `true`; tells the store `value` is base64.
    pub base64: bool,
}

impl AssetPayload {
    /// Builds the wire payload for one indexed file.
    pub fn from_record(record: &FileRecord) -> Self {
        Self {
            key: record.fingerprint.clone(),
            value: BASE64.encode(&record.bytes),
            metadata: PayloadMetadata {
                content_type: record.content_type.to_string(),
            },
            base64: true,
        }
    }
}

/// Abstract connection to the remote asset store.
///
/// Implementations must not borrow the argument references inside the
/// returned future — clone what the call needs up front (the futures may
/// only borrow `self`).
pub trait StoreClient: Send + Sync {
    /// Returns the subset of `fingerprints` the store does not yet hold.
    fn check_missing(
        &self,
        fingerprints: &HashSet<String>,
    ) -> Pin<Box<dyn Future<Output = Result<HashSet<String>, StoreError>> + Send + '_>>;

    /// Uploads one batch of assets.
    fn upload_batch(
        &self,
        credential: &UploadCredential,
        files: &[AssetPayload],
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>>;

    /// Obtains a fresh short-lived credential scoped to this deployment.
    fn fetch_credential(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<UploadCredential, StoreError>> + Send + '_>>;

    /// Marks the given fingerprints as referenced by this deployment.
    fn commit_fingerprints(
        &self,
        credential: &UploadCredential,
        fingerprints: &HashSet<String>,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>>;
}
