//! Upload pipeline error types.

use crate::client::StoreError;

/// Errors that terminate a deployment run.
///
/// The caller sees at most one of these per run, carrying the most
/// specific available cause (and the remote error code, when the store
/// reported one, inside the [`StoreError`] source).
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("asset error: {0}")]
    Asset(#[from] sitedeploy_assets::AssetError),

    #[error("dedup check failed: {0}")]
    DedupCheck(#[source] StoreError),

    #[error("credential fetch failed: {0}")]
    Credential(#[source] StoreError),

    #[error("batch upload failed after {attempts} attempts: {source}")]
    BatchFailed {
        attempts: u32,
        #[source]
        source: StoreError,
    },

    #[error("cancelled")]
    Cancelled,
}

impl UploadError {
    /// Remote error code attached to the failure, if the store reported one.
    pub fn remote_code(&self) -> Option<u32> {
        match self {
            Self::DedupCheck(e) | Self::Credential(e) | Self::BatchFailed { source: e, .. } => {
                e.code()
            }
            _ => None,
        }
    }
}
