//! Deployment finalization.
//!
//! After all batches land, the store is told which fingerprints this
//! deployment references. The commit is bookkeeping, not payload: a
//! failure after its single retry degrades the run instead of failing it,
//! since the uploaded bytes are content-addressed and a later deployment
//! re-converges on its own.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, warn};

use crate::client::StoreClient;
use crate::scheduler::CredentialHandle;

/// Fixed delay before the single commit retry.
const COMMIT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Outcome of the commit bookkeeping call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The store acknowledged the fingerprint set.
    Committed,
    /// Both attempts failed; remote bookkeeping is stale but the run
    /// still succeeds.
    Stale,
}

/// Commits the full fingerprint set (uploaded + already present),
/// retrying once with credential refresh on expiry.
pub async fn commit_fingerprints(
    client: &dyn StoreClient,
    credential: &CredentialHandle,
    fingerprints: &HashSet<String>,
) -> CommitOutcome {
    let first = match client
        .commit_fingerprints(&credential.current(), fingerprints)
        .await
    {
        Ok(()) => {
            debug!(fingerprints = fingerprints.len(), "deployment committed");
            return CommitOutcome::Committed;
        }
        Err(e) => e,
    };

    warn!(error = %first, "fingerprint commit failed, retrying once");
    tokio::time::sleep(COMMIT_RETRY_DELAY).await;

    if first.is_auth_expired() {
        match client.fetch_credential().await {
            Ok(fresh) => credential.replace(fresh),
            Err(e) => warn!(error = %e, "credential refresh failed"),
        }
    }

    match client
        .commit_fingerprints(&credential.current(), fingerprints)
        .await
    {
        Ok(()) => {
            debug!(fingerprints = fingerprints.len(), "deployment committed on retry");
            CommitOutcome::Committed
        }
        Err(second) => {
            warn!(
                error = %second,
                "fingerprint commit failed again; a future deployment may need to re-upload"
            );
            CommitOutcome::Stale
        }
    }
}
