//! Deploy orchestrator: runs the full pipeline against one store.
//!
//! Index → dedup → plan → schedule → finalize, with progress events and
//! cancellation support.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use sitedeploy_assets::{FileRecord, PlatformLimits, build_manifest, index_directory};

use crate::client::StoreClient;
use crate::error::UploadError;
use crate::finalize::{self, CommitOutcome};
use crate::planner::plan_batches;
use crate::scheduler::{CredentialHandle, UploadScheduler};
use crate::types::{DeployEvent, DeployOutcome, RetryPolicy};

/// Orchestrates one deployment run.
pub struct Deployer {
    client: Arc<dyn StoreClient>,
    limits: PlatformLimits,
    retry: RetryPolicy,
    events_tx: mpsc::Sender<DeployEvent>,
    events_rx: Option<mpsc::Receiver<DeployEvent>>,
    cancel: CancellationToken,
}

impl Deployer {
    /// Creates a deployer for the given store and platform limits.
    pub fn new(client: Arc<dyn StoreClient>, limits: PlatformLimits) -> Self {
        let (events_tx, events_rx) = mpsc::channel(256);
        Self {
            client,
            limits,
            retry: RetryPolicy::default(),
            events_tx,
            events_rx: Some(events_rx),
            cancel: CancellationToken::new(),
        }
    }

    /// Overrides the default retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<DeployEvent>> {
        self.events_rx.take()
    }

    /// Returns a cancellation token for this deployment.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Deploys the directory at `root`, returning the manifest and run
    /// statistics. At most one fatal error surfaces per run.
    pub async fn deploy(&self, root: &Path) -> Result<DeployOutcome, UploadError> {
        match self.run_pipeline(root).await {
            Ok(outcome) => {
                let _ = self.events_tx.try_send(DeployEvent::Completed);
                info!(
                    uploaded = outcome.uploaded,
                    skipped = outcome.skipped,
                    committed = outcome.committed,
                    "deployment complete"
                );
                Ok(outcome)
            }
            Err(e) => {
                let _ = self.events_tx.try_send(DeployEvent::Failed {
                    error: e.to_string(),
                });
                error!(error = %e, "deployment failed");
                Err(e)
            }
        }
    }

    async fn run_pipeline(&self, root: &Path) -> Result<DeployOutcome, UploadError> {
        self.check_cancelled()?;

        // 1. Index — pre-flight limits are enforced here, before any
        //    network call.
        let index = index_directory(root, &self.limits)?;
        let manifest = build_manifest(&index);
        let total = index.len() as u64;
        info!(files = total, "indexed site directory");

        // 2. Dedup — a failure here is fatal; there is nothing useful to
        //    upload without knowing what's missing.
        self.check_cancelled()?;
        let all_fingerprints: HashSet<String> =
            index.values().map(|r| r.fingerprint.clone()).collect();
        let missing = self
            .client
            .check_missing(&all_fingerprints)
            .await
            .map_err(UploadError::DedupCheck)?;

        let upload_set: Vec<FileRecord> = index
            .values()
            .filter(|r| missing.contains(&r.fingerprint))
            .cloned()
            .collect();
        let uploaded = upload_set.len() as u64;
        let skipped = total - uploaded;
        debug!(uploading = uploaded, skipped, "dedup check complete");

        // 3. Plan.
        let batches = plan_batches(upload_set, &self.limits);

        // 4. Schedule. The credential is fetched up front even when the
        //    upload set is empty — the commit call still needs it.
        self.check_cancelled()?;
        let credential = CredentialHandle::new(
            self.client
                .fetch_credential()
                .await
                .map_err(UploadError::Credential)?,
        );

        let completed = Arc::new(AtomicU64::new(skipped));
        let _ = self.events_tx.try_send(DeployEvent::Progress {
            completed: skipped,
            total,
        });

        let scheduler = UploadScheduler::new(
            Arc::clone(&self.client),
            credential.clone(),
            self.retry.clone(),
            self.limits.concurrency,
            self.cancel.clone(),
        );
        scheduler
            .run(batches, completed, total, self.events_tx.clone())
            .await?;

        // 5. Finalize — degraded commit is a warning, not a failure.
        self.check_cancelled()?;
        let committed = match finalize::commit_fingerprints(
            self.client.as_ref(),
            &credential,
            &all_fingerprints,
        )
        .await
        {
            CommitOutcome::Committed => true,
            CommitOutcome::Stale => {
                warn!("deployment succeeded with stale commit bookkeeping");
                let _ = self.events_tx.try_send(DeployEvent::CommitStale);
                false
            }
        };

        Ok(DeployOutcome {
            manifest,
            uploaded,
            skipped,
            committed,
        })
    }

    fn check_cancelled(&self) -> Result<(), UploadError> {
        if self.cancel.is_cancelled() {
            Err(UploadError::Cancelled)
        } else {
            Ok(())
        }
    }
}
