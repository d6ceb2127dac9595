//! Concurrent batch upload scheduling.
//!
//! A bounded pool of workers drains a shared batch queue. Each worker
//! retries failed uploads with linear backoff, refreshing the shared
//! credential when the store signals expiry. The first permanently failed
//! batch latches a fatal error: no new batches are dispatched, in-flight
//! siblings finish naturally, and `run` returns after every worker has
//! joined.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::{AssetPayload, StoreClient};
use crate::error::UploadError;
use crate::types::{DeployEvent, RetryPolicy, UploadBatch, UploadCredential};

/// Atomically swappable credential handle shared by all workers.
///
/// Readers always see a complete token; whichever worker observes expiry
/// first replaces the whole value. Redundant refreshes from concurrent
/// workers are tolerated — last writer wins.
#[derive(Clone)]
pub struct CredentialHandle {
    inner: Arc<RwLock<UploadCredential>>,
}

impl CredentialHandle {
    pub fn new(credential: UploadCredential) -> Self {
        Self {
            inner: Arc::new(RwLock::new(credential)),
        }
    }

    /// Returns the current credential.
    pub fn current(&self) -> UploadCredential {
        self.inner.read().unwrap().clone()
    }

    /// Replaces the credential wholesale.
    pub fn replace(&self, fresh: UploadCredential) {
        *self.inner.write().unwrap() = fresh;
    }
}

/// Shared state handed to each scheduler worker. Avoids threading eight
/// separate Arc parameters through every call.
#[derive(Clone)]
struct WorkerContext {
    client: Arc<dyn StoreClient>,
    credential: CredentialHandle,
    retry: RetryPolicy,
    queue: Arc<Mutex<VecDeque<UploadBatch>>>,
    completed: Arc<AtomicU64>,
    total: u64,
    events_tx: mpsc::Sender<DeployEvent>,
    fatal: Arc<Mutex<Option<UploadError>>>,
    latch: CancellationToken,
    cancel: CancellationToken,
}

/// Drives a set of planned batches to completion with bounded concurrency.
pub struct UploadScheduler {
    client: Arc<dyn StoreClient>,
    credential: CredentialHandle,
    retry: RetryPolicy,
    concurrency: usize,
    cancel: CancellationToken,
}

impl UploadScheduler {
    pub fn new(
        client: Arc<dyn StoreClient>,
        credential: CredentialHandle,
        retry: RetryPolicy,
        concurrency: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            credential,
            retry,
            concurrency,
            cancel,
        }
    }

    /// Uploads all batches; returns once every dispatched worker has
    /// completed or the fatal path has been taken.
    ///
    /// `completed` is the shared finished-file counter (pre-seeded with
    /// the dedup-skipped count) and `total` the overall file count, both
    /// feeding fire-and-forget progress events.
    pub async fn run(
        &self,
        batches: Vec<UploadBatch>,
        completed: Arc<AtomicU64>,
        total: u64,
        events_tx: mpsc::Sender<DeployEvent>,
    ) -> Result<(), UploadError> {
        if batches.is_empty() {
            debug!("no batches to upload, scheduler already idle");
            return Ok(());
        }

        let workers = self.concurrency.min(batches.len()).max(1);
        let ctx = WorkerContext {
            client: Arc::clone(&self.client),
            credential: self.credential.clone(),
            retry: self.retry.clone(),
            queue: Arc::new(Mutex::new(batches.into())),
            completed,
            total,
            events_tx,
            fatal: Arc::new(Mutex::new(None)),
            latch: CancellationToken::new(),
            cancel: self.cancel.clone(),
        };

        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            handles.push(tokio::spawn(worker_loop(ctx.clone())));
        }
        // Barrier: the scheduler does not return until every worker exits.
        for handle in handles {
            let _ = handle.await;
        }

        if let Some(err) = ctx.fatal.lock().unwrap().take() {
            return Err(err);
        }
        if self.cancel.is_cancelled() && !ctx.queue.lock().unwrap().is_empty() {
            return Err(UploadError::Cancelled);
        }
        Ok(())
    }
}

async fn worker_loop(ctx: WorkerContext) {
    loop {
        // The latch stops new dispatch; the current batch (if any) has
        // already been allowed to finish by this point.
        if ctx.latch.is_cancelled() || ctx.cancel.is_cancelled() {
            break;
        }

        let Some(batch) = ctx.queue.lock().unwrap().pop_front() else {
            break;
        };

        let files_in_batch = batch.len() as u64;
        match upload_with_retry(&ctx, &batch).await {
            Ok(()) => {
                let done = ctx.completed.fetch_add(files_in_batch, Ordering::SeqCst)
                    + files_in_batch;
                // try_send: a slow display must not serialize workers.
                let _ = ctx.events_tx.try_send(DeployEvent::Progress {
                    completed: done,
                    total: ctx.total,
                });
            }
            Err(err) => {
                if !matches!(err, UploadError::Cancelled) {
                    warn!(error = %err, files = files_in_batch, "batch permanently failed");
                }
                let mut fatal = ctx.fatal.lock().unwrap();
                // Keep the first fatal error; later failures add nothing.
                if fatal.is_none() {
                    *fatal = Some(err);
                }
                drop(fatal);
                ctx.latch.cancel();
                break;
            }
        }
    }
}

/// Uploads one batch, retrying with linear backoff up to the attempt
/// ceiling and refreshing the shared credential on expiry.
async fn upload_with_retry(ctx: &WorkerContext, batch: &UploadBatch) -> Result<(), UploadError> {
    let payload: Vec<AssetPayload> = batch
        .files()
        .iter()
        .map(AssetPayload::from_record)
        .collect();

    let mut attempt = 0u32;
    loop {
        attempt += 1;
        let credential = ctx.credential.current();
        let err = match ctx.client.upload_batch(&credential, &payload).await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        if attempt >= ctx.retry.max_attempts {
            return Err(UploadError::BatchFailed {
                attempts: attempt,
                source: err,
            });
        }

        if err.is_auth_expired() {
            // Concurrent workers may refresh redundantly; that is
            // harmless and cheaper than a refresh lock.
            match ctx.client.fetch_credential().await {
                Ok(fresh) => {
                    debug!("upload credential refreshed");
                    ctx.credential.replace(fresh);
                }
                Err(e) => warn!(error = %e, "credential refresh failed"),
            }
        }

        let delay = ctx.retry.delay_for_retry(attempt);
        warn!(
            attempt,
            delay_secs = delay.as_secs_f64(),
            error = %err,
            "batch upload failed, retrying"
        );
        tokio::select! {
            _ = ctx.cancel.cancelled() => return Err(UploadError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
