//! Worker loop: one tick reaps stale items, then publishes due ones.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::protocol::{StoryRequest, publish_story};
use super::{PRUNE_INTERVAL, STALE_PROCESSING_ERROR, WorkerConfig};
use crate::catalog::CatalogStore;
use crate::observability::Metrics;
use crate::platform::{PublishCredentials, PublishPlatform};
use crate::queue::{PublishQueue, QueueError, QueueItem};
use crate::schedule::calendar::now_ms;

/// What a single tick did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub reaped: usize,
    pub pruned: usize,
    pub claimed: usize,
    pub published: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct PublishWorker {
    queue: PublishQueue,
    catalog: CatalogStore,
    platform: Arc<dyn PublishPlatform>,
    metrics: Arc<Metrics>,
    config: WorkerConfig,
    /// Used when no base URL setting is stored
    default_base_url: String,
}

impl PublishWorker {
    pub fn new(
        queue: PublishQueue,
        catalog: CatalogStore,
        platform: Arc<dyn PublishPlatform>,
        metrics: Arc<Metrics>,
        config: WorkerConfig,
        default_base_url: String,
    ) -> Self {
        Self {
            queue,
            catalog,
            platform,
            metrics,
            config,
            default_base_url,
        }
    }

    pub async fn run_tick(&self) -> Result<TickReport, QueueError> {
        self.run_tick_at(now_ms()).await
    }

    /// One pass over the queue as of `now_ms`
    ///
    /// Items run one after another; a failing item never stops the batch.
    /// Finished items past retention are pruned at most once per hour.
    pub async fn run_tick_at(&self, now_ms: i64) -> Result<TickReport, QueueError> {
        let mut report = TickReport::default();

        let stale_ms = duration_ms(self.config.stale_after);
        let reaped = self
            .queue
            .fail_stale_processing(now_ms.saturating_sub(stale_ms), STALE_PROCESSING_ERROR)?;
        report.reaped = reaped.len();
        if report.reaped > 0 {
            self.metrics.items_reaped(report.reaped as u64);
        }

        if self.prune_due(now_ms)? {
            let retention_ms = duration_ms(self.config.retention);
            report.pruned = self
                .queue
                .prune_finished(now_ms.saturating_sub(retention_ms), now_ms)?;
        }

        let due = self.queue.due(now_ms, self.config.batch_size)?;
        if due.is_empty() {
            return Ok(report);
        }
        debug!(count = due.len(), "Due queue items");

        for item in due {
            let item = match self.queue.claim(item.id, now_ms) {
                Ok(item) => item,
                Err(QueueError::IllegalTransition { from, .. }) => {
                    debug!(item_id = item.id, status = %from, "Item no longer pending, skipping");
                    continue;
                }
                Err(e) => {
                    error!(item_id = item.id, error = %e, "Failed to claim queue item");
                    continue;
                }
            };
            report.claimed += 1;

            match self.publish_item(&item).await {
                Ok(post_id) => match self.queue.mark_published(item.id, &post_id) {
                    Ok(_) => {
                        report.published += 1;
                        self.metrics.item_published();
                        info!(item_id = item.id, post_id = %post_id, "Queue item published");
                    }
                    Err(e) => {
                        error!(item_id = item.id, post_id = %post_id, error = %e, "Failed to record published item");
                    }
                },
                Err(message) => {
                    report.failed += 1;
                    self.metrics.item_failed();
                    warn!(item_id = item.id, error = %message, "Queue item failed");
                    if let Err(e) = self.queue.mark_failed(item.id, &message) {
                        error!(item_id = item.id, error = %e, "Failed to record failed item");
                    }
                }
            }
        }

        Ok(report)
    }

    fn prune_due(&self, now_ms: i64) -> Result<bool, QueueError> {
        Ok(match self.queue.last_prune_ms()? {
            Some(last) => now_ms.saturating_sub(last) >= duration_ms(PRUNE_INTERVAL),
            None => true,
        })
    }

    /// Publish one claimed item, returning the post id or the error text to store
    async fn publish_item(&self, item: &QueueItem) -> Result<String, String> {
        let credentials = match PublishCredentials::load(&self.catalog, &self.default_base_url) {
            Ok(Some(credentials)) => credentials,
            Ok(None) => return Err("platform not configured".to_string()),
            Err(e) => return Err(e.to_string()),
        };

        let story = StoryRequest {
            image_url: item.image_url.clone(),
            link_url: item.link_url.clone(),
            caption: item.caption.clone(),
        };

        publish_story(
            self.platform.as_ref(),
            &credentials,
            &story,
            self.config.poll,
        )
        .await
        .map_err(|e| e.to_string())
    }

    /// Start the loop; the first tick runs immediately
    pub fn spawn(self) -> WorkerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.tick_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(
                interval_secs = self.config.tick_interval.as_secs(),
                batch_size = self.config.batch_size,
                "Publish worker started"
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.run_tick().await {
                            error!(error = %e, "Publish worker tick failed");
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }

            info!("Publish worker stopped");
        });

        WorkerHandle { shutdown_tx, join }
    }
}

fn duration_ms(duration: std::time::Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// Owns the running worker loop
pub struct WorkerHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    /// Signal the loop and wait for the in-flight tick to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.join.await {
            error!(error = %e, "Publish worker task ended abnormally");
        }
    }
}
