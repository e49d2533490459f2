use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::models::{NewQueueItem, QueueItem, QueueStatus, is_unit_interval};

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Fjall error: {0}")]
    Fjall(#[from] fjall::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Queue item not found: id={0}")]
    NotFound(u64),

    #[error("Queue item {id} cannot move from {from} to {to}")]
    IllegalTransition {
        id: u64,
        from: QueueStatus,
        to: QueueStatus,
    },

    #[error("Invalid queue item: {0}")]
    InvalidItem(String),
}

pub type Result<T> = std::result::Result<T, QueueError>;

const NEXT_SEQ_KEY: &[u8] = b"next_seq";
const LAST_PRUNE_KEY: &[u8] = b"last_prune_ms";

/// Persisted publication queue
///
/// Architecture:
/// - `items` partition: u64 (big-endian) -> QueueItem (JSON)
/// - `metadata` partition: "next_seq" -> u64 (atomic counter),
///   "last_prune_ms" -> i64 (last retention pass)
///
/// Big-endian keys make partition iteration FIFO by id. Every status change
/// runs under `transition_lock`, so two ticks (or a tick and a cancel) can
/// never both move the same item out of `pending`.
#[derive(Clone)]
pub struct PublishQueue {
    keyspace: Keyspace,
    items: PartitionHandle,
    metadata: PartitionHandle,
    seq_counter: Arc<AtomicU64>,
    transition_lock: Arc<Mutex<()>>,
}

impl PublishQueue {
    /// Open or create a queue at the specified path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("Opening PublishQueue at: {}", path.as_ref().display());

        let keyspace = Config::new(path).open()?;

        let items = keyspace.open_partition("items", PartitionCreateOptions::default())?;
        let metadata = keyspace.open_partition("metadata", PartitionCreateOptions::default())?;

        let current_seq = metadata
            .get(NEXT_SEQ_KEY)?
            .map(|bytes| u64::from_be_bytes(bytes.as_ref().try_into().unwrap_or([0u8; 8])))
            .unwrap_or(0);

        info!("PublishQueue opened, current sequence: {}", current_seq);

        Ok(Self {
            keyspace,
            items,
            metadata,
            seq_counter: Arc::new(AtomicU64::new(current_seq)),
            transition_lock: Arc::new(Mutex::new(())),
        })
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.transition_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Persist a new pending item and return it with its assigned id
    ///
    /// The item and the advanced counter are written in one batch.
    pub fn enqueue(&self, input: NewQueueItem, now_ms: i64) -> Result<QueueItem> {
        if input.image_url.trim().is_empty() {
            return Err(QueueError::InvalidItem("imageUrl is required".into()));
        }
        if input.link_url.trim().is_empty() {
            return Err(QueueError::InvalidItem("linkUrl is required".into()));
        }
        let (sticker_x, sticker_y) = input.sticker_position();
        if !is_unit_interval(sticker_x) || !is_unit_interval(sticker_y) {
            return Err(QueueError::InvalidItem(
                "link sticker coordinates must be within [0, 1]".into(),
            ));
        }

        let seq = self.seq_counter.fetch_add(1, Ordering::SeqCst);
        let item = QueueItem {
            id: seq,
            image_url: input.image_url,
            link_url: input.link_url,
            link_sticker_x: sticker_x,
            link_sticker_y: sticker_y,
            caption: input.caption.filter(|caption| !caption.trim().is_empty()),
            scheduled_at: input.scheduled_at,
            status: QueueStatus::Pending,
            platform_post_id: None,
            error: None,
            created_at: now_ms,
            processing_started_at: None,
        };

        let mut batch = self.keyspace.batch();
        batch.insert(&self.items, seq.to_be_bytes(), serde_json::to_vec(&item)?);
        batch.insert(&self.metadata, NEXT_SEQ_KEY, (seq + 1).to_be_bytes());
        batch.commit()?;

        debug!(item_id = seq, scheduled_at = item.scheduled_at, "Queue item enqueued");
        Ok(item)
    }

    pub fn get(&self, id: u64) -> Result<Option<QueueItem>> {
        match self.items.get(id.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// All items ordered by `scheduled_at`, then id
    pub fn list(&self) -> Result<Vec<QueueItem>> {
        let mut items = self.scan()?;
        items.sort_by(|a, b| a.scheduled_at.cmp(&b.scheduled_at).then_with(|| a.id.cmp(&b.id)));
        Ok(items)
    }

    /// Pending items whose time has come, FIFO by id, at most `limit`
    pub fn due(&self, now_ms: i64, limit: usize) -> Result<Vec<QueueItem>> {
        let mut due = Vec::new();
        for entry in self.items.iter() {
            if due.len() >= limit {
                break;
            }
            let (_, value) = entry?;
            let item: QueueItem = serde_json::from_slice(&value)?;
            if item.status == QueueStatus::Pending && item.scheduled_at <= now_ms {
                due.push(item);
            }
        }
        Ok(due)
    }

    /// pending -> processing
    pub fn claim(&self, id: u64, now_ms: i64) -> Result<QueueItem> {
        self.transition(id, QueueStatus::Processing, |item| {
            item.processing_started_at = Some(now_ms);
        })
    }

    /// processing -> published
    pub fn mark_published(&self, id: u64, post_id: &str) -> Result<QueueItem> {
        self.transition(id, QueueStatus::Published, |item| {
            item.platform_post_id = Some(post_id.to_string());
            item.error = None;
        })
    }

    /// processing -> failed
    pub fn mark_failed(&self, id: u64, error: &str) -> Result<QueueItem> {
        self.transition(id, QueueStatus::Failed, |item| {
            item.error = Some(error.to_string());
        })
    }

    /// pending -> cancelled
    pub fn cancel(&self, id: u64) -> Result<QueueItem> {
        self.transition(id, QueueStatus::Cancelled, |_| {})
    }

    /// Fail every item that entered `processing` before `cutoff_ms`
    pub fn fail_stale_processing(&self, cutoff_ms: i64, error: &str) -> Result<Vec<QueueItem>> {
        let stale: Vec<u64> = self
            .scan()?
            .into_iter()
            .filter(|item| {
                item.status == QueueStatus::Processing
                    && item.processing_started_at.unwrap_or(item.created_at) < cutoff_ms
            })
            .map(|item| item.id)
            .collect();

        let mut reaped = Vec::with_capacity(stale.len());
        for id in stale {
            match self.mark_failed(id, error) {
                Ok(item) => reaped.push(item),
                // Finished between the scan and the transition
                Err(QueueError::IllegalTransition { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        if !reaped.is_empty() {
            warn!(count = reaped.len(), "Failed stale processing items");
        }
        Ok(reaped)
    }

    /// Delete finished (published, failed, cancelled) items scheduled before `cutoff_ms`
    ///
    /// Pending and processing items are never removed. Records `now_ms` as the
    /// last prune time.
    pub fn prune_finished(&self, cutoff_ms: i64, now_ms: i64) -> Result<usize> {
        let _guard = self.lock();
        let expired: Vec<u64> = self
            .scan()?
            .into_iter()
            .filter(|item| item.status.is_terminal() && item.scheduled_at < cutoff_ms)
            .map(|item| item.id)
            .collect();

        let mut batch = self.keyspace.batch();
        for id in &expired {
            batch.remove(&self.items, id.to_be_bytes());
        }
        batch.insert(&self.metadata, LAST_PRUNE_KEY, now_ms.to_be_bytes());
        batch.commit()?;

        if !expired.is_empty() {
            info!(count = expired.len(), cutoff_ms, "Pruned finished queue items");
        }
        Ok(expired.len())
    }

    pub fn last_prune_ms(&self) -> Result<Option<i64>> {
        Ok(self
            .metadata
            .get(LAST_PRUNE_KEY)?
            .and_then(|bytes| bytes.as_ref().try_into().ok().map(i64::from_be_bytes)))
    }

    fn transition<F>(&self, id: u64, to: QueueStatus, apply: F) -> Result<QueueItem>
    where
        F: FnOnce(&mut QueueItem),
    {
        let _guard = self.lock();
        let mut item = self.get(id)?.ok_or(QueueError::NotFound(id))?;

        if !item.status.can_transition_to(to) {
            return Err(QueueError::IllegalTransition {
                id,
                from: item.status,
                to,
            });
        }

        item.status = to;
        apply(&mut item);
        self.items.insert(id.to_be_bytes(), serde_json::to_vec(&item)?)?;

        debug!(item_id = id, status = %to, "Queue item transitioned");
        Ok(item)
    }

    fn scan(&self) -> Result<Vec<QueueItem>> {
        let mut items = Vec::new();
        for entry in self.items.iter() {
            let (_, value) = entry?;
            items.push(serde_json::from_slice(&value)?);
        }
        Ok(items)
    }

    /// Get current sequence counter value
    pub fn current_seq(&self) -> u64 {
        self.seq_counter.load(Ordering::SeqCst)
    }

    /// Flush all writes to disk
    pub fn flush(&self) -> Result<()> {
        self.keyspace.persist(fjall::PersistMode::SyncAll)?;
        Ok(())
    }

    /// Health check - verify database is accessible
    pub fn health_check(&self) -> Result<()> {
        let _ = self.metadata.get(NEXT_SEQ_KEY)?;
        Ok(())
    }
}
