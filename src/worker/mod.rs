//! Publish worker service
//!
//! Background loop that picks due queue items, drives the three-step
//! platform protocol for each one and writes the terminal status back.

pub mod protocol;
pub mod runner;

pub use protocol::{PollPolicy, PublishError, StoryRequest, publish_story};
pub use runner::{PublishWorker, TickReport, WorkerHandle};

use bon::Builder;
use std::time::Duration;

/// Minimum time between two retention passes
pub const PRUNE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Error recorded on items the reaper fails
pub const STALE_PROCESSING_ERROR: &str =
    "publish interrupted: item was left processing past the stale threshold";

/// Worker configuration
///
/// Tick interval, batch size and poll policy are fixed in production; tests
/// build shorter ones.
#[derive(Debug, Clone, Builder)]
pub struct WorkerConfig {
    #[builder(default = Duration::from_secs(30))]
    pub tick_interval: Duration,
    /// Items claimed per tick
    #[builder(default = 5)]
    pub batch_size: usize,
    #[builder(default)]
    pub poll: PollPolicy,
    /// Processing items older than this are failed
    #[builder(default = Duration::from_secs(15 * 60))]
    pub stale_after: Duration,
    /// Finished items scheduled longer ago than this are deleted
    #[builder(default = Duration::from_secs(30 * 24 * 60 * 60))]
    pub retention: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
