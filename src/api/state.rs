use std::sync::Arc;

use chrono::{FixedOffset, Offset, Utc};

use crate::catalog::CatalogStore;
use crate::config::Config;
use crate::observability::Metrics;
use crate::platform::PublishPlatform;
use crate::queue::PublishQueue;
use crate::storage::ImageStore;
use crate::worker::PollPolicy;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: CatalogStore,
    pub queue: PublishQueue,
    pub images: ImageStore,
    pub platform: Arc<dyn PublishPlatform>,
    pub metrics: Arc<Metrics>,
    /// Offset for "local" dates, parsed once from `schedule.utc_offset`
    pub offset: FixedOffset,
    /// Container polling for the immediate publish endpoint
    pub poll: PollPolicy,
}

impl AppState {
    pub fn new(
        config: Config,
        catalog: CatalogStore,
        queue: PublishQueue,
        images: ImageStore,
        platform: Arc<dyn PublishPlatform>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let offset = config.schedule.offset().unwrap_or_else(|| Utc.fix());
        Self {
            config: Arc::new(config),
            catalog,
            queue,
            images,
            platform,
            metrics,
            offset,
            poll: PollPolicy::default(),
        }
    }

    pub fn with_poll(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }
}
