use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{FixedOffset, Offset, Utc};
use tracing::info;

use storydesk::api::{AppState, build_router, serve};
use storydesk::catalog::CatalogStore;
use storydesk::config::Config;
use storydesk::observability::Metrics;
use storydesk::platform::{GraphClient, PublishPlatform};
use storydesk::queue::PublishQueue;
use storydesk::schedule::{RangeRequest, generate_from_catalog};
use storydesk::storage::ImageStore;
use storydesk::worker::{PublishWorker, WorkerConfig};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

fn offset(config: &Config) -> FixedOffset {
    config.schedule.offset().unwrap_or_else(|| Utc.fix())
}

/// Open the stores, start the worker and serve the API until shutdown
pub async fn run(config: Config, address: Option<SocketAddr>) -> Result<(), AnyError> {
    let address = address.unwrap_or(config.server.bind_addr);

    info!(path = %config.server.catalog_path().display(), "Opening catalog");
    let catalog = CatalogStore::open(config.server.catalog_path())?;

    info!(path = %config.server.queue_path().display(), "Opening publish queue");
    let queue = PublishQueue::open(config.server.queue_path())?;

    let images = ImageStore::local(
        &config.storage.uploads_dir,
        config.storage.max_upload_bytes.as_u64(),
    )?;
    let platform: Arc<dyn PublishPlatform> = Arc::new(GraphClient::new(&config.platform)?);
    let metrics = Arc::new(Metrics::new());

    let worker = if config.worker.enabled {
        let worker_config = WorkerConfig::builder()
            .stale_after(config.worker.stale_processing_after.as_duration())
            .retention(config.worker.queue_retention.as_duration())
            .build();
        let worker = PublishWorker::new(
            queue.clone(),
            catalog.clone(),
            platform.clone(),
            metrics.clone(),
            worker_config,
            config.server.public_base_url.clone(),
        );
        Some(worker.spawn())
    } else {
        info!("Publish worker disabled");
        None
    };

    let state = AppState::new(
        config,
        catalog.clone(),
        queue.clone(),
        images,
        platform,
        metrics,
    );
    let served = serve(build_router(state), address).await;

    if let Some(worker) = worker {
        worker.shutdown().await;
    }
    catalog.persist()?;
    queue.flush()?;
    info!("Shutdown complete");

    served
}

/// `storydesk generate`: print a draft from the local catalog
pub fn print_schedule(config: &Config, start: &str, end: &str) -> Result<(), AnyError> {
    let range = RangeRequest::parse(start, end, config.schedule.max_range_days)?;
    let catalog = CatalogStore::open(config.server.catalog_path())?;

    let days = generate_from_catalog(&catalog, &range, offset(config), &mut rand::thread_rng())?;
    println!("{}", serde_json::to_string_pretty(&days)?);
    Ok(())
}
