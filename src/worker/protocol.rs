//! Three-step story publish: create container, wait for it, publish.
//!
//! Shared by the background worker and the immediate publish endpoint.

use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::platform::{
    ContainerRequest, ContainerStatus, PlatformError, PublishCredentials, PublishPlatform,
};
use crate::storage::ImageStore;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("Container {0}")]
    ContainerFailed(String),

    #[error("Timeout: container still processing after {attempts} status checks")]
    Timeout { attempts: u32 },
}

/// How long to wait for a container to finish processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub attempts: u32,
    /// Sleep before every status check
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            attempts: 12,
            interval: Duration::from_secs(3),
        }
    }
}

/// A story as stored: `image_url` may still be a local `/uploads/...` path
#[derive(Debug, Clone, PartialEq)]
pub struct StoryRequest {
    pub image_url: String,
    pub link_url: String,
    pub caption: Option<String>,
}

/// Run the full protocol and return the platform post id
///
/// Status is only checked after the container exists, and publish only
/// happens after a `FINISHED` status.
pub async fn publish_story(
    platform: &dyn PublishPlatform,
    credentials: &PublishCredentials,
    story: &StoryRequest,
    policy: PollPolicy,
) -> Result<String, PublishError> {
    let request = ContainerRequest {
        image_url: ImageStore::public_url(&story.image_url, &credentials.base_url),
        link_url: story.link_url.clone(),
        caption: story.caption.clone().filter(|c| !c.trim().is_empty()),
    };

    let container_id = platform.create_container(credentials, &request).await?;
    debug!(container_id = %container_id, image_url = %request.image_url, "Container submitted");

    wait_until_finished(platform, credentials, &container_id, policy).await?;

    let post_id = platform.publish(credentials, &container_id).await?;
    info!(container_id = %container_id, post_id = %post_id, "Story published");
    Ok(post_id)
}

async fn wait_until_finished(
    platform: &dyn PublishPlatform,
    credentials: &PublishCredentials,
    container_id: &str,
    policy: PollPolicy,
) -> Result<(), PublishError> {
    for attempt in 1..=policy.attempts {
        tokio::time::sleep(policy.interval).await;

        let status = platform.container_status(credentials, container_id).await?;
        debug!(container_id, attempt, status = status.as_code(), "Container status");

        match status {
            ContainerStatus::Finished => return Ok(()),
            status if status.is_failure() => {
                return Err(PublishError::ContainerFailed(status.as_code().to_string()));
            }
            _ => {}
        }
    }

    Err(PublishError::Timeout {
        attempts: policy.attempts,
    })
}
