//! External publish platform
//!
//! Stories go out through a three-step container protocol:
//! create a media container, poll its status until it is ready, then publish
//! it. `PublishPlatform` is the seam; `GraphClient` talks to the real Graph API
//! and tests point it at a mock server.

pub mod credentials;
pub mod graph;

pub use credentials::{
    AppCredentials, PublishCredentials, SETTING_ACCESS_TOKEN, SETTING_APP_ID, SETTING_APP_SECRET,
    SETTING_BASE_URL, SETTING_USER_ID, TokenRefresh, is_configured, refresh_token,
};
pub use graph::GraphClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::catalog::CatalogError;

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("platform not configured: {0}")]
    NotConfigured(String),

    /// Message reported by the platform itself (`{"error": {"message": ...}}`)
    #[error("{0}")]
    Api(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Unexpected platform response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

pub type Result<T> = std::result::Result<T, PlatformError>;

/// Processing state of a media container
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerStatus {
    InProgress,
    Finished,
    Error,
    Expired,
    /// Any other code; polling continues
    Other(String),
}

impl ContainerStatus {
    /// A missing status code counts as an error
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            None => ContainerStatus::Error,
            Some("IN_PROGRESS") => ContainerStatus::InProgress,
            Some("FINISHED") => ContainerStatus::Finished,
            Some("ERROR") => ContainerStatus::Error,
            Some("EXPIRED") => ContainerStatus::Expired,
            Some(other) => ContainerStatus::Other(other.to_string()),
        }
    }

    pub fn as_code(&self) -> &str {
        match self {
            ContainerStatus::InProgress => "IN_PROGRESS",
            ContainerStatus::Finished => "FINISHED",
            ContainerStatus::Error => "ERROR",
            ContainerStatus::Expired => "EXPIRED",
            ContainerStatus::Other(code) => code,
        }
    }

    /// Error and Expired abort the poll
    pub fn is_failure(&self) -> bool {
        matches!(self, ContainerStatus::Error | ContainerStatus::Expired)
    }
}

/// One story to submit; `image_url` must already be absolute
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerRequest {
    pub image_url: String,
    pub link_url: String,
    pub caption: Option<String>,
}

/// Result of a long-lived token exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenExchange {
    pub access_token: String,
    pub expires_in_secs: u64,
}

#[async_trait]
pub trait PublishPlatform: Send + Sync {
    /// Create a story container, returning its id
    async fn create_container(
        &self,
        credentials: &PublishCredentials,
        request: &ContainerRequest,
    ) -> Result<String>;

    async fn container_status(
        &self,
        credentials: &PublishCredentials,
        container_id: &str,
    ) -> Result<ContainerStatus>;

    /// Publish a finished container, returning the post id
    async fn publish(&self, credentials: &PublishCredentials, container_id: &str)
    -> Result<String>;

    /// Swap a short-lived token for a long-lived one
    async fn exchange_token(
        &self,
        app: &AppCredentials,
        current_token: &str,
    ) -> Result<TokenExchange>;
}
