//! Graph API client

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{
    AppCredentials, ContainerRequest, ContainerStatus, PlatformError, PublishCredentials,
    PublishPlatform, Result, TokenExchange,
};
use crate::config::PlatformConfig;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("storydesk/", env!("CARGO_PKG_VERSION"));

/// `PublishPlatform` over the Graph HTTP API
#[derive(Debug, Clone)]
pub struct GraphClient {
    client: Client,
    graph_url: String,
    api_version: String,
}

impl GraphClient {
    pub fn new(config: &PlatformConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| PlatformError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            graph_url: config.graph_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
        })
    }

    fn versioned(&self, path: &str) -> String {
        format!("{}/{}/{}", self.graph_url, self.api_version, path)
    }
}

fn map_send_error(e: reqwest::Error) -> PlatformError {
    if e.is_timeout() {
        PlatformError::Timeout
    } else {
        PlatformError::RequestFailed(e.to_string())
    }
}

/// Decode a Graph response, surfacing `{"error": {"message"}}` bodies as `Api`
async fn read_json(response: Response) -> Result<Value> {
    let status = response.status();
    let bytes = response
        .bytes()
        .await
        .map_err(|e| PlatformError::RequestFailed(format!("Failed to read body: {}", e)))?;

    let body: Value = match serde_json::from_slice(&bytes) {
        Ok(body) => body,
        Err(_) if !status.is_success() => {
            return Err(PlatformError::Api(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }
        Err(e) => return Err(PlatformError::InvalidResponse(e.to_string())),
    };

    if let Some(error) = body.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(PlatformError::Api(message));
    }

    if !status.is_success() {
        return Err(PlatformError::Api(format!("HTTP {}", status.as_u16())));
    }

    Ok(body)
}

fn string_field(body: &Value, field: &str) -> Result<String> {
    body.get(field)
        .and_then(|value| match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .ok_or_else(|| PlatformError::InvalidResponse(format!("missing '{}' in response", field)))
}

#[async_trait]
impl PublishPlatform for GraphClient {
    async fn create_container(
        &self,
        credentials: &PublishCredentials,
        request: &ContainerRequest,
    ) -> Result<String> {
        let mut form = vec![
            ("image_url", request.image_url.as_str()),
            ("media_type", "STORIES"),
            ("access_token", credentials.access_token.as_str()),
            ("link_sticker_url", request.link_url.as_str()),
        ];
        if let Some(caption) = request.caption.as_deref() {
            form.push(("caption", caption));
        }

        let response = self
            .client
            .post(self.versioned(&format!("{}/media", credentials.user_id)))
            .form(&form)
            .send()
            .await
            .map_err(map_send_error)?;

        let body = read_json(response).await?;
        let container_id = string_field(&body, "id")?;
        debug!(container_id = %container_id, "Container created");
        Ok(container_id)
    }

    async fn container_status(
        &self,
        credentials: &PublishCredentials,
        container_id: &str,
    ) -> Result<ContainerStatus> {
        let response = self
            .client
            .get(self.versioned(container_id))
            .query(&[
                ("fields", "status_code"),
                ("access_token", credentials.access_token.as_str()),
            ])
            .send()
            .await
            .map_err(map_send_error)?;

        let body = read_json(response).await?;
        Ok(ContainerStatus::from_code(
            body.get("status_code").and_then(Value::as_str),
        ))
    }

    async fn publish(
        &self,
        credentials: &PublishCredentials,
        container_id: &str,
    ) -> Result<String> {
        let response = self
            .client
            .post(self.versioned(&format!("{}/media_publish", credentials.user_id)))
            .form(&[
                ("creation_id", container_id),
                ("access_token", credentials.access_token.as_str()),
            ])
            .send()
            .await
            .map_err(map_send_error)?;

        let body = read_json(response).await?;
        string_field(&body, "id")
    }

    async fn exchange_token(
        &self,
        app: &AppCredentials,
        current_token: &str,
    ) -> Result<TokenExchange> {
        let response = self
            .client
            .get(format!("{}/oauth/access_token", self.graph_url))
            .query(&[
                ("grant_type", "fb_exchange_token"),
                ("client_id", app.app_id.as_str()),
                ("client_secret", app.app_secret.as_str()),
                ("fb_exchange_token", current_token),
            ])
            .send()
            .await
            .map_err(map_send_error)?;

        let body = read_json(response).await?;
        Ok(TokenExchange {
            access_token: string_field(&body, "access_token")?,
            expires_in_secs: body.get("expires_in").and_then(Value::as_u64).unwrap_or(0),
        })
    }
}
