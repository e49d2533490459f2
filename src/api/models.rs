//! Request and response bodies of the HTTP API.
//!
//! Domain types (collections, assets, slots, queue items, generation
//! results) are serialized as they are; this module only holds the
//! envelopes around them. Everything on the wire is camelCase.
//!
//! Confirming a generated schedule (as JSON):
//!
//! ```json
//! {
//!   "days": [
//!     {
//!       "date": "2026-03-01",
//!       "items": [{ "slotId": "s1", "slotTime": "09:00", "isPrime": true, "...": "..." }],
//!       "warnings": []
//!     }
//!   ],
//!   "enqueue": true,
//!   "captionSource": "commercial"
//! }
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::observability::MetricsSnapshot;
use crate::schedule::{CaptionSource, GenerationResult};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub components: HashMap<String, String>,
    pub version: String,
    pub metrics: MetricsSnapshot,
}

/// Plain acknowledgement for writes that return nothing else
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetUpdateRequest {
    pub description: Option<String>,
    /// Absent leaves it alone, `null` clears it
    #[serde(default, deserialize_with = "present")]
    pub last_used: Option<Option<i64>>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmRequest {
    pub days: Vec<GenerationResult>,
    #[serde(default)]
    pub enqueue: bool,
    #[serde(default)]
    pub caption_source: CaptionSource,
}

#[derive(Debug, Deserialize)]
pub struct CtaRequest {
    #[serde(default)]
    pub current: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CtaResponse {
    pub cta: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueResponse {
    pub queue_id: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub link_url: String,
    pub caption: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    pub success: bool,
    pub post_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PlatformConfigResponse {
    pub configured: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRefreshResponse {
    pub success: bool,
    pub new_token: String,
    pub expires_in_days: u64,
}

#[derive(Debug, Deserialize)]
pub struct SettingRequest {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SettingResponse {
    pub value: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UrlUploadRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UrlUploadResponse {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SentLogCreated {
    pub id: u64,
}
