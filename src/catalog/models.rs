//! Catalog entities: collections, their assets, daily slots and the
//! campaign sent log.
//!
//! Field names serialize in camelCase; the same JSON shape is used for
//! fjall values and API payloads.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Collection priority, drives generator scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Priority::High => "HIGH",
            Priority::Medium => "MEDIUM",
            Priority::Low => "LOW",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub name: String,
    /// Destination URL shared by every asset in the collection
    pub link: String,
    pub priority: Priority,
    pub enabled: bool,
    /// Epoch ms; list order
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub collection_id: String,
    pub image_url: String,
    #[serde(default)]
    pub description: String,
    /// Local noon (epoch ms) of the last confirmed day this asset ran
    pub last_used: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionWithAssets {
    #[serde(flatten)]
    pub collection: Collection,
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: String,
    /// Zero-padded `HH:MM`
    pub time: String,
    pub is_prime: bool,
    #[serde(default)]
    pub sort_order: i32,
}

/// Input for creating a collection
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCollection {
    pub id: Option<String>,
    pub name: String,
    #[serde(default = "default_link")]
    pub link: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

/// Partial update; absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionUpdate {
    pub name: Option<String>,
    pub link: Option<String>,
    pub priority: Option<Priority>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAsset {
    pub id: Option<String>,
    pub image_url: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSlot {
    pub id: Option<String>,
    pub time: String,
    #[serde(default)]
    pub is_prime: bool,
    #[serde(default)]
    pub sort_order: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentLogEntry {
    pub id: u64,
    pub product_id: String,
    pub product_name: String,
    /// Campaign day as entered by the operator (`YYYY-MM-DD`)
    pub sent_date: String,
    pub subject: String,
    pub body: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSentLogEntry {
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub product_name: String,
    pub sent_date: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

fn default_link() -> String {
    "#".to_string()
}

fn default_enabled() -> bool {
    true
}

/// Parses a zero-padded 24h `HH:MM` slot time
///
/// The width check keeps lexical order equal to time order.
pub fn parse_slot_time(time: &str) -> Option<NaiveTime> {
    if time.len() != 5 {
        return None;
    }
    NaiveTime::parse_from_str(time, "%H:%M").ok()
}

pub fn is_valid_slot_time(time: &str) -> bool {
    parse_slot_time(time).is_some()
}
