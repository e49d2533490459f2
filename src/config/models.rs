use crate::humanize::{ByteSize, HumanDuration};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub worker: WorkerSettings,
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    /// Root directory for the fjall keyspaces (`catalog/`, `queue/`)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Public origin used to turn `/uploads/...` paths into absolute URLs
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            data_dir: default_data_dir(),
            public_base_url: default_public_base_url(),
        }
    }
}

impl ServerConfig {
    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join("catalog")
    }

    pub fn queue_path(&self) -> PathBuf {
        self.data_dir.join("queue")
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_public_base_url() -> String {
    "http://localhost:3000".to_string()
}

/// Image store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: ByteSize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uploads_dir: default_uploads_dir(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_uploads_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_upload_bytes() -> ByteSize {
    ByteSize(10 * 1024 * 1024) // 10 MB
}

/// Schedule generation settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScheduleConfig {
    /// Offset used for "local" midnight/noon, e.g. `"-03:00"`
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
    #[serde(default = "default_max_range_days")]
    pub max_range_days: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            utc_offset: default_utc_offset(),
            max_range_days: default_max_range_days(),
        }
    }
}

impl ScheduleConfig {
    /// Parsed offset; validation guarantees this succeeds after `Config::load`
    pub fn offset(&self) -> Option<FixedOffset> {
        parse_utc_offset(&self.utc_offset)
    }
}

/// Parses `"+HH:MM"` / `"-HH:MM"` (also accepts `"Z"`)
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0);
    }
    raw.parse::<FixedOffset>().ok()
}

fn default_utc_offset() -> String {
    "+00:00".to_string()
}

fn default_max_range_days() -> u32 {
    62
}

/// Publish worker settings (tick interval and poll policy are fixed in code)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkerSettings {
    #[serde(default = "default_worker_enabled")]
    pub enabled: bool,
    /// Items left `processing` longer than this are failed by the reaper
    #[serde(default = "default_stale_processing_after")]
    pub stale_processing_after: HumanDuration,
    /// Published, failed and cancelled items are deleted this long after
    /// their scheduled time
    #[serde(default = "default_queue_retention")]
    pub queue_retention: HumanDuration,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            enabled: default_worker_enabled(),
            stale_processing_after: default_stale_processing_after(),
            queue_retention: default_queue_retention(),
        }
    }
}

fn default_worker_enabled() -> bool {
    true
}

fn default_stale_processing_after() -> HumanDuration {
    HumanDuration::from_secs(15 * 60)
}

fn default_queue_retention() -> HumanDuration {
    HumanDuration::from_secs(30 * 86_400)
}

/// External publish platform (Graph API) client settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlatformConfig {
    #[serde(default = "default_graph_url")]
    pub graph_url: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            graph_url: default_graph_url(),
            api_version: default_api_version(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_graph_url() -> String {
    "https://graph.facebook.com".to_string()
}

fn default_api_version() -> String {
    "v21.0".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// API authentication
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Bearer token for `/api` routes (loaded from environment, not from config file)
    #[serde(skip)]
    pub api_token: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

fn default_log_level() -> String {
    "info,storydesk=debug".to_string()
}
