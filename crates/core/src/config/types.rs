use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::rasterizer::RasterizerConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub rasterizer: RasterizerConfig,
    pub storage: StorageConfig,
    pub item_store: ItemStoreConfig,
    /// Completion webhook. Without it, complete orders are only logged.
    #[serde(default)]
    pub notifier: Option<NotifierConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Per-event pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Directory under which per-event workspaces are created.
    #[serde(default = "default_workspace_root")]
    pub workspace_root: PathBuf,
    /// Bucket receiving the rendered images. `None` writes back to the source bucket.
    #[serde(default)]
    pub output_bucket: Option<String>,
    /// What to do with PDFs whose name carries no `(order)(item)` identifiers.
    #[serde(default)]
    pub untracked_files: UntrackedFilePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workspace_root: default_workspace_root(),
            output_bucket: None,
            untracked_files: UntrackedFilePolicy::default(),
        }
    }
}

fn default_workspace_root() -> PathBuf {
    std::env::temp_dir().join("pngflow")
}

/// Handling of PDFs without order identifiers in their object key.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UntrackedFilePolicy {
    /// Convert the file, skip status tracking and notification.
    Convert,
    /// Reject the event before any side effect.
    #[default]
    Reject,
}

/// Object storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub backend: StorageBackendKind,
    /// Google Cloud Storage settings (required when backend = "gcs")
    #[serde(default)]
    pub gcs: Option<GcsConfig>,
    /// Local directory settings (required when backend = "local")
    #[serde(default)]
    pub local: Option<LocalStorageConfig>,
}

/// Available object storage backends
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackendKind {
    Gcs,
    Local,
}

/// Google Cloud Storage JSON API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GcsConfig {
    /// API endpoint (override for emulators)
    #[serde(default = "default_gcs_endpoint")]
    pub endpoint: String,
    /// Static OAuth access token. Takes precedence over the metadata server.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Metadata server token URL. `None` sends unauthenticated requests.
    #[serde(default = "default_metadata_url")]
    pub metadata_url: Option<String>,
    /// Request timeout in seconds (default: 120)
    #[serde(default = "default_transfer_timeout")]
    pub timeout_secs: u32,
}

impl Default for GcsConfig {
    fn default() -> Self {
        Self {
            endpoint: default_gcs_endpoint(),
            access_token: None,
            metadata_url: default_metadata_url(),
            timeout_secs: default_transfer_timeout(),
        }
    }
}

fn default_gcs_endpoint() -> String {
    "https://storage.googleapis.com".to_string()
}

fn default_metadata_url() -> Option<String> {
    Some(
        "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token"
            .to_string(),
    )
}

fn default_transfer_timeout() -> u32 {
    120
}

/// Local directory storage: every bucket is a subdirectory of `root`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LocalStorageConfig {
    pub root: PathBuf,
}

/// Order item store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ItemStoreConfig {
    pub backend: ItemStoreBackendKind,
    /// Status value marking items that take part in completion checks.
    #[serde(default = "default_approved_status")]
    pub approved_status: String,
    /// Realtime Database settings (required when backend = "realtime_db")
    #[serde(default)]
    pub realtime_db: Option<RealtimeDbConfig>,
    /// SQLite settings (defaults apply when backend = "sqlite")
    #[serde(default)]
    pub sqlite: SqliteConfig,
}

fn default_approved_status() -> String {
    "approved".to_string()
}

/// Available item store backends
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemStoreBackendKind {
    RealtimeDb,
    Sqlite,
}

/// Firebase Realtime Database REST configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RealtimeDbConfig {
    /// Database URL (e.g., "https://my-project.firebaseio.com")
    pub url: String,
    /// Path segment above the model records
    #[serde(default = "default_rtdb_root")]
    pub root: String,
    /// Dashboard/model identifier owning the `orderItems` collection
    pub model_id: String,
    /// Database secret or ID token, sent as the `auth` query parameter
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_rtdb_root() -> String {
    "models".to_string()
}

/// SQLite item store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SqliteConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("pngflow.db")
}

/// Completion webhook configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotifierConfig {
    /// Webhook URL
    pub url: String,
    /// Sent as the `workflow` query parameter
    pub workflow_id: String,
    /// Sent as the `dashboard` query parameter
    pub dashboard_id: String,
    /// Claim an order-level flag before notifying so each order fires once.
    #[serde(default = "default_exactly_once")]
    pub exactly_once: bool,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_exactly_once() -> bool {
    true
}

fn default_timeout() -> u32 {
    30
}

/// Sanitized config for logs and API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub pipeline: PipelineConfig,
    pub rasterizer: RasterizerConfig,
    pub storage: SanitizedStorageConfig,
    pub item_store: SanitizedItemStoreConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifier: Option<SanitizedNotifierConfig>,
}

/// Sanitized storage config (access token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedStorageConfig {
    pub backend: StorageBackendKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gcs_endpoint: Option<String>,
    pub access_token_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_root: Option<PathBuf>,
}

/// Sanitized item store config (auth token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedItemStoreConfig {
    pub backend: ItemStoreBackendKind,
    pub approved_status: String,
    /// Host of the Realtime Database; the full URL and model path stay hidden.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realtime_db_host: Option<String>,
    pub auth_token_configured: bool,
    pub sqlite_path: PathBuf,
}

/// Sanitized notifier config. Webhook URLs and workflow identifiers act as
/// credentials, so only the host is shown.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedNotifierConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub exactly_once: bool,
    pub timeout_secs: u32,
}

impl From<&NotifierConfig> for SanitizedNotifierConfig {
    fn from(config: &NotifierConfig) -> Self {
        Self {
            host: url_host(&config.url),
            exactly_once: config.exactly_once,
            timeout_secs: config.timeout_secs,
        }
    }
}

fn url_host(url: &str) -> Option<String> {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let gcs = config.storage.gcs.as_ref();
        let rtdb = config.item_store.realtime_db.as_ref();

        Self {
            server: config.server.clone(),
            pipeline: config.pipeline.clone(),
            rasterizer: config.rasterizer.clone(),
            storage: SanitizedStorageConfig {
                backend: config.storage.backend,
                gcs_endpoint: gcs.map(|g| g.endpoint.clone()),
                access_token_configured: gcs
                    .and_then(|g| g.access_token.as_ref())
                    .is_some_and(|t| !t.is_empty()),
                local_root: config.storage.local.as_ref().map(|l| l.root.clone()),
            },
            item_store: SanitizedItemStoreConfig {
                backend: config.item_store.backend,
                approved_status: config.item_store.approved_status.clone(),
                realtime_db_host: rtdb.and_then(|r| url_host(&r.url)),
                auth_token_configured: rtdb
                    .and_then(|r| r.auth_token.as_ref())
                    .is_some_and(|t| !t.is_empty()),
                sqlite_path: config.item_store.sqlite.path.clone(),
            },
            notifier: config.notifier.as_ref().map(SanitizedNotifierConfig::from),
        }
    }
}
