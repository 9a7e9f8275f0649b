//! Gateway configuration model.
//!
//! Deserialized by the binary through the `config` crate (defaults, then an
//! optional TOML file, then `ACHGATEWAY_`-prefixed environment variables).

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::compliance::TransformConfig;

/// Inbound processing configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundConfig {
    /// RDFI-side periodic download/processing. Absent means the scheduler
    /// is not constructed.
    pub odfi: Option<OdfiConfig>,
}

/// Configuration for the RDFI periodic scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OdfiConfig {
    /// Tick period in seconds.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Shards serviced by this instance, in processing order.
    #[serde(default)]
    pub shard_names: Vec<String>,
    /// Audit trail sink.
    pub audit: AuditConfig,
    /// Staging and remote-file retention policy.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Per-processor classifier controls.
    #[serde(default)]
    pub processors: ProcessorsConfig,
}

fn default_interval_secs() -> u64 {
    600 // 10 minutes
}

impl OdfiConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Audit trail storage backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditConfig {
    /// Byte-identical copies under `<root>/odfi/<hostname>/...`.
    Filesystem { root: PathBuf },
}

/// Staging directory and remote retention policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Parent directory for per-tick staging directories.
    #[serde(default = "default_staging_directory")]
    pub directory: PathBuf,
    /// Skip deleting remote files after a tick.
    #[serde(default)]
    pub keep_remote_files: bool,
    /// Delete remote files whose download was zero bytes.
    #[serde(default)]
    pub remove_zero_byte_files: bool,
    /// Remove the whole local staging directory after a tick.
    #[serde(default)]
    pub cleanup_local_directory: bool,
}

fn default_staging_directory() -> PathBuf {
    PathBuf::from("./storage/inbound")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: default_staging_directory(),
            keep_remote_files: false,
            remove_zero_byte_files: false,
            cleanup_local_directory: false,
        }
    }
}

/// Classifier controls for one processor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessorConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Case-insensitive substring matched against the staged file path.
    #[serde(default)]
    pub path_matcher: String,
}

impl ProcessorConfig {
    /// Whether `filepath` passes the optional path filter.
    pub fn matches_path(&self, filepath: &str) -> bool {
        self.path_matcher.is_empty()
            || filepath
                .to_lowercase()
                .contains(&self.path_matcher.to_lowercase())
    }
}

/// Per-processor configuration, keyed by event category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessorsConfig {
    #[serde(default)]
    pub corrections: ProcessorConfig,
    #[serde(default)]
    pub reconciliations: ProcessorConfig,
    #[serde(default)]
    pub returns: ProcessorConfig,
    #[serde(default)]
    pub prenotes: ProcessorConfig,
    #[serde(default)]
    pub incomings: ProcessorConfig,
}

/// A named partition of work mapped to one upload agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shard {
    pub name: String,
    pub upload_agent: String,
}

/// The shard table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShardingConfig {
    #[serde(default)]
    pub shards: Vec<Shard>,
}

impl ShardingConfig {
    pub fn find(&self, name: &str) -> Option<&Shard> {
        self.shards.iter().find(|s| s.name == name)
    }
}

/// Transport agent registry entry.
///
/// The filesystem agent serves local or mounted drop directories; remote
/// backends (SFTP, FTP, S3) plug in behind the same `Agent` trait.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Handle used by the shard table.
    pub name: String,
    /// Stable identifier; prefixes the audit trail.
    pub hostname: String,
    /// Root of the agent's filesystem transport.
    pub root: PathBuf,
    /// Remote paths listed for inbound files, relative to `root`.
    #[serde(default = "default_inbound_paths")]
    pub inbound_paths: Vec<String>,
}

fn default_inbound_paths() -> Vec<String> {
    vec!["inbound".to_string()]
}

/// Upload agent registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default)]
    pub agents: Vec<AgentConfig>,
}

/// Cluster lock backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LockConfig {
    /// In-process lock. Correct for a single instance and for tests.
    Memory {
        #[serde(default = "default_lock_ttl_secs")]
        ttl_secs: u64,
    },
    /// Consul-style HTTP KV with session TTLs.
    KvSession {
        address: String,
        #[serde(default = "default_lock_ttl_secs")]
        ttl_secs: u64,
    },
}

fn default_lock_ttl_secs() -> u64 {
    30
}

impl Default for LockConfig {
    fn default() -> Self {
        Self::Memory {
            ttl_secs: default_lock_ttl_secs(),
        }
    }
}

impl LockConfig {
    pub fn ttl(&self) -> Duration {
        match self {
            Self::Memory { ttl_secs } | Self::KvSession { ttl_secs, .. } => {
                Duration::from_secs(*ttl_secs)
            }
        }
    }
}

/// One alerting sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AlerterConfig {
    /// Structured log only.
    Log,
    /// Slack-style webhook POST.
    Webhook { url: String },
}

/// Failure fan-out configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorsConfig {
    #[serde(default)]
    pub alerters: Vec<AlerterConfig>,
}

/// HTTP ingress configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum accepted request body, in bytes. Zero disables the limit.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,
    /// Compliance envelope applied to request bodies and published events.
    #[serde(default)]
    pub transform: TransformConfig,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8484
}

fn default_max_body_bytes() -> u64 {
    10 * 1024 * 1024
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
            transform: TransformConfig::default(),
        }
    }
}
