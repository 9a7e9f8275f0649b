//! Gateway assembly for end-to-end tick tests.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use gateway_core::{
    AgentConfig, AuditConfig, ErrorsConfig, InboundConfig, OdfiConfig, ProcessorsConfig, Shard,
    ShardingConfig, StorageConfig,
};
use gateway_rdfi::{
    setup_processors, Alerter, MemoryLock, PeriodicScheduler, Shutdown, Trigger,
};
use gateway_stream::MockPublisher;
use gateway_transport::{AgentRegistry, FilesystemAgent};

pub const TEST_HOSTNAME: &str = "ftp.test.com";

/// Everything a test needs to drive and observe one gateway instance.
pub struct TestGateway {
    pub trigger: Trigger,
    pub shutdown: Shutdown,
    pub publisher: MockPublisher,
    pub audit_root: std::path::PathBuf,
    pub staging_root: std::path::PathBuf,
    handle: tokio::task::JoinHandle<gateway_core::Result<()>>,
    _staging: TempDir,
    _audit: TempDir,
}

impl TestGateway {
    /// Stops the scheduler loop and waits for it to exit.
    pub async fn stop(self) {
        self.shutdown.shutdown();
        self.handle.await.unwrap().unwrap();
    }
}

pub struct GatewayOptions {
    pub processors: ProcessorsConfig,
    pub keep_remote_files: bool,
    pub remove_zero_byte_files: bool,
    pub cleanup_local_directory: bool,
    /// Shard table; defaults to one "testing" shard on the default agent.
    pub shards: Vec<Shard>,
    /// Agent registry override; defaults to a filesystem agent over the
    /// remote root.
    pub registry: Option<AgentRegistry>,
    pub lock: MemoryLock,
    pub alerter: Option<Box<dyn Alerter>>,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            processors: ProcessorsConfig::default(),
            keep_remote_files: false,
            remove_zero_byte_files: false,
            cleanup_local_directory: false,
            shards: vec![Shard {
                name: "testing".into(),
                upload_agent: "test-agent".into(),
            }],
            registry: None,
            lock: MemoryLock::new(),
            alerter: None,
        }
    }
}

/// Default agent config rooted at `remote_root`.
pub fn default_agent_config(remote_root: &Path) -> AgentConfig {
    AgentConfig {
        name: "test-agent".into(),
        hostname: TEST_HOSTNAME.into(),
        root: remote_root.to_path_buf(),
        inbound_paths: vec![
            "inbound".into(),
            "corrections".into(),
            "reconciliation".into(),
            "returned".into(),
        ],
    }
}

/// Builds a gateway over a tempdir "remote" and spawns its scheduler.
pub fn spawn_gateway(remote_root: &Path, opts: GatewayOptions) -> TestGateway {
    let staging = tempfile::tempdir().unwrap();
    let audit = tempfile::tempdir().unwrap();

    let inbound = InboundConfig {
        odfi: Some(OdfiConfig {
            interval_secs: 3600, // far enough out that only manual triggers fire
            shard_names: opts.shards.iter().map(|s| s.name.clone()).collect(),
            audit: AuditConfig::Filesystem {
                root: audit.path().to_path_buf(),
            },
            storage: StorageConfig {
                directory: staging.path().to_path_buf(),
                keep_remote_files: opts.keep_remote_files,
                remove_zero_byte_files: opts.remove_zero_byte_files,
                cleanup_local_directory: opts.cleanup_local_directory,
            },
            processors: opts.processors.clone(),
        }),
    };

    let registry = opts.registry.unwrap_or_else(|| {
        let mut registry = AgentRegistry::default();
        registry.register(
            "test-agent",
            Arc::new(FilesystemAgent::new(&default_agent_config(remote_root))),
        );
        registry
    });

    let publisher = MockPublisher::new();
    let processors = setup_processors(&opts.processors, Arc::new(publisher.clone()));

    let mut scheduler = PeriodicScheduler::new(
        &inbound,
        ShardingConfig {
            shards: opts.shards,
        },
        registry,
        processors,
        Arc::new(opts.lock),
        Duration::from_secs(30),
        &ErrorsConfig::default(),
    )
    .unwrap();
    if let Some(alerter) = opts.alerter {
        scheduler.register_alerter(alerter);
    }

    let trigger = scheduler.trigger();
    let shutdown = scheduler.shutdown_handle();
    let handle = tokio::spawn(scheduler.start());

    TestGateway {
        trigger,
        shutdown,
        publisher,
        audit_root: audit.path().to_path_buf(),
        staging_root: staging.path().to_path_buf(),
        handle,
        _staging: staging,
        _audit: audit,
    }
}
