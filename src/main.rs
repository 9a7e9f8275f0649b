//! ACH File Gateway
//!
//! Bridges ACH files and the message bus:
//! - ODFI ingress: HTTP file submission published as typed events
//! - RDFI inbound: leader-elected periodic download, audit trail
//!   persistence, and classification into correction / return /
//!   reconciliation / prenote / incoming events

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};

use gateway_api::{router, AppState};
use gateway_core::{
    ErrorsConfig, HttpConfig, InboundConfig, LockConfig, ShardingConfig, UploadConfig,
};
use gateway_rdfi::{leader::lock_backend_from_config, setup_processors, PeriodicScheduler};
use gateway_stream::{KafkaPublisher, Publisher, StreamConfig};
use gateway_telemetry::{health, init_tracing_from_env};
use gateway_transport::AgentRegistry;

/// Application configuration.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default)]
    http: HttpConfig,
    #[serde(default)]
    inbound: InboundConfig,
    #[serde(default)]
    sharding: ShardingConfig,
    #[serde(default)]
    upload: UploadConfig,
    #[serde(default)]
    errors: ErrorsConfig,
    #[serde(default)]
    lock: LockConfig,
    #[serde(default)]
    stream: StreamConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    // rustls 0.23+ requires explicit crypto provider selection before any
    // TLS operations.
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting ACH gateway v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;

    let publisher: Arc<dyn Publisher> = Arc::new(KafkaPublisher::new(config.stream.clone()));
    health().bus.set_healthy();

    let agents = AgentRegistry::from_config(&config.upload);
    let lock = lock_backend_from_config(&config.lock);
    health().lock_backend.set_healthy();

    let default_processors = Default::default();
    let processor_cfg = config
        .inbound
        .odfi
        .as_ref()
        .map(|odfi| &odfi.processors)
        .unwrap_or(&default_processors);
    let processors = setup_processors(processor_cfg, publisher.clone());

    let scheduler = PeriodicScheduler::new(
        &config.inbound,
        config.sharding.clone(),
        agents,
        processors,
        lock,
        config.lock.ttl(),
        &config.errors,
    )
    .context("Failed to construct RDFI scheduler")?;

    let trigger = scheduler.trigger();
    let shutdown = scheduler.shutdown_handle();
    let scheduler_handle = tokio::spawn(scheduler.start());

    let state = AppState::new(publisher, trigger, config.http.clone());
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.http.bind_address, config.http.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down...");

    shutdown.shutdown();
    match scheduler_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Scheduler exited with error: {}", e),
        Err(e) => error!("Scheduler task failed: {}", e),
    }

    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("ACHGATEWAY")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    let mut config: Config = config
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    // Manual overrides for nested fields the environment source does not
    // parse reliably.
    if let Ok(brokers) = std::env::var("ACHGATEWAY_STREAM_BROKERS") {
        config.stream.brokers = brokers.split(',').map(|s| s.trim().to_string()).collect();
    }
    if let Ok(topic) = std::env::var("ACHGATEWAY_STREAM_TOPIC") {
        config.stream.topic = topic;
    }
    if let Ok(port) = std::env::var("ACHGATEWAY_HTTP_PORT") {
        config.http.port = port.parse().context("Invalid ACHGATEWAY_HTTP_PORT")?;
    }

    Ok(config)
}

/// Resolves when the gateway is asked to stop (interrupt or SIGTERM),
/// letting axum drain in-flight ingress requests while the scheduler
/// finishes its current shard.
async fn shutdown_signal() {
    let interrupt = async {
        signal::ctrl_c()
            .await
            .expect("failed to listen for interrupt");
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => info!("gateway: interrupt received, draining"),
        _ = terminate => info!("gateway: SIGTERM received, draining"),
    }
}
