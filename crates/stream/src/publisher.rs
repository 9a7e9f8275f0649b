//! Bus publisher over rskafka.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rskafka::client::{
    partition::{Compression, UnknownTopicHandling},
    ClientBuilder,
};
use rskafka::record::Record;
use tokio::sync::RwLock;
use tracing::{debug, error};

use gateway_core::{Error, Result};
use gateway_telemetry::metrics;

use crate::config::StreamConfig;

/// The seam between the gateway and the message bus.
///
/// `send` may block on transport; delivery is at-least-once, the audit
/// trail covers replay when it is not enough.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn send(&self, body: Vec<u8>, metadata: BTreeMap<String, String>) -> Result<()>;
}

/// In-memory publisher that captures every envelope. Used by tests and
/// by deployments that disable the bus.
#[derive(Clone, Default)]
pub struct MockPublisher {
    sent: Arc<parking_lot::Mutex<Vec<(Vec<u8>, BTreeMap<String, String>)>>>,
    should_fail: Arc<parking_lot::Mutex<bool>>,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `(body, metadata)` pair sent through this publisher.
    pub fn sent(&self) -> Vec<(Vec<u8>, BTreeMap<String, String>)> {
        self.sent.lock().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock() = fail;
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    async fn send(&self, body: Vec<u8>, metadata: BTreeMap<String, String>) -> Result<()> {
        if *self.should_fail.lock() {
            return Err(Error::publish("mock publisher failure"));
        }
        self.sent.lock().push((body, metadata));
        Ok(())
    }
}

/// Kafka/Redpanda-backed publisher.
pub struct KafkaPublisher {
    config: StreamConfig,
    /// Cached partition clients per topic
    clients: RwLock<BTreeMap<String, Arc<rskafka::client::partition::PartitionClient>>>,
}

impl KafkaPublisher {
    pub fn new(config: StreamConfig) -> Self {
        Self {
            config,
            clients: RwLock::new(BTreeMap::new()),
        }
    }

    /// Gets or creates a partition client for a topic.
    async fn get_client(
        &self,
        topic: &str,
    ) -> Result<Arc<rskafka::client::partition::PartitionClient>> {
        {
            let clients = self.clients.read().await;
            if let Some(client) = clients.get(topic) {
                return Ok(client.clone());
            }
        }

        let client = ClientBuilder::new(self.config.brokers.clone())
            .build()
            .await
            .map_err(|e| Error::publish(format!("failed to connect: {e}")))?;

        let partition_client = client
            .partition_client(topic.to_string(), 0, UnknownTopicHandling::Error)
            .await
            .map_err(|e| Error::publish(format!("failed to get partition client: {e}")))?;

        let partition_client = Arc::new(partition_client);

        {
            let mut clients = self.clients.write().await;
            clients.insert(topic.to_string(), partition_client.clone());
        }

        Ok(partition_client)
    }

    fn compression(&self) -> Compression {
        match self.config.compression.as_str() {
            "gzip" => Compression::Gzip,
            "snappy" => Compression::Snappy,
            "lz4" => Compression::Lz4,
            "zstd" => Compression::Zstd,
            _ => Compression::NoCompression,
        }
    }
}

#[async_trait]
impl Publisher for KafkaPublisher {
    async fn send(&self, body: Vec<u8>, metadata: BTreeMap<String, String>) -> Result<()> {
        let topic = self.config.topic.clone();
        let start = std::time::Instant::now();

        let client = self.get_client(&topic).await?;

        // Shard key keeps per-shard ordering on the partitioned bus.
        let key = metadata
            .get("shardKey")
            .or_else(|| metadata.get("fileID"))
            .map(|k| k.clone().into_bytes());

        let record = Record {
            key,
            value: Some(body),
            headers: metadata
                .into_iter()
                .map(|(k, v)| (k, v.into_bytes()))
                .collect(),
            timestamp: Utc::now(),
        };

        match client.produce(vec![record], self.compression()).await {
            Ok(_offsets) => {
                metrics().events_published.inc();
                let elapsed = start.elapsed();
                metrics().publish_latency_ms.observe(elapsed.as_millis() as u64);

                debug!(
                    topic = %topic,
                    latency_ms = %elapsed.as_millis(),
                    "Published event"
                );
                Ok(())
            }
            Err(e) => {
                error!("Failed to publish event: {}", e);
                metrics().publish_errors.inc();
                Err(Error::publish(format!("failed to produce: {e}")))
            }
        }
    }
}
