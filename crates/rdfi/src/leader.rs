//! Cluster-wide leadership, one lease per shard.
//!
//! `acquire` succeeds only when this process newly holds exclusive
//! ownership of the key. Held leases expire via TTL so a crashed holder
//! cannot wedge a shard; the scheduler still releases explicitly at the
//! end of every tick.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use gateway_core::{Error, LockConfig, Result};

/// The sole key used for cluster mutual exclusion per shard.
pub fn leader_key(shard_name: &str) -> String {
    format!("achgateway/rdfi/{shard_name}")
}

/// A held leadership lease.
#[async_trait]
pub trait Lease: Send {
    /// Releases leadership. The TTL is the backstop when this is never
    /// reached (crash, partition).
    async fn release(self: Box<Self>) -> Result<()>;
}

/// A lock backend.
#[async_trait]
pub trait LockBackend: Send + Sync {
    async fn acquire(&self, key: &str, ttl: Duration) -> Result<Box<dyn Lease>>;
}

/// Builds the configured backend.
pub fn lock_backend_from_config(cfg: &LockConfig) -> Arc<dyn LockBackend> {
    match cfg {
        LockConfig::Memory { .. } => Arc::new(MemoryLock::new()),
        LockConfig::KvSession { address, .. } => Arc::new(KvSessionLock::new(address.clone())),
    }
}

// ---------------------------------------------------------------------------
// In-process backend

#[derive(Default)]
struct MemoryState {
    held: HashMap<String, (Uuid, Instant)>,
}

/// In-process lock. Correct for a single instance; tests share one
/// `MemoryLock` between scheduler instances to exercise contention.
#[derive(Clone, Default)]
pub struct MemoryLock {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` is currently held (and unexpired).
    pub fn is_held(&self, key: &str) -> bool {
        let state = self.state.lock();
        state
            .held
            .get(key)
            .is_some_and(|(_, expires)| *expires > Instant::now())
    }
}

struct MemoryLease {
    state: Arc<Mutex<MemoryState>>,
    key: String,
    id: Uuid,
}

impl MemoryLease {
    fn release_sync(&self) {
        let mut state = self.state.lock();
        if let Some((held_id, _)) = state.held.get(&self.key) {
            if *held_id == self.id {
                state.held.remove(&self.key);
            }
        }
    }
}

#[async_trait]
impl Lease for MemoryLease {
    async fn release(self: Box<Self>) -> Result<()> {
        self.release_sync();
        Ok(())
    }
}

impl Drop for MemoryLease {
    fn drop(&mut self) {
        // Guarantees release on early returns and panics.
        self.release_sync();
    }
}

#[async_trait]
impl LockBackend for MemoryLock {
    async fn acquire(&self, key: &str, ttl: Duration) -> Result<Box<dyn Lease>> {
        let id = Uuid::new_v4();
        let now = Instant::now();

        let mut state = self.state.lock();
        if let Some((_, expires)) = state.held.get(key) {
            if *expires > now {
                return Err(Error::lock_unavailable(key, "already held"));
            }
        }
        state.held.insert(key.to_string(), (id, now + ttl));
        debug!(key = key, "Acquired in-process leadership");

        Ok(Box::new(MemoryLease {
            state: self.state.clone(),
            key: key.to_string(),
            id,
        }))
    }
}

// ---------------------------------------------------------------------------
// Consul-style HTTP KV backend

/// Lock backend over a consul-style KV store with session TTLs.
pub struct KvSessionLock {
    address: String,
    client: reqwest::Client,
}

impl KvSessionLock {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct SessionCreated {
    #[serde(rename = "ID")]
    id: String,
}

struct KvLease {
    address: String,
    client: reqwest::Client,
    key: String,
    session: String,
    keep_alive: tokio::task::JoinHandle<()>,
}

#[async_trait]
impl Lease for KvLease {
    async fn release(self: Box<Self>) -> Result<()> {
        self.keep_alive.abort();

        let release_url = format!(
            "{}/v1/kv/{}?release={}",
            self.address, self.key, self.session
        );
        self.client
            .put(&release_url)
            .send()
            .await
            .map_err(|e| Error::internal(format!("releasing {}: {e}", self.key)))?;

        let destroy_url = format!("{}/v1/session/destroy/{}", self.address, self.session);
        self.client
            .put(&destroy_url)
            .send()
            .await
            .map_err(|e| Error::internal(format!("destroying session: {e}")))?;

        Ok(())
    }
}

impl Drop for KvLease {
    fn drop(&mut self) {
        // The session TTL reclaims leadership when release() was never
        // reached; renewal must stop regardless.
        self.keep_alive.abort();
    }
}

#[async_trait]
impl LockBackend for KvSessionLock {
    async fn acquire(&self, key: &str, ttl: Duration) -> Result<Box<dyn Lease>> {
        let create_url = format!("{}/v1/session/create", self.address);
        let session: SessionCreated = self
            .client
            .put(&create_url)
            .json(&serde_json::json!({
                "TTL": format!("{}s", ttl.as_secs()),
                "Behavior": "delete",
            }))
            .send()
            .await
            .map_err(|e| Error::internal(format!("creating session: {e}")))?
            .json()
            .await
            .map_err(|e| Error::internal(format!("creating session: {e}")))?;

        let acquire_url = format!("{}/v1/kv/{}?acquire={}", self.address, key, session.id);
        let acquired: bool = self
            .client
            .put(&acquire_url)
            .send()
            .await
            .map_err(|e| Error::internal(format!("acquiring {key}: {e}")))?
            .json()
            .await
            .map_err(|e| Error::internal(format!("acquiring {key}: {e}")))?;

        if !acquired {
            let destroy_url = format!("{}/v1/session/destroy/{}", self.address, session.id);
            if let Err(e) = self.client.put(&destroy_url).send().await {
                warn!(error = %e, "Failed to destroy unused session");
            }
            return Err(Error::lock_unavailable(key, "held by another session"));
        }

        // Implicit keep-alive: renew at half the TTL until released.
        let renew_url = format!("{}/v1/session/renew/{}", self.address, session.id);
        let renew_client = self.client.clone();
        let keep_alive = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(ttl / 2);
            ticker.tick().await; // immediate tick
            loop {
                ticker.tick().await;
                if let Err(e) = renew_client.put(&renew_url).send().await {
                    warn!(error = %e, "Session renewal failed");
                }
            }
        });

        Ok(Box::new(KvLease {
            address: self.address.clone(),
            client: self.client.clone(),
            key: key.to_string(),
            session: session.id,
            keep_alive,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn only_one_acquirer_wins() {
        let lock = MemoryLock::new();
        let key = leader_key("testing");
        let ttl = Duration::from_secs(30);

        let lease = lock.acquire(&key, ttl).await.unwrap();
        let second = lock.acquire(&key, ttl).await;
        assert!(second.err().unwrap().is_lock_unavailable());

        lease.release().await.unwrap();
        assert!(lock.acquire(&key, ttl).await.is_ok());
    }

    #[tokio::test]
    async fn independent_keys_do_not_contend() {
        let lock = MemoryLock::new();
        let ttl = Duration::from_secs(30);

        let _a = lock.acquire(&leader_key("a"), ttl).await.unwrap();
        assert!(lock.acquire(&leader_key("b"), ttl).await.is_ok());
    }

    #[tokio::test]
    async fn expired_leases_can_be_reclaimed() {
        let lock = MemoryLock::new();
        let key = leader_key("testing");

        let lease = lock.acquire(&key, Duration::from_millis(0)).await.unwrap();
        // Expired immediately; a new acquirer may claim it.
        let second = lock.acquire(&key, Duration::from_secs(30)).await;
        assert!(second.is_ok());
        drop(lease);
        assert!(lock.is_held(&key));
    }

    #[tokio::test]
    async fn dropping_a_lease_releases_it() {
        let lock = MemoryLock::new();
        let key = leader_key("testing");
        let ttl = Duration::from_secs(30);

        {
            let _lease = lock.acquire(&key, ttl).await.unwrap();
            assert!(lock.is_held(&key));
        }
        assert!(!lock.is_held(&key));
    }

    #[test]
    fn leader_key_shape() {
        assert_eq!(leader_key("testing"), "achgateway/rdfi/testing");
    }
}
