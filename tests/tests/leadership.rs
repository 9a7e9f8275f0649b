//! Leader contention between two scheduler instances over one shard.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gateway_rdfi::MemoryLock;
use gateway_tests::fixtures::{plain_wire, stage_remote};
use gateway_tests::mocks::CountingAgent;
use gateway_tests::setup::{default_agent_config, spawn_gateway, GatewayOptions};
use gateway_transport::{AgentRegistry, FilesystemAgent};

#[tokio::test]
async fn two_instances_never_fetch_concurrently() {
    let remote = tempfile::tempdir().unwrap();
    stage_remote(
        remote.path(),
        "inbound/moov.ach",
        plain_wire("995555555", 1).as_bytes(),
    );

    // Both instances share the lock namespace and the same slow agent,
    // which records the maximum number of concurrent listings.
    let lock = MemoryLock::new();
    let max_seen = Arc::new(AtomicUsize::new(0));
    let agent: Arc<dyn gateway_transport::Agent> = Arc::new(CountingAgent::new(
        Arc::new(FilesystemAgent::new(&default_agent_config(remote.path()))),
        max_seen.clone(),
        Duration::from_millis(25),
    ));

    let registry = || {
        let mut registry = AgentRegistry::default();
        registry.register("test-agent", agent.clone());
        registry
    };

    let options = |lock: MemoryLock| GatewayOptions {
        keep_remote_files: true,
        registry: Some(registry()),
        lock,
        ..Default::default()
    };

    let gw1 = spawn_gateway(remote.path(), options(lock.clone()));
    let gw2 = spawn_gateway(remote.path(), options(lock.clone()));

    let mut total_processed = 0;
    for _ in 0..10 {
        let (a, b) = tokio::join!(gw1.trigger.trigger(), gw2.trigger.trigger());
        let (a, b) = (a.unwrap(), b.unwrap());
        assert!(a.is_clean() && b.is_clean());
        total_processed += a.processed.len() + b.processed.len();
    }

    // Work happened, and no tick window was ever claimed by both.
    assert!(total_processed >= 1);
    assert_eq!(max_seen.load(Ordering::SeqCst), 1);

    gw1.stop().await;
    gw2.stop().await;
}
