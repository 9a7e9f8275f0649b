//! Shard-failure isolation and alert fan-out.

use std::sync::Arc;

use gateway_core::{ProcessorConfig, ProcessorsConfig, Shard};
use gateway_tests::fixtures::{plain_wire, stage_remote};
use gateway_tests::mocks::{CapturingAlerter, FailingAgent};
use gateway_tests::setup::{spawn_gateway, GatewayOptions};
use gateway_transport::{AgentRegistry, FilesystemAgent};

#[tokio::test]
async fn one_failing_shard_alerts_without_starving_its_sibling() {
    let remote = tempfile::tempdir().unwrap();
    stage_remote(
        remote.path(),
        "inbound/moov.ach",
        plain_wire("996666666", 2).as_bytes(),
    );

    let mut registry = AgentRegistry::default();
    registry.register("broken-agent", Arc::new(FailingAgent::new("ftp.broken.com")));
    registry.register(
        "ok-agent",
        Arc::new(FilesystemAgent::new(&gateway_core::AgentConfig {
            name: "ok-agent".into(),
            hostname: "ftp.ok.com".into(),
            root: remote.path().to_path_buf(),
            inbound_paths: vec!["inbound".into()],
        })),
    );

    let alerter = CapturingAlerter::new();
    let gw = spawn_gateway(
        remote.path(),
        GatewayOptions {
            processors: ProcessorsConfig {
                incomings: ProcessorConfig {
                    enabled: true,
                    path_matcher: String::new(),
                },
                ..Default::default()
            },
            keep_remote_files: true,
            shards: vec![
                Shard {
                    name: "alpha".into(),
                    upload_agent: "broken-agent".into(),
                },
                Shard {
                    name: "beta".into(),
                    upload_agent: "ok-agent".into(),
                },
            ],
            registry: Some(registry),
            alerter: Some(Box::new(alerter.clone())),
            ..Default::default()
        },
    );

    let summary = gw.trigger.trigger().await.unwrap();

    // tick-all itself completes; the shard failure is in the summary.
    assert_eq!(summary.processed, vec!["beta"]);
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].starts_with("alpha:"));

    // Exactly one alert, carrying the transport failure.
    let alerts = alerter.alerts();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].contains("connection refused"), "{}", alerts[0]);

    // The healthy shard still ran its processors.
    let sent = gw.publisher.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1.get("eventType").unwrap(), "IncomingFile");

    gw.stop().await;
}
