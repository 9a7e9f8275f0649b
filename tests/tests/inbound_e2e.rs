//! End-to-end ticks over a tempdir remote: classification fan-out.

use gateway_core::{Event, ProcessorConfig, ProcessorsConfig};
use gateway_telemetry::metrics;
use gateway_tests::fixtures::{correction_wire, plain_wire, stage_remote};
use gateway_tests::setup::{spawn_gateway, GatewayOptions, TEST_HOSTNAME};

fn enabled(path_matcher: &str) -> ProcessorConfig {
    ProcessorConfig {
        enabled: true,
        path_matcher: path_matcher.into(),
    }
}

fn events_of_type(publisher: &gateway_stream::MockPublisher, event_type: &str) -> Vec<Event> {
    publisher
        .sent()
        .iter()
        .filter(|(_, meta)| meta.get("eventType").map(String::as_str) == Some(event_type))
        .map(|(body, _)| Event::decode(body).unwrap())
        .collect()
}

#[tokio::test]
async fn correction_fanout() {
    let remote = tempfile::tempdir().unwrap();
    stage_remote(
        remote.path(),
        "corrections/moov.ach",
        correction_wire("991111111", &["C01", "C03"]).as_bytes(),
    );
    stage_remote(
        remote.path(),
        "reconciliation/unused.txt",
        plain_wire("991111111", 1).as_bytes(),
    );

    let gw = spawn_gateway(
        remote.path(),
        GatewayOptions {
            processors: ProcessorsConfig {
                corrections: enabled(""),
                ..Default::default()
            },
            keep_remote_files: true,
            ..Default::default()
        },
    );

    let c01_before = metrics()
        .correction_codes_processed
        .get(&["991111111", "076401251", "C01"]);
    let c03_before = metrics()
        .correction_codes_processed
        .get(&["991111111", "076401251", "C03"]);

    let summary = gw.trigger.trigger().await.unwrap();
    assert!(summary.is_clean(), "errors: {:?}", summary.errors);
    assert_eq!(summary.processed, vec!["testing"]);

    let corrections = events_of_type(&gw.publisher, "CorrectionFile");
    assert_eq!(corrections.len(), 1);
    match &corrections[0] {
        Event::CorrectionFile(payload) => {
            assert_eq!(payload.filename, "moov.ach");
            assert_eq!(payload.corrections.len(), 2);
        }
        other => panic!("unexpected event: {}", other.event_type()),
    }

    assert_eq!(
        metrics()
            .correction_codes_processed
            .get(&["991111111", "076401251", "C01"])
            - c01_before,
        1
    );
    assert_eq!(
        metrics()
            .correction_codes_processed
            .get(&["991111111", "076401251", "C03"])
            - c03_before,
        1
    );

    gw.stop().await;
}

#[tokio::test]
async fn reconciliation_path_filter() {
    let remote = tempfile::tempdir().unwrap();
    stage_remote(
        remote.path(),
        "corrections/moov.ach",
        correction_wire("992222222", &["C01"]).as_bytes(),
    );
    stage_remote(
        remote.path(),
        "reconciliation/fileMoovTester_TRANACTIONSFAKE.TXT",
        plain_wire("992222222", 3).as_bytes(),
    );

    let gw = spawn_gateway(
        remote.path(),
        GatewayOptions {
            processors: ProcessorsConfig {
                corrections: enabled(""),
                reconciliations: enabled("/reconciliation/"),
                ..Default::default()
            },
            keep_remote_files: true,
            ..Default::default()
        },
    );

    let summary = gw.trigger.trigger().await.unwrap();
    assert!(summary.is_clean(), "errors: {:?}", summary.errors);

    // The correction file must not produce a reconciliation event.
    let recons = events_of_type(&gw.publisher, "ReconciliationFile");
    assert_eq!(recons.len(), 1);
    match &recons[0] {
        Event::ReconciliationFile(payload) => {
            assert_eq!(payload.filename, "fileMoovTester_TRANACTIONSFAKE.TXT");
            assert_eq!(payload.reconciliations.len(), 1);
            assert_eq!(payload.reconciliations[0].entries.len(), 3);
        }
        other => panic!("unexpected event: {}", other.event_type()),
    }

    assert_eq!(events_of_type(&gw.publisher, "CorrectionFile").len(), 1);

    gw.stop().await;
}

#[tokio::test]
async fn invalid_bytes_are_audited_but_emit_nothing() {
    let remote = tempfile::tempdir().unwrap();
    stage_remote(remote.path(), "inbound/invalid.ach", b"invalid-ach-file");

    let gw = spawn_gateway(
        remote.path(),
        GatewayOptions {
            processors: ProcessorsConfig {
                corrections: enabled(""),
                reconciliations: enabled("/reconciliation/"),
                returns: enabled(""),
                prenotes: enabled(""),
                incomings: enabled(""),
            },
            keep_remote_files: true,
            ..Default::default()
        },
    );

    let summary = gw.trigger.trigger().await.unwrap();
    assert!(summary.is_clean(), "errors: {:?}", summary.errors);
    assert_eq!(gw.publisher.sent_count(), 0);

    // The audit trail still carries the raw bytes.
    let audited = std::fs::read(
        gw.audit_root
            .join(format!("odfi/{TEST_HOSTNAME}/inbound/invalid.ach")),
    )
    .unwrap();
    assert_eq!(audited, b"invalid-ach-file");

    gw.stop().await;
}

#[tokio::test]
async fn two_ticks_over_a_static_remote_are_identical() {
    let remote = tempfile::tempdir().unwrap();
    stage_remote(
        remote.path(),
        "corrections/moov.ach",
        correction_wire("993333333", &["C05"]).as_bytes(),
    );

    let gw = spawn_gateway(
        remote.path(),
        GatewayOptions {
            processors: ProcessorsConfig {
                corrections: enabled(""),
                ..Default::default()
            },
            keep_remote_files: true,
            ..Default::default()
        },
    );

    let before = metrics()
        .correction_codes_processed
        .get(&["993333333", "076401251", "C05"]);

    gw.trigger.trigger().await.unwrap();
    gw.trigger.trigger().await.unwrap();

    let sent = gw.publisher.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], sent[1]);

    // One increment per tick.
    assert_eq!(
        metrics()
            .correction_codes_processed
            .get(&["993333333", "076401251", "C05"])
            - before,
        2
    );

    // Audit storage received the identical content.
    let audited = std::fs::read(
        gw.audit_root
            .join(format!("odfi/{TEST_HOSTNAME}/corrections/moov.ach")),
    )
    .unwrap();
    assert_eq!(audited, correction_wire("993333333", &["C05"]).as_bytes());

    gw.stop().await;
}
