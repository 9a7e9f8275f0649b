//! Storage policy matrix after a successful tick.

use gateway_tests::fixtures::{plain_wire, stage_remote};
use gateway_tests::setup::{spawn_gateway, GatewayOptions};

fn stage_one_empty_one_full(remote: &std::path::Path) {
    stage_remote(remote, "inbound/empty.ach", b"");
    stage_remote(
        remote,
        "inbound/full.ach",
        plain_wire("994444444", 1).as_bytes(),
    );
}

#[tokio::test]
async fn deleting_remote_files_takes_zero_byte_files_too() {
    let remote = tempfile::tempdir().unwrap();
    stage_one_empty_one_full(remote.path());

    let gw = spawn_gateway(
        remote.path(),
        GatewayOptions {
            keep_remote_files: false,
            remove_zero_byte_files: true,
            ..Default::default()
        },
    );

    let summary = gw.trigger.trigger().await.unwrap();
    assert!(summary.is_clean(), "errors: {:?}", summary.errors);

    assert!(!remote.path().join("inbound/empty.ach").exists());
    assert!(!remote.path().join("inbound/full.ach").exists());

    gw.stop().await;
}

#[tokio::test]
async fn keeping_remote_files_still_removes_zero_byte_files() {
    let remote = tempfile::tempdir().unwrap();
    stage_one_empty_one_full(remote.path());

    let gw = spawn_gateway(
        remote.path(),
        GatewayOptions {
            keep_remote_files: true,
            remove_zero_byte_files: true,
            ..Default::default()
        },
    );

    let summary = gw.trigger.trigger().await.unwrap();
    assert!(summary.is_clean(), "errors: {:?}", summary.errors);

    assert!(!remote.path().join("inbound/empty.ach").exists());
    assert!(remote.path().join("inbound/full.ach").exists());

    gw.stop().await;
}

#[tokio::test]
async fn keeping_remote_files_invokes_no_deletes() {
    let remote = tempfile::tempdir().unwrap();
    stage_one_empty_one_full(remote.path());

    let gw = spawn_gateway(
        remote.path(),
        GatewayOptions {
            keep_remote_files: true,
            ..Default::default()
        },
    );

    let summary = gw.trigger.trigger().await.unwrap();
    assert!(summary.is_clean(), "errors: {:?}", summary.errors);

    assert!(remote.path().join("inbound/empty.ach").exists());
    assert!(remote.path().join("inbound/full.ach").exists());

    gw.stop().await;
}

#[tokio::test]
async fn cleanup_local_directory_removes_the_staging_run() {
    let remote = tempfile::tempdir().unwrap();
    stage_one_empty_one_full(remote.path());

    let gw = spawn_gateway(
        remote.path(),
        GatewayOptions {
            keep_remote_files: true,
            cleanup_local_directory: true,
            ..Default::default()
        },
    );

    let summary = gw.trigger.trigger().await.unwrap();
    assert!(summary.is_clean(), "errors: {:?}", summary.errors);

    // The per-run staging directory is gone.
    let runs: Vec<_> = std::fs::read_dir(&gw.staging_root).unwrap().collect();
    assert!(runs.is_empty(), "staging runs left behind: {runs:?}");

    gw.stop().await;
}
