//! End-to-end tests for the daemon wiring with the local relocator.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use filebot_core::error::ErrorKind;
use filebot_storage::LocalRelocator;
use filebot_worker::service;

use helpers::{TestEnv, wait_for};

#[tokio::test]
async fn test_startup_scan_relocates_existing_files() {
    let env = TestEnv::new();
    env.intake("3-candidate-data.txt", "IBM-000123\n");
    env.intake("3-resume.pdf", "%PDF");
    let config = env.config(2, "");

    let relocator = LocalRelocator::new(&env.input, &env.output).await.unwrap();
    let (tx, rx) = watch::channel(false);
    let task = tokio::spawn(async move {
        service::run_with(&config, Arc::new(relocator), rx).await
    });

    let app_dir = env.output.join("IBM-000123").join("Application_3");
    assert!(wait_for(&app_dir.join("3-resume.pdf"), Duration::from_secs(5)).await);

    tx.send(true).unwrap();
    let summary = task.await.unwrap().unwrap();

    assert!(app_dir.join("3-candidate-data.txt").exists());
    assert!(!env.input.join("3-resume.pdf").exists());
    assert!(!env.input.join("3-candidate-data.txt").exists());
    assert_eq!(summary.stats.done, 1);
    assert!(summary.abandoned.is_empty());
    assert_eq!(summary.teardown.joined, vec![0, 1]);

    let report = std::fs::read_to_string(env.path("report.txt")).unwrap();
    assert!(report.contains("IBM-000123"));
    assert!(report.contains("2 directories, 2 files"));
}

#[tokio::test]
async fn test_monitor_picks_up_files_dropped_later() {
    let env = TestEnv::new();
    let config = env.config(1, "");

    let relocator = LocalRelocator::new(&env.input, &env.output).await.unwrap();
    let (tx, rx) = watch::channel(false);
    let task = tokio::spawn(async move {
        service::run_with(&config, Arc::new(relocator), rx).await
    });

    // Let the watcher register before anything arrives.
    tokio::time::sleep(Duration::from_millis(100)).await;
    env.drop_in("5-cover-letter.txt", "hello");
    env.drop_in("5-candidate-data.txt", "ACME-42\n");

    let target = env
        .output
        .join("ACME-42")
        .join("Application_5")
        .join("5-cover-letter.txt");
    assert!(wait_for(&target, Duration::from_secs(5)).await);

    tx.send(true).unwrap();
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_malformed_intake_ends_run_with_scan_error() {
    let env = TestEnv::new();
    env.intake("abc-candidate-data.txt", "IBM-000123\n");
    let config = env.config(1, "");

    let relocator = LocalRelocator::new(&env.input, &env.output).await.unwrap();
    let (_tx, rx) = watch::channel(false);

    let err = tokio::time::timeout(
        Duration::from_secs(5),
        service::run_with(&config, Arc::new(relocator), rx),
    )
    .await
    .unwrap()
    .unwrap_err();

    assert!(err.is(ErrorKind::Scan));
    assert!(env.input.join("abc-candidate-data.txt").exists());
    assert!(env.path("report.txt").exists());
}

#[tokio::test]
async fn test_skip_policy_keeps_running_past_bad_entries() {
    let env = TestEnv::new();
    env.intake("abc-candidate-data.txt", "BAD\n");
    env.intake("4-candidate-data.txt", "GOOD-1\n");
    let config = env.config(1, "scan_policy = \"skip\"\n");

    let relocator = LocalRelocator::new(&env.input, &env.output).await.unwrap();
    let (tx, rx) = watch::channel(false);
    let task = tokio::spawn(async move {
        service::run_with(&config, Arc::new(relocator), rx).await
    });

    let target = env
        .output
        .join("GOOD-1")
        .join("Application_4")
        .join("4-candidate-data.txt");
    assert!(wait_for(&target, Duration::from_secs(5)).await);

    tx.send(true).unwrap();
    let summary = task.await.unwrap().unwrap();
    assert_eq!(summary.stats.done, 1);
    assert!(env.input.join("abc-candidate-data.txt").exists());
}
