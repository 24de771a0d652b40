#![allow(clippy::unwrap_used)]
// Integration tests for `DiscoveryScanner` against a scripted platform.

mod common;

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio::time::Instant;

use common::{MockPlatform, device};
use vacbot_api::{DiscoveredDevice, DiscoveryScanner, Error, ScanOptions};

fn options(duration: Duration) -> ScanOptions {
    ScanOptions {
        duration,
        ..ScanOptions::default()
    }
}

fn ids(devices: &[DiscoveredDevice]) -> Vec<String> {
    devices.iter().map(|d| d.id.clone()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_duplicates_are_reported_once() {
    let platform = MockPlatform::with_frames(vec![
        vec![device("A", Some("VacBot A"))],
        vec![device("B", Some("VacBot B"))],
        vec![device("A", Some("VacBot A")), device("B", Some("VacBot B"))],
    ]);
    let scanner = DiscoveryScanner::new(platform, options(Duration::from_secs(3)));

    let found = scanner.collect().await.unwrap();
    assert_eq!(ids(&found), vec!["A".to_owned(), "B".to_owned()]);
}

#[tokio::test(start_paused = true)]
async fn test_name_filter_is_case_insensitive_and_drops_unnamed() {
    let platform = MockPlatform::with_frames(vec![vec![
        device("1", Some("vacbot-x200")),
        device("2", Some("Studio Buds")),
        device("3", None),
        device("4", Some("ROBOCLEAN mini")),
    ]]);
    let scanner = DiscoveryScanner::new(platform, options(Duration::from_secs(2)));

    let found = scanner.collect().await.unwrap();
    assert_eq!(ids(&found), vec!["1".to_owned(), "4".to_owned()]);
}

#[tokio::test(start_paused = true)]
async fn test_unstopped_scan_ends_at_deadline_and_releases_radio() {
    let platform = MockPlatform::with_frames(vec![vec![device("A", Some("VacBot"))]]);
    let scanner = DiscoveryScanner::new(platform.clone(), ScanOptions::default());

    let started = Instant::now();
    let handle = scanner.start(|_| {}).await.unwrap();
    handle.finished().await;

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(10), "ended early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(11), "ended late: {elapsed:?}");
    assert!(handle.is_finished());
    assert_eq!(platform.starts(), 1);
    assert_eq!(platform.stops(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stop_ends_session_and_stops_reporting() {
    let platform = MockPlatform::with_frames(vec![
        vec![device("A", Some("VacBot A"))],
        vec![device("B", Some("VacBot B"))],
    ]);
    let scanner = DiscoveryScanner::new(platform.clone(), ScanOptions::default());

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let handle = scanner
        .start(move |d| sink.lock().unwrap().push(d.id))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(700)).await;
    scanner.stop(&handle).await;
    assert!(handle.is_finished());
    assert_eq!(platform.stops(), 1);

    let before = seen.lock().unwrap().clone();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(*seen.lock().unwrap(), before);
    assert_eq!(before, vec!["A".to_owned()]);
}

#[tokio::test(start_paused = true)]
async fn test_new_scan_supersedes_previous() {
    let platform = MockPlatform::with_frames(vec![vec![device("A", Some("VacBot"))]]);
    let scanner = DiscoveryScanner::new(platform.clone(), ScanOptions::default());

    let first = scanner.start(|_| {}).await.unwrap();
    let second = scanner.start(|_| {}).await.unwrap();

    assert!(first.is_finished());
    assert!(!second.is_finished());
    assert_ne!(first.id(), second.id());
    assert_eq!(platform.starts(), 2);
    assert_eq!(platform.stops(), 1);
    assert!(scanner.is_scanning().await);

    // A stale handle must not stop the newer session.
    scanner.stop(&first).await;
    assert!(scanner.is_scanning().await);

    scanner.shutdown().await;
    assert!(second.is_finished());
    assert_eq!(platform.stops(), 2);
}

#[tokio::test]
async fn test_missing_radio_fails_instead_of_returning_empty() {
    let platform = MockPlatform::new();
    platform.unavailable.store(true, Ordering::SeqCst);
    let scanner = DiscoveryScanner::new(platform, ScanOptions::default());

    let result = scanner.collect().await;
    assert!(
        matches!(result, Err(Error::TransportUnavailable { .. })),
        "got: {result:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn test_stalled_listing_still_ends_at_deadline() {
    let platform = MockPlatform::with_frames(vec![vec![device("A", Some("VacBot"))]]);
    platform.stall_listing.store(true, Ordering::SeqCst);
    let scanner = DiscoveryScanner::new(platform.clone(), options(Duration::from_secs(3)));

    let started = Instant::now();
    let found = tokio::time::timeout(Duration::from_secs(60), scanner.collect())
        .await
        .expect("scan outlived its budget")
        .unwrap();

    assert!(found.is_empty());
    assert!(started.elapsed() < Duration::from_secs(4), "ended late: {:?}", started.elapsed());
    assert_eq!(platform.stops(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_stop_does_not_hold_the_session_open() {
    let platform = MockPlatform::with_frames(vec![vec![device("A", Some("VacBot"))]]);
    platform.stall_stop.store(true, Ordering::SeqCst);
    let scanner = DiscoveryScanner::new(platform.clone(), options(Duration::from_secs(2)));

    let handle = scanner.start(|_| {}).await.unwrap();
    tokio::time::timeout(Duration::from_secs(30), handle.finished())
        .await
        .expect("session never finished");

    assert!(handle.is_finished());
    assert_eq!(platform.stops(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_radio_start_times_out() {
    let platform = MockPlatform::new();
    platform.stall_start.store(true, Ordering::SeqCst);
    let scanner = DiscoveryScanner::new(platform, ScanOptions::default());

    let result = scanner.start(|_| {}).await;
    assert!(
        matches!(result, Err(Error::Timeout { operation: "scan start", .. })),
        "got: {result:?}"
    );
    assert!(!scanner.is_scanning().await);
}
