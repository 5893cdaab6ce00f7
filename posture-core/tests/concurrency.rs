//! Concurrency tests for SecurityStateManager
//!
//! These tests validate that check cycles are serialized:
//! - Concurrent rechecks coalesce into the in-flight cycle
//! - A recheck issued during initialization is rejected
//! - The violation counter never loses or interleaves increments
//! - Readers never wait for a running cycle
//! - A cancelled or dropped monitor stops rechecking

use std::sync::Arc;
use std::time::Duration;

use posture_core::{
    EngineConfig, MockSignalProvider, NotInitializedError, RecheckMonitor, RecordingPort, Reply,
    SecurityState, SecurityStateManager, SlowSignalProvider,
};

const DELAY: Duration = Duration::from_millis(50);

fn slow_manager(inner: MockSignalProvider) -> (Arc<SecurityStateManager>, Arc<SlowSignalProvider>) {
    let provider = Arc::new(SlowSignalProvider::wrap(inner, DELAY));
    let manager = Arc::new(SecurityStateManager::with_memory_sink(
        provider.clone(),
        Arc::new(RecordingPort::with_reply(Reply::Drop)),
        EngineConfig::default(),
    ));
    (manager, provider)
}

#[tokio::test(start_paused = true)]
async fn concurrent_initialize_checks_capability_once() {
    let (manager, provider) = slow_manager(MockSignalProvider::new());

    let (a, b) = tokio::join!(manager.initialize(), manager.initialize());

    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(provider.inner().calls().availability_checks, 1);
    assert_eq!(provider.inner().calls().emulator, 1);
}

#[tokio::test(start_paused = true)]
async fn waiting_recheck_coalesces_into_in_flight_cycle() {
    let (manager, provider) = slow_manager(MockSignalProvider::new());
    manager.initialize().await.unwrap();

    let (a, b) = tokio::join!(manager.recheck(), manager.recheck());

    assert_eq!(a.unwrap(), b.unwrap());
    // One probe round for initialize, one for the shared recheck
    assert_eq!(provider.inner().calls().emulator, 2);
}

#[tokio::test(start_paused = true)]
async fn recheck_during_initialize_is_rejected() {
    let (manager, provider) = slow_manager(MockSignalProvider::new());

    let m = Arc::clone(&manager);
    let init = tokio::spawn(async move { m.initialize().await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(matches!(manager.state(), SecurityState::Initializing));

    let err = manager.recheck().await.unwrap_err();
    assert_eq!(err, NotInitializedError::new("initializing"));

    init.await.unwrap().unwrap();
    assert!(matches!(manager.state(), SecurityState::Ready { .. }));
    // Only the initialize cycle probed the device
    assert_eq!(provider.inner().calls().emulator, 1);
}

#[tokio::test(start_paused = true)]
async fn sequential_rechecks_each_run_a_cycle() {
    let (manager, provider) = slow_manager(MockSignalProvider::new());
    manager.initialize().await.unwrap();

    manager.recheck().await.unwrap();
    manager.recheck().await.unwrap();

    assert_eq!(provider.inner().calls().emulator, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn counter_matches_cycles_run_under_contention() {
    let (manager, provider) = slow_manager(MockSignalProvider::new().with_developer_options(true));
    manager.initialize().await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let m = Arc::clone(&manager);
        handles.push(tokio::spawn(async move { m.recheck().await }));
    }

    let mut last_seen = Vec::new();
    for handle in handles {
        last_seen.push(handle.await.unwrap().unwrap().violation_count);
    }

    // One DeveloperOptions violation per cycle actually run
    let cycles = provider.inner().calls().developer_options as u64;
    assert_eq!(manager.get_summary().violation_count, cycles);
    assert!(cycles <= 17);
    assert!(last_seen.iter().all(|&count| count >= 1 && count <= cycles));
}

#[tokio::test(start_paused = true)]
async fn summary_reads_do_not_wait_for_running_cycle() {
    let (manager, _provider) = slow_manager(MockSignalProvider::new());
    let before = manager.initialize().await.unwrap();

    let m = Arc::clone(&manager);
    let recheck = tokio::spawn(async move { m.recheck().await });
    tokio::task::yield_now().await;

    // The cycle is still sleeping in the provider
    assert_eq!(manager.get_summary(), before);
    assert!(matches!(manager.state(), SecurityState::Ready { .. }));

    let after = recheck.await.unwrap().unwrap();
    assert!(after.last_check_at >= before.last_check_at);
}

#[tokio::test(start_paused = true)]
async fn dropped_monitor_stops_rechecking() {
    let provider = Arc::new(MockSignalProvider::new());
    let manager = Arc::new(SecurityStateManager::with_memory_sink(
        provider.clone(),
        Arc::new(RecordingPort::new()),
        EngineConfig::default(),
    ));
    manager.initialize().await.unwrap();

    let handle = RecheckMonitor::spawn(Arc::clone(&manager), Duration::from_secs(10));
    tokio::time::sleep(Duration::from_secs(25)).await;
    assert_eq!(provider.calls().emulator, 3);

    drop(handle);
    tokio::time::sleep(Duration::from_secs(100)).await;
    assert_eq!(provider.calls().emulator, 3);
}

#[tokio::test(start_paused = true)]
async fn cancelled_monitor_lets_in_flight_recheck_finish() {
    let (manager, provider) = slow_manager(MockSignalProvider::new());
    manager.initialize().await.unwrap();

    let handle = RecheckMonitor::spawn(Arc::clone(&manager), Duration::from_secs(1));
    tokio::time::sleep(Duration::from_millis(1010)).await;
    handle.cancel();

    assert_eq!(handle.join().await, 1);
    assert_eq!(provider.inner().calls().emulator, 2);
    assert!(manager.get_summary().last_check_at.is_some());
}
