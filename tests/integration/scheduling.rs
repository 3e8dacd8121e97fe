//! Scheduling tests for backend monitors
//!
//! These tests verify the polling cadence:
//! - No poll happens before one full interval has passed
//! - Backends poll independently of each other
//! - Shutdown waits for a poll that is already in flight
//! - Failed poll cycles keep the schedule alive

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use pulsewatch::monitor::{Monitor, MonitorHandle};
use tokio::sync::broadcast;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

#[tokio::test]
async fn test_no_poll_before_first_interval() {
    let mock_server = MockServer::start().await;

    let request_count = Arc::new(AtomicUsize::new(0));
    let request_count_clone = request_count.clone();

    Mock::given(method("GET"))
        .and(path("/healthy"))
        .respond_with(move |_req: &wiremock::Request| {
            request_count_clone.fetch_add(1, Ordering::SeqCst);
            ResponseTemplate::new(200).set_body_json(create_healthy_report_json())
        })
        .mount(&mock_server)
        .await;

    let backend = create_test_backend("api", &format!("{}/healthy", mock_server.uri()), 1);
    let config = Arc::new(create_test_config(vec![], vec![backend.clone()]));
    let dispatcher = create_dispatcher(config);

    let (shutdown_tx, _) = broadcast::channel(1);
    let handle = MonitorHandle::spawn(backend, dispatcher, shutdown_tx.subscribe());

    // Well within the first interval nothing may have been polled
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(
        request_count.load(Ordering::SeqCst),
        0,
        "No poll should happen before the first interval elapses"
    );

    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert!(
        request_count.load(Ordering::SeqCst) >= 1,
        "First poll should have fired after one interval"
    );

    shutdown_tx.send(()).unwrap();
    handle.join().await.unwrap();
}

#[tokio::test]
async fn test_backends_poll_independently() {
    let mock_server = MockServer::start().await;

    let fast_count = Arc::new(AtomicUsize::new(0));
    let fast_count_clone = fast_count.clone();
    Mock::given(method("GET"))
        .and(path("/fast/healthy"))
        .respond_with(move |_req: &wiremock::Request| {
            fast_count_clone.fetch_add(1, Ordering::SeqCst);
            ResponseTemplate::new(200).set_body_json(create_healthy_report_json())
        })
        .mount(&mock_server)
        .await;

    let slow_count = Arc::new(AtomicUsize::new(0));
    let slow_count_clone = slow_count.clone();
    Mock::given(method("GET"))
        .and(path("/slow/healthy"))
        .respond_with(move |_req: &wiremock::Request| {
            slow_count_clone.fetch_add(1, Ordering::SeqCst);
            ResponseTemplate::new(200).set_body_json(create_healthy_report_json())
        })
        .mount(&mock_server)
        .await;

    let fast = create_test_backend("fast", &format!("{}/fast/healthy", mock_server.uri()), 1);
    let slow = create_test_backend("slow", &format!("{}/slow/healthy", mock_server.uri()), 60);
    let config = Arc::new(create_test_config(vec![], vec![fast, slow]));
    let dispatcher = create_dispatcher(config.clone());

    let (shutdown_tx, _) = broadcast::channel(1);
    let monitor = Monitor::new(config, dispatcher, shutdown_tx.clone());
    let monitor_task = tokio::spawn(monitor.run());

    tokio::time::sleep(Duration::from_millis(3500)).await;

    assert!(
        fast_count.load(Ordering::SeqCst) >= 2,
        "Fast backend should have been polled repeatedly"
    );
    assert_eq!(
        slow_count.load(Ordering::SeqCst),
        0,
        "Slow backend should not have been polled yet"
    );

    shutdown_tx.send(()).unwrap();
    monitor_task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_shutdown_waits_for_poll_in_flight() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/healthy"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(create_healthy_report_json())
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let backend = create_test_backend("api", &format!("{}/healthy", mock_server.uri()), 1);
    let config = Arc::new(create_test_config(vec![], vec![backend.clone()]));
    let dispatcher = create_dispatcher(config);

    let started = Instant::now();
    let (shutdown_tx, _) = broadcast::channel(1);
    let handle = MonitorHandle::spawn(backend, dispatcher, shutdown_tx.subscribe());

    // First poll starts at 1s and its response is delayed by 500ms,
    // so this shutdown arrives while the poll is still in flight
    tokio::time::sleep(Duration::from_millis(1200)).await;
    shutdown_tx.send(()).unwrap();

    tokio::time::timeout(Duration::from_secs(3), handle.join())
        .await
        .unwrap()
        .unwrap();

    assert!(
        started.elapsed() >= Duration::from_millis(1450),
        "Shutdown should only complete after the in-flight poll finished"
    );

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1, "Exactly one poll should have happened");
}

#[tokio::test]
async fn test_failed_polls_keep_the_schedule_alive() {
    let mock_server = MockServer::start().await;

    // Body that does not parse as a health report
    Mock::given(method("GET"))
        .and(path("/healthy"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{invalid json"))
        .mount(&mock_server)
        .await;

    let backend = create_test_backend("api", &format!("{}/healthy", mock_server.uri()), 1);
    let config = Arc::new(create_test_config(vec![], vec![backend.clone()]));
    let dispatcher = create_dispatcher(config);

    let (shutdown_tx, _) = broadcast::channel(1);
    let handle = MonitorHandle::spawn(backend, dispatcher, shutdown_tx.subscribe());

    tokio::time::sleep(Duration::from_millis(2600)).await;
    shutdown_tx.send(()).unwrap();
    handle.join().await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert!(
        requests.len() >= 2,
        "Monitor should keep polling after failed cycles"
    );
}
