// Sampler tests: discovery, tick formatting, clamping, degraded-continue,
// and the spawned task lifecycle over the broadcast channel.

mod common;

use common::FakeMetricProvider;
use hwscope::models::RowSet;
use hwscope::sampler::{self, MetricsSampler, SamplerConfig, SamplerDeps, volume_key};
use hwscope::sort::DisplayState;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::{broadcast, oneshot};

async fn sampler_with(provider: Arc<FakeMetricProvider>) -> MetricsSampler {
    let mut sampler = MetricsSampler::new(provider);
    sampler.initialize().await.expect("initialize");
    sampler
}

#[tokio::test]
async fn tick_emits_unique_keys() {
    let provider = Arc::new(
        FakeMetricProvider::new()
            .with_volume("C:", 512000, 128000.0)
            .with_volume("D:", 256000, 64000.0),
    );
    let mut sampler = sampler_with(provider).await;
    let rows = sampler.tick().await.expect("tick");
    let keys: HashSet<&str> = rows.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys.len(), rows.len(), "duplicate keys in tick output");
    assert_eq!(rows.len(), 5); // CPU + used + free + 2 volumes
}

#[tokio::test]
async fn cpu_and_free_memory_rows_format_two_decimals() {
    let mut provider = FakeMetricProvider::new();
    provider.cpu_percent = 37.5;
    provider.available_mb = 2048.0;
    let mut sampler = sampler_with(Arc::new(provider)).await;
    let rows = sampler.tick().await.expect("tick");
    let cpu = rows.iter().find(|r| r.key == sampler::CPU_KEY).unwrap();
    assert_eq!(cpu.label, "Загрузка процессора");
    assert_eq!(cpu.formatted_value, "37.50%");
    let free = rows
        .iter()
        .find(|r| r.key == sampler::MEMORY_FREE_KEY)
        .unwrap();
    assert_eq!(free.formatted_value, "2048.00 MB");
}

#[tokio::test]
async fn memory_used_row_formats_gigabytes() {
    let mut provider = FakeMetricProvider::new();
    provider.committed_bytes = 8589934592.0;
    let mut sampler = sampler_with(Arc::new(provider)).await;
    let rows = sampler.tick().await.expect("tick");
    let used = rows
        .iter()
        .find(|r| r.key == sampler::MEMORY_USED_KEY)
        .unwrap();
    assert_eq!(used.label, "Используемая память");
    assert_eq!(used.formatted_value, "8.00 GB");
}

#[tokio::test]
async fn disk_row_formats_used_free_total() {
    let provider = Arc::new(FakeMetricProvider::new().with_volume("C:", 512000, 128000.0));
    let mut sampler = sampler_with(provider).await;
    let rows = sampler.tick().await.expect("tick");
    let disk = rows.iter().find(|r| r.key == volume_key("C:")).unwrap();
    assert_eq!(disk.label, "Диск C:");
    assert_eq!(
        disk.formatted_value,
        "Занято: 384000 MB, Свободно: 128000 MB, Всего: 512000 MB"
    );
}

#[tokio::test]
async fn used_space_clamps_to_zero_on_stale_free_reading() {
    let provider = Arc::new(FakeMetricProvider::new().with_volume("C:", 512000, 600000.0));
    let mut sampler = sampler_with(provider).await;
    let rows = sampler.tick().await.expect("tick");
    let disk = rows.iter().find(|r| r.key == volume_key("C:")).unwrap();
    assert!(
        disk.formatted_value.starts_with("Занято: 0 MB"),
        "stale reading must clamp, got {}",
        disk.formatted_value
    );
}

#[tokio::test]
async fn vanished_volume_row_is_omitted_not_fatal() {
    let provider = Arc::new(
        FakeMetricProvider::new()
            .with_volume("C:", 512000, 128000.0)
            .with_volume("D:", 256000, 64000.0),
    );
    let mut sampler = sampler_with(provider.clone()).await;
    let rows = sampler.tick().await.expect("tick");
    assert!(rows.iter().any(|r| r.key == volume_key("D:")));

    provider.drop_volume_reading("D:");
    let rows = sampler.tick().await.expect("tick after unplug");
    assert!(
        !rows.iter().any(|r| r.key == volume_key("D:")),
        "vanished volume must be omitted from the tick output"
    );
    assert!(rows.iter().any(|r| r.key == volume_key("C:")));
}

#[tokio::test]
async fn failed_counter_read_aborts_tick_and_keeps_rows() {
    let provider = Arc::new(FakeMetricProvider::new().with_volume("C:", 512000, 128000.0));
    let mut sampler = sampler_with(provider.clone()).await;
    let before = sampler.tick().await.expect("tick");

    provider.fail_cpu(true);
    sampler.tick().await.expect_err("tick must surface the failure");
    assert_eq!(
        sampler.rows(),
        before,
        "previous rows must survive a failed tick"
    );
}

#[tokio::test]
async fn row_identity_is_stable_across_ticks() {
    let provider = Arc::new(FakeMetricProvider::new().with_volume("C:", 512000, 128000.0));
    let mut sampler = sampler_with(provider.clone()).await;
    let first = sampler.tick().await.expect("tick");
    provider.set_free("C:", 100000.0);
    let second = sampler.tick().await.expect("tick");
    let first_keys: Vec<&String> = first.iter().map(|r| &r.key).collect();
    let second_keys: Vec<&String> = second.iter().map(|r| &r.key).collect();
    assert_eq!(first_keys, second_keys, "row order must not change per tick");
    let disk = second.iter().find(|r| r.key == volume_key("C:")).unwrap();
    assert!(disk.formatted_value.starts_with("Занято: 412000 MB"));
}

// Spawn the task, start via command, expect metric row sets on the
// broadcast channel, then stop and expect silence after the ack.
#[tokio::test]
async fn sampler_task_start_tick_stop() {
    let provider = Arc::new(FakeMetricProvider::new().with_volume("C:", 512000, 128000.0));
    let sampler = sampler_with(provider).await;

    let (tx, mut rx) = broadcast::channel(16);
    let display = Arc::new(std::sync::Mutex::new(DisplayState::default()));
    let (handle, command_rx) = sampler::command_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let task = sampler::spawn(
        SamplerDeps {
            sampler,
            tx,
            display: display.clone(),
            command_rx,
            ws_connections: Arc::new(AtomicUsize::new(0)),
            shutdown_rx,
        },
        SamplerConfig {
            interval_ms: 25,
            stats_log_interval_secs: 3600,
        },
    );

    handle.start().await;
    let rows = tokio::time::timeout(tokio::time::Duration::from_secs(2), rx.recv())
        .await
        .expect("tick within deadline")
        .expect("broadcast open");
    match rows {
        RowSet::Metrics(rows) => assert!(!rows.is_empty()),
        other => panic!("expected metric rows, got {other:?}"),
    }
    assert!(
        display.lock().unwrap().current.is_some(),
        "tick must refresh the display surface"
    );

    handle.stop().await;
    // Drain anything broadcast before the ack, then expect silence.
    while rx.try_recv().is_ok() {}
    let after_stop = tokio::time::timeout(tokio::time::Duration::from_millis(150), rx.recv()).await;
    assert!(after_stop.is_err(), "no ticks may run after a stop ack");

    let _ = shutdown_tx.send(());
    task.await.unwrap();
}

// Stop on an idle sampler must ack immediately, not wedge the caller.
#[tokio::test]
async fn stop_without_start_acks_immediately() {
    let provider = Arc::new(FakeMetricProvider::new());
    let sampler = sampler_with(provider).await;

    let (tx, mut rx) = broadcast::channel(16);
    let (handle, command_rx) = sampler::command_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let task = sampler::spawn(
        SamplerDeps {
            sampler,
            tx,
            display: Arc::new(std::sync::Mutex::new(DisplayState::default())),
            command_rx,
            ws_connections: Arc::new(AtomicUsize::new(0)),
            shutdown_rx,
        },
        SamplerConfig {
            interval_ms: 25,
            stats_log_interval_secs: 3600,
        },
    );

    tokio::time::timeout(tokio::time::Duration::from_secs(1), handle.stop())
        .await
        .expect("stop on an idle sampler must resolve");

    handle.start().await;
    assert!(
        tokio::time::timeout(tokio::time::Duration::from_secs(2), rx.recv())
            .await
            .is_ok(),
        "sampler must still start after a redundant stop"
    );

    let _ = shutdown_tx.send(());
    task.await.unwrap();
}
