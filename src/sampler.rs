// Live-metrics sampler: per-metric and per-volume state, periodic tick.
// The tick loop runs in a spawned task; row publication and mode commands
// are serialized through one select loop so a tick can never interleave
// with a mode switch.

use crate::models::{MetricSample, RowSet, VolumeState};
use crate::providers::{MetricCounter, MetricProvider, ProviderError};
use crate::sort::DisplayState;
use indexmap::IndexMap;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{Duration, Instant, interval};

/// Rate limit for "no receivers" logging (avoid logging every second when no
/// shell is attached to /ws/rows).
const NO_RECEIVERS_WARN_INTERVAL: Duration = Duration::from_secs(60);

const COMMAND_CHANNEL_CAPACITY: usize = 8;

pub const CPU_KEY: &str = "CPU";
pub const MEMORY_USED_KEY: &str = "MemoryUsed";
pub const MEMORY_FREE_KEY: &str = "MemoryFree";

/// Stable row key for a volume.
pub fn volume_key(name: &str) -> String {
    format!("Disk:{name}")
}

// Row display labels.
const CPU_LABEL: &str = "Загрузка процессора";
const MEMORY_USED_LABEL: &str = "Используемая память";
const MEMORY_FREE_LABEL: &str = "Свободная память";

const BYTES_PER_GIGABYTE: f64 = 1024.0 * 1024.0 * 1024.0;

/// Owns the per-metric and per-volume state of the live-metrics view.
/// Rows are keyed by stable identity; a tick replaces rows per key, so row
/// order stays fixed across refresh cycles.
pub struct MetricsSampler {
    provider: Arc<dyn MetricProvider>,
    volumes: Vec<VolumeState>,
    rows: IndexMap<String, MetricSample>,
}

impl MetricsSampler {
    pub fn new(provider: Arc<dyn MetricProvider>) -> Self {
        Self {
            provider,
            volumes: Vec::new(),
            rows: IndexMap::new(),
        }
    }

    /// Discover fixed volumes and capture their total capacity. Done once
    /// per session; capacities are never re-read afterwards.
    pub async fn initialize(&mut self) -> Result<(), ProviderError> {
        let names = self.provider.fixed_volumes().await?;
        let mut volumes = Vec::with_capacity(names.len());
        for name in names {
            let total_mb = self.provider.volume_capacity_mb(&name).await?;
            volumes.push(VolumeState { name, total_mb });
        }
        self.volumes = volumes;
        Ok(())
    }

    pub fn volumes(&self) -> &[VolumeState] {
        &self.volumes
    }

    /// Current row set in stable display order.
    pub fn rows(&self) -> Vec<MetricSample> {
        self.rows.values().cloned().collect()
    }

    /// One sampling cycle. Reads all counters, then replaces rows per key.
    /// CPU/memory read failures abort the tick before any row is touched;
    /// a failed per-volume read only drops that volume's row for this tick.
    pub async fn tick(&mut self) -> Result<Vec<MetricSample>, ProviderError> {
        let cpu_percent = self.provider.read_counter(&MetricCounter::ProcessorTotal).await?;
        let committed_bytes = self.provider.read_counter(&MetricCounter::CommittedBytes).await?;
        let available_mb = self
            .provider
            .read_counter(&MetricCounter::AvailableMegabytes)
            .await?;

        self.replace(CPU_KEY, CPU_LABEL, format!("{cpu_percent:.2}%"));
        self.replace(
            MEMORY_USED_KEY,
            MEMORY_USED_LABEL,
            format!("{:.2} GB", committed_bytes / BYTES_PER_GIGABYTE),
        );
        self.replace(
            MEMORY_FREE_KEY,
            MEMORY_FREE_LABEL,
            format!("{available_mb:.2} MB"),
        );

        for volume in self.volumes.clone() {
            let key = volume_key(&volume.name);
            let counter = MetricCounter::VolumeFreeMegabytes(volume.name.clone());
            let reading = self.provider.read_counter(&counter).await;
            match reading {
                Ok(free_mb) => {
                    let used_mb = (volume.total_mb as f64 - free_mb).max(0.0);
                    self.replace(
                        &key,
                        &format!("Диск {}", volume.name),
                        format!(
                            "Занято: {:.0} MB, Свободно: {:.0} MB, Всего: {} MB",
                            used_mb, free_mb, volume.total_mb
                        ),
                    );
                }
                Err(e) => {
                    // Volume vanished since discovery: omit its row, keep ticking.
                    tracing::debug!(
                        error = %e,
                        volume = %volume.name,
                        operation = "read_volume_free",
                        "volume not readable this tick, omitting row"
                    );
                    self.rows.shift_remove(&key);
                }
            }
        }

        Ok(self.rows())
    }

    fn replace(&mut self, key: &str, label: &str, formatted_value: String) {
        self.rows.insert(
            key.to_string(),
            MetricSample {
                key: key.to_string(),
                label: label.to_string(),
                formatted_value,
            },
        );
    }
}

/// Live-metrics mode selection from the shell.
pub enum SamplerCommand {
    Start,
    /// Stop ticking; the ack fires once the loop has processed the command,
    /// i.e. no tick is in flight or will run until the next Start.
    Stop(oneshot::Sender<()>),
}

/// Control handle held by the serving surface.
#[derive(Clone)]
pub struct SamplerHandle {
    cmd_tx: mpsc::Sender<SamplerCommand>,
}

impl SamplerHandle {
    pub async fn start(&self) {
        if self.cmd_tx.send(SamplerCommand::Start).await.is_err() {
            tracing::debug!("Sampler task gone, start ignored");
        }
    }

    /// Stop-before-switch: resolves only after the sampler loop has
    /// acknowledged, so the caller may safely replace the display surface.
    pub async fn stop(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.cmd_tx.send(SamplerCommand::Stop(ack_tx)).await.is_err() {
            return; // task gone: nothing is ticking
        }
        let _ = ack_rx.await;
    }
}

pub fn command_channel() -> (SamplerHandle, mpsc::Receiver<SamplerCommand>) {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
    (SamplerHandle { cmd_tx }, cmd_rx)
}

/// Channels, display surface, and shutdown for the sampler task.
pub struct SamplerDeps {
    pub sampler: MetricsSampler,
    pub tx: broadcast::Sender<RowSet>,
    pub display: Arc<std::sync::Mutex<DisplayState>>,
    pub command_rx: mpsc::Receiver<SamplerCommand>,
    pub ws_connections: Arc<AtomicUsize>,
    pub shutdown_rx: oneshot::Receiver<()>,
}

/// Sampler timing and logging config.
pub struct SamplerConfig {
    pub interval_ms: u64,
    /// How often to log app stats (real seconds).
    pub stats_log_interval_secs: u64,
}

pub fn spawn(deps: SamplerDeps, config: SamplerConfig) -> tokio::task::JoinHandle<()> {
    let SamplerDeps {
        mut sampler,
        tx,
        display,
        mut command_rx,
        ws_connections,
        mut shutdown_rx,
    } = deps;
    let SamplerConfig {
        interval_ms,
        stats_log_interval_secs,
    } = config;

    let stats_log_interval = Duration::from_secs(stats_log_interval_secs);

    tokio::spawn(async move {
        let mut tick = interval(Duration::from_millis(interval_ms));
        // A provider call slower than the interval skips ticks, never queues them.
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut stats_log_tick = interval(stats_log_interval);
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut running = false;
        let mut ticks_total: u64 = 0;
        let mut last_no_receivers_warn: Option<Instant> = None;

        let sampler_span = tracing::span!(tracing::Level::DEBUG, "sampler", interval_ms);
        let _guard = sampler_span.enter();

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if !running {
                        continue;
                    }
                    match sampler.tick().await {
                        Ok(rows) => {
                            ticks_total += 1;
                            let row_set = RowSet::Metrics(rows);
                            if let Ok(mut surface) = display.lock() {
                                surface.refresh(row_set.clone());
                            }
                            if tx.send(row_set).is_err() {
                                let should_warn = last_no_receivers_warn
                                    .is_none_or(|t| t.elapsed() >= NO_RECEIVERS_WARN_INTERVAL);
                                if should_warn {
                                    tracing::debug!(
                                        operation = "broadcast_rows",
                                        "No attached shells; broadcast channel has no receivers"
                                    );
                                    last_no_receivers_warn = Some(Instant::now());
                                }
                            }
                        }
                        Err(e) => {
                            // Previous rows stay on the surface until a successful refresh.
                            tracing::warn!(
                                error = %e,
                                operation = "sampler_tick",
                                "metric provider read failed, keeping previous rows"
                            );
                        }
                    }
                }
                cmd = command_rx.recv() => {
                    match cmd {
                        Some(SamplerCommand::Start) => {
                            if !running {
                                running = true;
                                if let Ok(mut surface) = display.lock() {
                                    surface.replace(RowSet::Metrics(sampler.rows()));
                                }
                                // First sample right away, like a fresh mode selection.
                                tick.reset_immediately();
                            }
                        }
                        Some(SamplerCommand::Stop(ack)) => {
                            running = false;
                            let _ = ack.send(());
                        }
                        None => {
                            tracing::debug!("Command channel closed");
                            break;
                        }
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Sampler shutting down");
                    break;
                }
                _ = stats_log_tick.tick() => {
                    tracing::info!(
                        running,
                        ticks_total,
                        ws_clients = ws_connections.load(std::sync::atomic::Ordering::Relaxed),
                        "app stats"
                    );
                }
            }
        }
    })
}
