use anyhow::Result;
use hwscope::*;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    let (rows_tx, _) =
        broadcast::channel::<models::RowSet>(app_config.sampling.broadcast_capacity);

    let repo = Arc::new(sysinfo_repo::SysinfoRepo::new());
    let mut metrics_sampler = sampler::MetricsSampler::new(repo.clone());
    metrics_sampler
        .initialize()
        .await
        .map_err(|e| anyhow::anyhow!("volume discovery: {}", e))?;
    tracing::info!(
        volumes = metrics_sampler.volumes().len(),
        "Fixed volumes discovered"
    );

    let display = Arc::new(std::sync::Mutex::new(sort::DisplayState::default()));
    let ws_connections = Arc::new(AtomicUsize::new(0));
    let (sampler_handle, command_rx) = sampler::command_channel();
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let sampler_task = sampler::spawn(
        sampler::SamplerDeps {
            sampler: metrics_sampler,
            tx: rows_tx.clone(),
            display: display.clone(),
            command_rx,
            ws_connections: ws_connections.clone(),
            shutdown_rx,
        },
        sampler::SamplerConfig {
            interval_ms: app_config.sampling.interval_ms,
            stats_log_interval_secs: app_config.sampling.stats_log_interval_secs,
        },
    );

    let app = routes::app(
        rows_tx,
        repo.clone(),
        repo,
        sampler_handle,
        display,
        ws_connections,
    );
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    let in_container = std::path::Path::new("/.dockerenv").exists()
        || std::env::var("CONTAINER").as_deref() == Ok("1");

    if in_container {
        // In a container: run server until error or SIGTERM (no signal handler; avoids immediate exit)
        axum::serve(listener, app).await?;
    } else {
        tokio::select! {
            result = axum::serve(listener, app) => {
                result?;
            }
            _ = async {
                #[cfg(unix)]
                {
                    let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                        Ok(s) => s,
                        Err(_) => {
                            let _ = tokio::signal::ctrl_c().await;
                            return;
                        }
                    };
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {}
                        _ = sigterm.recv() => {}
                    }
                }
                #[cfg(not(unix))]
                {
                    tokio::signal::ctrl_c().await
                }
            } => {
                tracing::info!("Received shutdown signal");
                let _ = shutdown_tx.send(());
                let _ = sampler_task.await;
            }
        }
    }

    Ok(())
}
