// geodata_server/server/src/main.rs
use geodata_server_core::operational::monitoring::{init_logging, GeoMetrics};
use geodata_server_core::{GeoEngine, GeoEngineConfig};

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[cfg(all(feature = "jemalloc", not(target_env = "msvc")))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

fn load_config() -> anyhow::Result<GeoEngineConfig> {
    match std::env::args().nth(1) {
        Some(path) => GeoEngineConfig::from_yaml_file(&path)
            .with_context(|| format!("Failed to read configuration from {}", path)),
        None => {
            info!("No configuration file given, using defaults.");
            Ok(GeoEngineConfig::default())
        }
    }
}

fn log_stats(engine: &GeoEngine) {
    for line in engine.stats_lines() {
        info!("[GeoStats] {}", line);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("PANIC: {}", panic_info);
        if let Some(location) = panic_info.location() {
            eprintln!("Location: {}:{}:{}", location.file(), location.line(), location.column());
        }
    }));

    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {:?}", e);
        return Err(e);
    }

    info!(
        "Geodata server {} ({} build, {}) starting up...",
        built_info::PKG_VERSION,
        built_info::PROFILE,
        built_info::RUSTC_VERSION
    );

    let config = load_config()?;
    let metrics = match config.metrics_listen {
        Some(listen) => {
            let metrics = GeoMetrics::install(listen)?;
            info!("Prometheus exporter listening on {}", listen);
            Some(metrics)
        }
        None => None,
    };
    let stats_interval = config.stats_log_interval_secs;

    // Region decoding is CPU bound and runs on rayon; keep it off the runtime threads.
    let engine = match tokio::task::spawn_blocking(move || GeoEngine::load(config))
        .await
        .context("Geodata load task failed")?
    {
        Ok(engine) => Arc::new(engine),
        Err(e) => {
            error!("Failed to load geodata: {}", e);
            return Err(e.into());
        }
    };
    info!("Load report: {}", serde_json::to_string(engine.load_report())?);

    let stats_engine = engine.clone();
    let stats_task = tokio::spawn(async move {
        if stats_interval == 0 {
            return;
        }
        let mut ticker = tokio::time::interval(Duration::from_secs(stats_interval));
        ticker.tick().await;
        loop {
            ticker.tick().await;
            log_stats(&stats_engine);
            if let Some(metrics) = &metrics {
                metrics.record_uptime();
            }
        }
    });

    tokio::signal::ctrl_c().await.context("Failed to listen for the shutdown signal")?;
    info!("Shutdown signal received.");
    stats_task.abort();
    log_stats(&engine);
    Ok(())
}
