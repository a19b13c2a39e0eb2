// geodata_server/server/src/operational/monitoring/metrics.rs
use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Prometheus exporter handle plus the recording helpers used across the
/// engine. Recording goes through the global `metrics` recorder, so the helpers
/// are no-ops until an exporter is installed.
pub struct GeoMetrics {
    start_time: Instant,
}

impl GeoMetrics {
    pub fn install(listen: SocketAddr) -> Result<Self> {
        PrometheusBuilder::new()
            .with_http_listener(listen)
            .install()
            .context("Failed to install Prometheus exporter")?;

        describe_counter!("geo_regions_loaded_total", "Region files loaded");
        describe_counter!("geo_regions_failed_total", "Region files rejected as malformed");
        describe_counter!("geo_pathfind_total", "Pathfinding requests by outcome");
        describe_counter!("geo_path_buffer_overflows_total", "Path buffer requests served by a temporary buffer");
        describe_counter!("geo_obstacle_updates_total", "Obstacle registrations and removals");
        describe_histogram!("geo_path_filter_seconds", "Time spent string pulling found paths");
        describe_histogram!("geo_path_search_seconds", "Time a path buffer was held for one search");
        describe_gauge!("geo_obstacles_active", "Registered obstacles");
        describe_gauge!("geo_uptime_seconds", "Seconds since the exporter was installed");

        Ok(GeoMetrics { start_time: Instant::now() })
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn record_uptime(&self) {
        gauge!("geo_uptime_seconds").set(self.uptime().as_secs_f64());
    }

    pub fn record_regions(loaded: usize, failed: usize) {
        counter!("geo_regions_loaded_total").increment(loaded as u64);
        counter!("geo_regions_failed_total").increment(failed as u64);
    }

    pub fn record_pathfind(success: bool) {
        let outcome = if success { "success" } else { "fail" };
        counter!("geo_pathfind_total", "outcome" => outcome).increment(1);
    }

    pub fn record_buffer_overflow(size: usize) {
        counter!("geo_path_buffer_overflows_total", "size" => size.to_string()).increment(1);
    }

    pub fn record_search_time(duration: Duration) {
        histogram!("geo_path_search_seconds").record(duration.as_secs_f64());
    }

    pub fn record_filter_time(duration: Duration) {
        histogram!("geo_path_filter_seconds").record(duration.as_secs_f64());
    }

    pub fn record_obstacle_update(registered: bool, active: usize) {
        let action = if registered { "register" } else { "unregister" };
        counter!("geo_obstacle_updates_total", "action" => action).increment(1);
        gauge!("geo_obstacles_active").set(active as f64);
    }
}

/// Installs the global tracing subscriber. `RUST_LOG` overrides the default
/// filter; `GEO_LOG_FORMAT=json` switches to JSON lines.
pub fn init_logging() -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let json = std::env::var("GEO_LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "geodata_server_core=info,warn".into()))
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(|| fmt::layer()))
        .try_init()
        .context("Failed to initialize tracing subscriber")?;

    Ok(())
}
