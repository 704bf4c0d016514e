use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{fmt, EnvFilter};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the tracing subscriber and, when enabled, the Prometheus recorder.
pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    init_tracing(settings)?;
    init_metrics(settings)
}

fn init_tracing(settings: &Settings) -> anyhow::Result<()> {
    let telemetry = settings.telemetry();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(&telemetry.log_level));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_span_events(fmt::format::FmtSpan::CLOSE);

    let result = if telemetry.json { builder.json().try_init() } else { builder.try_init() };
    result.map_err(|err| anyhow::anyhow!(err.to_string()))
}

pub(crate) fn init_metrics(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render_metrics() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

/// `VIVA_LOG_LEVEL` governs this crate's own spans; dependencies stay at
/// `info` unless `RUST_LOG` overrides the whole filter.
fn default_filter(level: &str) -> EnvFilter {
    EnvFilter::new(format!("info,viva_api={level}"))
}
