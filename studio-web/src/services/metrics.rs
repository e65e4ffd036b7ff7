use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prometheus::{IntCounter, IntCounterVec, Opts, Registry};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
pub static PROMETHEUS_REGISTRY: OnceLock<Registry> = OnceLock::new();
pub static QUOTES_SUBMITTED_TOTAL: OnceLock<IntCounter> = OnceLock::new();
pub static RECEIPT_PERSIST_FAILURES_TOTAL: OnceLock<IntCounter> = OnceLock::new();
pub static STORE_REFRESHES_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Installs the HTTP metrics recorder and the studio counters. Safe to call
/// more than once; later calls are no-ops.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_none() {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                let _ = METRICS_HANDLE.set(handle);
            }
            Err(e) => tracing::warn!(error = %e, "Prometheus recorder not installed"),
        }
    }

    if PROMETHEUS_REGISTRY.get().is_some() {
        return;
    }
    if let Err(e) = register_studio_metrics() {
        tracing::warn!(error = %e, "Failed to register studio metrics");
    }
}

fn register_studio_metrics() -> Result<(), prometheus::Error> {
    let registry = Registry::new();

    let quotes = IntCounter::with_opts(Opts::new(
        "quotes_submitted_total",
        "Quotes handed off to the studio",
    ))?;
    let persist_failures = IntCounter::with_opts(Opts::new(
        "receipt_persist_failures_total",
        "Receipts that could not be saved after hand-off",
    ))?;
    let refreshes = IntCounterVec::new(
        Opts::new("store_refreshes_total", "Full table refetches by table"),
        &["table"],
    )?;

    registry.register(Box::new(quotes.clone()))?;
    registry.register(Box::new(persist_failures.clone()))?;
    registry.register(Box::new(refreshes.clone()))?;

    let _ = PROMETHEUS_REGISTRY.set(registry);
    let _ = QUOTES_SUBMITTED_TOTAL.set(quotes);
    let _ = RECEIPT_PERSIST_FAILURES_TOTAL.set(persist_failures);
    let _ = STORE_REFRESHES_TOTAL.set(refreshes);
    Ok(())
}

pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string());

    if let Some(registry) = PROMETHEUS_REGISTRY.get() {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).ok();
        if let Ok(custom_metrics) = String::from_utf8(buffer) {
            output.push_str(&custom_metrics);
        }
    }

    output
}

pub fn record_quote_submitted() {
    if let Some(counter) = QUOTES_SUBMITTED_TOTAL.get() {
        counter.inc();
    }
}

pub fn record_persist_failure() {
    if let Some(counter) = RECEIPT_PERSIST_FAILURES_TOTAL.get() {
        counter.inc();
    }
}

pub fn record_store_refresh(table: &str) {
    if let Some(counter) = STORE_REFRESHES_TOTAL.get() {
        counter.with_label_values(&[table]).inc();
    }
}
