use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

pub struct Metrics {
    registry: Registry,
    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    xero_api_requests_total: IntCounterVec,
    xero_token_refresh_total: IntCounterVec,
}

static METRICS: OnceLock<Metrics> = OnceLock::new();

fn build() -> Result<Metrics, prometheus::Error> {
    let registry = Registry::new();

    let http_requests_total = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "path", "status"],
    )?;
    let http_request_duration_seconds = HistogramVec::new(
        HistogramOpts::new(
            "http_request_duration_seconds",
            "HTTP request duration in seconds",
        ),
        &["method", "path", "status"],
    )?;
    let xero_api_requests_total = IntCounterVec::new(
        Opts::new("xero_api_requests_total", "Calls made to the Xero API"),
        &["endpoint", "status"],
    )?;
    let xero_token_refresh_total = IntCounterVec::new(
        Opts::new("xero_token_refresh_total", "Xero refresh-token grants by outcome"),
        &["outcome"],
    )?;

    registry.register(Box::new(http_requests_total.clone()))?;
    registry.register(Box::new(http_request_duration_seconds.clone()))?;
    registry.register(Box::new(xero_api_requests_total.clone()))?;
    registry.register(Box::new(xero_token_refresh_total.clone()))?;

    Ok(Metrics {
        registry,
        http_requests_total,
        http_request_duration_seconds,
        xero_api_requests_total,
        xero_token_refresh_total,
    })
}

/// Register collectors. Safe to call more than once.
pub fn init_metrics() {
    if METRICS.get().is_some() {
        return;
    }
    match build() {
        Ok(metrics) => {
            let _ = METRICS.set(metrics);
        }
        Err(e) => tracing::error!("Failed to initialize metrics: {}", e),
    }
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    if let Some(m) = METRICS.get() {
        let status = status.to_string();
        let labels = [method, path, status.as_str()];
        m.http_requests_total.with_label_values(&labels).inc();
        m.http_request_duration_seconds
            .with_label_values(&labels)
            .observe(duration_secs);
    }
}

pub fn record_xero_call(endpoint: &str, status: u16) {
    if let Some(m) = METRICS.get() {
        let status = status.to_string();
        m.xero_api_requests_total
            .with_label_values(&[endpoint, status.as_str()])
            .inc();
    }
}

/// `outcome` is one of `success`, `rejected`, `error`.
pub fn record_token_refresh(outcome: &str) {
    if let Some(m) = METRICS.get() {
        m.xero_token_refresh_total.with_label_values(&[outcome]).inc();
    }
}

pub fn get_metrics() -> String {
    let Some(m) = METRICS.get() else {
        return "# Metrics registry not initialized\n".to_string();
    };

    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&m.registry.gather(), &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return format!("# Failed to encode metrics: {}\n", e);
    }

    String::from_utf8(buffer).unwrap_or_default()
}
