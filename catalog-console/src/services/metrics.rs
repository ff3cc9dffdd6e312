//! Prometheus metrics for calls made to the catalog backend.

use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::OnceLock;
use std::time::Duration;

// Global registry
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub static BACKEND_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static BACKEND_REQUEST_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();

pub fn init_metrics() {
    if REGISTRY.get().is_some() {
        return;
    }

    let registry = Registry::new();

    let requests_total = IntCounterVec::new(
        Opts::new(
            "console_backend_requests_total",
            "Total number of requests sent to the catalog backend",
        ),
        &["method", "path", "status"],
    )
    .expect("metric can be created");

    let request_duration = HistogramVec::new(
        HistogramOpts::new(
            "console_backend_request_duration_seconds",
            "Catalog backend request duration in seconds",
        ),
        &["method", "path", "status"],
    )
    .expect("metric can be created");

    registry
        .register(Box::new(requests_total.clone()))
        .expect("collector can be registered");
    registry
        .register(Box::new(request_duration.clone()))
        .expect("collector can be registered");

    let _ = REGISTRY.set(registry);
    let _ = BACKEND_REQUESTS_TOTAL.set(requests_total);
    let _ = BACKEND_REQUEST_DURATION_SECONDS.set(request_duration);
}

/// Record one backend exchange. `status` is `"error"` for transport failures.
/// No-op until `init_metrics` has run.
pub fn record_backend_call(method: &str, path: &str, status: &str, elapsed: Duration) {
    let path = normalize_path(path);
    if let Some(counter) = BACKEND_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[method, &path, status]).inc();
    }
    if let Some(histogram) = BACKEND_REQUEST_DURATION_SECONDS.get() {
        histogram
            .with_label_values(&[method, &path, status])
            .observe(elapsed.as_secs_f64());
    }
}

pub fn get_metrics() -> String {
    let Some(registry) = REGISTRY.get() else {
        return String::new();
    };
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Drop the query string and collapse numeric ids so label cardinality stays bounded.
fn normalize_path(path: &str) -> String {
    let path = path.split('?').next().unwrap_or(path);
    path.split('/')
        .map(|segment| {
            if !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()) {
                ":id"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_and_queries_are_collapsed() {
        assert_eq!(
            normalize_path("/api/images/42?delete_object=true"),
            "/api/images/:id"
        );
        assert_eq!(
            normalize_path("/api/images/7/set-cover"),
            "/api/images/:id/set-cover"
        );
        assert_eq!(normalize_path("/api/products/"), "/api/products/");
    }

    #[test]
    fn recorded_calls_show_up_in_export() {
        init_metrics();
        record_backend_call("GET", "/api/products/3", "200", Duration::from_millis(5));
        let exported = get_metrics();
        assert!(exported.contains("console_backend_requests_total"));
        assert!(exported.contains("path=\"/api/products/:id\""));
    }
}
