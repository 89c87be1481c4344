//! Prometheus metrics registry and metric definitions.

use once_cell::sync::Lazy;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Opts, Registry, TextEncoder};

/// Global registry under crate namespace
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    Registry::new_custom(Some("vehicle_telemetry".into()), None)
        .expect("failed to create Prometheus registry")
});

/// Total HTTP requests handled
pub static HTTP_REQUEST_COUNTER: Lazy<IntCounter> = Lazy::new(|| {
    let opts = Opts::new("http_requests_total", "Total number of HTTP requests handled");
    let c = IntCounter::with_opts(opts).expect("counter opts");
    REGISTRY.register(Box::new(c.clone())).unwrap();
    c
});

/// Total records inserted (API and importer)
pub static INSERT_COUNTER: Lazy<IntCounter> = Lazy::new(|| {
    let opts = Opts::new("records_inserted_total", "Total number of telemetry records inserted");
    let c = IntCounter::with_opts(opts).expect("counter opts");
    REGISTRY.register(Box::new(c.clone())).unwrap();
    c
});

/// Total rows loaded by the CSV importer
pub static IMPORT_COUNTER: Lazy<IntCounter> = Lazy::new(|| {
    let opts = Opts::new("rows_imported_total", "Total number of CSV rows imported");
    let c = IntCounter::with_opts(opts).expect("counter opts");
    REGISTRY.register(Box::new(c.clone())).unwrap();
    c
});

/// Histogram of filtered-query durations
pub static QUERY_HISTOGRAM: Lazy<Histogram> = Lazy::new(|| {
    let opts = HistogramOpts::new(
        "query_duration_seconds",
        "Duration of vehicle data queries in seconds",
    );
    let h = Histogram::with_opts(opts).expect("histogram opts");
    REGISTRY.register(Box::new(h.clone())).unwrap();
    h
});

/// Encode all metrics as text
pub fn gather_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let mf = REGISTRY.gather();
    encoder.encode(&mf, &mut buffer).expect("failed to encode");
    String::from_utf8(buffer).expect("invalid utf8")
}
