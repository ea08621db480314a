/// Prometheus metrics for production observability
///
/// Counters and histograms for the generation pipeline, exposed in
/// Prometheus text format on `GET /metrics`.
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use prometheus_client::encoding::{EncodeLabelSet, text::encode};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{Histogram, exponential_buckets};
use prometheus_client::registry::Registry;
use std::sync::Arc;

/// Global metrics registry instance
pub static METRICS: Lazy<Arc<MetricsCollector>> = Lazy::new(|| Arc::new(MetricsCollector::new()));

/// Labels for generate-request metrics
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RequestLabels {
    /// Request status ("success", "degraded", "rejected", "error")
    pub status: String,
}

/// Labels for upstream error metrics
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct ErrorLabels {
    /// Error category ("config_error", "upstream_error", "timeout", ...)
    pub category: String,
}

/// Central metrics collector with Prometheus registry
pub struct MetricsCollector {
    registry: RwLock<Registry>,

    /// Total generate requests by outcome
    pub generate_requests_total: Family<RequestLabels, Counter>,

    /// Generate request latency in seconds (includes the upstream call)
    pub generate_duration_seconds: Histogram,

    /// Requests currently in flight
    pub active_requests: Gauge,

    /// Upstream failures by category
    pub upstream_errors_total: Family<ErrorLabels, Counter>,

    /// Generated code that failed the validator (degraded-success path)
    pub validation_failures_total: Counter,

    /// Preview documents assembled
    pub previews_built_total: Counter,

    /// Preview requests rejected by the safety gate
    pub previews_rejected_total: Counter,
}

impl MetricsCollector {
    /// Create a new metrics collector with all metrics registered
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let generate_requests_total = Family::<RequestLabels, Counter>::default();
        registry.register(
            "pagecraft_generate_requests_total",
            "Total number of generate requests",
            generate_requests_total.clone(),
        );

        // Buckets: 50ms up to ~25s, covering the 30s upstream deadline
        let generate_duration_seconds = Histogram::new(exponential_buckets(0.05, 2.0, 10));
        registry.register(
            "pagecraft_generate_duration_seconds",
            "Generate request latency histogram in seconds",
            generate_duration_seconds.clone(),
        );

        let active_requests = Gauge::default();
        registry.register(
            "pagecraft_active_requests",
            "Number of generate requests currently being processed",
            active_requests.clone(),
        );

        let upstream_errors_total = Family::<ErrorLabels, Counter>::default();
        registry.register(
            "pagecraft_upstream_errors_total",
            "Total number of generation failures by category",
            upstream_errors_total.clone(),
        );

        let validation_failures_total = Counter::default();
        registry.register(
            "pagecraft_validation_failures_total",
            "Generated responses flagged by the code validator",
            validation_failures_total.clone(),
        );

        let previews_built_total = Counter::default();
        registry.register(
            "pagecraft_previews_built_total",
            "Preview documents assembled",
            previews_built_total.clone(),
        );

        let previews_rejected_total = Counter::default();
        registry.register(
            "pagecraft_previews_rejected_total",
            "Preview requests rejected by the safety gate",
            previews_rejected_total.clone(),
        );

        Self {
            registry: RwLock::new(registry),
            generate_requests_total,
            generate_duration_seconds,
            active_requests,
            upstream_errors_total,
            validation_failures_total,
            previews_built_total,
            previews_rejected_total,
        }
    }

    /// Encode metrics in Prometheus text format
    pub fn encode(&self) -> String {
        let mut buffer = String::new();
        let registry = self.registry.read();
        encode(&mut buffer, &registry).expect("encoding metrics should succeed");
        buffer
    }

    /// Record a finished generate request
    pub fn record_generate(&self, status: &str, duration: std::time::Duration) {
        self.generate_requests_total
            .get_or_create(&RequestLabels {
                status: status.to_string(),
            })
            .inc();
        self.generate_duration_seconds
            .observe(duration.as_secs_f64());
    }

    /// Record a generation failure by category
    pub fn record_upstream_error(&self, category: &str) {
        self.upstream_errors_total
            .get_or_create(&ErrorLabels {
                category: category.to_string(),
            })
            .inc();
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
