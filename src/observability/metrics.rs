use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use tracing::info;
use std::sync::Arc;
use tokio::sync::OnceCell;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| async {
        info!("Initializing Metrics ...");
        Metrics::new()}
    ).await
}

pub const OUTCOME_CACHE_HIT: &str = "cache_hit";
pub const OUTCOME_ISSUED: &str = "issued";
pub const OUTCOME_FAILED: &str = "failed";

pub const LOOKUP_HIT: &str = "hit";
pub const LOOKUP_MISS: &str = "miss";
pub const LOOKUP_EXPIRED: &str = "expired";
pub const LOOKUP_ERROR: &str = "error";

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Provider metrics
    pub token_acquisitions: IntCounterVec,
    pub issuance_failures: IntCounterVec,
    pub issuance_duration: HistogramVec,
    pub token_cancellations: IntCounter,

    // Cache metrics
    pub cache_lookups: IntCounterVec,
    pub cache_failures: IntCounterVec,
    pub cached_tokens: IntGauge,

    // Config/runtime
    pub config_validation_errors: IntCounter,
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("stsprovider".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Provider
            token_acquisitions: IntCounterVec::new(Opts::new("token_acquisitions_total", "Token acquisitions by outcome"),&["outcome"],).unwrap(),
            issuance_failures: IntCounterVec::new(Opts::new("issuance_failures_total", "Issuer round-trip failures by reason"),&["reason"],).unwrap(),
            issuance_duration: HistogramVec::new(HistogramOpts::new("issuance_duration_seconds", "Issuer round-trip duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),&["applies_to"],).unwrap(),
            token_cancellations: IntCounter::new("token_cancellations_total", "Tokens canceled by callers").unwrap(),

            // Cache
            cache_lookups: IntCounterVec::new(Opts::new("cache_lookups_total", "Cache lookups by result"),&["result"],).unwrap(),
            cache_failures: IntCounterVec::new(Opts::new("cache_failures_total", "Cache backend failures by operation"),&["operation"],).unwrap(),
            cached_tokens: IntGauge::new("cached_tokens", "Tokens held by the in-memory cache").unwrap(),

            // Config/runtime
            config_validation_errors: IntCounter::new("config_validation_errors_total","Validation errors during startup",).unwrap(),
            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.token_acquisitions.clone())).unwrap();
        reg.register(Box::new(metrics.issuance_failures.clone())).unwrap();
        reg.register(Box::new(metrics.issuance_duration.clone())).unwrap();
        reg.register(Box::new(metrics.token_cancellations.clone())).unwrap();
        reg.register(Box::new(metrics.cache_lookups.clone())).unwrap();
        reg.register(Box::new(metrics.cache_failures.clone())).unwrap();
        reg.register(Box::new(metrics.cached_tokens.clone())).unwrap();
        reg.register(Box::new(metrics.config_validation_errors.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
