use prometheus::{Encoder, TextEncoder};

/// Render the default registry in Prometheus text format.
pub fn render() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;

    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

/// Service counters.
///
/// [`init`](counters::init) registers everything in the default registry.
/// Recording functions are no-ops until then, so library users and tests
/// never need a registry.
pub mod counters {
    use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts};
    use std::sync::OnceLock;
    use tracing::warn;

    // ============================================================================
    // DECISION METRICS
    // ============================================================================

    static DECISIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
    static DECISION_DURATION: OnceLock<HistogramVec> = OnceLock::new();
    static BACKUPS_PER_DECISION: OnceLock<Histogram> = OnceLock::new();

    // ============================================================================
    // REFERENCE DATA METRICS
    // ============================================================================

    static PROVIDER_ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
    static SEED_RELOADS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

    /// Create and register all metrics. Safe to call more than once.
    pub fn init() {
        let registry = prometheus::default_registry();

        macro_rules! register {
            ($slot:expr, $metric:expr) => {
                match $metric {
                    Ok(metric) => {
                        if $slot.get().is_none() {
                            if let Err(e) = registry.register(Box::new(metric.clone())) {
                                warn!(error = %e, "failed to register metric");
                            }
                            let _ = $slot.set(metric);
                        }
                    }
                    Err(e) => warn!(error = %e, "failed to create metric"),
                }
            };
        }

        register!(
            DECISIONS_TOTAL,
            IntCounterVec::new(
                Opts::new("lcrd_decisions_total", "Routing decisions by outcome"),
                &["outcome"],
            )
        );
        register!(
            DECISION_DURATION,
            HistogramVec::new(
                HistogramOpts::new(
                    "lcrd_decision_duration_seconds",
                    "Time to compose a routing decision",
                )
                .buckets(vec![0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]),
                &["outcome"],
            )
        );
        register!(
            BACKUPS_PER_DECISION,
            Histogram::with_opts(
                HistogramOpts::new(
                    "lcrd_backups_per_decision",
                    "Backup connectors returned per successful decision",
                )
                .buckets(vec![0.0, 1.0, 2.0, 3.0, 5.0, 8.0]),
            )
        );
        register!(
            PROVIDER_ERRORS_TOTAL,
            IntCounterVec::new(
                Opts::new("lcrd_provider_errors_total", "Reference data read failures"),
                &["op"],
            )
        );
        register!(
            SEED_RELOADS_TOTAL,
            IntCounterVec::new(
                Opts::new("lcrd_seed_reloads_total", "Reference seed reload attempts"),
                &["result"],
            )
        );
    }

    // ============================================================================
    // RECORDING FUNCTIONS
    // ============================================================================

    pub fn decision(outcome: &str, duration_secs: f64) {
        if let Some(c) = DECISIONS_TOTAL.get() {
            c.with_label_values(&[outcome]).inc();
        }
        if let Some(h) = DECISION_DURATION.get() {
            h.with_label_values(&[outcome]).observe(duration_secs);
        }
    }

    pub fn backups(count: usize) {
        if let Some(h) = BACKUPS_PER_DECISION.get() {
            h.observe(count as f64);
        }
    }

    pub fn provider_error(op: &str) {
        if let Some(c) = PROVIDER_ERRORS_TOTAL.get() {
            c.with_label_values(&[op]).inc();
        }
    }

    pub fn seed_reload(success: bool) {
        if let Some(c) = SEED_RELOADS_TOTAL.get() {
            c.with_label_values(&[if success { "ok" } else { "failed" }]).inc();
        }
    }
}
