use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    // Pre-register counters so they appear even before the first increment.
    counter!("request_executions_total").absolute(0);
    counter!("request_failures_total").absolute(0);
    counter!("stale_results_discarded").absolute(0);
    counter!("strategy_views_failed").absolute(0);

    gauge!("strategies_ready").set(0.0);

    // Histogram is lazily created on first record; force creation.
    histogram!("request_duration_seconds").record(0.0);

    Ok(handle)
}

/// Handle backed by a recorder that is not installed globally. Renders an
/// empty scrape; used where a process-wide recorder may already exist.
pub fn detached_handle() -> PrometheusHandle {
    PrometheusBuilder::new().build_recorder().handle()
}
