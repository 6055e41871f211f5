pub mod comparison;
pub mod metrics;

pub use comparison::{
    build_action_distribution, build_comparison, strategy_label, ActionCount, ChartStatus,
    ComparisonDatum,
};
pub use metrics::{
    aggregate, classify_metric, derive_metrics, format_report, return_pct, Aggregate,
    CombinedMetrics, DerivedMetrics, ExecutionDuration, MetricValue, NamedMetric, RunContext,
    TradeStatistics,
};
