pub mod aggregator;
pub mod latency;
pub mod prometheus;

pub use aggregator::{
    DocumentMetricTotals, DocumentsSummary, JobMetric, JobMetricStatus, JobsSummary,
    MetricsAggregator, MetricsSummary, ParserClassCounts, SystemSummary,
};
pub use latency::{percentile, LatencyBuffer};
