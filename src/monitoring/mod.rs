/*!
 * Lifecycle Monitoring
 * Process-wide counters and structured tracing setup
 */

mod metrics;
mod tracer;

pub use metrics::{metrics, LifecycleMetrics, MetricsSnapshot};
pub use tracer::init_tracing;
