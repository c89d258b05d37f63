mod metrics;
mod tracing;

pub use self::metrics::{counters, render as render_metrics};
pub use self::tracing::{init_tracing, shutdown_tracing, TracingConfig};
