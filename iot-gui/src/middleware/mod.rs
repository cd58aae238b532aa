pub mod metrics;
pub mod referer;
pub mod tracing;
