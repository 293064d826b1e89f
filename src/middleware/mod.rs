pub mod http_metrics;
pub mod persist;
