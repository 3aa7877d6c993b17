//! Live data sources polled by the dashboard

pub mod latency;
pub mod system;
