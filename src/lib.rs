//! Rate-controlled fake log producer for load-testing HTTP log ingestion.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod payload;
pub mod rate;
pub mod roles;
pub mod transport;
