//! Business logic services.

pub mod alert_aggregator;
pub mod attack_catalog;
pub mod dates;
pub mod orchestrator;
pub mod parameters;
pub mod polling;
