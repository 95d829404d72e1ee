//! Kitchen order lifecycle: pricing, persistence, payment initiation and the
//! status pipeline a kitchen display monitors.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod utils;
