pub mod config;
pub mod error;
pub mod replan;
pub mod telemetry;
