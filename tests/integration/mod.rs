//! Integration tests for the routeguide content pipeline

mod config_integration;
mod logging_init;
mod pipeline_scenario;
mod queue_backpressure;
mod test_utils;

pub use test_utils::*;
