//! Experiment configuration.
//!
//! Records are burn `Config` types, so they serialize to JSON with
//! `save`/`load` and carry `with_*` builders for every defaulted field.

mod experiment;

pub use experiment::{ExperimentConfig, ScheduleConfig};
