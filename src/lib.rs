//! Robustness probe for trained classifiers.
//!
//! A [`sweep::NoiseSweep`] repeatedly adds Gaussian noise to every weight of
//! a burn module, following a [`schedule::NoiseSchedule`], and evaluates
//! the corrupted model on a held-out split after each step.

pub mod config;
pub mod error;
pub mod experiment;
pub mod neural;
pub mod schedule;
pub mod sweep;
pub mod view;

pub use config::{ExperimentConfig, ScheduleConfig};
pub use error::{NoiseError, Result};
pub use schedule::{NoiseSchedule, ScheduleKind};
pub use sweep::{NoiseSweep, ResultSeries, SweepOutcome};
