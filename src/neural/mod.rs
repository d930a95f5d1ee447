//! Burn-side pieces: the classifier, its checkpoints, the test split and
//! parameter-level noise injection.

pub mod checkpoint;
pub mod data;
pub mod model;
pub mod noise;
pub mod params;
