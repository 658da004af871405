//! Ensemble scoring.
//!
//! - [`Scorer`]: walks every tree for every instance and accumulates
//!   weighted leaf outputs
//! - [`Predictions`]: final scores, plus the per-tree breakdown when requested

mod predictions;
mod scorer;

pub use predictions::Predictions;
pub use scorer::{Scorer, DEFAULT_BLOCK_SIZE};
