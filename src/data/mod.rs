//! Dataset abstractions consumed by the scorer, the attributor and the metrics.
//!
//! The engine only reads datasets, so it depends on the [`DatasetView`] trait
//! rather than on a storage format. [`Dataset`] is the in-memory implementation:
//! a dense instance-major feature matrix, one relevance label per instance and
//! contiguous query groups.
//!
//! Parsing on-disk formats (e.g. svmlight) is left to the caller; build a
//! [`Dataset`] from the parsed arrays.

mod dataset;
mod traits;

pub use dataset::{Dataset, DatasetError};
pub use traits::{DatasetView, SampleAccessor};
