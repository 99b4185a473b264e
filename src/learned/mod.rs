//! Learned hash adapters
//!
//! A piecewise-linear model trained on a sorted key sample doubles as a hash
//! function with a bounded output range: instead of scrambling bits it
//! predicts each key's rank, so nearly-sorted workloads collide far less
//! than under a classical hash of the same range.

mod model;
mod segment;

pub use model::{SegmentModel, SegmentModelConfig};
pub use segment::{fit_segments, locate, Segment};
