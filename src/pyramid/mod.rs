//! # Pyramid Module
//!
//! Builds the multiresolution levels of one image.
//!
//! ## Levels
//!
//! Level 0 is full resolution. Each further level halves both spatial
//! extents (floor, never below one pixel) by order-0 selection, until the
//! longest side fits [`TARGET_SIZE`]. The level count is fixed before the
//! first write.
//!
//! ## Arrays
//!
//! One array per level, named by the level index. Leading dimensions are
//! t, c, z in that order, each only when the image has more than one entry
//! along it, followed by y and x. Absent planes are never written and keep
//! the array fill value.

mod builder;
mod config;
mod error;
mod planner;
mod stats;

#[cfg(test)]
mod tests;

pub use builder::{PyramidBuilder, PyramidOutput};
pub use config::PyramidConfig;
pub use error::PyramidError;
pub use planner::{level_count, level_count_with_target, TARGET_SIZE};
pub use stats::PyramidStats;
