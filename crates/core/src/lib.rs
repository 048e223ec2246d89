//! # spacor Core
//!
//! Core value types for the spacor spatial pattern analysis library.
//!
//! This crate provides:
//! - `PointSet`: labeled observation positions in 2D or 3D
//! - `WeightMatrix`: symmetric spatial neighbor weights
//! - `FeatureMatrix`: per-feature measurements with label-based alignment
//! - `Error` / `Result`: shared error handling
//!
//! All types are immutable values: every transformation returns a new
//! artifact, so pipeline stages never mutate each other's outputs.

pub mod error;
pub mod features;
pub mod points;
pub mod weights;

pub use error::{Error, Result};
pub use features::FeatureMatrix;
pub use points::PointSet;
pub use weights::WeightMatrix;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::features::FeatureMatrix;
    pub use crate::points::PointSet;
    pub use crate::weights::WeightMatrix;
}
