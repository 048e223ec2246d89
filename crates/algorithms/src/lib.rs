//! # spacor Algorithms
//!
//! Spatial statistics over labeled point clouds: do pairs of measured
//! features co-vary specifically among spatially neighboring observations?
//!
//! ## Pipeline
//!
//! - **adjacency**: Delaunay-based neighbor weight matrices (2D/3D)
//! - **stats**: Moran's I autocorrelation, spatial cross-correlation,
//!   permutation significance, LISA decomposition
//! - **significance**: p-value calibration, BH correction, driving-fraction
//!   filtering of significant patterns
//! - **clustering**: hierarchical grouping of cross-correlated features into
//!   spatial patterns with per-observation summary scores
//!
//! Points flow into [`adjacency::neighbor_weights`]; the resulting weight
//! matrix parameterizes everything in [`stats`]; [`significance`] narrows
//! the feature set; [`clustering::group_patterns`] produces the final
//! pattern groups. All stages take inputs by reference and return new
//! artifacts.

pub mod adjacency;
pub mod clustering;
pub mod maybe_rayon;
pub mod significance;
pub mod stats;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::adjacency::{neighbor_weights, NeighborParams};
    pub use crate::clustering::{
        group_patterns, CutStrategy, DynamicCut, GroupParams, Linkage, PatternGroups,
    };
    pub use crate::significance::{
        bh_adjust, filter_patterns, p_value, Alternative, FilterParams, FilteredPattern,
    };
    pub use crate::stats::{
        lisa_test, moran_table, moran_test, spatial_cross_cor, spatial_cross_cor_matrix,
        spatial_cross_cor_test, CrossCorTest, FeatureStats, LisaResult, MoranResult,
    };
    pub use spacor_core::prelude::*;
}
