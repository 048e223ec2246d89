//! Spatial statistics over weight matrices and feature vectors
//!
//! - **moran**: global autocorrelation with analytic randomization moments
//! - **crosscor**: pairwise spatial cross-correlation and permutation tests
//! - **lisa**: per-observation decomposition with conditional permutation

pub mod crosscor;
pub mod lisa;
pub mod moran;

pub use crosscor::{
    spatial_cross_cor, spatial_cross_cor_matrix, spatial_cross_cor_test, CrossCorTest,
};
pub use lisa::{lisa_test, LisaResult};
pub use moran::{moran_table, moran_test, FeatureStats, MoranResult};
