//! # Vegtrack Algorithms
//!
//! Per-scene and per-collection computation for the NDVI toolkit:
//!
//! - **mask**: QA bitmask cloud/shadow masking per Landsat generation
//! - **indices**: normalized difference and NDVI
//! - **temporal**: per-pixel mean and standard deviation reducers
//! - **change**: percent change and z-score anomaly rasters
//! - **trend**: merged-series per-pixel ordinary least squares fit

pub mod change;
pub mod indices;
pub mod mask;
mod maybe_rayon;
pub mod temporal;
pub mod trend;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::change::{percent_change, zscore_anomaly};
    pub use crate::indices::{attach_ndvi, ndvi, normalized_difference, NDVI_BAND};
    pub use crate::mask::{landsat5_keep_mask, landsat8_keep_mask, mask_scene};
    pub use crate::temporal::{temporal_mean, temporal_stddev};
    pub use crate::trend::{linear_fit, time_covariate, LinearFit};
    pub use vegtrack_core::prelude::*;
}
