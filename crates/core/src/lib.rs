//! # Vegtrack Core
//!
//! Core types for the vegtrack NDVI change-detection toolkit.
//!
//! This crate provides:
//! - `Raster<T>`: georeferenced 2D grid
//! - `GeoTransform`: affine georeferencing
//! - `Scene`: a multi-band acquisition with QA band and metadata
//! - `SceneCollection`: filterable, mappable set of scenes
//! - `Aoi`: polygon area of interest with raster clipping
//! - `PipelineConfig`: named configuration for a pipeline run
//! - Native GeoTIFF I/O

pub mod aoi;
pub mod collection;
pub mod config;
pub mod error;
pub mod io;
pub mod raster;
pub mod scene;

pub use aoi::Aoi;
pub use collection::SceneCollection;
pub use config::{DateWindow, PipelineConfig, VizRange};
pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};
pub use scene::{Scene, Sensor};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::aoi::Aoi;
    pub use crate::collection::SceneCollection;
    pub use crate::config::PipelineConfig;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{GeoTransform, Raster, RasterElement};
    pub use crate::scene::{Scene, Sensor};
}
