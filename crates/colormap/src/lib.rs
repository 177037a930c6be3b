//! # VegTrack Colormap
//!
//! Color ramps and raster-to-RGBA rendering for vegetation change layers.
//!
//! Provides the ramps used to visualize NDVI, percent change, and anomaly
//! rasters, plus a generic multi-stop interpolation engine. The main entry
//! point is [`raster_to_rgba`] which converts a `Raster<T>` into an RGBA
//! pixel buffer suitable for writing as a PNG preview.
//!
//! ## Usage
//!
//! ```ignore
//! use vegtrack_colormap::{ColorRamp, ColormapParams, raster_to_rgba};
//!
//! let params = ColormapParams::with_range(ColorRamp::VegetationChange, -50.0, 20.0);
//! let rgba = raster_to_rgba(&raster, &params);
//! ```

mod render;
mod scheme;

pub use render::{auto_params, raster_to_rgba, ColormapParams};
pub use scheme::{evaluate, ColorRamp, ColorStop, Rgb};
