//! Per-pixel linear trend over a merged time series
//!
//! Ordinary least squares of an index band against a time covariate,
//! across every scene of a (merged, time-sorted) collection.

use crate::maybe_rayon::*;
use ndarray::Array2;
use vegtrack_core::collection::SceneCollection;
use vegtrack_core::raster::Raster;
use vegtrack_core::scene::Scene;
use vegtrack_core::{Error, Result};

/// Divisor applied to epoch milliseconds before the regression.
/// Keeps slopes away from numeric underflow while staying strictly
/// monotonic in acquisition time.
pub const TIME_SCALE: f64 = 1e18;

/// Time covariate for a scene: epoch milliseconds / [`TIME_SCALE`]
pub fn time_covariate(scene: &Scene) -> f64 {
    scene.timestamp_millis() as f64 / TIME_SCALE
}

/// Intercept and slope rasters of a per-pixel least-squares fit
#[derive(Debug, Clone)]
pub struct LinearFit {
    /// Intercept of index against the time covariate
    pub offset: Raster<f64>,
    /// Slope of index against the time covariate
    pub scale: Raster<f64>,
}

/// Fit `band` against the time covariate per pixel.
///
/// Scenes with equal timestamps contribute as equal-weight duplicate
/// observations. A pixel with fewer than two valid observations, or
/// with no covariate spread among them, is NaN in both outputs.
pub fn linear_fit(collection: &SceneCollection, band: &str) -> Result<LinearFit> {
    if collection.is_empty() {
        return Err(Error::EmptyCollection);
    }

    let mut series: Vec<(f64, &Raster<f64>)> = Vec::with_capacity(collection.len());
    for scene in collection.iter() {
        series.push((time_covariate(scene), scene.band(band)?));
    }

    let (rows, cols) = series[0].1.shape();
    for (_, b) in &series[1..] {
        if b.shape() != (rows, cols) {
            return Err(Error::SizeMismatch {
                er: rows,
                ec: cols,
                ar: b.rows(),
                ac: b.cols(),
            });
        }
    }

    let pairs: Vec<(f64, f64)> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_pairs = vec![(f64::NAN, f64::NAN); cols];
            for col in 0..cols {
                let mut xs = 0.0;
                let mut ys = 0.0;
                let mut n = 0usize;
                for &(t, b) in &series {
                    let v = unsafe { b.get_unchecked(row, col) };
                    if !v.is_nan() {
                        xs += t;
                        ys += v;
                        n += 1;
                    }
                }
                if n < 2 {
                    continue;
                }
                let mean_x = xs / n as f64;
                let mean_y = ys / n as f64;

                let mut sxx = 0.0;
                let mut sxy = 0.0;
                for &(t, b) in &series {
                    let v = unsafe { b.get_unchecked(row, col) };
                    if !v.is_nan() {
                        let dx = t - mean_x;
                        sxx += dx * dx;
                        sxy += dx * (v - mean_y);
                    }
                }
                // sxx is exactly zero when every valid observation
                // shares one timestamp
                if sxx <= 0.0 {
                    continue;
                }
                let slope = sxy / sxx;
                row_pairs[col] = (mean_y - slope * mean_x, slope);
            }
            row_pairs
        })
        .collect();

    let (offset_data, scale_data): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();

    let template = series[0].1;
    let mut offset = template.with_same_meta::<f64>(rows, cols);
    offset.set_nodata(Some(f64::NAN));
    *offset.data_mut() = Array2::from_shape_vec((rows, cols), offset_data)
        .map_err(|e| Error::Other(e.to_string()))?;

    let mut scale = template.with_same_meta::<f64>(rows, cols);
    scale.set_nodata(Some(f64::NAN));
    *scale.data_mut() = Array2::from_shape_vec((rows, cols), scale_data)
        .map_err(|e| Error::Other(e.to_string()))?;

    Ok(LinearFit { offset, scale })
}
