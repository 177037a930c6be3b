//! Temporal reducers over a scene collection
//!
//! Per-pixel aggregates of one band across every scene in a
//! collection. NaN observations are excluded; a pixel with no valid
//! observation at all reduces to NaN.

use crate::indices::build_output;
use crate::maybe_rayon::*;
use vegtrack_core::collection::SceneCollection;
use vegtrack_core::raster::Raster;
use vegtrack_core::{Error, Result};

/// Per-pixel temporal mean of `band` across the collection
pub fn temporal_mean(collection: &SceneCollection, band: &str) -> Result<Raster<f64>> {
    let bands = collect_bands(collection, band)?;
    let (rows, cols) = bands[0].shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let mut sum = 0.0;
                let mut count = 0usize;
                for b in &bands {
                    let v = unsafe { b.get_unchecked(row, col) };
                    if !v.is_nan() {
                        sum += v;
                        count += 1;
                    }
                }
                if count > 0 {
                    row_data[col] = sum / count as f64;
                }
            }
            row_data
        })
        .collect();

    build_output(bands[0], rows, cols, data)
}

/// Per-pixel population standard deviation of `band` across the
/// collection (divide by n, matching the archive reducer)
pub fn temporal_stddev(collection: &SceneCollection, band: &str) -> Result<Raster<f64>> {
    let bands = collect_bands(collection, band)?;
    let (rows, cols) = bands[0].shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let mut sum = 0.0;
                let mut count = 0usize;
                for b in &bands {
                    let v = unsafe { b.get_unchecked(row, col) };
                    if !v.is_nan() {
                        sum += v;
                        count += 1;
                    }
                }
                if count == 0 {
                    continue;
                }
                let mean = sum / count as f64;
                let mut ss = 0.0;
                for b in &bands {
                    let v = unsafe { b.get_unchecked(row, col) };
                    if !v.is_nan() {
                        ss += (v - mean) * (v - mean);
                    }
                }
                row_data[col] = (ss / count as f64).sqrt();
            }
            row_data
        })
        .collect();

    build_output(bands[0], rows, cols, data)
}

/// Gather the named band from every scene, checking grid agreement
fn collect_bands<'a>(collection: &'a SceneCollection, band: &str) -> Result<Vec<&'a Raster<f64>>> {
    if collection.is_empty() {
        return Err(Error::EmptyCollection);
    }
    let bands = collection
        .iter()
        .map(|s| s.band(band))
        .collect::<Result<Vec<_>>>()?;

    let (rows, cols) = bands[0].shape();
    for b in &bands[1..] {
        if b.shape() != (rows, cols) {
            return Err(Error::SizeMismatch {
                er: rows,
                ec: cols,
                ar: b.rows(),
                ac: b.cols(),
            });
        }
    }
    Ok(bands)
}
