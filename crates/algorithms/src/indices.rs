//! Normalized difference and NDVI

use crate::maybe_rayon::*;
use ndarray::Array2;
use vegtrack_core::raster::{Raster, RasterElement};
use vegtrack_core::scene::Scene;
use vegtrack_core::{Error, Result};

/// Name of the computed index band on a scene
pub const NDVI_BAND: &str = "NDVI";

/// Compute the normalized difference between two bands:
///
/// `(band_a - band_b) / (band_a + band_b)`
///
/// Result is in [-1, 1] wherever defined. Pixels where either band is
/// nodata, or where the denominator is (near) zero, are NaN, never an
/// error.
pub fn normalized_difference(band_a: &Raster<f64>, band_b: &Raster<f64>) -> Result<Raster<f64>> {
    check_dimensions(band_a, band_b)?;

    let (rows, cols) = band_a.shape();
    let nodata_a = band_a.nodata();
    let nodata_b = band_b.nodata();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let a = unsafe { band_a.get_unchecked(row, col) };
                let b = unsafe { band_b.get_unchecked(row, col) };

                if a.is_nodata(nodata_a) || b.is_nodata(nodata_b) {
                    continue;
                }

                let sum = a + b;
                if sum.abs() < 1e-10 {
                    continue; // division by zero is no-data
                }

                row_data[col] = (a - b) / sum;
            }
            row_data
        })
        .collect();

    build_output(band_a, rows, cols, data)
}

/// Normalized Difference Vegetation Index
///
/// `NDVI = (NIR - Red) / (NIR + Red)`
pub fn ndvi(nir: &Raster<f64>, red: &Raster<f64>) -> Result<Raster<f64>> {
    normalized_difference(nir, red)
}

/// Compute NDVI from the scene's sensor-specific NIR/red pair and add
/// it as band [`NDVI_BAND`]. Masked pixels stay NaN in the index.
pub fn attach_ndvi(mut scene: Scene) -> Result<Scene> {
    let sensor = scene.sensor();
    let index = {
        let nir = scene.band(sensor.nir_band())?;
        let red = scene.band(sensor.red_band())?;
        ndvi(nir, red)?
    };
    scene.add_band(NDVI_BAND, index)?;
    Ok(scene)
}

fn check_dimensions(a: &Raster<f64>, b: &Raster<f64>) -> Result<()> {
    if a.shape() != b.shape() {
        return Err(Error::SizeMismatch {
            er: a.rows(),
            ec: a.cols(),
            ar: b.rows(),
            ac: b.cols(),
        });
    }
    Ok(())
}

pub(crate) fn build_output(
    template: &Raster<f64>,
    rows: usize,
    cols: usize,
    data: Vec<f64>,
) -> Result<Raster<f64>> {
    let mut output = template.with_same_meta::<f64>(rows, cols);
    output.set_nodata(Some(f64::NAN));
    *output.data_mut() =
        Array2::from_shape_vec((rows, cols), data).map_err(|e| Error::Other(e.to_string()))?;
    Ok(output)
}
