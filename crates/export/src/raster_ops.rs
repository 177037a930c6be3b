//! Grid operations used on the way out: resampling and mosaicking

use crate::error::{ExportError, Result};
use vegtrack_core::raster::{GeoTransform, Raster};
use vegtrack_core::Error as CoreError;

/// Resample a raster to a new cell size by nearest neighbour.
///
/// The output grid covers the same geographic extent; cells whose
/// centers fall outside the source grid are NaN.
pub fn resample_nearest(raster: &Raster<f64>, cell_size: f64) -> Result<Raster<f64>> {
    if cell_size <= 0.0 {
        return Err(ExportError::InvalidScale(cell_size));
    }

    let (min_x, min_y, max_x, max_y) = raster.bounds();
    let out_cols = (((max_x - min_x) / cell_size).ceil() as usize).max(1);
    let out_rows = (((max_y - min_y) / cell_size).ceil() as usize).max(1);

    let out_transform = GeoTransform::new(min_x, max_y, cell_size, -cell_size);
    let mut out = raster.with_same_meta::<f64>(out_rows, out_cols);
    out.set_transform(out_transform);
    out.set_nodata(Some(f64::NAN));

    let (src_rows, src_cols) = raster.shape();
    for row in 0..out_rows {
        for col in 0..out_cols {
            let (x, y) = out_transform.pixel_to_geo(col, row);
            let (src_col, src_row) = raster.transform().geo_to_pixel(x, y);
            let value = if src_col >= 0.0 && src_row >= 0.0 {
                let (c, r) = (src_col.floor() as usize, src_row.floor() as usize);
                if r < src_rows && c < src_cols {
                    unsafe { raster.get_unchecked(r, c) }
                } else {
                    f64::NAN
                }
            } else {
                f64::NAN
            };
            unsafe { out.set_unchecked(row, col, value) };
        }
    }
    Ok(out)
}

/// Mosaic a set of equally-gridded rasters, taking the first valid
/// (non-NaN) observation per pixel in input order.
pub fn mosaic_first_valid(rasters: &[Raster<f64>]) -> Result<Raster<f64>> {
    let first = rasters.first().ok_or(ExportError::EmptyMosaic)?;
    let (rows, cols) = first.shape();

    for r in &rasters[1..] {
        if r.shape() != (rows, cols) {
            return Err(ExportError::Core(CoreError::SizeMismatch {
                er: rows,
                ec: cols,
                ar: r.rows(),
                ac: r.cols(),
            }));
        }
    }

    let mut out = first.with_same_meta::<f64>(rows, cols);
    out.set_nodata(Some(f64::NAN));
    for row in 0..rows {
        for col in 0..cols {
            let mut value = f64::NAN;
            for r in rasters {
                let v = unsafe { r.get_unchecked(row, col) };
                if !v.is_nan() {
                    value = v;
                    break;
                }
            }
            unsafe { out.set_unchecked(row, col, value) };
        }
    }
    Ok(out)
}
