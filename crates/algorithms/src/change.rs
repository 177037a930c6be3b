//! Change and anomaly rasters from two aggregation windows

use crate::indices::build_output;
use crate::maybe_rayon::*;
use vegtrack_core::raster::Raster;
use vegtrack_core::{Error, Result};

/// Percent change between two temporal means:
///
/// `100 * (after - before) / before`
///
/// NaN wherever either mean is NaN or the reference mean is (near)
/// zero.
pub fn percent_change(before_mean: &Raster<f64>, after_mean: &Raster<f64>) -> Result<Raster<f64>> {
    combine(before_mean, after_mean, |before, after| {
        if before.abs() < 1e-10 {
            f64::NAN
        } else {
            100.0 * (after - before) / before
        }
    })
}

/// Z-score anomaly of the after-window mean against the reference
/// window:
///
/// `(after - before) / before_stddev`
///
/// NaN wherever an operand is NaN or the reference deviation is (near)
/// zero.
pub fn zscore_anomaly(
    before_mean: &Raster<f64>,
    after_mean: &Raster<f64>,
    before_stddev: &Raster<f64>,
) -> Result<Raster<f64>> {
    check_shape(before_mean, after_mean)?;
    check_shape(before_mean, before_stddev)?;
    let (rows, cols) = before_mean.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let before = unsafe { before_mean.get_unchecked(row, col) };
                let after = unsafe { after_mean.get_unchecked(row, col) };
                let sd = unsafe { before_stddev.get_unchecked(row, col) };

                if before.is_nan() || after.is_nan() || sd.is_nan() || sd.abs() < 1e-10 {
                    continue;
                }
                row_data[col] = (after - before) / sd;
            }
            row_data
        })
        .collect();

    build_output(before_mean, rows, cols, data)
}

fn combine(
    before: &Raster<f64>,
    after: &Raster<f64>,
    f: impl Fn(f64, f64) -> f64 + Send + Sync,
) -> Result<Raster<f64>> {
    check_shape(before, after)?;
    let (rows, cols) = before.shape();

    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for col in 0..cols {
                let b = unsafe { before.get_unchecked(row, col) };
                let a = unsafe { after.get_unchecked(row, col) };
                if b.is_nan() || a.is_nan() {
                    continue;
                }
                row_data[col] = f(b, a);
            }
            row_data
        })
        .collect();

    build_output(before, rows, cols, data)
}

fn check_shape(a: &Raster<f64>, b: &Raster<f64>) -> Result<()> {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn band(value: f64) -> Raster<f64> {
        Raster::filled(3, 3, value)
    }

    #[test]
    fn percent_change_formula() {
        let before = band(0.4);
        let after = band(0.5);

        let change = percent_change(&before, &after).unwrap();
        // 100 * 0.1 / 0.4 = 25.0
        assert!((change.get(1, 1).unwrap() - 25.0).abs() < 1e-10);
    }

    #[test]
    fn percent_change_zero_reference_is_nodata() {
        let before = band(0.0);
        let after = band(0.5);

        let change = percent_change(&before, &after).unwrap();
        assert!(change.get(1, 1).unwrap().is_nan());
    }

    #[test]
    fn zscore_formula() {
        let before = band(0.4);
        let after = band(0.5);
        let sd = band(0.05);

        let anomaly = zscore_anomaly(&before, &after, &sd).unwrap();
        // (0.5 - 0.4) / 0.05 = 2.0
        assert!((anomaly.get(1, 1).unwrap() - 2.0).abs() < 1e-10);
    }

    #[test]
    fn zscore_zero_deviation_is_nodata() {
        let anomaly = zscore_anomaly(&band(0.4), &band(0.5), &band(0.0)).unwrap();
        assert!(anomaly.get(0, 0).unwrap().is_nan());
    }

    #[test]
    fn nan_operands_propagate() {
        let mut before = band(0.4);
        before.set(0, 0, f64::NAN).unwrap();

        let change = percent_change(&before, &band(0.5)).unwrap();
        assert!(change.get(0, 0).unwrap().is_nan());
        assert!(!change.get(1, 1).unwrap().is_nan());
    }

    #[test]
    fn shape_mismatch_is_an_error() {
        let a = Raster::filled(3, 3, 0.4);
        let b = Raster::filled(3, 4, 0.5);
        assert!(percent_change(&a, &b).is_err());
    }
}
