//! A single satellite acquisition: spectral bands, QA band, metadata

use crate::error::{Error, Result};
use crate::raster::Raster;
use chrono::{DateTime, Datelike, Utc};

/// Sensor generation the scene was acquired by.
///
/// Band identifiers for the NIR/red pair differ between the two
/// Landsat generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sensor {
    Landsat5,
    Landsat8,
}

impl Sensor {
    /// Near-infrared band identifier for this sensor
    pub fn nir_band(&self) -> &'static str {
        match self {
            Sensor::Landsat5 => "B4",
            Sensor::Landsat8 => "B5",
        }
    }

    /// Red band identifier for this sensor
    pub fn red_band(&self) -> &'static str {
        match self {
            Sensor::Landsat5 => "B3",
            Sensor::Landsat8 => "B4",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Sensor::Landsat5 => "Landsat-5",
            Sensor::Landsat8 => "Landsat-8",
        }
    }
}

/// A multi-band raster acquisition.
///
/// Bands are added (e.g. a computed index) but never removed. Masking
/// writes NaN into the spectral bands; the QA band itself is left
/// untouched.
#[derive(Debug, Clone)]
pub struct Scene {
    sensor: Sensor,
    acquired: DateTime<Utc>,
    cloud_cover: f64,
    qa: Raster<u16>,
    bands: Vec<(String, Raster<f64>)>,
}

impl Scene {
    pub fn new(sensor: Sensor, acquired: DateTime<Utc>, cloud_cover: f64, qa: Raster<u16>) -> Self {
        Self {
            sensor,
            acquired,
            cloud_cover,
            qa,
            bands: Vec::new(),
        }
    }

    pub fn sensor(&self) -> Sensor {
        self.sensor
    }

    pub fn acquired(&self) -> DateTime<Utc> {
        self.acquired
    }

    /// Acquisition time as epoch milliseconds
    pub fn timestamp_millis(&self) -> i64 {
        self.acquired.timestamp_millis()
    }

    /// Calendar month of acquisition (1-12)
    pub fn month(&self) -> u32 {
        self.acquired.month()
    }

    /// Scene-level cloud cover percentage from the archive metadata
    pub fn cloud_cover(&self) -> f64 {
        self.cloud_cover
    }

    pub fn qa(&self) -> &Raster<u16> {
        &self.qa
    }

    /// Grid dimensions, taken from the QA band
    pub fn shape(&self) -> (usize, usize) {
        self.qa.shape()
    }

    /// Geographic bounds of the scene grid
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        self.qa.bounds()
    }

    /// Add a band, replacing any existing band of the same name.
    /// The band must share the scene's grid dimensions.
    pub fn add_band(&mut self, name: impl Into<String>, band: Raster<f64>) -> Result<()> {
        let (rows, cols) = self.shape();
        if band.shape() != (rows, cols) {
            return Err(Error::SizeMismatch {
                er: rows,
                ec: cols,
                ar: band.rows(),
                ac: band.cols(),
            });
        }
        let name = name.into();
        if let Some(slot) = self.bands.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = band;
        } else {
            self.bands.push((name, band));
        }
        Ok(())
    }

    pub fn band(&self, name: &str) -> Result<&Raster<f64>> {
        self.bands
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, b)| b)
            .ok_or_else(|| Error::BandNotFound(name.to_string()))
    }

    pub fn has_band(&self, name: &str) -> bool {
        self.bands.iter().any(|(n, _)| n == name)
    }

    /// Band names in insertion order
    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Apply a keep-mask to every band: cells where `keep` is 0 become
    /// NaN. Masking propagates through all later aggregation.
    pub fn apply_mask(&mut self, keep: &Raster<u8>) -> Result<()> {
        let (rows, cols) = self.shape();
        if keep.shape() != (rows, cols) {
            return Err(Error::SizeMismatch {
                er: rows,
                ec: cols,
                ar: keep.rows(),
                ac: keep.cols(),
            });
        }
        for (_, band) in &mut self.bands {
            band.set_nodata(Some(f64::NAN));
            for row in 0..rows {
                for col in 0..cols {
                    if unsafe { keep.get_unchecked(row, col) } == 0 {
                        unsafe { band.set_unchecked(row, col, f64::NAN) };
                    }
                }
            }
        }
        Ok(())
    }

    /// Whether any spectral band is nodata at (row, col). Used for the
    /// collection-edge mask.
    pub fn any_band_nodata(&self, row: usize, col: usize) -> bool {
        self.bands.iter().any(|(_, band)| {
            let v = unsafe { band.get_unchecked(row, col) };
            band.is_nodata(v)
        })
    }
}
