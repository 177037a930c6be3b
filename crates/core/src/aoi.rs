//! Area of interest: a polygon boundary limiting spatial filtering
//! and clipping

use crate::error::{Error, Result};
use crate::raster::Raster;
use geo::Contains;
use geo_types::{Coord, LineString, Point, Polygon};

/// Area of Interest: a single closed polygon ring.
///
/// Immutable for the duration of a pipeline run. All spatial filtering
/// and clipping goes through this type.
#[derive(Debug, Clone)]
pub struct Aoi {
    polygon: Polygon<f64>,
}

impl Aoi {
    /// Build an AOI from an exterior ring of (x, y) vertices.
    ///
    /// The ring is closed automatically if the last vertex differs
    /// from the first.
    pub fn from_ring(ring: &[(f64, f64)]) -> Result<Self> {
        if ring.len() < 3 {
            return Err(Error::DegenerateAoi(ring.len()));
        }
        let coords: Vec<Coord<f64>> = ring.iter().map(|&(x, y)| Coord { x, y }).collect();
        let polygon = Polygon::new(LineString::new(coords), vec![]);
        Ok(Self { polygon })
    }

    /// Bounding box (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for c in self.polygon.exterior().coords() {
            min_x = min_x.min(c.x);
            min_y = min_y.min(c.y);
            max_x = max_x.max(c.x);
            max_y = max_y.max(c.y);
        }
        (min_x, min_y, max_x, max_y)
    }

    /// Whether a geographic point lies inside the AOI
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.polygon.contains(&Point::new(x, y))
    }

    /// Whether a bounding box (min_x, min_y, max_x, max_y) overlaps
    /// the AOI's bounding box
    pub fn intersects_bbox(&self, bbox: (f64, f64, f64, f64)) -> bool {
        let (min_x, min_y, max_x, max_y) = self.bounds();
        bbox.0 <= max_x && bbox.2 >= min_x && bbox.1 <= max_y && bbox.3 >= min_y
    }

    /// Exterior ring vertices as (x, y) pairs, including the closing
    /// vertex
    pub fn ring(&self) -> Vec<(f64, f64)> {
        self.polygon
            .exterior()
            .coords()
            .map(|c| (c.x, c.y))
            .collect()
    }

    /// GeoJSON Polygon geometry as a string, for export region
    /// parameters
    pub fn to_geojson_string(&self) -> String {
        let ring: Vec<[f64; 2]> = self
            .polygon
            .exterior()
            .coords()
            .map(|c| [c.x, c.y])
            .collect();
        serde_json::json!({
            "type": "Polygon",
            "coordinates": [ring],
        })
        .to_string()
    }

    /// Clip a raster to the AOI: pixels whose centers fall outside the
    /// polygon become NaN. The input grid and transform are preserved.
    pub fn clip(&self, raster: &Raster<f64>) -> Raster<f64> {
        let (rows, cols) = raster.shape();
        let mut out = raster.clone();
        out.set_nodata(Some(f64::NAN));

        for row in 0..rows {
            for col in 0..cols {
                let (x, y) = raster.transform().pixel_to_geo(col, row);
                if !self.contains(x, y) {
                    unsafe { out.set_unchecked(row, col, f64::NAN) };
                }
            }
        }
        out
    }
}
