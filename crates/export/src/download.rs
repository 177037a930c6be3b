//! Direct downloads: write a finished raster to a staging directory
//! and hand back a `file://` URL
//!
//! Mirrors the upstream "signed download URL" path: the ground sample
//! distance is fixed at 30 units, a single raster is written as-is,
//! and a collection is mosaicked first.

use crate::error::{ExportError, Result};
use crate::raster_ops::{mosaic_first_valid, resample_nearest};
use std::path::Path;
use tracing::info;
use vegtrack_core::aoi::Aoi;
use vegtrack_core::io::write_geotiff;
use vegtrack_core::raster::Raster;

/// Fixed ground sample distance for direct downloads, in map units
pub const DOWNLOAD_SCALE: f64 = 30.0;

/// What is being downloaded: one raster, or a collection of
/// equally-gridded rasters (mosaicked first)
pub enum DownloadSource {
    Image(Raster<f64>),
    Collection(Vec<Raster<f64>>),
}

/// Produce a download URL for the source clipped to a GeoJSON Polygon
/// region.
///
/// The raster is clipped, resampled to [`DOWNLOAD_SCALE`], written
/// into `staging_dir`, and returned as a `file://` URL. Every failure
/// surfaces as an [`ExportError`] carrying its cause.
pub fn download_url(
    source: DownloadSource,
    region_geojson: &str,
    label: &str,
    staging_dir: &Path,
) -> Result<String> {
    let aoi = parse_region(region_geojson)?;

    let raster = match source {
        DownloadSource::Image(r) => {
            info!("generating download URL for image");
            r
        }
        DownloadSource::Collection(rasters) => {
            info!(count = rasters.len(), "generating download URL for collection");
            mosaic_first_valid(&rasters)?
        }
    };

    let clipped = aoi.clip(&raster);
    let resampled = resample_nearest(&clipped, DOWNLOAD_SCALE)?;

    std::fs::create_dir_all(staging_dir)?;
    let path = staging_dir.join(format!("{label}.tif"));
    write_geotiff(&resampled, &path)?;

    Ok(format!("file://{}", path.display()))
}

/// Parse a GeoJSON Polygon geometry string into an AOI
fn parse_region(region_geojson: &str) -> Result<Aoi> {
    let value: serde_json::Value = serde_json::from_str(region_geojson)
        .map_err(|e| ExportError::InvalidRegion(e.to_string()))?;

    if value.get("type").and_then(|t| t.as_str()) != Some("Polygon") {
        return Err(ExportError::InvalidRegion(
            "region must be a GeoJSON Polygon".to_string(),
        ));
    }

    let ring = value
        .get("coordinates")
        .and_then(|c| c.get(0))
        .and_then(|r| r.as_array())
        .ok_or_else(|| ExportError::InvalidRegion("missing exterior ring".to_string()))?;

    let vertices: Vec<(f64, f64)> = ring
        .iter()
        .filter_map(|pair| {
            let x = pair.get(0)?.as_f64()?;
            let y = pair.get(1)?.as_f64()?;
            Some((x, y))
        })
        .collect();

    if vertices.len() != ring.len() {
        return Err(ExportError::InvalidRegion(
            "ring vertices must be [x, y] number pairs".to_string(),
        ));
    }

    Aoi::from_ring(&vertices).map_err(ExportError::Core)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vegtrack_core::raster::GeoTransform;

    fn test_raster(value: f64) -> Raster<f64> {
        let mut r = Raster::filled(10, 10, value);
        r.set_transform(GeoTransform::new(0.0, 300.0, 30.0, -30.0));
        r
    }

    fn region() -> String {
        Aoi::from_ring(&[(0.0, 0.0), (300.0, 0.0), (300.0, 300.0), (0.0, 300.0)])
            .unwrap()
            .to_geojson_string()
    }

    #[test]
    fn image_download_returns_file_url() {
        let dir = tempfile::tempdir().unwrap();
        let url =
            download_url(DownloadSource::Image(test_raster(0.4)), &region(), "change", dir.path())
                .unwrap();

        assert!(url.starts_with("file://"));
        assert!(url.ends_with("change.tif"));
    }

    #[test]
    fn collection_is_mosaicked_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = test_raster(1.0);
        a.set(0, 0, f64::NAN).unwrap();
        let b = test_raster(2.0);

        let url = download_url(
            DownloadSource::Collection(vec![a, b]),
            &region(),
            "mosaic",
            dir.path(),
        )
        .unwrap();
        assert!(url.ends_with("mosaic.tif"));
    }

    #[test]
    fn malformed_region_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = download_url(
            DownloadSource::Image(test_raster(1.0)),
            "{\"type\":\"Point\"}",
            "bad",
            dir.path(),
        );
        assert!(matches!(result, Err(ExportError::InvalidRegion(_))));
    }

    #[test]
    fn empty_collection_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = download_url(
            DownloadSource::Collection(vec![]),
            &region(),
            "empty",
            dir.path(),
        );
        assert!(matches!(result, Err(ExportError::EmptyMosaic)));
    }
}
