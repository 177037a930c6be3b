//! Scene manifests: JSON listings that map acquisitions to raster files.
//!
//! A manifest names each scene's sensor, acquisition time, metadata
//! cloud cover, QA raster and spectral bands. Relative paths are
//! resolved against the manifest's own directory, so a manifest can
//! ship alongside its GeoTIFFs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use vegtrack_core::io::read_geotiff;
use vegtrack_core::{Raster, Scene, SceneCollection, Sensor};

#[derive(Debug, Deserialize)]
pub struct SceneManifest {
    pub scenes: Vec<SceneEntry>,
}

/// One scene as declared in the manifest.
#[derive(Debug, Deserialize)]
pub struct SceneEntry {
    /// "landsat5" or "landsat8"
    pub sensor: String,
    /// Acquisition time, RFC 3339
    pub acquired: DateTime<Utc>,
    /// Scene-level cloud cover percentage from the sensor metadata
    pub cloud_cover: f64,
    /// Pixel QA raster (u16 bit flags)
    pub qa: PathBuf,
    /// Band name to GeoTIFF path
    pub bands: BTreeMap<String, PathBuf>,
}

fn parse_sensor(s: &str) -> Result<Sensor> {
    match s.to_lowercase().as_str() {
        "landsat5" | "landsat-5" | "l5" => Ok(Sensor::Landsat5),
        "landsat8" | "landsat-8" | "l8" => Ok(Sensor::Landsat8),
        other => bail!("Unknown sensor: {}. Use landsat5 or landsat8.", other),
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

impl SceneManifest {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse manifest {}", path.display()))
    }

    /// Read every raster the manifest names and assemble the collection.
    ///
    /// `base` is the directory relative paths resolve against, normally
    /// the manifest's parent directory.
    pub fn load_scenes(&self, base: &Path) -> Result<SceneCollection> {
        let mut collection = SceneCollection::new();

        for entry in &self.scenes {
            let sensor = parse_sensor(&entry.sensor)?;
            let qa_path = resolve(base, &entry.qa);
            let qa: Raster<u16> = read_geotiff(&qa_path)
                .with_context(|| format!("Failed to read QA raster {}", qa_path.display()))?;

            let mut scene = Scene::new(sensor, entry.acquired, entry.cloud_cover, qa);
            for (name, path) in &entry.bands {
                let band_path = resolve(base, path);
                let mut band: Raster<f64> = read_geotiff(&band_path).with_context(|| {
                    format!("Failed to read band {} from {}", name, band_path.display())
                })?;
                band.set_nodata(Some(f64::NAN));
                scene.add_band(name.clone(), band)?;
            }
            collection.push(scene);
        }

        Ok(collection)
    }
}

/// Load a manifest and its rasters in one step.
pub fn load_collection(path: &Path) -> Result<SceneCollection> {
    let manifest = SceneManifest::from_file(path)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    manifest.load_scenes(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vegtrack_core::io::write_geotiff;

    #[test]
    fn parse_sensor_aliases() {
        assert_eq!(parse_sensor("landsat5").unwrap(), Sensor::Landsat5);
        assert_eq!(parse_sensor("Landsat-8").unwrap(), Sensor::Landsat8);
        assert_eq!(parse_sensor("L5").unwrap(), Sensor::Landsat5);
        assert!(parse_sensor("sentinel2").is_err());
    }

    #[test]
    fn parse_manifest_json() {
        let text = r#"{
            "scenes": [
                {
                    "sensor": "landsat5",
                    "acquired": "1995-07-12T18:23:00Z",
                    "cloud_cover": 12.5,
                    "qa": "scene1/qa.tif",
                    "bands": { "B3": "scene1/b3.tif", "B4": "scene1/b4.tif" }
                }
            ]
        }"#;
        let manifest: SceneManifest = serde_json::from_str(text).unwrap();
        assert_eq!(manifest.scenes.len(), 1);
        let entry = &manifest.scenes[0];
        assert_eq!(entry.sensor, "landsat5");
        assert_eq!(entry.cloud_cover, 12.5);
        assert_eq!(entry.bands.len(), 2);
    }

    #[test]
    fn load_scenes_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let qa = Raster::<u16>::filled(2, 2, 0);
        write_geotiff(&qa, dir.path().join("qa.tif")).unwrap();
        let band = Raster::<f64>::filled(2, 2, 0.5);
        write_geotiff(&band, dir.path().join("b3.tif")).unwrap();
        write_geotiff(&band, dir.path().join("b4.tif")).unwrap();

        let manifest_path = dir.path().join("scenes.json");
        std::fs::write(
            &manifest_path,
            r#"{
                "scenes": [
                    {
                        "sensor": "landsat5",
                        "acquired": "1995-07-12T18:23:00Z",
                        "cloud_cover": 5.0,
                        "qa": "qa.tif",
                        "bands": { "B3": "b3.tif", "B4": "b4.tif" }
                    }
                ]
            }"#,
        )
        .unwrap();

        let collection = load_collection(&manifest_path).unwrap();
        assert_eq!(collection.len(), 1);
        let scene = collection.first().unwrap();
        assert_eq!(scene.sensor(), Sensor::Landsat5);
        assert_eq!(scene.shape(), (2, 2));
        assert!(scene.has_band("B3"));
        assert!(scene.has_band("B4"));
    }

    #[test]
    fn missing_raster_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = dir.path().join("scenes.json");
        std::fs::write(
            &manifest_path,
            r#"{
                "scenes": [
                    {
                        "sensor": "landsat8",
                        "acquired": "2018-07-01T00:00:00Z",
                        "cloud_cover": 0.0,
                        "qa": "nope.tif",
                        "bands": {}
                    }
                ]
            }"#,
        )
        .unwrap();
        assert!(load_collection(&manifest_path).is_err());
    }
}
