//! Pipeline configuration
//!
//! Every constant the upstream scripts kept as free-standing module
//! globals lives here as a named field, passed explicitly into each
//! computation step.

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// An inclusive date window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Window start as a UTC timestamp (midnight)
    pub fn start_utc(&self) -> DateTime<Utc> {
        self.start
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default()
            .and_utc()
    }

    /// Window end as a UTC timestamp (end of day)
    pub fn end_utc(&self) -> DateTime<Utc> {
        self.end
            .and_hms_opt(23, 59, 59)
            .unwrap_or_default()
            .and_utc()
    }
}

/// Min/max stretch for rendering one output layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VizRange {
    pub min: f64,
    pub max: f64,
}

/// Configuration for one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// AOI exterior ring as (x, y) vertices
    pub aoi_ring: Vec<(f64, f64)>,
    /// Reference period (Landsat-5 archive)
    pub before_window: DateWindow,
    /// Current period (Landsat-8 archive)
    pub after_window: DateWindow,
    /// Scenes at or above this metadata cloud cover are dropped
    #[serde(default = "default_cloud_threshold")]
    pub cloud_threshold: f64,
    /// Calendar months kept by the seasonal filter, inclusive
    #[serde(default = "default_months")]
    pub months: (u32, u32),
    /// Ground sample distance for exports, in map units
    #[serde(default = "default_scale")]
    pub export_scale: f64,
    /// Stretch for the percent-change layer
    #[serde(default = "default_change_viz")]
    pub change_viz: VizRange,
    /// Stretch for the z-score anomaly layer
    #[serde(default = "default_anomaly_viz")]
    pub anomaly_viz: VizRange,
}

fn default_cloud_threshold() -> f64 {
    30.0
}

fn default_months() -> (u32, u32) {
    (7, 8)
}

fn default_scale() -> f64 {
    30.0
}

fn default_change_viz() -> VizRange {
    VizRange {
        min: -50.0,
        max: 20.0,
    }
}

fn default_anomaly_viz() -> VizRange {
    VizRange {
        min: -3.0,
        max: 2.0,
    }
}

impl PipelineConfig {
    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: PipelineConfig =
            serde_json::from_str(&text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.aoi_ring.len() < 3 {
            return Err(Error::DegenerateAoi(self.aoi_ring.len()));
        }
        if self.cloud_threshold < 0.0 || self.cloud_threshold > 100.0 {
            return Err(Error::InvalidParameter {
                name: "cloud_threshold",
                value: self.cloud_threshold.to_string(),
                reason: "must be a percentage in 0..=100".to_string(),
            });
        }
        let (lo, hi) = self.months;
        if lo < 1 || hi > 12 || lo > hi {
            return Err(Error::InvalidParameter {
                name: "months",
                value: format!("{lo}..={hi}"),
                reason: "must be an ascending range within 1..=12".to_string(),
            });
        }
        if self.export_scale <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "export_scale",
                value: self.export_scale.to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Month filter as an inclusive range
    pub fn month_range(&self) -> std::ops::RangeInclusive<u32> {
        self.months.0..=self.months.1
    }
}

impl Default for PipelineConfig {
    /// Default mirrors the published analysis: Perry Ridge-style AOI
    /// placeholder, 1990-2000 reference vs 2018-2019 current, July and
    /// August scenes under 30% cloud.
    fn default() -> Self {
        Self {
            aoi_ring: vec![
                (-117.73, 49.73),
                (-117.73, 49.54),
                (-117.50, 49.54),
                (-117.50, 49.73),
            ],
            before_window: DateWindow::new(
                NaiveDate::from_ymd_opt(1990, 1, 1).unwrap_or_default(),
                NaiveDate::from_ymd_opt(2000, 12, 31).unwrap_or_default(),
            ),
            after_window: DateWindow::new(
                NaiveDate::from_ymd_opt(2018, 1, 1).unwrap_or_default(),
                NaiveDate::from_ymd_opt(2019, 12, 31).unwrap_or_default(),
            ),
            cloud_threshold: default_cloud_threshold(),
            months: default_months(),
            export_scale: default_scale(),
            change_viz: default_change_viz(),
            anomaly_viz: default_anomaly_viz(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_month_range() {
        let mut config = PipelineConfig::default();
        config.months = (9, 2);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let mut config = PipelineConfig::default();
        config.cloud_threshold = 180.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn roundtrips_through_json() {
        let config = PipelineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.months, config.months);
        assert_eq!(back.before_window, config.before_window);
    }

    #[test]
    fn window_bounds_cover_whole_days() {
        let window = DateWindow::new(
            NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
        );
        assert!(window.start_utc() < window.end_utc());
    }
}
