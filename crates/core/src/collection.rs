//! Scene collections: filterable, mappable sets of acquisitions

use crate::aoi::Aoi;
use crate::error::{Error, Result};
use crate::scene::Scene;
use chrono::{DateTime, Utc};
use std::ops::RangeInclusive;

/// An ordered set of scenes sharing a grid schema.
///
/// Filters consume the collection and return a narrowed one, so a
/// pipeline reads as a chain the way the upstream archive queries do.
#[derive(Debug, Clone, Default)]
pub struct SceneCollection {
    scenes: Vec<Scene>,
}

impl SceneCollection {
    pub fn new() -> Self {
        Self { scenes: Vec::new() }
    }

    pub fn from_scenes(scenes: Vec<Scene>) -> Self {
        Self { scenes }
    }

    pub fn push(&mut self, scene: Scene) {
        self.scenes.push(scene);
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn first(&self) -> Result<&Scene> {
        self.scenes.first().ok_or(Error::EmptyCollection)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.iter()
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    /// Keep scenes acquired within [start, end] (inclusive)
    pub fn filter_date(self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.retain(|s| s.acquired() >= start && s.acquired() <= end)
    }

    /// Keep scenes acquired in the given calendar months (1-12),
    /// regardless of year
    pub fn filter_months(self, months: RangeInclusive<u32>) -> Self {
        self.retain(|s| months.contains(&s.month()))
    }

    /// Keep scenes with metadata cloud cover strictly below the
    /// threshold
    pub fn filter_cloud_cover(self, threshold: f64) -> Self {
        self.retain(|s| s.cloud_cover() < threshold)
    }

    /// Keep scenes whose grid bounds overlap the AOI
    pub fn filter_bounds(self, aoi: &Aoi) -> Self {
        self.retain(|s| aoi.intersects_bbox(s.bounds()))
    }

    fn retain(mut self, keep: impl Fn(&Scene) -> bool) -> Self {
        self.scenes.retain(|s| keep(s));
        self
    }

    /// Apply a fallible per-scene transform to every scene
    pub fn try_map(self, f: impl Fn(Scene) -> Result<Scene>) -> Result<Self> {
        let scenes = self
            .scenes
            .into_iter()
            .map(f)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { scenes })
    }

    /// Append another collection's scenes after this one's
    pub fn merge(mut self, other: SceneCollection) -> Self {
        self.scenes.extend(other.scenes);
        self
    }

    /// Sort by acquisition time. The sort is stable: scenes with equal
    /// timestamps keep their insertion order and act as equal-weight
    /// duplicate observations downstream.
    pub fn sort_by_time(mut self) -> Self {
        self.scenes.sort_by_key(|s| s.timestamp_millis());
        self
    }
}

impl IntoIterator for SceneCollection {
    type Item = Scene;
    type IntoIter = std::vec::IntoIter<Scene>;

    fn into_iter(self) -> Self::IntoIter {
        self.scenes.into_iter()
    }
}
