//! Cloud and shadow masking from the Collection-1 `pixel_qa` band
//!
//! The two Landsat generations use different tests over the same bit
//! layout (bit 3 = cloud shadow, bit 5 = cloud, bit 7 = high cloud
//! confidence). Each rule is written out as an explicit per-pixel bit
//! table rather than chained lazy operators, and pinned by tests.

use vegtrack_core::raster::Raster;
use vegtrack_core::scene::{Scene, Sensor};
use vegtrack_core::Result;

/// Cloud shadow flag
pub const SHADOW_BIT: u16 = 1 << 3;
/// Cloud flag
pub const CLOUD_BIT: u16 = 1 << 5;
/// High cloud confidence flag
pub const CLOUD_CONF_BIT: u16 = 1 << 7;

/// Landsat-5 cloud test: flagged iff `(bit5 AND bit7) OR bit3`.
///
/// This is the table the published analysis evaluates to; its Python
/// transliteration short-circuits to the bit-3 term alone, which is
/// treated as a transliteration bug and not reproduced.
#[inline]
pub fn l5_cloud_flagged(qa: u16) -> bool {
    let cloud = qa & CLOUD_BIT != 0;
    let conf = qa & CLOUD_CONF_BIT != 0;
    let shadow = qa & SHADOW_BIT != 0;
    (cloud && conf) || shadow
}

/// Landsat-8 keep test: both the shadow and cloud bits must be zero.
#[inline]
pub fn l8_keep(qa: u16) -> bool {
    qa & SHADOW_BIT == 0 && qa & CLOUD_BIT == 0
}

/// Keep-mask for a Landsat-5 scene: 1 where the pixel survives.
///
/// Combines the QA cloud test with the collection-edge mask (a pixel
/// already nodata in any spectral band is dropped everywhere).
pub fn landsat5_keep_mask(scene: &Scene) -> Raster<u8> {
    let qa = scene.qa();
    let (rows, cols) = qa.shape();
    let mut keep = qa.with_same_meta::<u8>(rows, cols);

    for row in 0..rows {
        for col in 0..cols {
            let q = unsafe { qa.get_unchecked(row, col) };
            let v = if l5_cloud_flagged(q) || scene.any_band_nodata(row, col) {
                0
            } else {
                1
            };
            unsafe { keep.set_unchecked(row, col, v) };
        }
    }
    keep
}

/// Keep-mask for a Landsat-8 QA band: 1 where the pixel survives.
pub fn landsat8_keep_mask(qa: &Raster<u16>) -> Raster<u8> {
    let (rows, cols) = qa.shape();
    let mut keep = qa.with_same_meta::<u8>(rows, cols);

    for row in 0..rows {
        for col in 0..cols {
            let q = unsafe { qa.get_unchecked(row, col) };
            let v = u8::from(l8_keep(q));
            unsafe { keep.set_unchecked(row, col, v) };
        }
    }
    keep
}

/// Mask a scene in place using the rule for its sensor generation.
///
/// A malformed QA band produces an all-masked or all-unmasked scene,
/// never an error.
pub fn mask_scene(scene: &mut Scene) -> Result<()> {
    let keep = match scene.sensor() {
        Sensor::Landsat5 => landsat5_keep_mask(scene),
        Sensor::Landsat8 => landsat8_keep_mask(scene.qa()),
    };
    scene.apply_mask(&keep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use vegtrack_core::scene::Sensor;

    #[test]
    fn l5_bit_table() {
        // masked iff (bit5 & bit7) | bit3
        assert!(!l5_cloud_flagged(0));
        assert!(l5_cloud_flagged(SHADOW_BIT));
        assert!(!l5_cloud_flagged(CLOUD_BIT));
        assert!(!l5_cloud_flagged(CLOUD_CONF_BIT));
        assert!(l5_cloud_flagged(CLOUD_BIT | CLOUD_CONF_BIT));
        assert!(l5_cloud_flagged(CLOUD_BIT | CLOUD_CONF_BIT | SHADOW_BIT));
        // unrelated bits are ignored
        assert!(!l5_cloud_flagged(1 << 1 | 1 << 4));
    }

    #[test]
    fn shadow_alone_masks_l5_but_not_confidence_pair_rule() {
        // bit 3 set, bits 5 and 7 clear: masked under the Landsat-5
        // rule, unmasked under the (bit5 & bit7) term alone.
        let qa = SHADOW_BIT;
        assert!(l5_cloud_flagged(qa));
        assert!(qa & CLOUD_BIT == 0 || qa & CLOUD_CONF_BIT == 0);
    }

    #[test]
    fn l8_requires_both_bits_clear() {
        assert!(l8_keep(0));
        assert!(!l8_keep(SHADOW_BIT));
        assert!(!l8_keep(CLOUD_BIT));
        assert!(!l8_keep(SHADOW_BIT | CLOUD_BIT));
        // the confidence bit is not part of the Landsat-8 test
        assert!(l8_keep(CLOUD_CONF_BIT));
    }

    fn l5_scene(qa_value: u16) -> Scene {
        let mut qa = Raster::<u16>::new(3, 3);
        qa.set(1, 1, qa_value).unwrap();
        let mut scene = Scene::new(
            Sensor::Landsat5,
            Utc.with_ymd_and_hms(1995, 7, 10, 18, 0, 0).unwrap(),
            10.0,
            qa,
        );
        scene.add_band("B4", Raster::filled(3, 3, 3000.0)).unwrap();
        scene.add_band("B3", Raster::filled(3, 3, 1000.0)).unwrap();
        scene
    }

    #[test]
    fn l5_mask_drops_flagged_pixel() {
        let mut scene = l5_scene(CLOUD_BIT | CLOUD_CONF_BIT);
        mask_scene(&mut scene).unwrap();

        assert!(scene.band("B4").unwrap().get(1, 1).unwrap().is_nan());
        assert_eq!(scene.band("B4").unwrap().get(0, 0).unwrap(), 3000.0);
    }

    #[test]
    fn l5_edge_mask_propagates_across_bands() {
        let mut scene = l5_scene(0);
        // one band nodata at (0, 0): the edge mask drops the pixel in
        // every band
        let mut b3 = Raster::filled(3, 3, 1000.0);
        b3.set(0, 0, f64::NAN).unwrap();
        scene.add_band("B3", b3).unwrap();

        mask_scene(&mut scene).unwrap();
        assert!(scene.band("B4").unwrap().get(0, 0).unwrap().is_nan());
    }

    #[test]
    fn l8_mask_keeps_clear_pixels() {
        let mut qa = Raster::<u16>::new(2, 2);
        qa.set(0, 1, SHADOW_BIT).unwrap();
        let keep = landsat8_keep_mask(&qa);

        assert_eq!(keep.get(0, 0).unwrap(), 1);
        assert_eq!(keep.get(0, 1).unwrap(), 0);
    }

    #[test]
    fn all_flagged_qa_masks_everything_without_error() {
        let mut scene = l5_scene(0);
        let qa_all = Raster::<u16>::filled(3, 3, SHADOW_BIT);
        let mut masked = Scene::new(scene.sensor(), scene.acquired(), 0.0, qa_all);
        masked.add_band("B4", Raster::filled(3, 3, 1.0)).unwrap();
        masked.add_band("B3", Raster::filled(3, 3, 1.0)).unwrap();

        mask_scene(&mut masked).unwrap();
        assert!(masked.band("B4").unwrap().stats().valid_count == 0);
        // the original scene is untouched
        mask_scene(&mut scene).unwrap();
        assert_eq!(scene.band("B4").unwrap().stats().valid_count, 9);
    }
}
