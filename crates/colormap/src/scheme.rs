//! Color ramps and the multi-stop interpolation engine.

/// RGB color as (r, g, b) with values in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Transparent black (used for nodata).
    pub const TRANSPARENT: Self = Self { r: 0, g: 0, b: 0 };
}

/// A color stop: position in [0, 1] mapped to an RGB color.
#[derive(Debug, Clone, Copy)]
pub struct ColorStop {
    pub t: f64,
    pub color: Rgb,
}

impl ColorStop {
    pub const fn new(t: f64, r: u8, g: u8, b: u8) -> Self {
        Self {
            t,
            color: Rgb::new(r, g, b),
        }
    }
}

/// Available color ramps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorRamp {
    /// Purple -> Red -> Orange -> Yellow -> Green (loss to gain)
    VegetationChange,
    /// Brown -> Yellow -> Green (NDVI)
    Ndvi,
    /// Black -> White
    Grayscale,
}

impl ColorRamp {
    /// All available ramps, useful for CLI value parsing.
    pub const ALL: &[ColorRamp] = &[Self::VegetationChange, Self::Ndvi, Self::Grayscale];

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::VegetationChange => "Vegetation change",
            Self::Ndvi => "NDVI",
            Self::Grayscale => "Grayscale",
        }
    }
}

// Loss end is purple, gain end is green. Used for both the percent change
// layer (-50..20) and the anomaly layer (-3..2).
const VEGETATION_CHANGE_STOPS: &[ColorStop] = &[
    ColorStop::new(0.00, 128, 0, 128),
    ColorStop::new(0.25, 255, 0, 0),
    ColorStop::new(0.50, 255, 165, 0),
    ColorStop::new(0.75, 255, 255, 0),
    ColorStop::new(1.00, 0, 128, 0),
];

const NDVI_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, 120, 70, 20),
    ColorStop::new(0.3, 200, 170, 60),
    ColorStop::new(0.5, 240, 230, 100),
    ColorStop::new(0.7, 100, 180, 50),
    ColorStop::new(1.0, 10, 100, 20),
];

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

fn lerp_color(c1: Rgb, c2: Rgb, t: f64) -> Rgb {
    Rgb::new(
        lerp(c1.r as f64, c2.r as f64, t).round() as u8,
        lerp(c1.g as f64, c2.g as f64, t).round() as u8,
        lerp(c1.b as f64, c2.b as f64, t).round() as u8,
    )
}

fn multi_stop(stops: &[ColorStop], t: f64) -> Rgb {
    if t <= 0.0 {
        return stops[0].color;
    }
    if t >= 1.0 {
        return stops[stops.len() - 1].color;
    }
    for i in 1..stops.len() {
        if t <= stops[i].t {
            let ratio = (t - stops[i - 1].t) / (stops[i].t - stops[i - 1].t);
            return lerp_color(stops[i - 1].color, stops[i].color, ratio);
        }
    }
    stops[stops.len() - 1].color
}

/// Evaluate a color ramp at normalized position `t` ∈ [0, 1].
///
/// Values outside [0, 1] are clamped to the endpoint colors.
pub fn evaluate(ramp: ColorRamp, t: f64) -> Rgb {
    match ramp {
        ColorRamp::VegetationChange => multi_stop(VEGETATION_CHANGE_STOPS, t),
        ColorRamp::Ndvi => multi_stop(NDVI_STOPS, t),
        ColorRamp::Grayscale => {
            let v = (t.clamp(0.0, 1.0) * 255.0).round() as u8;
            Rgb::new(v, v, v)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_endpoints() {
        let c0 = evaluate(ColorRamp::VegetationChange, 0.0);
        assert_eq!(c0, Rgb::new(128, 0, 128));
        let c1 = evaluate(ColorRamp::VegetationChange, 1.0);
        assert_eq!(c1, Rgb::new(0, 128, 0));
    }

    #[test]
    fn change_midpoint_is_orange() {
        let c = evaluate(ColorRamp::VegetationChange, 0.5);
        assert_eq!(c, Rgb::new(255, 165, 0));
    }

    #[test]
    fn grayscale_midpoint() {
        let c = evaluate(ColorRamp::Grayscale, 0.5);
        assert_eq!(c, Rgb::new(128, 128, 128));
    }

    #[test]
    fn ndvi_endpoints() {
        let c0 = evaluate(ColorRamp::Ndvi, 0.0);
        assert_eq!(c0, Rgb::new(120, 70, 20));
        let c1 = evaluate(ColorRamp::Ndvi, 1.0);
        assert_eq!(c1, Rgb::new(10, 100, 20));
    }

    #[test]
    fn clamping_below_zero() {
        let c = evaluate(ColorRamp::VegetationChange, -0.5);
        assert_eq!(c, Rgb::new(128, 0, 128));
    }

    #[test]
    fn clamping_above_one() {
        let c = evaluate(ColorRamp::VegetationChange, 1.5);
        assert_eq!(c, Rgb::new(0, 128, 0));
    }

    #[test]
    fn all_ramps_evaluate_midpoint() {
        for &ramp in ColorRamp::ALL {
            let _ = evaluate(ramp, 0.5);
        }
    }
}
