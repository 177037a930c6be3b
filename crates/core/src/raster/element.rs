//! Cell value trait for generic rasters

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Trait for types that can live in a raster cell.
///
/// Integer QA bands and floating-point reflectance/index bands share the
/// same grid type through this bound.
pub trait RasterElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Default no-data value for this type (NaN for floats, MIN for integers)
    fn default_nodata() -> Self;

    /// Check whether this value represents no-data
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Convert to f64, if representable
    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }
}

macro_rules! impl_element_int {
    ($t:ty) => {
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::MIN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                match nodata {
                    Some(nd) => *self == nd,
                    None => false,
                }
            }
        }
    };
}

macro_rules! impl_element_float {
    ($t:ty) => {
        impl RasterElement for $t {
            fn default_nodata() -> Self {
                <$t>::NAN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                if self.is_nan() {
                    return true;
                }
                match nodata {
                    Some(nd) => (self - nd).abs() < <$t>::EPSILON * 100.0,
                    None => false,
                }
            }
        }
    };
}

impl_element_int!(u8);
impl_element_int!(u16);
impl_element_int!(u32);
impl_element_int!(i16);
impl_element_int!(i32);
impl_element_float!(f32);
impl_element_float!(f64);
