use deku::{
    bitvec::{BitSlice, BitVec, Msb0},
    prelude::*,
};

const LAT_LONG_FACTOR: f64 = 10_000_000.0;

/// A position stored as two fixed-point `i32` values (degrees * 10^7).
#[derive(DekuRead, DekuWrite, Debug, Clone, Copy, PartialEq)]
#[deku(endian = "endian", ctx = "_endian: deku::ctx::Endian")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LatLng {
    /// Longitude in degrees
    #[deku(
        reader = "Self::read_degrees(deku::rest)",
        writer = "Self::write_degrees(deku::output, self.longitude)"
    )]
    pub longitude: f64,

    /// Latitude in degrees
    #[deku(
        reader = "Self::read_degrees(deku::rest)",
        writer = "Self::write_degrees(deku::output, self.latitude)"
    )]
    pub latitude: f64,
}

impl LatLng {
    /// Creates a new position.
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Converts degrees to their fixed-point representation, rounding to 7 decimals.
    ///
    /// Returns [`None`] if `degrees` is not finite or does not fit into an `i32`
    /// once scaled.
    ///
    /// # Example
    /// ```rust
    /// # use pmtiles_index::LatLng;
    /// assert_eq!(LatLng::to_fixed(-85.0), Some(-850_000_000));
    /// assert_eq!(LatLng::to_fixed(f64::NAN), None);
    /// ```
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_fixed(degrees: f64) -> Option<i32> {
        let scaled = (degrees * LAT_LONG_FACTOR).round();

        (scaled >= f64::from(i32::MIN) && scaled <= f64::from(i32::MAX)).then_some(scaled as i32)
    }

    /// Converts a fixed-point value back to degrees.
    pub fn from_fixed(value: i32) -> f64 {
        f64::from(value) / LAT_LONG_FACTOR
    }

    fn read_degrees(rest: &BitSlice<u8, Msb0>) -> Result<(&BitSlice<u8, Msb0>, f64), DekuError> {
        let (rest, value) = i32::read(rest, deku::ctx::Endian::Little)?;
        Ok((rest, Self::from_fixed(value)))
    }

    fn write_degrees(output: &mut BitVec<u8, Msb0>, degrees: f64) -> Result<(), DekuError> {
        let value = Self::to_fixed(degrees).ok_or_else(|| {
            DekuError::InvalidParam(format!("{degrees} degrees cannot be stored as fixed point"))
        })?;
        value.write(output, deku::ctx::Endian::Little)
    }
}
