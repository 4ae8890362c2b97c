use deku::prelude::*;

use crate::FormatError;

/// The type of tiles stored in an archive.
///
/// The type is stored and returned as is. Tile contents are never inspected.
#[derive(DekuRead, DekuWrite, Debug, Clone, Copy, PartialEq, Eq)]
#[deku(type = "u8")]
#[deku(endian = "endian", ctx = "endian: deku::ctx::Endian")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TileType {
    /// Unknown or other tile format
    Unknown = 0x00,

    /// Mapbox Vector Tiles as defined [here](https://github.com/mapbox/vector-tile-spec)
    Mvt,

    /// PNG images
    Png,

    /// JPEG images
    Jpeg,

    /// WebP images
    WebP,

    /// AV1 Image File Format
    Avif,
}

impl TileType {
    /// Returns a option containing the value to which the
    /// `Content-Type` HTTP header should be set, when serving
    /// tiles from this type.
    ///
    /// Returns [`None`] if a concrete `Content-Type` could not be determined.
    pub const fn http_content_type(self) -> Option<&'static str> {
        match self {
            Self::Mvt => Some("application/vnd.mapbox-vector-tile"),
            Self::Png => Some("image/png"),
            Self::Jpeg => Some("image/jpeg"),
            Self::WebP => Some("image/webp"),
            Self::Avif => Some("image/avif"),
            Self::Unknown => None,
        }
    }
}

impl TryFrom<u8> for TileType {
    type Error = FormatError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Unknown),
            1 => Ok(Self::Mvt),
            2 => Ok(Self::Png),
            3 => Ok(Self::Jpeg),
            4 => Ok(Self::WebP),
            5 => Ok(Self::Avif),
            _ => Err(FormatError::UnknownTileType(value)),
        }
    }
}

impl From<TileType> for u8 {
    fn from(value: TileType) -> Self {
        value as Self
    }
}
