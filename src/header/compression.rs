use deku::prelude::*;

use crate::FormatError;

/// A compression, which is supported in `PMTiles` archives.
///
/// Tile contents are only tagged with their compression. Directories and
/// metadata are (de)compressed by [`util::compress_all`](crate::util::compress_all)
/// and [`util::decompress_all`](crate::util::decompress_all), as long as
/// [`is_supported`](Self::is_supported) holds.
#[derive(DekuRead, DekuWrite, Debug, Clone, Copy, PartialEq, Eq)]
#[deku(type = "u8")]
#[deku(endian = "endian", ctx = "endian: deku::ctx::Endian")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Compression {
    /// Unknown compression
    ///
    /// Archives with an unknown internal compression cannot be read or written.
    Unknown = 0x00,

    /// No compression
    None,

    /// GZIP compression as defined in [RFC 1952](https://www.rfc-editor.org/rfc/rfc1952)
    GZip,

    /// Brotli compression as defined in [RFC 7932](https://www.rfc-editor.org/rfc/rfc7932)
    Brotli,

    /// Zstandard Compression as defined in [RFC 8478](https://www.rfc-editor.org/rfc/rfc8478)
    ///
    /// Not available on `wasm32` targets.
    ZStd,
}

impl Compression {
    /// Returns `true` if directories and metadata can be (de)compressed with this
    /// compression on the current target.
    pub const fn is_supported(self) -> bool {
        match self {
            Self::None | Self::GZip | Self::Brotli => true,
            Self::ZStd => cfg!(not(target_arch = "wasm32")),
            Self::Unknown => false,
        }
    }

    /// Returns a option containing the value to which the
    /// `Content-Encoding` HTTP header should be set, when serving
    /// tiles with this compression.
    ///
    /// Returns [`None`] if a concrete `Content-Encoding` could not be determined.
    pub const fn http_content_encoding(self) -> Option<&'static str> {
        match self {
            Self::GZip => Some("gzip"),
            Self::Brotli => Some("br"),
            Self::ZStd => Some("zstd"),
            Self::Unknown | Self::None => None,
        }
    }
}

impl TryFrom<u8> for Compression {
    type Error = FormatError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Unknown),
            1 => Ok(Self::None),
            2 => Ok(Self::GZip),
            3 => Ok(Self::Brotli),
            4 => Ok(Self::ZStd),
            _ => Err(FormatError::UnknownCompression(value)),
        }
    }
}

impl From<Compression> for u8 {
    fn from(value: Compression) -> Self {
        value as Self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const ALL: [Compression; 5] = [
        Compression::Unknown,
        Compression::None,
        Compression::GZip,
        Compression::Brotli,
        Compression::ZStd,
    ];

    #[test]
    fn test_byte_values() -> Result<(), FormatError> {
        for (byte, compression) in (0u8..).zip(ALL) {
            assert_eq!(u8::from(compression), byte);
            assert_eq!(Compression::try_from(byte)?, compression);
        }

        Ok(())
    }

    #[test]
    fn test_unknown_byte() {
        assert_eq!(
            Compression::try_from(5),
            Err(FormatError::UnknownCompression(5))
        );
        assert_eq!(
            Compression::try_from(0xff),
            Err(FormatError::UnknownCompression(0xff))
        );
    }

    #[test]
    fn test_is_supported() {
        assert!(!Compression::Unknown.is_supported());
        assert!(Compression::None.is_supported());
        assert!(Compression::GZip.is_supported());
        assert!(Compression::Brotli.is_supported());
        assert_eq!(
            Compression::ZStd.is_supported(),
            cfg!(not(target_arch = "wasm32"))
        );
    }

    #[test]
    fn test_http_content_encoding() {
        let encodings: Vec<Option<&str>> =
            ALL.iter().map(|c| c.http_content_encoding()).collect();

        assert_eq!(
            encodings,
            [None, None, Some("gzip"), Some("br"), Some("zstd")]
        );
    }
}
