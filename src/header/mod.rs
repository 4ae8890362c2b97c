pub use compression::*;
pub use lat_lng::*;
pub use tile_type::*;

mod compression;
mod lat_lng;
mod tile_type;

use deku::bitvec::{BitVec, BitView};
use deku::prelude::*;
use std::io::{Read, Write};

use crate::FormatError;

/// Size (in bytes) of a serialized header.
pub const HEADER_BYTES: usize = 127;

/// Magic bytes every archive starts with.
pub const MAGIC: &[u8; 7] = b"PMTiles";

/// The only supported version of the specification.
pub const SPEC_VERSION: u8 = 3;

/// Offsets of the compression and tile type bytes, after magic, version,
/// eleven `u64` fields and the clustered flag.
const INTERNAL_COMPRESSION_BYTE: usize = 97;
const TILE_COMPRESSION_BYTE: usize = 98;
const TILE_TYPE_BYTE: usize = 99;

/// A structure representing a `PMTiles` header.
#[derive(DekuRead, DekuWrite, Debug, Clone, PartialEq)]
#[deku(magic = b"PMTiles")]
#[deku(endian = "little")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Header {
    /// Version of Specification (always 3)
    #[deku(assert_eq = "3")]
    pub spec_version: u8,

    /// Offset (in bytes) of root directory section from start of file
    pub root_directory_offset: u64,

    /// Length (in bytes) of root directory section
    pub root_directory_length: u64,

    /// Offset (in bytes) of metadata section from start of file
    pub json_metadata_offset: u64,

    /// Length (in bytes) of metadata section
    pub json_metadata_length: u64,

    /// Offset (in bytes) of leaf directories section from start of file
    pub leaf_directories_offset: u64,

    /// Length (in bytes) of leaf directories section
    pub leaf_directories_length: u64,

    /// Offset (in bytes) of tile data section from start of file
    pub tile_data_offset: u64,

    /// Length (in bytes) of tile data section
    pub tile_data_length: u64,

    /// Number of tiles, which are addressable in this PMTiles archive
    pub num_addressed_tiles: u64,

    /// Number of directory entries, that point to a tile
    pub num_tile_entries: u64,

    /// Number of distinct tile contents in the tile data section
    pub num_tile_content: u64,

    /// Indicates whether this archive is clustered, which means that
    /// all directory entries are ordered in ascending order by tile_ids
    #[deku(bits = 8)]
    pub clustered: bool,

    /// Compression of directories and meta data section
    pub internal_compression: Compression,

    /// Compression of tiles in this archive
    pub tile_compression: Compression,

    /// Type of tiles in this archive
    pub tile_type: TileType,

    /// Minimum zoom of all tiles this archive
    pub min_zoom: u8,

    /// Maximum zoom of all tiles this archive
    pub max_zoom: u8,

    /// Minimum latitude and longitude of bounds of available tiles in this archive
    pub min_pos: LatLng,

    /// Maximum latitude and longitude of bounds of available tiles in this archive
    pub max_pos: LatLng,

    /// Center zoom
    ///
    /// Implementations may use this to set the default zoom
    pub center_zoom: u8,

    /// Center latitude and longitude
    ///
    /// Implementations may use these values to set the default location
    pub center_pos: LatLng,
}

impl Header {
    /// Returns a option containing the value to which the `Content-Type`
    /// HTTP header should be set, when serving tiles from this archive.
    ///
    /// Returns [`None`] if a concrete `Content-Type` could not be determined.
    pub const fn http_content_type(&self) -> Option<&'static str> {
        self.tile_type.http_content_type()
    }

    /// Returns a option containing the value to which the `Content-Encoding` HTTP
    /// header should be set, when serving tiles from this archive.
    ///
    /// Returns [`None`] if a concrete `Content-Encoding` could not be determined.
    pub const fn http_content_encoding(&self) -> Option<&'static str> {
        self.tile_compression.http_content_encoding()
    }

    /// Parses a header from the first [`HEADER_BYTES`] bytes of `bytes`.
    ///
    /// # Errors
    /// Will return [`Err`] if `bytes` is shorter than [`HEADER_BYTES`], does not start
    /// with the magic bytes, has a spec version other than 3 or contains an
    /// unknown compression ([`FormatError::UnknownCompression`]) or tile type
    /// ([`FormatError::UnknownTileType`]).
    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, FormatError> {
        if bytes.len() < HEADER_BYTES {
            return Err(FormatError::UnexpectedEnd {
                offset: bytes.len(),
            });
        }

        if &bytes[..MAGIC.len()] != MAGIC {
            return Err(FormatError::InvalidMagic);
        }

        let version = bytes[MAGIC.len()];
        if version != SPEC_VERSION {
            return Err(FormatError::UnsupportedVersion(version));
        }

        Compression::try_from(bytes[INTERNAL_COMPRESSION_BYTE])?;
        Compression::try_from(bytes[TILE_COMPRESSION_BYTE])?;
        TileType::try_from(bytes[TILE_TYPE_BYTE])?;

        let (_, header) = Self::read(bytes[..HEADER_BYTES].view_bits(), ())
            .map_err(|err| FormatError::InvalidHeader(err.to_string()))?;

        Ok(header)
    }

    /// Serializes the header into exactly [`HEADER_BYTES`] bytes.
    ///
    /// # Errors
    /// Will return [`Err`] if a position is not finite or out of the fixed-point range
    /// (see [`LatLng::to_fixed`]).
    pub fn to_bytes(&self) -> std::result::Result<Vec<u8>, FormatError> {
        let mut bit_vec = BitVec::with_capacity(8 * HEADER_BYTES);
        self.write(&mut bit_vec, ())
            .map_err(|err| FormatError::InvalidHeader(err.to_string()))?;

        Ok(bit_vec.into_vec())
    }

    /// Reads a header from a [`std::io::Read`] and returns it.
    ///
    /// # Arguments
    /// * `input` - Reader
    ///
    /// # Errors
    /// Will return [`Err`] an I/O error occurred while reading from `input`
    /// or the bytes are no valid header.
    ///
    pub fn from_reader(input: &mut impl Read) -> crate::Result<Self> {
        let mut buf = [0; HEADER_BYTES];
        input.read_exact(&mut buf)?;

        Ok(Self::from_bytes(&buf)?)
    }

    /// Writes the header to a [`std::io::Write`].
    ///
    /// # Arguments
    /// * `output` - Writer to write header to
    ///
    /// # Errors
    /// Will return [`Err`] if an I/O error occurred while writing to `output`.
    ///
    pub fn to_writer(&self, output: &mut impl Write) -> crate::Result<()> {
        output.write_all(&self.to_bytes()?)?;

        Ok(())
    }
}

impl Default for Header {
    fn default() -> Self {
        Self {
            spec_version: SPEC_VERSION,
            root_directory_offset: 0,
            root_directory_length: 0,
            json_metadata_offset: 0,
            json_metadata_length: 0,
            leaf_directories_offset: 0,
            leaf_directories_length: 0,
            tile_data_offset: 0,
            tile_data_length: 0,
            num_addressed_tiles: 0,
            num_tile_entries: 0,
            num_tile_content: 0,
            clustered: false,
            internal_compression: Compression::GZip,
            tile_compression: Compression::None,
            tile_type: TileType::Unknown,
            min_zoom: 0,
            max_zoom: 0,
            min_pos: LatLng {
                longitude: -180.0,
                latitude: -85.0,
            },
            max_pos: LatLng {
                longitude: 180.0,
                latitude: 85.0,
            },
            center_zoom: 0,
            center_pos: LatLng {
                longitude: 0.0,
                latitude: 0.0,
            },
        }
    }
}
