use thiserror::Error;

use crate::Compression;

/// An error raised while decoding varints, directories or headers from bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The data ended before a complete value could be read.
    #[error("unexpected end of data at byte {offset}")]
    UnexpectedEnd {
        /// Offset (in bytes) at which more data was expected
        offset: usize,
    },

    /// A varint encodes a value larger than 64 bits.
    #[error("varint starting at byte {offset} exceeds 64 bits")]
    VarIntOverflow {
        /// Offset (in bytes) of the first byte of the varint
        offset: usize,
    },

    /// A directory was fully decoded but bytes were left over.
    #[error("{remaining} trailing bytes after directory ending at byte {offset}")]
    TrailingBytes {
        /// Offset (in bytes) of the first trailing byte
        offset: usize,
        /// Number of trailing bytes
        remaining: usize,
    },

    /// The sum of tile id deltas in a directory does not fit into 64 bits.
    #[error("tile id delta at entry {index} overflows 64 bits")]
    TileIdOverflow {
        /// Index of the offending entry
        index: usize,
    },

    /// A run length or length column value does not fit into 32 bits.
    #[error("value {value} of entry {index} does not fit into 32 bits")]
    ValueTooLarge {
        /// Index of the offending entry
        index: usize,
        /// Decoded value
        value: u64,
    },

    /// An offset marked as contiguous has no predecessor, or the resulting
    /// offset does not fit into 64 bits.
    #[error("invalid offset of entry {index}")]
    InvalidOffset {
        /// Index of the offending entry
        index: usize,
    },

    /// A directory declares more entries than its bytes could possibly hold.
    #[error("directory declares {count} entries but only {available} bytes follow")]
    EntryCountMismatch {
        /// Declared number of entries
        count: u64,
        /// Bytes available after the count
        available: usize,
    },

    /// Entries passed for serialization are not sorted by strictly ascending tile id.
    #[error("tile id of entry {index} is not greater than the one of the previous entry")]
    UnsortedTileIds {
        /// Index of the offending entry
        index: usize,
    },

    /// A section of an archive ends before its declared length.
    #[error("section at byte {offset} is shorter than its declared length of {length} bytes")]
    SectionTruncated {
        /// Offset (in bytes) of the section from start of the archive
        offset: u64,
        /// Declared length (in bytes)
        length: u64,
    },

    /// The header does not start with `PMTiles`.
    #[error("invalid magic bytes, expected \"PMTiles\"")]
    InvalidMagic,

    /// The header declares a spec version other than 3.
    #[error("unsupported spec version {0}, only version 3 is supported")]
    UnsupportedVersion(u8),

    /// The header contains a compression byte without a known meaning.
    #[error("unknown compression {0}")]
    UnknownCompression(u8),

    /// The header contains a tile type byte without a known meaning.
    #[error("unknown tile type {0}")]
    UnknownTileType(u8),

    /// A header field could not be decoded (e.g. an unknown enum value) or encoded.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// A leaf directory pointed to another leaf directory.
    #[error("leaf directory at offset {offset} points to another leaf directory")]
    NestedLeafDirectory {
        /// Offset (in bytes) of the leaf directory within the leaf directories section
        offset: u64,
    },
}

/// An error indicating that tile coordinates or a tile id lie
/// outside of the addressable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RangeError {
    /// The zoom level is greater than [`MAX_ZOOM`](crate::util::MAX_ZOOM).
    #[error("zoom {0} exceeds the maximum allowed zoom of 26")]
    ZoomTooLarge(u8),

    /// x or y is outside of the `2^z x 2^z` grid of the zoom level.
    #[error("tile {z}/{x}/{y} lies outside of the bounds of zoom {z}")]
    OutOfBounds {
        /// Zoom
        z: u8,
        /// x coordinate
        x: u64,
        /// y coordinate
        y: u64,
    },

    /// The tile id would have a zoom greater than [`MAX_ZOOM`](crate::util::MAX_ZOOM).
    #[error("tile id {0} exceeds the maximum allowed zoom of 26")]
    TileIdTooLarge(u64),
}

/// Errors returned by this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed bytes.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// Tile coordinates or id out of range.
    #[error(transparent)]
    Range(#[from] RangeError),

    /// The compression cannot be applied (e.g. [`Compression::Unknown`]).
    #[error("cannot (de)compress for compression {0:?}")]
    UnsupportedCompression(Compression),

    /// A tile is too large to be addressed by a directory entry.
    #[error("tile {tile_id} of {length} bytes exceeds the maximum tile length of 4 GiB")]
    TileTooLarge {
        /// Id of the tile
        tile_id: u64,
        /// Length (in bytes) of the tile
        length: usize,
    },

    /// The JSON metadata could not be (de)serialized.
    #[error("invalid metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    /// I/O error of a compression codec or a caller supplied reader / writer.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;
