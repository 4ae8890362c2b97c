//! # `PMTiles` index
//!
//! The index core of [the `PMTiles` format](https://github.com/protomaps/PMTiles): varints,
//! Hilbert tile ids, directories, the fixed size header and the root/leaf directory
//! builder. Archives are read and written through the [`std::io::Read`] and
//! [`std::io::Write`] traits.
//!
//! ## Examples
//!
//! ### Tile ids
//! ```rust
//! use pmtiles_index::util::{tile_id_to_zxy, zxy_to_tile_id};
//!
//! assert_eq!(zxy_to_tile_id(12, 3423, 1763).unwrap(), 19_078_479);
//! assert_eq!(tile_id_to_zxy(19_078_479).unwrap(), (12, 3423, 1763));
//! ```
//!
//! ### Directories
//! ```rust
//! use pmtiles_index::{Directory, Entry};
//!
//! let directory = Directory::from(vec![
//!     Entry { tile_id: 0, offset: 0, length: 10, run_length: 1 },
//!     Entry { tile_id: 1, offset: 10, length: 20, run_length: 2 },
//! ]);
//!
//! let bytes = directory.to_bytes().unwrap();
//! let decoded = Directory::from_bytes(&bytes).unwrap();
//!
//! assert_eq!(decoded.find_tile(2), Some(&decoded[1]));
//! assert_eq!(decoded.find_tile(3), None);
//! ```
//!
//! ### Writing and reading an archive
//! ```rust
//! use pmtiles_index::{ArchiveReader, ArchiveWriter, Compression, TileType};
//! use std::io::Cursor;
//!
//! fn main() -> pmtiles_index::Result<()> {
//!     let mut writer = ArchiveWriter::new(TileType::Png, Compression::None);
//!     writer.add_tile_zxy(0, 0, 0, vec![0 /* ... */])?;
//!     writer.add_tile_zxy(1, 0, 0, vec![1 /* ... */])?;
//!
//!     let mut bytes = Vec::new();
//!     writer.to_writer(&mut bytes)?;
//!
//!     let mut reader = ArchiveReader::new(Cursor::new(bytes))?;
//!     assert_eq!(reader.get_tile(1, 0, 0)?, Some(vec![1]));
//!     assert_eq!(reader.get_tile(1, 1, 1)?, None);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::multiple_crate_versions)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

mod directory;
mod error;
#[allow(clippy::ignored_unit_patterns)]
mod header;
mod reader;
mod writer;

/// Varints, tile ids, compression and the root/leaf directory builder.
pub mod util;

pub use directory::{Directory, Entry};
pub use error::{Error, FormatError, RangeError, Result};
pub use header::{Compression, Header, LatLng, TileType, HEADER_BYTES};
pub use reader::ArchiveReader;
pub use writer::ArchiveWriter;
