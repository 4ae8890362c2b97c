use std::io::{Read, Seek, SeekFrom};

use log::{debug, trace};
use serde_json::Value as JSONValue;

use crate::util::{decompress, zxy_to_tile_id};
use crate::{Directory, Entry, FormatError, Header, Result};

/// Random access to the tiles of a `PMTiles` archive.
///
/// The header and the root directory are read once on construction. Looking up a tile
/// reads at most one leaf directory and the tile data itself.
///
/// # Example
/// ```rust
/// # use pmtiles_index::{ArchiveReader, ArchiveWriter, Compression, TileType};
/// # let mut writer = ArchiveWriter::new(TileType::Png, Compression::None);
/// # writer.add_tile(0, vec![1, 2, 3]);
/// # let bytes = writer.into_bytes().unwrap();
/// let mut reader = ArchiveReader::new(std::io::Cursor::new(bytes)).unwrap();
///
/// assert_eq!(reader.get_tile_by_id(0).unwrap(), Some(vec![1, 2, 3]));
/// ```
#[derive(Debug)]
pub struct ArchiveReader<R> {
    input: R,
    header: Header,
    root: Directory,
}

impl<R: Read + Seek> ArchiveReader<R> {
    /// Reads `byte_length` bytes at `byte_offset`. Lengths come from untrusted
    /// headers and directories, so the buffer only grows with the bytes actually read.
    fn get_section(reader: &mut R, byte_offset: u64, byte_length: u64) -> Result<Vec<u8>> {
        reader.seek(SeekFrom::Start(byte_offset))?;

        let mut buf = Vec::new();
        reader.by_ref().take(byte_length).read_to_end(&mut buf)?;

        if (buf.len() as u64) < byte_length {
            return Err(FormatError::SectionTruncated {
                offset: byte_offset,
                length: byte_length,
            }
            .into());
        }

        Ok(buf)
    }

    /// Opens an archive by reading its header and root directory.
    ///
    /// This takes ownership of the reader, because tile data is only read when required.
    ///
    /// # Arguments
    /// * `input` - Reader
    ///
    /// # Errors
    /// Will return [`Err`] if there was any kind of I/O error while reading from `input`,
    /// the header or root directory is malformed or the internal compression of the
    /// archive is set to "Unknown".
    pub fn new(mut input: R) -> Result<Self> {
        input.seek(SeekFrom::Start(0))?;
        let header = Header::from_reader(&mut input)?;

        let root_bytes = Self::get_section(
            &mut input,
            header.root_directory_offset,
            header.root_directory_length,
        )?;
        let root = Directory::from_bytes_compressed(&root_bytes, header.internal_compression)?;

        debug!(
            "opened archive with {} root entries, {} addressed tiles",
            root.len(),
            header.num_addressed_tiles
        );

        Ok(Self {
            input,
            header,
            root,
        })
    }

    /// Returns the header of this archive.
    pub const fn header(&self) -> &Header {
        &self.header
    }

    /// Returns the root directory of this archive.
    pub const fn root_directory(&self) -> &Directory {
        &self.root
    }

    /// Unwraps this reader, returning the underlying reader.
    pub fn into_inner(self) -> R {
        self.input
    }

    /// Finds the tile entry responsible for `tile_id`, following a leaf directory if needed.
    ///
    /// # Errors
    /// Will return [`Err`] if a leaf directory could not be read or decoded, or if it
    /// points to another leaf directory.
    pub fn find_entry(&mut self, tile_id: u64) -> Result<Option<Entry>> {
        let Some(entry) = self.root.find_tile(tile_id).copied() else {
            return Ok(None);
        };

        if !entry.is_leaf_dir_entry() {
            return Ok(Some(entry));
        }

        trace!(
            "reading leaf directory at offset {} for tile {tile_id}",
            entry.offset
        );

        let leaf_bytes = Self::get_section(
            &mut self.input,
            self.header
                .leaf_directories_offset
                .saturating_add(entry.offset),
            u64::from(entry.length),
        )?;
        let leaf = Directory::from_bytes_compressed(&leaf_bytes, self.header.internal_compression)?;

        match leaf.find_tile(tile_id) {
            Some(found) if found.is_leaf_dir_entry() => {
                Err(FormatError::NestedLeafDirectory {
                    offset: entry.offset,
                }
                .into())
            }
            found => Ok(found.copied()),
        }
    }

    /// Get data of a tile by its id.
    ///
    /// Returns [`Ok(None)`] if the archive does not contain the tile.
    ///
    /// # Errors
    /// Will return [`Err`] if there was an I/O error while reading from the underlying
    /// reader or a leaf directory is malformed.
    pub fn get_tile_by_id(&mut self, tile_id: u64) -> Result<Option<Vec<u8>>> {
        let Some(entry) = self.find_entry(tile_id)? else {
            return Ok(None);
        };

        let data = Self::get_section(
            &mut self.input,
            self.header.tile_data_offset.saturating_add(entry.offset),
            u64::from(entry.length),
        )?;

        Ok(Some(data))
    }

    /// Get data of a tile by its z/x/y coordinates.
    ///
    /// # Errors
    /// See [`get_tile_by_id`](Self::get_tile_by_id) for details on return value. Additionally
    /// returns [`Err`] if the coordinates are out of range.
    pub fn get_tile(&mut self, z: u8, x: u64, y: u64) -> Result<Option<Vec<u8>>> {
        self.get_tile_by_id(zxy_to_tile_id(z, x, y)?)
    }

    /// Reads and parses the JSON meta data of this archive.
    ///
    /// Returns [`Ok(None)`] if the meta data section is empty.
    ///
    /// # Errors
    /// Will return [`Err`] if there was an I/O error, the meta data could not be
    /// decompressed or is no valid JSON.
    pub fn metadata(&mut self) -> Result<Option<JSONValue>> {
        if self.header.json_metadata_length == 0 {
            return Ok(None);
        }

        self.input
            .seek(SeekFrom::Start(self.header.json_metadata_offset))?;

        let mut meta_data_reader = (&mut self.input).take(self.header.json_metadata_length);
        let reader = decompress(self.header.internal_compression, &mut meta_data_reader)?;

        let val: JSONValue = serde_json::from_reader(reader)?;

        Ok(Some(val))
    }
}
