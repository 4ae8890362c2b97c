use std::ops::{Index, IndexMut, Range};
use std::slice::{Iter, SliceIndex};

use crate::util::{compress_all, decompress_all, write_varint, VarIntDecoder};
use crate::{Compression, FormatError, Result};

/// Every entry occupies at least one byte in each of the four columns.
const MIN_ENTRY_BYTES: usize = 4;

/// A structure representing a directory entry.
///
/// A entry includes information on where to find either a leaf directory or one/multiple tiles.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Entry {
    /// The first tile id this entry is valid for
    pub tile_id: u64,

    /// Offset (in bytes) of first byte of tile of leaf-directory data
    ///
    /// For tiles this offset is relative to the start of the tile data sections.
    /// For leaf directories this offset is relative to the start of the leaf directory sections.
    pub offset: u64,

    /// Amount of bytes
    pub length: u32,

    /// The run length indicates the amount of tiles this entry is valid for.
    /// A run length of `0` indicates that this is in fact a entry containing information
    /// of a leaf directory.
    pub run_length: u32,
}

impl Entry {
    /// Returns the range of tile ids this entry is valid for.
    ///
    /// The range is empty for leaf directory entries.
    pub const fn tile_id_range(&self) -> Range<u64> {
        self.tile_id..self.tile_id.saturating_add(self.run_length as u64)
    }

    /// Returns `true` if this entry is for a leaf directory and
    /// `false` if this entry is for tile data.
    pub const fn is_leaf_dir_entry(&self) -> bool {
        self.run_length == 0
    }

    /// Searches sorted `entries` for the entry responsible for `tile_id`.
    ///
    /// The candidate is the entry with the greatest tile id `<= tile_id`. A tile entry
    /// is returned if its run covers `tile_id`. A leaf directory entry is always returned,
    /// because the leaf it points to covers every tile id up to the next entry.
    ///
    /// Returns [`None`] if no entry is responsible for `tile_id`.
    ///
    /// # Example
    /// ```rust
    /// # use pmtiles_index::Entry;
    /// let entries = [
    ///     Entry { tile_id: 3, offset: 3, length: 1, run_length: 2 },
    ///     Entry { tile_id: 5, offset: 5, length: 1, run_length: 2 },
    /// ];
    ///
    /// assert_eq!(Entry::find(&entries, 4), Some(&entries[0]));
    /// assert_eq!(Entry::find(&entries, 7), None);
    /// ```
    pub fn find(entries: &[Self], tile_id: u64) -> Option<&Self> {
        let index = entries.partition_point(|entry| entry.tile_id <= tile_id);
        let candidate = entries[..index].last()?;

        if candidate.is_leaf_dir_entry()
            || tile_id - candidate.tile_id < u64::from(candidate.run_length)
        {
            Some(candidate)
        } else {
            None
        }
    }
}

/// A structure representing a directory.
///
/// A directory holds an arbitrary amount of [`Entry`], sorted by tile id. You can use [`len`](Self::len),
/// [`is_empty`](Self::is_empty) and [`iter`](Self::iter) to obtain information about that list of entries.
///
/// Use [`from_bytes`](Self::from_bytes) and [`to_bytes`](Self::to_bytes) or their compressed
/// counterparts ([`from_bytes_compressed`](Self::from_bytes_compressed) and
/// [`to_bytes_compressed`](Self::to_bytes_compressed)) to read and write the directory from / to bytes.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Directory {
    entries: Vec<Entry>,
}

impl Directory {
    /// Returns the number of entries in the directory, also referred to as its 'length'.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the directory contains no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over the directory.
    ///
    /// The iterator yields all entries from start to end.
    pub fn iter(&self) -> Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Returns the entry responsible for `tile_id`, see [`Entry::find`].
    pub fn find_tile(&self, tile_id: u64) -> Option<&Entry> {
        Entry::find(&self.entries, tile_id)
    }
}

impl Directory {
    /// Serializes the directory into its uncompressed columnar form.
    ///
    /// Layout: number of entries, then one column each for tile id deltas,
    /// run lengths, lengths and offsets. All values are varints. An offset is
    /// written as `0` if the entry directly follows the previous one, and as
    /// `offset + 1` otherwise.
    ///
    /// # Errors
    /// Will return [`Err`] with [`FormatError::UnsortedTileIds`] if the tile ids are
    /// not strictly ascending.
    pub fn to_bytes(&self) -> std::result::Result<Vec<u8>, FormatError> {
        serialize_entries(&self.entries)
    }

    /// Parses a directory from its uncompressed columnar form.
    ///
    /// # Errors
    /// Will return [`Err`] if the bytes are truncated, declare more entries than they
    /// could hold, contain bytes after the last column or values out of range.
    ///
    /// # Example
    /// ```rust
    /// # use pmtiles_index::{Directory, Entry};
    /// let directory: Directory = vec![
    ///     Entry { tile_id: 0, offset: 0, length: 10, run_length: 1 },
    ///     Entry { tile_id: 1, offset: 10, length: 20, run_length: 2 },
    /// ].into();
    ///
    /// let bytes = directory.to_bytes().unwrap();
    ///
    /// assert_eq!(Directory::from_bytes(&bytes).unwrap(), directory);
    /// ```
    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, FormatError> {
        let mut reader = VarIntDecoder::new(bytes);

        let count = reader.read_varint()?;
        let available = reader.remaining();
        if count > (available / MIN_ENTRY_BYTES) as u64 {
            return Err(FormatError::EntryCountMismatch { count, available });
        }

        #[allow(clippy::cast_possible_truncation)]
        let num_entries = count as usize;

        let mut entries = Vec::<Entry>::with_capacity(num_entries);

        // read tile_id
        let mut last_id = 0u64;
        for index in 0..num_entries {
            let delta = reader.read_varint()?;

            last_id = last_id
                .checked_add(delta)
                .ok_or(FormatError::TileIdOverflow { index })?;
            entries.push(Entry {
                tile_id: last_id,
                offset: 0,
                length: 0,
                run_length: 0,
            });
        }

        // read run_length
        for (index, entry) in entries.iter_mut().enumerate() {
            entry.run_length = read_u32(&mut reader, index)?;
        }

        // read length
        for (index, entry) in entries.iter_mut().enumerate() {
            entry.length = read_u32(&mut reader, index)?;
        }

        // read offset
        for index in 0..num_entries {
            let val = reader.read_varint()?;

            let offset = match (val, index) {
                (0, 0) => None,
                (0, _) => {
                    let previous = &entries[index - 1];
                    previous.offset.checked_add(u64::from(previous.length))
                }
                _ => Some(val - 1),
            };

            entries[index].offset = offset.ok_or(FormatError::InvalidOffset { index })?;
        }

        if reader.remaining() > 0 {
            return Err(FormatError::TrailingBytes {
                offset: reader.position(),
                remaining: reader.remaining(),
            });
        }

        Ok(Self { entries })
    }

    /// Serializes the directory and compresses it with `compression`.
    ///
    /// # Errors
    /// Will return [`Err`] if the tile ids are not strictly ascending, `compression` is
    /// not supported or the encoder failed.
    pub fn to_bytes_compressed(&self, compression: Compression) -> Result<Vec<u8>> {
        compress_all(compression, &self.to_bytes()?)
    }

    /// Decompresses `bytes` with `compression` and parses the directory.
    ///
    /// # Errors
    /// Will return [`Err`] if `compression` is set to [`Compression::Unknown`], the data is not
    /// compressed correctly according to `compression` or the directory is malformed.
    pub fn from_bytes_compressed(bytes: &[u8], compression: Compression) -> Result<Self> {
        let raw = decompress_all(compression, bytes)?;

        Ok(Self::from_bytes(&raw)?)
    }
}

pub(crate) fn serialize_entries(entries: &[Entry]) -> std::result::Result<Vec<u8>, FormatError> {
    let mut output = Vec::with_capacity(1 + entries.len() * MIN_ENTRY_BYTES);

    write_varint(&mut output, entries.len() as u64);

    // write tile_id
    let mut last_id = 0u64;
    for (index, entry) in entries.iter().enumerate() {
        if index > 0 && entry.tile_id <= last_id {
            return Err(FormatError::UnsortedTileIds { index });
        }

        write_varint(&mut output, entry.tile_id - last_id);
        last_id = entry.tile_id;
    }

    // write run_length
    for entry in entries {
        write_varint(&mut output, u64::from(entry.run_length));
    }

    // write length
    for entry in entries {
        write_varint(&mut output, u64::from(entry.length));
    }

    // write offset
    let mut next_byte = 0u64;
    for (index, entry) in entries.iter().enumerate() {
        let val = if index > 0 && entry.offset == next_byte {
            0
        } else {
            entry
                .offset
                .checked_add(1)
                .ok_or(FormatError::InvalidOffset { index })?
        };

        write_varint(&mut output, val);

        next_byte = entry.offset.saturating_add(u64::from(entry.length));
    }

    Ok(output)
}

fn read_u32(reader: &mut VarIntDecoder, index: usize) -> std::result::Result<u32, FormatError> {
    let value = reader.read_varint()?;

    u32::try_from(value).map_err(|_| FormatError::ValueTooLarge { index, value })
}

impl<I: SliceIndex<[Entry]>> Index<I> for Directory {
    type Output = I::Output;

    fn index(&self, index: I) -> &Self::Output {
        self.entries.index(index)
    }
}

impl<I: SliceIndex<[Entry]>> IndexMut<I> for Directory {
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        self.entries.index_mut(index)
    }
}

impl From<Vec<Entry>> for Directory {
    fn from(entries: Vec<Entry>) -> Self {
        Self { entries }
    }
}

impl From<Directory> for Vec<Entry> {
    fn from(val: Directory) -> Self {
        val.entries
    }
}
