use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::io::Write;

use ahash::{AHasher, RandomState};
use log::debug;
use serde_json::{json, Value as JSONValue};

use crate::header::{LatLng, HEADER_BYTES, SPEC_VERSION};
use crate::util::{compress_all, optimize_directories, zxy_to_tile_id, MAX_ROOT_DIR_LENGTH};
use crate::{Compression, Entry, Error, Header, RangeError, Result, TileType};

struct FinishResult {
    data: Vec<u8>,
    entries: Vec<Entry>,
    num_addressed_tiles: u64,
    num_tile_content: u64,
}

/// Assembles a complete `PMTiles` archive in memory.
///
/// Tiles with identical content are stored only once, and consecutive tile ids
/// sharing the same content are merged into a single run-length entry.
///
/// # Example
/// ```rust
/// # use pmtiles_index::{ArchiveWriter, ArchiveReader, Compression, TileType};
/// let mut writer = ArchiveWriter::new(TileType::Mvt, Compression::GZip);
/// writer.add_tile_zxy(0, 0, 0, vec![0x1f, 0x8b /* ... */]).unwrap();
///
/// let bytes = writer.into_bytes().unwrap();
///
/// let mut reader = ArchiveReader::new(std::io::Cursor::new(bytes)).unwrap();
/// assert!(reader.get_tile(0, 0, 0).unwrap().is_some());
/// ```
#[derive(Debug)]
pub struct ArchiveWriter {
    /// Type of tiles
    pub tile_type: TileType,

    /// Compression of tiles
    ///
    /// Tile data is stored as is, so it has to be compressed by the caller already.
    pub tile_compression: Compression,

    /// Compression of directories and meta data
    pub internal_compression: Compression,

    /// Minimum zoom of all tiles this archive
    pub min_zoom: u8,

    /// Maximum zoom of all tiles this archive
    pub max_zoom: u8,

    /// Center zoom
    pub center_zoom: u8,

    /// Minimum longitude and latitude of bounds of available tiles
    pub min_pos: LatLng,

    /// Maximum longitude and latitude of bounds of available tiles
    pub max_pos: LatLng,

    /// Center longitude and latitude
    pub center_pos: LatLng,

    /// JSON meta data of this archive (an empty object is written if [`None`])
    pub meta_data: Option<JSONValue>,

    /// Maximum length of the root directory (default: [`MAX_ROOT_DIR_LENGTH`])
    pub target_root_bytes: usize,

    /// hash of tile -> bytes of tile
    data_by_hash: HashMap<u64, Vec<u8>, RandomState>,

    /// tile_id -> hash of tile
    hash_by_id: HashMap<u64, u64, RandomState>,

    /// hash of tile -> ids with this hash
    ids_by_hash: HashMap<u64, HashSet<u64, RandomState>, RandomState>,
}

impl ArchiveWriter {
    /// Constructs a new, empty archive writer, with no meta data, an
    /// [`internal_compression`](Self::internal_compression) of GZIP and world-wide bounds.
    ///
    /// # Arguments
    /// * `tile_type` - Type of tiles in this archive
    /// * `tile_compression` - Compression of tiles in this archive
    pub fn new(tile_type: TileType, tile_compression: Compression) -> Self {
        let header = Header::default();

        Self {
            tile_type,
            tile_compression,
            internal_compression: header.internal_compression,
            min_zoom: 0,
            max_zoom: 0,
            center_zoom: 0,
            min_pos: header.min_pos,
            max_pos: header.max_pos,
            center_pos: header.center_pos,
            meta_data: None,
            target_root_bytes: MAX_ROOT_DIR_LENGTH,
            data_by_hash: HashMap::default(),
            hash_by_id: HashMap::default(),
            ids_by_hash: HashMap::default(),
        }
    }

    fn calculate_hash(value: &impl Hash) -> u64 {
        let mut hasher = AHasher::default();
        value.hash(&mut hasher);
        hasher.finish()
    }

    /// Returns the key under which `data` is (or will be) stored.
    ///
    /// Starts at the hash of `data` and probes the following keys while they hold
    /// different content, so colliding tiles never share their bytes.
    fn content_key(&self, data: &[u8]) -> u64 {
        let mut key = Self::calculate_hash(&data);

        while let Some(existing) = self.data_by_hash.get(&key) {
            if existing.as_slice() == data {
                break;
            }
            key = key.wrapping_add(1);
        }

        key
    }

    fn tile_length(tile_id: u64, length: usize) -> Result<u32> {
        u32::try_from(length).map_err(|_| Error::TileTooLarge { tile_id, length })
    }

    /// Adds a tile, replacing any tile previously added with the same id.
    ///
    /// Note that the data should already be compressed if [`Self::tile_compression`]
    /// is set to a value other than [`Compression::None`].
    pub fn add_tile(&mut self, tile_id: u64, data: impl Into<Vec<u8>>) {
        let vec: Vec<u8> = data.into();

        // remove tile just to make sure that there
        // are no unreachable tiles
        self.remove_tile(tile_id);

        let hash = self.content_key(&vec);

        self.hash_by_id.insert(tile_id, hash);

        self.data_by_hash.insert(hash, vec);

        self.ids_by_hash.entry(hash).or_default().insert(tile_id);
    }

    /// Adds a tile by its z/x/y coordinates, see [`add_tile`](Self::add_tile).
    ///
    /// # Errors
    /// Will return [`Err`] if the coordinates are out of range.
    pub fn add_tile_zxy(
        &mut self,
        z: u8,
        x: u64,
        y: u64,
        data: impl Into<Vec<u8>>,
    ) -> std::result::Result<(), RangeError> {
        self.add_tile(zxy_to_tile_id(z, x, y)?, data);
        Ok(())
    }

    /// Removes a tile.
    ///
    /// Returns `true` if a tile with this id existed.
    pub fn remove_tile(&mut self, tile_id: u64) -> bool {
        let Some(hash) = self.hash_by_id.remove(&tile_id) else {
            return false;
        };

        // find set which includes all ids which have this hash
        let ids_with_hash = self.ids_by_hash.entry(hash).or_default();

        // remove current id from set
        ids_with_hash.remove(&tile_id);

        // delete data for this hash, if there are
        // no other ids that reference this hash
        if ids_with_hash.is_empty() {
            self.data_by_hash.remove(&hash);
            self.ids_by_hash.remove(&hash);
        }

        true
    }

    /// Returns the number of addressed tiles.
    pub fn num_tiles(&self) -> usize {
        self.hash_by_id.len()
    }

    fn push_entry(entries: &mut Vec<Entry>, tile_id: u64, offset: u64, length: u32) {
        if let Some(last) = entries.last_mut() {
            if last.tile_id.checked_add(u64::from(last.run_length)) == Some(tile_id)
                && last.run_length < u32::MAX
                && last.offset == offset
                && last.length == length
            {
                last.run_length += 1;
                return;
            }
        }

        entries.push(Entry {
            tile_id,
            offset,
            length,
            run_length: 1,
        });
    }

    fn finish_tiles(&self) -> Result<FinishResult> {
        let mut id_hash = self
            .hash_by_id
            .iter()
            .map(|(tile_id, hash)| (*tile_id, *hash))
            .collect::<Vec<(u64, u64)>>();
        id_hash.sort_unstable_by_key(|(tile_id, _)| *tile_id);

        let mut entries = Vec::<Entry>::new();
        let mut data = Vec::<u8>::new();
        let mut num_tile_content: u64 = 0;

        // hash => offset+length
        let mut offset_length_map = HashMap::<u64, (u64, u32), RandomState>::default();

        for (tile_id, hash) in &id_hash {
            if let Some((offset, length)) = offset_length_map.get(hash) {
                Self::push_entry(&mut entries, *tile_id, *offset, *length);
                continue;
            }

            let Some(tile_data) = self.data_by_hash.get(hash) else {
                continue;
            };

            let offset = data.len() as u64;
            let length = Self::tile_length(*tile_id, tile_data.len())?;

            data.extend_from_slice(tile_data);
            num_tile_content += 1;

            Self::push_entry(&mut entries, *tile_id, offset, length);
            offset_length_map.insert(*hash, (offset, length));
        }

        Ok(FinishResult {
            data,
            entries,
            num_addressed_tiles: id_hash.len() as u64,
            num_tile_content,
        })
    }

    /// Writes the archive to a writer.
    ///
    /// Layout: header, root directory, meta data, leaf directories, tile data.
    /// The directory entries are always clustered.
    ///
    /// # Arguments
    /// * `output` - Writer to write data to
    ///
    /// # Errors
    /// Will return [`Err`] if [`Self::internal_compression`] was set to [`Compression::Unknown`],
    /// the meta data could not be serialized or there was an I/O error while writing to `output`.
    ///
    pub fn to_writer(self, output: &mut impl Write) -> Result<()> {
        let result = self.finish_tiles()?;

        // DIRECTORIES
        let directories = optimize_directories(
            &result.entries,
            self.target_root_bytes,
            self.internal_compression,
        )?;

        // META DATA
        let meta_val = self.meta_data.unwrap_or_else(|| json!({}));
        let meta_data = compress_all(self.internal_compression, &serde_json::to_vec(&meta_val)?)?;

        let root_directory_offset = HEADER_BYTES as u64;
        let root_directory_length = directories.root.len() as u64;
        let json_metadata_offset = root_directory_offset + root_directory_length;
        let json_metadata_length = meta_data.len() as u64;
        let leaf_directories_offset = json_metadata_offset + json_metadata_length;
        let leaf_directories_length = directories.leaves.len() as u64;
        let tile_data_offset = leaf_directories_offset + leaf_directories_length;
        let tile_data_length = result.data.len() as u64;

        // HEADER
        let header = Header {
            spec_version: SPEC_VERSION,
            root_directory_offset,
            root_directory_length,
            json_metadata_offset,
            json_metadata_length,
            leaf_directories_offset,
            leaf_directories_length,
            tile_data_offset,
            tile_data_length,
            num_addressed_tiles: result.num_addressed_tiles,
            num_tile_entries: result.entries.len() as u64,
            num_tile_content: result.num_tile_content,
            clustered: true,
            internal_compression: self.internal_compression,
            tile_compression: self.tile_compression,
            tile_type: self.tile_type,
            min_zoom: self.min_zoom,
            max_zoom: self.max_zoom,
            min_pos: self.min_pos,
            max_pos: self.max_pos,
            center_zoom: self.center_zoom,
            center_pos: self.center_pos,
        };

        debug!(
            "writing archive: {} tiles, {} entries, {} leaves, {tile_data_length} bytes of tile data",
            header.num_addressed_tiles, header.num_tile_entries, directories.num_leaves
        );

        header.to_writer(output)?;
        output.write_all(&directories.root)?;
        output.write_all(&meta_data)?;
        output.write_all(&directories.leaves)?;
        output.write_all(&result.data)?;

        Ok(())
    }

    /// Writes the archive into a new [`Vec<u8>`].
    ///
    /// # Errors
    /// See [`to_writer`](Self::to_writer).
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.to_writer(&mut output)?;
        Ok(output)
    }
}
