use log::{debug, trace, warn};

use crate::directory::serialize_entries;
use crate::util::compress_all;
use crate::{header::HEADER_BYTES, Compression, Entry, Result};

/// Maximum length of the root directory, so header and root directory
/// can be fetched with a single 16 KiB request.
pub const MAX_ROOT_DIR_LENGTH: usize = 16384 - HEADER_BYTES;

const MIN_START_LEAF_SIZE: usize = 4096;
const START_LEAF_SIZE_DIVISOR: usize = 3500;
const LEAF_SIZE_GROWTH: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
/// Strategies to divide entries into leaf directories, when the root
/// directory overflows its maximum size.
pub enum LeafSizeStrategy {
    /// Move all entries to leaf directories, so root directory contains only
    /// pointers to leaf directories.
    ///
    /// Grows the number of entries per leaf directory by 20% until the root directory
    /// fits into its max size or all entries share a single leaf directory.
    Geometric {
        /// The start size of the leaf directories (default: number of entries / 3500,
        /// but at least 4096)
        start_size: Option<usize>,
    },
}

impl Default for LeafSizeStrategy {
    fn default() -> Self {
        Self::Geometric { start_size: None }
    }
}

/// Serialized root directory and leaf directories section.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Directories {
    /// Bytes of the (compressed) root directory
    pub root: Vec<u8>,

    /// Bytes of all (individually compressed) leaf directories, concatenated
    pub leaves: Vec<u8>,

    /// Number of leaf directories in [`leaves`](Self::leaves)
    pub num_leaves: usize,
}

/// Splits `entries` into leaf directories of at most `leaf_size` entries and
/// builds a root directory pointing to them.
///
/// Every leaf is serialized and compressed on its own. The root contains one
/// entry per leaf, with the tile id of the first entry of the leaf, the byte range
/// of the leaf within [`Directories::leaves`] and a run length of `0`.
///
/// A `leaf_size` of `0` is treated as `1`.
///
/// # Arguments
/// * `entries` - All tile entries, sorted by tile id
/// * `leaf_size` - Maximum number of entries per leaf directory
/// * `compression` - Compression of directories
///
/// # Errors
/// Will return [`Err`] if the tile ids of `entries` are not strictly ascending,
/// `compression` is not supported or the encoder failed.
///
pub fn build_root_leaves(
    entries: &[Entry],
    leaf_size: usize,
    compression: Compression,
) -> Result<Directories> {
    let leaf_size = leaf_size.max(1);

    let mut root_entries = Vec::<Entry>::with_capacity(entries.len().div_ceil(leaf_size));
    let mut leaves = Vec::<u8>::new();

    for chunk in entries.chunks(leaf_size) {
        let leaf = compress_all(compression, &serialize_entries(chunk)?)?;

        #[allow(clippy::cast_possible_truncation)]
        root_entries.push(Entry {
            tile_id: chunk[0].tile_id,
            offset: leaves.len() as u64,
            length: leaf.len() as u32,
            run_length: 0,
        });

        leaves.extend_from_slice(&leaf);
    }

    let root = compress_all(compression, &serialize_entries(&root_entries)?)?;

    trace!(
        "leaf size {leaf_size}: {} leaves ({} bytes), root {} bytes",
        root_entries.len(),
        leaves.len(),
        root.len()
    );

    Ok(Directories {
        root,
        leaves,
        num_leaves: root_entries.len(),
    })
}

/// Builds root and leaf directories, so the root directory is at most
/// `target_root_bytes` long.
///
/// If all entries fit into the root directory, no leaf directories are created.
/// Otherwise the [default strategy](LeafSizeStrategy::default) is used to split them.
///
/// # Arguments
/// * `entries` - All tile entries, sorted by tile id
/// * `target_root_bytes` - Maximum length of the (compressed) root directory
/// * `compression` - Compression of directories
///
/// # Errors
/// Will return [`Err`] if the tile ids of `entries` are not strictly ascending,
/// `compression` is not supported or the encoder failed.
///
/// # Example
/// ```rust
/// # use pmtiles_index::{util::optimize_directories, Compression, Entry};
/// let entries: Vec<Entry> = (0..10_000)
///     .map(|i| Entry { tile_id: i, offset: i * 100, length: 100, run_length: 1 })
///     .collect();
///
/// let directories = optimize_directories(&entries, 1024, Compression::GZip).unwrap();
///
/// assert!(directories.root.len() <= 1024);
/// assert!(directories.num_leaves > 0);
/// ```
pub fn optimize_directories(
    entries: &[Entry],
    target_root_bytes: usize,
    compression: Compression,
) -> Result<Directories> {
    optimize_directories_with(
        entries,
        target_root_bytes,
        compression,
        LeafSizeStrategy::default(),
    )
}

/// Same as [`optimize_directories`], but with an explicit [`LeafSizeStrategy`].
///
/// Always terminates: once all entries share a single leaf directory the root cannot
/// shrink any further and that result is returned, even if it exceeds `target_root_bytes`.
///
/// # Errors
/// Will return [`Err`] if the tile ids of `entries` are not strictly ascending,
/// `compression` is not supported or the encoder failed.
///
pub fn optimize_directories_with(
    entries: &[Entry],
    target_root_bytes: usize,
    compression: Compression,
    strategy: LeafSizeStrategy,
) -> Result<Directories> {
    let root = compress_all(compression, &serialize_entries(entries)?)?;

    if root.len() <= target_root_bytes || entries.is_empty() {
        debug!(
            "{} entries fit into root directory ({} bytes)",
            entries.len(),
            root.len()
        );

        return Ok(Directories {
            root,
            leaves: Vec::new(),
            num_leaves: 0,
        });
    }

    match strategy {
        LeafSizeStrategy::Geometric { start_size } => {
            geometric_strategy(entries, target_root_bytes, compression, start_size)
        }
    }
}

fn geometric_strategy(
    entries: &[Entry],
    target_root_bytes: usize,
    compression: Compression,
    start_size: Option<usize>,
) -> Result<Directories> {
    let mut leaf_size = start_size
        .unwrap_or_else(|| (entries.len() / START_LEAF_SIZE_DIVISOR).max(MIN_START_LEAF_SIZE))
        .max(1);

    loop {
        let directories = build_root_leaves(entries, leaf_size, compression)?;

        if directories.root.len() <= target_root_bytes {
            debug!(
                "split {} entries into {} leaves of at most {leaf_size} entries, root {} bytes",
                entries.len(),
                directories.num_leaves,
                directories.root.len()
            );
            return Ok(directories);
        }

        if leaf_size >= entries.len() {
            warn!(
                "root directory of {} bytes exceeds target of {target_root_bytes} bytes",
                directories.root.len()
            );
            return Ok(directories);
        }

        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let grown = (leaf_size as f64 * LEAF_SIZE_GROWTH) as usize;
        leaf_size = grown.max(leaf_size + 1);
    }
}

#[cfg(test)]
mod test {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;
    use crate::{Directory, Error, FormatError};

    fn random_entries(count: u64) -> Vec<Entry> {
        let mut rng = StdRng::seed_from_u64(3857);
        let mut offset = 0;

        (0..count)
            .map(|tile_id| {
                let length = rng.gen_range(1..1_000_000u32);
                let entry = Entry {
                    tile_id,
                    offset,
                    length,
                    run_length: 1,
                };
                offset += u64::from(length);
                entry
            })
            .collect()
    }

    /// Looks up `tile_id` through root and leaf directory.
    fn resolve(
        directories: &Directories,
        compression: Compression,
        tile_id: u64,
    ) -> Result<Option<Entry>> {
        let root = Directory::from_bytes_compressed(&directories.root, compression)?;

        let Some(pointer) = root.find_tile(tile_id) else {
            return Ok(None);
        };
        assert!(pointer.is_leaf_dir_entry());

        #[allow(clippy::cast_possible_truncation)]
        let start = pointer.offset as usize;
        let end = start + pointer.length as usize;
        let leaf = Directory::from_bytes_compressed(&directories.leaves[start..end], compression)?;

        Ok(leaf.find_tile(tile_id).copied())
    }

    fn assert_two_level(
        entries: &[Entry],
        directories: &Directories,
        compression: Compression,
    ) -> Result<()> {
        let root = Directory::from_bytes_compressed(&directories.root, compression)?;
        assert_eq!(root.len(), directories.num_leaves);

        for entry in entries {
            assert_eq!(
                resolve(directories, compression, entry.tile_id)?,
                Some(*entry)
            );
        }

        Ok(())
    }

    #[test]
    fn test_build_root_leaves_single() -> Result<()> {
        let entries = [Entry {
            tile_id: 100,
            offset: 1,
            length: 1,
            run_length: 0,
        }];

        let directories = build_root_leaves(&entries, 1, Compression::None)?;

        assert_eq!(directories.num_leaves, 1);

        Ok(())
    }

    #[test]
    fn test_build_root_leaves() -> Result<()> {
        let entries = random_entries(10);

        let directories = build_root_leaves(&entries, 3, Compression::None)?;

        assert_eq!(directories.num_leaves, 4);

        let root = Directory::from_bytes(&directories.root)?;
        let tile_ids: Vec<u64> = root.iter().map(|e| e.tile_id).collect();
        assert_eq!(tile_ids, [0, 3, 6, 9]);

        // leaves are laid out back to back
        let mut next_offset = 0;
        for (pointer, chunk) in root.iter().zip(entries.chunks(3)) {
            assert_eq!(pointer.run_length, 0);
            assert_eq!(pointer.offset, next_offset);
            next_offset += u64::from(pointer.length);

            #[allow(clippy::cast_possible_truncation)]
            let leaf = Directory::from_bytes(
                &directories.leaves[pointer.offset as usize..next_offset as usize],
            )?;
            assert_eq!(Vec::from(leaf), chunk);
        }
        assert_eq!(next_offset, directories.leaves.len() as u64);

        Ok(())
    }

    #[test]
    fn test_build_root_leaves_zero_size() -> Result<()> {
        let entries = random_entries(3);

        let directories = build_root_leaves(&entries, 0, Compression::None)?;

        assert_eq!(directories.num_leaves, 3);

        Ok(())
    }

    #[test]
    fn test_optimize_fits_root() -> Result<()> {
        let entries = [Entry {
            tile_id: 0,
            offset: 0,
            length: 100,
            run_length: 1,
        }];

        let directories = optimize_directories(&entries, 100, Compression::None)?;

        assert_eq!(directories.num_leaves, 0);
        assert!(directories.leaves.is_empty());
        assert_eq!(directories.root, Directory::from(entries.to_vec()).to_bytes()?);

        Ok(())
    }

    #[test]
    fn test_optimize_empty() -> Result<()> {
        let directories = optimize_directories(&[], 0, Compression::None)?;

        assert_eq!(directories.root, [0]);
        assert_eq!(directories.num_leaves, 0);

        Ok(())
    }

    #[test]
    fn test_optimize_with_leaves() -> Result<()> {
        let entries = random_entries(1000);

        let directories = optimize_directories(&entries, 1024, Compression::None)?;

        assert!(directories.root.len() <= 1024);
        assert_ne!(directories.num_leaves, 0);
        assert!(!directories.leaves.is_empty());
        assert_two_level(&entries, &directories, Compression::None)?;

        Ok(())
    }

    #[test]
    fn test_optimize_with_leaves_gzip() -> Result<()> {
        let entries = random_entries(1000);

        let directories = optimize_directories(&entries, 1024, Compression::GZip)?;

        assert!(directories.root.len() <= 1024);
        assert_ne!(directories.num_leaves, 0);
        assert_two_level(&entries, &directories, Compression::GZip)?;

        Ok(())
    }

    #[test]
    fn test_optimize_small_start_size() -> Result<()> {
        let entries = random_entries(1000);

        let directories = optimize_directories_with(
            &entries,
            256,
            Compression::None,
            LeafSizeStrategy::Geometric {
                start_size: Some(1),
            },
        )?;

        assert!(directories.root.len() <= 256);
        assert!(directories.num_leaves > 1);
        assert_two_level(&entries, &directories, Compression::None)?;

        Ok(())
    }

    #[test]
    fn test_optimize_unreachable_target() -> Result<()> {
        let entries = random_entries(1000);

        let directories = optimize_directories_with(
            &entries,
            1,
            Compression::None,
            LeafSizeStrategy::Geometric {
                start_size: Some(1),
            },
        )?;

        // a single leaf is the smallest possible root
        assert_eq!(directories.num_leaves, 1);
        assert!(directories.root.len() > 1);
        assert_two_level(&entries, &directories, Compression::None)?;

        Ok(())
    }

    #[test]
    fn test_optimize_zoom_2_with_random_entries() -> Result<()> {
        // nine tiles of zoom 2, where tiles 10 and 11 share their content
        let mut entries = vec![
            Entry { tile_id: 8, offset: 0, length: 10, run_length: 1 },
            Entry { tile_id: 9, offset: 10, length: 10, run_length: 1 },
            Entry { tile_id: 10, offset: 20, length: 10, run_length: 2 },
            Entry { tile_id: 12, offset: 30, length: 10, run_length: 1 },
            Entry { tile_id: 13, offset: 40, length: 10, run_length: 1 },
            Entry { tile_id: 14, offset: 50, length: 10, run_length: 1 },
            Entry { tile_id: 15, offset: 60, length: 10, run_length: 1 },
            Entry { tile_id: 20, offset: 70, length: 10, run_length: 1 },
        ];

        let mut rng = StdRng::seed_from_u64(19_078_479);
        let mut offset = 80;
        for tile_id in 21..(21 + 998) {
            let length = rng.gen_range(1..100_000u32);
            entries.push(Entry {
                tile_id,
                offset,
                length,
                run_length: 1,
            });
            offset += u64::from(length);
        }

        let directories = optimize_directories(&entries, 1024, Compression::None)?;

        assert!(directories.root.len() <= 1024);
        assert_ne!(directories.num_leaves, 0);
        assert_two_level(&entries, &directories, Compression::None)?;

        assert_eq!(
            resolve(&directories, Compression::None, 11)?,
            Some(entries[2])
        );
        assert_eq!(resolve(&directories, Compression::None, 7)?, None);
        assert_eq!(resolve(&directories, Compression::None, 16)?, None);

        Ok(())
    }

    #[test]
    fn test_unsorted_entries() {
        let mut entries = random_entries(10);
        entries.swap(3, 4);

        assert!(matches!(
            build_root_leaves(&entries, 3, Compression::None),
            Err(Error::Format(FormatError::UnsortedTileIds { index: 1 }))
        ));
        assert!(matches!(
            optimize_directories(&entries, 1024, Compression::None),
            Err(Error::Format(FormatError::UnsortedTileIds { index: 4 }))
        ));
    }

    #[test]
    fn test_optimize_unknown_compression() {
        let entries = random_entries(10);

        assert!(optimize_directories(&entries, 1024, Compression::Unknown).is_err());
    }
}
