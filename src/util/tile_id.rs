use hilbert_2d::Variant;

use crate::RangeError;

/// The maximum zoom level, which can be addressed by a tile id.
///
/// On targets with a 32 bit `usize` (e.g. `wasm32`) the Hilbert curve can only be
/// evaluated up to zoom 16, higher zooms fail with [`RangeError::ZoomTooLarge`].
pub const MAX_ZOOM: u8 = 26;

/// Returns `true` if Hilbert distances of zoom `z` fit into a `usize`.
const fn fits_usize(z: u8) -> bool {
    2 * z as u32 <= usize::BITS
}

/// Returns the id of the first tile on zoom level `z`, which equals the number
/// of tiles on all lower zoom levels: `(4^z - 1) / 3`.
const fn base_id(z: u8) -> u64 {
    ((1u64 << (2 * z as u32)) - 1) / 3
}

/// Converts z/x/y coordinates to a tile id.
///
/// Tile ids are dense across zoom levels and ordered along a Hilbert curve
/// within each zoom level.
///
/// # Arguments
///
/// * `z` - The z coordinate (lod)
/// * `x` - The x coordinate
/// * `y` - The y coordinate
///
/// # Errors
/// Will return [`Err`] if `z` is greater than [`MAX_ZOOM`] (or than 16 on 32 bit targets)
/// or `x` / `y` are not smaller than `2^z`.
///
/// # Example
/// ```rust
/// # use pmtiles_index::util::zxy_to_tile_id;
/// assert_eq!(zxy_to_tile_id(1, 1, 0).unwrap(), 4);
/// assert!(zxy_to_tile_id(27, 0, 0).is_err());
/// ```
pub fn zxy_to_tile_id(z: u8, x: u64, y: u64) -> Result<u64, RangeError> {
    if z > MAX_ZOOM || !fits_usize(z) {
        return Err(RangeError::ZoomTooLarge(z));
    }

    let dim = 1u64 << z;
    if x >= dim || y >= dim {
        return Err(RangeError::OutOfBounds { z, x, y });
    }

    if z == 0 {
        return Ok(0);
    }

    #[allow(clippy::cast_possible_truncation)]
    let distance =
        hilbert_2d::xy2h_discrete(x as usize, y as usize, z as usize, Variant::Hilbert) as u64;

    Ok(base_id(z) + distance)
}

fn find_z(tile_id: u64) -> Result<u8, RangeError> {
    (0..=MAX_ZOOM)
        .find(|&z| tile_id < base_id(z + 1))
        .ok_or(RangeError::TileIdTooLarge(tile_id))
}

/// Converts a tile id to z/x/y coordinates.
///
/// This is the exact inverse of [`zxy_to_tile_id`].
///
/// # Arguments
/// * `tile_id` - The tile id
///
/// # Errors
/// Will return [`Err`] if `tile_id` has a z coordinate greater than [`MAX_ZOOM`]
/// (or than 16 on 32 bit targets).
pub fn tile_id_to_zxy(tile_id: u64) -> Result<(u8, u64, u64), RangeError> {
    let z = find_z(tile_id)?;

    if !fits_usize(z) {
        return Err(RangeError::TileIdTooLarge(tile_id));
    }

    if z == 0 {
        return Ok((0, 0, 0));
    }

    #[allow(clippy::cast_possible_truncation)]
    let (x, y) =
        hilbert_2d::h2xy_discrete((tile_id - base_id(z)) as usize, z as usize, Variant::Hilbert);

    Ok((z, x as u64, y as u64))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fits_usize() {
        assert!(fits_usize(16));

        #[cfg(target_pointer_width = "64")]
        assert!(fits_usize(MAX_ZOOM));

        #[cfg(target_pointer_width = "32")]
        {
            assert!(!fits_usize(17));
            assert_eq!(zxy_to_tile_id(17, 0, 0), Err(RangeError::ZoomTooLarge(17)));
            assert_eq!(
                tile_id_to_zxy(base_id(17)),
                Err(RangeError::TileIdTooLarge(base_id(17)))
            );
        }
    }

    #[test]
    fn test_base_id() {
        assert_eq!(base_id(0), 0);
        assert_eq!(base_id(1), 1);
        assert_eq!(base_id(2), 5);
        assert_eq!(base_id(3), 21);
        assert_eq!(base_id(26), 1_501_199_875_790_165);
    }

    #[test]
    fn test_zxy_to_tile_id() -> Result<(), RangeError> {
        assert_eq!(zxy_to_tile_id(0, 0, 0)?, 0);
        assert_eq!(zxy_to_tile_id(1, 0, 0)?, 1);
        assert_eq!(zxy_to_tile_id(1, 0, 1)?, 2);
        assert_eq!(zxy_to_tile_id(1, 1, 1)?, 3);
        assert_eq!(zxy_to_tile_id(1, 1, 0)?, 4);
        assert_eq!(zxy_to_tile_id(2, 0, 0)?, 5);
        assert_eq!(zxy_to_tile_id(12, 3423, 1763)?, 19_078_479);

        Ok(())
    }

    #[test]
    fn test_tile_id_to_zxy() -> Result<(), RangeError> {
        assert_eq!(tile_id_to_zxy(0)?, (0, 0, 0));
        assert_eq!(tile_id_to_zxy(1)?, (1, 0, 0));
        assert_eq!(tile_id_to_zxy(2)?, (1, 0, 1));
        assert_eq!(tile_id_to_zxy(3)?, (1, 1, 1));
        assert_eq!(tile_id_to_zxy(4)?, (1, 1, 0));
        assert_eq!(tile_id_to_zxy(5)?, (2, 0, 0));
        assert_eq!(tile_id_to_zxy(19_078_479)?, (12, 3423, 1763));

        Ok(())
    }

    #[test]
    fn test_many_tiles() -> Result<(), RangeError> {
        for z in 0u8..=8 {
            for x in 0..1u64 << z {
                for y in 0..1u64 << z {
                    assert_eq!(tile_id_to_zxy(zxy_to_tile_id(z, x, y)?)?, (z, x, y));
                }
            }
        }

        Ok(())
    }

    #[test]
    fn test_extremes() -> Result<(), RangeError> {
        for z in 0u8..=MAX_ZOOM {
            let dim: u64 = (1 << z) - 1;
            assert_eq!(tile_id_to_zxy(zxy_to_tile_id(z, 0, 0)?)?, (z, 0, 0));
            assert_eq!(tile_id_to_zxy(zxy_to_tile_id(z, dim, 0)?)?, (z, dim, 0));
            assert_eq!(tile_id_to_zxy(zxy_to_tile_id(z, 0, dim)?)?, (z, 0, dim));
            assert_eq!(tile_id_to_zxy(zxy_to_tile_id(z, dim, dim)?)?, (z, dim, dim));
        }

        Ok(())
    }

    #[test]
    fn test_invalid() {
        assert_eq!(
            tile_id_to_zxy(9_007_199_254_740_991),
            Err(RangeError::TileIdTooLarge(9_007_199_254_740_991))
        );
        assert_eq!(
            zxy_to_tile_id(27, 0, 0),
            Err(RangeError::ZoomTooLarge(27))
        );
        assert_eq!(
            zxy_to_tile_id(0, 1, 1),
            Err(RangeError::OutOfBounds { z: 0, x: 1, y: 1 })
        );
    }

    #[test]
    fn test_zoom_boundaries() -> Result<(), RangeError> {
        // last tile of a zoom level is followed by the first tile of the next
        assert_eq!(tile_id_to_zxy(base_id(3) - 1)?.0, 2);
        assert_eq!(tile_id_to_zxy(base_id(3))?.0, 3);
        assert_eq!(tile_id_to_zxy(base_id(27) - 1)?.0, MAX_ZOOM);
        assert!(tile_id_to_zxy(base_id(27)).is_err());

        Ok(())
    }
}
