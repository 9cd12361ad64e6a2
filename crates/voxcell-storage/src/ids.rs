//! Chunk coordinate identifiers

use core::fmt;

/// Integer coordinates of a 16^3 chunk within the infinite world map.
///
/// Distinct from a cell's global `(x, y, z)`: a `ChunkCoord` addresses a
/// whole 4096-cell cube, obtained from global coordinates by floor
/// division by the chunk edge length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkCoord {
    /// Chunk X coordinate
    pub cx: i32,
    /// Chunk Y coordinate
    pub cy: i32,
    /// Chunk Z coordinate
    pub cz: i32,
}

impl ChunkCoord {
    /// Edge length of a chunk, in cells.
    pub const EDGE: i32 = 16;

    /// Number of cells in a chunk (`EDGE^3`).
    pub const VOLUME: usize = (Self::EDGE as usize).pow(3);

    /// Construct a chunk coordinate directly.
    pub const fn new(cx: i32, cy: i32, cz: i32) -> Self {
        Self { cx, cy, cz }
    }

    /// Convert a global cell coordinate into its owning chunk coordinate
    /// and the cell's local position within that chunk, using floor
    /// division so negative coordinates land in predictable chunks.
    pub fn from_global(x: i32, y: i32, z: i32) -> (Self, LocalCoord) {
        let cx = x.div_euclid(Self::EDGE);
        let cy = y.div_euclid(Self::EDGE);
        let cz = z.div_euclid(Self::EDGE);
        let lx = x.rem_euclid(Self::EDGE) as u8;
        let ly = y.rem_euclid(Self::EDGE) as u8;
        let lz = z.rem_euclid(Self::EDGE) as u8;
        (Self::new(cx, cy, cz), LocalCoord { lx, ly, lz })
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chunk({}, {}, {})", self.cx, self.cy, self.cz)
    }
}

/// Position of a cell within its owning chunk, each axis in `0..16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalCoord {
    /// Local X in `0..16`
    pub lx: u8,
    /// Local Y in `0..16`
    pub ly: u8,
    /// Local Z in `0..16`
    pub lz: u8,
}

impl LocalCoord {
    /// Row-major index within the chunk's flat cell array:
    /// `idx = lx + ly*16 + lz*256`.
    pub const fn index(&self) -> usize {
        self.lx as usize + (self.ly as usize) * 16 + (self.lz as usize) * 256
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Reassembling `chunk*EDGE + local` from [`ChunkCoord::from_global`]
        /// always recovers the original global coordinate, for any `i32`
        /// input (not just small/positive ones the unit tests cover).
        #[test]
        fn from_global_round_trips_to_the_original_coordinate(
            x in any::<i32>(), y in any::<i32>(), z in any::<i32>(),
        ) {
            let (chunk, local) = ChunkCoord::from_global(x, y, z);
            prop_assert_eq!(chunk.cx * ChunkCoord::EDGE + local.lx as i32, x);
            prop_assert_eq!(chunk.cy * ChunkCoord::EDGE + local.ly as i32, y);
            prop_assert_eq!(chunk.cz * ChunkCoord::EDGE + local.lz as i32, z);
        }

        /// The local index is always in bounds for any input coordinate.
        #[test]
        fn from_global_local_index_is_always_in_bounds(
            x in any::<i32>(), y in any::<i32>(), z in any::<i32>(),
        ) {
            let (_, local) = ChunkCoord::from_global(x, y, z);
            prop_assert!(local.index() < ChunkCoord::VOLUME);
        }
    }
}
