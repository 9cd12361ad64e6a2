//! Sparse, never-shrinking map from chunk coordinates to owned chunks

use std::collections::HashMap;

use crate::cell::Cell;
use crate::error::{EngineError, Result};
use voxcell_storage::ChunkCoord;

/// Sparse 3D storage over an unbounded integer lattice. Chunks are
/// allocated lazily on first write and never removed; global-to-local
/// coordinate conversion floor-divides, so negative coordinates land in
/// predictable chunks.
#[derive(Debug, Clone, Default)]
pub struct ChunkMap {
    chunks: HashMap<ChunkCoord, crate::chunk::Chunk>,
    /// Soft ceiling on the number of alive cells; `None` disables the guard.
    max_cells: Option<u64>,
    /// Soft ceiling on estimated RAM usage in megabytes, approximated as
    /// `alive_count * size_of::<Cell>()`; `None` disables the guard.
    max_ram_mb: Option<u64>,
    /// When set, a guard breach is logged at `warn` and allowed through
    /// rather than rejected.
    limit_safety_override: bool,
    alive_count: u64,
}

impl ChunkMap {
    /// Construct an empty map with no resource guards.
    pub fn new(max_cells: Option<u64>) -> Self {
        Self::with_guards(max_cells, None, false)
    }

    /// Construct an empty map with the full set of resource guards from
    /// an [`crate::params::EngineConfig`].
    pub fn with_guards(max_cells: Option<u64>, max_ram_mb: Option<u64>, limit_safety_override: bool) -> Self {
        Self {
            chunks: HashMap::new(),
            max_cells,
            max_ram_mb,
            limit_safety_override,
            alive_count: 0,
        }
    }

    /// Number of allocated chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Total number of alive cells tracked across all chunks.
    pub fn alive_count(&self) -> u64 {
        self.alive_count
    }

    /// Drop every allocated chunk and reset the alive count to zero,
    /// keeping the configured resource guards in place. Used by
    /// `ResetWorld` replay actions, which must not also reset the
    /// guards a host configured at construction time.
    pub fn clear_cells(&mut self) {
        self.chunks.clear();
        self.alive_count = 0;
    }

    /// Record that a cell transitioned to/from alive, enforcing the
    /// resource guards on growth. Call this whenever a write flips
    /// `Cell::alive`.
    ///
    /// With `limit_safety_override` set, a breach is logged at `warn`
    /// and the growth is let through rather than rejected.
    pub fn note_alive_delta(&mut self, became_alive: bool) -> Result<()> {
        if became_alive {
            if let Some(limit) = self.max_cells {
                if self.alive_count >= limit {
                    if self.limit_safety_override {
                        log::warn!("alive cell count {} reached max_cells={limit}; continuing under limit_safety_override", self.alive_count + 1);
                    } else {
                        return Err(EngineError::resource_limit("cells", limit));
                    }
                }
            }
            if let Some(limit_mb) = self.max_ram_mb {
                let estimated_mb = (self.alive_count + 1) * std::mem::size_of::<Cell>() as u64 / (1024 * 1024);
                if estimated_mb >= limit_mb {
                    if self.limit_safety_override {
                        log::warn!("estimated RAM usage {estimated_mb}MB reached max_ram_mb={limit_mb}; continuing under limit_safety_override");
                    } else {
                        return Err(EngineError::resource_limit("ram_mb", limit_mb));
                    }
                }
            }
            self.alive_count += 1;
        } else {
            self.alive_count = self.alive_count.saturating_sub(1);
        }
        Ok(())
    }

    /// Record a cell relocating from one coordinate to another: the
    /// source clears and the destination fills, netting to zero alive
    /// cells, so unlike [`ChunkMap::note_alive_delta`] this is
    /// unconditional and never subject to the growth guards.
    pub fn record_relocation(&mut self) {
        // no-op on `alive_count`: one cell leaves, one arrives.
    }

    /// Look up a chunk without allocating.
    pub fn get_chunk(&self, coord: ChunkCoord) -> Option<&crate::chunk::Chunk> {
        self.chunks.get(&coord)
    }

    /// Look up a chunk, allocating it (and, if configured, refusing the
    /// allocation under the resource guard) if absent.
    ///
    /// The resource guard only blocks brand-new *chunk* allocation, not
    /// writes within an already-allocated chunk; the per-cell guard is
    /// [`ChunkMap::note_alive_delta`].
    pub fn get_or_create_chunk(&mut self, coord: ChunkCoord) -> &mut crate::chunk::Chunk {
        self.chunks
            .entry(coord)
            .or_insert_with(|| crate::chunk::Chunk::new(coord))
    }

    /// Read a cell by global coordinates. Coordinates in an unallocated
    /// chunk read as the canonical empty cell.
    pub fn read_cell(&self, x: i32, y: i32, z: i32) -> Cell {
        let (coord, local) = ChunkCoord::from_global(x, y, z);
        match self.chunks.get(&coord) {
            Some(chunk) => *chunk.cell(local.index()),
            None => Cell::EMPTY,
        }
    }

    /// Borrow a cell by global coordinates, allocating its chunk if absent.
    pub fn cell_mut(&mut self, x: i32, y: i32, z: i32) -> &mut Cell {
        let (coord, local) = ChunkCoord::from_global(x, y, z);
        let chunk = self.get_or_create_chunk(coord);
        chunk.cell_mut(local.index())
    }

    /// Iterate `(ChunkCoord, &Chunk)` pairs in deterministic order:
    /// chunk coordinates sorted lexicographically by `(cx, cy, cz)`.
    /// Every algorithm relying on iteration order uses this method.
    pub fn iter_chunks_ordered(&self) -> Vec<(ChunkCoord, &crate::chunk::Chunk)> {
        let mut coords: Vec<ChunkCoord> = self.chunks.keys().copied().collect();
        coords.sort_unstable();
        coords
            .into_iter()
            .map(|c| (c, self.chunks.get(&c).expect("coord came from keys()")))
            .collect()
    }

    /// Mutable counterpart of [`ChunkMap::iter_chunks_ordered`]. Still
    /// deterministic in *order of traversal*; callers must not rely on
    /// any structural property beyond per-chunk independence since a
    /// `HashMap` cannot yield sorted `&mut` pairs directly.
    pub fn for_each_chunk_ordered_mut(&mut self, mut f: impl FnMut(&mut crate::chunk::Chunk)) {
        let mut coords: Vec<ChunkCoord> = self.chunks.keys().copied().collect();
        coords.sort_unstable();
        for coord in coords {
            if let Some(chunk) = self.chunks.get_mut(&coord) {
                f(chunk);
            }
        }
    }

    /// Total alive cells, recomputed by a fresh scan (used for
    /// consistency checks; the fast path is [`ChunkMap::alive_count`]).
    pub fn recount_alive(&self) -> u64 {
        self.chunks.values().map(|c| c.alive_count() as u64).sum()
    }

    /// Recompute and store the cached alive count from a fresh scan.
    /// Needed after code paths that mutate `Cell::alive` directly
    /// through [`ChunkMap::chunks_mut`] rather than through
    /// [`ChunkMap::note_alive_delta`].
    pub fn resync_alive_count(&mut self) {
        self.alive_count = self.recount_alive();
    }

    /// All allocated chunks, mutable, in unspecified (`HashMap`)
    /// order. Callers needing a deterministic order must sort by
    /// `Chunk::coord` themselves; this exists so chunk-parallel
    /// callers can collect disjoint `&mut Chunk` borrows first and
    /// sort those.
    pub fn chunks_mut(&mut self) -> impl Iterator<Item = &mut crate::chunk::Chunk> {
        self.chunks.values_mut()
    }
}
