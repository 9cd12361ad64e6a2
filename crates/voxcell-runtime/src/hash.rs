//! Deterministic whole-world state hashing, used to verify
//! bit-reproducibility across runs and across worker-count changes.
//!
//! Each chunk is seeded from its own coordinates (so two equal chunks
//! at different positions never collide) by folding its alive cells in
//! fixed local row-major order through a rotate-xor accumulator; chunk
//! hashes are then combined order-independently by XOR, since an
//! unbounded sparse world's chunk set is not itself totally ordered by
//! anything the hash should depend on beyond what `iter_chunks_ordered`
//! already guarantees.

use crate::cell::Cell;
use crate::worldmap::ChunkMap;
use voxcell_storage::ChunkCoord;

/// 64-bit avalanche mix (splitmix64 finalizer) used to turn a raw `i32`
/// axis coordinate into a well-distributed hash.
fn hash_i32(v: i32) -> u64 {
    let mut h = v as u32 as u64;
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51afd7ed558ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ceb9fe1a85ec53);
    h ^= h >> 33;
    h
}

/// Seed a chunk's accumulator from its coordinates.
fn chunk_seed(coord: ChunkCoord) -> u64 {
    hash_i32(coord.cx) ^ (hash_i32(coord.cy) << 1) ^ (hash_i32(coord.cz) << 2)
}

/// Fold one alive cell's energy and type into a chunk accumulator.
fn fold_cell(h: u64, cell: &Cell) -> u64 {
    h.rotate_left(5) ^ cell.e.to_bits() as u64 ^ cell.cell_type.as_u8() as u64
}

/// Compute the deterministic digest of the whole world's alive-cell
/// state, as of this call.
pub fn state_hash(map: &ChunkMap) -> u64 {
    let mut global = 0u64;
    for (coord, chunk) in map.iter_chunks_ordered() {
        let mut h = chunk_seed(coord);
        for cell in chunk.cells() {
            if !cell.alive {
                continue;
            }
            h = fold_cell(h, cell);
        }
        global ^= h;
    }
    global
}
