//! Aggregate world statistics, recomputed by a fresh scan on demand.

use crate::cell::CellType;
use crate::neighbors::offsets;
use crate::worldmap::ChunkMap;

/// A snapshot of aggregate world statistics as of one call to
/// [`statistics`]. Never incrementally maintained — always a fresh
/// O(cells) scan, since callers ask for this at most once per cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldStatistics {
    /// Number of alive cells
    pub population: u64,
    /// Mean local cluster size: for each alive cell, one plus its count
    /// of alive neighbors, averaged. A cheap proxy for organism size
    /// that avoids a full connected-component flood-fill every call.
    pub mean_organism_size: f64,
    /// Mean age, in cycles, among alive cells
    pub mean_survival_age: f64,
    /// Mean fraction of an alive neuron's 26 synaptic slots with a
    /// positive weight, averaged over alive neurons (0 if there are none)
    pub mean_neural_connectivity: f64,
}

/// Compute a fresh [`WorldStatistics`] snapshot of `map`.
pub fn compute(map: &ChunkMap) -> WorldStatistics {
    let mut population = 0u64;
    let mut age_sum = 0u64;
    let mut cluster_sum = 0u64;
    let mut neuron_count = 0u64;
    let mut connectivity_sum = 0f64;

    for (coord, chunk) in map.iter_chunks_ordered() {
        for lz in 0..16u8 {
            for ly in 0..16u8 {
                for lx in 0..16u8 {
                    let idx = crate::chunk::Chunk::local_index(lx, ly, lz);
                    let cell = chunk.cell(idx);
                    if !cell.alive || cell.cell_type == CellType::Bedrock {
                        continue;
                    }
                    population += 1;
                    age_sum += cell.a as u64;

                    let x = coord.cx * 16 + lx as i32;
                    let y = coord.cy * 16 + ly as i32;
                    let z = coord.cz * 16 + lz as i32;
                    let mut alive_neighbors = 0u64;
                    for offset in offsets() {
                        if map.read_cell(x + offset.dx, y + offset.dy, z + offset.dz).alive {
                            alive_neighbors += 1;
                        }
                    }
                    cluster_sum += 1 + alive_neighbors;

                    if cell.cell_type == CellType::Neuron {
                        neuron_count += 1;
                        let positive = cell.w.iter().filter(|w| **w > 0.0).count();
                        connectivity_sum += positive as f64 / cell.w.len() as f64;
                    }
                }
            }
        }
    }

    WorldStatistics {
        population,
        mean_organism_size: if population == 0 { 0.0 } else { cluster_sum as f64 / population as f64 },
        mean_survival_age: if population == 0 { 0.0 } else { age_sum as f64 / population as f64 },
        mean_neural_connectivity: if neuron_count == 0 { 0.0 } else { connectivity_sum / neuron_count as f64 },
    }
}
