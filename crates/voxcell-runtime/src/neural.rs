//! Neural sub-scheduler: N integrate-and-fire sub-ticks per physical cycle

use std::collections::HashMap;

use crate::intentions::GlobalCoord;
use crate::neighbors::offsets;
use crate::params::ParameterBlock;
use crate::worldmap::ChunkMap;

/// Run the neural sub-scheduler: `params.ticks_neuraux_par_physique`
/// integrate-and-fire sub-ticks, each reading a fresh snapshot of every
/// neuron's potential so that within a sub-tick only the previous
/// buffer is read ("double buffering"). Potentials, refractory
/// counters, spike cost and spike history are committed to the live
/// cells immediately after each sub-tick, which is sound because only
/// the owning coordinate ever writes its own cell.
pub fn run(map: &mut ChunkMap, params: &ParameterBlock) {
    let neuron_coords = collect_neuron_coords(map);
    if neuron_coords.is_empty() {
        return;
    }
    for _ in 0..params.ticks_neuraux_par_physique {
        let potentials = snapshot_potentials(map, &neuron_coords);
        for &coord in &neuron_coords {
            step_one_neuron(map, coord, &potentials, params);
        }
    }
}

fn collect_neuron_coords(map: &ChunkMap) -> Vec<GlobalCoord> {
    let mut coords = Vec::new();
    for (chunk_coord, chunk) in map.iter_chunks_ordered() {
        for lz in 0..16u8 {
            for ly in 0..16u8 {
                for lx in 0..16u8 {
                    let idx = crate::chunk::Chunk::local_index(lx, ly, lz);
                    let cell = chunk.cell(idx);
                    if cell.alive && cell.cell_type == crate::cell::CellType::Neuron {
                        coords.push(GlobalCoord::new(
                            chunk_coord.cx * 16 + lx as i32,
                            chunk_coord.cy * 16 + ly as i32,
                            chunk_coord.cz * 16 + lz as i32,
                        ));
                    }
                }
            }
        }
    }
    coords
}

fn snapshot_potentials(map: &ChunkMap, coords: &[GlobalCoord]) -> HashMap<GlobalCoord, f32> {
    coords
        .iter()
        .map(|&c| (c, map.read_cell(c.x, c.y, c.z).p))
        .collect()
}

fn step_one_neuron(
    map: &mut ChunkMap,
    coord: GlobalCoord,
    potentials: &HashMap<GlobalCoord, f32>,
    params: &ParameterBlock,
) {
    let cell = map.cell_mut(coord.x, coord.y, coord.z);

    if cell.refractory > 0 {
        cell.refractory -= 1;
        cell.p = 0.0;
        cell.h <<= 1;
        return;
    }

    let self_p = potentials.get(&coord).copied().unwrap_or(0.0);
    let mut sum_input = 0.0f32;
    let mut sum_w = 0.0f32;
    for offset in offsets() {
        let w = cell.w[offset.slot];
        if w <= 0.0 {
            continue;
        }
        let neighbor = coord.offset(offset.dx, offset.dy, offset.dz);
        let neighbor_p = potentials.get(&neighbor).copied().unwrap_or(0.0);
        sum_input += neighbor_p * w;
        sum_w += w;
    }
    let i = sum_input / sum_w.max(1.0);
    let candidate = (0.9 * self_p + i).clamp(-1.0, 1.0);

    if candidate > params.seuil_fire {
        cell.p = 1.0;
        cell.refractory = params.periode_refractaire;
        cell.e_cost += params.cout_spike;
        cell.h = (cell.h << 1) | 1;
    } else {
        cell.p = candidate;
        cell.h <<= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellType;

    #[test]
    fn no_neurons_is_a_no_op() {
        let mut map = ChunkMap::new(None);
        map.cell_mut(0, 0, 0).alive = true;
        run(&mut map, &ParameterBlock::default());
    }

    #[test]
    fn suprathreshold_potential_fires_once_and_enters_refractory() {
        let mut map = ChunkMap::new(None);
        {
            let cell = map.cell_mut(0, 0, 0);
            cell.alive = true;
            cell.cell_type = CellType::Neuron;
            cell.p = 0.95;
        }
        let params = ParameterBlock {
            seuil_fire: 0.85,
            periode_refractaire: 2,
            ticks_neuraux_par_physique: 1,
            ..ParameterBlock::default()
        };
        run(&mut map, &params);
        let cell = map.read_cell(0, 0, 0);
        assert_eq!(cell.p, 1.0);
        assert_eq!(cell.refractory, 2);
        assert_eq!(cell.h & 1, 1);
        assert!(cell.e_cost > 0.0);
    }

    #[test]
    fn refractory_neuron_decrements_and_outputs_zero() {
        let mut map = ChunkMap::new(None);
        {
            let cell = map.cell_mut(0, 0, 0);
            cell.alive = true;
            cell.cell_type = CellType::Neuron;
            cell.refractory = 2;
            cell.p = 1.0;
        }
        let params = ParameterBlock {
            ticks_neuraux_par_physique: 1,
            ..ParameterBlock::default()
        };
        run(&mut map, &params);
        let cell = map.read_cell(0, 0, 0);
        assert_eq!(cell.refractory, 1);
        assert_eq!(cell.p, 0.0);
        assert_eq!(cell.h & 1, 0);
    }
}
