//! Hebbian / STDP-flavored synaptic weight update

use crate::cell::{Cell, CellType};
use crate::intentions::GlobalCoord;
use crate::neighbors::offsets;
use crate::params::ParameterBlock;
use crate::worldmap::ChunkMap;

/// Update `cell`'s synaptic weights in place from the pre-resolution
/// snapshot's spike history. A no-op for non-neuron cells.
pub fn apply(coord: GlobalCoord, cell: &mut Cell, snapshot: &ChunkMap, params: &ParameterBlock) {
    if cell.cell_type != CellType::Neuron {
        return;
    }
    let self_fired = (snapshot.read_cell(coord.x, coord.y, coord.z).h & 1) != 0;
    for offset in offsets() {
        let neighbor = coord.offset(offset.dx, offset.dy, offset.dz);
        let neighbor_h = snapshot.read_cell(neighbor.x, neighbor.y, neighbor.z).h;
        let neighbor_active = (neighbor_h & 0b111) != 0;
        let w = &mut cell.w[offset.slot];
        if self_fired && neighbor_active {
            *w += params.learn_rate;
        } else {
            *w -= 0.1 * params.learn_rate;
        }
        *w = (*w * params.decay_synapse).clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_neuron_is_unaffected() {
        let mut cell = Cell::EMPTY;
        cell.alive = true;
        cell.cell_type = CellType::Soma;
        let before = cell;
        let snapshot = ChunkMap::new(None);
        apply(GlobalCoord::new(0, 0, 0), &mut cell, &snapshot, &ParameterBlock::default());
        assert_eq!(cell, before);
    }

    #[test]
    fn coincident_firing_strengthens_weight() {
        let mut snapshot = ChunkMap::new(None);
        snapshot.cell_mut(0, 0, 0).h = 0b1;
        snapshot.cell_mut(1, 0, 0).h = 0b1;

        let mut cell = Cell::EMPTY;
        cell.alive = true;
        cell.cell_type = CellType::Neuron;
        let params = ParameterBlock {
            learn_rate: 0.1,
            decay_synapse: 1.0,
            ..ParameterBlock::default()
        };
        apply(GlobalCoord::new(0, 0, 0), &mut cell, &snapshot, &params);
        let slot = crate::cell::synapse_slot(1, 0, 0);
        assert!((cell.w[slot] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn non_coincident_firing_weakens_weight() {
        let mut snapshot = ChunkMap::new(None);
        snapshot.cell_mut(0, 0, 0).h = 0b1;

        let mut cell = Cell::EMPTY;
        cell.alive = true;
        cell.cell_type = CellType::Neuron;
        cell.w[crate::cell::synapse_slot(1, 0, 0)] = 0.5;
        let params = ParameterBlock {
            learn_rate: 0.1,
            decay_synapse: 1.0,
            ..ParameterBlock::default()
        };
        apply(GlobalCoord::new(0, 0, 0), &mut cell, &snapshot, &params);
        let slot = crate::cell::synapse_slot(1, 0, 0);
        assert!(cell.w[slot] < 0.5);
    }
}
