//! Memory update: tracks the recent peak neighbor energy, with forgetting

use crate::cell::Cell;
use crate::intentions::GlobalCoord;
use crate::neighbors::offsets;
use crate::params::ParameterBlock;
use crate::worldmap::ChunkMap;

/// Update `cell.m` in place: the forgetting-decayed previous memory,
/// or the maximum energy among alive neighbors on the snapshot,
/// whichever is larger.
pub fn apply(coord: GlobalCoord, cell: &mut Cell, snapshot: &ChunkMap, params: &ParameterBlock) {
    let mut max_neighbor_e = 0.0f32;
    for offset in offsets() {
        let neighbor = coord.offset(offset.dx, offset.dy, offset.dz);
        let neighbor_cell = snapshot.read_cell(neighbor.x, neighbor.y, neighbor.z);
        if neighbor_cell.alive {
            max_neighbor_e = max_neighbor_e.max(neighbor_cell.e);
        }
    }
    cell.m = (cell.m * (1.0 - params.taux_oubli)).max(max_neighbor_e);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_tracks_peak_neighbor_energy() {
        let mut snapshot = ChunkMap::new(None);
        snapshot.cell_mut(1, 0, 0).alive = true;
        snapshot.cell_mut(1, 0, 0).e = 3.0;

        let mut cell = Cell::EMPTY;
        cell.alive = true;
        cell.m = 0.0;
        apply(GlobalCoord::new(0, 0, 0), &mut cell, &snapshot, &ParameterBlock::default());
        assert_eq!(cell.m, 3.0);
    }

    #[test]
    fn memory_decays_without_a_higher_neighbor() {
        let snapshot = ChunkMap::new(None);
        let mut cell = Cell::EMPTY;
        cell.alive = true;
        cell.m = 1.0;
        let params = ParameterBlock { taux_oubli: 0.1, ..ParameterBlock::default() };
        apply(GlobalCoord::new(0, 0, 0), &mut cell, &snapshot, &params);
        assert!((cell.m - 0.9).abs() < 1e-6);
    }
}
