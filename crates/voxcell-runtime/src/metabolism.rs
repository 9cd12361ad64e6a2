//! Per-cycle metabolic bookkeeping: need/boredom accrual, sunlight, upkeep cost

use crate::cell::{Cell, CellType};
use crate::params::ParameterBlock;

/// Apply one cycle of metabolism to `cell` in place. A no-op for
/// bedrock. `y` is the cell's global Y coordinate, needed for the
/// sunlight height gate.
pub fn apply(y: i32, cell: &mut Cell, params: &ParameterBlock) {
    if cell.cell_type == CellType::Bedrock {
        return;
    }
    cell.d += params.d_per_tick;
    cell.l += params.l_per_tick;
    if cell.cell_type != CellType::Neuron && (y as f32) >= params.world_height * params.hauteur_soleil {
        cell.e += params.sensibilite_soleil;
    }
    cell.e -= params.k_thermo + cell.e_cost;
    cell.e_cost = 0.0;
    cell.a += 1;
}
