//! End-of-cycle clamping and death: the last step of every advance,
//! applied uniformly across all alive, non-bedrock cells after
//! resolution has committed every intention.

use crate::cell::{Cell, CellType};

/// Clamp `cell`'s bounded fields and quarantine it (reset to empty) if
/// it has run out of energy or its stress has exceeded its critical
/// threshold. A no-op for bedrock, which carries none of these fields
/// meaningfully.
pub fn apply(cell: &mut Cell) {
    if cell.cell_type == CellType::Bedrock || !cell.alive {
        return;
    }
    cell.c = cell.c.clamp(0.0, 1.0);
    cell.r = cell.r.clamp(0.0, 1.0);
    cell.sc = cell.sc.clamp(0.0, 1.0);
    cell.e = cell.e.max(0.0);
    cell.l = cell.l.max(0.0);

    if cell.e <= 0.0 || cell.c > cell.sc {
        cell.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bedrock_is_untouched() {
        let mut cell = Cell::bedrock();
        let before = cell;
        apply(&mut cell);
        assert_eq!(cell, before);
    }

    #[test]
    fn out_of_range_fields_are_clamped() {
        let mut cell = Cell { alive: true, c: -0.5, r: 1.5, sc: 2.0, e: 1.0, l: -1.0, ..Cell::EMPTY };
        apply(&mut cell);
        assert_eq!(cell.c, 0.0);
        assert_eq!(cell.r, 1.0);
        assert_eq!(cell.sc, 1.0);
        assert_eq!(cell.l, 0.0);
    }

    #[test]
    fn depleted_energy_quarantines_the_cell() {
        let mut cell = Cell { alive: true, e: -0.1, sc: 1.0, ..Cell::EMPTY };
        apply(&mut cell);
        assert_eq!(cell, Cell::EMPTY);
    }

    #[test]
    fn stress_above_critical_threshold_quarantines_the_cell() {
        let mut cell = Cell { alive: true, e: 1.0, c: 0.9, sc: 0.5, ..Cell::EMPTY };
        apply(&mut cell);
        assert_eq!(cell, Cell::EMPTY);
    }

    #[test]
    fn healthy_cell_survives_unclamped_and_alive() {
        let mut cell = Cell { alive: true, e: 1.0, c: 0.2, sc: 0.5, ..Cell::EMPTY };
        apply(&mut cell);
        assert!(cell.alive);
        assert_eq!(cell.e, 1.0);
    }
}
