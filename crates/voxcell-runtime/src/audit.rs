//! Invariant audit pass: an optional, post-finalization sanity sweep
//! that catches numerical corruption finalization's clamps don't cover
//! (NaN/Inf, an out-of-band membrane potential, deeply negative
//! stress) and quarantines the offending cell rather than letting it
//! poison subsequent cycles. Gated by
//! [`crate::params::EngineConfig::audit_invariants`] since it costs a
//! full extra world scan.

use crate::cell::{Cell, CellType};
use crate::intentions::GlobalCoord;
use crate::worldmap::ChunkMap;

/// Number of cells quarantined by one audit pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuditReport {
    /// Cells reset because of a non-finite `E` or `P`
    pub non_finite: u64,
    /// Cells reset because `P` left `[-1.1, 1.1]`
    pub potential_out_of_range: u64,
    /// Cells reset because `C` fell below `-0.1`
    pub stress_out_of_range: u64,
}

impl AuditReport {
    /// Total cells quarantined across all categories.
    pub fn total(&self) -> u64 {
        self.non_finite + self.potential_out_of_range + self.stress_out_of_range
    }
}

fn audit_one(coord: GlobalCoord, cell: &mut Cell) -> Option<&'static str> {
    if cell.cell_type == CellType::Bedrock || !cell.alive {
        return None;
    }
    if !cell.e.is_finite() || !cell.p.is_finite() {
        log::warn!("audit: quarantining {coord:?}, non-finite E={} P={}", cell.e, cell.p);
        cell.clear();
        return Some("non_finite");
    }
    if !(-1.1..=1.1).contains(&cell.p) {
        log::warn!("audit: quarantining {coord:?}, P={} out of range", cell.p);
        cell.clear();
        return Some("potential_out_of_range");
    }
    if cell.c < -0.1 {
        log::warn!("audit: quarantining {coord:?}, C={} out of range", cell.c);
        cell.clear();
        return Some("stress_out_of_range");
    }
    None
}

/// Scan every alive cell in `map` and quarantine any whose state has
/// left its documented numeric range, returning a summary for logging.
pub fn run(map: &mut ChunkMap) -> AuditReport {
    let mut report = AuditReport::default();
    map.for_each_chunk_ordered_mut(|chunk| {
        for lz in 0..16u8 {
            for ly in 0..16u8 {
                for lx in 0..16u8 {
                    let idx = crate::chunk::Chunk::local_index(lx, ly, lz);
                    let coord = GlobalCoord::new(
                        chunk.coord.cx * 16 + lx as i32,
                        chunk.coord.cy * 16 + ly as i32,
                        chunk.coord.cz * 16 + lz as i32,
                    );
                    match audit_one(coord, chunk.cell_mut(idx)) {
                        Some("non_finite") => report.non_finite += 1,
                        Some("potential_out_of_range") => report.potential_out_of_range += 1,
                        Some("stress_out_of_range") => report.stress_out_of_range += 1,
                        _ => {}
                    }
                }
            }
        }
        chunk.refresh_alive_flag();
    });
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_world_is_untouched() {
        let mut map = ChunkMap::new(None);
        map.cell_mut(0, 0, 0).alive = true;
        map.cell_mut(0, 0, 0).e = 1.0;
        let report = run(&mut map);
        assert_eq!(report.total(), 0);
        assert!(map.read_cell(0, 0, 0).alive);
    }

    #[test]
    fn non_finite_energy_is_quarantined() {
        let mut map = ChunkMap::new(None);
        map.cell_mut(0, 0, 0).alive = true;
        map.cell_mut(0, 0, 0).e = f32::NAN;
        let report = run(&mut map);
        assert_eq!(report.non_finite, 1);
        assert!(!map.read_cell(0, 0, 0).alive);
    }

    #[test]
    fn out_of_range_potential_is_quarantined() {
        let mut map = ChunkMap::new(None);
        map.cell_mut(0, 0, 0).alive = true;
        map.cell_mut(0, 0, 0).p = 5.0;
        let report = run(&mut map);
        assert_eq!(report.potential_out_of_range, 1);
    }

    #[test]
    fn deeply_negative_stress_is_quarantined() {
        let mut map = ChunkMap::new(None);
        map.cell_mut(0, 0, 0).alive = true;
        map.cell_mut(0, 0, 0).c = -0.5;
        let report = run(&mut map);
        assert_eq!(report.stress_out_of_range, 1);
    }

    #[test]
    fn bedrock_is_never_audited() {
        let mut map = ChunkMap::new(None);
        *map.cell_mut(0, 0, 0) = Cell::bedrock();
        let report = run(&mut map);
        assert_eq!(report.total(), 0);
    }
}
