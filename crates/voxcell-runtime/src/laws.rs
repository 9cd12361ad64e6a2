//! The four intention-producing laws: movement, division, energy
//! osmosis and psychic exchange. Each reads only the pre-resolution
//! snapshot (plus, for movement/division, the proposing cell's own
//! just-updated live fields) and emits into the calling worker's
//! [`crate::intentions::IntentionBuffer`] rather than mutating any
//! other cell directly.

use crate::cell::{Cell, CellType};
use crate::intentions::{
    DivisionIntention, EnergyExchangeIntention, GlobalCoord, IntentionBuffer, MoveIntention,
    PsychicExchangeIntention,
};
use crate::neighbors::offsets;
use crate::params::ParameterBlock;
use crate::worldmap::ChunkMap;

/// Movement intention (law 1). `cell` is the proposing cell's current,
/// post-metabolism state; neighbor data is read from `snapshot`.
pub fn propose_movement(
    coord: GlobalCoord,
    cell: &Cell,
    snapshot: &ChunkMap,
    params: &ParameterBlock,
    out: &mut IntentionBuffer,
) {
    if !cell.alive || cell.cell_type == CellType::Bedrock {
        return;
    }
    let mut best: Option<(GlobalCoord, f32)> = None;
    for offset in offsets() {
        let destination = coord.offset(offset.dx, offset.dy, offset.dz);
        let destination_cell = snapshot.read_cell(destination.x, destination.y, destination.z);
        if destination_cell.alive {
            continue;
        }
        let mut sum_e = 0.0f32;
        let mut sum_c = 0.0f32;
        let mut adhesion = 0.0f32;
        for near_offset in offsets() {
            let near = destination.offset(near_offset.dx, near_offset.dy, near_offset.dz);
            let near_cell = snapshot.read_cell(near.x, near.y, near.z);
            if near_cell.alive {
                sum_e += near_cell.e;
                sum_c += near_cell.c;
                if near_cell.cell_type == cell.cell_type {
                    adhesion += 1.0;
                }
            }
        }
        let score = params.k_d * cell.d - params.k_c * cell.c
            + params.k_m * cell.m / (cell.a as f32 + 1.0)
            + params.k_champ_e * sum_e
            - params.k_champ_c * sum_c
            + params.k_adh * adhesion
            - params.cost_movement;
        let is_better = match best {
            Some((_, best_score)) => score > best_score,
            None => true,
        };
        if is_better {
            best = Some((destination, score));
        }
    }
    if let Some((destination, _)) = best {
        out.moves.push(MoveIntention {
            source: coord,
            destination,
            priority: cell.d,
        });
    }
}

/// Division intention (law 2). `cell` is the proposing cell's current
/// state; the first empty neighbor in fixed enumeration order is the
/// proposed daughter site.
pub fn propose_division(
    coord: GlobalCoord,
    cell: &Cell,
    snapshot: &ChunkMap,
    params: &ParameterBlock,
    out: &mut IntentionBuffer,
) {
    if !cell.alive || cell.cell_type == CellType::Bedrock {
        return;
    }
    if cell.e <= params.seuil_energie_division {
        return;
    }
    for offset in offsets() {
        let destination = coord.offset(offset.dx, offset.dy, offset.dz);
        if !snapshot.read_cell(destination.x, destination.y, destination.z).alive {
            out.divisions.push(DivisionIntention {
                source: coord,
                destination,
                priority: cell.e,
            });
            return;
        }
    }
}

/// Energy osmosis intention (law 4). Reads both participants from
/// `snapshot` so the result does not depend on which of the two cells'
/// worker thread computed it; emitted only for `source < neighbor` so
/// each pair is considered once.
pub fn propose_exchanges(
    coord: GlobalCoord,
    snapshot: &ChunkMap,
    params: &ParameterBlock,
    out: &mut IntentionBuffer,
) {
    let source_cell = snapshot.read_cell(coord.x, coord.y, coord.z);
    if !source_cell.alive {
        return;
    }
    for offset in offsets() {
        let neighbor = coord.offset(offset.dx, offset.dy, offset.dz);
        if neighbor <= coord {
            continue;
        }
        let neighbor_cell = snapshot.read_cell(neighbor.x, neighbor.y, neighbor.z);
        if !neighbor_cell.alive {
            continue;
        }
        if (source_cell.r - neighbor_cell.r).abs() >= params.seuil_similarite_r {
            continue;
        }
        let delta = ((source_cell.e - neighbor_cell.e) * params.facteur_echange_energie)
            .clamp(-params.max_flux_energie, params.max_flux_energie);
        if delta.abs() > f32::EPSILON {
            out.exchanges.push(EnergyExchangeIntention {
                source: coord,
                target: neighbor,
                delta,
            });
        }
    }
}

/// Psychic exchange intention (law 5), applied unilaterally to the
/// source during resolution. `cell` is the proposing cell's current
/// state (only its type matters here); neighbor stress/boredom is read
/// from `snapshot`.
pub fn propose_psychic(
    coord: GlobalCoord,
    cell: &Cell,
    snapshot: &ChunkMap,
    out: &mut IntentionBuffer,
) {
    if !cell.alive || cell.cell_type == CellType::Bedrock {
        return;
    }
    for offset in offsets() {
        let neighbor = coord.offset(offset.dx, offset.dy, offset.dz);
        let neighbor_cell = snapshot.read_cell(neighbor.x, neighbor.y, neighbor.z);
        if neighbor_cell.alive {
            out.psychic.push(PsychicExchangeIntention {
                source: coord,
                target: neighbor,
                delta_c: 0.1 * neighbor_cell.c,
                delta_l: 0.1 * neighbor_cell.l,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_ignores_occupied_neighbors() {
        let mut snapshot = ChunkMap::new(None);
        for offset in offsets() {
            let c = GlobalCoord::new(0, 0, 0).offset(offset.dx, offset.dy, offset.dz);
            snapshot.cell_mut(c.x, c.y, c.z).alive = true;
        }
        let mut cell = Cell::EMPTY;
        cell.alive = true;
        let params = ParameterBlock::default();
        let mut buffer = IntentionBuffer::default();
        propose_movement(GlobalCoord::new(0, 0, 0), &cell, &snapshot, &params, &mut buffer);
        assert!(buffer.moves.is_empty());
        cell.d = 0.0; // silence unused warning in some configurations
    }

    #[test]
    fn movement_picks_highest_scoring_empty_neighbor() {
        let mut snapshot = ChunkMap::new(None);
        // make (2,0,0)'s neighborhood richer in energy than (-1,0,0)'s
        snapshot.cell_mut(3, 0, 0).alive = true;
        snapshot.cell_mut(3, 0, 0).e = 5.0;

        let cell = Cell { alive: true, ..Cell::EMPTY };
        let params = ParameterBlock {
            k_d: 0.0,
            k_c: 0.0,
            k_m: 0.0,
            k_champ_e: 1.0,
            k_champ_c: 0.0,
            k_adh: 0.0,
            cost_movement: 0.0,
            ..ParameterBlock::default()
        };
        let mut buffer = IntentionBuffer::default();
        propose_movement(GlobalCoord::new(0, 0, 0), &cell, &snapshot, &params, &mut buffer);
        let mv = buffer.moves.first().unwrap();
        assert_eq!(mv.destination, GlobalCoord::new(1, 0, 0));
    }

    #[test]
    fn division_proposes_first_empty_neighbor_in_order() {
        let mut snapshot = ChunkMap::new(None);
        // occupy the first offset (-1,-1,-1) so division must skip it
        snapshot.cell_mut(-1, -1, -1).alive = true;

        let cell = Cell { alive: true, e: 5.0, ..Cell::EMPTY };
        let params = ParameterBlock { seuil_energie_division: 1.0, ..ParameterBlock::default() };
        let mut buffer = IntentionBuffer::default();
        propose_division(GlobalCoord::new(0, 0, 0), &cell, &snapshot, &params, &mut buffer);
        let div = buffer.divisions.first().unwrap();
        assert_eq!(div.destination, GlobalCoord::new(0, -1, -1));
    }

    #[test]
    fn division_skipped_below_threshold() {
        let snapshot = ChunkMap::new(None);
        let cell = Cell { alive: true, e: 0.5, ..Cell::EMPTY };
        let params = ParameterBlock { seuil_energie_division: 1.0, ..ParameterBlock::default() };
        let mut buffer = IntentionBuffer::default();
        propose_division(GlobalCoord::new(0, 0, 0), &cell, &snapshot, &params, &mut buffer);
        assert!(buffer.divisions.is_empty());
    }

    #[test]
    fn exchange_only_emitted_for_lower_ordered_source() {
        let mut snapshot = ChunkMap::new(None);
        snapshot.cell_mut(0, 0, 0).alive = true;
        snapshot.cell_mut(0, 0, 0).e = 1.0;
        snapshot.cell_mut(1, 0, 0).alive = true;
        snapshot.cell_mut(1, 0, 0).e = 0.0;

        let params = ParameterBlock {
            seuil_similarite_r: 1.0,
            facteur_echange_energie: 1.0,
            max_flux_energie: 10.0,
            ..ParameterBlock::default()
        };
        let mut from_lower = IntentionBuffer::default();
        propose_exchanges(GlobalCoord::new(0, 0, 0), &snapshot, &params, &mut from_lower);
        assert_eq!(from_lower.exchanges.len(), 1);

        let mut from_higher = IntentionBuffer::default();
        propose_exchanges(GlobalCoord::new(1, 0, 0), &snapshot, &params, &mut from_higher);
        assert!(from_higher.exchanges.is_empty());
    }

    #[test]
    fn psychic_emits_for_every_alive_neighbor() {
        let mut snapshot = ChunkMap::new(None);
        snapshot.cell_mut(1, 0, 0).alive = true;
        snapshot.cell_mut(1, 0, 0).c = 0.5;
        snapshot.cell_mut(1, 0, 0).l = 0.2;

        let cell = Cell { alive: true, ..Cell::EMPTY };
        let mut buffer = IntentionBuffer::default();
        propose_psychic(GlobalCoord::new(0, 0, 0), &cell, &snapshot, &mut buffer);
        assert_eq!(buffer.psychic.len(), 1);
        assert!((buffer.psychic[0].delta_c - 0.05).abs() < 1e-6);
    }
}
