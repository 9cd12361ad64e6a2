//! Serial, deterministic resolution of a phase's merged intentions.
//!
//! Applied in a fixed order — movement, then division, then energy
//! osmosis, then psychic exchange — so that later laws observe the
//! occupancy changes made by earlier ones within the same cycle. Order
//! within a law is always by destination (movement/division) or by
//! `(source, target)` (the two exchange laws), never by worker id, so
//! the result is identical regardless of how work was partitioned
//! across threads.

use std::collections::BTreeMap;

use crate::cell::Cell;
use crate::intentions::{
    DivisionIntention, EnergyExchangeIntention, GlobalCoord, IntentionBuffers, MoveIntention,
    PsychicExchangeIntention,
};
use crate::params::ParameterBlock;
use crate::worldmap::ChunkMap;

/// Deterministic genetic-drift offset applied to a daughter's `R` and
/// `Sc` on division: `h = 18397*x + 20441*y + 22543*z + 24671*age +
/// 34567*seed` in wrapping 32-bit arithmetic, then `h mod 3` selects
/// `+0.01` / `-0.01` / `0.0`. Purely a function of the daughter's
/// coordinates, the mother's age and the world's seed, so re-running
/// the same cycle on the same world always mutates the same way.
pub fn mutate_offset(x: i32, y: i32, z: i32, age: u32, seed: u32) -> f32 {
    let h = (18397u32)
        .wrapping_mul(x as u32)
        .wrapping_add((20441u32).wrapping_mul(y as u32))
        .wrapping_add((22543u32).wrapping_mul(z as u32))
        .wrapping_add((24671u32).wrapping_mul(age))
        .wrapping_add((34567u32).wrapping_mul(seed));
    match h % 3 {
        0 => 0.01,
        1 => -0.01,
        _ => 0.0,
    }
}

fn pick_winners<T: Copy>(
    items: Vec<T>,
    destination_of: impl Fn(&T) -> GlobalCoord,
    source_of: impl Fn(&T) -> GlobalCoord,
    priority_of: impl Fn(&T) -> f32,
) -> Vec<T> {
    let mut winners: BTreeMap<GlobalCoord, T> = BTreeMap::new();
    for item in items {
        let destination = destination_of(&item);
        match winners.get(&destination) {
            None => {
                winners.insert(destination, item);
            }
            Some(current) => {
                let better = priority_of(&item) > priority_of(current)
                    || (priority_of(&item) == priority_of(current)
                        && source_of(&item) < source_of(current));
                if better {
                    winners.insert(destination, item);
                }
            }
        }
    }
    winners.into_values().collect()
}

/// A move relocates a cell rather than growing the population, so it
/// is exempt from the resource guards in [`ChunkMap::note_alive_delta`]
/// (§14 only gates *growth*): the source-cleared/destination-written
/// pair nets to zero and is applied unconditionally via
/// [`ChunkMap::record_relocation`].
fn apply_moves(map: &mut ChunkMap, moves: Vec<MoveIntention>, params: &ParameterBlock) {
    let winners = pick_winners(
        moves,
        |m| m.destination,
        |m| m.source,
        |m| m.priority,
    );
    for mv in winners {
        let source_cell = map.read_cell(mv.source.x, mv.source.y, mv.source.z);
        if !source_cell.alive {
            continue;
        }
        if map.read_cell(mv.destination.x, mv.destination.y, mv.destination.z).alive {
            continue;
        }
        let mut moved = source_cell;
        moved.e -= params.cost_movement;
        *map.cell_mut(mv.source.x, mv.source.y, mv.source.z) = Cell::EMPTY;
        *map.cell_mut(mv.destination.x, mv.destination.y, mv.destination.z) = moved;
        map.record_relocation();
    }
}

/// A division grows the population by one, so it is subject to the
/// resource guards. Per §14, a guard breach here is recoverable and
/// local to this one division: it is logged and the proposal is simply
/// not applied, rather than aborting the whole resolution phase (that
/// fatal path is reserved for `initialize`/`load_binary`, which have no
/// sensible partial result). The guard is checked *before* any mutation
/// so a rejected division leaves the mother untouched.
fn apply_divisions(map: &mut ChunkMap, divisions: Vec<DivisionIntention>, params: &ParameterBlock, seed: u64) {
    let winners = pick_winners(
        divisions,
        |d| d.destination,
        |d| d.source,
        |d| d.priority,
    );
    for div in winners {
        let mother_cell = map.read_cell(div.source.x, div.source.y, div.source.z);
        if !mother_cell.alive || mother_cell.e <= params.seuil_energie_division {
            continue;
        }
        if map.read_cell(div.destination.x, div.destination.y, div.destination.z).alive {
            continue;
        }
        if let Err(err) = map.note_alive_delta(true) {
            log::warn!("division at {:?} -> {:?} dropped: {err}", div.source, div.destination);
            continue;
        }

        let half = ((mother_cell.e - params.cost_division) / 2.0).max(0.0);
        let mut mother = mother_cell;
        mother.e = half;
        *map.cell_mut(div.source.x, div.source.y, div.source.z) = mother;

        let drift = mutate_offset(
            div.destination.x,
            div.destination.y,
            div.destination.z,
            mother_cell.a,
            seed as u32,
        );
        let daughter = Cell {
            cell_type: mother_cell.cell_type,
            r: (mother_cell.r + drift).clamp(0.0, 1.0),
            sc: (mother_cell.sc + drift).clamp(0.0, 1.0),
            e: half,
            a: 0,
            alive: true,
            ..Cell::EMPTY
        };
        *map.cell_mut(div.destination.x, div.destination.y, div.destination.z) = daughter;
    }
}

fn apply_exchanges(map: &mut ChunkMap, mut exchanges: Vec<EnergyExchangeIntention>) {
    exchanges.sort_by_key(|e| (e.source, e.target));
    for exchange in exchanges {
        let source_alive = map.read_cell(exchange.source.x, exchange.source.y, exchange.source.z).alive;
        let target_alive = map.read_cell(exchange.target.x, exchange.target.y, exchange.target.z).alive;
        if !source_alive || !target_alive {
            continue;
        }
        map.cell_mut(exchange.source.x, exchange.source.y, exchange.source.z).e -= exchange.delta;
        map.cell_mut(exchange.target.x, exchange.target.y, exchange.target.z).e += exchange.delta;
    }
}

fn apply_psychic(map: &mut ChunkMap, mut psychic: Vec<PsychicExchangeIntention>) {
    psychic.sort_by_key(|p| (p.source, p.target));
    for exchange in psychic {
        let source = map.cell_mut(exchange.source.x, exchange.source.y, exchange.source.z);
        if !source.alive {
            continue;
        }
        source.c += exchange.delta_c;
        source.l -= exchange.delta_l;
    }
}

/// Resolve one phase's merged intentions against `map`, in the fixed
/// movement/division/exchange/psychic order. Never fails: a resource
/// guard breach during division is recoverable (logged, proposal
/// dropped) per §14, not propagated as a cycle-aborting error.
pub fn resolve(map: &mut ChunkMap, buffers: &IntentionBuffers, params: &ParameterBlock, seed: u64) {
    apply_moves(map, buffers.merged_moves(), params);
    apply_divisions(map, buffers.merged_divisions(), params, seed);
    apply_exchanges(map, buffers.merged_exchanges());
    apply_psychic(map, buffers.merged_psychic());
}
