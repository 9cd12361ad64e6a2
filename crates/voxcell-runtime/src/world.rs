//! The top-level engine handle: owns the lattice, the tunable
//! constants, and the cycle counter, and drives one fixed-phase
//! advance per call to [`World::advance`].

use std::path::Path;

use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

use crate::audit::{self, AuditReport};
use crate::cell::{Cell, CellType};
use crate::chunk::Chunk;
use crate::error::{EngineError, Result};
use crate::finalization;
use crate::hash;
use crate::hebbian;
use crate::intentions::{GlobalCoord, IntentionBuffer, IntentionBuffers};
use crate::laws;
use crate::memory;
use crate::metabolism;
use crate::neural;
use crate::params::{EngineConfig, ParameterBlock};
use crate::replay::{self, ReplayAction};
use crate::resolution;
use crate::stats::{self, WorldStatistics};
use crate::structural;
use crate::worldmap::ChunkMap;
use voxcell_storage::format;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

struct WorldState {
    map: ChunkMap,
    params: ParameterBlock,
    cycle: u64,
}

/// The engine's public handle. Interior-mutable behind a short-lived
/// [`parking_lot::Mutex`] so a host can cheaply [`World::copy_state_into`]
/// a render-side snapshot without blocking an in-progress
/// [`World::advance`] for longer than the clone itself takes.
pub struct World {
    state: parking_lot::Mutex<WorldState>,
    config: EngineConfig,
    size: (i32, i32, i32),
    seed: u64,
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
}

impl World {
    /// Construct an empty world of the given extent. Call
    /// [`World::initialize`] to populate it.
    ///
    /// `config.worker_threads`, when set, pins the intention phase to a
    /// private rayon pool of exactly that width instead of rayon's
    /// process-global pool, so a caller can exercise the
    /// same-hash-at-any-thread-count determinism guarantee (spec §8
    /// S1) without racing other code that also uses rayon's default
    /// pool.
    pub fn new(size_x: i32, size_y: i32, size_z: i32, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        #[cfg(feature = "parallel")]
        let pool = match config.worker_threads {
            Some(n) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| EngineError::invalid_parameter("worker_threads", n, e.to_string()))?,
            ),
            None => None,
        };
        Ok(Self {
            state: parking_lot::Mutex::new(WorldState {
                map: ChunkMap::with_guards(config.max_cells, config.max_ram_mb, config.limit_safety_override),
                params: ParameterBlock::default(),
                cycle: 0,
            }),
            config,
            size: (size_x, size_y, size_z),
            seed: 0,
            #[cfg(feature = "parallel")]
            pool,
        })
    }

    /// Lay a one-cell-thick bedrock floor at `y = 0` across the
    /// world's X/Z extent, then seed the remaining volume with `Stem`
    /// cells at the given `density` (`0.0..=1.0`), deterministically
    /// from `seed`.
    pub fn initialize(&mut self, seed: u64, density: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&density) {
            return Err(EngineError::invalid_parameter("density", density, "must be in [0, 1]"));
        }
        let mut state = self.state.lock();
        state.map = ChunkMap::with_guards(self.config.max_cells, self.config.max_ram_mb, self.config.limit_safety_override);
        state.cycle = 0;
        self.seed = seed;

        let (size_x, size_y, size_z) = self.size;
        let mut rng = StdRng::seed_from_u64(seed);

        for x in 0..size_x {
            for z in 0..size_z {
                *state.map.cell_mut(x, 0, z) = Cell::bedrock();
                state.map.note_alive_delta(true)?;
            }
        }

        for x in 0..size_x {
            for y in 1..size_y {
                for z in 0..size_z {
                    if rng.gen::<f32>() >= density {
                        continue;
                    }
                    let cell = Cell {
                        cell_type: CellType::Stem,
                        r: rng.gen::<f32>(),
                        sc: rng.gen::<f32>(),
                        e: 1.0 + rng.gen::<f32>(),
                        alive: true,
                        ..Cell::EMPTY
                    };
                    *state.map.cell_mut(x, y, z) = cell;
                    state.map.note_alive_delta(true)?;
                }
            }
        }
        Ok(())
    }

    /// Advance the world by one physical cycle: structural
    /// differentiation, the neural sub-scheduler, a frozen snapshot,
    /// the per-cell local updates and the four intention-emitting laws
    /// in parallel, deterministic serial resolution, finalization, and
    /// (if configured) the invariant audit pass.
    pub fn advance(&self) -> Result<()> {
        let mut state = self.state.lock();
        let barycentre = structural::compute_barycentre(&state.map);
        let params = state.params;

        state.map.for_each_chunk_ordered_mut(|chunk| {
            for lz in 0..16u8 {
                for ly in 0..16u8 {
                    for lx in 0..16u8 {
                        let idx = Chunk::local_index(lx, ly, lz);
                        let coord = GlobalCoord::new(
                            chunk.coord.cx * 16 + lx as i32,
                            chunk.coord.cy * 16 + ly as i32,
                            chunk.coord.cz * 16 + lz as i32,
                        );
                        structural::apply_structural_law(coord, chunk.cell_mut(idx), barycentre, &params);
                    }
                }
            }
        });

        neural::run(&mut state.map, &params);

        let snapshot = state.map.clone();
        #[cfg(feature = "parallel")]
        let buffers = match &self.pool {
            Some(pool) => pool.install(|| run_intention_phase(&mut state.map, &snapshot, &params)),
            None => run_intention_phase(&mut state.map, &snapshot, &params),
        };
        #[cfg(not(feature = "parallel"))]
        let buffers = run_intention_phase(&mut state.map, &snapshot, &params);
        resolution::resolve(&mut state.map, &buffers, &params, self.seed);

        state.map.for_each_chunk_ordered_mut(|chunk| {
            for cell in chunk.cells_mut() {
                finalization::apply(cell);
            }
            chunk.refresh_alive_flag();
        });
        state.map.resync_alive_count();

        if self.config.audit_invariants {
            let report = audit::run(&mut state.map);
            if report.total() > 0 {
                log::warn!("invariant audit quarantined {} cell(s): {report:?}", report.total());
            }
            state.map.resync_alive_count();
        }

        state.cycle += 1;
        Ok(())
    }

    /// Number of alive (non-bedrock) cells the engine is currently
    /// tracking — the cached count, not a fresh scan.
    pub fn cell_count_alive(&self) -> u64 {
        self.state.lock().map.alive_count()
    }

    /// Read a single cell by global coordinates. A coordinate in an
    /// unallocated chunk reads as the canonical empty cell. For
    /// inspecting many cells at once (a renderer's per-frame pull),
    /// prefer [`World::copy_state_into`] over repeated calls here, to
    /// avoid re-acquiring the lock per cell.
    pub fn read_cell(&self, x: i32, y: i32, z: i32) -> Cell {
        self.state.lock().map.read_cell(x, y, z)
    }

    /// Replace the whole tunable parameter block at once, e.g. when a
    /// host has already parsed a preset into memory. For a single
    /// `key=value` change from a replay action, use
    /// [`World::apply_action`] instead.
    pub fn set_parameters(&self, params: ParameterBlock) {
        self.state.lock().params = params;
    }

    /// Current tunable parameter block.
    pub fn parameters(&self) -> ParameterBlock {
        self.state.lock().params
    }

    /// Current physical cycle number.
    pub fn cycle(&self) -> u64 {
        self.state.lock().cycle
    }

    /// Deterministic digest of the whole world's current state.
    pub fn state_hash(&self) -> u64 {
        let state = self.state.lock();
        hash::state_hash(&state.map)
    }

    /// Aggregate world statistics, recomputed fresh.
    pub fn statistics(&self) -> WorldStatistics {
        stats::compute(&self.state.lock().map)
    }

    /// Clone this world's map, parameters and cycle into `other`,
    /// holding each world's lock only for the duration of the copy.
    pub fn copy_state_into(&self, other: &World) {
        let source = self.state.lock();
        let map = source.map.clone();
        let params = source.params;
        let cycle = source.cycle;
        drop(source);
        let mut dest = other.state.lock();
        dest.map = map;
        dest.params = params;
        dest.cycle = cycle;
    }

    /// Place a single cell at `(x, y, z)`, overwriting any existing
    /// occupant only if `overwrite` is set. Returns whether a cell was
    /// placed.
    pub fn place_cell(&self, x: i32, y: i32, z: i32, template: Cell, overwrite: bool) -> Result<bool> {
        let mut state = self.state.lock();
        let was_alive = state.map.read_cell(x, y, z).alive;
        if was_alive && !overwrite {
            return Ok(false);
        }
        *state.map.cell_mut(x, y, z) = template;
        if !was_alive && template.alive {
            state.map.note_alive_delta(true)?;
        } else if was_alive && !template.alive {
            state.map.note_alive_delta(false)?;
        }
        Ok(true)
    }

    /// Load and apply a `key=value` parameter text file.
    pub fn load_parameters_text(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut state = self.state.lock();
        state.params.load_text(path)
    }

    /// Apply one scripted [`ReplayAction`] immediately, regardless of
    /// its recorded `cycle`. Callers driving playback are responsible
    /// for calling this only when `action.cycle` matches [`World::cycle`].
    pub fn apply_action(&self, action: &ReplayAction) -> Result<()> {
        let mut state = self.state.lock();
        let WorldState { map, params, .. } = &mut *state;
        replay::apply_action(map, params, action)
    }

    /// Apply a batch of actions in order.
    pub fn apply_actions(&self, actions: &[ReplayAction]) -> Result<()> {
        for action in actions {
            self.apply_action(action)?;
        }
        Ok(())
    }

    /// Run the invariant audit pass immediately, regardless of
    /// [`EngineConfig::audit_invariants`], returning its report.
    pub fn run_audit(&self) -> AuditReport {
        let mut state = self.state.lock();
        audit::run(&mut state.map)
    }

    /// Serialize the whole world to a binary save file.
    pub fn save_binary(&self, path: impl AsRef<Path>) -> Result<()> {
        let state = self.state.lock();
        let param_bytes = state.params.encode();
        let header = format::WorldHeader {
            size_x: self.size.0,
            size_y: self.size.1,
            size_z: self.size.2,
            cycle: state.cycle,
            seed: self.seed,
            param_block_len: param_bytes.len() as u32,
        };

        let mut chunk_region = Vec::new();
        for (coord, chunk) in state.map.iter_chunks_ordered() {
            let mut cell_bytes = Vec::with_capacity(voxcell_storage::ChunkCoord::VOLUME * Cell::ENCODED_LEN);
            for cell in chunk.cells() {
                cell.encode(&mut cell_bytes);
            }
            format::encode_chunk_record(&mut chunk_region, coord.cx, coord.cy, coord.cz, &cell_bytes);
        }
        let checksum = format::calculate_checksum(&chunk_region);

        let mut out = header.encode();
        out.extend_from_slice(&param_bytes);
        out.extend_from_slice(&chunk_region);
        out.extend_from_slice(&checksum.to_le_bytes());
        std::fs::write(path, out)?;
        Ok(())
    }

    /// Load a world previously written by [`World::save_binary`],
    /// replacing this world's size, parameters, map and cycle in place.
    pub fn load_binary(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = std::fs::read(path)?;
        let header = format::WorldHeader::decode(&bytes)?;

        let param_start = format::HEADER_LEN;
        let param_end = param_start + header.param_block_len as usize;
        let param_bytes = bytes.get(param_start..param_end).ok_or_else(|| {
            EngineError::invalid_parameter_file("file truncated before end of parameter block")
        })?;
        let params = ParameterBlock::decode(param_bytes)
            .ok_or_else(|| EngineError::invalid_parameter_file("malformed parameter block"))?;

        if bytes.len() < param_end + 4 {
            return Err(EngineError::invalid_parameter_file("file truncated before trailing checksum"));
        }
        let checksum_start = bytes.len() - 4;
        let chunk_region = &bytes[param_end..checksum_start];
        let checksum = u32::from_le_bytes(bytes[checksum_start..].try_into().unwrap());
        format::validate_checksum(chunk_region, checksum)?;

        let mut map = ChunkMap::with_guards(self.config.max_cells, self.config.max_ram_mb, self.config.limit_safety_override);
        let cell_block_len = voxcell_storage::ChunkCoord::VOLUME * Cell::ENCODED_LEN;
        let mut cursor = 0usize;
        while cursor < chunk_region.len() {
            let (cx, cy, cz) = format::decode_chunk_coords(&chunk_region[cursor..])?;
            cursor += 12;
            let cell_bytes = chunk_region.get(cursor..cursor + cell_block_len).ok_or_else(|| {
                EngineError::invalid_parameter_file("truncated chunk cell payload")
            })?;
            cursor += cell_block_len;

            let chunk = map.get_or_create_chunk(voxcell_storage::ChunkCoord::new(cx, cy, cz));
            for (idx, cell_slice) in cell_bytes.chunks_exact(Cell::ENCODED_LEN).enumerate() {
                let cell = Cell::decode(cell_slice)
                    .ok_or_else(|| EngineError::invalid_parameter_file("malformed cell record"))?;
                *chunk.cell_mut(idx) = cell;
            }
            chunk.refresh_alive_flag();
        }
        map.resync_alive_count();

        self.size = (header.size_x, header.size_y, header.size_z);
        self.seed = header.seed;
        let mut state = self.state.lock();
        state.map = map;
        state.params = params;
        state.cycle = header.cycle;
        Ok(())
    }
}

fn run_intention_phase(map: &mut ChunkMap, snapshot: &ChunkMap, params: &ParameterBlock) -> IntentionBuffers {
    let mut chunks: Vec<&mut Chunk> = map.chunks_mut().collect();
    chunks.sort_unstable_by_key(|c| c.coord);

    #[cfg(feature = "parallel")]
    let workers: Vec<IntentionBuffer> = chunks
        .into_par_iter()
        .map(|chunk| process_chunk(chunk, snapshot, params))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let workers: Vec<IntentionBuffer> = chunks
        .into_iter()
        .map(|chunk| process_chunk(chunk, snapshot, params))
        .collect();

    IntentionBuffers { workers }
}

fn process_chunk(chunk: &mut Chunk, snapshot: &ChunkMap, params: &ParameterBlock) -> IntentionBuffer {
    let mut buffer = IntentionBuffer::default();
    for lz in 0..16u8 {
        for ly in 0..16u8 {
            for lx in 0..16u8 {
                let idx = Chunk::local_index(lx, ly, lz);
                let coord = GlobalCoord::new(
                    chunk.coord.cx * 16 + lx as i32,
                    chunk.coord.cy * 16 + ly as i32,
                    chunk.coord.cz * 16 + lz as i32,
                );
                let cell = chunk.cell_mut(idx);
                if !cell.alive {
                    continue;
                }
                if cell.cell_type != CellType::Bedrock {
                    hebbian::apply(coord, cell, snapshot, params);
                    memory::apply(coord, cell, snapshot, params);
                    metabolism::apply(coord.y, cell, params);

                    laws::propose_movement(coord, cell, snapshot, params, &mut buffer);
                    laws::propose_division(coord, cell, snapshot, params, &mut buffer);
                    laws::propose_psychic(coord, cell, snapshot, &mut buffer);
                }
                // Energy osmosis (§4.10) considers every alive cell as a
                // possible source, bedrock included, unlike the
                // non-bedrock-gated laws above.
                laws::propose_exchanges(coord, snapshot, params, &mut buffer);
            }
        }
    }
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_lays_a_bedrock_floor_and_seeds_stem_cells() {
        let mut world = World::new(4, 4, 4, EngineConfig::default()).unwrap();
        world.initialize(1, 1.0).unwrap();
        assert_eq!(world.state.lock().map.read_cell(0, 0, 0).cell_type, CellType::Bedrock);
        assert_eq!(world.state.lock().map.read_cell(1, 1, 1).cell_type, CellType::Stem);
    }

    #[test]
    fn advance_is_deterministic_given_the_same_seed() {
        let mut a = World::new(3, 3, 3, EngineConfig::default()).unwrap();
        a.initialize(7, 0.5).unwrap();
        let mut b = World::new(3, 3, 3, EngineConfig::default()).unwrap();
        b.initialize(7, 0.5).unwrap();

        for _ in 0..3 {
            a.advance().unwrap();
            b.advance().unwrap();
        }
        assert_eq!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn advance_runs_without_panicking_on_an_empty_world() {
        let mut world = World::new(2, 2, 2, EngineConfig::default()).unwrap();
        world.initialize(0, 0.0).unwrap();
        world.advance().unwrap();
        assert_eq!(world.cycle(), 1);
    }

    #[test]
    fn copy_state_into_clones_map_and_cycle() {
        let mut source = World::new(2, 2, 2, EngineConfig::default()).unwrap();
        source.initialize(3, 1.0).unwrap();
        source.advance().unwrap();

        let dest = World::new(2, 2, 2, EngineConfig::default()).unwrap();
        source.copy_state_into(&dest);
        assert_eq!(dest.cycle(), source.cycle());
        assert_eq!(dest.cell_count_alive(), source.cell_count_alive());
    }

    #[test]
    fn place_cell_refuses_overwrite_unless_requested() {
        let world = World::new(2, 2, 2, EngineConfig::default()).unwrap();
        let template = Cell { alive: true, cell_type: CellType::Soma, ..Cell::EMPTY };
        assert!(world.place_cell(0, 0, 0, template, false).unwrap());
        assert!(!world.place_cell(0, 0, 0, template, false).unwrap());
        assert!(world.place_cell(0, 0, 0, template, true).unwrap());
    }

    #[test]
    fn save_and_load_binary_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("world.vwld");

        let mut world = World::new(3, 3, 3, EngineConfig::default()).unwrap();
        world.initialize(11, 0.4).unwrap();
        world.advance().unwrap();
        world.save_binary(&path).unwrap();

        let mut loaded = World::new(1, 1, 1, EngineConfig::default()).unwrap();
        loaded.load_binary(&path).unwrap();
        assert_eq!(loaded.cycle(), world.cycle());
        assert_eq!(loaded.cell_count_alive(), world.cell_count_alive());
        assert_eq!(loaded.state_hash(), world.state_hash());
    }
}
