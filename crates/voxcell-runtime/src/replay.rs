//! The replay action contract: a scripted input the host can feed back
//! through [`crate::world::World::apply_action`] at a recorded cycle
//! number, for deterministic playback. Capturing/recording a replay
//! and any UI around it are out of scope here; only the action shape
//! and its effect on the world are.

use crate::cell::{Cell, CellType};
use crate::error::{EngineError, Result};
use crate::params::ParameterBlock;
use crate::worldmap::ChunkMap;

/// The kind of a single recorded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Change one [`ParameterBlock`] field by its recognised key
    ParamChangeFloat,
    /// Place or overwrite a single cell ("paint" a voxel)
    BrushAction,
    /// Clear every cell back to empty
    ResetWorld,
}

/// One scripted input, as it would be read back from a recorded
/// session. Interpretation of `target_key`/`val1..val4` depends on
/// `kind`:
///
/// - `ParamChangeFloat`: `target_key` is the parameter name, `val1` its new value.
/// - `BrushAction`: `target_key` is the cell type name (`"Stem"`, `"Soma"`, `"Neuron"`, `"Bedrock"`)
///   or the literal `"Delete"` to clear the targeted voxel back to empty;
///   `val1..val3` are the `x, y, z` coordinates (truncated to `i32`), `val4` is the initial energy
///   (ignored for `"Delete"`).
/// - `ResetWorld`: all fields besides `cycle` are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayAction {
    /// Physical cycle number this action is scheduled for
    pub cycle: u64,
    /// What kind of action this is
    pub kind: ActionKind,
    /// Parameter name or cell-type name, depending on `kind`
    pub target_key: String,
    /// First payload value
    pub val1: f32,
    /// Second payload value
    pub val2: f32,
    /// Third payload value
    pub val3: f32,
    /// Fourth payload value
    pub val4: f32,
}

fn cell_type_from_key(key: &str) -> Option<CellType> {
    match key {
        "Stem" => Some(CellType::Stem),
        "Soma" => Some(CellType::Soma),
        "Neuron" => Some(CellType::Neuron),
        "Bedrock" => Some(CellType::Bedrock),
        _ => None,
    }
}

/// Apply one action to `map`/`params` immediately. The caller is
/// responsible for invoking this only when the world's current cycle
/// matches `action.cycle`.
pub fn apply_action(map: &mut ChunkMap, params: &mut ParameterBlock, action: &ReplayAction) -> Result<()> {
    match action.kind {
        ActionKind::ParamChangeFloat => {
            if !params.set_by_key(&action.target_key, action.val1) {
                return Err(EngineError::invalid_parameter(
                    action.target_key.clone(),
                    action.val1,
                    "not a recognised parameter key",
                ));
            }
        }
        ActionKind::BrushAction => {
            let x = action.val1 as i32;
            let y = action.val2 as i32;
            let z = action.val3 as i32;
            let was_alive = map.read_cell(x, y, z).alive;
            if action.target_key == "Delete" {
                *map.cell_mut(x, y, z) = Cell::EMPTY;
                if was_alive {
                    map.note_alive_delta(false)?;
                }
                return Ok(());
            }
            let cell_type = cell_type_from_key(&action.target_key).ok_or_else(|| {
                EngineError::invalid_parameter(action.target_key.clone(), action.val1, "not a recognised cell type")
            })?;
            *map.cell_mut(x, y, z) = Cell {
                cell_type,
                alive: true,
                e: action.val4,
                ..Cell::EMPTY
            };
            if !was_alive {
                map.note_alive_delta(true)?;
            }
        }
        ActionKind::ResetWorld => {
            map.clear_cells();
        }
    }
    Ok(())
}
