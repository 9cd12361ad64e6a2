//! Deterministic, parallel cellular-automaton engine on an integer 3D
//! lattice.
//!
//! Each occupied voxel is an autonomous agent carrying physical
//! (energy, hunger, stress, boredom), morphogenetic (type), genetic
//! (resistance, tolerance), mnemonic (recent peak neighbor energy) and
//! neural (membrane potential, synaptic weights, refractory counter,
//! spike history) state. [`World::advance`] runs one cycle: structural
//! differentiation, the neural sub-scheduler, a frozen snapshot, the
//! four intention-producing laws in parallel, deterministic serial
//! resolution, and finalization.
//!
//! The crate is organized bottom-up: [`cell`] is the per-voxel record,
//! [`chunk`] and [`worldmap`] are the sparse spatial index built on top
//! of it, [`neighbors`] is the fixed 26-offset enumeration every law
//! and the neural sub-scheduler share, and [`world`] ties the whole
//! cycle together behind the public [`World`] handle.

#![warn(clippy::all)]

pub mod audit;
pub mod cell;
pub mod chunk;
pub mod error;
pub mod finalization;
pub mod hash;
pub mod hebbian;
pub mod intentions;
pub mod laws;
pub mod memory;
pub mod metabolism;
pub mod neighbors;
pub mod neural;
pub mod params;
pub mod replay;
pub mod resolution;
pub mod stats;
pub mod structural;
pub mod world;
pub mod worldmap;

pub use cell::{Cell, CellType};
pub use error::{EngineError, Result};
pub use params::{EngineConfig, ParameterBlock};
pub use replay::{ActionKind, ReplayAction};
pub use stats::WorldStatistics;
pub use world::World;
