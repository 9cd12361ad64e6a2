//! Binary save-file schema for the voxcell lattice engine.
//!
//! This crate owns the on-disk layout only: magic numbers, the fixed
//! header, checksums, and chunk-record framing. It has no knowledge of
//! the cell record's own field layout — that lives in `voxcell-runtime`,
//! which encodes a chunk's cells to bytes and hands them to
//! [`format::encode_chunk_record`].

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod format;
pub mod ids;

pub use error::{Result, StorageError};
pub use format::{WorldHeader, FORMAT_VERSION, HEADER_LEN, WORLD_MAGIC};
pub use ids::{ChunkCoord, LocalCoord};

/// Version of this crate's public API, independent of [`format::FORMAT_VERSION`].
pub const STORAGE_VERSION: u32 = 1;
