//! Error types for the lattice engine

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while constructing, advancing or persisting a
/// [`crate::world::World`].
#[derive(Error, Debug)]
pub enum EngineError {
    /// A save/load operation failed at the binary format layer
    #[error("storage error: {source}")]
    Storage {
        #[from]
        /// Underlying storage error
        source: voxcell_storage::StorageError,
    },

    /// A constructor argument violated a documented invariant
    #[error("invalid parameter {parameter} = {value}: {constraint}")]
    InvalidParameter {
        /// Name of the offending parameter
        parameter: String,
        /// Value that was rejected
        value: String,
        /// Constraint that was violated
        constraint: String,
    },

    /// A resource guard in [`crate::params::EngineConfig`] was exceeded
    /// and `limit_safety_override` was not set, during an operation
    /// with no sensible partial result (initialization or load).
    #[error("resource limit exceeded: {resource} (limit {limit})")]
    ResourceLimit {
        /// Name of the exhausted resource (`"cells"` or `"ram_mb"`)
        resource: String,
        /// The configured limit
        limit: u64,
    },

    /// The save file header describes a world size incompatible with
    /// the caller's expectations
    #[error("save file size mismatch: {reason}")]
    SizeMismatch {
        /// Human-readable description of the mismatch
        reason: String,
    },

    /// A seed/config file could not be parsed at all (distinct from a
    /// single malformed line, which is recoverable and only logged)
    #[error("invalid parameter file: {reason}")]
    InvalidParameterFile {
        /// Human-readable reason
        reason: String,
    },

    /// I/O error while reading or writing a file
    #[error("I/O error: {source}")]
    Io {
        #[from]
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl EngineError {
    /// Build an [`EngineError::InvalidParameter`].
    pub fn invalid_parameter(
        parameter: impl Into<String>,
        value: impl std::fmt::Display,
        constraint: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.to_string(),
            constraint: constraint.into(),
        }
    }

    /// Build an [`EngineError::ResourceLimit`].
    pub fn resource_limit(resource: impl Into<String>, limit: u64) -> Self {
        Self::ResourceLimit {
            resource: resource.into(),
            limit,
        }
    }

    /// Build an [`EngineError::SizeMismatch`].
    pub fn size_mismatch(reason: impl Into<String>) -> Self {
        Self::SizeMismatch {
            reason: reason.into(),
        }
    }

    /// Build an [`EngineError::InvalidParameterFile`].
    pub fn invalid_parameter_file(reason: impl Into<String>) -> Self {
        Self::InvalidParameterFile {
            reason: reason.into(),
        }
    }
}
