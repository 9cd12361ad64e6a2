//! Error types for the binary save-file layer

use thiserror::Error;

/// Result type for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur while reading or writing a world save file
#[derive(Error, Debug)]
pub enum StorageError {
    /// Invalid magic number at the start of a save file
    #[error("invalid magic number: expected {expected:?}, found {found:?}")]
    InvalidMagic {
        /// Expected magic bytes
        expected: [u8; 4],
        /// Magic bytes actually read
        found: [u8; 4],
    },

    /// Unsupported on-disk format version
    #[error("unsupported save format version: {version}, supported: {supported}")]
    UnsupportedVersion {
        /// Version found in the file
        version: u32,
        /// Version this build supports
        supported: u32,
    },

    /// Checksum verification failed
    #[error("checksum mismatch: expected {expected:08x}, computed {computed:08x}")]
    ChecksumMismatch {
        /// Checksum recorded in the file
        expected: u32,
        /// Checksum computed over the bytes actually read
        computed: u32,
    },

    /// Header dimensions do not match what the caller expected
    #[error("header size mismatch: file describes {file_x}x{file_y}x{file_z}")]
    SizeMismatch {
        /// World size_x recorded in the header
        file_x: i64,
        /// World size_y recorded in the header
        file_y: i64,
        /// World size_z recorded in the header
        file_z: i64,
    },

    /// Malformed binary layout that is not any of the above
    #[error("invalid save format: {reason}")]
    InvalidFormat {
        /// Human-readable reason
        reason: String,
    },

    /// I/O error while reading or writing the file
    #[error("I/O error: {source}")]
    Io {
        #[from]
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl StorageError {
    /// Build an [`StorageError::InvalidFormat`]
    pub fn invalid_format(reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_format_builder() {
        let err = StorageError::invalid_format("truncated chunk table");
        assert!(matches!(err, StorageError::InvalidFormat { .. }));
    }

    #[test]
    fn display_contains_hex_checksums() {
        let err = StorageError::ChecksumMismatch {
            expected: 0xdead_beef,
            computed: 0x0000_0001,
        };
        let msg = format!("{err}");
        assert!(msg.contains("deadbeef"));
    }
}
