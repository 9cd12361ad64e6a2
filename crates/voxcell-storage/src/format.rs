//! Binary save-file schema: a fixed header followed by the parameter
//! block and a sequence of chunk records, closed off by a checksum over
//! the chunk payload. Mirrors the header/magic/version/checksum shape
//! used by the VEVT event-stream format this crate's layout is modeled
//! on, but with plain little-endian field packing instead of an
//! `unsafe` `repr(C)` cast: a save file is written once per call, not a
//! hot path, so there is nothing to gain from the unsafe cast here.

use crate::error::{Result, StorageError};
use crc32fast::Hasher;

/// Magic bytes identifying a voxcell world save file.
pub const WORLD_MAGIC: [u8; 4] = *b"VWLD";

/// Current on-disk format version this crate writes and reads.
pub const FORMAT_VERSION: u32 = 1;

/// Fixed-size portion of a save file, preceding the variable-length
/// parameter block and chunk records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldHeader {
    /// World extent along X, in cells
    pub size_x: i32,
    /// World extent along Y, in cells
    pub size_y: i32,
    /// World extent along Z, in cells
    pub size_z: i32,
    /// Cycle counter at the time of the save
    pub cycle: u64,
    /// RNG seed the world was initialized with
    pub seed: u64,
    /// Length, in bytes, of the parameter block that follows the header
    pub param_block_len: u32,
}

/// Byte length of the encoded fixed header (magic + version + 5 fields
/// + header checksum).
pub const HEADER_LEN: usize = 4 + 4 + 4 + 4 + 4 + 8 + 8 + 4 + 4;

impl WorldHeader {
    /// Encode the header, magic number, version and a checksum over the
    /// preceding bytes, as a fixed-length byte vector.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN);
        buf.extend_from_slice(&WORLD_MAGIC);
        buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        buf.extend_from_slice(&self.size_x.to_le_bytes());
        buf.extend_from_slice(&self.size_y.to_le_bytes());
        buf.extend_from_slice(&self.size_z.to_le_bytes());
        buf.extend_from_slice(&self.cycle.to_le_bytes());
        buf.extend_from_slice(&self.seed.to_le_bytes());
        buf.extend_from_slice(&self.param_block_len.to_le_bytes());
        let checksum = calculate_checksum(&buf);
        buf.extend_from_slice(&checksum.to_le_bytes());
        buf
    }

    /// Decode and validate a header from its encoded bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(StorageError::invalid_format(format!(
                "header truncated: got {} bytes, need {}",
                bytes.len(),
                HEADER_LEN
            )));
        }
        let mut found = [0u8; 4];
        found.copy_from_slice(&bytes[0..4]);
        if found != WORLD_MAGIC {
            return Err(StorageError::InvalidMagic {
                expected: WORLD_MAGIC,
                found,
            });
        }
        let version = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        if version != FORMAT_VERSION {
            return Err(StorageError::UnsupportedVersion {
                version,
                supported: FORMAT_VERSION,
            });
        }
        let size_x = i32::from_le_bytes(bytes[8..12].try_into().unwrap());
        let size_y = i32::from_le_bytes(bytes[12..16].try_into().unwrap());
        let size_z = i32::from_le_bytes(bytes[16..20].try_into().unwrap());
        let cycle = u64::from_le_bytes(bytes[20..28].try_into().unwrap());
        let seed = u64::from_le_bytes(bytes[28..36].try_into().unwrap());
        let param_block_len = u32::from_le_bytes(bytes[36..40].try_into().unwrap());
        let expected_checksum = u32::from_le_bytes(bytes[40..44].try_into().unwrap());
        let computed_checksum = calculate_checksum(&bytes[0..40]);
        if expected_checksum != computed_checksum {
            return Err(StorageError::ChecksumMismatch {
                expected: expected_checksum,
                computed: computed_checksum,
            });
        }
        Ok(Self {
            size_x,
            size_y,
            size_z,
            cycle,
            seed,
            param_block_len,
        })
    }
}

/// Compute the CRC32 checksum of a byte slice.
pub fn calculate_checksum(bytes: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize()
}

/// Verify `bytes` against an `expected` CRC32 checksum.
pub fn validate_checksum(bytes: &[u8], expected: u32) -> Result<()> {
    let computed = calculate_checksum(bytes);
    if computed != expected {
        return Err(StorageError::ChecksumMismatch { expected, computed });
    }
    Ok(())
}

/// Encode one chunk's coordinates and raw cell bytes as a record:
/// `(cx, cy, cz, cell_bytes)`.
pub fn encode_chunk_record(out: &mut Vec<u8>, cx: i32, cy: i32, cz: i32, cell_bytes: &[u8]) {
    out.extend_from_slice(&cx.to_le_bytes());
    out.extend_from_slice(&cy.to_le_bytes());
    out.extend_from_slice(&cz.to_le_bytes());
    out.extend_from_slice(cell_bytes);
}

/// Decode one chunk record's coordinates, returning the offset of its
/// cell payload within `bytes`.
pub fn decode_chunk_coords(bytes: &[u8]) -> Result<(i32, i32, i32)> {
    if bytes.len() < 12 {
        return Err(StorageError::invalid_format("truncated chunk record header"));
    }
    let cx = i32::from_le_bytes(bytes[0..4].try_into().unwrap());
    let cy = i32::from_le_bytes(bytes[4..8].try_into().unwrap());
    let cz = i32::from_le_bytes(bytes[8..12].try_into().unwrap());
    Ok((cx, cy, cz))
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any header, for any field combination, survives an
        /// encode/decode round trip unchanged.
        #[test]
        fn header_round_trips_for_arbitrary_fields(
            size_x in any::<i32>(), size_y in any::<i32>(), size_z in any::<i32>(),
            cycle in any::<u64>(), seed in any::<u64>(), param_block_len in any::<u32>(),
        ) {
            let header = WorldHeader { size_x, size_y, size_z, cycle, seed, param_block_len };
            let encoded = header.encode();
            prop_assert_eq!(WorldHeader::decode(&encoded).unwrap(), header);
        }

        /// A single bit flip anywhere in an encoded header is always
        /// caught by the checksum (never silently accepted).
        #[test]
        fn single_bit_flip_is_always_detected(
            cycle in any::<u64>(), bit in 0u32..((HEADER_LEN as u32) * 8),
        ) {
            let header = WorldHeader { size_x: 1, size_y: 2, size_z: 3, cycle, seed: 7, param_block_len: 0 };
            let mut encoded = header.encode();
            let byte = (bit / 8) as usize;
            encoded[byte] ^= 1 << (bit % 8);
            prop_assert!(WorldHeader::decode(&encoded).is_err());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let header = WorldHeader {
            size_x: 8,
            size_y: 8,
            size_z: 8,
            cycle: 42,
            seed: 99,
            param_block_len: 128,
        };
        let encoded = header.encode();
        assert_eq!(encoded.len(), HEADER_LEN);
        let decoded = WorldHeader::decode(&encoded).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn bad_magic_is_rejected() {
        let mut encoded = WorldHeader {
            size_x: 1,
            size_y: 1,
            size_z: 1,
            cycle: 0,
            seed: 0,
            param_block_len: 0,
        }
        .encode();
        encoded[0] = b'X';
        let err = WorldHeader::decode(&encoded).unwrap_err();
        assert!(matches!(err, StorageError::InvalidMagic { .. }));
    }

    #[test]
    fn corrupted_header_fails_checksum() {
        let mut encoded = WorldHeader {
            size_x: 4,
            size_y: 4,
            size_z: 4,
            cycle: 7,
            seed: 0,
            param_block_len: 0,
        }
        .encode();
        let last = encoded.len() - 1;
        encoded[last] ^= 0xff;
        let err = WorldHeader::decode(&encoded).unwrap_err();
        assert!(matches!(err, StorageError::ChecksumMismatch { .. }));
    }

    #[test]
    fn chunk_record_coords_decode() {
        let mut buf = Vec::new();
        encode_chunk_record(&mut buf, -3, 2, 9, &[0u8; 4]);
        let (cx, cy, cz) = decode_chunk_coords(&buf).unwrap();
        assert_eq!((cx, cy, cz), (-3, 2, 9));
    }
}
