//! BIP-39 entropy and checksum handling
//!
//! A phrase of length `L` encodes `L * 11` bits big-endian: `ENT = L * 32 / 3`
//! entropy bits followed by `CS = ENT / 32` checksum bits taken from the
//! leading bits of `SHA-256(entropy)`.

use crate::error::{DerivationError, GeneratorError, Result};
use sha2::{Digest, Sha256};

/// Legal phrase lengths
pub const LEGAL_LENGTHS: [usize; 5] = [12, 15, 18, 21, 24];

/// Check if a phrase length is legal
pub fn is_legal_length(length: usize) -> bool {
    LEGAL_LENGTHS.contains(&length)
}

/// Entropy bits for a legal phrase length
pub fn entropy_bits(length: usize) -> usize {
    length * 32 / 3
}

/// Checksum bits for a legal phrase length
pub fn checksum_bits(length: usize) -> usize {
    entropy_bits(length) / 32
}

/// Pack 11-bit word indices into a big-endian byte stream
///
/// The final byte is zero-padded on the right. Also used as the compact
/// dedup key for candidate phrases.
pub fn pack_indices(indices: &[u16]) -> Vec<u8> {
    let total_bits = indices.len() * 11;
    let mut bytes = Vec::with_capacity(total_bits.div_ceil(8));
    let mut acc: u32 = 0;
    let mut nbits = 0;
    for &index in indices {
        acc = (acc << 11) | u32::from(index);
        nbits += 11;
        while nbits >= 8 {
            nbits -= 8;
            bytes.push((acc >> nbits) as u8);
        }
    }
    if nbits > 0 {
        bytes.push((acc << (8 - nbits)) as u8);
    }
    bytes
}

/// Validate the BIP-39 checksum of a phrase given as word indices
///
/// Returns `Ok(false)` for a well-formed phrase with a wrong checksum and an
/// error for an illegal length.
pub fn is_valid(indices: &[u16]) -> Result<bool> {
    let length = indices.len();
    if !is_legal_length(length) {
        return Err(GeneratorError::InvalidLength(length).into());
    }
    let ent_bytes = entropy_bits(length) / 8;
    let cs = checksum_bits(length);
    let packed = pack_indices(indices);
    let actual = packed[ent_bytes] >> (8 - cs);
    let expected = Sha256::digest(&packed[..ent_bytes])[0] >> (8 - cs);
    Ok(actual == expected)
}

/// Extract the entropy bytes of a checksum-valid phrase
pub fn entropy_of(indices: &[u16]) -> Result<Vec<u8>> {
    if !is_valid(indices)? {
        return Err(DerivationError::ChecksumMismatch.into());
    }
    let ent_bytes = entropy_bits(indices.len()) / 8;
    let mut packed = pack_indices(indices);
    packed.truncate(ent_bytes);
    Ok(packed)
}

/// Build the word indices of the phrase encoding the given entropy
pub fn mnemonic_of(entropy: &[u8]) -> Result<Vec<u16>> {
    let ent = entropy.len() * 8;
    let length = match ent {
        128 | 160 | 192 | 224 | 256 => ent * 3 / 32,
        _ => return Err(DerivationError::BadEntropyLength(entropy.len()).into()),
    };
    let cs = checksum_bits(length);
    let checksum_byte = Sha256::digest(entropy)[0];

    let mut indices = Vec::with_capacity(length);
    let mut acc: u32 = 0;
    let mut nbits = 0;
    let stream = entropy.iter().copied().chain(std::iter::once(checksum_byte));
    for byte in stream {
        acc = (acc << 8) | u32::from(byte);
        nbits += 8;
        while nbits >= 11 && indices.len() < length {
            nbits -= 11;
            indices.push(((acc >> nbits) & 0x7ff) as u16);
        }
    }
    debug_assert_eq!(indices.len(), length);
    debug_assert_eq!(nbits, 8 - cs);
    Ok(indices)
}
