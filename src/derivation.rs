//! Cardano stake key derivation
//!
//! Implements the CIP-3 Icarus master key generation and BIP32-Ed25519 (V2)
//! child derivation needed to turn a candidate phrase into a mainnet stake
//! address. Everything here is pure and `Send + Sync`; this is the hot inner
//! loop of the search.

use crate::entropy;
use crate::error::{DerivationError, Result};
use bech32::{ToBase32, Variant};
use blake2::digest::consts::U28;
use blake2::Blake2b;
use curve25519_dalek::edwards::EdwardsPoint;
use curve25519_dalek::scalar::Scalar;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha512};

/// Hardened derivation index flag
pub const HARDENED: u32 = 0x8000_0000;

/// Shelley stake key path `m / 1852' / 1815' / 0' / 2 / 0`
pub const STAKE_PATH: [u32; 5] = [HARDENED | 1852, HARDENED | 1815, HARDENED, 2, 0];

/// PBKDF2 iteration count for the Icarus master key
const ICARUS_PBKDF2_ROUNDS: u32 = 4096;

/// Header byte of a mainnet reward (stake) address with a key hash payload
const STAKE_HEADER_MAINNET: u8 = 0xe1;

/// Human-readable part of a mainnet stake address
const STAKE_HRP: &str = "stake";

/// BIP32-Ed25519 extended private key: 64-byte key plus 32-byte chain code
#[derive(Clone)]
pub struct XPrv {
    key: [u8; 64],
    chain_code: [u8; 32],
}

impl XPrv {
    /// Derive the Icarus master key from BIP-39 entropy (CIP-3)
    ///
    /// PBKDF2-HMAC-SHA512 keyed by the passphrase over the entropy, 4096
    /// rounds, 96-byte output, then the extended-key bit masking.
    pub fn from_entropy(entropy: &[u8], passphrase: &str) -> Result<Self> {
        let mut out = [0u8; 96];
        pbkdf2::pbkdf2::<Hmac<Sha512>>(
            passphrase.as_bytes(),
            entropy,
            ICARUS_PBKDF2_ROUNDS,
            &mut out,
        )
        .map_err(|e| DerivationError::Pbkdf2(e.to_string()))?;

        let mut key = [0u8; 64];
        key.copy_from_slice(&out[..64]);
        key[0] &= 0b1111_1000;
        key[31] &= 0b0001_1111;
        key[31] |= 0b0100_0000;

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&out[64..]);

        Ok(Self { key, chain_code })
    }

    /// Derive one child key (hardened iff the index has the high bit set)
    pub fn derive_child(&self, index: u32) -> Result<Self> {
        let index_bytes = index.to_le_bytes();
        let (z, chain_code) = if index >= HARDENED {
            let z = self.tagged_hmac(0x00, &self.key, &index_bytes)?;
            let cc = self.tagged_hmac(0x01, &self.key, &index_bytes)?;
            (z, cc)
        } else {
            let public = self.public_key();
            let z = self.tagged_hmac(0x02, &public, &index_bytes)?;
            let cc = self.tagged_hmac(0x03, &public, &index_bytes)?;
            (z, cc)
        };

        let mut key = [0u8; 64];
        let (left, overflow) = add_28_mul8(&self.key[..32], &z[..32]);
        if overflow {
            return Err(DerivationError::Degenerate(index).into());
        }
        key[..32].copy_from_slice(&left);
        key[32..].copy_from_slice(&add_256(&self.key[32..], &z[32..64]));

        let mut child_chain_code = [0u8; 32];
        child_chain_code.copy_from_slice(&chain_code[32..]);

        Ok(Self {
            key,
            chain_code: child_chain_code,
        })
    }

    /// Derive along a full path
    pub fn derive_path(&self, path: &[u32]) -> Result<Self> {
        let mut node = self.clone();
        for &index in path {
            node = node.derive_child(index)?;
        }
        Ok(node)
    }

    /// Compressed Ed25519 public key `kL * B`
    pub fn public_key(&self) -> [u8; 32] {
        let mut kl = [0u8; 32];
        kl.copy_from_slice(&self.key[..32]);
        let scalar = Scalar::from_bytes_mod_order(kl);
        EdwardsPoint::mul_base(&scalar).compress().to_bytes()
    }

    /// Extended key and chain code as one 96-byte block
    pub fn to_bytes(&self) -> [u8; 96] {
        let mut out = [0u8; 96];
        out[..64].copy_from_slice(&self.key);
        out[64..].copy_from_slice(&self.chain_code);
        out
    }

    fn tagged_hmac(&self, tag: u8, data: &[u8], index: &[u8; 4]) -> Result<[u8; 64]> {
        let mut mac = Hmac::<Sha512>::new_from_slice(&self.chain_code)
            .map_err(|e| DerivationError::Hmac(e.to_string()))?;
        mac.update(&[tag]);
        mac.update(data);
        mac.update(index);
        let mut out = [0u8; 64];
        out.copy_from_slice(&mac.finalize().into_bytes());
        Ok(out)
    }
}

impl std::fmt::Debug for XPrv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // key material stays out of debug output
        f.debug_struct("XPrv").finish_non_exhaustive()
    }
}

/// `kL + 8 * Z[..28]` over little-endian 256-bit integers
///
/// Only the first 28 bytes of `z` contribute, per BIP32-Ed25519. The carry
/// out of the top byte signals a degenerate child key.
fn add_28_mul8(kl: &[u8], z: &[u8]) -> ([u8; 32], bool) {
    let mut out = [0u8; 32];
    let mut carry: u16 = 0;
    for i in 0..28 {
        let r = u16::from(kl[i]) + (u16::from(z[i]) << 3) + carry;
        out[i] = r as u8;
        carry = r >> 8;
    }
    for i in 28..32 {
        let r = u16::from(kl[i]) + carry;
        out[i] = r as u8;
        carry = r >> 8;
    }
    (out, carry != 0)
}

/// `kR + Z[32..]` over little-endian 256-bit integers, truncating mod 2^256
fn add_256(kr: &[u8], z: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut carry: u16 = 0;
    for i in 0..32 {
        let r = u16::from(kr[i]) + u16::from(z[i]) + carry;
        out[i] = r as u8;
        carry = r >> 8;
    }
    out
}

fn blake2b_224(data: &[u8]) -> [u8; 28] {
    let mut hasher = Blake2b::<U28>::new();
    blake2::Digest::update(&mut hasher, data);
    let mut out = [0u8; 28];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Bech32-encode the mainnet reward address of a stake verification key
pub fn encode_stake_address(public_key: &[u8; 32]) -> Result<String> {
    let mut payload = Vec::with_capacity(29);
    payload.push(STAKE_HEADER_MAINNET);
    payload.extend_from_slice(&blake2b_224(public_key));
    bech32::encode(STAKE_HRP, payload.to_base32(), Variant::Bech32)
        .map_err(|e| DerivationError::Bech32(e.to_string()).into())
}

/// Derives stake addresses from candidate phrases
///
/// Carries the BIP-39 passphrase so the per-candidate call only takes the
/// word indices.
#[derive(Debug, Clone)]
pub struct StakeDeriver {
    passphrase: String,
}

impl StakeDeriver {
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self {
            passphrase: passphrase.into(),
        }
    }

    /// Mainnet stake address of a checksum-valid phrase
    pub fn stake_address(&self, indices: &[u16]) -> Result<String> {
        let entropy = entropy::entropy_of(indices)?;
        self.stake_address_of_entropy(&entropy)
    }

    /// Mainnet stake address of raw BIP-39 entropy
    pub fn stake_address_of_entropy(&self, entropy: &[u8]) -> Result<String> {
        let root = XPrv::from_entropy(entropy, &self.passphrase)?;
        let stake = root.derive_path(&STAKE_PATH)?;
        encode_stake_address(&stake.public_key())
    }
}

impl Default for StakeDeriver {
    fn default() -> Self {
        Self::new("")
    }
}
