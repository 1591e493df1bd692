//! Error types for the Cardano seed phrase recovery tool

use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum RecoveryError {
    #[error("Wordlist error: {0}")]
    Wordlist(#[from] WordlistError),

    #[error("Generator error: {0}")]
    Generator(#[from] GeneratorError),

    #[error("Derivation error: {0}")]
    Derivation(#[from] DerivationError),

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Wordlist loading and lookup errors
#[derive(Error, Debug)]
pub enum WordlistError {
    #[error("Bad wordlist '{path}': expected 2048 words, found {count}")]
    BadWordlist { path: String, count: usize },

    #[error("Bad wordlist '{path}': duplicate word '{word}'")]
    DuplicateWord { path: String, word: String },

    #[error("'{0}' is not in the wordlist")]
    NotInWordlist(String),
}

/// Candidate generation errors
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Invalid phrase length {0}: must be one of 12, 15, 18, 21, 24")]
    InvalidLength(usize),

    #[error("Length {length} cannot hold {known} known words with missing positions up to {max_position}")]
    LengthTooSmall {
        length: usize,
        known: usize,
        max_position: usize,
    },

    #[error("Missing position {0} is not a valid 1-indexed position")]
    BadMissingPosition(usize),
}

/// Key derivation errors
#[derive(Error, Debug)]
pub enum DerivationError {
    #[error("Phrase checksum mismatch")]
    ChecksumMismatch,

    #[error("Entropy must be 16, 20, 24, 28, or 32 bytes, got {0}")]
    BadEntropyLength(usize),

    #[error("PBKDF2 error: {0}")]
    Pbkdf2(String),

    #[error("HMAC error: {0}")]
    Hmac(String),

    #[error("Degenerate child key at index {0:#010x}")]
    Degenerate(u32),

    #[error("Bech32 encoding error: {0}")]
    Bech32(String),
}

/// Chain oracle errors
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Oracle rejected the API key (HTTP {0})")]
    Auth(u16),

    #[error("Transient oracle failure: {0}")]
    Transient(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, RecoveryError>;
