//! Run configuration assembled from the command line

use crate::entropy::is_legal_length;
use crate::error::{GeneratorError, RecoveryError, Result};
use std::path::PathBuf;

/// Everything one recovery run needs, validated before the search starts
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// Known seed words in written order; `?` marks an unknown slot
    pub tokens: Vec<String>,

    /// Wordlist file to use instead of the builtin English list
    pub wordlist_path: Option<PathBuf>,

    /// Edit-distance bound for expanding each token
    pub similar: usize,

    /// Try row/column reorderings of the written phrase
    pub reorder: bool,

    /// Fixed phrase length; inferred when absent
    pub length: Option<usize>,

    /// 1-indexed positions of missing words
    pub missing_positions: Vec<usize>,

    /// Target stake addresses, exact or `prefix...suffix`
    pub targets: Vec<String>,

    /// Blockfrost API key; enables the chain-activity oracle
    pub blockfrost_key: Option<String>,

    /// BIP-39 passphrase for the derivation
    pub passphrase: String,

    /// Worker threads
    pub threads: usize,
}

impl RecoveryConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(length) = self.length {
            if !is_legal_length(length) {
                return Err(GeneratorError::InvalidLength(length).into());
            }
        }
        for &position in &self.missing_positions {
            if position == 0 {
                return Err(GeneratorError::BadMissingPosition(position).into());
            }
        }
        if self.threads == 0 {
            return Err(RecoveryError::InvalidInput(
                "thread count must be positive".to_string(),
            ));
        }
        if self.targets.iter().any(|t| t.trim().is_empty()) {
            return Err(RecoveryError::InvalidInput(
                "empty target address".to_string(),
            ));
        }
        Ok(())
    }
}
