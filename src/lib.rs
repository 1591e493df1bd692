//! Cardano Seed Phrase Recovery
//!
//! Recovers a BIP-39 mnemonic when the user's recollection is imperfect:
//! words missing at known or unknown positions, typos within a bounded edit
//! distance, or a phrase mis-copied by swapping rows and columns of its
//! written layout. Candidates are enumerated, checksum-filtered, derived to
//! Cardano shelley-era stake addresses, and matched against user-supplied
//! targets or a chain-activity oracle.

pub mod config;
pub mod derivation;
pub mod entropy;
pub mod error;
pub mod generator;
pub mod matcher;
pub mod monitor;
pub mod oracle;
pub mod search;
pub mod wordlist;

pub use config::RecoveryConfig;
pub use derivation::{StakeDeriver, XPrv};
pub use error::*;
pub use generator::{CandidateGenerator, Slot};
pub use matcher::{MatchReason, TargetSet};
pub use oracle::{Activity, BlockfrostClient, ChainOracle};
pub use search::{SearchDriver, SearchMatch, SearchOutcome};
pub use wordlist::Wordlist;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::RecoveryConfig;
    pub use crate::derivation::{StakeDeriver, XPrv};
    pub use crate::error::*;
    pub use crate::generator::{CandidateGenerator, Slot};
    pub use crate::matcher::{MatchReason, TargetSet};
    pub use crate::oracle::{Activity, BlockfrostClient, ChainOracle};
    pub use crate::search::{SearchDriver, SearchMatch, SearchOutcome};
    pub use crate::wordlist::Wordlist;
    pub use anyhow::{Context, Result};
}

#[cfg(test)]
mod tests;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Minimum supported phrase length
pub const MIN_PHRASE_LENGTH: usize = 12;

/// Maximum supported phrase length
pub const MAX_PHRASE_LENGTH: usize = 24;
