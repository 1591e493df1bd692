//! Search driver
//!
//! Wires the candidate generator through checksum filtering, stake address
//! derivation, and match classification. Raw tuples are pulled in bounded
//! batches; each batch is evaluated by rayon workers over shared immutable
//! inputs; oracle queries run on the driver thread against the (small) list
//! of surviving candidates, which keeps the remote rate limit respected.

use crate::derivation::StakeDeriver;
use crate::entropy;
use crate::error::{DerivationError, RecoveryError, Result};
use crate::generator::{passes_repetition_rule, CandidateGenerator, DedupSet};
use crate::matcher::{MatchReason, TargetSet};
use crate::monitor::{CounterSnapshot, ProgressReporter, SearchCounters};
use crate::oracle::{Activity, ChainOracle};
use crate::wordlist::Wordlist;
use log::{info, warn};
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Default number of raw tuples pulled per batch
pub const DEFAULT_BATCH_SIZE: usize = 8192;

/// One reported match
#[derive(Debug, Clone)]
pub struct SearchMatch {
    pub address: String,
    pub indices: Vec<u16>,
    pub reason: MatchReason,
}

/// Final result of a search run
#[derive(Debug)]
pub struct SearchOutcome {
    pub matches: Vec<SearchMatch>,
    pub counters: CounterSnapshot,
    pub cancelled: bool,
}

/// A candidate that survived all generator filters
struct Survivor {
    indices: Vec<u16>,
    address: String,
}

/// Drives the full recovery pipeline
pub struct SearchDriver {
    wordlist: Arc<Wordlist>,
    generator: CandidateGenerator,
    deriver: StakeDeriver,
    targets: TargetSet,
    oracle: Option<Box<dyn ChainOracle>>,
    threads: usize,
    batch_size: usize,
    progress_bar: bool,
    counters: Arc<SearchCounters>,
    cancel: Arc<AtomicBool>,
}

impl SearchDriver {
    pub fn new(
        wordlist: Arc<Wordlist>,
        generator: CandidateGenerator,
        deriver: StakeDeriver,
        targets: TargetSet,
        oracle: Option<Box<dyn ChainOracle>>,
    ) -> Self {
        Self {
            wordlist,
            generator,
            deriver,
            targets,
            oracle,
            threads: 1,
            batch_size: DEFAULT_BATCH_SIZE,
            progress_bar: false,
            counters: Arc::new(SearchCounters::new()),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_progress_bar(mut self, progress_bar: bool) -> Self {
        self.progress_bar = progress_bar;
        self
    }

    /// Flag observed between candidates; set it to stop the search
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Shared search counters
    pub fn counters(&self) -> Arc<SearchCounters> {
        Arc::clone(&self.counters)
    }

    /// Run the search to completion, cancellation, or early stop
    pub fn run(mut self) -> Result<SearchOutcome> {
        let pool = if self.threads > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(self.threads)
                    .build()
                    .map_err(|e| RecoveryError::InvalidInput(e.to_string()))?,
            )
        } else {
            None
        };

        let dedup = DedupSet::new();
        let mut reporter = ProgressReporter::new(self.generator.search_space(), self.progress_bar);
        let mut matches: Vec<SearchMatch> = Vec::new();
        let mut matched_targets: HashSet<usize> = HashSet::new();
        let mut cancelled = false;

        loop {
            if self.cancel.load(Ordering::Relaxed) {
                cancelled = true;
                break;
            }
            let batch = self.generator.next_batch(self.batch_size);
            if batch.is_empty() {
                break;
            }

            let survivors = match &pool {
                Some(pool) => pool.install(|| {
                    batch
                        .into_par_iter()
                        .map(|tuple| self.evaluate(&dedup, tuple))
                        .collect::<Result<Vec<_>>>()
                })?,
                None => batch
                    .into_iter()
                    .map(|tuple| self.evaluate(&dedup, tuple))
                    .collect::<Result<Vec<_>>>()?,
            };

            for survivor in survivors.into_iter().flatten() {
                if let Some(found) = self.classify(survivor, &mut matched_targets)? {
                    self.report_match(&found);
                    matches.push(found);
                }
            }

            reporter.maybe_report(self.counters.snapshot());

            let all_targets_found = !self.targets.is_empty()
                && self.oracle.is_none()
                && matched_targets.len() == self.targets.len();
            if all_targets_found {
                info!("All searched stake addresses found.");
                break;
            }
        }

        let counters = self.counters.snapshot();
        reporter.finish(counters);
        Ok(SearchOutcome {
            matches,
            counters,
            cancelled,
        })
    }

    /// Checksum, repetition, and dedup filters plus derivation, worker-side
    fn evaluate(&self, dedup: &DedupSet, tuple: Vec<u16>) -> Result<Option<Survivor>> {
        self.counters.record_checked();
        if self.cancel.load(Ordering::Relaxed) {
            return Ok(None);
        }
        if !entropy::is_valid(&tuple)? {
            return Ok(None);
        }
        self.counters.record_checksum();
        if !passes_repetition_rule(&tuple) {
            return Ok(None);
        }
        self.counters.record_repetition_free();
        if !dedup.insert(&tuple) {
            return Ok(None);
        }
        match self.deriver.stake_address(&tuple) {
            Ok(address) => Ok(Some(Survivor {
                indices: tuple,
                address,
            })),
            Err(RecoveryError::Derivation(DerivationError::Degenerate(index))) => {
                warn!(
                    "Skipping candidate with degenerate child key at {index:#010x}: {}",
                    self.wordlist.phrase_of(&tuple)
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// User targets first; the oracle is only consulted when they miss
    fn classify(
        &self,
        survivor: Survivor,
        matched_targets: &mut HashSet<usize>,
    ) -> Result<Option<SearchMatch>> {
        if !self.targets.is_empty() {
            if let Some(index) = self.targets.matches(&survivor.address) {
                matched_targets.insert(index);
                return Ok(Some(SearchMatch {
                    address: survivor.address,
                    indices: survivor.indices,
                    reason: MatchReason::UserTarget(index),
                }));
            }
        }
        if let Some(oracle) = &self.oracle {
            return match oracle.check(&survivor.address)? {
                Activity::Active => Ok(Some(SearchMatch {
                    address: survivor.address,
                    indices: survivor.indices,
                    reason: MatchReason::ChainActive,
                })),
                Activity::Inactive => Ok(None),
                Activity::Unknown => {
                    warn!(
                        "Activity unknown for {}: {}",
                        survivor.address,
                        self.wordlist.phrase_of(&survivor.indices)
                    );
                    Ok(None)
                }
            };
        }
        if self.targets.is_empty() {
            // printer mode: no target and no oracle
            return Ok(Some(SearchMatch {
                address: survivor.address,
                indices: survivor.indices,
                reason: MatchReason::Printed,
            }));
        }
        Ok(None)
    }

    fn report_match(&self, found: &SearchMatch) {
        match found.reason {
            MatchReason::UserTarget(_) => info!("Searched stake address found:"),
            MatchReason::ChainActive => info!("Active stake address found:"),
            MatchReason::Printed => {}
        }
        println!(
            "{}: {}",
            found.address,
            self.wordlist.phrase_of(&found.indices)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::{compose_slots, Slot};

    fn known_phrase_slots(phrase: &str, wordlist: &Wordlist) -> Vec<Slot> {
        phrase
            .split_whitespace()
            .map(|w| Slot::Known(vec![wordlist.index_of(w).unwrap()]))
            .collect()
    }

    #[test]
    fn test_printer_mode_reports_every_valid_candidate() {
        let wordlist = Arc::new(Wordlist::english());
        let slots = known_phrase_slots(
            "legal winner thank year wave sausage worth useful legal winner thank yellow",
            &wordlist,
        );
        let generator = CandidateGenerator::new(
            compose_slots(slots, &[], 12).unwrap(),
            false,
        );
        let driver = SearchDriver::new(
            Arc::clone(&wordlist),
            generator,
            StakeDeriver::default(),
            TargetSet::default(),
            None,
        );
        let outcome = driver.run().unwrap();
        assert_eq!(outcome.counters.total_checked, 1);
        assert_eq!(outcome.counters.fulfilled_checksum, 1);
        assert_eq!(outcome.matches.len(), 1);
        assert!(matches!(outcome.matches[0].reason, MatchReason::Printed));
        assert!(!outcome.cancelled);
    }

    #[test]
    fn test_cancellation_stops_promptly() {
        let wordlist = Arc::new(Wordlist::english());
        let slots = vec![Slot::Unknown; 12];
        let generator = CandidateGenerator::new(slots, false);
        let driver = SearchDriver::new(
            Arc::clone(&wordlist),
            generator,
            StakeDeriver::default(),
            TargetSet::new(["stake1u9..."]),
            None,
        )
        .with_batch_size(64);
        driver.cancel_flag().store(true, Ordering::Relaxed);
        let outcome = driver.run().unwrap();
        assert!(outcome.cancelled);
        assert_eq!(outcome.counters.total_checked, 0);
    }
}
