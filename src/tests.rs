//! Cross-module scenario tests for the recovery pipeline

use crate::derivation::StakeDeriver;
use crate::entropy;
use crate::error::OracleError;
use crate::generator::{compose_slots, select_length, CandidateGenerator, Slot};
use crate::matcher::{MatchReason, TargetSet};
use crate::oracle::{Activity, ChainOracle};
use crate::search::SearchDriver;
use crate::wordlist::Wordlist;
use std::sync::{Arc, Mutex};

/// Test wallet of the project; its stake address is fixed below
const TEST_PHRASE: &str = "ladder long kangaroo inherit unknown prize else second enter addict \
                           mystery valve riot attitude area blind fabric symbol skill sunset \
                           goose shock gasp grape";

const TEST_STAKE_ADDRESS: &str = "stake1u9t04dtwptk5776eluj6ruyd782k66npnf55tdrp6dvwnzs24r8yq";

fn wordlist() -> Arc<Wordlist> {
    Arc::new(Wordlist::english())
}

fn indices_of(wordlist: &Wordlist, phrase: &str) -> Vec<u16> {
    phrase
        .split_whitespace()
        .map(|w| wordlist.index_of(w).unwrap())
        .collect()
}

fn singleton_slots(wordlist: &Wordlist, words: &[&str]) -> Vec<Slot> {
    words
        .iter()
        .map(|w| Slot::Known(vec![wordlist.index_of(w).unwrap()]))
        .collect()
}

/// Chain oracle double that records every consulted address
#[derive(Clone)]
struct MockOracle {
    active: String,
    verdict_for_others: Activity,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockOracle {
    fn new(active: &str) -> Self {
        Self {
            active: active.to_string(),
            verdict_for_others: Activity::Inactive,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ChainOracle for MockOracle {
    fn check(&self, stake_address: &str) -> Result<Activity, OracleError> {
        self.calls.lock().unwrap().push(stake_address.to_string());
        Ok(if stake_address == self.active {
            Activity::Active
        } else {
            self.verdict_for_others
        })
    }
}

/// S1: every mis-remembered word expands to a set containing the correct one
#[test]
fn test_typo_recovery_expansions_cover_the_phrase() {
    let wordlist = wordlist();
    let typos = [
        ("prize", "price"),
        ("attitude", "altitude"),
        ("blind", "bind"),
        ("gasp", "gap"),
    ];
    let written: Vec<&str> = TEST_PHRASE
        .split_whitespace()
        .map(|w| {
            typos
                .iter()
                .find(|(correct, _)| *correct == w)
                .map(|(_, typo)| *typo)
                .unwrap_or(w)
        })
        .collect();

    for (written_word, correct_word) in written.iter().zip(TEST_PHRASE.split_whitespace()) {
        let expansion = wordlist.expand(written_word, 1);
        let correct_index = wordlist.index_of(correct_word).unwrap();
        assert!(
            expansion.candidates.contains(&correct_index),
            "{written_word} must expand to cover {correct_word}"
        );
    }

    // the covered phrase is checksum-valid and derives the expected address
    let indices = indices_of(&wordlist, TEST_PHRASE);
    assert!(entropy::is_valid(&indices).unwrap());
    assert_eq!(
        StakeDeriver::default().stake_address(&indices).unwrap(),
        TEST_STAKE_ADDRESS
    );
}

/// S2: one missing word at a known position
#[test]
fn test_single_missing_word_at_known_position() {
    let wordlist = wordlist();
    let words: Vec<&str> = TEST_PHRASE.split_whitespace().collect();
    let tokens = singleton_slots(&wordlist, &words[..23]);

    let length = select_length(tokens.len(), &[24], None).unwrap();
    assert_eq!(length, 24);
    let slots = compose_slots(tokens, &[24], length).unwrap();
    let generator = CandidateGenerator::new(slots, false);

    let outcome = SearchDriver::new(
        Arc::clone(&wordlist),
        generator,
        StakeDeriver::default(),
        TargetSet::new([TEST_STAKE_ADDRESS]),
        None,
    )
    .run()
    .unwrap();

    assert_eq!(outcome.counters.total_checked, 2048);
    assert!(outcome.counters.fulfilled_checksum >= 1);
    assert_eq!(outcome.matches.len(), 1);
    assert_eq!(outcome.matches[0].address, TEST_STAKE_ADDRESS);
    assert_eq!(outcome.matches[0].reason, MatchReason::UserTarget(0));
    assert_eq!(
        wordlist.phrase_of(&outcome.matches[0].indices),
        TEST_PHRASE.split_whitespace().collect::<Vec<_>>().join(" ")
    );
}

/// S3: phrase written column-major from the 4x6 layout, recovered with --order
#[test]
fn test_row_column_transposition() {
    let wordlist = wordlist();
    let actual: Vec<&str> = TEST_PHRASE.split_whitespace().collect();
    // read the 4-row x 6-column layout column by column
    let written: Vec<&str> = (0..24).map(|k| actual[(k % 4) * 6 + k / 4]).collect();
    assert_ne!(written, actual);

    let slots = compose_slots(singleton_slots(&wordlist, &written), &[], 24).unwrap();
    let generator = CandidateGenerator::new(slots, true);
    assert_eq!(generator.search_space(), 7);

    let outcome = SearchDriver::new(
        Arc::clone(&wordlist),
        generator,
        StakeDeriver::default(),
        TargetSet::new([TEST_STAKE_ADDRESS]),
        None,
    )
    .run()
    .unwrap();

    assert_eq!(outcome.matches.len(), 1);
    assert_eq!(outcome.matches[0].address, TEST_STAKE_ADDRESS);
    assert_eq!(
        wordlist.phrase_of(&outcome.matches[0].indices),
        actual.join(" ")
    );
}

/// S4: abbreviated prefix...suffix target
#[test]
fn test_abbreviated_target() {
    let wordlist = wordlist();
    let words: Vec<&str> = TEST_PHRASE.split_whitespace().collect();
    let slots = compose_slots(singleton_slots(&wordlist, &words[..23]), &[24], 24).unwrap();
    let generator = CandidateGenerator::new(slots, false);

    let outcome = SearchDriver::new(
        Arc::clone(&wordlist),
        generator,
        StakeDeriver::default(),
        TargetSet::new(["stake1u9...24r8yq"]),
        None,
    )
    .run()
    .unwrap();

    assert_eq!(outcome.matches.len(), 1);
    assert_eq!(outcome.matches[0].reason, MatchReason::UserTarget(0));
    assert_eq!(outcome.matches[0].address, TEST_STAKE_ADDRESS);
}

/// S5: checksum reference vector accepted, corrupted phrase rejected
#[test]
fn test_checksum_reference() {
    let wordlist = wordlist();
    let valid = indices_of(
        &wordlist,
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about",
    );
    assert!(entropy::is_valid(&valid).unwrap());
    assert_eq!(
        hex::encode(entropy::entropy_of(&valid).unwrap()),
        "00000000000000000000000000000000"
    );

    let mut corrupted = valid;
    corrupted[11] = wordlist.index_of("abandon").unwrap();
    assert!(!entropy::is_valid(&corrupted).unwrap());
}

/// S6: length inferred as 12 with one unknown slot appended
#[test]
fn test_length_inference_appends_unknown_slot() {
    let wordlist = wordlist();
    let known = "legal winner thank year wave sausage worth useful legal winner thank";
    let words: Vec<&str> = known.split_whitespace().collect();
    assert_eq!(words.len(), 11);

    let length = select_length(words.len(), &[], None).unwrap();
    assert_eq!(length, 12);
    let slots = compose_slots(singleton_slots(&wordlist, &words), &[], length).unwrap();
    assert_eq!(slots[11], Slot::Unknown);

    let generator = CandidateGenerator::new(slots, false);
    let outcome = SearchDriver::new(
        Arc::clone(&wordlist),
        generator,
        StakeDeriver::default(),
        TargetSet::default(),
        None,
    )
    .run()
    .unwrap();

    assert_eq!(outcome.counters.total_checked, 2048);
    // printer mode reports every surviving candidate, the real phrase included
    let expected = indices_of(&wordlist, &format!("{known} yellow"));
    assert!(outcome.matches.iter().any(|m| m.indices == expected));
    assert!(outcome
        .matches
        .iter()
        .all(|m| m.reason == MatchReason::Printed));
}

/// Derivation and match results do not depend on the worker partitioning
#[test]
fn test_outcome_is_partition_independent() {
    let wordlist = wordlist();
    let words: Vec<&str> = TEST_PHRASE.split_whitespace().collect();

    let mut results = Vec::new();
    for threads in [1, 4] {
        let slots = compose_slots(singleton_slots(&wordlist, &words[..23]), &[24], 24).unwrap();
        let generator = CandidateGenerator::new(slots, false);
        let outcome = SearchDriver::new(
            Arc::clone(&wordlist),
            generator,
            StakeDeriver::default(),
            TargetSet::new([TEST_STAKE_ADDRESS]),
            None,
        )
        .with_threads(threads)
        .with_batch_size(256)
        .run()
        .unwrap();
        results.push(outcome);
    }

    assert_eq!(results[0].counters.total_checked, results[1].counters.total_checked);
    assert_eq!(
        results[0].counters.fulfilled_checksum,
        results[1].counters.fulfilled_checksum
    );
    assert_eq!(results[0].matches.len(), 1);
    assert_eq!(results[1].matches.len(), 1);
    assert_eq!(results[0].matches[0].address, results[1].matches[0].address);
    assert_eq!(results[0].matches[0].indices, results[1].matches[0].indices);
}

/// The chain oracle reports the active wallet and nothing else
#[test]
fn test_chain_oracle_reports_active_address() {
    let wordlist = wordlist();
    let words: Vec<&str> = TEST_PHRASE.split_whitespace().collect();
    let slots = compose_slots(singleton_slots(&wordlist, &words[..23]), &[24], 24).unwrap();
    let generator = CandidateGenerator::new(slots, false);

    let oracle = MockOracle::new(TEST_STAKE_ADDRESS);
    let outcome = SearchDriver::new(
        Arc::clone(&wordlist),
        generator,
        StakeDeriver::default(),
        TargetSet::default(),
        Some(Box::new(oracle.clone())),
    )
    .run()
    .unwrap();

    assert_eq!(outcome.matches.len(), 1);
    assert_eq!(outcome.matches[0].reason, MatchReason::ChainActive);
    assert_eq!(outcome.matches[0].address, TEST_STAKE_ADDRESS);
    // every checksum-valid candidate was looked up exactly once
    let calls = oracle.calls();
    assert_eq!(calls.len() as u64, outcome.counters.without_repetitions);
    assert!(calls.contains(&TEST_STAKE_ADDRESS.to_string()));
}

/// A locally matched target is never sent to the oracle
#[test]
fn test_user_targets_short_circuit_the_oracle() {
    let wordlist = wordlist();
    let words: Vec<&str> = TEST_PHRASE.split_whitespace().collect();
    let slots = compose_slots(singleton_slots(&wordlist, &words[..23]), &[24], 24).unwrap();
    let generator = CandidateGenerator::new(slots, false);

    let oracle = MockOracle::new(TEST_STAKE_ADDRESS);
    let outcome = SearchDriver::new(
        Arc::clone(&wordlist),
        generator,
        StakeDeriver::default(),
        TargetSet::new([TEST_STAKE_ADDRESS]),
        Some(Box::new(oracle.clone())),
    )
    .run()
    .unwrap();

    assert_eq!(outcome.matches.len(), 1);
    assert_eq!(outcome.matches[0].reason, MatchReason::UserTarget(0));
    assert!(!oracle.calls().contains(&TEST_STAKE_ADDRESS.to_string()));
    // with an oracle configured the stream is drained, not stopped early
    assert_eq!(outcome.counters.total_checked, 2048);
}

/// Unknown oracle activity is not a match and does not stop the search
#[test]
fn test_unknown_activity_continues_search() {
    let wordlist = wordlist();
    let words: Vec<&str> = TEST_PHRASE.split_whitespace().collect();
    let slots = compose_slots(singleton_slots(&wordlist, &words[..23]), &[24], 24).unwrap();
    let generator = CandidateGenerator::new(slots, false);

    let mut oracle = MockOracle::new("stake1u_nothing_matches_this");
    oracle.verdict_for_others = Activity::Unknown;
    let outcome = SearchDriver::new(
        Arc::clone(&wordlist),
        generator,
        StakeDeriver::default(),
        TargetSet::default(),
        Some(Box::new(oracle.clone())),
    )
    .run()
    .unwrap();

    assert_eq!(outcome.counters.total_checked, 2048);
    assert!(outcome.matches.is_empty());
    assert!(!oracle.calls().is_empty());
}
