//! Candidate phrase generation
//!
//! Drives the combinatorial enumeration: length selection, slot composition
//! with missing positions, row/column reorder strategies, and an odometer
//! walk over the Cartesian product of per-slot word choices. The repetition
//! filter and the cross-strategy dedup set also live here; the search driver
//! applies them from its workers.

use crate::entropy::{is_legal_length, pack_indices, LEGAL_LENGTHS};
use crate::error::{GeneratorError, Result};
use crate::wordlist::WORDLIST_SIZE;
use std::collections::HashSet;
use std::sync::Mutex;

/// Maximum number of times one word may appear in a candidate phrase
const MAX_WORD_REPETITIONS: usize = 2;

/// One position of the candidate phrase
///
/// `Unknown` stands for the full wordlist without materializing it, so the
/// enumerator can shortcut the common missing-word case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// Ordered word indices this position may hold
    Known(Vec<u16>),
    /// Any wordlist word
    Unknown,
}

impl Slot {
    /// Number of word choices for this slot
    pub fn len(&self) -> usize {
        match self {
            Slot::Known(choices) => choices.len(),
            Slot::Unknown => WORDLIST_SIZE,
        }
    }

    /// Whether this slot is unsatisfiable
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Word index of the `cursor`-th choice
    fn choice(&self, cursor: usize) -> u16 {
        match self {
            Slot::Known(choices) => choices[cursor],
            Slot::Unknown => cursor as u16,
        }
    }
}

/// Pick the phrase length for the given inputs
///
/// Specified missing positions are honored: the length grows to the smallest
/// legal value covering both the word count and the largest 1-indexed
/// missing position. An explicit length below that is an error.
pub fn select_length(
    known: usize,
    missing_positions: &[usize],
    hint: Option<usize>,
) -> Result<usize> {
    let mut seen = HashSet::new();
    for &position in missing_positions {
        if position == 0 || !seen.insert(position) {
            return Err(GeneratorError::BadMissingPosition(position).into());
        }
    }
    let max_position = missing_positions.iter().copied().max().unwrap_or(0);
    let required = (known + missing_positions.len()).max(max_position);

    match hint {
        Some(length) => {
            if !is_legal_length(length) {
                return Err(GeneratorError::InvalidLength(length).into());
            }
            if length < required {
                return Err(GeneratorError::LengthTooSmall {
                    length,
                    known,
                    max_position: required,
                }
                .into());
            }
            Ok(length)
        }
        None => LEGAL_LENGTHS
            .iter()
            .copied()
            .find(|&l| l >= required)
            .ok_or_else(|| GeneratorError::InvalidLength(required).into()),
    }
}

/// Compose the full slot sequence of a candidate phrase
///
/// Unknown slots take the 1-indexed `missing_positions`; the token slots fill
/// the remaining positions in input order; positions left after the tokens
/// run out become unknown slots at the end.
pub fn compose_slots(
    tokens: Vec<Slot>,
    missing_positions: &[usize],
    length: usize,
) -> Result<Vec<Slot>> {
    let mut slots: Vec<Option<Slot>> = vec![None; length];
    for &position in missing_positions {
        if position == 0 || position > length {
            return Err(GeneratorError::BadMissingPosition(position).into());
        }
        if slots[position - 1].replace(Slot::Unknown).is_some() {
            return Err(GeneratorError::BadMissingPosition(position).into());
        }
    }

    let known = tokens.len();
    let mut tokens = tokens.into_iter();
    let composed: Vec<Slot> = slots
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| tokens.next().unwrap_or(Slot::Unknown)))
        .collect();
    if tokens.next().is_some() {
        return Err(GeneratorError::LengthTooSmall {
            length,
            known,
            max_position: length,
        }
        .into());
    }
    Ok(composed)
}

/// Reorder strategies for a phrase length
///
/// The identity plus one transpose per rectangular layout `rows x cols ==
/// length` with both sides at least 2, deduplicated. Both orientations of a
/// layout are generated, so the set is closed under inverse and a phrase
/// written column-major is recovered by the opposite orientation.
pub fn reorder_permutations(length: usize, reorder: bool) -> Vec<Vec<usize>> {
    let identity: Vec<usize> = (0..length).collect();
    let mut permutations = vec![identity];
    if !reorder {
        return permutations;
    }
    for rows in 2..=length / 2 {
        if length % rows != 0 {
            continue;
        }
        let cols = length / rows;
        let transpose: Vec<usize> = (0..length).map(|k| (k % rows) * cols + k / rows).collect();
        if !permutations.contains(&transpose) {
            permutations.push(transpose);
        }
    }
    permutations
}

/// Enumerates candidate index tuples over all reorder strategies
///
/// Per strategy the walk is an odometer over per-slot cursors, rightmost
/// position fastest, which makes the stream lexicographic over the per-slot
/// choice lists and fully deterministic. Memory is O(L); the product is
/// never materialized.
#[derive(Debug)]
pub struct CandidateGenerator {
    sequences: Vec<Vec<Slot>>,
    sequence: usize,
    cursors: Vec<usize>,
    pending_first: bool,
    exhausted: bool,
}

impl CandidateGenerator {
    /// Create a generator from a composed slot sequence
    pub fn new(slots: Vec<Slot>, reorder: bool) -> Self {
        let sequences: Vec<Vec<Slot>> = reorder_permutations(slots.len(), reorder)
            .iter()
            .map(|permutation| permutation.iter().map(|&j| slots[j].clone()).collect())
            .collect();
        let length = slots.len();
        let mut generator = Self {
            sequences,
            sequence: 0,
            cursors: vec![0; length],
            pending_first: true,
            exhausted: false,
        };
        // an unsatisfiable slot empties its whole sequence
        generator.skip_empty_sequences();
        generator
    }

    /// Total number of tuples this generator will emit, saturating
    ///
    /// A fully unknown 24-word phrase has 2048^24 combinations, far past
    /// u128; the count saturates instead of overflowing.
    pub fn search_space(&self) -> u128 {
        self.sequences
            .iter()
            .map(|slots| {
                slots
                    .iter()
                    .fold(1u128, |acc, slot| acc.saturating_mul(slot.len() as u128))
            })
            .fold(0u128, |acc, product| acc.saturating_add(product))
    }

    /// Whether the enumeration is finished
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Next raw index tuple, before any filtering
    pub fn next_tuple(&mut self) -> Option<Vec<u16>> {
        if self.exhausted {
            return None;
        }
        if self.pending_first {
            self.pending_first = false;
        } else if !self.advance() {
            return None;
        }
        let slots = &self.sequences[self.sequence];
        Some(
            slots
                .iter()
                .zip(&self.cursors)
                .map(|(slot, &cursor)| slot.choice(cursor))
                .collect(),
        )
    }

    /// Collect up to `limit` raw tuples
    pub fn next_batch(&mut self, limit: usize) -> Vec<Vec<u16>> {
        let mut batch = Vec::with_capacity(limit.min(1024));
        while batch.len() < limit {
            match self.next_tuple() {
                Some(tuple) => batch.push(tuple),
                None => break,
            }
        }
        batch
    }

    fn advance(&mut self) -> bool {
        let slots = &self.sequences[self.sequence];
        for i in (0..self.cursors.len()).rev() {
            self.cursors[i] += 1;
            if self.cursors[i] < slots[i].len() {
                return true;
            }
            self.cursors[i] = 0;
        }
        self.sequence += 1;
        self.skip_empty_sequences();
        !self.exhausted
    }

    fn skip_empty_sequences(&mut self) {
        while self.sequence < self.sequences.len()
            && self.sequences[self.sequence].iter().any(Slot::is_empty)
        {
            self.sequence += 1;
        }
        if self.sequence >= self.sequences.len() {
            self.exhausted = true;
        } else {
            self.cursors.iter_mut().for_each(|c| *c = 0);
        }
    }
}

/// The repetition rule: discard a phrase if any word occurs three or more times
pub fn passes_repetition_rule(indices: &[u16]) -> bool {
    for (i, &index) in indices.iter().enumerate() {
        let occurrences = indices[i..].iter().filter(|&&other| other == index).count();
        if occurrences > MAX_WORD_REPETITIONS {
            return false;
        }
    }
    true
}

/// Set of already-yielded candidates, keyed by the packed 11-bit tuple
///
/// Shared by the workers; bounded by the number of checksum survivors, which
/// is small relative to the raw stream.
#[derive(Debug, Default)]
pub struct DedupSet {
    seen: Mutex<HashSet<Vec<u8>>>,
}

impl DedupSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a candidate; returns false if it was already yielded
    pub fn insert(&self, indices: &[u16]) -> bool {
        let key = pack_indices(indices);
        self.seen.lock().expect("dedup set poisoned").insert(key)
    }

    /// Number of distinct candidates recorded
    pub fn len(&self) -> usize {
        self.seen.lock().expect("dedup set poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
