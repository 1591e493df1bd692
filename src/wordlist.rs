//! BIP-39 wordlist index and edit-distance expansion
//!
//! The wordlist is built once at startup and shared read-only between all
//! workers. Lookups in both directions are O(1); the expander scans the full
//! list with a classical Levenshtein dynamic program over code points.

use crate::error::{Result, WordlistError};
use std::collections::HashMap;
use std::path::Path;

/// Number of words in every BIP-39 wordlist
pub const WORDLIST_SIZE: usize = 2048;

/// Builtin English BIP-39 wordlist, one word per line
const ENGLISH: &str = include_str!("wordlists/english.txt");

/// Bijective word ↔ index mapping over exactly 2048 words
#[derive(Debug, Clone)]
pub struct Wordlist {
    words: Vec<String>,
    index: HashMap<String, u16>,
}

/// Result of expanding one input token against the wordlist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    /// Candidate word indices, ascending by distance then wordlist index
    pub candidates: Vec<u16>,
    /// Whether the token itself is a wordlist member
    pub was_in_wordlist: bool,
}

impl Wordlist {
    /// Build the builtin English BIP-39 wordlist
    pub fn english() -> Self {
        Self::from_lines("builtin english", ENGLISH.lines())
            .expect("builtin English wordlist is well-formed")
    }

    /// Load a wordlist from a UTF-8 text file, one word per line
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_lines(&path.display().to_string(), content.lines())
    }

    fn from_lines<'a>(origin: &str, lines: impl Iterator<Item = &'a str>) -> Result<Self> {
        let mut words = Vec::with_capacity(WORDLIST_SIZE);
        let mut index = HashMap::with_capacity(WORDLIST_SIZE);

        for line in lines {
            let word = line.trim();
            if word.is_empty() {
                continue;
            }
            if index
                .insert(word.to_string(), words.len() as u16)
                .is_some()
            {
                return Err(WordlistError::DuplicateWord {
                    path: origin.to_string(),
                    word: word.to_string(),
                }
                .into());
            }
            words.push(word.to_string());
        }

        if words.len() != WORDLIST_SIZE {
            return Err(WordlistError::BadWordlist {
                path: origin.to_string(),
                count: words.len(),
            }
            .into());
        }

        Ok(Self { words, index })
    }

    /// Get the word for an index in `[0, 2048)`
    pub fn word_of(&self, index: u16) -> Option<&str> {
        self.words.get(index as usize).map(String::as_str)
    }

    /// Get the index for a word
    pub fn index_of(&self, word: &str) -> Result<u16> {
        self.index
            .get(word)
            .copied()
            .ok_or_else(|| WordlistError::NotInWordlist(word.to_string()).into())
    }

    /// Check if a word is in the list
    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }

    /// Iterate over all words in index order
    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }

    /// Render a sequence of indices as a space-separated phrase
    pub fn phrase_of(&self, indices: &[u16]) -> String {
        indices
            .iter()
            .filter_map(|&i| self.word_of(i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Expand a token to the wordlist words within edit distance `k`
    ///
    /// The unknown-slot sentinel (`?` or the empty string) expands to the
    /// full wordlist. An empty expansion means no wordlist word is within
    /// distance `k`; the caller decides whether that slot is unsatisfiable
    /// or falls back to a full unknown slot.
    pub fn expand(&self, token: &str, k: usize) -> Expansion {
        if is_unknown_token(token) {
            return Expansion {
                candidates: (0..WORDLIST_SIZE as u16).collect(),
                was_in_wordlist: false,
            };
        }

        let token_chars: Vec<char> = token.chars().collect();
        let mut matches: Vec<(usize, u16)> = Vec::new();
        for (i, word) in self.words.iter().enumerate() {
            let d = edit_distance_chars(&token_chars, word);
            if d <= k {
                matches.push((d, i as u16));
            }
        }
        matches.sort_unstable();

        Expansion {
            candidates: matches.into_iter().map(|(_, i)| i).collect(),
            was_in_wordlist: self.contains(token),
        }
    }
}

/// Check for the unknown-slot sentinel
pub fn is_unknown_token(token: &str) -> bool {
    token.is_empty() || token == "?"
}

/// Levenshtein distance between two strings, over code points
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    edit_distance_chars(&a, b)
}

fn edit_distance_chars(a: &[char], b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    // Two-row dynamic program; prev[j] is the distance a[..i] -> b[..j].
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, &ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_list_is_bijective() {
        let wordlist = Wordlist::english();
        assert_eq!(wordlist.all().count(), WORDLIST_SIZE);
        for (i, word) in wordlist.all().enumerate() {
            assert_eq!(wordlist.index_of(word).unwrap(), i as u16);
        }
        assert_eq!(wordlist.word_of(0), Some("abandon"));
        assert_eq!(wordlist.word_of(2047), Some("zoo"));
        assert_eq!(wordlist.word_of(2048), None);
    }

    #[test]
    fn test_known_indices() {
        let wordlist = Wordlist::english();
        assert_eq!(wordlist.index_of("food").unwrap(), 726);
        assert_eq!(wordlist.index_of("foot").unwrap(), 727);
        assert!(wordlist.index_of("fool").is_err());
        assert!(wordlist.contains("food"));
        assert!(!wordlist.contains("fool"));
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("abcd", "abcd"), 0);
        assert_eq!(edit_distance("abcd", "bcd"), 1);
        assert_eq!(edit_distance("abcd", "abc"), 1);
        assert_eq!(edit_distance("abcd", "zabcd"), 1);
        assert_eq!(edit_distance("abcd", "zbcd"), 1);
        assert_eq!(edit_distance("abcd", "ybcz"), 2);
        assert_eq!(edit_distance("abc", "ca"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn test_expand_exact_word() {
        let wordlist = Wordlist::english();
        let expansion = wordlist.expand("food", 0);
        assert_eq!(expansion.candidates, vec![726]);
        assert!(expansion.was_in_wordlist);
    }

    #[test]
    fn test_expand_neighbors() {
        let wordlist = Wordlist::english();
        let expansion = wordlist.expand("food", 1);
        let words: Vec<&str> = expansion
            .candidates
            .iter()
            .map(|&i| wordlist.word_of(i).unwrap())
            .collect();
        // distance 0 first, then distance-1 neighbors in index order
        assert_eq!(words, vec!["food", "fold", "foot", "good", "hood", "wood"]);
        assert!(expansion.was_in_wordlist);
    }

    #[test]
    fn test_expand_unlisted_token() {
        let wordlist = Wordlist::english();
        let expansion = wordlist.expand("fool", 0);
        assert!(expansion.candidates.is_empty());
        assert!(!expansion.was_in_wordlist);

        let expansion = wordlist.expand("fool", 1);
        let words: Vec<&str> = expansion
            .candidates
            .iter()
            .map(|&i| wordlist.word_of(i).unwrap())
            .collect();
        assert_eq!(words, vec!["cool", "foil", "food", "foot", "pool", "tool", "wool"]);
        assert!(!expansion.was_in_wordlist);
    }

    #[test]
    fn test_expand_unknown_sentinel() {
        let wordlist = Wordlist::english();
        for token in ["?", ""] {
            let expansion = wordlist.expand(token, 0);
            assert_eq!(expansion.candidates.len(), WORDLIST_SIZE);
            assert!(!expansion.was_in_wordlist);
        }
    }

    #[test]
    fn test_expansion_contains_token_iff_listed() {
        let wordlist = Wordlist::english();
        for (token, listed) in [("food", true), ("fool", false)] {
            for k in 0..3 {
                let expansion = wordlist.expand(token, k);
                let contains_token = expansion
                    .candidates
                    .iter()
                    .any(|&i| wordlist.word_of(i) == Some(token));
                assert_eq!(contains_token, listed, "token {token} k {k}");
            }
        }
    }

    #[test]
    fn test_from_file_rejects_short_list() {
        let dir = std::env::temp_dir().join("seedrecover-wordlist-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("short.txt");
        std::fs::write(&path, "alpha\nbeta\n").unwrap();
        let err = Wordlist::from_file(&path).unwrap_err();
        assert!(matches!(
            err,
            crate::error::RecoveryError::Wordlist(WordlistError::BadWordlist { count: 2, .. })
        ));
    }
}
