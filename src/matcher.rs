//! User-supplied target address matching
//!
//! Targets are either full bech32 stake addresses or abbreviated
//! `prefix...suffix` patterns with the omitted middle marked by three dots.

/// Why a candidate counted as a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchReason {
    /// Matched the user target with this index
    UserTarget(usize),
    /// Reported active by the chain oracle
    ChainActive,
    /// No oracle configured; every valid candidate is reported
    Printed,
}

/// Abbreviation marker inside a target address
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq)]
enum TargetPattern {
    Exact(String),
    Affix { prefix: String, suffix: String },
}

impl TargetPattern {
    fn parse(target: &str) -> Self {
        match target.split_once(ELLIPSIS) {
            Some((prefix, suffix)) => Self::Affix {
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
            },
            None => Self::Exact(target.to_string()),
        }
    }

    fn matches(&self, address: &str) -> bool {
        match self {
            Self::Exact(target) => address == target,
            Self::Affix { prefix, suffix } => {
                address.len() >= prefix.len() + suffix.len()
                    && address.starts_with(prefix)
                    && address.ends_with(suffix)
            }
        }
    }
}

/// The set of stake addresses the user is searching for
#[derive(Debug, Clone, Default)]
pub struct TargetSet {
    patterns: Vec<TargetPattern>,
}

impl TargetSet {
    pub fn new<S: AsRef<str>>(targets: impl IntoIterator<Item = S>) -> Self {
        Self {
            patterns: targets
                .into_iter()
                .map(|t| TargetPattern::parse(t.as_ref()))
                .collect(),
        }
    }

    /// Index of the first target matching the address
    pub fn matches(&self, address: &str) -> Option<usize> {
        self.patterns.iter().position(|p| p.matches(address))
    }

    /// Number of distinct targets
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXISTING: &str = "stake1u9t04dtwptk5776eluj6ruyd782k66npnf55tdrp6dvwnzs24r8yq";
    const MISSING: &str = "stake1u8p6x7049w05z8y2wqwfrdx04dzupzkye68qkv9zcec3dwqd9tweh";

    #[test]
    fn test_exact_targets() {
        let targets = TargetSet::new([
            EXISTING,
            "stake1u9vm3pq6f3a5hyvu4z80jyetuk8wt9kvdv648a6804zh0vscalg0n",
        ]);
        assert_eq!(targets.matches(EXISTING), Some(0));
        assert_eq!(targets.matches(MISSING), None);
        assert_eq!(targets.len(), 2);
    }

    #[test]
    fn test_abbreviated_targets() {
        let targets = TargetSet::new(["stake1u9...24r8yq", "stake1u9...calg0n"]);
        assert_eq!(targets.matches(EXISTING), Some(0));
        assert_eq!(targets.matches(MISSING), None);
        assert_eq!(
            targets.matches("stake1u9vm3pq6f3a5hyvu4z80jyetuk8wt9kvdv648a6804zh0vscalg0n"),
            Some(1)
        );
    }

    #[test]
    fn test_overlapping_affixes_respect_length() {
        // prefix and suffix may not overlap inside the address
        let targets = TargetSet::new(["stake1u9t04...9t04dtw"]);
        assert_eq!(targets.matches("stake1u9t04dtw"), None);
        assert_eq!(targets.matches("stake1u9t04xx9t04dtw"), Some(0));
    }

    #[test]
    fn test_empty_affix_sides() {
        let targets = TargetSet::new(["...24r8yq"]);
        assert_eq!(targets.matches(EXISTING), Some(0));
        let targets = TargetSet::new(["stake1u9..."]);
        assert_eq!(targets.matches(EXISTING), Some(0));
        assert_eq!(targets.matches(MISSING), None);
    }
}
