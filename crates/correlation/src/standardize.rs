//! Team-name standardization applied before records reach the engine.
//!
//! Sources spell clubs differently ("FC Barcelona", "Barcelona", "BARCA").
//! A standardizer maps each raw name to a canonical form so the matchers
//! compare like with like.

use indexmap::IndexMap;
use std::collections::HashMap;
use surebet_core::SourceRecord;

/// Maps a raw team name to its canonical form.
pub trait NameStandardizer: Send + Sync {
    fn standardize(&self, raw: &str) -> String;

    /// Returns `record` with both standardized names filled from its raw names.
    fn apply(&self, record: SourceRecord) -> SourceRecord {
        let team_a = self.standardize(&record.team_a);
        let team_b = self.standardize(&record.team_b);
        record.with_standardized_names(team_a, team_b)
    }
}

// =============================================================================
// Fallback
// =============================================================================

/// Trims, collapses inner whitespace and title-cases.
///
/// A letter is upper-cased when it follows a non-letter and lower-cased
/// otherwise, so `"o'higgins"` becomes `"O'Higgins"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackStandardizer;

impl NameStandardizer for FallbackStandardizer {
    fn standardize(&self, raw: &str) -> String {
        let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

        let mut out = String::with_capacity(collapsed.len());
        let mut after_letter = false;
        for c in collapsed.chars() {
            if c.is_alphabetic() {
                if after_letter {
                    out.extend(c.to_lowercase());
                } else {
                    out.extend(c.to_uppercase());
                }
                after_letter = true;
            } else {
                out.push(c);
                after_letter = false;
            }
        }
        out
    }
}

// =============================================================================
// Synonym Table
// =============================================================================

/// Looks names up in a canonical-name to variants table.
///
/// Lookup is case-insensitive on the trimmed raw name. When a variant is
/// listed under several canonical names, the one inserted first wins.
/// Names not in the table go through [`FallbackStandardizer`].
#[derive(Debug, Clone, Default)]
pub struct SynonymStandardizer {
    lookup: HashMap<String, String>,
}

impl SynonymStandardizer {
    #[must_use]
    pub fn new(synonyms: &IndexMap<String, Vec<String>>) -> Self {
        let mut lookup = HashMap::new();
        for (canonical, variants) in synonyms {
            for variant in variants {
                lookup
                    .entry(fold(variant))
                    .or_insert_with(|| canonical.clone());
            }
        }
        Self { lookup }
    }

    /// Number of known variants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}

impl NameStandardizer for SynonymStandardizer {
    fn standardize(&self, raw: &str) -> String {
        self.lookup
            .get(&fold(raw))
            .cloned()
            .unwrap_or_else(|| FallbackStandardizer.standardize(raw))
    }
}

fn fold(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn table() -> IndexMap<String, Vec<String>> {
        let mut synonyms = IndexMap::new();
        synonyms.insert(
            "Barcelona".to_string(),
            vec!["FC Barcelona".to_string(), "Barca".to_string()],
        );
        synonyms.insert(
            "Manchester City".to_string(),
            vec!["Man City".to_string(), "Barca".to_string()],
        );
        synonyms
    }

    #[test]
    fn test_fallback_title_case() {
        let s = FallbackStandardizer;

        assert_eq!(s.standardize("  real   madrid "), "Real Madrid");
        assert_eq!(s.standardize("PSV EINDHOVEN"), "Psv Eindhoven");
        assert_eq!(s.standardize("o'higgins"), "O'Higgins");
        assert_eq!(s.standardize("1.fc köln"), "1.Fc Köln");
        assert_eq!(s.standardize(""), "");
    }

    #[test]
    fn test_synonym_lookup_is_case_insensitive() {
        let s = SynonymStandardizer::new(&table());

        assert_eq!(s.standardize("fc barcelona "), "Barcelona");
        assert_eq!(s.standardize("MAN CITY"), "Manchester City");
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn test_first_canonical_wins_on_conflict() {
        let s = SynonymStandardizer::new(&table());
        assert_eq!(s.standardize("barca"), "Barcelona");
    }

    #[test]
    fn test_unknown_name_falls_back() {
        let s = SynonymStandardizer::new(&table());
        assert_eq!(s.standardize("inter  milan"), "Inter Milan");
    }

    #[test]
    fn test_apply_sets_both_names() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 19, 0, 0).unwrap();
        let record = SourceRecord::new("STS", at, "FC Barcelona", "man city");

        let record = SynonymStandardizer::new(&table()).apply(record);

        assert_eq!(record.team_a, "FC Barcelona");
        assert_eq!(record.team_a_standardized, "Barcelona");
        assert_eq!(record.team_b_standardized, "Manchester City");
    }
}
