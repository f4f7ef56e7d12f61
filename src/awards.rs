//! Award category key registry.
//!
//! Award categories are discovered from the data rather than read from it
//! as keys, so the registry assigns surrogate keys in first-seen order
//! over a full scan of the award source. The registry is an owned value
//! passed into the awards stage, never process-wide state, so separate
//! runs and tests cannot observe each other's assignments.
//!
//! The stage runs two passes over the same file: a scan pass that
//! registers every triple, and a load pass that attaches fact rows via
//! `lookup`. The load pass must observe exactly the rows the scan pass
//! did; `assert_consistent_scans` enforces that with the observed row
//! counts.

use crate::error::EtlError;
use crate::warehouse::models::AwardCategoryRow;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AwardTriple {
    pub class: String,
    pub canonical_category: String,
    pub category: String,
}

impl std::fmt::Display for AwardTriple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            self.class, self.canonical_category, self.category
        )
    }
}

#[derive(Debug, Default)]
pub struct AwardCategoryRegistry {
    keys: HashMap<AwardTriple, i64>,
    /// Triples in assignment order; key n lives at index n - 1.
    ordered: Vec<AwardTriple>,
    scanned_rows: usize,
}

impl AwardCategoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a key to a triple, or return the key assigned on first
    /// sight. Keys are 1-based and dense.
    pub fn register(&mut self, triple: AwardTriple) -> i64 {
        self.scanned_rows += 1;
        if let Some(&key) = self.keys.get(&triple) {
            return key;
        }
        let key = self.ordered.len() as i64 + 1;
        self.ordered.push(triple.clone());
        self.keys.insert(triple, key);
        key
    }

    /// Key for an already-registered triple. A miss means the load pass
    /// observed a row the scan pass never saw.
    pub fn lookup(&self, triple: &AwardTriple) -> Result<i64, EtlError> {
        self.keys
            .get(triple)
            .copied()
            .ok_or_else(|| EtlError::LookupMiss(triple.to_string()))
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Number of source rows consumed by the scan pass.
    pub fn scanned_rows(&self) -> usize {
        self.scanned_rows
    }

    /// Fail when the load pass saw a different number of rows than the
    /// scan pass did.
    pub fn assert_consistent_scans(&self, loaded_rows: usize) -> Result<(), EtlError> {
        if loaded_rows != self.scanned_rows {
            return Err(EtlError::InconsistentScan {
                scanned: self.scanned_rows,
                loaded: loaded_rows,
            });
        }
        Ok(())
    }

    /// Dimension rows for every registered category, in key order.
    pub fn dimension_rows(&self) -> Vec<AwardCategoryRow> {
        self.ordered
            .iter()
            .enumerate()
            .map(|(index, triple)| AwardCategoryRow {
                award_category_key: index as i64 + 1,
                class: triple.class.clone(),
                canonical_category: triple.canonical_category.clone(),
                category: triple.category.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triple(class: &str, canonical: &str, category: &str) -> AwardTriple {
        AwardTriple {
            class: class.to_string(),
            canonical_category: canonical.to_string(),
            category: category.to_string(),
        }
    }

    #[test]
    fn keys_are_dense_and_first_seen_ordered() {
        let mut registry = AwardCategoryRegistry::new();
        assert_eq!(registry.register(triple("Acting", "ACTOR", "ACTOR")), 1);
        assert_eq!(registry.register(triple("Acting", "ACTRESS", "ACTRESS")), 2);
        assert_eq!(registry.register(triple("Writing", "STORY", "STORY")), 3);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn repeated_triple_keeps_its_first_key() {
        let mut registry = AwardCategoryRegistry::new();
        let first = registry.register(triple("Acting", "ACTOR", "ACTOR"));
        registry.register(triple("Acting", "ACTRESS", "ACTRESS"));
        let again = registry.register(triple("Acting", "ACTOR", "ACTOR"));
        assert_eq!(first, again);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.scanned_rows(), 3);
    }

    #[test]
    fn repeated_scans_assign_identical_mappings() {
        let rows = [
            triple("Acting", "ACTOR", "ACTOR"),
            triple("Special", "HONORARY", "HONORARY"),
            triple("Acting", "ACTOR", "ACTOR"),
            triple("Writing", "STORY", "STORY"),
        ];
        let run = || {
            let mut registry = AwardCategoryRegistry::new();
            for row in &rows {
                registry.register(row.clone());
            }
            registry.dimension_rows()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn lookup_miss_for_unregistered_triple() {
        let registry = AwardCategoryRegistry::new();
        let err = registry
            .lookup(&triple("Acting", "ACTOR", "ACTOR"))
            .unwrap_err();
        assert!(matches!(err, EtlError::LookupMiss(_)));
    }

    #[test]
    fn scan_count_mismatch_is_fatal() {
        let mut registry = AwardCategoryRegistry::new();
        registry.register(triple("Acting", "ACTOR", "ACTOR"));
        registry.register(triple("Acting", "ACTOR", "ACTOR"));

        registry.assert_consistent_scans(2).unwrap();
        let err = registry.assert_consistent_scans(1).unwrap_err();
        assert!(matches!(
            err,
            EtlError::InconsistentScan {
                scanned: 2,
                loaded: 1
            }
        ));
    }

    #[test]
    fn dimension_rows_in_key_order() {
        let mut registry = AwardCategoryRegistry::new();
        registry.register(triple("Acting", "ACTOR", "ACTOR"));
        registry.register(triple("Writing", "STORY", "STORY"));
        let rows = registry.dimension_rows();
        assert_eq!(rows[0].award_category_key, 1);
        assert_eq!(rows[0].class, "Acting");
        assert_eq!(rows[1].award_category_key, 2);
        assert_eq!(rows[1].class, "Writing");
    }
}
