use std::collections::BTreeSet;

use crate::error::{AviaryError, Result};
use crate::genealogy::lineage::LineageResolver;
use crate::genealogy::{
    ConsanguinityResult, RelationshipLevel, DEFAULT_MAX_GENERATIONS, RECOMMEND_AGAINST, RECOMMEND_SAFE,
};
use crate::store::BreedingStore;

/// Knobs for a single consanguinity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOptions {
    pub max_generations: usize,
    /// Fail with not-found for unknown birds instead of answering "unrelated".
    pub strict: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            max_generations: DEFAULT_MAX_GENERATIONS,
            strict: false,
        }
    }
}

/// Decides whether two birds are safe to pair.
///
/// This is shared-ancestor detection within a generation bound, not a kinship
/// coefficient: a common great-grandparent is flagged like a shared parent.
pub struct ConsanguinityChecker<'s, S: BreedingStore + ?Sized> {
    resolver: LineageResolver<'s, S>,
}

impl<'s, S: BreedingStore + ?Sized> ConsanguinityChecker<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self {
            resolver: LineageResolver::new(store),
        }
    }

    pub fn check(&self, individual_a: &str, individual_b: &str, options: CheckOptions) -> Result<ConsanguinityResult> {
        validate_pair(individual_a, individual_b)?;
        if options.strict {
            require_individual(self.resolver.store(), individual_a)?;
            require_individual(self.resolver.store(), individual_b)?;
        }

        let lineage_a = self.resolver.resolve_ancestors(individual_a, options.max_generations)?;
        let lineage_b = self.resolver.resolve_ancestors(individual_b, options.max_generations)?;

        Ok(classify(individual_a, individual_b, &lineage_a, &lineage_b))
    }
}

/// Reject blank ids and a bird checked against itself.
pub fn validate_pair(individual_a: &str, individual_b: &str) -> Result<()> {
    if individual_a.trim().is_empty() || individual_b.trim().is_empty() {
        return Err(AviaryError::InvalidInput("bird ids must not be empty".to_string()));
    }
    if individual_a == individual_b {
        return Err(AviaryError::InvalidInput(format!(
            "cannot check bird {} against itself",
            individual_a
        )));
    }
    Ok(())
}

/// Fail with not-found unless `individual_id` is stored.
pub(crate) fn require_individual<S: BreedingStore + ?Sized>(store: &S, individual_id: &str) -> Result<()> {
    match store.get_individual(individual_id)? {
        Some(_) => Ok(()),
        None => Err(AviaryError::IndividualNotFound(individual_id.to_string())),
    }
}

/// Classify two birds from their ancestor lists.
///
/// Direct lineage (either bird in the other's ancestry) wins over shared
/// ancestors. Empty lineages, including those of unknown birds, come out as
/// unrelated.
pub fn classify(
    individual_a: &str,
    individual_b: &str,
    lineage_a: &[String],
    lineage_b: &[String],
) -> ConsanguinityResult {
    let distinct_a: BTreeSet<&str> = lineage_a.iter().map(String::as_str).collect();
    let distinct_b: BTreeSet<&str> = lineage_b.iter().map(String::as_str).collect();
    let common_ancestors: Vec<String> = distinct_a
        .intersection(&distinct_b)
        .map(|id| id.to_string())
        .collect();

    let direct = distinct_b.contains(individual_a) || distinct_a.contains(individual_b);
    let relationship_level = if direct {
        RelationshipLevel::ParentOffspring
    } else if !common_ancestors.is_empty() {
        RelationshipLevel::SiblingsOrCousins
    } else {
        RelationshipLevel::None
    };
    let is_related = relationship_level != RelationshipLevel::None;

    log::debug!(
        "Consanguinity {} x {}: {:?} ({} common ancestors)",
        individual_a,
        individual_b,
        relationship_level,
        common_ancestors.len()
    );

    ConsanguinityResult {
        is_related,
        relationship_level,
        common_ancestor_count: common_ancestors.len(),
        common_ancestors,
        recommendation: if is_related { RECOMMEND_AGAINST } else { RECOMMEND_SAFE }.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Sex;
    use crate::store::testing::{add_family, bird};
    use crate::store::MemoryStore;

    /// GF x GM -> F, F' ; F x M -> A, B ; F' x M2 -> Q (cousin of A) ;
    /// X x Y -> U ; V x W -> R (unrelated lines).
    fn aviary() -> MemoryStore {
        let mut store = MemoryStore::new();
        for (id, sex) in [
            ("GF", Sex::Male),
            ("GM", Sex::Female),
            ("F", Sex::Male),
            ("F'", Sex::Male),
            ("M", Sex::Female),
            ("M2", Sex::Female),
            ("A", Sex::Male),
            ("B", Sex::Female),
            ("Q", Sex::Female),
            ("X", Sex::Male),
            ("Y", Sex::Female),
            ("U", Sex::Female),
            ("V", Sex::Male),
            ("W", Sex::Female),
            ("R", Sex::Male),
        ] {
            store.add_individual(bird(id, sex));
        }
        add_family(&mut store, "P0", "C0", "GF", "GM", &["F", "F'"]);
        add_family(&mut store, "P1", "C1", "F", "M", &["A", "B"]);
        add_family(&mut store, "P2", "C2", "F'", "M2", &["Q"]);
        add_family(&mut store, "P3", "C3", "X", "Y", &["U"]);
        add_family(&mut store, "P4", "C4", "V", "W", &["R"]);
        store
    }

    fn check(store: &MemoryStore, a: &str, b: &str) -> ConsanguinityResult {
        ConsanguinityChecker::new(store).check(a, b, CheckOptions::default()).unwrap()
    }

    #[test]
    fn test_full_siblings() {
        let store = aviary();
        let result = check(&store, "A", "B");
        assert!(result.is_related);
        assert_eq!(result.relationship_level, RelationshipLevel::SiblingsOrCousins);
        // F, M, GF, GM all shared within 3 generations
        assert_eq!(result.common_ancestor_count, 4);
        assert_eq!(result.recommendation, RECOMMEND_AGAINST);
    }

    #[test]
    fn test_siblings_one_generation_share_parents() {
        let store = aviary();
        let options = CheckOptions { max_generations: 1, strict: false };
        let result = ConsanguinityChecker::new(&store).check("A", "B", options).unwrap();
        assert_eq!(result.common_ancestor_count, 2);
        assert_eq!(result.common_ancestors, vec!["F", "M"]);
    }

    #[test]
    fn test_cousins_share_bucket_with_siblings() {
        let store = aviary();
        let result = check(&store, "A", "Q");
        assert_eq!(result.relationship_level, RelationshipLevel::SiblingsOrCousins);
        assert_eq!(result.common_ancestors, vec!["GF", "GM"]);
    }

    #[test]
    fn test_parent_offspring() {
        let store = aviary();
        let result = check(&store, "F", "A");
        assert!(result.is_related);
        assert_eq!(result.relationship_level, RelationshipLevel::ParentOffspring);
        assert_eq!(result.recommendation, RECOMMEND_AGAINST);
    }

    #[test]
    fn test_grandparent_counts_as_direct_lineage() {
        let store = aviary();
        let result = check(&store, "A", "GM");
        assert_eq!(result.relationship_level, RelationshipLevel::ParentOffspring);
    }

    #[test]
    fn test_unrelated() {
        let store = aviary();
        let result = check(&store, "U", "R");
        assert!(!result.is_related);
        assert_eq!(result.relationship_level, RelationshipLevel::None);
        assert_eq!(result.common_ancestor_count, 0);
        assert_eq!(result.recommendation, RECOMMEND_SAFE);
    }

    #[test]
    fn test_unknown_bird_reads_as_unrelated() {
        let store = aviary();
        let baseline = check(&store, "U", "R");
        assert_eq!(check(&store, "U", "no-such-bird"), baseline);
        assert_eq!(check(&store, "ghost-1", "ghost-2"), baseline);
    }

    #[test]
    fn test_strict_mode_reports_unknown_bird() {
        let store = aviary();
        let options = CheckOptions { strict: true, ..CheckOptions::default() };
        let err = ConsanguinityChecker::new(&store)
            .check("U", "no-such-bird", options)
            .unwrap_err();
        assert!(matches!(err, AviaryError::IndividualNotFound(id) if id == "no-such-bird"));
        assert!(ConsanguinityChecker::new(&store).check("U", "R", options).is_ok());
    }

    #[test]
    fn test_symmetric_and_idempotent() {
        let store = aviary();
        let ids = ["GF", "F", "A", "B", "Q", "U", "R", "missing"];
        for a in ids {
            for b in ids {
                if a == b {
                    continue;
                }
                let ab = check(&store, a, b);
                let ba = check(&store, b, a);
                assert_eq!(ab.is_related, ba.is_related, "{} x {}", a, b);
                assert_eq!(ab.relationship_level, ba.relationship_level, "{} x {}", a, b);
                assert_eq!(ab.common_ancestor_count, ba.common_ancestor_count);
                assert_eq!(ab, check(&store, a, b));
            }
        }
    }

    #[test]
    fn test_rejects_self_and_blank() {
        let store = aviary();
        let checker = ConsanguinityChecker::new(&store);
        assert!(matches!(
            checker.check("A", "A", CheckOptions::default()),
            Err(AviaryError::InvalidInput(_))
        ));
        assert!(matches!(
            checker.check(" ", "A", CheckOptions::default()),
            Err(AviaryError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_classify_deduplicates_lineages() {
        let lineage_a = vec!["F".to_string(), "M".to_string(), "F".to_string()];
        let lineage_b = vec!["F".to_string(), "F".to_string()];
        let result = classify("A", "B", &lineage_a, &lineage_b);
        assert_eq!(result.common_ancestor_count, 1);
        assert_eq!(result.common_ancestors, vec!["F"]);
    }
}
