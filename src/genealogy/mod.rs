//! Genealogy engine: parent/offspring resolution, bounded ancestor search and
//! consanguinity classification over stored breeding records.
//!
//! Lineage runs Bird -> hatchling link -> Clutch -> Pairing -> male/female Bird.
//! Nothing here writes; every result is built fresh per call.

mod consanguinity;
mod lineage;
mod service;

pub use consanguinity::{classify, validate_pair, CheckOptions, ConsanguinityChecker};
pub use lineage::LineageResolver;
pub use service::GenealogyService;

use serde::{Deserialize, Serialize};

use crate::records::{Clutch, Individual, Pairing};

/// Generations searched when the caller does not choose.
pub const DEFAULT_MAX_GENERATIONS: usize = 3;

pub const RECOMMEND_AGAINST: &str = "Not recommended for breeding";
pub const RECOMMEND_SAFE: &str = "Safe to breed";

/// Recorded parents of one bird.
///
/// Only built when the bird's clutch and that clutch's pairing both resolve.
/// Either parent may still be missing if the pairing points at a bird that is
/// not stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parentage {
    pub father: Option<Individual>,
    pub mother: Option<Individual>,
    pub pairing: Pairing,
    pub clutch: Clutch,
}

impl Parentage {
    /// Father then mother ids, skipping unresolved parents.
    pub fn parent_ids(&self) -> impl Iterator<Item = &str> {
        self.father
            .iter()
            .chain(self.mother.iter())
            .map(|bird| bird.id.as_str())
    }
}

/// Result of a genealogy lookup.
///
/// `parents: None` means parentage is unknown; an empty `offspring` means the
/// bird is known and has never bred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genealogy {
    #[serde(rename = "bird")]
    pub individual: Individual,
    pub parents: Option<Parentage>,
    pub offspring: Vec<Individual>,
}

/// How closely two birds are related.
///
/// Siblings and cousins deliberately share one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipLevel {
    None,
    ParentOffspring,
    SiblingsOrCousins,
}

/// Verdict of a consanguinity check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsanguinityResult {
    pub is_related: bool,
    pub relationship_level: RelationshipLevel,
    pub common_ancestor_count: usize,
    /// Distinct shared ancestor ids, sorted.
    pub common_ancestors: Vec<String>,
    pub recommendation: String,
}
