use std::collections::HashMap;

use super::BreedingStore;
use crate::error::Result;
use crate::records::{Clutch, Individual, Pairing};

/// In-memory [`BreedingStore`] for report generation over exported records.
///
/// Records keep insertion order, same as the SQLite adapter.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    individuals: HashMap<String, Individual>,
    pairings: Vec<Pairing>,
    clutches: Vec<Clutch>,
    // (clutch_id, individual_id)
    hatchlings: Vec<(String, String)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a bird.
    pub fn add_individual(&mut self, individual: Individual) {
        self.individuals.insert(individual.id.clone(), individual);
    }

    pub fn add_pairing(&mut self, pairing: Pairing) {
        self.pairings.push(pairing);
    }

    pub fn add_clutch(&mut self, clutch: Clutch) {
        self.clutches.push(clutch);
    }

    /// Record that `individual_id` hatched from `clutch_id`.
    pub fn add_hatchling(&mut self, clutch_id: impl Into<String>, individual_id: impl Into<String>) {
        self.hatchlings.push((clutch_id.into(), individual_id.into()));
    }
}

impl BreedingStore for MemoryStore {
    fn get_individual(&self, id: &str) -> Result<Option<Individual>> {
        Ok(self.individuals.get(id).cloned())
    }

    fn find_clutch_containing_offspring(&self, individual_id: &str) -> Result<Option<Clutch>> {
        let clutch = self
            .hatchlings
            .iter()
            .filter(|(_, bird)| bird == individual_id)
            .find_map(|(clutch_id, _)| self.clutches.iter().find(|c| &c.id == clutch_id))
            .cloned();
        Ok(clutch)
    }

    fn get_pairing(&self, id: &str) -> Result<Option<Pairing>> {
        Ok(self.pairings.iter().find(|p| p.id == id).cloned())
    }

    fn find_pairings_for_individual(&self, individual_id: &str) -> Result<Vec<Pairing>> {
        Ok(self
            .pairings
            .iter()
            .filter(|p| p.involves(individual_id))
            .cloned()
            .collect())
    }

    fn find_clutches_for_pairing(&self, pairing_id: &str) -> Result<Vec<Clutch>> {
        Ok(self
            .clutches
            .iter()
            .filter(|c| c.pairing_id.as_deref() == Some(pairing_id))
            .cloned()
            .collect())
    }

    fn find_offspring_for_clutch(&self, clutch_id: &str) -> Result<Vec<Individual>> {
        Ok(self
            .hatchlings
            .iter()
            .filter(|(clutch, _)| clutch == clutch_id)
            .filter_map(|(_, bird)| self.individuals.get(bird).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Sex;
    use crate::store::testing::{add_family, bird};

    #[test]
    fn test_lookups_follow_insertion_order() {
        let mut store = MemoryStore::new();
        for (id, sex) in [("F", Sex::Male), ("M", Sex::Female), ("A", Sex::Male), ("B", Sex::Female)] {
            store.add_individual(bird(id, sex));
        }
        add_family(&mut store, "P1", "C1", "F", "M", &["B", "A"]);

        let clutch = store.find_clutch_containing_offspring("A").unwrap().unwrap();
        assert_eq!(clutch.id, "C1");
        let ids: Vec<_> = store
            .find_offspring_for_clutch("C1")
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec!["B", "A"]);
        assert_eq!(store.find_pairings_for_individual("M").unwrap().len(), 1);
    }

    #[test]
    fn test_hatchling_link_to_missing_clutch() {
        let mut store = MemoryStore::new();
        store.add_individual(bird("A", Sex::Male));
        store.add_hatchling("gone", "A");
        assert!(store.find_clutch_containing_offspring("A").unwrap().is_none());
    }
}
