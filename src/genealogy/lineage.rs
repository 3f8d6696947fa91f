use crate::error::Result;
use crate::genealogy::Parentage;
use crate::records::{Individual, Pairing, Sex};
use crate::store::BreedingStore;

/// Walks the breeding graph backward (parents, ancestors) and forward
/// (offspring) from one bird.
pub struct LineageResolver<'s, S: BreedingStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: BreedingStore + ?Sized> LineageResolver<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &'s S {
        self.store
    }

    /// Resolve the recorded parents of `individual_id`.
    ///
    /// Returns `None` when the bird has no hatchling link or its clutch's
    /// pairing is unrecorded or not stored. Unknown birds land in the same case.
    pub fn resolve_parents(&self, individual_id: &str) -> Result<Option<Parentage>> {
        let clutch = match self.store.find_clutch_containing_offspring(individual_id)? {
            Some(clutch) => clutch,
            None => {
                log::debug!("No hatchling record for {}; parentage unknown", individual_id);
                return Ok(None);
            }
        };

        let pairing_id = match clutch.pairing_id.as_deref() {
            Some(id) => id,
            None => {
                log::warn!("Clutch {} has no breeding pair recorded", clutch.id);
                return Ok(None);
            }
        };
        let pairing = match self.store.get_pairing(pairing_id)? {
            Some(pairing) => pairing,
            None => {
                log::warn!("Clutch {} references missing breeding pair {}", clutch.id, pairing_id);
                return Ok(None);
            }
        };

        let father = self.lookup_parent(pairing.male_id.as_deref())?;
        let mother = self.lookup_parent(pairing.female_id.as_deref())?;
        warn_on_role_mismatch(&pairing, father.as_ref(), mother.as_ref());

        Ok(Some(Parentage {
            father,
            mother,
            pairing,
            clutch,
        }))
    }

    fn lookup_parent(&self, parent_id: Option<&str>) -> Result<Option<Individual>> {
        match parent_id {
            Some(id) => self.store.get_individual(id),
            None => Ok(None),
        }
    }

    /// Every stored hatchling of every clutch of every pairing `individual_id`
    /// took part in, ordered by pairing, then clutch, then hatchling.
    pub fn resolve_offspring(&self, individual_id: &str) -> Result<Vec<Individual>> {
        let mut offspring = Vec::new();
        for pairing in self.store.find_pairings_for_individual(individual_id)? {
            for clutch in self.store.find_clutches_for_pairing(&pairing.id)? {
                offspring.extend(self.store.find_offspring_for_clutch(&clutch.id)?);
            }
        }
        Ok(offspring)
    }

    /// Ancestor ids of `individual_id` up to `max_generations` parent hops.
    ///
    /// Father and mother are collected at every generation reached. The same
    /// ancestor appears once per path it is reachable through.
    pub fn resolve_ancestors(&self, individual_id: &str, max_generations: usize) -> Result<Vec<String>> {
        let mut ancestors = Vec::new();
        let mut path = Vec::new();
        self.collect_ancestors(individual_id, 0, max_generations, &mut path, &mut ancestors)?;
        log::debug!(
            "Resolved {} ancestor entries for {} within {} generations",
            ancestors.len(),
            individual_id,
            max_generations
        );
        Ok(ancestors)
    }

    fn collect_ancestors(
        &self,
        individual_id: &str,
        generation: usize,
        max_generations: usize,
        path: &mut Vec<String>,
        ancestors: &mut Vec<String>,
    ) -> Result<()> {
        if generation >= max_generations {
            return Ok(());
        }
        let parentage = match self.resolve_parents(individual_id)? {
            Some(parentage) => parentage,
            None => return Ok(()),
        };

        path.push(individual_id.to_string());
        for parent_id in parentage.parent_ids() {
            ancestors.push(parent_id.to_string());
            // A bird already on this path has its ancestry being collected above us.
            if path.iter().any(|id| id == parent_id) {
                log::warn!(
                    "Lineage cycle: {} is recorded as its own ancestor via {}",
                    parent_id,
                    individual_id
                );
                continue;
            }
            self.collect_ancestors(parent_id, generation + 1, max_generations, path, ancestors)?;
        }
        path.pop();
        Ok(())
    }
}

fn warn_on_role_mismatch(pairing: &Pairing, father: Option<&Individual>, mother: Option<&Individual>) {
    if let Some(bird) = father.filter(|b| b.sex != Sex::Male) {
        log::warn!(
            "Breeding pair {} lists {} as male but the bird is recorded as {}",
            pairing.id,
            bird.id,
            bird.sex
        );
    }
    if let Some(bird) = mother.filter(|b| b.sex != Sex::Female) {
        log::warn!(
            "Breeding pair {} lists {} as female but the bird is recorded as {}",
            pairing.id,
            bird.id,
            bird.sex
        );
    }
}
