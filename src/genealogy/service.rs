use crate::config::GenealogyConfig;
use crate::db::Db;
use crate::error::{AviaryError, Result};
use crate::genealogy::consanguinity::require_individual;
use crate::genealogy::{classify, validate_pair, CheckOptions, ConsanguinityResult, Genealogy, LineageResolver};
use crate::store::{BreedingStore, SqliteStore};

/// Async entry points over the SQLite record store.
///
/// Each call reads on blocking tasks through [`Db::with_connection`]; nothing
/// is cached between calls.
#[derive(Debug, Clone)]
pub struct GenealogyService {
    db: Db,
    settings: GenealogyConfig,
}

impl GenealogyService {
    pub fn new(db: Db, settings: GenealogyConfig) -> Self {
        Self { db, settings }
    }

    /// Fill request options from config and enforce the generation limit.
    pub fn options(&self, max_generations: Option<usize>, strict: Option<bool>) -> Result<CheckOptions> {
        let max_generations = max_generations.unwrap_or(self.settings.default_max_generations);
        if max_generations > self.settings.max_generations_limit {
            return Err(AviaryError::InvalidInput(format!(
                "max_generations {} exceeds the limit of {}",
                max_generations, self.settings.max_generations_limit
            )));
        }
        Ok(CheckOptions {
            max_generations,
            strict: strict.unwrap_or(self.settings.strict_lookup),
        })
    }

    /// The bird, its recorded parents and all of its offspring.
    ///
    /// Fails with [`AviaryError::IndividualNotFound`] for an unknown bird.
    pub async fn genealogy(&self, bird_id: &str) -> Result<Genealogy> {
        if bird_id.trim().is_empty() {
            return Err(AviaryError::InvalidInput("bird id must not be empty".to_string()));
        }
        let bird_id = bird_id.to_string();
        self.db
            .with_connection(move |conn| {
                let store = SqliteStore::new(conn);
                let individual = store
                    .get_individual(&bird_id)?
                    .ok_or_else(|| AviaryError::IndividualNotFound(bird_id.clone()))?;
                let resolver = LineageResolver::new(&store);
                let parents = resolver.resolve_parents(&bird_id)?;
                let offspring = resolver.resolve_offspring(&bird_id)?;
                Ok(Genealogy {
                    individual,
                    parents,
                    offspring,
                })
            })
            .await
    }

    /// Ancestor ids of a stored bird within `options.max_generations`.
    pub async fn ancestors(&self, bird_id: &str, options: CheckOptions) -> Result<Vec<String>> {
        self.lineage(bird_id, CheckOptions { strict: true, ..options }).await
    }

    /// Classify two birds, resolving both lineages concurrently.
    pub async fn check_consanguinity(
        &self,
        bird_a: &str,
        bird_b: &str,
        options: CheckOptions,
    ) -> Result<ConsanguinityResult> {
        validate_pair(bird_a, bird_b)?;
        let (lineage_a, lineage_b) =
            tokio::try_join!(self.lineage(bird_a, options), self.lineage(bird_b, options))?;
        Ok(classify(bird_a, bird_b, &lineage_a, &lineage_b))
    }

    async fn lineage(&self, bird_id: &str, options: CheckOptions) -> Result<Vec<String>> {
        let bird_id = bird_id.to_string();
        self.db
            .with_connection(move |conn| {
                let store = SqliteStore::new(conn);
                if options.strict {
                    require_individual(&store, &bird_id)?;
                }
                LineageResolver::new(&store).resolve_ancestors(&bird_id, options.max_generations)
            })
            .await
    }
}
