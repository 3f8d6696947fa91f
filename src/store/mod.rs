//! Read-only access to stored breeding records.
//!
//! The genealogy engine never reaches for a global connection; callers hand it
//! something implementing [`BreedingStore`].

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::records::{Clutch, Individual, Pairing};

/// Lookups the genealogy engine needs from the record store.
///
/// Absent records are `Ok(None)` or an empty `Vec`, never an error. Errors are
/// reserved for storage failures and malformed rows.
pub trait BreedingStore {
    fn get_individual(&self, id: &str) -> Result<Option<Individual>>;

    /// Clutch that lists `individual_id` as a hatchling.
    fn find_clutch_containing_offspring(&self, individual_id: &str) -> Result<Option<Clutch>>;

    fn get_pairing(&self, id: &str) -> Result<Option<Pairing>>;

    /// Pairings where `individual_id` is the male or the female, in insertion order.
    fn find_pairings_for_individual(&self, individual_id: &str) -> Result<Vec<Pairing>>;

    /// Clutches of a pairing, in insertion order.
    fn find_clutches_for_pairing(&self, pairing_id: &str) -> Result<Vec<Clutch>>;

    /// Stored hatchlings of a clutch, in insertion order.
    fn find_offspring_for_clutch(&self, clutch_id: &str) -> Result<Vec<Individual>>;
}
