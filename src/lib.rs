pub mod config;
pub mod error;
pub mod db;
pub mod records;
pub mod store;
pub mod genealogy;
pub mod http;

pub use config::Config;
pub use error::{AviaryError, Result};
pub use genealogy::{
    CheckOptions, ConsanguinityResult, Genealogy, GenealogyService, Parentage, RelationshipLevel,
};
pub use store::{BreedingStore, MemoryStore, SqliteStore};
