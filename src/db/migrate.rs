//! Schema migrations for the breeding record tables.
//!
//! Migrations are `NNN_name.sql` files. Each one runs in its own transaction
//! and is recorded in `schema_migrations` by version, so a partially applied
//! directory resumes where it stopped.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use rusqlite::{params, Connection};

use crate::error::{AviaryError, Result};

/// Tables the genealogy engine reads.
pub const BREEDING_TABLES: &[&str] = &["birds", "breeding_pairs", "clutches", "clutch_offspring"];

const LEDGER_TABLE: &str = "schema_migrations";

#[derive(Debug)]
struct SchemaMigration {
    version: u32,
    name: String,
    sql: String,
}

impl SchemaMigration {
    /// Read one migration file; `None` for anything that is not `.sql`.
    fn from_file(path: &Path) -> Result<Option<Self>> {
        if path.extension().and_then(|s| s.to_str()) != Some("sql") {
            return Ok(None);
        }
        let name = path
            .file_stem()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AviaryError::Config(format!("Invalid migration filename: {}", path.display())))?;

        // "001_breeding_tables" -> 1
        let version = name
            .split_once('_')
            .and_then(|(prefix, _)| prefix.parse::<u32>().ok())
            .ok_or_else(|| {
                AviaryError::Config(format!("Migration {} must be named NNN_description.sql", name))
            })?;

        Ok(Some(Self {
            version,
            name: name.to_string(),
            sql: fs::read_to_string(path)?,
        }))
    }
}

fn migration_files(migrations_dir: &Path) -> Result<Vec<SchemaMigration>> {
    let mut migrations = Vec::new();
    for entry in fs::read_dir(migrations_dir)? {
        if let Some(migration) = SchemaMigration::from_file(&entry?.path())? {
            migrations.push(migration);
        }
    }
    migrations.sort_by_key(|m| m.version);

    for pair in migrations.windows(2) {
        if pair[0].version == pair[1].version {
            return Err(AviaryError::Config(format!(
                "Migrations {} and {} share version {}",
                pair[0].name, pair[1].name, pair[0].version
            )));
        }
    }
    Ok(migrations)
}

/// Versions recorded in `schema_migrations`, creating the ledger if needed.
pub fn applied_versions(conn: &Connection) -> Result<BTreeSet<u32>> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {} (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )",
        LEDGER_TABLE
    ))?;
    let mut stmt = conn.prepare(&format!("SELECT version FROM {}", LEDGER_TABLE))?;
    let versions = stmt
        .query_map([], |row| row.get::<_, u32>(0))?
        .collect::<std::result::Result<BTreeSet<_>, rusqlite::Error>>()?;
    Ok(versions)
}

/// Apply pending migrations and confirm the breeding tables exist.
///
/// Returns the names applied by this call.
pub fn run_migrations(conn: &mut Connection, migrations_dir: &Path) -> Result<Vec<String>> {
    let applied = applied_versions(conn)?;
    let mut newly_applied = Vec::new();

    for migration in migration_files(migrations_dir)? {
        if applied.contains(&migration.version) {
            log::debug!("Migration {} already applied", migration.name);
            continue;
        }

        log::info!("Applying migration {}", migration.name);
        let tx = conn.transaction()?;
        tx.execute_batch(&migration.sql).map_err(|e| {
            AviaryError::Config(format!("Migration {} failed: {}", migration.name, e))
        })?;
        tx.execute(
            &format!("INSERT INTO {} (version, name) VALUES (?1, ?2)", LEDGER_TABLE),
            params![migration.version, migration.name],
        )?;
        tx.commit()?;
        newly_applied.push(migration.name);
    }

    let missing = missing_tables(conn)?;
    if !missing.is_empty() {
        return Err(AviaryError::Config(format!(
            "Migrations in {} do not create: {}",
            migrations_dir.display(),
            missing.join(", ")
        )));
    }
    Ok(newly_applied)
}

/// Breeding tables (and the ledger) absent from the database.
pub fn missing_tables(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
    let present = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<BTreeSet<_>, rusqlite::Error>>()?;

    Ok(BREEDING_TABLES
        .iter()
        .chain(std::iter::once(&LEDGER_TABLE))
        .filter(|table| !present.contains(**table))
        .map(|table| table.to_string())
        .collect())
}
