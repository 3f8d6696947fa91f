use rusqlite::{params, Connection, OptionalExtension, Row};

use super::BreedingStore;
use crate::error::{AviaryError, Result};
use crate::records::{self, Clutch, Individual, Pairing, Sex};

const BIRD_COLUMNS: &str =
    "b.id, b.name, b.species, b.sex, b.status, b.ring_number, b.color_mutation, b.birth_date";
const PAIR_COLUMNS: &str = "p.id, p.male_bird_id, p.female_bird_id, p.pair_name, p.pair_date, p.status";
const CLUTCH_COLUMNS: &str =
    "c.id, c.breeding_pair_id, c.clutch_number, c.egg_laying_date, c.eggs_laid, c.hatched_count";

/// [`BreedingStore`] over a borrowed SQLite connection.
pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteStore<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    fn query_birds(&self, sql: &str, key: &str) -> Result<Vec<Individual>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map([key], BirdRow::read)?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        rows.into_iter().map(BirdRow::validate).collect()
    }

    fn query_pairs(&self, sql: &str, key: &str) -> Result<Vec<Pairing>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map([key], PairRow::read)?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        rows.into_iter().map(PairRow::validate).collect()
    }

    fn query_clutches(&self, sql: &str, key: &str) -> Result<Vec<Clutch>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map([key], ClutchRow::read)?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        rows.into_iter().map(ClutchRow::validate).collect()
    }
}

impl BreedingStore for SqliteStore<'_> {
    fn get_individual(&self, id: &str) -> Result<Option<Individual>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM birds b WHERE b.id = ?1", BIRD_COLUMNS),
                params![id],
                BirdRow::read,
            )
            .optional()?;
        row.map(BirdRow::validate).transpose()
    }

    fn find_clutch_containing_offspring(&self, individual_id: &str) -> Result<Option<Clutch>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM clutch_offspring o \
             JOIN clutches c ON c.id = o.clutch_id \
             WHERE o.bird_id = ?1 ORDER BY o.rowid",
            CLUTCH_COLUMNS
        ))?;
        let mut rows = stmt
            .query_map([individual_id], ClutchRow::read)?
            .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
        if rows.len() > 1 {
            log::warn!(
                "Bird {} is listed as a hatchling of {} clutches; using {}",
                individual_id,
                rows.len(),
                rows[0].id
            );
        }
        // Later links are ignored, so only the first is validated.
        if rows.is_empty() {
            return Ok(None);
        }
        rows.swap_remove(0).validate().map(Some)
    }

    fn get_pairing(&self, id: &str) -> Result<Option<Pairing>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM breeding_pairs p WHERE p.id = ?1", PAIR_COLUMNS),
                params![id],
                PairRow::read,
            )
            .optional()?;
        row.map(PairRow::validate).transpose()
    }

    fn find_pairings_for_individual(&self, individual_id: &str) -> Result<Vec<Pairing>> {
        self.query_pairs(
            &format!(
                "SELECT {} FROM breeding_pairs p \
                 WHERE p.male_bird_id = ?1 OR p.female_bird_id = ?1 ORDER BY p.rowid",
                PAIR_COLUMNS
            ),
            individual_id,
        )
    }

    fn find_clutches_for_pairing(&self, pairing_id: &str) -> Result<Vec<Clutch>> {
        self.query_clutches(
            &format!(
                "SELECT {} FROM clutches c WHERE c.breeding_pair_id = ?1 ORDER BY c.rowid",
                CLUTCH_COLUMNS
            ),
            pairing_id,
        )
    }

    fn find_offspring_for_clutch(&self, clutch_id: &str) -> Result<Vec<Individual>> {
        self.query_birds(
            &format!(
                "SELECT {} FROM clutch_offspring o \
                 JOIN birds b ON b.id = o.bird_id \
                 WHERE o.clutch_id = ?1 ORDER BY o.rowid",
                BIRD_COLUMNS
            ),
            clutch_id,
        )
    }
}

/// Raw `birds` row before validation.
struct BirdRow {
    id: String,
    name: Option<String>,
    species: Option<String>,
    sex: Option<String>,
    status: Option<String>,
    ring_number: Option<String>,
    color_mutation: Option<String>,
    birth_date: Option<String>,
}

impl BirdRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            species: row.get(2)?,
            sex: row.get(3)?,
            status: row.get(4)?,
            ring_number: row.get(5)?,
            color_mutation: row.get(6)?,
            birth_date: row.get(7)?,
        })
    }

    fn validate(self) -> Result<Individual> {
        let species = records::required("bird", &self.id, "species", self.species)?;
        let sex: Sex = records::required("bird", &self.id, "sex", self.sex)?
            .parse()
            .map_err(|e| AviaryError::malformed("bird", &self.id, e))?;
        let status = match self.status {
            Some(s) => s
                .parse::<records::BirdStatus>()
                .map_err(|e| AviaryError::malformed("bird", &self.id, e))?,
            None => records::BirdStatus::Active,
        };
        let birth_date = records::parse_date("bird", &self.id, "birth_date", self.birth_date)?;

        Ok(Individual {
            id: self.id,
            name: self.name,
            species,
            sex,
            status,
            ring_number: self.ring_number,
            color_mutation: self.color_mutation,
            birth_date,
        })
    }
}

/// Raw `breeding_pairs` row before validation.
struct PairRow {
    id: String,
    male_id: Option<String>,
    female_id: Option<String>,
    pair_name: Option<String>,
    pair_date: Option<String>,
    status: Option<String>,
}

impl PairRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            male_id: row.get(1)?,
            female_id: row.get(2)?,
            pair_name: row.get(3)?,
            pair_date: row.get(4)?,
            status: row.get(5)?,
        })
    }

    fn validate(self) -> Result<Pairing> {
        let male_id = records::reference(self.male_id);
        let female_id = records::reference(self.female_id);
        if male_id.is_none() || female_id.is_none() {
            log::debug!("Breeding pair {} is missing a partner", self.id);
        }
        let pair_date = records::parse_date("breeding pair", &self.id, "pair_date", self.pair_date)?;

        Ok(Pairing {
            id: self.id,
            male_id,
            female_id,
            pair_name: self.pair_name,
            pair_date,
            status: self.status.unwrap_or_else(|| "active".to_string()),
        })
    }
}

/// Raw `clutches` row before validation.
struct ClutchRow {
    id: String,
    pairing_id: Option<String>,
    clutch_number: Option<i64>,
    egg_laying_date: Option<String>,
    eggs_laid: Option<i64>,
    hatched_count: Option<i64>,
}

impl ClutchRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            pairing_id: row.get(1)?,
            clutch_number: row.get(2)?,
            egg_laying_date: row.get(3)?,
            eggs_laid: row.get(4)?,
            hatched_count: row.get(5)?,
        })
    }

    fn validate(self) -> Result<Clutch> {
        let pairing_id = records::reference(self.pairing_id);
        let clutch_number = records::parse_count("clutch", &self.id, "clutch_number", self.clutch_number)?;
        let egg_laying_date =
            records::parse_date("clutch", &self.id, "egg_laying_date", self.egg_laying_date)?;
        let eggs_laid = records::parse_count("clutch", &self.id, "eggs_laid", self.eggs_laid)?;
        let hatched_count = records::parse_count("clutch", &self.id, "hatched_count", self.hatched_count)?;

        Ok(Clutch {
            id: self.id,
            pairing_id,
            clutch_number,
            egg_laying_date,
            eggs_laid,
            hatched_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genealogy::{CheckOptions, ConsanguinityChecker, LineageResolver};
    use crate::store::testing::{insert_bird, insert_family, migrated_connection, seed_aviary};
    use chrono::NaiveDate;

    #[test]
    fn test_get_individual() {
        let conn = migrated_connection();
        seed_aviary(&conn);
        let store = SqliteStore::new(&conn);

        let bird = store.get_individual("A").unwrap().unwrap();
        assert_eq!(bird.sex, Sex::Male);
        assert_eq!(bird.species, "African Grey");
        assert_eq!(bird.name.as_deref(), Some("Bird A"));
        assert!(store.get_individual("nope").unwrap().is_none());
    }

    #[test]
    fn test_clutch_containing_offspring() {
        let conn = migrated_connection();
        seed_aviary(&conn);
        let store = SqliteStore::new(&conn);

        let clutch = store.find_clutch_containing_offspring("A").unwrap().unwrap();
        assert_eq!(clutch.id, "C1");
        assert_eq!(clutch.pairing_id.as_deref(), Some("P1"));
        assert_eq!(clutch.egg_laying_date, NaiveDate::from_ymd_opt(2022, 5, 10));
        assert_eq!(clutch.eggs_laid, Some(4));
        assert!(store.find_clutch_containing_offspring("GF").unwrap().is_none());
    }

    #[test]
    fn test_hatchling_in_two_clutches_uses_first() {
        let conn = migrated_connection();
        insert_bird(&conn, "A", "male");
        insert_family(&conn, "P1", "C1", "F", "M", &["A"]);
        insert_family(&conn, "P2", "C2", "G", "H", &["A"]);
        let store = SqliteStore::new(&conn);

        let clutch = store.find_clutch_containing_offspring("A").unwrap().unwrap();
        assert_eq!(clutch.id, "C1");
    }

    #[test]
    fn test_pairings_for_individual_either_role() {
        let conn = migrated_connection();
        seed_aviary(&conn);
        insert_family(&conn, "P3", "C3", "X", "M", &[]);
        let store = SqliteStore::new(&conn);

        let ids: Vec<_> = store
            .find_pairings_for_individual("M")
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec!["P1", "P3"]);
        assert!(store.find_pairings_for_individual("Z").unwrap().is_empty());
    }

    #[test]
    fn test_offspring_for_clutch_skips_unstored_birds() {
        let conn = migrated_connection();
        seed_aviary(&conn);
        conn.execute(
            "INSERT INTO clutch_offspring (clutch_id, bird_id) VALUES ('C1', 'ghost')",
            [],
        )
        .unwrap();
        let store = SqliteStore::new(&conn);

        let ids: Vec<_> = store
            .find_offspring_for_clutch("C1")
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec!["A", "B"]);
    }

    #[test]
    fn test_malformed_bird_fails_fast() {
        let conn = migrated_connection();
        conn.execute(
            "INSERT INTO birds (id, species, sex) VALUES ('odd', 'Cockatiel', 'unknown')",
            [],
        )
        .unwrap();
        conn.execute("INSERT INTO birds (id, species) VALUES ('nosex', 'Cockatiel')", [])
            .unwrap();
        let store = SqliteStore::new(&conn);

        assert!(matches!(
            store.get_individual("odd"),
            Err(AviaryError::MalformedRecord { entity: "bird", .. })
        ));
        assert!(matches!(
            store.get_individual("nosex"),
            Err(AviaryError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_hatchling_ignored_second_clutch_not_validated() {
        let conn = migrated_connection();
        insert_bird(&conn, "A", "male");
        insert_family(&conn, "P1", "C1", "F", "M", &["A"]);
        conn.execute(
            "INSERT INTO clutches (id, breeding_pair_id, eggs_laid) VALUES ('C2', 'P1', -3)",
            [],
        )
        .unwrap();
        conn.execute("INSERT INTO clutch_offspring (clutch_id, bird_id) VALUES ('C2', 'A')", [])
            .unwrap();
        let store = SqliteStore::new(&conn);

        let clutch = store.find_clutch_containing_offspring("A").unwrap().unwrap();
        assert_eq!(clutch.id, "C1");
    }

    #[test]
    fn test_pairing_missing_partner_reads_as_absent() {
        let conn = migrated_connection();
        conn.execute(
            "INSERT INTO breeding_pairs (id, male_bird_id) VALUES ('P9', 'F')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO breeding_pairs (id, male_bird_id, female_bird_id) VALUES ('P10', '  ', 'M')",
            [],
        )
        .unwrap();
        let store = SqliteStore::new(&conn);

        let pairing = store.get_pairing("P9").unwrap().unwrap();
        assert_eq!(pairing.male_id.as_deref(), Some("F"));
        assert!(pairing.female_id.is_none());
        let pairing = store.get_pairing("P10").unwrap().unwrap();
        assert!(pairing.male_id.is_none());
        assert_eq!(pairing.female_id.as_deref(), Some("M"));
    }

    #[test]
    fn test_clutch_without_pairing_reads_as_absent() {
        let conn = migrated_connection();
        insert_bird(&conn, "A", "male");
        conn.execute("INSERT INTO clutches (id) VALUES ('C9')", []).unwrap();
        conn.execute("INSERT INTO clutch_offspring (clutch_id, bird_id) VALUES ('C9', 'A')", [])
            .unwrap();
        let store = SqliteStore::new(&conn);

        let clutch = store.find_clutch_containing_offspring("A").unwrap().unwrap();
        assert!(clutch.pairing_id.is_none());
    }

    #[test]
    fn test_partial_records_do_not_abort_lineage() {
        let conn = migrated_connection();
        for (id, sex) in [("GF", "male"), ("F", "male"), ("M", "female"), ("A", "male"), ("U", "female")] {
            insert_bird(&conn, id, sex);
        }
        conn.execute("INSERT INTO breeding_pairs (id, male_bird_id) VALUES ('P0', 'GF')", [])
            .unwrap();
        conn.execute("INSERT INTO clutches (id, breeding_pair_id) VALUES ('C0', 'P0')", [])
            .unwrap();
        conn.execute("INSERT INTO clutch_offspring (clutch_id, bird_id) VALUES ('C0', 'F')", [])
            .unwrap();
        insert_family(&conn, "P1", "C1", "F", "M", &["A"]);
        let store = SqliteStore::new(&conn);

        let parents = LineageResolver::new(&store).resolve_parents("F").unwrap().unwrap();
        assert_eq!(parents.father.unwrap().id, "GF");
        assert!(parents.mother.is_none());

        let verdict = ConsanguinityChecker::new(&store)
            .check("A", "U", CheckOptions::default())
            .unwrap();
        assert!(!verdict.is_related);
        assert_eq!(
            LineageResolver::new(&store).resolve_ancestors("A", 3).unwrap(),
            vec!["F", "GF", "M"]
        );
    }
}
