//! Typed breeding records read by the genealogy engine.
//!
//! Rows come from a loosely validated store, so every constructor here checks
//! required fields and fails with [`AviaryError::MalformedRecord`] instead of
//! letting blanks travel into a traversal.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AviaryError, Result};

/// Recorded sex of a bird.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Sex::Male),
            "female" | "f" => Ok(Sex::Female),
            other => Err(format!("unknown sex '{}'", other)),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => write!(f, "male"),
            Sex::Female => write!(f, "female"),
        }
    }
}

/// Lifecycle status of a bird.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BirdStatus {
    Active,
    Inactive,
    Deceased,
}

impl FromStr for BirdStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(BirdStatus::Active),
            "inactive" => Ok(BirdStatus::Inactive),
            "deceased" => Ok(BirdStatus::Deceased),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

/// A single bird.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub id: String,
    pub name: Option<String>,
    pub species: String,
    pub sex: Sex,
    pub status: BirdStatus,
    pub ring_number: Option<String>,
    pub color_mutation: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

impl Individual {
    /// Minimal active bird, as used by adapters that only know the essentials.
    pub fn new(id: impl Into<String>, species: impl Into<String>, sex: Sex) -> Self {
        Self {
            id: id.into(),
            name: None,
            species: species.into(),
            sex,
            status: BirdStatus::Active,
            ring_number: None,
            color_mutation: None,
            birth_date: None,
        }
    }
}

/// A breeding union of one male-role and one female-role bird.
///
/// Imported pairings may name only one partner; the other role is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pairing {
    pub id: String,
    pub male_id: Option<String>,
    pub female_id: Option<String>,
    pub pair_name: Option<String>,
    pub pair_date: Option<NaiveDate>,
    pub status: String,
}

impl Pairing {
    pub fn new(id: impl Into<String>, male_id: impl Into<String>, female_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            male_id: Some(male_id.into()),
            female_id: Some(female_id.into()),
            pair_name: None,
            pair_date: None,
            status: "active".to_string(),
        }
    }

    /// Whether `individual_id` takes part in this pairing in either role.
    pub fn involves(&self, individual_id: &str) -> bool {
        self.male_id.as_deref() == Some(individual_id) || self.female_id.as_deref() == Some(individual_id)
    }
}

/// A batch of eggs laid by one pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clutch {
    pub id: String,
    /// `None` when the clutch was recorded without its pairing.
    pub pairing_id: Option<String>,
    pub clutch_number: Option<u32>,
    pub egg_laying_date: Option<NaiveDate>,
    pub eggs_laid: Option<u32>,
    pub hatched_count: Option<u32>,
}

impl Clutch {
    pub fn new(id: impl Into<String>, pairing_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pairing_id: Some(pairing_id.into()),
            clutch_number: None,
            egg_laying_date: None,
            eggs_laid: None,
            hatched_count: None,
        }
    }
}

/// Reject a NULL or blank required field.
pub(crate) fn required(
    entity: &'static str,
    id: &str,
    field: &str,
    value: Option<String>,
) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AviaryError::malformed(entity, id, format!("{} is missing", field))),
    }
}

/// A reference to another record; NULL and blank both mean "not recorded".
pub(crate) fn reference(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parse an optional `YYYY-MM-DD` field.
pub(crate) fn parse_date(
    entity: &'static str,
    id: &str,
    field: &str,
    value: Option<String>,
) -> Result<Option<NaiveDate>> {
    match value {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|e| AviaryError::malformed(entity, id, format!("{} '{}': {}", field, v, e))),
    }
}

/// Parse an optional non-negative count.
pub(crate) fn parse_count(
    entity: &'static str,
    id: &str,
    field: &str,
    value: Option<i64>,
) -> Result<Option<u32>> {
    value
        .map(|n| {
            u32::try_from(n)
                .map_err(|_| AviaryError::malformed(entity, id, format!("{} is out of range: {}", field, n)))
        })
        .transpose()
}
