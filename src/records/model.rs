//! Health record data model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::types::CareShareError;

/// Menstrual flow level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodFlow {
    Light,
    Medium,
    Heavy,
}

/// Self-reported mood
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Sensitive,
    Irritable,
    Anxious,
    Calm,
}

/// Fixed symptom vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Symptom {
    Cramps,
    Headache,
    Fatigue,
    Bloating,
    #[serde(rename = "Mood Swings")]
    MoodSwings,
    #[serde(rename = "Back Pain")]
    BackPain,
    #[serde(rename = "Breast Tenderness")]
    BreastTenderness,
}

impl Symptom {
    pub fn as_str(&self) -> &'static str {
        match self {
            Symptom::Cramps => "Cramps",
            Symptom::Headache => "Headache",
            Symptom::Fatigue => "Fatigue",
            Symptom::Bloating => "Bloating",
            Symptom::MoodSwings => "Mood Swings",
            Symptom::BackPain => "Back Pain",
            Symptom::BreastTenderness => "Breast Tenderness",
        }
    }
}

impl fmt::Display for Symptom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted health record. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub id: String,
    /// Owner of the record
    pub user_id: String,
    pub record_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_flow: Option<PeriodFlow>,
    #[serde(default)]
    pub symptoms: BTreeSet<Symptom>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<Mood>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Owner input for tracking a day
#[derive(Debug, Clone, Deserialize)]
pub struct NewHealthRecord {
    pub record_date: NaiveDate,
    #[serde(default)]
    pub period_flow: Option<PeriodFlow>,
    #[serde(default)]
    pub symptoms: Vec<Symptom>,
    #[serde(default)]
    pub mood: Option<Mood>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Longest accepted free-text note
pub const MAX_NOTES_LEN: usize = 4000;

impl NewHealthRecord {
    /// Validate the input and turn it into a record owned by `user_id`
    pub fn into_record(self, user_id: &str) -> Result<HealthRecord, CareShareError> {
        let notes = self
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        if notes.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTES_LEN) {
            return Err(CareShareError::BadRequest(format!(
                "Notes must be at most {} characters",
                MAX_NOTES_LEN
            )));
        }

        Ok(HealthRecord {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            record_date: self.record_date,
            period_flow: self.period_flow,
            symptoms: self.symptoms.into_iter().collect(),
            mood: self.mood,
            notes,
            created_at: Utc::now(),
        })
    }
}
