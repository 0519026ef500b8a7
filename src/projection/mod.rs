//! Record projection engine
//!
//! Reduces a full health record to the fields a capability set permits.
//! Pure and deterministic: no I/O, no knowledge of roles.
//!
//! - full view: the record unchanged
//! - limited view: `id`, `record_date`, `period_flow`, `symptoms`, `notes`
//! - no view: the record is excluded
//!
//! Dropped fields are absent from the projected type itself, not nulled,
//! so nothing downstream can mistake a hidden mood for "no mood recorded".

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::permissions::{CapabilitySet, Visibility};
use crate::records::{HealthRecord, PeriodFlow, Symptom};

/// Fields a limited viewer may see
pub const LIMITED_FIELDS: &[&str] = &["id", "record_date", "period_flow", "symptoms", "notes"];

/// Every persisted record field
pub const FULL_FIELDS: &[&str] = &[
    "id",
    "user_id",
    "record_date",
    "period_flow",
    "symptoms",
    "mood",
    "notes",
    "created_at",
];

/// Fields requested from the store for a limited viewer. Adds the owner
/// key and insertion time needed for grouping and ordering; never `mood`.
pub const LIMITED_WIRE_FIELDS: &[&str] = &[
    "id",
    "user_id",
    "record_date",
    "period_flow",
    "symptoms",
    "notes",
    "created_at",
];

/// Field list a store query must respect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSet {
    Full,
    Limited,
}

impl FieldSet {
    /// Field set for a capability set, `None` when nothing may be fetched
    pub fn for_capabilities(caps: &CapabilitySet) -> Option<Self> {
        match caps.visibility() {
            Visibility::Full => Some(FieldSet::Full),
            Visibility::Limited => Some(FieldSet::Limited),
            Visibility::None => None,
        }
    }

    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            FieldSet::Full => FULL_FIELDS,
            FieldSet::Limited => LIMITED_WIRE_FIELDS,
        }
    }

    pub fn includes(&self, field: &str) -> bool {
        self.fields().contains(&field)
    }
}

/// Record as seen by a limited viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimitedRecord {
    pub id: String,
    pub record_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period_flow: Option<PeriodFlow>,
    pub symptoms: BTreeSet<Symptom>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl From<HealthRecord> for LimitedRecord {
    fn from(record: HealthRecord) -> Self {
        Self {
            id: record.id,
            record_date: record.record_date,
            period_flow: record.period_flow,
            symptoms: record.symptoms,
            notes: record.notes,
        }
    }
}

/// Result of projecting one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ProjectedRecord {
    Full(HealthRecord),
    Limited(LimitedRecord),
}

impl ProjectedRecord {
    pub fn record_date(&self) -> NaiveDate {
        match self {
            ProjectedRecord::Full(r) => r.record_date,
            ProjectedRecord::Limited(r) => r.record_date,
        }
    }
}

/// Project a record for a viewer. `None` means the viewer may not see it.
pub fn project(record: HealthRecord, caps: &CapabilitySet) -> Option<ProjectedRecord> {
    match caps.visibility() {
        Visibility::Full => Some(ProjectedRecord::Full(record)),
        Visibility::Limited => Some(ProjectedRecord::Limited(record.into())),
        Visibility::None => None,
    }
}

/// Project a batch, dropping records the viewer may not see
pub fn project_all(
    records: impl IntoIterator<Item = HealthRecord>,
    caps: &CapabilitySet,
) -> Vec<ProjectedRecord> {
    records
        .into_iter()
        .filter_map(|record| project(record, caps))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Mood;
    use chrono::Utc;
    use proptest::prelude::*;

    fn sample() -> HealthRecord {
        HealthRecord {
            id: "rec-1".into(),
            user_id: "owner-1".into(),
            record_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            period_flow: Some(PeriodFlow::Heavy),
            symptoms: [Symptom::Cramps, Symptom::Fatigue].into_iter().collect(),
            mood: Some(Mood::Calm),
            notes: Some("rest day".into()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_full_is_identity() {
        let record = sample();
        let caps = CapabilitySet {
            can_view_full: true,
            can_view_limited: false,
            can_update: false,
        };
        assert_eq!(
            project(record.clone(), &caps),
            Some(ProjectedRecord::Full(record))
        );
    }

    #[test]
    fn test_limited_drops_mood_key() {
        let projected = project(sample(), &CapabilitySet::limited()).unwrap();
        let json = serde_json::to_value(&projected).unwrap();
        let obj = json.as_object().unwrap();

        assert!(!obj.contains_key("mood"));
        assert!(!obj.contains_key("user_id"));
        assert!(!obj.contains_key("created_at"));
        assert_eq!(obj["period_flow"], "heavy");
        assert_eq!(obj["notes"], "rest day");
        assert_eq!(obj["record_date"], "2024-05-01");
        assert_eq!(obj["symptoms"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_limited_keys_subset_of_limited_fields() {
        let projected = project(sample(), &CapabilitySet::limited()).unwrap();
        let json = serde_json::to_value(&projected).unwrap();
        for key in json.as_object().unwrap().keys() {
            assert!(LIMITED_FIELDS.contains(&key.as_str()), "unexpected key {key}");
        }
    }

    #[test]
    fn test_no_visibility_excludes() {
        assert!(project(sample(), &CapabilitySet::restricted()).is_none());

        let update_only = CapabilitySet {
            can_view_full: false,
            can_view_limited: false,
            can_update: true,
        };
        assert!(project(sample(), &update_only).is_none());
    }

    #[test]
    fn test_project_all_filters() {
        let records = vec![sample(), sample()];
        assert!(project_all(records.clone(), &CapabilitySet::restricted()).is_empty());
        assert_eq!(project_all(records, &CapabilitySet::limited()).len(), 2);
    }

    #[test]
    fn test_field_sets() {
        assert_eq!(
            FieldSet::for_capabilities(&CapabilitySet::restricted()),
            None
        );
        assert_eq!(
            FieldSet::for_capabilities(&CapabilitySet::limited()),
            Some(FieldSet::Limited)
        );
        assert!(!FieldSet::Limited.includes("mood"));
        assert!(FieldSet::Full.includes("mood"));
        for field in LIMITED_FIELDS {
            assert!(FieldSet::Limited.includes(field));
        }
    }

    fn any_flow() -> impl Strategy<Value = PeriodFlow> {
        prop_oneof![
            Just(PeriodFlow::Light),
            Just(PeriodFlow::Medium),
            Just(PeriodFlow::Heavy),
        ]
    }

    fn any_mood() -> impl Strategy<Value = Mood> {
        prop_oneof![
            Just(Mood::Happy),
            Just(Mood::Sensitive),
            Just(Mood::Irritable),
            Just(Mood::Anxious),
            Just(Mood::Calm),
        ]
    }

    fn any_symptom() -> impl Strategy<Value = Symptom> {
        prop_oneof![
            Just(Symptom::Cramps),
            Just(Symptom::Headache),
            Just(Symptom::Fatigue),
            Just(Symptom::Bloating),
            Just(Symptom::MoodSwings),
            Just(Symptom::BackPain),
            Just(Symptom::BreastTenderness),
        ]
    }

    prop_compose! {
        fn any_record()(
            id in "[a-z0-9-]{1,12}",
            day in 0u32..3650,
            period_flow in proptest::option::of(any_flow()),
            symptoms in proptest::collection::btree_set(any_symptom(), 0..=7),
            mood in proptest::option::of(any_mood()),
            notes in proptest::option::of("\\PC{0,40}"),
        ) -> HealthRecord {
            HealthRecord {
                id,
                user_id: "owner-1".into(),
                record_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
                    + chrono::Days::new(u64::from(day)),
                period_flow,
                symptoms,
                mood,
                notes,
                created_at: Utc::now(),
            }
        }
    }

    fn any_caps() -> impl Strategy<Value = CapabilitySet> {
        (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(full, limited, update)| {
            CapabilitySet {
                can_view_full: full,
                can_view_limited: limited,
                can_update: update,
            }
        })
    }

    proptest! {
        #[test]
        fn prop_full_view_is_identity(record in any_record(), limited in any::<bool>()) {
            let caps = CapabilitySet {
                can_view_full: true,
                can_view_limited: limited,
                can_update: false,
            };
            prop_assert_eq!(project(record.clone(), &caps), Some(ProjectedRecord::Full(record)));
        }

        #[test]
        fn prop_limited_view_never_leaks_mood(record in any_record()) {
            let expected = record.clone();
            let projected = project(record, &CapabilitySet::limited());
            let limited = match projected {
                Some(ProjectedRecord::Limited(limited)) => limited,
                other => return Err(TestCaseError::fail(format!("expected limited, got {other:?}"))),
            };
            prop_assert_eq!(&limited.id, &expected.id);
            prop_assert_eq!(limited.record_date, expected.record_date);
            prop_assert_eq!(limited.period_flow, expected.period_flow);
            prop_assert_eq!(&limited.symptoms, &expected.symptoms);
            prop_assert_eq!(&limited.notes, &expected.notes);

            let json = serde_json::to_value(&limited).unwrap();
            for key in json.as_object().unwrap().keys() {
                prop_assert!(LIMITED_FIELDS.contains(&key.as_str()), "unexpected key {}", key);
            }
        }

        #[test]
        fn prop_no_view_capability_excludes(record in any_record(), update in any::<bool>()) {
            let caps = CapabilitySet {
                can_view_full: false,
                can_view_limited: false,
                can_update: update,
            };
            prop_assert!(project(record, &caps).is_none());
        }

        #[test]
        fn prop_projection_follows_visibility(record in any_record(), caps in any_caps()) {
            let projected = project(record, &caps);
            match caps.visibility() {
                Visibility::Full => prop_assert!(matches!(projected, Some(ProjectedRecord::Full(_)))),
                Visibility::Limited => prop_assert!(matches!(projected, Some(ProjectedRecord::Limited(_)))),
                Visibility::None => prop_assert!(projected.is_none()),
            }
        }
    }
}
