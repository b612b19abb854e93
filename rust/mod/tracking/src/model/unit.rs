use std::collections::BTreeMap;

use h10cm_core::types::{id_string, opt_timestamp};
use h10cm_core::Timestamp;
use serde::{Deserialize, Deserializer, Serialize};

use super::attribute::attribute_map;
use super::step::{StepStatus, UnitStepStatus};

/// ProductionUnit: a serialized physical item tracked through production steps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductionUnit {
    #[serde(with = "id_string")]
    pub item_id: String,

    pub unit_serial_number: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pcb_serial_number: Option<String>,

    /// Absent or `null` on the wire reads as an empty list.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub step_statuses: Vec<UnitStepStatus>,

    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_shipped: bool,

    #[serde(default, with = "opt_timestamp", skip_serializing_if = "Option::is_none")]
    pub shipped_date: Option<Timestamp>,

    /// Cached by the backend; recomputed locally, see [`crate::progress`].
    #[serde(default, with = "opt_timestamp", skip_serializing_if = "Option::is_none")]
    pub date_fully_completed: Option<Timestamp>,

    /// Attribute definition id -> value.
    #[serde(default, with = "attribute_map", skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl ProductionUnit {
    /// Status entry for a step, if the unit carries one.
    pub fn step_status(&self, step_id: &str) -> Option<&UnitStepStatus> {
        self.step_statuses.iter().find(|s| s.step_id == step_id)
    }

    /// Effective status for a step; a missing entry reads as Not Started.
    pub fn status_of(&self, step_id: &str) -> StepStatus {
        self.step_status(step_id)
            .map(|s| s.status)
            .unwrap_or(StepStatus::NotStarted)
    }
}

/// Body of a unit creation request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewUnit {
    pub project_id: String,
    pub unit_serial_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pcb_serial_number: Option<String>,
    pub step_statuses: Vec<UnitStepStatus>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// SQL backends hand booleans back as 0/1.
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Int(i64),
        Text(String),
    }
    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => false,
        Some(Raw::Bool(b)) => b,
        Some(Raw::Int(n)) => n != 0,
        Some(Raw::Text(s)) => matches!(s.to_ascii_lowercase().as_str(), "true" | "1" | "yes"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_from_sparse_backend_row() {
        let unit: ProductionUnit = serde_json::from_str(
            r#"{"item_id": 101, "unit_serial_number": "PR-001", "is_shipped": 0, "step_statuses": null}"#,
        )
        .unwrap();
        assert_eq!(unit.item_id, "101");
        assert!(!unit.is_shipped);
        assert!(unit.step_statuses.is_empty());
        assert!(unit.attributes.is_empty());
        assert_eq!(unit.status_of("any"), StepStatus::NotStarted);
    }

    #[test]
    fn unit_json_roundtrip() {
        let unit = ProductionUnit {
            item_id: "u1".into(),
            unit_serial_number: "PR-001".into(),
            pcb_serial_number: Some("PCB-001".into()),
            step_statuses: vec![UnitStepStatus {
                step_id: "s1".into(),
                status: StepStatus::Complete,
                completed_date: Timestamp::parse("2024-01-01"),
                completed_by: Some("Alice".into()),
            }],
            is_shipped: true,
            shipped_date: Timestamp::parse("2024-02-01"),
            date_fully_completed: Timestamp::parse("2024-01-01"),
            attributes: BTreeMap::from([("1".to_string(), "rev B".to_string())]),
        };
        let json = serde_json::to_string(&unit).unwrap();
        let back: ProductionUnit = serde_json::from_str(&json).unwrap();
        assert_eq!(unit, back);
    }
}
