use std::fmt;
use std::str::FromStr;

use h10cm_core::types::{id_string, opt_id_string, opt_timestamp};
use h10cm_core::Timestamp;
use serde::{Deserialize, Serialize};

/// Status of one production step on one unit.
///
/// `NotApplicable` is orthogonal to the forward progression and can be
/// entered from (or left for) any other state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepStatus {
    #[serde(rename = "Not Started")]
    NotStarted,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Complete")]
    Complete,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl Default for StepStatus {
    fn default() -> Self {
        Self::NotStarted
    }
}

impl StepStatus {
    /// Wire spelling, as the backend stores it.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::NotStarted => "Not Started",
            StepStatus::InProgress => "In Progress",
            StepStatus::Complete => "Complete",
            StepStatus::NotApplicable => "N/A",
        }
    }

    /// Counts towards unit completion.
    pub fn is_done(&self) -> bool {
        matches!(self, StepStatus::Complete | StepStatus::NotApplicable)
    }

    /// Position on the forward track; `None` for N/A.
    pub fn rank(&self) -> Option<u8> {
        match self {
            StepStatus::NotStarted => Some(0),
            StepStatus::InProgress => Some(1),
            StepStatus::Complete => Some(2),
            StepStatus::NotApplicable => None,
        }
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepStatus {
    type Err = String;

    /// Accepts the wire spelling and a few CLI-friendly aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '/')
            .collect::<String>()
            .to_ascii_lowercase();
        match norm.as_str() {
            "notstarted" | "todo" => Ok(StepStatus::NotStarted),
            "inprogress" | "wip" => Ok(StepStatus::InProgress),
            "complete" | "completed" | "done" => Ok(StepStatus::Complete),
            "n/a" | "na" | "notapplicable" => Ok(StepStatus::NotApplicable),
            _ => Err(format!("unknown step status: {s}")),
        }
    }
}

/// ProductionStep: a named, ordered stage of production within a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductionStep {
    #[serde(with = "id_string")]
    pub step_id: String,

    pub step_name: String,

    /// Defines "last completed step" semantics.
    pub step_order: i32,

    #[serde(default, with = "opt_id_string", skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_description: Option<String>,
}

/// Input for creating or editing a step.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StepInput {
    pub project_id: String,
    pub step_name: String,
    pub step_order: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_description: Option<String>,
}

/// UnitStepStatus: one (unit, step) progress entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnitStepStatus {
    #[serde(with = "id_string")]
    pub step_id: String,

    #[serde(default)]
    pub status: StepStatus,

    #[serde(default, with = "opt_timestamp", skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<Timestamp>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<String>,
}

impl UnitStepStatus {
    pub fn not_started(step_id: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            status: StepStatus::NotStarted,
            completed_date: None,
            completed_by: None,
        }
    }
}

/// Ordered view over a project's steps with id lookup.
#[derive(Debug, Clone, Default)]
pub struct StepCatalog {
    steps: Vec<ProductionStep>,
}

impl StepCatalog {
    /// Build a catalog; steps are sorted by `step_order` (stable for equal orders).
    pub fn new(mut steps: Vec<ProductionStep>) -> Self {
        steps.sort_by_key(|s| s.step_order);
        Self { steps }
    }

    pub fn get(&self, step_id: &str) -> Option<&ProductionStep> {
        self.steps.iter().find(|s| s.step_id == step_id)
    }

    pub fn first(&self) -> Option<&ProductionStep> {
        self.steps.first()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProductionStep> {
        self.steps.iter()
    }

    /// Resolve a step by id or, failing that, by case-insensitive name.
    pub fn resolve(&self, key: &str) -> Option<&ProductionStep> {
        self.get(key).or_else(|| {
            self.steps
                .iter()
                .find(|s| s.step_name.eq_ignore_ascii_case(key))
        })
    }

    /// One Not Started entry per step, in catalog order.
    pub fn initial_statuses(&self) -> Vec<UnitStepStatus> {
        self.steps
            .iter()
            .map(|s| UnitStepStatus::not_started(s.step_id.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(id: &str, name: &str, order: i32) -> ProductionStep {
        ProductionStep {
            step_id: id.into(),
            step_name: name.into(),
            step_order: order,
            project_id: None,
            step_description: None,
        }
    }

    #[test]
    fn status_wire_spelling() {
        let json = serde_json::to_string(&StepStatus::NotApplicable).unwrap();
        assert_eq!(json, r#""N/A""#);
        let back: StepStatus = serde_json::from_str(r#""In Progress""#).unwrap();
        assert_eq!(back, StepStatus::InProgress);
    }

    #[test]
    fn status_aliases() {
        assert_eq!("complete".parse::<StepStatus>().unwrap(), StepStatus::Complete);
        assert_eq!("Not Started".parse::<StepStatus>().unwrap(), StepStatus::NotStarted);
        assert_eq!("in-progress".parse::<StepStatus>().unwrap(), StepStatus::InProgress);
        assert_eq!("N/A".parse::<StepStatus>().unwrap(), StepStatus::NotApplicable);
        assert!("shipped".parse::<StepStatus>().is_err());
    }

    #[test]
    fn step_status_entry_from_backend() {
        let entry: UnitStepStatus = serde_json::from_str(
            r#"{"stepId": 7, "status": "Complete", "completedDate": "2024-01-05", "completedBy": "Alice"}"#,
        )
        .unwrap();
        assert_eq!(entry.step_id, "7");
        assert_eq!(entry.status, StepStatus::Complete);
        assert_eq!(entry.completed_date.unwrap().date_string(), "2024-01-05");
        assert_eq!(entry.completed_by.as_deref(), Some("Alice"));
    }

    #[test]
    fn catalog_orders_and_resolves() {
        let catalog = StepCatalog::new(vec![
            step("s3", "Test", 3),
            step("s1", "Assembly", 1),
            step("s2", "Solder", 2),
        ]);
        let names: Vec<_> = catalog.iter().map(|s| s.step_name.as_str()).collect();
        assert_eq!(names, ["Assembly", "Solder", "Test"]);
        assert_eq!(catalog.first().unwrap().step_id, "s1");
        assert_eq!(catalog.resolve("solder").unwrap().step_id, "s2");
        assert_eq!(catalog.resolve("s3").unwrap().step_name, "Test");
        assert!(catalog.resolve("Paint").is_none());

        let initial = catalog.initial_statuses();
        assert_eq!(initial.len(), 3);
        assert!(initial.iter().all(|s| s.status == StepStatus::NotStarted));
    }
}
