//! Step-progress derivation: completion, buckets and last completed step.
//!
//! Everything here is a pure function of the unit data handed in; nothing
//! is remembered between calls.

use std::fmt;
use std::str::FromStr;

use h10cm_core::Timestamp;
use serde::Serialize;

use crate::model::{ProductionUnit, StepCatalog, StepStatus};
use crate::serial::natural_cmp;

/// A unit is complete when it has at least one status entry and every
/// entry is Complete or N/A. No data never counts as complete.
pub fn is_complete(unit: &ProductionUnit) -> bool {
    !unit.step_statuses.is_empty() && unit.step_statuses.iter().all(|s| s.status.is_done())
}

/// Latest `completedDate` among Complete entries of a complete unit.
///
/// `None` for incomplete units, and for complete units where no Complete
/// entry carries a date (e.g. every step is N/A).
pub fn overall_completion_date(unit: &ProductionUnit) -> Option<Timestamp> {
    if !is_complete(unit) {
        return None;
    }
    unit.step_statuses
        .iter()
        .filter(|s| s.status == StepStatus::Complete)
        .filter_map(|s| s.completed_date)
        .max()
}

/// Bring the cached `date_fully_completed` in line with the statuses.
/// Returns true if the field changed.
pub fn reconcile_completion(unit: &mut ProductionUnit) -> bool {
    let derived = overall_completion_date(unit);
    if unit.date_fully_completed != derived {
        unit.date_fully_completed = derived;
        true
    } else {
        false
    }
}

// ── Buckets ─────────────────────────────────────────────────────────

/// Display grouping of units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Bucket {
    InProgress,
    Completed,
    Shipped,
}

impl Bucket {
    pub const ALL: [Bucket; 3] = [Bucket::InProgress, Bucket::Completed, Bucket::Shipped];

    pub fn label(&self) -> &'static str {
        match self {
            Bucket::InProgress => "In Progress",
            Bucket::Completed => "Completed",
            Bucket::Shipped => "Shipped",
        }
    }

    /// Bucket a single unit would land in.
    pub fn of(unit: &ProductionUnit) -> Self {
        if unit.is_shipped {
            Bucket::Shipped
        } else if is_complete(unit) {
            Bucket::Completed
        } else {
            Bucket::InProgress
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Bucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "inprogress" | "wip" => Ok(Bucket::InProgress),
            "completed" | "complete" | "done" => Ok(Bucket::Completed),
            "shipped" => Ok(Bucket::Shipped),
            _ => Err(format!("unknown bucket: {s}")),
        }
    }
}

/// Units grouped into buckets, each sorted naturally by serial number.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Partition {
    pub in_progress: Vec<ProductionUnit>,
    pub completed: Vec<ProductionUnit>,
    pub shipped: Vec<ProductionUnit>,
}

impl Partition {
    pub fn bucket(&self, bucket: Bucket) -> &[ProductionUnit] {
        match bucket {
            Bucket::InProgress => &self.in_progress,
            Bucket::Completed => &self.completed,
            Bucket::Shipped => &self.shipped,
        }
    }

    pub fn len(&self) -> usize {
        self.in_progress.len() + self.completed.len() + self.shipped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split units into in-progress / completed / shipped.
///
/// Shipped wins regardless of step statuses. Completed units carry their
/// stored `date_fully_completed`, or the derived one when none is stored;
/// in-progress units have any stale value cleared.
pub fn partition<'a, I>(units: I) -> Partition
where
    I: IntoIterator<Item = &'a ProductionUnit>,
{
    let mut out = Partition::default();
    for unit in units {
        match Bucket::of(unit) {
            Bucket::Shipped => out.shipped.push(unit.clone()),
            Bucket::Completed => {
                let mut unit = unit.clone();
                if unit.date_fully_completed.is_none() {
                    unit.date_fully_completed = overall_completion_date(&unit);
                }
                out.completed.push(unit);
            }
            Bucket::InProgress => {
                let mut unit = unit.clone();
                unit.date_fully_completed = None;
                out.in_progress.push(unit);
            }
        }
    }
    for bucket in [&mut out.in_progress, &mut out.completed, &mut out.shipped] {
        bucket.sort_by(|a, b| natural_cmp(&a.unit_serial_number, &b.unit_serial_number));
    }
    out
}

// ── Last completed step ─────────────────────────────────────────────

/// Name, date and actor of a unit's most advanced Complete step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastStepInfo {
    pub name: String,
    pub date: Option<Timestamp>,
    pub completed_by: Option<String>,
}

impl LastStepInfo {
    pub const NONE_NAME: &'static str = "N/A";

    fn none() -> Self {
        Self {
            name: Self::NONE_NAME.to_string(),
            date: None,
            completed_by: None,
        }
    }
}

/// The Complete entry whose step has the highest `step_order`.
///
/// Entries for steps missing from the catalog are ignored. On equal orders
/// the first entry in the unit's status list wins.
pub fn last_completed_step_info(unit: &ProductionUnit, catalog: &StepCatalog) -> LastStepInfo {
    let mut best: Option<(i32, LastStepInfo)> = None;
    for entry in unit.step_statuses.iter().filter(|s| s.status == StepStatus::Complete) {
        let Some(step) = catalog.get(&entry.step_id) else {
            continue;
        };
        if best.as_ref().map_or(true, |(order, _)| step.step_order > *order) {
            best = Some((
                step.step_order,
                LastStepInfo {
                    name: step.step_name.clone(),
                    date: entry.completed_date,
                    completed_by: entry.completed_by.clone(),
                },
            ));
        }
    }
    best.map(|(_, info)| info).unwrap_or_else(LastStepInfo::none)
}
