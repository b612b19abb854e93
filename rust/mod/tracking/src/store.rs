//! The Unit Record Store seam.
//!
//! The authoritative unit data lives behind the REST backend; the client
//! crate implements [`UnitStore`] over HTTP. [`MemoryUnitStore`] is an
//! in-process implementation for tests and offline tooling.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use h10cm_core::types::opt_timestamp;
use h10cm_core::{ServiceError, Timestamp};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::model::{AttributeValue, NewUnit, ProductionUnit, StepStatus, UnitStepStatus};
use crate::progress::reconcile_completion;

/// Body of a per-unit step progress update.
///
/// `completed_date` / `completed_by` are only sent when set; an absent
/// field means "leave the stored value as it is".
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StepUpdate {
    pub step_id: String,
    pub status: StepStatus,
    #[serde(with = "opt_timestamp", skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<String>,
}

impl StepUpdate {
    /// Complete stamps `now` and `actor`; every other status touches neither.
    pub fn new(step_id: impl Into<String>, status: StepStatus, actor: &str, now: Timestamp) -> Self {
        let stamp = status == StepStatus::Complete;
        Self {
            step_id: step_id.into(),
            status,
            completed_date: stamp.then_some(now),
            completed_by: stamp.then(|| actor.to_string()),
        }
    }

    /// Apply to a local copy of the unit, then re-derive `date_fully_completed`.
    pub fn apply_to(&self, unit: &mut ProductionUnit) {
        let idx = match unit.step_statuses.iter().position(|s| s.step_id == self.step_id) {
            Some(i) => i,
            None => {
                unit.step_statuses.push(UnitStepStatus::not_started(self.step_id.clone()));
                unit.step_statuses.len() - 1
            }
        };
        let entry = &mut unit.step_statuses[idx];
        entry.status = self.status;
        if let Some(date) = self.completed_date {
            entry.completed_date = Some(date);
        }
        if let Some(by) = &self.completed_by {
            entry.completed_by = Some(by.clone());
        }
        reconcile_completion(unit);
    }
}

/// Body of a shipment update.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ShipUpdate {
    pub is_shipped: bool,
    pub shipped_date: Timestamp,
}

/// Authoritative store of production units.
///
/// Every call is an independent request; implementations give no
/// cross-call atomicity or ordering.
#[async_trait]
pub trait UnitStore: Send + Sync + 'static {
    async fn list_units(&self, project_id: &str) -> Result<Vec<ProductionUnit>, ServiceError>;

    async fn get_unit(&self, item_id: &str) -> Result<ProductionUnit, ServiceError>;

    async fn create_unit(&self, unit: &NewUnit) -> Result<ProductionUnit, ServiceError>;

    async fn update_step(&self, item_id: &str, update: &StepUpdate) -> Result<(), ServiceError>;

    async fn mark_shipped(&self, item_id: &str, update: &ShipUpdate) -> Result<(), ServiceError>;

    /// Replace the unit's full attribute set.
    async fn save_attributes(&self, item_id: &str, values: &[AttributeValue]) -> Result<(), ServiceError>;
}

// ── In-memory implementation ────────────────────────────────────────

struct Record {
    project_id: String,
    unit: ProductionUnit,
}

/// In-process [`UnitStore`].
///
/// Recomputes `date_fully_completed` on every mutation. Failures can be
/// injected per unit to exercise partial-failure paths.
#[derive(Default)]
pub struct MemoryUnitStore {
    records: RwLock<BTreeMap<String, Record>>,
    failures: RwLock<HashMap<String, ServiceError>>,
    next_id: AtomicU64,
    writes: AtomicUsize,
}

impl MemoryUnitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing units of one project.
    pub fn with_units(project_id: &str, units: Vec<ProductionUnit>) -> Self {
        let records = units
            .into_iter()
            .map(|unit| {
                (
                    unit.item_id.clone(),
                    Record { project_id: project_id.to_string(), unit },
                )
            })
            .collect();
        Self {
            records: RwLock::new(records),
            ..Self::default()
        }
    }

    /// Make every subsequent request touching `item_id` fail with `err`.
    pub async fn fail_on(&self, item_id: &str, err: ServiceError) {
        self.failures.write().await.insert(item_id.to_string(), err);
    }

    /// Number of mutating requests that reached the store.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    async fn check(&self, item_id: &str) -> Result<(), ServiceError> {
        match self.failures.read().await.get(item_id) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn mutate<F>(&self, item_id: &str, f: F) -> Result<(), ServiceError>
    where
        F: FnOnce(&mut ProductionUnit) + Send,
    {
        self.check(item_id).await?;
        let mut records = self.records.write().await;
        let record = records
            .get_mut(item_id)
            .ok_or_else(|| ServiceError::NotFound(format!("tracked item {item_id}")))?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        f(&mut record.unit);
        Ok(())
    }
}

#[async_trait]
impl UnitStore for MemoryUnitStore {
    async fn list_units(&self, project_id: &str) -> Result<Vec<ProductionUnit>, ServiceError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .filter(|r| r.project_id == project_id)
            .map(|r| r.unit.clone())
            .collect())
    }

    async fn get_unit(&self, item_id: &str) -> Result<ProductionUnit, ServiceError> {
        self.check(item_id).await?;
        self.records
            .read()
            .await
            .get(item_id)
            .map(|r| r.unit.clone())
            .ok_or_else(|| ServiceError::NotFound(format!("tracked item {item_id}")))
    }

    async fn create_unit(&self, unit: &NewUnit) -> Result<ProductionUnit, ServiceError> {
        self.check(&unit.unit_serial_number).await?;
        let mut records = self.records.write().await;
        let taken = records.values().any(|r| {
            r.project_id == unit.project_id && r.unit.unit_serial_number == unit.unit_serial_number
        });
        if taken {
            return Err(ServiceError::Conflict(format!(
                "serial {} already exists",
                unit.unit_serial_number
            )));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        let item_id = (self.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string();
        let mut created = ProductionUnit {
            item_id: item_id.clone(),
            unit_serial_number: unit.unit_serial_number.clone(),
            pcb_serial_number: unit.pcb_serial_number.clone(),
            step_statuses: unit.step_statuses.clone(),
            is_shipped: false,
            shipped_date: None,
            date_fully_completed: None,
            attributes: BTreeMap::new(),
        };
        reconcile_completion(&mut created);
        records.insert(
            item_id,
            Record { project_id: unit.project_id.clone(), unit: created.clone() },
        );
        Ok(created)
    }

    async fn update_step(&self, item_id: &str, update: &StepUpdate) -> Result<(), ServiceError> {
        self.mutate(item_id, |unit| update.apply_to(unit)).await
    }

    async fn mark_shipped(&self, item_id: &str, update: &ShipUpdate) -> Result<(), ServiceError> {
        self.mutate(item_id, |unit| {
            unit.is_shipped = update.is_shipped;
            unit.shipped_date = Some(update.shipped_date);
        })
        .await
    }

    async fn save_attributes(&self, item_id: &str, values: &[AttributeValue]) -> Result<(), ServiceError> {
        let values = values.to_vec();
        self.mutate(item_id, move |unit| {
            unit.attributes = values
                .into_iter()
                .map(|v| (v.attribute_definition_id, v.attribute_value))
                .collect();
        })
        .await
    }
}
