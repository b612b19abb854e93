//! Batch actions over a user-selected set of units.
//!
//! Each unit gets its own request to the [`UnitStore`]; requests run
//! concurrently up to `max_in_flight` and finish in no particular order.
//! Nothing is rolled back: the returned [`BatchReport`] says which units
//! were updated and why the others were not.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use h10cm_core::{ServiceError, Timestamp};
use serde::Serialize;
use tracing::{info, warn};

use crate::model::{NewUnit, StepCatalog, StepStatus};
use crate::progress::is_complete;
use crate::serial::serial_sequence;
use crate::store::{ShipUpdate, StepUpdate, UnitStore};

/// Default bound on concurrent per-unit requests.
pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;

/// Which step-status transitions a batch update may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Any status may be set from any other (the backend's own behavior).
    #[default]
    Permissive,
    /// Not Started → In Progress → Complete only; N/A may be entered or left freely.
    ForwardOnly,
}

impl TransitionPolicy {
    pub fn allows(&self, from: StepStatus, to: StepStatus) -> bool {
        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::ForwardOnly => match (from.rank(), to.rank()) {
                (Some(a), Some(b)) => b >= a,
                _ => true,
            },
        }
    }
}

/// One unit the batch could not update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchFailure {
    pub id: String,
    pub reason: String,
    #[serde(skip)]
    pub error: ServiceError,
}

/// Per-unit outcome of a batch action.
///
/// For unit creation, `succeeded` holds the new item ids and failures are
/// keyed by the serial number that could not be created.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    fn record(&mut self, id: String, outcome: Result<String, ServiceError>) {
        match outcome {
            Ok(ok_id) => self.succeeded.push(ok_id),
            Err(error) => {
                warn!(id = %id, code = error.error_code(), "batch item failed: {}", error);
                self.failed.push(BatchFailure {
                    id,
                    reason: error.to_string(),
                    error,
                });
            }
        }
    }
}

/// Request for [`BatchApplier::create_units`].
#[derive(Debug, Clone)]
pub struct CreateUnits<'a> {
    pub project_id: &'a str,
    pub catalog: &'a StepCatalog,
    pub quantity: usize,
    pub start_serial: &'a str,
    pub pcb_start_serial: Option<&'a str>,
}

/// Applies batch actions through a [`UnitStore`].
pub struct BatchApplier {
    store: Arc<dyn UnitStore>,
    max_in_flight: usize,
    policy: TransitionPolicy,
}

impl BatchApplier {
    pub fn new(store: Arc<dyn UnitStore>) -> Self {
        Self {
            store,
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            policy: TransitionPolicy::default(),
        }
    }

    pub fn with_max_in_flight(mut self, n: usize) -> Self {
        self.max_in_flight = n.max(1);
        self
    }

    pub fn with_policy(mut self, policy: TransitionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Set `step_id` to `status` on every selected unit.
    ///
    /// Complete stamps the current time and `actor`; other statuses leave
    /// the stored date and actor as they were.
    pub async fn apply_status(
        &self,
        item_ids: &[String],
        step_id: &str,
        status: StepStatus,
        actor: &str,
    ) -> BatchReport {
        let update = StepUpdate::new(step_id, status, actor, Timestamp::now());
        let update = &update;
        let outcomes = self
            .run(item_ids, |id| async move {
                if self.policy != TransitionPolicy::Permissive {
                    let current = self.store.get_unit(&id).await?.status_of(&update.step_id);
                    if !self.policy.allows(current, update.status) {
                        return Err(ServiceError::Validation(format!(
                            "step {} cannot move from {} to {}",
                            update.step_id, current, update.status
                        )));
                    }
                }
                self.store.update_step(&id, update).await?;
                Ok(id)
            })
            .await;
        let report = collect(outcomes);
        info!(
            step_id,
            status = %status,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "applied step status"
        );
        report
    }

    /// Mark selected units shipped.
    ///
    /// Incomplete units are rejected. Units that are already shipped count
    /// as succeeded without a write, so their `shipped_date` never moves.
    pub async fn mark_shipped(&self, item_ids: &[String]) -> BatchReport {
        let shipped_date = Timestamp::now();
        let outcomes = self
            .run(item_ids, |id| async move {
                let unit = self.store.get_unit(&id).await?;
                if unit.is_shipped {
                    return Ok(id);
                }
                if !is_complete(&unit) {
                    return Err(ServiceError::Validation(format!(
                        "unit {} is not complete",
                        unit.unit_serial_number
                    )));
                }
                let update = ShipUpdate { is_shipped: true, shipped_date };
                self.store.mark_shipped(&id, &update).await?;
                Ok(id)
            })
            .await;
        let report = collect(outcomes);
        info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "marked units shipped"
        );
        report
    }

    /// Create `quantity` units with consecutive serials.
    ///
    /// Each new unit starts with one Not Started entry per catalog step.
    /// Invalid input (zero quantity, serial without numeric suffix) fails
    /// the whole call before any request is made.
    pub async fn create_units(&self, req: CreateUnits<'_>) -> Result<BatchReport, ServiceError> {
        if req.quantity == 0 {
            return Err(ServiceError::Validation("quantity must be greater than 0".into()));
        }
        let serials = serial_sequence(req.start_serial, req.quantity)?;
        let pcbs: Vec<Option<String>> = match req.pcb_start_serial.filter(|s| !s.trim().is_empty()) {
            Some(start) => serial_sequence(start, req.quantity)?.into_iter().map(Some).collect(),
            None => vec![None; req.quantity],
        };
        let initial = req.catalog.initial_statuses();

        let bodies: Vec<NewUnit> = serials
            .into_iter()
            .zip(pcbs)
            .map(|(sn, pcb)| NewUnit {
                project_id: req.project_id.to_string(),
                unit_serial_number: sn,
                pcb_serial_number: pcb,
                step_statuses: initial.clone(),
            })
            .collect();

        let outcomes: Vec<(String, Result<String, ServiceError>)> = stream::iter(bodies)
            .map(|body| async move {
                let result = self.store.create_unit(&body).await.map(|u| u.item_id);
                (body.unit_serial_number, result)
            })
            .buffer_unordered(self.max_in_flight)
            .collect()
            .await;

        let report = collect(outcomes);
        info!(
            project_id = req.project_id,
            created = report.succeeded.len(),
            failed = report.failed.len(),
            "created units"
        );
        Ok(report)
    }

    async fn run<'s, F, Fut>(&'s self, item_ids: &[String], f: F) -> Vec<(String, Result<String, ServiceError>)>
    where
        F: Fn(String) -> Fut + 's,
        Fut: std::future::Future<Output = Result<String, ServiceError>> + 's,
    {
        let f = &f;
        stream::iter(dedup(item_ids))
            .map(|id| async move { (id.clone(), f(id).await) })
            .buffer_unordered(self.max_in_flight)
            .collect()
            .await
    }
}

fn dedup(ids: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    ids.iter().filter(|id| seen.insert(id.as_str())).cloned().collect()
}

fn collect(outcomes: Vec<(String, Result<String, ServiceError>)>) -> BatchReport {
    let mut report = BatchReport::default();
    for (id, outcome) in outcomes {
        report.record(id, outcome);
    }
    report
}
