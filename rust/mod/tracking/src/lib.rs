pub mod attributes;
pub mod batch;
pub mod model;
pub mod progress;
pub mod selection;
pub mod serial;
pub mod stats;
pub mod store;

pub use batch::{BatchApplier, BatchFailure, BatchReport, CreateUnits, TransitionPolicy};
pub use progress::{
    is_complete, last_completed_step_info, overall_completion_date, partition, Bucket, LastStepInfo,
    Partition,
};
pub use store::{MemoryUnitStore, ShipUpdate, StepUpdate, UnitStore};
