//! Endpoint groups, one file per backend resource.

mod attributes;
mod health;
mod inventory;
mod projects;
mod steps;
mod units;

pub use health::Health;
pub use inventory::{NewInventoryItem, OrderSubmitter};
