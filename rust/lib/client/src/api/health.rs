use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::H10Client;
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Health {
    #[serde(default)]
    pub status: String,

    /// Whatever else the backend reports (database, version, ...).
    #[serde(flatten)]
    pub details: serde_json::Map<String, Value>,

    #[serde(skip)]
    pub latency: Duration,
}

impl H10Client {
    /// Probe `/health`. Never cached.
    pub async fn health(&self) -> Result<Health, ApiError> {
        let started = Instant::now();
        let mut health: Health = self.get_one("/health").await?;
        health.latency = started.elapsed();
        Ok(health)
    }
}
