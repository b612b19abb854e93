pub mod config;
pub mod error;
pub mod types;

pub use config::TrackerConfig;
pub use error::ServiceError;
pub use types::{new_id, Timestamp};
