//! Typed HTTP client for the H10CM production tracking backend.
//!
//! Authentication is a pre-obtained bearer token supplied through a
//! [`TokenSource`]. Reads are cached per query key and invalidated by the
//! mutations that change them.
//!
//! # Usage
//!
//! ```ignore
//! use h10cm_client::{H10Client, StaticToken};
//!
//! let client = H10Client::new(&TrackerConfig::default(), Arc::new(StaticToken::new(token)))?;
//! let units = client.list_units("12").await?;
//! ```

pub mod api;
pub mod auth;
pub mod cache;
pub mod client;
pub mod envelope;
pub mod error;

pub use api::{Health, NewInventoryItem, OrderSubmitter};
pub use auth::{EnvToken, NoAuth, StaticToken, TokenSource};
pub use cache::{QueryCache, QueryKey};
pub use client::H10Client;
pub use error::ApiError;
