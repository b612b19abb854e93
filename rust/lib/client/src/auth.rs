//! Pluggable bearer-token providers.
//!
//! Tokens are obtained out of band; the client only attaches them.

use crate::error::ApiError;

/// Called before every API request. `Ok(None)` sends no Authorization header.
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync + 'static {
    async fn token(&self) -> Result<Option<String>, ApiError>;
}

/// Anonymous requests.
pub struct NoAuth;

#[async_trait::async_trait]
impl TokenSource for NoAuth {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(None)
    }
}

/// A bearer token obtained elsewhere, e.g. from the CLI context file.
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait::async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        if self.0.trim().is_empty() {
            return Err(ApiError::Auth("empty bearer token".into()));
        }
        Ok(Some(self.0.clone()))
    }
}

/// Token read from an environment variable on every request; an unset or
/// blank variable means anonymous.
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub const DEFAULT_VAR: &'static str = "H10CM_TOKEN";

    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvToken {
    fn default() -> Self {
        Self::new(Self::DEFAULT_VAR)
    }
}

#[async_trait::async_trait]
impl TokenSource for EnvToken {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        match std::env::var(&self.var) {
            Ok(v) if !v.trim().is_empty() => Ok(Some(v.trim().to_string())),
            Ok(_) | Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(ApiError::Auth(format!("{}: {}", self.var, e))),
        }
    }
}
