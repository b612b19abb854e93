use h10cm_core::ServiceError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StockError {
    #[error("{item}: stock would drop to {result} (current {current}, change {change})")]
    NegativeStock {
        item: String,
        current: i64,
        change: i64,
        result: i64,
    },

    #[error("transaction for item {transaction} applied to item {item}")]
    ItemMismatch { item: String, transaction: String },

    #[error("quantity change must not be zero")]
    ZeroChange,
}

impl From<StockError> for ServiceError {
    fn from(err: StockError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum CartError {
    #[error("cart item not found: {0}")]
    NotFound(String),

    #[error("invalid cart item: {0}")]
    Invalid(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<CartError> for ServiceError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::NotFound(id) => ServiceError::NotFound(format!("cart item {id}")),
            CartError::Invalid(msg) => ServiceError::Validation(msg),
            other => ServiceError::Storage(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for CartError {
    fn from(err: serde_json::Error) -> Self {
        CartError::Serialization(err.to_string())
    }
}
