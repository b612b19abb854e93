pub mod cart;
pub mod error;
pub mod model;
pub mod stock;

pub use cart::{BulkSubmissionResult, CartItem, CartItemKind, CartStore, CartSummary, OrderSink};
pub use error::{CartError, StockError};
pub use model::{InventoryItem, InventoryTransaction, TransactionType};
