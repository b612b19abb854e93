use std::fmt;

use h10cm_core::types::{id_string, opt_id_string, opt_timestamp};
use h10cm_core::Timestamp;
use serde::{Deserialize, Deserializer, Serialize};

/// InventoryItem: a stocked part or material.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryItem {
    #[serde(with = "id_string")]
    pub inventory_item_id: String,

    pub item_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// e.g. "pcs", "m", "kg".
    #[serde(default)]
    pub unit_of_measure: String,

    #[serde(default, deserialize_with = "lenient::int")]
    pub current_stock_level: i64,

    #[serde(default, deserialize_with = "lenient::opt_int", skip_serializing_if = "Option::is_none")]
    pub reorder_point: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_info: Option<String>,

    /// Decimal columns may arrive as strings.
    #[serde(default, deserialize_with = "lenient::opt_float", skip_serializing_if = "Option::is_none")]
    pub cost_per_unit: Option<f64>,
}

/// Kind of stock movement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionType {
    /// Manual correction after a count.
    Adjustment,
    /// Goods received.
    Receipt,
    /// Parts pulled into production.
    Consumption,
    /// Replenishment order placed from the pending-orders cart.
    Reorder,
    Other(String),
}

impl TransactionType {
    pub fn as_str(&self) -> &str {
        match self {
            TransactionType::Adjustment => "Adjustment",
            TransactionType::Receipt => "Receipt",
            TransactionType::Consumption => "Consumption",
            TransactionType::Reorder => "Reorder",
            TransactionType::Other(s) => s,
        }
    }
}

impl Default for TransactionType {
    fn default() -> Self {
        Self::Adjustment
    }
}

impl From<String> for TransactionType {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "adjustment" => TransactionType::Adjustment,
            "receipt" => TransactionType::Receipt,
            "consumption" => TransactionType::Consumption,
            "reorder" => TransactionType::Reorder,
            _ => TransactionType::Other(s),
        }
    }
}

impl From<TransactionType> for String {
    fn from(t: TransactionType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// InventoryTransaction: a signed stock change posted to
/// `/inventory-items/:id/transactions`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryTransaction {
    #[serde(default, with = "opt_id_string", skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,

    #[serde(with = "id_string")]
    pub inventory_item_id: String,

    /// Positive adds stock, negative removes it.
    #[serde(deserialize_with = "lenient::int")]
    pub quantity_changed: i64,

    #[serde(default)]
    pub transaction_type: TransactionType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, with = "opt_timestamp", skip_serializing_if = "Option::is_none")]
    pub transaction_date: Option<Timestamp>,
}

impl InventoryTransaction {
    pub fn new(inventory_item_id: impl Into<String>, quantity_changed: i64, transaction_type: TransactionType) -> Self {
        Self {
            transaction_id: None,
            inventory_item_id: inventory_item_id.into(),
            quantity_changed,
            transaction_type,
            user_name: None,
            notes: None,
            transaction_date: None,
        }
    }
}

/// Numbers that SQL drivers sometimes serialize as strings.
mod lenient {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Num {
        Int(i64),
        Float(f64),
        Text(String),
    }

    impl Num {
        fn as_f64<E: serde::de::Error>(self) -> Result<f64, E> {
            match self {
                Num::Int(n) => Ok(n as f64),
                Num::Float(f) => Ok(f),
                Num::Text(s) => s.trim().parse().map_err(|_| E::custom(format!("not a number: {s:?}"))),
            }
        }
    }

    pub fn int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        Ok(opt_int(deserializer)?.unwrap_or_default())
    }

    pub fn opt_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        Ok(opt_float(deserializer)?.map(|f| f.round() as i64))
    }

    pub fn opt_float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        match Option::<Num>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Num::Text(s)) if s.trim().is_empty() => Ok(None),
            Some(n) => n.as_f64().map(Some),
        }
    }
}
