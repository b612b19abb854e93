//! Pending-orders cart, persisted in a local redb file.
//!
//! Items are collected while browsing inventory and submitted in bulk to the
//! backend through an [`OrderSink`]. Everything stays on disk until it has
//! been submitted successfully.

use std::path::Path;

use async_trait::async_trait;
use h10cm_core::{new_id, ServiceError, Timestamp};
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::CartError;
use crate::model::InventoryItem;

const TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("cart");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartItemKind {
    /// A part not yet in inventory.
    New,
    /// More of an existing inventory item.
    Reorder,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: CartItemKind,

    pub item_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub unit_of_measure: String,

    pub quantity: u32,

    /// Per-unit cost estimate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,

    /// Set for reorders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory_item_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_stock_level: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reorder_point: Option<i64>,

    #[serde(rename = "dateAdded")]
    pub date_added: Timestamp,
}

impl CartItem {
    /// A part that does not exist in inventory yet.
    pub fn new_part(item_name: impl Into<String>, unit_of_measure: impl Into<String>, quantity: u32) -> Self {
        Self {
            id: String::new(),
            kind: CartItemKind::New,
            item_name: item_name.into(),
            part_number: None,
            description: None,
            unit_of_measure: unit_of_measure.into(),
            quantity,
            estimated_cost: None,
            inventory_item_id: None,
            supplier: None,
            notes: None,
            current_stock_level: None,
            reorder_point: None,
            date_added: Timestamp::now(),
        }
    }

    /// A reorder of `item`, snapshotting its stock figures.
    pub fn reorder(item: &InventoryItem, quantity: u32) -> Self {
        Self {
            id: String::new(),
            kind: CartItemKind::Reorder,
            item_name: item.item_name.clone(),
            part_number: item.part_number.clone(),
            description: item.description.clone(),
            unit_of_measure: item.unit_of_measure.clone(),
            quantity,
            estimated_cost: item.cost_per_unit,
            inventory_item_id: Some(item.inventory_item_id.clone()),
            supplier: item.supplier_info.clone(),
            notes: None,
            current_stock_level: Some(item.current_stock_level),
            reorder_point: item.reorder_point,
            date_added: Timestamp::now(),
        }
    }

    pub fn line_cost(&self) -> f64 {
        self.estimated_cost.unwrap_or(0.0) * f64::from(self.quantity)
    }

    fn validate(&self) -> Result<(), CartError> {
        if self.item_name.trim().is_empty() {
            return Err(CartError::Invalid("item name is required".into()));
        }
        if self.quantity == 0 {
            return Err(CartError::Invalid("quantity must be greater than 0".into()));
        }
        if self.kind == CartItemKind::Reorder && self.inventory_item_id.is_none() {
            return Err(CartError::Invalid("reorder requires an inventory item id".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub total_items: usize,
    pub total_quantity: u64,
    pub estimated_total_cost: f64,
    pub new_items_count: usize,
    pub reorder_items_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedCartItem {
    pub cart_item_id: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSubmissionResult {
    pub success: bool,
    pub successful_items: Vec<String>,
    pub failed_items: Vec<FailedCartItem>,
    pub message: String,
}

/// Receives cart items on submission.
#[async_trait]
pub trait OrderSink: Send + Sync {
    async fn submit_item(&self, item: &CartItem) -> Result<(), ServiceError>;
}

/// CartStore keeps cart items as JSON values keyed by item id.
pub struct CartStore {
    db: Database,
}

impl CartStore {
    /// Open or create the cart database at `path`.
    pub fn open(path: &Path) -> Result<Self, CartError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| CartError::Storage(e.to_string()))?;
        }
        let db = Database::create(path).map_err(storage)?;
        let txn = db.begin_write().map_err(storage)?;
        {
            let _table = txn.open_table(TABLE).map_err(storage)?;
        }
        txn.commit().map_err(storage)?;
        debug!(path = %path.display(), "opened cart");
        Ok(Self { db })
    }

    /// Add an item. A reorder of an inventory item already in the cart
    /// raises that entry's quantity instead of adding a second line.
    pub fn add(&self, mut item: CartItem) -> Result<CartItem, CartError> {
        item.validate()?;
        if item.kind == CartItemKind::Reorder {
            let existing = self
                .list()?
                .into_iter()
                .find(|c| c.kind == CartItemKind::Reorder && c.inventory_item_id == item.inventory_item_id);
            if let Some(mut merged) = existing {
                merged.quantity = merged.quantity.saturating_add(item.quantity);
                self.put(&merged)?;
                return Ok(merged);
            }
        }
        if item.id.is_empty() {
            item.id = new_id();
        }
        self.put(&item)?;
        Ok(item)
    }

    pub fn get(&self, id: &str) -> Result<Option<CartItem>, CartError> {
        let txn = self.db.begin_read().map_err(storage)?;
        let table = txn.open_table(TABLE).map_err(storage)?;
        match table.get(id).map_err(storage)? {
            Some(raw) => Ok(Some(serde_json::from_slice(raw.value())?)),
            None => Ok(None),
        }
    }

    pub fn update_quantity(&self, id: &str, quantity: u32) -> Result<CartItem, CartError> {
        if quantity == 0 {
            return Err(CartError::Invalid("quantity must be greater than 0".into()));
        }
        let mut item = self.get(id)?.ok_or_else(|| CartError::NotFound(id.to_string()))?;
        item.quantity = quantity;
        self.put(&item)?;
        Ok(item)
    }

    pub fn remove(&self, id: &str) -> Result<(), CartError> {
        let txn = self.db.begin_write().map_err(storage)?;
        let removed = {
            let mut table = txn.open_table(TABLE).map_err(storage)?;
            let old = table.remove(id).map_err(storage)?;
            old.is_some()
        };
        txn.commit().map_err(storage)?;
        if removed {
            Ok(())
        } else {
            Err(CartError::NotFound(id.to_string()))
        }
    }

    /// All items, oldest first.
    pub fn list(&self) -> Result<Vec<CartItem>, CartError> {
        let txn = self.db.begin_read().map_err(storage)?;
        let table = txn.open_table(TABLE).map_err(storage)?;
        let mut items = Vec::new();
        for entry in table.iter().map_err(storage)? {
            let (_, value) = entry.map_err(storage)?;
            items.push(serde_json::from_slice::<CartItem>(value.value())?);
        }
        items.sort_by(|a, b| a.date_added.cmp(&b.date_added).then_with(|| a.id.cmp(&b.id)));
        Ok(items)
    }

    /// Remove everything; returns how many items were dropped.
    pub fn clear(&self) -> Result<usize, CartError> {
        let ids: Vec<String> = self.list()?.into_iter().map(|i| i.id).collect();
        let txn = self.db.begin_write().map_err(storage)?;
        {
            let mut table = txn.open_table(TABLE).map_err(storage)?;
            for id in &ids {
                table.remove(id.as_str()).map_err(storage)?;
            }
        }
        txn.commit().map_err(storage)?;
        Ok(ids.len())
    }

    pub fn summary(&self) -> Result<CartSummary, CartError> {
        Ok(summarize(&self.list()?))
    }

    /// Hand every item to `sink`, one at a time. Submitted items leave the
    /// cart; failed ones stay for another attempt.
    pub async fn submit(&self, sink: &dyn OrderSink) -> Result<BulkSubmissionResult, CartError> {
        let items = self.list()?;
        let mut successful_items = Vec::new();
        let mut failed_items = Vec::new();
        for item in &items {
            match sink.submit_item(item).await {
                Ok(()) => {
                    self.remove(&item.id)?;
                    successful_items.push(item.id.clone());
                }
                Err(e) => {
                    warn!(cart_item = %item.id, item_name = %item.item_name, "cart item not submitted: {}", e);
                    failed_items.push(FailedCartItem {
                        cart_item_id: item.id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        let message = if items.is_empty() {
            "Cart is empty".to_string()
        } else if failed_items.is_empty() {
            format!("Submitted {} item(s)", successful_items.len())
        } else {
            format!(
                "Submitted {} of {} item(s); {} failed",
                successful_items.len(),
                items.len(),
                failed_items.len()
            )
        };
        info!(submitted = successful_items.len(), failed = failed_items.len(), "cart submitted");
        Ok(BulkSubmissionResult {
            success: failed_items.is_empty(),
            successful_items,
            failed_items,
            message,
        })
    }

    fn put(&self, item: &CartItem) -> Result<(), CartError> {
        let value = serde_json::to_vec(item)?;
        let txn = self.db.begin_write().map_err(storage)?;
        {
            let mut table = txn.open_table(TABLE).map_err(storage)?;
            table.insert(item.id.as_str(), value.as_slice()).map_err(storage)?;
        }
        txn.commit().map_err(storage)?;
        Ok(())
    }
}

fn storage(e: impl std::fmt::Display) -> CartError {
    CartError::Storage(e.to_string())
}

pub fn summarize(items: &[CartItem]) -> CartSummary {
    CartSummary {
        total_items: items.len(),
        total_quantity: items.iter().map(|i| u64::from(i.quantity)).sum(),
        estimated_total_cost: items.iter().map(CartItem::line_cost).sum(),
        new_items_count: items.iter().filter(|i| i.kind == CartItemKind::New).count(),
        reorder_items_count: items.iter().filter(|i| i.kind == CartItemKind::Reorder).count(),
    }
}
