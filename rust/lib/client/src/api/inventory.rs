use async_trait::async_trait;
use h10cm_core::ServiceError;
use h10cm_inventory::cart::{CartItem, CartItemKind, OrderSink};
use h10cm_inventory::model::{InventoryItem, InventoryTransaction, TransactionType};
use h10cm_inventory::stock::reorder_suggestions;
use reqwest::Method;
use serde::Serialize;
use tracing::info;

use crate::cache::QueryKey;
use crate::client::H10Client;
use crate::error::ApiError;

/// Body of an inventory item creation request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewInventoryItem {
    pub item_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub unit_of_measure: String,
    pub current_stock_level: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reorder_point: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_per_unit: Option<f64>,
}

impl From<&CartItem> for NewInventoryItem {
    fn from(item: &CartItem) -> Self {
        Self {
            item_name: item.item_name.clone(),
            part_number: item.part_number.clone(),
            description: item.description.clone(),
            unit_of_measure: item.unit_of_measure.clone(),
            current_stock_level: 0,
            reorder_point: item.reorder_point,
            supplier_info: item.supplier.clone(),
            cost_per_unit: item.estimated_cost,
        }
    }
}

impl H10Client {
    pub async fn list_inventory(&self) -> Result<Vec<InventoryItem>, ApiError> {
        self.cache()
            .get_or_fetch(QueryKey::InventoryItems, || async move {
                self.get_list("/inventory-items").await
            })
            .await
    }

    pub async fn get_inventory_item(&self, item_id: &str) -> Result<InventoryItem, ApiError> {
        self.get_one(&format!("/inventory-items/{item_id}")).await
    }

    pub async fn create_inventory_item(&self, item: &NewInventoryItem) -> Result<(), ApiError> {
        self.send_discard(Method::POST, "/inventory-items", Some(item)).await?;
        self.cache().invalidate(&QueryKey::InventoryItems).await;
        Ok(())
    }

    /// Post a signed stock change for one item.
    pub async fn adjust_stock(&self, tx: &InventoryTransaction) -> Result<(), ApiError> {
        self.send_discard(
            Method::POST,
            &format!("/inventory-items/{}/transactions", tx.inventory_item_id),
            Some(tx),
        )
        .await?;
        self.cache().invalidate(&QueryKey::InventoryItems).await;
        info!(
            item_id = %tx.inventory_item_id,
            change = tx.quantity_changed,
            kind = %tx.transaction_type,
            "stock adjusted"
        );
        Ok(())
    }

    /// Items at or below their reorder point, worst first.
    pub async fn low_stock(&self) -> Result<Vec<InventoryItem>, ApiError> {
        let items = self.list_inventory().await?;
        Ok(reorder_suggestions(&items).into_iter().cloned().collect())
    }
}

/// Submits cart items to the backend on behalf of `user_name`.
///
/// New parts are created with zero stock; reorders are recorded as
/// Reorder transactions against the existing item.
pub struct OrderSubmitter<'a> {
    client: &'a H10Client,
    user_name: &'a str,
}

impl<'a> OrderSubmitter<'a> {
    pub fn new(client: &'a H10Client, user_name: &'a str) -> Self {
        Self { client, user_name }
    }
}

#[async_trait]
impl OrderSink for OrderSubmitter<'_> {
    async fn submit_item(&self, item: &CartItem) -> Result<(), ServiceError> {
        match item.kind {
            CartItemKind::New => {
                self.client.create_inventory_item(&NewInventoryItem::from(item)).await?;
            }
            CartItemKind::Reorder => {
                let id = item
                    .inventory_item_id
                    .clone()
                    .ok_or_else(|| ServiceError::Validation("reorder without inventory item".into()))?;
                let mut tx = InventoryTransaction::new(id, i64::from(item.quantity), TransactionType::Reorder);
                tx.user_name = Some(self.user_name.to_string()).filter(|u| !u.is_empty());
                tx.notes = item.notes.clone();
                self.client.adjust_stock(&tx).await?;
            }
        }
        Ok(())
    }
}
