//! Stock level arithmetic and low-stock detection.

use crate::error::StockError;
use crate::model::{InventoryItem, InventoryTransaction};

/// Apply `tx` to a local copy of `item` and return the new stock level.
///
/// Rejects changes that would take stock below zero; the item is left
/// untouched in that case.
pub fn apply_transaction(item: &mut InventoryItem, tx: &InventoryTransaction) -> Result<i64, StockError> {
    if tx.inventory_item_id != item.inventory_item_id {
        return Err(StockError::ItemMismatch {
            item: item.inventory_item_id.clone(),
            transaction: tx.inventory_item_id.clone(),
        });
    }
    if tx.quantity_changed == 0 {
        return Err(StockError::ZeroChange);
    }
    let result = item.current_stock_level.saturating_add(tx.quantity_changed);
    if result < 0 {
        return Err(StockError::NegativeStock {
            item: item.item_name.clone(),
            current: item.current_stock_level,
            change: tx.quantity_changed,
            result,
        });
    }
    item.current_stock_level = result;
    Ok(result)
}

/// At or below the reorder point. Items without one are never low.
pub fn is_low_stock(item: &InventoryItem) -> bool {
    item.reorder_point
        .is_some_and(|point| item.current_stock_level <= point)
}

/// How far below (or at) its reorder point an item is.
pub fn shortfall(item: &InventoryItem) -> Option<i64> {
    let point = item.reorder_point?;
    (item.current_stock_level <= point).then_some(point - item.current_stock_level)
}

/// Low-stock items, worst shortfall first, then by name.
pub fn reorder_suggestions(items: &[InventoryItem]) -> Vec<&InventoryItem> {
    let mut low: Vec<&InventoryItem> = items.iter().filter(|i| is_low_stock(i)).collect();
    low.sort_by(|a, b| {
        shortfall(b)
            .cmp(&shortfall(a))
            .then_with(|| a.item_name.cmp(&b.item_name))
    });
    low
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TransactionType;

    fn item(id: &str, name: &str, stock: i64, reorder: Option<i64>) -> InventoryItem {
        InventoryItem {
            inventory_item_id: id.into(),
            item_name: name.into(),
            part_number: None,
            description: None,
            unit_of_measure: "pcs".into(),
            current_stock_level: stock,
            reorder_point: reorder,
            supplier_info: None,
            cost_per_unit: None,
        }
    }

    #[test]
    fn apply_adds_and_removes() {
        let mut it = item("1", "Screw", 10, None);
        let add = InventoryTransaction::new("1", 5, TransactionType::Receipt);
        assert_eq!(apply_transaction(&mut it, &add), Ok(15));
        let take = InventoryTransaction::new("1", -15, TransactionType::Consumption);
        assert_eq!(apply_transaction(&mut it, &take), Ok(0));
    }

    #[test]
    fn apply_rejects_negative_and_leaves_item() {
        let mut it = item("1", "Screw", 3, None);
        let take = InventoryTransaction::new("1", -4, TransactionType::Consumption);
        assert!(matches!(
            apply_transaction(&mut it, &take),
            Err(StockError::NegativeStock { result: -1, .. })
        ));
        assert_eq!(it.current_stock_level, 3);

        let other = InventoryTransaction::new("2", 1, TransactionType::Receipt);
        assert!(matches!(apply_transaction(&mut it, &other), Err(StockError::ItemMismatch { .. })));
        let zero = InventoryTransaction::new("1", 0, TransactionType::Adjustment);
        assert_eq!(apply_transaction(&mut it, &zero), Err(StockError::ZeroChange));
    }

    #[test]
    fn low_stock_uses_reorder_point() {
        assert!(is_low_stock(&item("1", "a", 5, Some(5))));
        assert!(!is_low_stock(&item("1", "a", 6, Some(5))));
        assert!(!is_low_stock(&item("1", "a", 0, None)));
    }

    #[test]
    fn suggestions_worst_first() {
        let items = vec![
            item("1", "Bolt", 9, Some(10)),
            item("2", "Nut", 0, Some(20)),
            item("3", "Washer", 100, Some(10)),
            item("4", "Anchor", 9, Some(10)),
            item("5", "Glue", 0, None),
        ];
        let names: Vec<_> = reorder_suggestions(&items).iter().map(|i| i.item_name.as_str()).collect();
        assert_eq!(names, ["Nut", "Anchor", "Bolt"]);
    }
}
