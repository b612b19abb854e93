//! `h10cm inventory ...`

use anyhow::Result;
use h10cm_inventory::model::{InventoryItem, InventoryTransaction, TransactionType};
use h10cm_inventory::stock::{apply_transaction, is_low_stock, shortfall};

use super::{or_dash, print_json, Output, Session};

fn print_items(items: &[InventoryItem]) {
    println!(
        "{:8} {:28} {:16} {:>8} {:>8} {:6} {}",
        "ID", "NAME", "PART", "STOCK", "REORDER", "UOM", ""
    );
    for i in items {
        let reorder = i.reorder_point.map(|r| r.to_string()).unwrap_or_else(|| "-".into());
        let flag = if is_low_stock(i) { "LOW" } else { "" };
        println!(
            "{:8} {:28} {:16} {:>8} {:>8} {:6} {}",
            i.inventory_item_id,
            i.item_name,
            or_dash(i.part_number.as_deref()),
            i.current_stock_level,
            reorder,
            i.unit_of_measure,
            flag,
        );
    }
}

pub async fn list(session: &Session, output: Output) -> Result<()> {
    let items = session.client.list_inventory().await?;
    if output.is_json() {
        return print_json(&items);
    }
    if items.is_empty() {
        println!("No inventory items.");
        return Ok(());
    }
    print_items(&items);
    Ok(())
}

/// Post a signed stock change. A change that would take stock below zero
/// is refused before anything is sent.
pub async fn adjust(
    session: &Session,
    item_id: &str,
    change: i64,
    kind: Option<String>,
    notes: Option<String>,
) -> Result<()> {
    let mut item = session.client.get_inventory_item(item_id).await?;
    let transaction_type = kind.map(TransactionType::from).unwrap_or_default();
    let mut tx = InventoryTransaction::new(item.inventory_item_id.clone(), change, transaction_type);
    tx.user_name = Some(session.actor().to_string());
    tx.notes = notes;

    let before = item.current_stock_level;
    let after = apply_transaction(&mut item, &tx)?;
    session.client.adjust_stock(&tx).await?;
    println!("{}: {} -> {} {}", item.item_name, before, after, item.unit_of_measure);
    if is_low_stock(&item) {
        println!("  below reorder point by {}", shortfall(&item).unwrap_or(0));
    }
    Ok(())
}

pub async fn low(session: &Session, output: Output) -> Result<()> {
    let items = session.client.low_stock().await?;
    if output.is_json() {
        return print_json(&items);
    }
    if items.is_empty() {
        println!("Nothing at or below its reorder point.");
        return Ok(());
    }
    print_items(&items);
    Ok(())
}
