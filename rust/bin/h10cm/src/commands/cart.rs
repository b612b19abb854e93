//! `h10cm cart ...`: the local pending-orders cart.

use anyhow::Result;
use h10cm_client::OrderSubmitter;
use h10cm_inventory::cart::{CartItem, CartItemKind, CartStore};

use super::{print_json, Output, Session};

/// What to put in the cart.
pub enum NewLine {
    /// Reorder of an existing inventory item.
    Reorder { item_id: String },
    /// A part not yet in inventory.
    Part {
        name: String,
        unit_of_measure: String,
        part_number: Option<String>,
        cost: Option<f64>,
        supplier: Option<String>,
    },
}

fn open(session: &Session) -> Result<CartStore> {
    Ok(CartStore::open(&session.config.resolve_cart_path())?)
}

pub async fn add(session: &Session, line: NewLine, quantity: u32, notes: Option<String>) -> Result<()> {
    let mut item = match line {
        NewLine::Reorder { item_id } => {
            let inv = session.client.get_inventory_item(&item_id).await?;
            CartItem::reorder(&inv, quantity)
        }
        NewLine::Part {
            name,
            unit_of_measure,
            part_number,
            cost,
            supplier,
        } => {
            let mut item = CartItem::new_part(name, unit_of_measure, quantity);
            item.part_number = part_number;
            item.estimated_cost = cost;
            item.supplier = supplier;
            item
        }
    };
    item.notes = notes;

    let stored = open(session)?.add(item)?;
    println!("{} x {} in cart (id {}).", stored.quantity, stored.item_name, stored.id);
    Ok(())
}

pub fn list(session: &Session, output: Output) -> Result<()> {
    let cart = open(session)?;
    let items = cart.list()?;
    let summary = cart.summary()?;
    if output.is_json() {
        return print_json(&serde_json::json!({ "items": items, "summary": summary }));
    }
    if items.is_empty() {
        println!("Cart is empty.");
        return Ok(());
    }
    println!("{:34} {:8} {:28} {:>6} {:>10}", "ID", "TYPE", "NAME", "QTY", "COST");
    for i in &items {
        let kind = match i.kind {
            CartItemKind::New => "new",
            CartItemKind::Reorder => "reorder",
        };
        println!("{:34} {:8} {:28} {:>6} {:>10.2}", i.id, kind, i.item_name, i.quantity, i.line_cost());
        if let Some(n) = i.notes.as_deref() {
            println!("{:34} {}", "", n);
        }
    }
    println!();
    println!(
        "{} item(s), {} unit(s), est. {:.2} ({} new, {} reorder)",
        summary.total_items,
        summary.total_quantity,
        summary.estimated_total_cost,
        summary.new_items_count,
        summary.reorder_items_count
    );
    Ok(())
}

/// Change a line's quantity, or drop it entirely.
pub fn remove(session: &Session, id: &str, quantity: Option<u32>) -> Result<()> {
    let cart = open(session)?;
    match quantity {
        Some(q) => {
            let item = cart.update_quantity(id, q)?;
            println!("{} now {} x.", item.item_name, item.quantity);
        }
        None => {
            cart.remove(id)?;
            println!("Removed {} from cart.", id);
        }
    }
    Ok(())
}

pub fn clear(session: &Session) -> Result<()> {
    let n = open(session)?.clear()?;
    println!("Removed {} item(s).", n);
    Ok(())
}

/// Submit every cart line as an order; failed lines stay in the cart.
pub async fn submit(session: &Session, output: Output) -> Result<()> {
    let cart = open(session)?;
    let sink = OrderSubmitter::new(&session.client, session.actor());
    let result = cart.submit(&sink).await?;
    if output.is_json() {
        print_json(&result)?;
    } else {
        println!("{}", result.message);
        for f in &result.failed_items {
            println!("  {:34} {}", f.cart_item_id, f.error);
        }
    }
    if !result.success {
        anyhow::bail!("{} cart item(s) were not submitted", result.failed_items.len());
    }
    Ok(())
}
