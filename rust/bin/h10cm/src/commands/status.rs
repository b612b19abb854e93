//! `h10cm status`

use anyhow::Result;

use super::{print_json, Output, Session};

/// Check backend health for the current context.
pub async fn status(session: &Session, output: Output) -> Result<()> {
    let health = session.client.health().await?;
    if output.is_json() {
        return print_json(&health);
    }
    println!("Context: {}", session.context.name);
    println!("Server:  {}", session.client.base_url());
    println!("Status:  {} ({} ms)", health.status, health.latency.as_millis());
    for (key, value) in &health.details {
        println!("  {}: {}", key, value);
    }
    Ok(())
}
