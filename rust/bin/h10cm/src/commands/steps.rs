//! `h10cm steps ...`

use anyhow::Result;
use h10cm_tracking::model::StepInput;

use super::{or_dash, print_json, Output, Session};

pub async fn list(session: &Session, project_id: &str, output: Output) -> Result<()> {
    let catalog = session.client.step_catalog(project_id).await?;
    if output.is_json() {
        return print_json(&catalog.iter().collect::<Vec<_>>());
    }
    if catalog.is_empty() {
        println!("No steps defined for project {}.", project_id);
        return Ok(());
    }
    println!("{:6} {:8} {:28} {}", "ORDER", "ID", "NAME", "DESCRIPTION");
    for s in catalog.iter() {
        println!(
            "{:6} {:8} {:28} {}",
            s.step_order,
            s.step_id,
            s.step_name,
            or_dash(s.step_description.as_deref())
        );
    }
    Ok(())
}

/// Add a step. Without `--order` it goes after the last one.
pub async fn add(
    session: &Session,
    project_id: &str,
    name: &str,
    order: Option<i32>,
    description: Option<String>,
) -> Result<()> {
    if name.trim().is_empty() {
        anyhow::bail!("Step name cannot be empty.");
    }
    let step_order = match order {
        Some(o) => o,
        None => {
            let catalog = session.client.step_catalog(project_id).await?;
            catalog.iter().map(|s| s.step_order).max().unwrap_or(0) + 1
        }
    };
    let step = session
        .client
        .create_step(&StepInput {
            project_id: project_id.to_string(),
            step_name: name.trim().to_string(),
            step_order,
            step_description: description,
        })
        .await?;
    println!("Step \"{}\" created (id {}, order {}).", step.step_name, step.step_id, step.step_order);
    Ok(())
}

/// Rename, reorder or re-describe a step; unset fields keep their value.
pub async fn edit(
    session: &Session,
    project_id: &str,
    step: &str,
    name: Option<String>,
    order: Option<i32>,
    description: Option<String>,
) -> Result<()> {
    let catalog = session.client.step_catalog(project_id).await?;
    let current = catalog
        .resolve(step)
        .ok_or_else(|| anyhow::anyhow!("Step \"{}\" not found in project {}.", step, project_id))?;
    let input = StepInput {
        project_id: project_id.to_string(),
        step_name: name.unwrap_or_else(|| current.step_name.clone()),
        step_order: order.unwrap_or(current.step_order),
        step_description: description.or_else(|| current.step_description.clone()),
    };
    session.client.update_step_definition(&current.step_id, &input).await?;
    println!("Step {} updated.", current.step_id);
    Ok(())
}

pub async fn delete(session: &Session, project_id: &str, step: &str) -> Result<()> {
    let catalog = session.client.step_catalog(project_id).await?;
    let target = catalog
        .resolve(step)
        .ok_or_else(|| anyhow::anyhow!("Step \"{}\" not found in project {}.", step, project_id))?;
    session.client.delete_step(project_id, &target.step_id).await?;
    println!("Step \"{}\" deleted.", target.step_name);
    Ok(())
}
