//! `h10cm projects ...`

use anyhow::Result;
use h10cm_tracking::model::ProjectStatus;

use super::{fmt_date, or_dash, print_json, Output, Session};

pub async fn list(session: &Session, output: Output) -> Result<()> {
    let projects = session.client.list_projects().await?;
    if output.is_json() {
        return print_json(&projects);
    }
    if projects.is_empty() {
        println!("No projects.");
        return Ok(());
    }
    println!("{:8} {:32} {:8} {:12} {:12}", "ID", "NAME", "TYPE", "STATUS", "MODIFIED");
    for p in &projects {
        println!(
            "{:8} {:32} {:8} {:12} {:12}",
            p.project_id,
            p.project_name,
            or_dash(Some(&p.project_type)),
            p.status,
            fmt_date(p.last_modified.or(p.date_created)),
        );
    }
    Ok(())
}

pub async fn show(session: &Session, project_id: &str, output: Output) -> Result<()> {
    let project = session.client.get_project(project_id).await?;
    if output.is_json() {
        return print_json(&project);
    }
    println!("Project:     {} ({})", project.project_name, project.project_id);
    println!("Type:        {}", or_dash(Some(&project.project_type)));
    println!("Status:      {} - {}", project.status, project.status.description());
    println!("Description: {}", or_dash(project.project_description.as_deref()));
    println!("Created:     {}", fmt_date(project.date_created));
    println!("Modified:    {}", fmt_date(project.last_modified));
    Ok(())
}

pub async fn set_status(session: &Session, project_id: &str, status: &str) -> Result<()> {
    let status = ProjectStatus::from(status.to_string());
    if let ProjectStatus::Other(s) = &status {
        let known: Vec<&str> = ProjectStatus::ALL.iter().map(|s| s.as_str()).collect();
        anyhow::bail!("Unknown project status \"{}\". Expected one of: {}.", s, known.join(", "));
    }
    session.client.set_project_status(project_id, &status).await?;
    println!("Project {} is now {}.", project_id, status);
    Ok(())
}

pub async fn stats(session: &Session, project_id: &str, output: Output) -> Result<()> {
    let stats = session.client.project_stats(project_id).await?;
    if output.is_json() {
        return print_json(&stats);
    }
    println!("Units:           {}", stats.total_units);
    println!("Shipped:         {}", stats.shipped_units);
    println!("Steps:           {}", stats.total_steps);
    println!("Completed steps: {}", stats.completed_steps);
    println!("Step progress:   {}%", stats.average_step_progress);
    Ok(())
}
