//! `h10cm units ...`: unit listing and batch actions.

use std::sync::Arc;

use anyhow::Result;
use h10cm_tracking::attributes::{save_attributes, AttributeDraft};
use h10cm_tracking::model::{AttributeDefinition, ProductionUnit, StepStatus};
use h10cm_tracking::selection::Selection;
use h10cm_tracking::serial::{next_serial, SerialPrefixes};
use h10cm_tracking::{
    last_completed_step_info, partition, BatchApplier, Bucket, CreateUnits, TransitionPolicy, UnitStore,
};

use super::{fmt_date, or_dash, print_json, report_batch, Output, Session};

fn applier(session: &Session) -> BatchApplier {
    let store: Arc<dyn UnitStore> = session.client.clone();
    BatchApplier::new(store).with_max_in_flight(session.config.max_in_flight)
}

/// Item ids a batch acts on.
///
/// Explicit targets (item ids or serial numbers) win; otherwise every
/// unit of `bucket` is selected the way a fresh selection would be. In
/// both cases `exclude` is removed afterwards.
fn select_ids(
    units: &[ProductionUnit],
    bucket: Bucket,
    targets: &[String],
    exclude: &[String],
) -> Result<Vec<String>> {
    let resolve = |key: &str| -> Result<String> {
        units
            .iter()
            .find(|u| u.item_id == key || u.unit_serial_number == key)
            .map(|u| u.item_id.clone())
            .ok_or_else(|| anyhow::anyhow!("Unit \"{}\" not found in this project.", key))
    };

    if !targets.is_empty() {
        let excluded = exclude.iter().map(|k| resolve(k)).collect::<Result<Vec<_>>>()?;
        let mut ids = Vec::with_capacity(targets.len());
        for key in targets {
            let id = resolve(key)?;
            if !excluded.contains(&id) && !ids.contains(&id) {
                ids.push(id);
            }
        }
        return Ok(ids);
    }

    let parts = partition(units);
    let mut selection = Selection::new(bucket);
    selection.sync(bucket, parts.bucket(bucket).iter().map(|u| u.item_id.as_str()));
    for key in exclude {
        selection.set(&resolve(key)?, false);
    }
    Ok(selection.selected_ids())
}

pub async fn list(session: &Session, project_id: &str, bucket: Option<Bucket>, output: Output) -> Result<()> {
    let units = session.client.list_units(project_id).await?;
    let catalog = session.client.step_catalog(project_id).await?;
    let parts = partition(&units);

    if output.is_json() {
        return match bucket {
            Some(b) => print_json(parts.bucket(b)),
            None => print_json(&parts),
        };
    }

    let buckets: Vec<Bucket> = match bucket {
        Some(b) => vec![b],
        None => Bucket::ALL.to_vec(),
    };
    for b in buckets {
        let rows = parts.bucket(b);
        println!("{} ({})", b, rows.len());
        if rows.is_empty() {
            continue;
        }
        println!("  {:8} {:14} {:14} {:24} {:12}", "ID", "SERIAL", "PCB", "LAST STEP", "DATE");
        for u in rows {
            let last = last_completed_step_info(u, &catalog);
            let date = match b {
                Bucket::InProgress => last.date,
                Bucket::Completed => u.date_fully_completed,
                Bucket::Shipped => u.shipped_date,
            };
            println!(
                "  {:8} {:14} {:14} {:24} {:12}",
                u.item_id,
                u.unit_serial_number,
                or_dash(u.pcb_serial_number.as_deref()),
                last.name,
                fmt_date(date),
            );
        }
    }
    Ok(())
}

pub async fn show(session: &Session, project_id: &str, unit: &str, output: Output) -> Result<()> {
    let units = session.client.list_units(project_id).await?;
    let item_id = select_ids(&units, Bucket::InProgress, &[unit.to_string()], &[])?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("Unit \"{}\" not found.", unit))?;
    let unit = session.client.get_unit(&item_id).await?;
    if output.is_json() {
        return print_json(&unit);
    }

    let catalog = session.client.step_catalog(project_id).await?;
    let definitions = session.client.list_attribute_definitions(project_id).await?;
    let last = last_completed_step_info(&unit, &catalog);

    println!("Unit:      {} (id {})", unit.unit_serial_number, unit.item_id);
    println!("PCB:       {}", or_dash(unit.pcb_serial_number.as_deref()));
    println!("State:     {}", Bucket::of(&unit));
    println!("Completed: {}", fmt_date(unit.date_fully_completed));
    if unit.is_shipped {
        println!("Shipped:   {}", fmt_date(unit.shipped_date));
    }
    println!(
        "Last step: {} ({} by {})",
        last.name,
        fmt_date(last.date),
        or_dash(last.completed_by.as_deref())
    );

    println!();
    println!("  {:6} {:28} {:12} {:12} {}", "ORDER", "STEP", "STATUS", "DATE", "BY");
    for step in catalog.iter() {
        let entry = unit.step_status(&step.step_id);
        println!(
            "  {:6} {:28} {:12} {:12} {}",
            step.step_order,
            step.step_name,
            unit.status_of(&step.step_id),
            fmt_date(entry.and_then(|e| e.completed_date)),
            or_dash(entry.and_then(|e| e.completed_by.as_deref())),
        );
    }

    if !definitions.is_empty() {
        println!();
        for def in &definitions {
            let marker = if def.is_required { "*" } else { " " };
            let value = unit.attributes.get(&def.attribute_definition_id).map(String::as_str);
            println!("  {}{:27} {}", marker, def.attribute_name, or_dash(value));
        }
    }
    Ok(())
}

/// Create `quantity` units. Serials default to the next free ones for the
/// project type's prefixes.
pub async fn add(
    session: &Session,
    project_id: &str,
    quantity: usize,
    start: Option<String>,
    pcb_start: Option<String>,
    output: Output,
) -> Result<()> {
    let project = session.client.get_project(project_id).await?;
    let units = session.client.list_units(project_id).await?;
    let catalog = session.client.step_catalog(project_id).await?;
    if catalog.is_empty() {
        tracing::warn!(project_id, "project has no steps; units will start without step entries");
    }

    let prefixes = SerialPrefixes::for_project_type(&project.project_type);
    let start = start.unwrap_or_else(|| {
        next_serial(units.iter().map(|u| u.unit_serial_number.as_str()), prefixes.unit)
    });
    let pcb_start = pcb_start.or_else(|| {
        prefixes.pcb.map(|prefix| {
            next_serial(units.iter().filter_map(|u| u.pcb_serial_number.as_deref()), prefix)
        })
    });

    let report = applier(session)
        .create_units(CreateUnits {
            project_id,
            catalog: &catalog,
            quantity,
            start_serial: &start,
            pcb_start_serial: pcb_start.as_deref(),
        })
        .await?;
    report_batch("Create units", &report, output)
}

#[allow(clippy::too_many_arguments)]
pub async fn apply(
    session: &Session,
    project_id: &str,
    step: &str,
    status: StepStatus,
    targets: &[String],
    exclude: &[String],
    forward_only: bool,
    output: Output,
) -> Result<()> {
    let catalog = session.client.step_catalog(project_id).await?;
    let step = catalog
        .resolve(step)
        .ok_or_else(|| anyhow::anyhow!("Step \"{}\" not found in project {}.", step, project_id))?;
    let units = session.client.list_units(project_id).await?;
    let ids = select_ids(&units, Bucket::InProgress, targets, exclude)?;
    if ids.is_empty() {
        println!("No units selected.");
        return Ok(());
    }

    let policy = if forward_only {
        TransitionPolicy::ForwardOnly
    } else {
        TransitionPolicy::Permissive
    };
    let report = applier(session)
        .with_policy(policy)
        .apply_status(&ids, &step.step_id, status, session.actor())
        .await;
    report_batch(&format!("{} -> {}", step.step_name, status), &report, output)
}

pub async fn ship(
    session: &Session,
    project_id: &str,
    targets: &[String],
    exclude: &[String],
    output: Output,
) -> Result<()> {
    let units = session.client.list_units(project_id).await?;
    let ids = select_ids(&units, Bucket::Completed, targets, exclude)?;
    if ids.is_empty() {
        println!("No completed units to ship.");
        return Ok(());
    }
    let report = applier(session).mark_shipped(&ids).await;
    report_batch("Ship", &report, output)
}

fn find_definition<'a>(definitions: &'a [AttributeDefinition], key: &str) -> Result<&'a AttributeDefinition> {
    definitions
        .iter()
        .find(|d| d.attribute_definition_id == key)
        .or_else(|| definitions.iter().find(|d| d.attribute_name.eq_ignore_ascii_case(key)))
        .ok_or_else(|| anyhow::anyhow!("Attribute \"{}\" is not defined for this project.", key))
}

/// Apply `NAME=VALUE` assignments and `--clear NAME` removals, then save.
pub async fn set_attr(
    session: &Session,
    project_id: &str,
    unit: &str,
    assignments: &[String],
    clear: &[String],
) -> Result<()> {
    let definitions = session.client.list_attribute_definitions(project_id).await?;
    let units = session.client.list_units(project_id).await?;
    let item_id = select_ids(&units, Bucket::InProgress, &[unit.to_string()], &[])?
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("Unit \"{}\" not found.", unit))?;
    let current = session.client.get_unit(&item_id).await?;

    let mut draft = AttributeDraft::from_unit(&current);
    for pair in assignments {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Expected NAME=VALUE, got \"{}\".", pair))?;
        let def = find_definition(&definitions, key.trim())?;
        draft.set(def.attribute_definition_id.clone(), value.trim());
    }
    for key in clear {
        let def = find_definition(&definitions, key)?;
        draft.clear(&def.attribute_definition_id);
    }

    if !draft.is_dirty() {
        println!("Nothing to change.");
        return Ok(());
    }
    save_attributes(&*session.client, &definitions, &item_id, &mut draft).await?;
    println!("Saved {} attribute(s) on {}.", draft.committed().len(), current.unit_serial_number);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use h10cm_tracking::model::UnitStepStatus;

    fn unit(id: &str, serial: &str, done: bool, shipped: bool) -> ProductionUnit {
        let mut s = UnitStepStatus::not_started("1");
        if done {
            s.status = StepStatus::Complete;
        }
        ProductionUnit {
            item_id: id.into(),
            unit_serial_number: serial.into(),
            pcb_serial_number: None,
            step_statuses: vec![s],
            is_shipped: shipped,
            shipped_date: None,
            date_fully_completed: None,
            attributes: Default::default(),
        }
    }

    fn fleet() -> Vec<ProductionUnit> {
        vec![
            unit("1", "PR-001", false, false),
            unit("2", "PR-002", false, false),
            unit("3", "PR-003", true, false),
            unit("4", "PR-004", true, true),
        ]
    }

    fn keys(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_to_whole_bucket() {
        let units = fleet();
        assert_eq!(select_ids(&units, Bucket::InProgress, &[], &[]).unwrap(), vec!["1", "2"]);
        assert_eq!(select_ids(&units, Bucket::Completed, &[], &[]).unwrap(), vec!["3"]);
        // Shipped units start unselected.
        assert!(select_ids(&units, Bucket::Shipped, &[], &[]).unwrap().is_empty());
    }

    #[test]
    fn exclude_by_serial() {
        let units = fleet();
        let ids = select_ids(&units, Bucket::InProgress, &[], &keys(&["PR-001"])).unwrap();
        assert_eq!(ids, vec!["2"]);
    }

    #[test]
    fn explicit_targets_resolve_and_dedup() {
        let units = fleet();
        let ids = select_ids(&units, Bucket::InProgress, &keys(&["PR-003", "3", "1"]), &keys(&["1"])).unwrap();
        assert_eq!(ids, vec!["3"]);
        assert!(select_ids(&units, Bucket::InProgress, &keys(&["PR-999"]), &[]).is_err());
    }
}
