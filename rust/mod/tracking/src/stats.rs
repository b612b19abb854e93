//! Project dashboard figures.

use serde::Serialize;

use crate::model::{ProductionStep, ProductionUnit, Project, StepStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProjectStats {
    pub total_units: usize,
    pub total_steps: usize,
    /// Complete entries across units not yet shipped.
    pub completed_steps: usize,
    /// Rounded percentage of completed steps over unshipped units.
    pub average_step_progress: u32,
    pub shipped_units: usize,
}

/// Step-progress summary of one project.
///
/// All zero when the project has no steps or no units. Shipped units are
/// counted but excluded from progress; N/A does not count as completed.
pub fn project_stats(units: &[ProductionUnit], steps: &[ProductionStep]) -> ProjectStats {
    if units.is_empty() || steps.is_empty() {
        return ProjectStats::default();
    }
    let shipped_units = units.iter().filter(|u| u.is_shipped).count();
    let completed_steps = units
        .iter()
        .filter(|u| !u.is_shipped)
        .flat_map(|u| u.step_statuses.iter())
        .filter(|s| s.status == StepStatus::Complete)
        .count();
    let active = units.len() - shipped_units;
    let average_step_progress = if active > 0 {
        let ratio = completed_steps as f64 / (active * steps.len()) as f64;
        (ratio * 100.0).round() as u32
    } else {
        0
    };
    ProjectStats {
        total_units: units.len(),
        total_steps: steps.len(),
        completed_steps,
        average_step_progress,
        shipped_units,
    }
}

/// Dashboard order: status priority, then name (case-insensitive).
pub fn sort_projects(projects: &mut [Project]) {
    projects.sort_by(|a, b| {
        a.status
            .priority()
            .cmp(&b.status.priority())
            .then_with(|| a.project_name.to_lowercase().cmp(&b.project_name.to_lowercase()))
    });
}
