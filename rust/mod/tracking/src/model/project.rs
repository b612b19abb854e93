use std::fmt;

use h10cm_core::types::{id_string, opt_timestamp};
use h10cm_core::Timestamp;
use serde::{Deserialize, Serialize};

/// Project lifecycle status. Unknown strings from the backend are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProjectStatus {
    Active,
    Inactive,
    Planning,
    Completed,
    Archived,
    OnHold,
    Other(String),
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 6] = [
        ProjectStatus::Active,
        ProjectStatus::Inactive,
        ProjectStatus::Planning,
        ProjectStatus::Completed,
        ProjectStatus::Archived,
        ProjectStatus::OnHold,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ProjectStatus::Active => "Active",
            ProjectStatus::Inactive => "Inactive",
            ProjectStatus::Planning => "Planning",
            ProjectStatus::Completed => "Completed",
            ProjectStatus::Archived => "Archived",
            ProjectStatus::OnHold => "On Hold",
            ProjectStatus::Other(s) => s,
        }
    }

    /// Dashboard ordering; unknown statuses sort last.
    pub fn priority(&self) -> u32 {
        match self {
            ProjectStatus::Active => 1,
            ProjectStatus::Planning => 2,
            ProjectStatus::Completed => 3,
            ProjectStatus::OnHold => 4,
            ProjectStatus::Inactive => 5,
            ProjectStatus::Archived => 6,
            ProjectStatus::Other(_) => 999,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ProjectStatus::Active => "Production is currently ongoing",
            ProjectStatus::Inactive => "No current production planned",
            ProjectStatus::Planning => "Project is being planned",
            ProjectStatus::Completed => "All production completed",
            ProjectStatus::Archived => "Project has been archived",
            ProjectStatus::OnHold => "Production temporarily paused",
            ProjectStatus::Other(_) => "",
        }
    }
}

impl Default for ProjectStatus {
    fn default() -> Self {
        Self::Planning
    }
}

impl From<String> for ProjectStatus {
    fn from(s: String) -> Self {
        let norm = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        match norm.as_str() {
            "active" => ProjectStatus::Active,
            "inactive" => ProjectStatus::Inactive,
            "planning" => ProjectStatus::Planning,
            "completed" => ProjectStatus::Completed,
            "archived" => ProjectStatus::Archived,
            "on hold" | "onhold" => ProjectStatus::OnHold,
            _ => ProjectStatus::Other(s),
        }
    }
}

impl From<ProjectStatus> for String {
    fn from(s: ProjectStatus) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Project: a production program whose units share one step catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    #[serde(with = "id_string")]
    pub project_id: String,

    pub project_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_description: Option<String>,

    /// e.g. "PR" (production run) or "ASSY"; drives serial prefixes.
    #[serde(default)]
    pub project_type: String,

    #[serde(default)]
    pub status: ProjectStatus,

    #[serde(default, with = "opt_timestamp", skip_serializing_if = "Option::is_none")]
    pub date_created: Option<Timestamp>,

    #[serde(default, with = "opt_timestamp", skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<Timestamp>,
}
