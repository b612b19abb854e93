use h10cm_tracking::model::{Project, ProjectStatus};
use h10cm_tracking::stats::{project_stats, sort_projects, ProjectStats};
use reqwest::Method;
use serde_json::json;
use tracing::info;

use crate::cache::QueryKey;
use crate::client::H10Client;
use crate::error::ApiError;

impl H10Client {
    /// All projects in dashboard order.
    pub async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.cache()
            .get_or_fetch(QueryKey::Projects, || async move {
                let mut projects: Vec<Project> = self.get_list("/projects").await?;
                sort_projects(&mut projects);
                Ok(projects)
            })
            .await
    }

    pub async fn get_project(&self, project_id: &str) -> Result<Project, ApiError> {
        self.cache()
            .get_or_fetch(QueryKey::Project(project_id.to_string()), || async move {
                self.get_one(&format!("/projects/{project_id}")).await
            })
            .await
    }

    pub async fn set_project_status(&self, project_id: &str, status: &ProjectStatus) -> Result<(), ApiError> {
        self.send_discard(
            Method::PUT,
            &format!("/projects/{project_id}"),
            Some(&json!({ "status": status })),
        )
        .await?;
        self.cache().invalidate(&QueryKey::Projects).await;
        self.cache().invalidate(&QueryKey::Project(project_id.to_string())).await;
        info!(project_id, status = %status, "project status updated");
        Ok(())
    }

    /// Step-progress summary over the project's current units and steps.
    pub async fn project_stats(&self, project_id: &str) -> Result<ProjectStats, ApiError> {
        let units = self.list_units(project_id).await?;
        let steps = self.list_steps(project_id).await?;
        Ok(project_stats(&units, &steps))
    }
}
