use h10cm_tracking::model::{ProductionStep, StepCatalog, StepInput};
use reqwest::Method;
use tracing::info;

use crate::cache::QueryKey;
use crate::client::H10Client;
use crate::error::ApiError;

impl H10Client {
    pub async fn list_steps(&self, project_id: &str) -> Result<Vec<ProductionStep>, ApiError> {
        self.cache()
            .get_or_fetch(QueryKey::ProjectSteps(project_id.to_string()), || async move {
                self.get_list(&format!("/projects/{project_id}/steps")).await
            })
            .await
    }

    pub async fn step_catalog(&self, project_id: &str) -> Result<StepCatalog, ApiError> {
        Ok(StepCatalog::new(self.list_steps(project_id).await?))
    }

    pub async fn create_step(&self, input: &StepInput) -> Result<ProductionStep, ApiError> {
        let step: ProductionStep = self
            .send_json(Method::POST, &format!("/projects/{}/steps", input.project_id), input)
            .await?;
        self.cache().invalidate(&QueryKey::ProjectSteps(input.project_id.clone())).await;
        info!(project_id = %input.project_id, step_id = %step.step_id, "step created");
        Ok(step)
    }

    pub async fn update_step_definition(&self, step_id: &str, input: &StepInput) -> Result<(), ApiError> {
        self.send_discard(
            Method::PUT,
            &format!("/projects/{}/steps/{step_id}", input.project_id),
            Some(input),
        )
        .await?;
        self.cache().invalidate(&QueryKey::ProjectSteps(input.project_id.clone())).await;
        Ok(())
    }

    /// Delete a step. Every cached step list is dropped, not just this project's.
    pub async fn delete_step(&self, project_id: &str, step_id: &str) -> Result<(), ApiError> {
        self.send_discard::<()>(Method::DELETE, &format!("/projects/{project_id}/steps/{step_id}"), None)
            .await?;
        self.cache()
            .invalidate_where(|k| matches!(k, QueryKey::ProjectSteps(_)));
        info!(project_id, step_id, "step deleted");
        Ok(())
    }
}
