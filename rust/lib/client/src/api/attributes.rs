use h10cm_tracking::model::AttributeDefinition;

use crate::cache::QueryKey;
use crate::client::H10Client;
use crate::error::ApiError;

impl H10Client {
    /// Attribute definitions of a project, in display order.
    pub async fn list_attribute_definitions(&self, project_id: &str) -> Result<Vec<AttributeDefinition>, ApiError> {
        self.cache()
            .get_or_fetch(QueryKey::ProjectAttributes(project_id.to_string()), || async move {
                let mut defs: Vec<AttributeDefinition> =
                    self.get_list(&format!("/projects/{project_id}/attributes")).await?;
                defs.sort_by_key(|d| d.display_order);
                Ok(defs)
            })
            .await
    }
}
