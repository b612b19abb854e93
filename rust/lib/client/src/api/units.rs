use std::collections::BTreeMap;

use async_trait::async_trait;
use h10cm_core::types::id_string;
use h10cm_core::ServiceError;
use h10cm_tracking::model::{AttributeValue, NewUnit, ProductionUnit};
use h10cm_tracking::progress::reconcile_completion;
use h10cm_tracking::store::{ShipUpdate, StepUpdate, UnitStore};
use reqwest::Method;
use serde::Deserialize;

use crate::cache::QueryKey;
use crate::client::H10Client;
use crate::error::ApiError;

/// Creation answers carry at least the new id; the rest may be omitted.
#[derive(Deserialize)]
struct Created {
    #[serde(with = "id_string")]
    item_id: String,
}

impl H10Client {
    /// Units of a project. `date_fully_completed` is re-derived from the
    /// step statuses rather than trusted from the backend.
    pub async fn list_units(&self, project_id: &str) -> Result<Vec<ProductionUnit>, ApiError> {
        self.cache()
            .get_or_fetch(QueryKey::TrackedItems(project_id.to_string()), || async move {
                let mut units: Vec<ProductionUnit> =
                    self.get_list(&format!("/projects/{project_id}/tracked-items")).await?;
                units.iter_mut().for_each(|u| {
                    reconcile_completion(u);
                });
                Ok(units)
            })
            .await
    }

    pub async fn get_unit(&self, item_id: &str) -> Result<ProductionUnit, ApiError> {
        self.cache()
            .get_or_fetch(QueryKey::TrackedItemDetails(item_id.to_string()), || async move {
                let mut unit: ProductionUnit = self.get_one(&format!("/tracked-items/{item_id}")).await?;
                reconcile_completion(&mut unit);
                Ok(unit)
            })
            .await
    }

    pub async fn create_unit(&self, unit: &NewUnit) -> Result<ProductionUnit, ApiError> {
        let created: Created = self
            .send_json(Method::POST, &format!("/projects/{}/tracked-items", unit.project_id), unit)
            .await?;
        self.cache().invalidate(&QueryKey::TrackedItems(unit.project_id.clone())).await;
        let mut out = ProductionUnit {
            item_id: created.item_id,
            unit_serial_number: unit.unit_serial_number.clone(),
            pcb_serial_number: unit.pcb_serial_number.clone(),
            step_statuses: unit.step_statuses.clone(),
            is_shipped: false,
            shipped_date: None,
            date_fully_completed: None,
            attributes: BTreeMap::new(),
        };
        reconcile_completion(&mut out);
        Ok(out)
    }

    pub async fn update_unit_step(&self, item_id: &str, update: &StepUpdate) -> Result<(), ApiError> {
        self.send_discard(
            Method::PUT,
            &format!("/tracked-items/{item_id}/steps/{}", update.step_id),
            Some(update),
        )
        .await?;
        self.invalidate_unit(item_id).await;
        Ok(())
    }

    pub async fn ship_unit(&self, item_id: &str, update: &ShipUpdate) -> Result<(), ApiError> {
        self.send_discard(Method::PUT, &format!("/tracked-items/{item_id}"), Some(update))
            .await?;
        self.invalidate_unit(item_id).await;
        Ok(())
    }

    pub async fn put_unit_attributes(&self, item_id: &str, values: &[AttributeValue]) -> Result<(), ApiError> {
        self.send_discard(Method::PUT, &format!("/tracked-items/{item_id}/attributes"), Some(values))
            .await?;
        self.invalidate_unit(item_id).await;
        Ok(())
    }

    /// The owning project is not known from a unit id alone, so every
    /// cached unit list is dropped along with the unit's detail.
    async fn invalidate_unit(&self, item_id: &str) {
        self.cache()
            .invalidate(&QueryKey::TrackedItemDetails(item_id.to_string()))
            .await;
        self.cache()
            .invalidate_where(|k| matches!(k, QueryKey::TrackedItems(_)));
    }
}

#[async_trait]
impl UnitStore for H10Client {
    async fn list_units(&self, project_id: &str) -> Result<Vec<ProductionUnit>, ServiceError> {
        Ok(H10Client::list_units(self, project_id).await?)
    }

    /// Always fetched fresh: batch actions decide on the current state.
    async fn get_unit(&self, item_id: &str) -> Result<ProductionUnit, ServiceError> {
        self.cache()
            .invalidate(&QueryKey::TrackedItemDetails(item_id.to_string()))
            .await;
        Ok(H10Client::get_unit(self, item_id).await?)
    }

    async fn create_unit(&self, unit: &NewUnit) -> Result<ProductionUnit, ServiceError> {
        Ok(H10Client::create_unit(self, unit).await?)
    }

    async fn update_step(&self, item_id: &str, update: &StepUpdate) -> Result<(), ServiceError> {
        Ok(self.update_unit_step(item_id, update).await?)
    }

    async fn mark_shipped(&self, item_id: &str, update: &ShipUpdate) -> Result<(), ServiceError> {
        Ok(self.ship_unit(item_id, update).await?)
    }

    async fn save_attributes(&self, item_id: &str, values: &[AttributeValue]) -> Result<(), ServiceError> {
        Ok(self.put_unit_attributes(item_id, values).await?)
    }
}
