//! Unit attribute validation and the edit buffer.

use std::collections::BTreeMap;

use h10cm_core::{ServiceError, Timestamp};
use thiserror::Error;
use tracing::debug;

use crate::model::{AttributeDefinition, AttributeType, AttributeValue, ProductionUnit};
use crate::store::UnitStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttributeError {
    #[error("unknown attribute definition {0}")]
    Unknown(String),

    #[error("attribute {0} is required")]
    Missing(String),

    #[error("attribute {name} expects a {expected:?} value, got {value:?}")]
    TypeMismatch {
        name: String,
        expected: AttributeType,
        value: String,
    },
}

impl From<AttributeError> for ServiceError {
    fn from(err: AttributeError) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

/// Check a full attribute set against the project's definitions.
///
/// Empty values count as absent. Every problem is returned, not just the first.
pub fn validate_attributes(
    definitions: &[AttributeDefinition],
    values: &BTreeMap<String, String>,
) -> Result<(), Vec<AttributeError>> {
    let mut errors = Vec::new();
    for id in values.keys() {
        if !definitions.iter().any(|d| &d.attribute_definition_id == id) {
            errors.push(AttributeError::Unknown(id.clone()));
        }
    }
    for def in definitions {
        let value = values
            .get(&def.attribute_definition_id)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty());
        match value {
            None if def.is_required => errors.push(AttributeError::Missing(def.attribute_name.clone())),
            None => {}
            Some(v) if !value_matches(def.attribute_type, v) => {
                errors.push(AttributeError::TypeMismatch {
                    name: def.attribute_name.clone(),
                    expected: def.attribute_type,
                    value: v.to_string(),
                })
            }
            Some(_) => {}
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn value_matches(ty: AttributeType, value: &str) -> bool {
    match ty {
        AttributeType::Text => true,
        AttributeType::Number => value.parse::<f64>().is_ok_and(f64::is_finite),
        AttributeType::Date => Timestamp::parse(value).is_some(),
        AttributeType::Boolean => matches!(
            value.to_ascii_lowercase().as_str(),
            "true" | "false" | "yes" | "no" | "1" | "0"
        ),
    }
}

/// Attribute edit buffer: `committed` mirrors the stored values, `draft`
/// holds the pending edit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeDraft {
    committed: BTreeMap<String, String>,
    draft: BTreeMap<String, String>,
}

impl AttributeDraft {
    pub fn new(committed: BTreeMap<String, String>) -> Self {
        Self {
            draft: committed.clone(),
            committed,
        }
    }

    pub fn from_unit(unit: &ProductionUnit) -> Self {
        Self::new(unit.attributes.clone())
    }

    pub fn set(&mut self, definition_id: impl Into<String>, value: impl Into<String>) {
        self.draft.insert(definition_id.into(), value.into());
    }

    pub fn clear(&mut self, definition_id: &str) {
        self.draft.remove(definition_id);
    }

    pub fn get(&self, definition_id: &str) -> Option<&str> {
        self.draft.get(definition_id).map(String::as_str)
    }

    pub fn draft(&self) -> &BTreeMap<String, String> {
        &self.draft
    }

    pub fn committed(&self) -> &BTreeMap<String, String> {
        &self.committed
    }

    pub fn is_dirty(&self) -> bool {
        self.draft != self.committed
    }

    /// Draft values in wire form.
    pub fn values(&self) -> Vec<AttributeValue> {
        self.draft
            .iter()
            .map(|(id, v)| AttributeValue {
                attribute_definition_id: id.clone(),
                attribute_value: v.clone(),
            })
            .collect()
    }

    /// Promote the draft and return the values to save.
    pub fn commit(&mut self) -> Vec<AttributeValue> {
        self.committed = self.draft.clone();
        self.values()
    }

    /// Drop pending edits.
    pub fn discard(&mut self) {
        self.draft = self.committed.clone();
    }
}

/// Validate and save the draft for `item_id`, committing only once the
/// store accepted it. A rejected or failed save leaves the draft dirty.
pub async fn save_attributes(
    store: &dyn UnitStore,
    definitions: &[AttributeDefinition],
    item_id: &str,
    draft: &mut AttributeDraft,
) -> Result<(), ServiceError> {
    if let Err(errors) = validate_attributes(definitions, draft.draft()) {
        let message = errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ");
        return Err(ServiceError::Validation(message));
    }
    store.save_attributes(item_id, &draft.values()).await?;
    draft.commit();
    debug!(item_id, count = draft.committed().len(), "saved attributes");
    Ok(())
}
