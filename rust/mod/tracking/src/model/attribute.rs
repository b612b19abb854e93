use std::collections::BTreeMap;

use h10cm_core::types::{id_string, opt_id_string};
use serde::{Deserialize, Deserializer, Serialize};

/// Value type of a project-defined attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeType {
    Text,
    Number,
    Date,
    Boolean,
}

impl Default for AttributeType {
    fn default() -> Self {
        Self::Text
    }
}

/// AttributeDefinition: a dynamically named field a project attaches to its units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttributeDefinition {
    #[serde(with = "id_string")]
    pub attribute_definition_id: String,

    #[serde(default, with = "opt_id_string", skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    pub attribute_name: String,

    #[serde(default)]
    pub attribute_type: AttributeType,

    #[serde(default)]
    pub is_required: bool,

    #[serde(default)]
    pub display_order: i32,
}

/// One attribute value as exchanged with `/tracked-items/:id/attributes`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttributeValue {
    #[serde(with = "id_string")]
    pub attribute_definition_id: String,
    pub attribute_value: String,
}

/// Serde adapter for a unit's attribute bag.
///
/// Written as a JSON object `{definition_id: value}`. Read from either that
/// object form or a list of [`AttributeValue`] records; non-string scalar
/// values are stringified.
pub mod attribute_map {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Map(BTreeMap<String, serde_json::Value>),
        List(Vec<AttributeValue>),
    }

    pub fn serialize<S: serde::Serializer>(
        value: &BTreeMap<String, String>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<String, String>, D::Error> {
        let raw: Option<Raw> = Option::deserialize(deserializer)?;
        Ok(match raw {
            None => BTreeMap::new(),
            Some(Raw::List(items)) => items
                .into_iter()
                .map(|v| (v.attribute_definition_id, v.attribute_value))
                .collect(),
            Some(Raw::Map(map)) => map
                .into_iter()
                .filter_map(|(k, v)| match v {
                    serde_json::Value::Null => None,
                    serde_json::Value::String(s) => Some((k, s)),
                    other => Some((k, other.to_string())),
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, with = "attribute_map")]
        attributes: BTreeMap<String, String>,
    }

    #[test]
    fn reads_list_form() {
        let h: Holder = serde_json::from_str(
            r#"{"attributes": [{"attribute_definition_id": 3, "attribute_value": "blue"}]}"#,
        )
        .unwrap();
        assert_eq!(h.attributes.get("3").map(String::as_str), Some("blue"));
    }

    #[test]
    fn reads_map_form_and_stringifies() {
        let h: Holder =
            serde_json::from_str(r#"{"attributes": {"1": "x", "2": 12, "3": null}}"#).unwrap();
        assert_eq!(h.attributes.len(), 2);
        assert_eq!(h.attributes["2"], "12");
    }

    #[test]
    fn missing_or_null_is_empty() {
        let h: Holder = serde_json::from_str(r#"{}"#).unwrap();
        assert!(h.attributes.is_empty());
        let h: Holder = serde_json::from_str(r#"{"attributes": null}"#).unwrap();
        assert!(h.attributes.is_empty());
    }
}
