//! Payload types exchanged with the server.
//!
//! Manual actions and pipeline tabs are open-ended, operator-configured
//! definitions: the server owns their schema and may grow it. They are
//! modeled as explicit structures with the known fields enumerated and a
//! flattened map as the escape hatch, so unknown fields pass through a
//! deserialize/serialize round trip instead of being dropped.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A definition that cannot be used as configured.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct InvalidDefinition(String);

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server-assigned id.
    pub id: i64,
    /// Login name.
    pub login: String,
    /// Email address, when the forge shared one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Avatar image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Whether the user has server admin rights.
    #[serde(default)]
    pub admin: bool,
}

/// Outcome of a password login attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordLogin {
    /// Whether the credentials were accepted.
    pub success: bool,
    /// Human-readable rejection reason on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Bearer token to use for subsequent requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Token lifetime in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
}

/// A single input value a manual action collects before triggering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualActionField {
    /// Key the collected value is sent under.
    pub key: String,
    /// Display label.
    pub label: String,
    /// Whether a value must be supplied (or defaulted) to trigger.
    #[serde(default)]
    pub required: bool,
    /// Input placeholder text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Value used when none is supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Input widget hint (`text`, `password`, ...).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
}

/// The webhook request a manual action performs when triggered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualActionRequestDefinition {
    /// Webhook URL.
    pub url: String,
    /// HTTP method of the webhook request.
    pub method: String,
    /// Body encoding hint.
    #[serde(default, rename = "bodyType", skip_serializing_if = "Option::is_none")]
    pub body_type: Option<String>,
    /// Values collected into the webhook query string.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub query: Vec<ManualActionField>,
    /// Values collected into the webhook headers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<ManualActionField>,
    /// Values collected into the webhook body.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub body: Vec<ManualActionField>,
    /// Webhook timeout, as a duration string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

/// A triggerable action configured by the server operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualActionDefinition {
    /// Stable identifier, used in the trigger path.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Longer description shown alongside the title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The webhook request to perform.
    pub request: ManualActionRequestDefinition,
}

impl ManualActionDefinition {
    /// Check that the definition is usable.
    pub fn validate(&self) -> Result<(), InvalidDefinition> {
        if self.id.trim().is_empty() {
            return Err(InvalidDefinition(
                "manual action definition is missing id".to_string(),
            ));
        }
        if self.title.trim().is_empty() {
            return Err(InvalidDefinition(format!(
                "manual action definition {} is missing title",
                self.id
            )));
        }
        if self.request.url.trim().is_empty() {
            return Err(InvalidDefinition(format!(
                "manual action definition {} is missing request url",
                self.id
            )));
        }
        let method = self.request.method.trim().to_uppercase();
        match method.as_str() {
            "GET" | "POST" | "PUT" | "DELETE" | "PATCH" => Ok(()),
            "" => Err(InvalidDefinition(format!(
                "manual action definition {} is missing request method",
                self.id
            ))),
            other => Err(InvalidDefinition(format!(
                "manual action definition {} uses unsupported method {other}",
                self.id
            ))),
        }
    }
}

/// User-supplied values sent when triggering a manual action.
///
/// The `extra` map carries fields this client does not know about, so newer
/// server payload shapes survive untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManualActionTriggerPayload {
    /// Values for the webhook query string, by field key.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, String>,
    /// Values for the webhook headers, by field key.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Values for the webhook body, by field key.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub body: BTreeMap<String, String>,
    /// Unknown passthrough fields.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One component a pipeline tab renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineTabComponentMeta {
    /// Component type the view registry resolves.
    #[serde(rename = "type")]
    pub component_type: String,
    /// Open-ended component properties.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub props: BTreeMap<String, Value>,
}

/// A dynamic pipeline tab configured by the server operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineTabDefinition {
    /// Stable identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Icon name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Whether the tab is only shown to users with push rights.
    #[serde(default)]
    pub requires_push: bool,
    /// Components rendered inside the tab.
    pub components: Vec<PipelineTabComponentMeta>,
}

impl PipelineTabDefinition {
    /// Check that the definition is usable.
    pub fn validate(&self) -> Result<(), InvalidDefinition> {
        if self.id.is_empty() {
            return Err(InvalidDefinition("pipeline tab is missing id".to_string()));
        }
        if self.title.is_empty() {
            return Err(InvalidDefinition(format!(
                "pipeline tab {} is missing title",
                self.id
            )));
        }
        if self.components.is_empty() {
            return Err(InvalidDefinition(format!(
                "pipeline tab {} must define at least one component",
                self.id
            )));
        }
        for component in &self.components {
            if component.component_type.is_empty() {
                return Err(InvalidDefinition(format!(
                    "pipeline tab {} has component without type",
                    self.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn action(method: &str) -> ManualActionDefinition {
        ManualActionDefinition {
            id: "deploy".to_string(),
            title: "Deploy".to_string(),
            description: None,
            request: ManualActionRequestDefinition {
                url: "https://hooks.example.com/deploy".to_string(),
                method: method.to_string(),
                body_type: None,
                query: Vec::new(),
                headers: Vec::new(),
                body: Vec::new(),
                timeout: None,
            },
        }
    }

    #[test]
    fn manual_action_validation() {
        assert!(action("POST").validate().is_ok());
        assert!(action("post").validate().is_ok());
        assert!(action("TRACE").validate().is_err());
        assert!(action("").validate().is_err());

        let mut missing_id = action("POST");
        missing_id.id = " ".to_string();
        assert!(missing_id.validate().is_err());
    }

    #[test]
    fn pipeline_tab_validation() {
        let tab = PipelineTabDefinition {
            id: "reports".to_string(),
            title: "Reports".to_string(),
            icon: None,
            requires_push: false,
            components: vec![PipelineTabComponentMeta {
                component_type: "report-table".to_string(),
                props: BTreeMap::new(),
            }],
        };
        assert!(tab.validate().is_ok());

        let mut empty = tab.clone();
        empty.components.clear();
        assert!(empty.validate().is_err());

        let mut untyped = tab;
        untyped.components[0].component_type.clear();
        assert!(untyped.validate().is_err());
    }

    #[test]
    fn trigger_payload_preserves_unknown_fields() {
        let raw = json!({
            "query": {"env": "prod"},
            "confirm": true,
            "initiator": {"id": 7}
        });

        let payload: ManualActionTriggerPayload = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(payload.query["env"], "prod");
        assert_eq!(payload.extra["confirm"], json!(true));

        let round_trip = serde_json::to_value(&payload).unwrap();
        assert_eq!(round_trip, raw);
    }

    #[test]
    fn manual_action_field_renames_type() {
        let field: ManualActionField = serde_json::from_value(json!({
            "key": "tag",
            "label": "Tag",
            "required": true,
            "type": "text"
        }))
        .unwrap();
        assert_eq!(field.field_type.as_deref(), Some("text"));

        let value = serde_json::to_value(&field).unwrap();
        assert_eq!(value["type"], "text");
        assert!(value.get("placeholder").is_none());
    }

    #[test]
    fn pipeline_tab_decodes_server_shape() {
        let tabs: Vec<PipelineTabDefinition> = serde_json::from_value(json!([{
            "id": "security",
            "title": "Security",
            "icon": "shield",
            "requires_push": true,
            "components": [
                {"type": "report-table", "props": {"report": "sbom"}}
            ]
        }]))
        .unwrap();
        assert_eq!(tabs[0].components[0].props["report"], json!("sbom"));
        assert!(tabs[0].requires_push);
    }
}
