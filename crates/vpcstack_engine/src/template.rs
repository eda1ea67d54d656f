//! Rendered template output.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::error::EngineResult;

/// A key/value label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Identity of the stack a template belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackDescriptor {
    pub stack_name: String,
    pub region: String,
    pub account_id: Option<String>,
    pub description: Option<String>,
}

impl StackDescriptor {
    pub fn new(stack_name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            stack_name: stack_name.into(),
            region: region.into(),
            account_id: None,
            description: None,
        }
    }

    pub fn with_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateMetadata {
    pub stack_name: String,
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub resource_count: usize,
    pub stack_tags: Vec<Tag>,
}

/// CloudFormation-style template produced from a recorded resource graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    pub description: String,
    pub metadata: TemplateMetadata,
    pub resources: Map<String, Value>,
}

impl Template {
    /// Look up a rendered resource by logical id.
    pub fn resource(&self, logical_id: &str) -> Option<&Value> {
        self.resources.get(logical_id)
    }

    /// Logical ids of every resource with the given type name.
    pub fn logical_ids_of_type(&self, type_name: &str) -> Vec<&str> {
        self.resources
            .iter()
            .filter(|(_, v)| v.get("Type").and_then(Value::as_str) == Some(type_name))
            .map(|(k, _)| k.as_str())
            .collect()
    }

    pub fn to_json_pretty(&self) -> EngineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the template as pretty JSON, creating parent directories.
    pub fn write_to(&self, path: &Path) -> EngineResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, self.to_json_pretty()?)?;
        info!("Wrote template with {} resources to {:?}", self.resources.len(), path);
        Ok(())
    }
}
