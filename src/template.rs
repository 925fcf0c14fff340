//! Compiled CloudFormation template model.
//!
//! Only the resource map is modeled; resource properties stay opaque
//! `serde_json::Value`s because the passes match on resource type, not on
//! property shape. Resource order is preserved on round-trip.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

pub const LOG_GROUP_TYPE: &str = "AWS::Logs::LogGroup";
pub const SUBSCRIPTION_FILTER_TYPE: &str = "AWS::Logs::SubscriptionFilter";

/// A compiled CloudFormation template, as produced by the packaging step.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompiledTemplate {
    #[serde(rename = "Resources", default)]
    pub resources: IndexMap<String, Resource>,

    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

/// One template resource entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    #[serde(rename = "Type")]
    pub resource_type: String,

    #[serde(rename = "Properties", default, skip_serializing_if = "serde_json::Value::is_null")]
    pub properties: serde_json::Value,

    #[serde(flatten)]
    pub extra: IndexMap<String, serde_json::Value>,
}

pub fn load_template(path: &Path) -> Result<CompiledTemplate> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read template file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON template: {}", path.display()))
}

pub fn save_template(path: &Path, template: &CompiledTemplate) -> Result<()> {
    let json = serde_json::to_string_pretty(template)
        .context("Failed to serialize template to JSON")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write template file: {}", path.display()))
}
