//! Data model for the serverless deployment manifest.
//!
//! This module defines the structures for the subset of a `serverless.yml`
//! manifest that the instrumentation passes read and mutate: the service name,
//! the provider block, and the per-function configuration. Everything the tool
//! does not own is captured in flattened `extra` maps so that a load →
//! instrument → save cycle preserves user content byte-for-byte at the key
//! level.
//!
//! Key functionalities include:
//! - Loading and saving the YAML manifest.
//! - Building [`FunctionDescriptor`]s, the mutable per-function view the
//!   passes operate on, with the runtime resolved against the provider
//!   default.
//! - Snapshotting the read-only [`DeploymentContext`] used for tag derivation.

use crate::runtime::RuntimeKind;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

// Serverless Framework defaults, applied when the provider block leaves the
// corresponding field unset.
pub const DEFAULT_STAGE: &str = "dev";
pub const DEFAULT_REGION: &str = "us-east-1";

/// Top-level structure of a serverless manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceManifest {
    pub service: String,

    pub provider: Provider,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub functions: IndexMap<String, FunctionSpec>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub custom: IndexMap<String, serde_yaml::Value>,

    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

/// The `provider` block of the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,

    /// Default runtime for functions that do not declare their own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<IndexMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_tags: Option<IndexMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracing: Option<TracingSettings>,

    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

/// X-Ray tracing switches on the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TracingSettings {
    pub api_gateway: bool,
    pub lambda: bool,
}

/// One function entry under `functions:`.
///
/// `package`, `environment`, `tags` and `layers` are all optional in user
/// manifests; the passes lazily initialize them instead of assuming presence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub handler: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<PackageSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<IndexMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<IndexMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<String>>,

    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

/// Packaging include/exclude lists for one function.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<Vec<String>>,

    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

/// Mutable per-function view handed to the instrumentation passes.
///
/// The descriptor borrows the function's [`FunctionSpec`] from the manifest
/// for the duration of one pass; `runtime` is already resolved against the
/// provider-level default.
pub struct FunctionDescriptor<'a> {
    pub name: String,
    pub kind: RuntimeKind,
    pub runtime: Option<String>,
    pub spec: &'a mut FunctionSpec,
}

/// Read-only deployment snapshot consumed by the tag merger.
#[derive(Debug, Clone)]
pub struct DeploymentContext {
    pub service_name: String,
    pub stage: String,
    pub region: String,
    /// Provider-level `tags`, empty when absent.
    pub tags: IndexMap<String, String>,
    /// Provider-level `stackTags`, empty when absent.
    pub stack_tags: IndexMap<String, String>,
}

impl ServiceManifest {
    /// Builds the ordered descriptor list over all functions, in manifest
    /// order, resolving each function's runtime against the provider default.
    pub fn function_descriptors(&mut self) -> Vec<FunctionDescriptor<'_>> {
        let default_runtime = self.provider.runtime.clone();
        self.functions
            .iter_mut()
            .map(|(name, spec)| {
                let runtime = spec.runtime.clone().or_else(|| default_runtime.clone());
                FunctionDescriptor {
                    name: name.clone(),
                    kind: RuntimeKind::from_runtime(runtime.as_deref()),
                    runtime,
                    spec,
                }
            })
            .collect()
    }
}

impl PackageSpec {
    /// Fresh packaging entry with both lists present and empty.
    pub fn empty() -> Self {
        PackageSpec {
            include: Some(Vec::new()),
            exclude: Some(Vec::new()),
            extra: IndexMap::new(),
        }
    }
}

impl DeploymentContext {
    /// Snapshots the deployment context from a loaded manifest, applying the
    /// framework defaults for stage and region.
    pub fn from_manifest(manifest: &ServiceManifest) -> Self {
        DeploymentContext {
            service_name: manifest.service.clone(),
            stage: manifest
                .provider
                .stage
                .clone()
                .unwrap_or_else(|| DEFAULT_STAGE.to_string()),
            region: manifest
                .provider
                .region
                .clone()
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            tags: manifest.provider.tags.clone().unwrap_or_default(),
            stack_tags: manifest.provider.stack_tags.clone().unwrap_or_default(),
        }
    }
}

pub fn load_manifest(path: &Path) -> Result<ServiceManifest> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest file: {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse YAML manifest: {}", path.display()))
}

pub fn save_manifest(path: &Path, manifest: &ServiceManifest) -> Result<()> {
    let yaml =
        serde_yaml::to_string(manifest).context("Failed to serialize manifest to YAML")?;
    fs::write(path, yaml)
        .with_context(|| format!("Failed to write manifest file: {}", path.display()))
}
