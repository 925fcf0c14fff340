//! Instrumentation configuration: the manifest's `custom.datadog` section and
//! its resolution against command-line overrides.
//!
//! Precedence order: CLI flag > manifest section > built-in default. Every
//! field is optional in the manifest; an absent section yields the defaults.

use crate::cli::CliArgs;
use crate::manifest::ServiceManifest;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Manifest key under `custom:` carrying the instrumentation settings.
pub const CONFIG_SECTION: &str = "datadog";

/// Resolved instrumentation settings for one packaging run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DatadogConfig {
    /// Append the published Datadog Lambda layers to supported functions.
    pub add_layers: bool,
    /// Merge the default `service` / `env` tags into each function.
    pub enable_tags: bool,
    /// Enable X-Ray tracing on the provider (API Gateway and Lambda).
    pub enable_xray_tracing: bool,
    /// Forwarder ARN; when set, every log group gets a subscription filter.
    pub forwarder: Option<String>,
    /// When set, injected as `DD_LOG_LEVEL` into every function environment.
    pub log_level: Option<String>,
}

impl Default for DatadogConfig {
    fn default() -> Self {
        DatadogConfig {
            add_layers: true,
            enable_tags: true,
            enable_xray_tracing: true,
            forwarder: None,
            log_level: None,
        }
    }
}

impl DatadogConfig {
    /// Reads the `custom.datadog` section of the manifest, falling back to
    /// defaults when the section is absent. Unknown keys in the section are
    /// tolerated (other tooling shares it).
    pub fn from_manifest(manifest: &ServiceManifest) -> Result<Self> {
        match manifest.custom.get(CONFIG_SECTION) {
            Some(section) => serde_yaml::from_value(section.clone())
                .context("Failed to parse custom.datadog configuration section"),
            None => Ok(DatadogConfig::default()),
        }
    }

    /// Applies command-line overrides on top of the manifest settings.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if args.no_layers {
            self.add_layers = false;
        }
        if args.no_tags {
            self.enable_tags = false;
        }
        if args.no_xray {
            self.enable_xray_tracing = false;
        }
        if args.forwarder.is_some() {
            self.forwarder = args.forwarder.clone();
        }
        if args.log_level.is_some() {
            self.log_level = args.log_level.clone();
        }
    }

    /// Full resolution: manifest section, then CLI overrides.
    pub fn resolve(manifest: &ServiceManifest, args: &CliArgs) -> Result<Self> {
        let mut config = DatadogConfig::from_manifest(manifest)?;
        config.apply_cli_overrides(args);
        Ok(config)
    }
}
