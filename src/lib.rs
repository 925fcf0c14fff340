#![doc = include_str!("../README.md")]
//! Core library for the `dogpack` CLI application.
//!
//! This crate rewrites a packaged serverless deployment so that every Lambda
//! function is instrumented for Datadog without application code changes:
//! handlers are redirected through the runtime wrapper, the published layers
//! are appended, default resource tags are merged, and log groups in the
//! compiled CloudFormation template are subscribed to a forwarder.
//!
//! The work is split across two lifecycle points, mirroring where the
//! packaging pipeline exposes the data each pass needs:
//! - [`after_package_initialize`]: layer application, X-Ray tracing, log
//!   level injection (the manifest alone is enough);
//! - [`after_package_artifacts`]: forwarder subscriptions, tag merging,
//!   handler redirection (runs once the compiled template and the final
//!   provider configuration exist).

// Module declarations
pub mod cli;
pub mod config;
pub mod forwarder;
pub mod manifest;
pub mod runtime;
pub mod tags;
pub mod template;
pub mod wrapper;

use indexmap::IndexMap;

use manifest::{
    DeploymentContext, FunctionDescriptor, ServiceManifest, TracingSettings, DEFAULT_REGION,
};
use template::CompiledTemplate;

pub use cli::CliArgs;
pub use config::DatadogConfig;

/// Environment variable read by the runtime wrapper to pick its log level.
pub const DD_LOG_LEVEL_ENV_VAR: &str = "DD_LOG_LEVEL";

/// Manifest-only instrumentation, run right after packaging initializes:
/// appends the Datadog layers, enables X-Ray tracing on the provider, and
/// injects the configured log level into every function environment.
pub fn after_package_initialize(manifest: &mut ServiceManifest, config: &DatadogConfig) {
    if config.enable_xray_tracing {
        tracing::debug!("Enabling X-Ray tracing on the provider");
        manifest.provider.tracing = Some(TracingSettings {
            api_gateway: true,
            lambda: true,
        });
    }

    let region = manifest
        .provider
        .region
        .clone()
        .unwrap_or_else(|| DEFAULT_REGION.to_string());

    let mut functions = manifest.function_descriptors();
    if config.add_layers {
        runtime::apply_layers(&mut functions, &region);
    }
    if let Some(level) = config.log_level.as_deref() {
        inject_log_level(&mut functions, level);
    }
}

/// Template-aware instrumentation, run after deployment artifacts exist:
/// derives forwarder subscription filters, merges the default tags, and
/// redirects handlers through the runtime wrapper.
pub fn after_package_artifacts(
    manifest: &mut ServiceManifest,
    template: Option<&mut CompiledTemplate>,
    config: &DatadogConfig,
) {
    if let (Some(template), Some(forwarder_arn)) = (template, config.forwarder.as_deref()) {
        forwarder::add_subscriptions(template, forwarder_arn);
    }

    if config.enable_tags {
        let context = DeploymentContext::from_manifest(manifest);
        tags::merge_tags(&mut manifest.function_descriptors(), &context);
    }

    wrapper::redirect_handlers(&mut manifest.function_descriptors(), config.add_layers);
}

/// Sets `DD_LOG_LEVEL` in each function's environment, keeping any value the
/// user already configured.
fn inject_log_level(functions: &mut [FunctionDescriptor<'_>], level: &str) {
    for function in functions.iter_mut() {
        function
            .spec
            .environment
            .get_or_insert_with(IndexMap::new)
            .entry(DD_LOG_LEVEL_ENV_VAR.to_string())
            .or_insert_with(|| level.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wrapper::{DD_HANDLER_ENV_VAR, JS_HANDLER, JS_HANDLER_LAYER_PREFIX};

    fn node_manifest(custom_yaml: &str) -> ServiceManifest {
        serde_yaml::from_str(&format!(
            "service: dev\nprovider:\n  name: aws\n  region: us-east-1\n  stage: dev\nfunctions:\n  node1:\n    handler: my-func.ev\n    runtime: nodejs18.x\n{}",
            custom_yaml
        ))
        .unwrap()
    }

    fn config_for(manifest: &ServiceManifest) -> DatadogConfig {
        DatadogConfig::from_manifest(manifest).unwrap()
    }

    #[test]
    fn test_initialize_adds_layers_without_changing_handler() {
        let mut manifest = node_manifest("");
        let config = config_for(&manifest);
        after_package_initialize(&mut manifest, &config);

        let spec = &manifest.functions["node1"];
        assert_eq!(spec.handler, "my-func.ev");
        let layers = spec.layers.as_ref().unwrap();
        assert_eq!(layers.len(), 1);
        assert!(layers[0].starts_with("arn:aws:lambda:us-east-1:"));
        assert_eq!(
            manifest.provider.tracing,
            Some(TracingSettings {
                api_gateway: true,
                lambda: true
            })
        );
    }

    #[test]
    fn test_initialize_skips_layers_when_disabled() {
        let mut manifest = node_manifest("custom:\n  datadog:\n    addLayers: false\n");
        let config = config_for(&manifest);
        after_package_initialize(&mut manifest, &config);
        assert!(manifest.functions["node1"].layers.is_none());
    }

    #[test]
    fn test_initialize_skips_tracing_when_disabled() {
        let mut manifest = node_manifest("custom:\n  datadog:\n    enableXrayTracing: false\n");
        let config = config_for(&manifest);
        after_package_initialize(&mut manifest, &config);
        assert!(manifest.provider.tracing.is_none());
    }

    #[test]
    fn test_initialize_injects_log_level_without_overwriting() {
        let mut manifest: ServiceManifest = serde_yaml::from_str(
            "service: dev\nprovider:\n  name: aws\nfunctions:\n  a:\n    handler: a.ev\n  b:\n    handler: b.ev\n    environment:\n      DD_LOG_LEVEL: warn\ncustom:\n  datadog:\n    logLevel: debug\n",
        )
        .unwrap();
        let config = config_for(&manifest);
        after_package_initialize(&mut manifest, &config);

        assert_eq!(
            manifest.functions["a"].environment.as_ref().unwrap()[DD_LOG_LEVEL_ENV_VAR],
            "debug"
        );
        assert_eq!(
            manifest.functions["b"].environment.as_ref().unwrap()[DD_LOG_LEVEL_ENV_VAR],
            "warn"
        );
    }

    #[test]
    fn test_artifacts_redirects_handler_and_records_original() {
        let mut manifest = node_manifest("");
        let config = config_for(&manifest);
        after_package_artifacts(&mut manifest, None, &config);

        let spec = &manifest.functions["node1"];
        assert_eq!(
            spec.handler,
            format!("{}{}", JS_HANDLER_LAYER_PREFIX, JS_HANDLER)
        );
        assert_eq!(
            spec.environment.as_ref().unwrap()[DD_HANDLER_ENV_VAR],
            "my-func.ev"
        );
    }

    #[test]
    fn test_artifacts_adds_subscription_when_forwarder_set() {
        let mut manifest = node_manifest("custom:\n  datadog:\n    forwarder: some-arn\n");
        let mut template: CompiledTemplate = serde_json::from_str(
            r#"{
                "Resources": {
                    "FirstGroup": {
                        "Type": "AWS::Logs::LogGroup",
                        "Properties": { "LogGroupName": "/aws/lambda/first-group" }
                    }
                }
            }"#,
        )
        .unwrap();
        let config = config_for(&manifest);
        after_package_artifacts(&mut manifest, Some(&mut template), &config);

        assert!(template.resources.contains_key("FirstGroupSubscription"));
    }

    #[test]
    fn test_artifacts_without_forwarder_leaves_template_unchanged() {
        let mut manifest = node_manifest("");
        let mut template: CompiledTemplate = serde_json::from_str(
            r#"{ "Resources": { "FirstGroup": { "Type": "AWS::Logs::LogGroup", "Properties": {} } } }"#,
        )
        .unwrap();
        let before = template.clone();
        let config = config_for(&manifest);
        after_package_artifacts(&mut manifest, Some(&mut template), &config);
        assert_eq!(template, before);
    }

    #[test]
    fn test_artifacts_merges_default_tags() {
        let mut manifest = node_manifest("");
        let config = config_for(&manifest);
        after_package_artifacts(&mut manifest, None, &config);

        let tags = manifest.functions["node1"].tags.as_ref().unwrap();
        assert_eq!(tags["service"], "dev");
        assert_eq!(tags["env"], "dev");
    }

    #[test]
    fn test_artifacts_keeps_tags_untouched_when_disabled() {
        let mut manifest = node_manifest(
            "    tags:\n      env: test\ncustom:\n  datadog:\n    enableTags: false\n",
        );
        let before = manifest.functions["node1"].tags.clone();
        let config = config_for(&manifest);
        after_package_artifacts(&mut manifest, None, &config);
        assert_eq!(manifest.functions["node1"].tags, before);
        assert_eq!(
            manifest.functions["node1"].tags.as_ref().unwrap()["env"],
            "test"
        );
    }

    #[test]
    fn test_artifacts_respects_provider_level_tags() {
        let mut manifest: ServiceManifest = serde_yaml::from_str(
            "service: my-service\nprovider:\n  name: aws\n  tags:\n    service: service-name\n  stackTags:\n    env: dev\nfunctions:\n  node1:\n    handler: my-func.ev\n    runtime: nodejs18.x\n    tags: {}\n",
        )
        .unwrap();
        let config = config_for(&manifest);
        after_package_artifacts(&mut manifest, None, &config);
        assert!(manifest.functions["node1"].tags.as_ref().unwrap().is_empty());
    }

    #[test]
    fn test_full_pass_round_trip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = dir.path().join("serverless.yml");
        let template_path = dir.path().join("template.json");
        std::fs::write(
            &manifest_path,
            "service: dev\nprovider:\n  name: aws\n  region: us-east-1\nfunctions:\n  node1:\n    handler: my-func.ev\n    runtime: nodejs18.x\ncustom:\n  datadog:\n    forwarder: some-arn\n",
        )
        .unwrap();
        std::fs::write(
            &template_path,
            r#"{ "Resources": { "FirstGroup": { "Type": "AWS::Logs::LogGroup", "Properties": {} } } }"#,
        )
        .unwrap();

        let mut manifest = manifest::load_manifest(&manifest_path).unwrap();
        let mut template = template::load_template(&template_path).unwrap();
        let config = DatadogConfig::from_manifest(&manifest).unwrap();

        after_package_initialize(&mut manifest, &config);
        after_package_artifacts(&mut manifest, Some(&mut template), &config);

        manifest::save_manifest(&manifest_path, &manifest).unwrap();
        template::save_template(&template_path, &template).unwrap();

        let reloaded = manifest::load_manifest(&manifest_path).unwrap();
        assert_eq!(
            reloaded.functions["node1"].environment.as_ref().unwrap()[DD_HANDLER_ENV_VAR],
            "my-func.ev"
        );
        assert!(reloaded.functions["node1"].layers.is_some());

        let reloaded_template = template::load_template(&template_path).unwrap();
        assert!(reloaded_template
            .resources
            .contains_key("FirstGroupSubscription"));
    }
}
