//! Default `service` / `env` tag derivation.
//!
//! Generated defaults have the lowest precedence: a key set in the function's
//! own `tags` always wins, and a key set at the provider level (`tags` or
//! `stackTags`) suppresses the generated default for every function in the
//! deployment, since the deployment engine already propagates provider tags
//! to all stack resources.

use crate::manifest::{DeploymentContext, FunctionDescriptor};
use indexmap::IndexMap;

pub const SERVICE_TAG: &str = "service";
pub const ENV_TAG: &str = "env";

/// Merges the generated `service` and `env` defaults into each function's
/// tag map, creating the map if absent.
pub fn merge_tags(functions: &mut [FunctionDescriptor<'_>], context: &DeploymentContext) {
    let service_suppressed = provider_declares(context, SERVICE_TAG);
    let env_suppressed = provider_declares(context, ENV_TAG);
    if service_suppressed && env_suppressed {
        tracing::debug!("Provider-level tags declare service and env, no defaults to generate");
    }

    for function in functions.iter_mut() {
        let tags = function.spec.tags.get_or_insert_with(IndexMap::new);
        if !service_suppressed && !tags.contains_key(SERVICE_TAG) {
            tags.insert(SERVICE_TAG.to_string(), context.service_name.clone());
        }
        if !env_suppressed && !tags.contains_key(ENV_TAG) {
            tags.insert(ENV_TAG.to_string(), context.stage.clone());
        }
    }
}

fn provider_declares(context: &DeploymentContext, key: &str) -> bool {
    context.tags.contains_key(key) || context.stack_tags.contains_key(key)
}
