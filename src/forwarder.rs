//! Log forwarder wiring: derives a subscription filter for every log group
//! in the compiled template so its events stream to the Datadog forwarder.
//!
//! Derived entries are keyed `<logicalName>Subscription` and reference the
//! source log group with a `Ref`, never a literal name, so the subscription
//! follows whatever name CloudFormation assigns the group. This pass is the
//! sole producer of those keys; an existing entry under a derived key is
//! overwritten.

use crate::template::{CompiledTemplate, Resource, LOG_GROUP_TYPE, SUBSCRIPTION_FILTER_TYPE};
use indexmap::IndexMap;

/// Inserts a subscription filter resource for every log group in the
/// template, targeting `forwarder_arn` with a match-all filter pattern.
/// Source log-group entries are never mutated.
pub fn add_subscriptions(template: &mut CompiledTemplate, forwarder_arn: &str) {
    let log_groups: Vec<String> = template
        .resources
        .iter()
        .filter(|(_, resource)| resource.resource_type == LOG_GROUP_TYPE)
        .map(|(name, _)| name.clone())
        .collect();

    for name in log_groups {
        let key = format!("{}Subscription", name);
        tracing::debug!(log_group = %name, subscription = %key, "Adding forwarder subscription filter");
        template
            .resources
            .insert(key, subscription_filter(&name, forwarder_arn));
    }
}

fn subscription_filter(log_group_logical_id: &str, forwarder_arn: &str) -> Resource {
    Resource {
        resource_type: SUBSCRIPTION_FILTER_TYPE.to_string(),
        properties: serde_json::json!({
            "DestinationArn": forwarder_arn,
            "FilterPattern": "",
            "LogGroupName": { "Ref": log_group_logical_id },
        }),
        extra: IndexMap::new(),
    }
}
