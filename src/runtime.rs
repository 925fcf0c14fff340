//! Runtime classification and Datadog Lambda layer application.
//!
//! The layer table is embedded at compile time (`layers.json`) and maps
//! region → runtime identifier → published layer ARN. Layer versions are
//! published in lockstep across regions, so the table stays small.

use crate::manifest::FunctionDescriptor;
use indexmap::IndexMap;
use once_cell::sync::Lazy;

/// Runtime families the instrumentation supports.
///
/// Anything that is not Node or Python is `Unsupported`: those functions are
/// deliberately left untouched by the layer and handler passes rather than
/// failing the packaging run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeKind {
    Node,
    Python,
    Unsupported,
}

impl RuntimeKind {
    /// Classifies a Lambda runtime identifier (e.g. `nodejs18.x`,
    /// `python3.11`). An absent runtime is `Unsupported`.
    pub fn from_runtime(runtime: Option<&str>) -> Self {
        match runtime {
            Some(r) if r.starts_with("nodejs") => RuntimeKind::Node,
            Some(r) if r.starts_with("python") => RuntimeKind::Python,
            _ => RuntimeKind::Unsupported,
        }
    }
}

type LayerTable = IndexMap<String, IndexMap<String, String>>;

static LAYER_TABLE: Lazy<LayerTable> = Lazy::new(|| {
    serde_json::from_str(include_str!("layers.json")).expect("embedded layer table is valid JSON")
});

/// Looks up the published Datadog layer ARN for a region/runtime pair.
pub fn layer_arn(region: &str, runtime: &str) -> Option<&'static str> {
    LAYER_TABLE
        .get(region)
        .and_then(|runtimes| runtimes.get(runtime))
        .map(String::as_str)
}

/// Appends the matching Datadog layer to every supported function.
///
/// The append is idempotent: a layer ARN already present on the function is
/// not duplicated. Functions with an unsupported runtime, or a region/runtime
/// pair with no published layer, are skipped.
pub fn apply_layers(functions: &mut [FunctionDescriptor<'_>], region: &str) {
    for function in functions.iter_mut() {
        if function.kind == RuntimeKind::Unsupported {
            continue;
        }
        let runtime = match function.runtime.as_deref() {
            Some(runtime) => runtime,
            None => continue,
        };
        let arn = match layer_arn(region, runtime) {
            Some(arn) => arn,
            None => {
                tracing::debug!(
                    function = %function.name,
                    runtime = %runtime,
                    region = %region,
                    "No published layer for runtime, skipping"
                );
                continue;
            }
        };
        let layers = function.spec.layers.get_or_insert_with(Vec::new);
        if !layers.iter().any(|layer| layer == arn) {
            tracing::debug!(function = %function.name, layer = %arn, "Appending Datadog layer");
            layers.push(arn.to_string());
        }
    }
}
