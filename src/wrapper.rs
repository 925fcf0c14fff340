//! Handler redirection: routes every supported function through the Datadog
//! runtime wrapper.
//!
//! For each function the original handler is recorded under
//! [`DD_HANDLER_ENV_VAR`] so the wrapper can locate and invoke it at runtime,
//! and the manifest handler is replaced with the runtime-specific
//! instrumentation entry point. The string constants here form a contract
//! with the `datadog-lambda-js` / `datadog-lambda-python` packages and must
//! match them exactly.

use crate::manifest::{FunctionDescriptor, FunctionSpec, PackageSpec};
use crate::runtime::RuntimeKind;
use indexmap::IndexMap;

/// Environment variable the runtime wrapper reads to find the user handler.
pub const DD_HANDLER_ENV_VAR: &str = "DD_LAMBDA_HANDLER";

/// Mount prefix under which the Node layer exposes its packages.
pub const JS_HANDLER_LAYER_PREFIX: &str = "/opt/nodejs/";

/// Wrapper entry point inside the `datadog-lambda-js` package.
pub const JS_HANDLER: &str = "node_modules/datadog-lambda-js/handler.handler";

/// Wrapper entry point of the `datadog-lambda-python` package. Python imports
/// resolve by module path, so the layer mount point does not change it.
pub const PYTHON_HANDLER: &str = "datadog_lambda.handler.handler";

/// Redirects each function's handler to the Datadog wrapper for its runtime
/// and records the original handler in the function environment.
///
/// Functions with an unsupported runtime keep their handler untouched; the
/// rest of the batch is still processed. This pass is single-shot per
/// packaging run: invoking it again would re-capture the already redirected
/// handler as the "original" one.
pub fn redirect_handlers(functions: &mut [FunctionDescriptor<'_>], add_layers: bool) {
    for function in functions.iter_mut() {
        record_original_handler(function.spec);
        let target = match instrumentation_handler(function.kind, add_layers) {
            Some(target) => target,
            None => {
                tracing::debug!(
                    function = %function.name,
                    "Unsupported runtime, leaving handler untouched"
                );
                continue;
            }
        };
        tracing::debug!(function = %function.name, handler = %target, "Redirecting handler");
        function.spec.handler = target;

        // Downstream packaging dereferences package.include unconditionally;
        // a freshly created entry gets both lists, an existing one only has
        // its include list filled in.
        let package = function.spec.package.get_or_insert_with(PackageSpec::empty);
        package.include.get_or_insert_with(Vec::new);
    }
}

fn instrumentation_handler(kind: RuntimeKind, add_layers: bool) -> Option<String> {
    match kind {
        RuntimeKind::Node => Some(if add_layers {
            format!("{}{}", JS_HANDLER_LAYER_PREFIX, JS_HANDLER)
        } else {
            JS_HANDLER.to_string()
        }),
        RuntimeKind::Python => Some(PYTHON_HANDLER.to_string()),
        RuntimeKind::Unsupported => None,
    }
}

fn record_original_handler(spec: &mut FunctionSpec) {
    let original = spec.handler.clone();
    spec.environment
        .get_or_insert_with(IndexMap::new)
        .insert(DD_HANDLER_ENV_VAR.to_string(), original);
}
