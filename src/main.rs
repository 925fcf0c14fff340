use anyhow::Result;
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dogpack::cli::CliArgs;
use dogpack::config::DatadogConfig;
use dogpack::manifest::{load_manifest, save_manifest};
use dogpack::template::{load_template, save_template};
use dogpack::{after_package_artifacts, after_package_initialize};

/// dogpack: instrument a packaged serverless deployment for Datadog.
fn main() -> Result<()> {
    let args = CliArgs::parse();

    let log_level = match args.verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .parse_lossy(format!("{}={}", env!("CARGO_PKG_NAME"), log_level)),
        )
        .init();

    let mut manifest = load_manifest(&args.manifest)?;
    let config = DatadogConfig::resolve(&manifest, &args)?;
    tracing::debug!(?config, "Resolved instrumentation configuration");

    let mut template = match args.template.as_deref() {
        Some(path) => Some(load_template(path)?),
        None => None,
    };
    if config.forwarder.is_some() && template.is_none() {
        tracing::warn!(
            "A forwarder is configured but no --template was given; log subscriptions will be skipped"
        );
    }

    after_package_initialize(&mut manifest, &config);
    after_package_artifacts(&mut manifest, template.as_mut(), &config);

    let manifest_out = args.manifest_out.as_deref().unwrap_or(&args.manifest);
    save_manifest(manifest_out, &manifest)?;
    tracing::info!(
        path = %manifest_out.display(),
        functions = manifest.functions.len(),
        "Wrote instrumented manifest"
    );

    if let (Some(template), Some(template_in)) = (&template, args.template.as_deref()) {
        let template_out = args.template_out.as_deref().unwrap_or(template_in);
        save_template(template_out, template)?;
        tracing::info!(
            path = %template_out.display(),
            resources = template.resources.len(),
            "Wrote instrumented template"
        );
    }

    Ok(())
}
