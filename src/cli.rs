//! Command-line interface definition.

use clap::Parser;
use std::path::PathBuf;

/// dogpack: instrument a packaged serverless deployment for Datadog.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the serverless manifest.
    #[arg(short = 'm', long, default_value = "serverless.yml")]
    pub manifest: PathBuf,

    /// Path to the compiled CloudFormation template JSON, when one has been
    /// generated. Required for forwarder subscription derivation.
    #[arg(short = 't', long)]
    pub template: Option<PathBuf>,

    /// Write the instrumented manifest here instead of rewriting it in place.
    #[arg(long, value_name = "PATH")]
    pub manifest_out: Option<PathBuf>,

    /// Write the instrumented template here instead of rewriting it in place.
    #[arg(long, value_name = "PATH")]
    pub template_out: Option<PathBuf>,

    /// Do not append the Datadog Lambda layers.
    #[arg(long)]
    pub no_layers: bool,

    /// Do not merge the default service/env tags.
    #[arg(long)]
    pub no_tags: bool,

    /// Do not enable X-Ray tracing on the provider.
    #[arg(long)]
    pub no_xray: bool,

    /// CloudWatch log forwarder ARN to subscribe log groups to.
    #[arg(long)]
    pub forwarder: Option<String>,

    /// Log level to inject as DD_LOG_LEVEL into every function.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
