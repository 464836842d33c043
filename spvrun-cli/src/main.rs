//! `spvrun`: run the test entry points of a SPIR-V module on a compute
//! device and gate CI on the aggregate outcome.

mod validator;

use anyhow::Context;
use clap::Parser;
use spvrun_device::mock::MockApi;
use spvrun_runner::{run_harness, HarnessConfig, NullValidator};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use validator::ToolValidator;

#[derive(Debug, Parser)]
#[command(name = "spvrun", about = "SPIR-V conformance test runner")]
struct Args {
    /// Path to the compiled test module.
    module: PathBuf,

    /// Select the first platform whose name contains this substring.
    #[arg(long, env = "SPVRUN_PLATFORM")]
    platform: Option<String>,

    /// Select the first device whose name contains this substring.
    #[arg(long, env = "SPVRUN_DEVICE")]
    device: Option<String>,

    /// Print per-test timing and debug logging.
    #[arg(short, long)]
    verbose: bool,

    /// Always exit successfully so an external minimizer can iterate on a
    /// crash instead of a logical test failure.
    #[arg(long)]
    reduce: bool,

    /// Keep entry-point names verbatim, even on platforms with kernel-name
    /// character restrictions.
    #[arg(long)]
    no_rewrite_names: bool,

    /// External validator command to run against the module before
    /// execution; omitted means no validation.
    #[arg(long)]
    validator: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(success) => {
            if success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<bool> {
    let bytes = std::fs::read(&args.module)
        .with_context(|| format!("failed to read module {}", args.module.display()))?;
    tracing::debug!(bytes = bytes.len(), path = %args.module.display(), "module read");

    let config = HarnessConfig {
        platform_filter: args.platform.clone(),
        device_filter: args.device.clone(),
        verbose: args.verbose,
        reduce: args.reduce,
        rewrite_names: !args.no_rewrite_names,
    };

    // Stand-in driver; a production backend implements the same
    // `ComputeApi` seam.
    let mut api = MockApi::new();

    let summary = match &args.validator {
        Some(command) => {
            let validator = ToolValidator::new(command.clone(), args.module.clone());
            run_harness(&mut api, &validator, &config, &bytes)?
        }
        None => run_harness(&mut api, &NullValidator, &config, &bytes)?,
    };

    Ok(summary.success(args.reduce))
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
