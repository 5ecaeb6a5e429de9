//! diskprobe CLI entry point

use anyhow::{Context, Result};
use diskprobe::config::cli::{Cli, OutputFormat};
use diskprobe::config::cli_convert::{build_plan, ProbePlan};
use diskprobe::config::toml::parse_toml_file;
use diskprobe::output::{self, ProbeResult};
use diskprobe::{probe, TracingSink};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse_args();
    cli.validate()?;
    init_logging(cli.verbose);

    if cli.check {
        return Ok(run_check(&cli));
    }

    let file = cli
        .config
        .as_deref()
        .map(parse_toml_file)
        .transpose()?;
    let plan = build_plan(&cli, file)?;

    let cancel = CancellationToken::new();
    watch_for_cancellation(&cancel, &plan);

    let results = run_probes(&plan, &cancel).await?;

    let mut stdout = std::io::stdout().lock();
    match cli.format {
        OutputFormat::Text => output::text::write_results(&mut stdout, &results)?,
        OutputFormat::Json => output::json::write_results(&mut stdout, &results)?,
    }

    Ok(ExitCode::SUCCESS)
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose { "diskprobe=debug" } else { "diskprobe=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Report fio availability; exit status 1 when it is missing
fn run_check(cli: &Cli) -> ExitCode {
    let binary = cli
        .fio
        .clone()
        .unwrap_or_else(|| diskprobe::config::DEFAULT_FIO_BINARY.into());

    if diskprobe::supported_binary(&binary) {
        println!("supported: {} found", binary.display());
        ExitCode::SUCCESS
    } else {
        println!("unsupported: {} not found on PATH", binary.display());
        ExitCode::FAILURE
    }
}

/// Cancel in-flight probes on Ctrl-C or when the plan's timeout elapses
fn watch_for_cancellation(cancel: &CancellationToken, plan: &ProbePlan) {
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling probe");
            token.cancel();
        }
    });

    if let Some(timeout) = plan.timeout {
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            warn!(?timeout, "timeout elapsed, cancelling probe");
            token.cancel();
        });
    }
}

async fn run_probes(plan: &ProbePlan, cancel: &CancellationToken) -> Result<Vec<ProbeResult>> {
    let mut results = Vec::with_capacity(plan.kinds.len());

    for &kind in &plan.kinds {
        info!(%kind, directory = %plan.directory.display(), "starting probe");
        let value = probe(cancel, plan.options(kind).logging_to(TracingSink))
            .await
            .with_context(|| format!("{} probe failed", kind))?;
        results.push(ProbeResult::new(kind, value));
    }

    Ok(results)
}
