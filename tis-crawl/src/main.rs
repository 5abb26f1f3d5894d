//! TIS Artifact Crawler - concurrent tree crawl, classification, and emission.
//!
//! Fetches a remote catalog tree rooted at `api.rootNodeId`, classifies and
//! extracts matching nodes into typed artifact records, validates each
//! record's path and name against configured conventions, and emits one
//! grouped-artifacts file plus one latest-artifacts file per component
//! category under the run directory.

#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tis_common::config::ResolvedConfig;
use tis_crawl::{aggregator, emitter, orchestrator, validator, AdaptiveFetcher, CatalogClient, RunContext};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "tis-crawl")]
#[command(author, version, about = "TIS artifact crawler - concurrent tree crawl, classification and emission")]
struct Cli {
    /// Path to the JSON configuration document.
    #[arg(short, long)]
    config: PathBuf,

    /// Override the configured output directory.
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Override the configured log level (trace|debug|info|warn|error).
    #[arg(long)]
    log_level: Option<String>,

    /// Validate configuration and root connectivity only; print project and
    /// software-line counts without emitting any artifact files.
    #[arg(long)]
    dry_run: bool,

    /// Accepted and ignored; preserved for script compatibility with
    /// whatever previously invoked this tool with a `--gui` flag.
    #[arg(long)]
    gui: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _ = cli.gui;

    let mut config = tis_common::load_config(&cli.config).context("loading configuration")?;
    if let Some(dir) = &cli.output_dir {
        config.output.directory = dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.debug.log_level = level.clone();
    }
    let config = Arc::new(config);

    let ctx = RunContext::create(&config.output.directory).context("creating run directory")?;
    let _log_guard = init_logging(&config, &ctx)?;

    info!(
        root_node_id = %config.api.root_node_id,
        concurrent_requests = config.optimization.concurrent_requests,
        run_dir = %ctx.run_dir().display(),
        "starting TIS artifact crawl"
    );

    let client = CatalogClient::new(&config).context("building HTTP client")?;
    let fetcher = Arc::new(AdaptiveFetcher::new(&client, &config));

    if cli.dry_run {
        let summary = orchestrator::dry_run(&fetcher, &config)
            .await
            .context("dry-run root connectivity check")?;
        println!(
            "dry run: root reachable, {} project(s), {} software line(s)",
            summary.project_count, summary.software_line_count
        );
        return Ok(());
    }

    let install_ctrl_c = {
        let cancellation = ctx.cancellation().clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("received interrupt, requesting cancellation");
                cancellation.cancel();
            }
        }
    };
    tokio::spawn(install_ctrl_c);

    let result = orchestrator::run(fetcher.clone(), config.clone(), &ctx).await;
    let crawl = match result {
        Ok(crawl) => crawl,
        Err(e) => {
            error!(error = %e, "fatal error during crawl");
            return Err(e.into());
        }
    };

    info!(
        projects_and_lines = crawl.known_lines.len(),
        artifacts = crawl.artifacts.len(),
        branches_pruned = crawl.statistics.branches_pruned,
        nodes_visited = crawl.statistics.nodes_visited,
        failed_components = crawl.statistics.failed_components.len(),
        "crawl finished"
    );

    let mut validated = Vec::with_capacity(crawl.artifacts.len());
    for artifact in crawl.artifacts {
        let line_name = artifact
            .common
            .upload_path
            .split('/')
            .nth(1)
            .unwrap_or_default()
            .to_string();
        let outcome = validator::validate(&artifact, &line_name, &config);
        if !outcome.tag.is_valid() {
            warn!(
                artifact_id = %artifact.common.id,
                tag = ?outcome.tag,
                detail = %outcome.detail,
                "artifact failed validation"
            );
        }
        validated.push(artifact);
    }

    let aggregated = aggregator::aggregate(&crawl.known_lines, &validated);
    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string();
    emitter::emit_all(&aggregated, ctx.run_dir(), &timestamp).context("emitting artifact files")?;

    Ok(())
}

fn init_logging(
    config: &ResolvedConfig,
    ctx: &RunContext,
) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let file_appender = tracing_appender::rolling::never(
        ctx.run_dir(),
        ctx.log_path().file_name().expect("log path always has a file name"),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter =
        EnvFilter::try_new(config.debug.log_level.as_str()).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(filter)
        .init();

    Ok(guard)
}
