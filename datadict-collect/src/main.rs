//! Database metadata and data-quality collection tool.
//!
//! This binary connects to a database, reads its schema, infers keys and
//! relationships, profiles every table and writes the results as JSON.
//!
//! # Security Guarantees
//! - Read-only database operations only
//! - No credentials stored or logged
//! - Only aggregate values leave the database

use anyhow::Context;
use clap::Parser;
use datadict_collect::{Cli, Command, commands};
use datadict_core::logging::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    match &cli.command {
        Some(Command::Run) | None => {
            let summary = commands::run(
                cli.require_database_url()?,
                &cli.artifacts_dir,
                cli.profiler_config()?,
            )
            .await
            .context("pipeline run failed")?;
            report(&summary, cli.global.quiet);
        }
        Some(Command::Extract) => {
            let summary = commands::extract(cli.require_database_url()?, &cli.artifacts_dir)
                .await
                .context("metadata extraction failed")?;
            report(&summary, cli.global.quiet);
        }
        Some(Command::Profile(args)) => {
            let metadata_path = cli.metadata_path(args);
            let summary = commands::profile(
                cli.require_database_url()?,
                &metadata_path,
                &cli.artifacts_dir,
                cli.profiler_config()?,
            )
            .await
            .with_context(|| format!("profiling {} failed", metadata_path.display()))?;
            report(&summary, cli.global.quiet);
        }
        Some(Command::Test) => {
            let database_type = commands::test_connection(cli.require_database_url()?)
                .await
                .context("connection test failed")?;
            println!("Connection to {database_type} database successful");
        }
        Some(Command::List) => println!("{}", commands::supported_databases()),
    }

    Ok(())
}

fn report(summary: &commands::Summary, quiet: bool) {
    if quiet {
        return;
    }
    println!("Tables: {}", summary.tables);
    println!("Relationships: {}", summary.relationships);
    if summary.degraded {
        println!("Key and relationship detection unavailable for this backend");
    }
    for path in &summary.written {
        println!("Output: {}", path.display());
    }
}
