mod cli;
mod config;
mod engine;
mod export;
mod models;
mod sync;
mod types;

use std::io::stderr;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use crate::cli::{Cli, Command, CredentialArgs, SyncArgs, TidyArgs};
use crate::engine::TidyPipeline;
use crate::export::{latest_workbook, per_file_name, read_workbook, WorkbookExporter};
use crate::models::TidyRow;
use crate::sync::{NotionStore, Syncer};

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    setup_logging(parse_log_level(&cli.log_level));

    match cli.command {
        Command::Tidy(args) => run_tidy(&args).map(|_| ()),
        Command::Sync(args) => run_sync(args),
        Command::Run(args) => {
            let rows = run_tidy(&args.tidy)?;
            sync_rows(&rows, args.credentials)
        }
    }
}

/// Tidies every discovered file and exports the batch. Files that fail are
/// logged and left out.
fn run_tidy(args: &TidyArgs) -> Result<Vec<TidyRow>> {
    let paths = TidyPipeline::discover(&args.input_dir, &args.extension)
        .with_context(|| format!("Invalid input directory [{}]", args.input_dir.display()))?;

    if paths.is_empty() {
        warn!("No *.{} files found in [{}]", args.extension, args.input_dir.display());
    }

    let timer = Instant::now();
    let report = TidyPipeline::new()
        .with_header_check(!args.skip_header_check)
        .run(&paths);

    info!(
        "Processed {} files in {:?}: {} rows, {} failures",
        paths.len(), timer.elapsed(), report.row_count(), report.failures.len()
    );

    let exporter = WorkbookExporter::new(&args.output_dir);

    if args.per_file {
        for table in report.tables.iter().filter(|table| !table.rows.is_empty()) {
            exporter.export_as(&table.rows, &per_file_name(&table.file))?;
        }
    }

    let rows = report.into_rows();

    if rows.is_empty() {
        warn!("Nothing left to export after tidying, no workbook written");
    } else {
        let path = exporter.export_batch(&rows)?;
        println!("{}", path.display());
    }

    Ok(rows)
}

fn run_sync(args: SyncArgs) -> Result<()> {
    let workbook = match args.workbook {
        Some(path) => path,
        None => latest_workbook(&args.output_dir)?
    };

    info!("Reading tidied rows from [{}]", workbook.display());

    let rows = read_workbook(&workbook)?;

    sync_rows(&rows, args.credentials)
}

fn sync_rows(rows: &[TidyRow], credentials: CredentialArgs) -> Result<()> {
    let config = credentials.into_config()?;
    let store = NotionStore::new(config)?;

    let report = Syncer::new(store).sync(rows)
        .context("Could not list existing records, nothing was uploaded")?;

    println!("Total: {} success, {} fail, {} skipped", report.success, report.fail, report.skipped);

    Ok(())
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'error'", level);
            LevelFilter::ERROR
        }
    }
}

fn setup_logging(level: LevelFilter) {
    //NOTE: stdout carries the workbook path and sync totals, so logs go to stderr
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_parse_log_level_falls_back_to_error() {
        assert_eq!(parse_log_level("DEBUG"), LevelFilter::DEBUG);
        assert_eq!(parse_log_level("verbose"), LevelFilter::ERROR);
    }

    #[test]
    fn test_cli_parses_run_with_credentials() -> Result<()> {
        let cli = Cli::try_parse_from([
            "invoice-tidy", "run", "--input-dir", "in", "--per-file",
            "--notion-secret", "secret", "--database-id", "db", "--log-level", "warn"
        ])?;

        assert_eq!(cli.log_level, "warn");

        let Command::Run(args) = cli.command else {
            anyhow::bail!("expected the run command");
        };

        assert_eq!(args.tidy.input_dir, Path::new("in"));
        assert!(args.tidy.per_file);

        let config = args.credentials.into_config()?;
        assert_eq!(config.database_id, "db");
        assert_eq!(config.page_size, 100);

        Ok(())
    }
}
