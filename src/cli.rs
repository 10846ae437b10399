use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::config::{SyncConfig, DATABASE_VARIABLE, DEFAULT_API_BASE, SECRET_VARIABLE};
use crate::sync::SyncError;

#[derive(Parser)]
#[command(name = "invoice-tidy")]
#[command(about = "Tidy e-invoice carrier exports into a spreadsheet and publish them")]
#[command(version)]
pub struct Cli {
    /// One of error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command
}

#[derive(Subcommand)]
pub enum Command {
    /// Tidy every export in the input directory into one workbook
    Tidy(TidyArgs),
    /// Upload the latest tidied workbook to the hosted database
    Sync(SyncArgs),
    /// Tidy, then upload the resulting rows
    Run(RunArgs)
}

#[derive(Args)]
pub struct TidyArgs {
    #[arg(long, default_value = "input_folder")]
    pub input_dir: PathBuf,

    #[arg(long, default_value = "output_folder")]
    pub output_dir: PathBuf,

    /// Input file extension, without the dot
    #[arg(long, default_value = "csv")]
    pub extension: String,

    /// Accept files whose first row is not the standard export header
    #[arg(long)]
    pub skip_header_check: bool,

    /// Also write one `<stem>_tidied.xlsx` per input file
    #[arg(long)]
    pub per_file: bool
}

#[derive(Args)]
pub struct SyncArgs {
    /// Directory searched for the most recent workbook
    #[arg(long, default_value = "output_folder")]
    pub output_dir: PathBuf,

    /// Upload this workbook instead of the most recent one
    #[arg(long)]
    pub workbook: Option<PathBuf>,

    #[command(flatten)]
    pub credentials: CredentialArgs
}

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub tidy: TidyArgs,

    #[command(flatten)]
    pub credentials: CredentialArgs
}

#[derive(Args)]
pub struct CredentialArgs {
    #[arg(long, env = SECRET_VARIABLE, hide_env_values = true)]
    pub notion_secret: Option<String>,

    #[arg(long, env = DATABASE_VARIABLE)]
    pub database_id: Option<String>,

    #[arg(long, env = "NOTION_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Records requested per query page (at most 100)
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub page_size: u32
}

impl CredentialArgs {
    pub fn into_config(self) -> Result<SyncConfig, SyncError> {
        Ok(SyncConfig::from_credentials(self.notion_secret, self.database_id)?
            .with_api_base(self.api_base)
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_page_size(self.page_size))
    }
}
