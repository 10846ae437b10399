use std::path::{Path, PathBuf};

use glob::{glob, Pattern, PatternError};
use tracing::{error, info, warn};

use crate::engine::tidy;
use crate::models::{FileError, InvoiceFile, TidyRow};

/// Tidy rows produced from one input file.
#[derive(Debug)]
pub struct FileTable {
    pub file: PathBuf,
    pub rows: Vec<TidyRow>
}

/// Outcome of a batch: the files that tidied cleanly and the ones that did not.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub tables: Vec<FileTable>,
    pub failures: Vec<FileError>
}

impl BatchReport {
    pub fn row_count(&self) -> usize {
        self.tables.iter().map(|table| table.rows.len()).sum()
    }

    /// Concatenates every file's rows in processing order.
    pub fn into_rows(self) -> Vec<TidyRow> {
        self.tables.into_iter().flat_map(|table| table.rows).collect()
    }
}

/// Sequential parse-and-tidy pipeline over a batch of export files.
///
/// Each file is parsed, flattened and tidied on its own before the results
/// are concatenated, so a file that fails is reported and skipped without
/// affecting the others.
pub struct TidyPipeline {
    check_header: bool
}

impl Default for TidyPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl TidyPipeline {
    pub fn new() -> Self {
        Self {
            check_header: true
        }
    }

    pub fn with_header_check(mut self, enabled: bool) -> Self {
        self.check_header = enabled;
        self
    }

    /// Lists files directly inside `input_dir` ending in `.{extension}`, sorted by path.
    pub fn discover(input_dir: &Path, extension: &str) -> Result<Vec<PathBuf>, PatternError> {
        let escaped_dir = Pattern::escape(&input_dir.to_string_lossy());
        let pattern = format!("{}/*.{}", escaped_dir.trim_end_matches('/'), Pattern::escape(extension));

        let mut paths: Vec<PathBuf> = glob(&pattern)?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(error) => {
                    warn!("Skipping unreadable input entry: {error}");
                    None
                }
            })
            .filter(|path| path.is_file())
            .collect();

        paths.sort();

        Ok(paths)
    }

    /// Parses, flattens and tidies a single file.
    pub fn process_file(&self, path: &Path) -> Result<FileTable, FileError> {
        let invoice_file = InvoiceFile::from_path(path, self.check_header)?;

        for invoice in invoice_file.inconsistent_invoices() {
            warn!(
                "Invoice [{}] in [{}] totals {} but its line items sum to {}",
                invoice.invoice_number, path.display(), invoice.amount, invoice.details_total()
            );
        }

        let flat_rows = invoice_file.flatten();
        let flat_count = flat_rows.len();
        let rows = tidy(flat_rows);

        info!(
            "Tidied [{}]: {} invoices, {} line items, {} rows kept",
            path.display(), invoice_file.invoices().len(), flat_count, rows.len()
        );

        Ok(FileTable {
            file: path.to_path_buf(),
            rows
        })
    }

    /// Processes every file in order, collecting failures instead of stopping.
    pub fn run(&self, paths: &[PathBuf]) -> BatchReport {
        let mut report = BatchReport::default();

        for path in paths {
            match self.process_file(path) {
                Ok(table) => report.tables.push(table),
                Err(failure) => {
                    error!("{failure} ({:?} error)", failure.category());
                    report.failures.push(failure);
                }
            }
        }

        report
    }
}
