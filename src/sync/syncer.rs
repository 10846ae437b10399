use std::collections::HashSet;

use tracing::{error, info};

use crate::models::TidyRow;
use crate::sync::{RecordStore, SyncError};

/// Totals of one sync run.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct SyncReport {
    pub success: usize,
    pub fail: usize,
    /// Rows left out because their invoice already exists remotely.
    pub skipped: usize
}

/// Publishes tidy rows whose invoices are not yet in the remote store.
pub struct Syncer<S: RecordStore> {
    store: S
}

impl<S: RecordStore> Syncer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Rows whose invoice number is absent from `existing`, in table order.
    pub fn pending<'a>(existing: &HashSet<String>, rows: &'a [TidyRow]) -> Vec<&'a TidyRow> {
        rows.iter()
            .filter(|row| !existing.contains(&row.invoice_number))
            .collect()
    }

    /// Creates one record per pending row, one request at a time.
    ///
    /// A failed creation is logged and counted; it does not stop the run.
    ///
    /// # Errors
    /// Returns `SyncError` only when the existing records cannot be listed,
    /// in which case nothing is created.
    pub fn sync(&self, rows: &[TidyRow]) -> Result<SyncReport, SyncError> {
        let existing = self.store.existing_invoice_numbers()?;
        let pending = Self::pending(&existing, rows);

        let mut report = SyncReport {
            skipped: rows.len() - pending.len(),
            ..SyncReport::default()
        };

        info!(
            "{} invoices already stored remotely, {} of {} rows to upload",
            existing.len(), pending.len(), rows.len()
        );

        for row in pending {
            match self.store.create_record(row) {
                Ok(()) => {
                    report.success += 1;
                    info!("Uploaded invoice [{}]. Progress: {} success, {} fail", row.invoice_number, report.success, report.fail);
                }
                Err(failure) => {
                    report.fail += 1;
                    error!("Failed to upload invoice [{}] ({}): {failure}", row.invoice_number, row.description);
                }
            }
        }

        Ok(report)
    }
}
