mod errors;
mod notion;
mod properties;
mod syncer;
#[cfg(test)]
mod tests;

use std::collections::HashSet;

use crate::models::TidyRow;
use crate::types::InvoiceNumber;

pub use errors::SyncError;
pub use notion::NotionStore;
pub use syncer::{SyncReport, Syncer};

/// Remote table that tidy rows are published to.
pub trait RecordStore {
    /// Invoice numbers of every record already present remotely.
    fn existing_invoice_numbers(&self) -> Result<HashSet<InvoiceNumber>, SyncError>;

    /// Creates one record for `row`.
    fn create_record(&self, row: &TidyRow) -> Result<(), SyncError>;
}

impl<T: RecordStore + ?Sized> RecordStore for &T {
    fn existing_invoice_numbers(&self) -> Result<HashSet<InvoiceNumber>, SyncError> {
        (**self).existing_invoice_numbers()
    }

    fn create_record(&self, row: &TidyRow) -> Result<(), SyncError> {
        (**self).create_record(row)
    }
}
