mod errors;
mod flat_row;
mod invoice;
mod invoice_file;

use std::str::FromStr;

pub use errors::{ErrorCategory, FileError, ParseError};
pub use flat_row::{FlatRow, TidyRow};
pub use invoice::{InvoiceRecord, LineItem};
pub use invoice_file::InvoiceFile;

const ISSUED: &str = "開立";
const VOIDED: &str = "作廢";

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InvoiceStatus {
    Issued,
    Voided
}

impl FromStr for InvoiceStatus {
    type Err = ParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            ISSUED => Ok(Self::Issued),
            VOIDED => Ok(Self::Voided),
            other => Err(ParseError::invalid_status(other))
        }
    }
}

/// Discriminator in the first field of every data row.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum RowKind {
    Master,
    Detail
}

impl RowKind {
    const MASTER: &'static str = "M";
    const DETAIL: &'static str = "D";

    fn of(fields: &[&str]) -> Result<Self, ParseError> {
        match fields.first().copied().unwrap_or_default() {
            Self::MASTER => Ok(Self::Master),
            Self::DETAIL => Ok(Self::Detail),
            other => Err(ParseError::unknown_row_type(other))
        }
    }
}
