use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Broad class of a parse failure, so callers can react without matching every variant.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ErrorCategory {
    Format,
    Consistency,
    Value,
    Io
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid header: {found:?}")]
    InvalidHeader {
        found: Vec<String>
    },
    #[error("Unknown row type [{kind}]")]
    UnknownRowType {
        kind: String
    },
    #[error("Invalid row kind [{found}] for {record}, it should be [{expected}]")]
    WrongRowKind {
        record: &'static str,
        expected: &'static str,
        found: String
    },
    #[error("Expected {expected} fields for {record} but found {found}: [{row}]")]
    FieldCount {
        record: &'static str,
        expected: usize,
        found: usize,
        row: String
    },
    #[error("Detail without invoice: [{row}]")]
    DetailWithoutInvoice {
        row: String
    },
    #[error("Different invoice number: invoice [{invoice}], detail [{detail}]")]
    InvoiceNumberMismatch {
        invoice: String,
        detail: String
    },
    #[error("Invalid date [{value}] in row [{row}]")]
    InvalidDate {
        value: String,
        row: String
    },
    #[error("Invalid integer [{value}] for {field} in row [{row}]")]
    InvalidInteger {
        field: &'static str,
        value: String,
        row: String
    },
    #[error("Invalid decimal [{value}] in row [{row}]")]
    InvalidDecimal {
        value: String,
        row: String
    },
    #[error("Invalid invoice status [{value}], not in 開立 or 作廢")]
    InvalidStatus {
        value: String
    },
    #[error("Unable to open file: {0}")]
    Io(#[from] io::Error),
    #[error("Unable to read record: {0}")]
    Csv(#[from] csv::Error)
}

impl ParseError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidHeader { .. }
            | Self::UnknownRowType { .. }
            | Self::WrongRowKind { .. }
            | Self::FieldCount { .. } => ErrorCategory::Format,
            Self::DetailWithoutInvoice { .. } | Self::InvoiceNumberMismatch { .. } => ErrorCategory::Consistency,
            Self::InvalidDate { .. }
            | Self::InvalidInteger { .. }
            | Self::InvalidDecimal { .. }
            | Self::InvalidStatus { .. } => ErrorCategory::Value,
            Self::Io(_) => ErrorCategory::Io,
            Self::Csv(error) if error.is_io_error() => ErrorCategory::Io,
            Self::Csv(_) => ErrorCategory::Format
        }
    }

    pub fn invalid_header(fields: &[&str]) -> Self {
        Self::InvalidHeader {
            found: fields.iter().map(|field| field.to_string()).collect()
        }
    }

    pub fn unknown_row_type(kind: &str) -> Self {
        Self::UnknownRowType { kind: kind.to_string() }
    }

    pub fn wrong_row_kind(record: &'static str, expected: &'static str, fields: &[&str]) -> Self {
        Self::WrongRowKind {
            record,
            expected,
            found: fields.first().copied().unwrap_or_default().to_string()
        }
    }

    pub fn field_count(record: &'static str, expected: usize, found: usize, fields: &[&str]) -> Self {
        Self::FieldCount {
            record,
            expected,
            found,
            row: join_row(fields)
        }
    }

    pub fn detail_without_invoice(fields: &[&str]) -> Self {
        Self::DetailWithoutInvoice { row: join_row(fields) }
    }

    pub fn invoice_number_mismatch(invoice: &str, detail: &str) -> Self {
        Self::InvoiceNumberMismatch {
            invoice: invoice.to_string(),
            detail: detail.to_string()
        }
    }

    pub fn invalid_date(value: &str, fields: &[&str]) -> Self {
        Self::InvalidDate {
            value: value.to_string(),
            row: join_row(fields)
        }
    }

    pub fn invalid_integer(field: &'static str, value: &str, fields: &[&str]) -> Self {
        Self::InvalidInteger {
            field,
            value: value.to_string(),
            row: join_row(fields)
        }
    }

    pub fn invalid_decimal(value: &str, fields: &[&str]) -> Self {
        Self::InvalidDecimal {
            value: value.to_string(),
            row: join_row(fields)
        }
    }

    pub fn invalid_status(value: &str) -> Self {
        Self::InvalidStatus { value: value.to_string() }
    }
}

/// A parse failure tagged with the file it came from.
///
/// `record` is the 1-based record number in the file, or `None` when the
/// failure happened before any record was read (the file could not be opened).
#[derive(Debug, Error)]
#[error("Invalid file [{path}]{location}: {source}", path = .file.display(), location = describe_record(.record))]
pub struct FileError {
    pub file: PathBuf,
    pub record: Option<usize>,
    #[source]
    pub source: ParseError
}

impl FileError {
    pub fn new(file: impl Into<PathBuf>, record: Option<usize>, source: impl Into<ParseError>) -> Self {
        Self {
            file: file.into(),
            record,
            source: source.into()
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.source.category()
    }
}

fn describe_record(record: &Option<usize>) -> String {
    record.map(|number| format!(" at record {number}")).unwrap_or_default()
}

fn join_row(fields: &[&str]) -> String {
    fields.join("|")
}
