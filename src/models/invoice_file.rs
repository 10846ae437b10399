use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};

use crate::models::errors::{FileError, ParseError};
use crate::models::{FlatRow, InvoiceRecord, LineItem, RowKind};

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Column labels of the first row of an export, trailing empty field included.
pub const EXPECTED_HEADER: [&str; 10] = [
    "表頭=M",
    "載具名稱",
    "載具號碼",
    "發票日期",
    "商店統編",
    "商店店名",
    "發票號碼",
    "總金額",
    "發票狀態",
    ""
];

/// Invoices parsed from one pipe-delimited export file, in file order.
#[derive(Debug)]
pub struct InvoiceFile {
    pub file_name: PathBuf,
    invoices: Vec<InvoiceRecord>
}

impl InvoiceFile {
    pub fn new(file_name: impl Into<PathBuf>) -> Self {
        Self {
            file_name: file_name.into(),
            invoices: Vec::new()
        }
    }

    pub fn invoices(&self) -> &[InvoiceRecord] {
        &self.invoices
    }

    /// Opens and parses an export file.
    ///
    /// # Errors
    /// Any failure, including the file not opening, is returned as a
    /// `FileError` naming this file so a batch can report it and move on.
    pub fn from_path(path: &Path, check_header: bool) -> Result<Self, FileError> {
        let file = File::open(path).map_err(|error| FileError::new(path, None, error))?;

        Self::from_reader(path, BufReader::new(file), check_header)
    }

    /// Parses an export from any reader.
    ///
    /// Record 0 is the master header (validated when `check_header` is set),
    /// record 1 is the detail legend and is always skipped.
    pub fn from_reader<R: Read>(file_name: impl Into<PathBuf>, reader: R, check_header: bool) -> Result<Self, FileError> {
        let mut invoice_file = Self::new(file_name);

        let mut reader = ReaderBuilder::new()
            .delimiter(b'|')
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut record = StringRecord::new();
        let mut index = 0;

        loop {
            let read = reader.read_record(&mut record)
                .map_err(|error| invoice_file.error_at(index, error))?;

            if !read {
                break;
            }

            let mut fields: Vec<&str> = record.iter().collect();

            if index == 0 {
                if let Some(first) = fields.first_mut() {
                    *first = first.trim_start_matches(BYTE_ORDER_MARK);
                }

                if check_header && fields != EXPECTED_HEADER {
                    return Err(invoice_file.error_at(index, ParseError::invalid_header(&fields)))
                }
            } else if index > 1 {
                invoice_file.accept_row(&fields)
                    .map_err(|error| invoice_file.error_at(index, error))?;
            }

            index += 1;
        }

        Ok(invoice_file)
    }

    /// One row per line item, in file order, with invoice fields carried along.
    pub fn flatten(&self) -> Vec<FlatRow> {
        self.invoices.iter()
            .flat_map(|invoice| invoice.details().iter().map(move |detail| FlatRow::new(invoice, detail)))
            .collect()
    }

    /// Invoices whose line items do not add up to their stated total.
    pub fn inconsistent_invoices(&self) -> impl Iterator<Item = &InvoiceRecord> {
        self.invoices.iter().filter(|invoice| !invoice.is_consistent())
    }

    fn accept_row(&mut self, fields: &[&str]) -> Result<(), ParseError> {
        match RowKind::of(fields)? {
            RowKind::Master => {
                self.invoices.push(InvoiceRecord::from_fields(fields)?);
                Ok(())
            }
            RowKind::Detail => {
                let Some(last_invoice) = self.invoices.last_mut() else {
                    return Err(ParseError::detail_without_invoice(fields))
                };

                last_invoice.push_detail(LineItem::from_fields(fields)?)
            }
        }
    }

    fn error_at(&self, index: usize, error: impl Into<ParseError>) -> FileError {
        FileError::new(&self.file_name, Some(index + 1), error)
    }
}
