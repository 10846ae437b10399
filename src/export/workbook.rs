use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use calamine::{open_workbook, Data, Reader, Xlsx};
use chrono::{Datelike, Days, NaiveDate};
use rust_decimal::Decimal;
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
use tracing::info;

use crate::export::ExportError;
use crate::models::TidyRow;
use crate::types::YearMonth;

pub const COLUMNS: [&str; 6] = ["YM", "Date", "Shop", "Invoice Number", "Amount", "Description"];

const SHEET_NAME: &str = "Invoices";
const DATE_FORMAT: &str = "yyyy-mm-dd";
const COLUMN_WIDTHS: [f64; 6] = [9.0, 12.0, 28.0, 16.0, 10.0, 48.0];
const WORKBOOK_EXTENSION: &str = "xlsx";

/// Name of the batch workbook covering `rows`, e.g. `Invoice_tidied_202301_202303.xlsx`.
///
/// Returns `None` for an empty table since there is no period to name.
pub fn batch_file_name(rows: &[TidyRow]) -> Option<String> {
    let start = rows.iter().map(|row| row.invoice_date).min()?;
    let end = rows.iter().map(|row| row.invoice_date).max()?;

    Some(format!(
        "Invoice_tidied_{}_{}.{WORKBOOK_EXTENSION}",
        YearMonth::from(start).compact(),
        YearMonth::from(end).compact()
    ))
}

/// Name of the per-source workbook, e.g. `2023_01.csv` becomes `2023_01_tidied.xlsx`.
pub fn per_file_name(source: &Path) -> String {
    let stem = source.file_stem().map(|stem| stem.to_string_lossy()).unwrap_or_default();

    format!("{stem}_tidied.{WORKBOOK_EXTENSION}")
}

/// Writes tidy tables to spreadsheets under one output directory.
pub struct WorkbookExporter {
    output_dir: PathBuf
}

impl WorkbookExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into()
        }
    }

    /// Writes the whole batch to a single workbook named after its period.
    pub fn export_batch(&self, rows: &[TidyRow]) -> Result<PathBuf, ExportError> {
        let file_name = batch_file_name(rows).ok_or(ExportError::Empty)?;

        self.export_as(rows, &file_name)
    }

    /// Writes `rows` to `file_name` inside the output directory, creating it if needed.
    pub fn export_as(&self, rows: &[TidyRow], file_name: &str) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(&self.output_dir)
            .map_err(|error| ExportError::create_dir(&self.output_dir, error))?;

        let path = self.output_dir.join(file_name);
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();
        let date_format = Format::new().set_num_format(DATE_FORMAT);

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        for (column, (label, width)) in COLUMNS.iter().zip(COLUMN_WIDTHS).enumerate() {
            let column = column as u16;
            worksheet.write_string_with_format(0, column, *label, &header_format)?;
            worksheet.set_column_width(column, width)?;
        }

        for (index, row) in rows.iter().enumerate() {
            let line = index as u32 + 1;
            let date = &row.invoice_date;
            let excel_date = ExcelDateTime::from_ymd(date.year() as u16, date.month() as u8, date.day() as u8)?;

            worksheet.write_string(line, 0, row.year_month().to_string())?;
            worksheet.write_datetime_with_format(line, 1, &excel_date, &date_format)?;
            worksheet.write_string(line, 2, &row.seller_name)?;
            worksheet.write_string(line, 3, &row.invoice_number)?;
            worksheet.write_number(line, 4, row.rounded_amount() as f64)?;
            worksheet.write_string(line, 5, &row.description)?;
        }

        workbook.save(&path)?;

        info!("Exported {} rows to [{}]", rows.len(), path.display());

        Ok(path)
    }
}

/// Most recently modified workbook directly inside `dir`.
pub fn latest_workbook(dir: &Path) -> Result<PathBuf, ExportError> {
    let mut latest: Option<(std::time::SystemTime, PathBuf)> = None;

    for entry in fs::read_dir(dir).map_err(|error| ExportError::read_dir(dir, error))? {
        let entry = entry.map_err(|error| ExportError::read_dir(dir, error))?;
        let path = entry.path();

        if !path.is_file() || path.extension().and_then(|extension| extension.to_str()) != Some(WORKBOOK_EXTENSION) {
            continue;
        }

        let modified = entry.metadata()
            .and_then(|metadata| metadata.modified())
            .map_err(|error| ExportError::read_dir(dir, error))?;

        if latest.as_ref().is_none_or(|(newest, _)| modified > *newest) {
            latest = Some((modified, path));
        }
    }

    latest.map(|(_, path)| path)
        .ok_or_else(|| ExportError::NoWorkbook { dir: dir.to_path_buf() })
}

/// Reads a workbook written by [`WorkbookExporter`] back into tidy rows.
///
/// Amounts come back as the rounded integers that were written.
pub fn read_workbook(path: &Path) -> Result<Vec<TidyRow>, ExportError> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|error| ExportError::read(path, error))?;

    let range = workbook.worksheet_range_at(0)
        .ok_or_else(|| ExportError::NoWorksheet { path: path.to_path_buf() })?
        .map_err(|error| ExportError::read(path, error))?;

    let mut rows = range.rows();

    let header: Vec<String> = rows.next().unwrap_or_default().iter().map(cell_text).collect();

    if header != COLUMNS {
        return Err(ExportError::invalid_row(path, 1, format!("unexpected columns {header:?}")))
    }

    rows.enumerate()
        .filter(|(_, cells)| cells.iter().any(|cell| !matches!(cell, Data::Empty)))
        .map(|(index, cells)| parse_row(cells).map_err(|message| ExportError::invalid_row(path, index + 2, message)))
        .collect()
}

fn parse_row(cells: &[Data]) -> Result<TidyRow, String> {
    let [_, date, shop, invoice_number, amount, description] = cells else {
        return Err(format!("expected {} cells but found {}", COLUMNS.len(), cells.len()))
    };

    Ok(TidyRow {
        invoice_number: cell_text(invoice_number),
        invoice_date: cell_date(date)?,
        seller_name: cell_text(shop),
        amount: cell_amount(amount)?,
        description: cell_text(description)
    })
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.clone(),
        other => other.to_string()
    }
}

fn cell_date(cell: &Data) -> Result<NaiveDate, String> {
    match cell {
        Data::DateTime(date_time) => serial_to_date(date_time.as_f64()),
        Data::Float(serial) => serial_to_date(*serial),
        Data::DateTimeIso(text) | Data::String(text) => {
            let date_part = text.get(..10).unwrap_or(text);
            NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                .map_err(|_| format!("invalid date [{text}]"))
        }
        other => Err(format!("invalid date [{other}]"))
    }
}

/// Converts an Excel 1900-system serial to a date.
fn serial_to_date(serial: f64) -> Result<NaiveDate, String> {
    if !serial.is_finite() || serial < 1.0 {
        return Err(format!("invalid date serial [{serial}]"))
    }

    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|epoch| epoch.checked_add_days(Days::new(serial.trunc() as u64)))
        .ok_or_else(|| format!("invalid date serial [{serial}]"))
}

fn cell_amount(cell: &Data) -> Result<Decimal, String> {
    match cell {
        Data::Int(value) => Ok(Decimal::from(*value)),
        Data::Float(value) => Decimal::try_from(*value).map_err(|_| format!("invalid amount [{value}]")),
        Data::String(text) => Decimal::from_str(text.trim()).map_err(|_| format!("invalid amount [{text}]")),
        other => Err(format!("invalid amount [{other}]"))
    }
}
