use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::models::errors::ParseError;
use crate::models::{InvoiceStatus, RowKind};
use crate::types::{InvoiceNumber, SellerId};

const DATE_FORMAT: &str = "%Y%m%d";
/// Earliest year a spreadsheet date can hold.
const MIN_YEAR: i32 = 1900;

/// One invoice, built from a master (`M`) row.
///
/// Header-level fields are fixed once parsed; the only mutation allowed is
/// appending line items through [`InvoiceRecord::push_detail`], which checks
/// that the detail belongs to this invoice.
#[derive(Debug, Clone)]
pub struct InvoiceRecord {
    pub invoice_number: InvoiceNumber,
    pub card_name: String,
    pub card_id: String,
    pub invoice_date: NaiveDate,
    pub seller_id: SellerId,
    pub seller_name: String,
    /// Invoice total in whole currency units.
    pub amount: i64,
    pub status: InvoiceStatus,
    details: Vec<LineItem>
}

impl InvoiceRecord {
    const RECORD: &'static str = "invoice";

    /// Builds an invoice from a full master row, discriminator included.
    ///
    /// Field order after the discriminator: card name, card id, invoice date,
    /// seller id, seller name, invoice number, total amount, status.
    ///
    /// # Errors
    /// Returns `ParseError` if the row is not a master row, has the wrong
    /// number of fields, or any typed field fails to parse.
    pub fn from_fields(fields: &[&str]) -> Result<Self, ParseError> {
        let [card_name, card_id, invoice_date, seller_id, seller_name, invoice_number, amount, status] =
            data_fields(fields, RowKind::Master, Self::RECORD)?;

        Ok(Self {
            invoice_number: invoice_number.to_string(),
            card_name: card_name.to_string(),
            card_id: card_id.to_string(),
            invoice_date: parse_date(invoice_date, fields)?,
            seller_id: seller_id.trim().parse()
                .map_err(|_| ParseError::invalid_integer("seller id", seller_id, fields))?,
            seller_name: seller_name.to_string(),
            amount: amount.trim().parse()
                .map_err(|_| ParseError::invalid_integer("amount", amount, fields))?,
            status: InvoiceStatus::from_str(status)?,
            details: Vec::new()
        })
    }

    pub fn details(&self) -> &[LineItem] {
        &self.details
    }

    /// Appends a line item, rejecting one that names a different invoice.
    pub fn push_detail(&mut self, detail: LineItem) -> Result<(), ParseError> {
        if detail.invoice_number != self.invoice_number {
            return Err(ParseError::invoice_number_mismatch(&self.invoice_number, &detail.invoice_number))
        }

        self.details.push(detail);

        Ok(())
    }

    pub fn details_total(&self) -> Decimal {
        self.details.iter().map(|detail| detail.amount).sum()
    }

    /// Whether the line items add up to the invoice's own total.
    pub fn is_consistent(&self) -> bool {
        self.details_total() == Decimal::from(self.amount)
    }
}

/// One line of an invoice, built from a detail (`D`) row.
///
/// A negative amount marks a discount or refund adjustment.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub invoice_number: InvoiceNumber,
    pub amount: Decimal,
    pub description: String
}

impl LineItem {
    const RECORD: &'static str = "detail";

    /// Builds a line item from a full detail row, discriminator included.
    ///
    /// Field order after the discriminator: invoice number, amount, description.
    pub fn from_fields(fields: &[&str]) -> Result<Self, ParseError> {
        let [invoice_number, amount, description] =
            data_fields(fields, RowKind::Detail, Self::RECORD)?;

        Ok(Self {
            invoice_number: invoice_number.to_string(),
            amount: Decimal::from_str(amount.trim())
                .map_err(|_| ParseError::invalid_decimal(amount, fields))?,
            description: description.to_string()
        })
    }
}

/// Checks the discriminator and field count, returning the data fields.
///
/// Rows exported by the portal end with a `|`, which yields one extra empty
/// field; that single trailing field is tolerated.
fn data_fields<'a, const N: usize>(fields: &[&'a str], kind: RowKind, record: &'static str) -> Result<[&'a str; N], ParseError> {
    let expected = match kind {
        RowKind::Master => RowKind::MASTER,
        RowKind::Detail => RowKind::DETAIL
    };

    if fields.first().copied() != Some(expected) {
        return Err(ParseError::wrong_row_kind(record, expected, fields))
    }

    let mut data = &fields[1..];

    if data.len() == N + 1 && data[N].is_empty() {
        data = &data[..N];
    }

    <[&'a str; N]>::try_from(data)
        .map_err(|_| ParseError::field_count(record, N, data.len(), fields))
}

fn parse_date(value: &str, fields: &[&str]) -> Result<NaiveDate, ParseError> {
    let value = value.trim();

    if value.len() != 8 || !value.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(ParseError::invalid_date(value, fields))
    }

    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .filter(|date| date.year() >= MIN_YEAR)
        .ok_or_else(|| ParseError::invalid_date(value, fields))
}
