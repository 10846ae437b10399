use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::models::{InvoiceRecord, InvoiceStatus, LineItem};
use crate::types::{InvoiceNumber, SellerId, YearMonth};

/// Marks where an adjustment's description is appended to the row that absorbed it.
pub const ANNOTATION_SEPARATOR: &str = " *** ";

/// One line item with its invoice-level fields carried alongside.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRow {
    pub invoice_number: InvoiceNumber,
    pub card_name: String,
    pub card_id: String,
    pub invoice_date: NaiveDate,
    pub seller_id: SellerId,
    pub seller_name: String,
    pub status: InvoiceStatus,
    /// Amount of the line item, not the invoice total.
    pub amount: Decimal,
    pub description: String
}

impl FlatRow {
    pub fn new(invoice: &InvoiceRecord, detail: &LineItem) -> Self {
        Self {
            invoice_number: invoice.invoice_number.clone(),
            card_name: invoice.card_name.clone(),
            card_id: invoice.card_id.clone(),
            invoice_date: invoice.invoice_date,
            seller_id: invoice.seller_id,
            seller_name: invoice.seller_name.clone(),
            status: invoice.status,
            amount: detail.amount,
            description: detail.description.clone()
        }
    }

    /// Drops the columns that are meaningless once voided invoices are filtered out.
    pub fn into_tidy(self) -> TidyRow {
        TidyRow {
            invoice_number: self.invoice_number,
            invoice_date: self.invoice_date,
            seller_name: self.seller_name,
            amount: self.amount,
            description: self.description
        }
    }
}

/// A row of the tidy table handed to the export and sync adapters.
#[derive(Debug, Clone, PartialEq)]
pub struct TidyRow {
    pub invoice_number: InvoiceNumber,
    pub invoice_date: NaiveDate,
    pub seller_name: String,
    pub amount: Decimal,
    pub description: String
}

impl TidyRow {
    pub fn year_month(&self) -> YearMonth {
        YearMonth::from(self.invoice_date)
    }

    /// Amount rounded half-to-even to whole currency units, saturating at the `i64` range.
    pub fn rounded_amount(&self) -> i64 {
        let rounded = self.amount.round();

        rounded.to_i64().unwrap_or(if rounded.is_sign_negative() { i64::MIN } else { i64::MAX })
    }

    pub(crate) fn annotate(&mut self, adjustment_description: &str) {
        self.description.push_str(ANNOTATION_SEPARATOR);
        self.description.push_str(adjustment_description);
    }
}
