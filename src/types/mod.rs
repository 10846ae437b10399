mod year_month;
#[cfg(test)]
mod tests;

pub use year_month::YearMonth;

pub type InvoiceNumber = String;
pub type SellerId = u64;
pub type RowId = usize;
