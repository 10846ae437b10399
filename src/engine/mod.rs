mod pipeline;
mod tidy;

pub use pipeline::{BatchReport, FileTable, TidyPipeline};
pub use tidy::{tidy, Absorption, Adjustment, Ledger};
