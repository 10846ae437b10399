mod errors;
mod workbook;

pub use errors::ExportError;
pub use workbook::{latest_workbook, per_file_name, read_workbook, WorkbookExporter};
