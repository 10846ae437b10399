use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Nothing to export")]
    Empty,
    #[error("Unable to create output directory [{}]: {source}", .dir.display())]
    CreateDir {
        dir: PathBuf,
        source: io::Error
    },
    #[error("Unable to list directory [{}]: {source}", .dir.display())]
    ReadDir {
        dir: PathBuf,
        source: io::Error
    },
    #[error("No workbook found in [{}]", .dir.display())]
    NoWorkbook {
        dir: PathBuf
    },
    #[error("Unable to write workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),
    #[error("Unable to read workbook [{}]: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: calamine::XlsxError
    },
    #[error("Workbook [{}] has no worksheet", .path.display())]
    NoWorksheet {
        path: PathBuf
    },
    #[error("Workbook [{}] row {row}: {message}", .path.display())]
    InvalidRow {
        path: PathBuf,
        row: usize,
        message: String
    }
}

impl ExportError {
    pub fn create_dir(dir: &Path, source: io::Error) -> Self {
        Self::CreateDir { dir: dir.to_path_buf(), source }
    }

    pub fn read_dir(dir: &Path, source: io::Error) -> Self {
        Self::ReadDir { dir: dir.to_path_buf(), source }
    }

    pub fn read(path: &Path, source: calamine::XlsxError) -> Self {
        Self::Read { path: path.to_path_buf(), source }
    }

    pub fn invalid_row(path: &Path, row: usize, message: impl Into<String>) -> Self {
        Self::InvalidRow {
            path: path.to_path_buf(),
            row,
            message: message.into()
        }
    }
}
