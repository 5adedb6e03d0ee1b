use thiserror::Error;

/// Host-level failures raised directly to the caller of a workbook operation.
/// Distinct from [`crate::types::CellError`], which is a cell *value* that
/// propagates through formulas rather than unwinding the call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpreadsheetError {
    #[error("invalid sheet name: {0}")]
    InvalidSheetName(String),

    #[error("a sheet named '{0}' already exists")]
    DuplicateSheetName(String),

    #[error("no sheet named '{0}'")]
    SheetNotFound(String),

    #[error("invalid cell location: {0}")]
    InvalidAddress(String),

    #[error("target range is out of bounds")]
    OutOfBounds,

    #[error("sheet index {0} is out of range")]
    SheetIndexOutOfRange(usize),

    #[error("malformed workbook: {0}")]
    MalformedWorkbook(String),
}

pub type Result<T> = std::result::Result<T, SpreadsheetError>;
