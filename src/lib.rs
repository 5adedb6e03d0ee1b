pub mod dependency;
pub mod domain;
pub mod error;
pub mod evaluator;
pub mod formula;
pub mod types;
pub mod workbook;

// Re-export commonly used types
pub use dependency::DependencyGraph;
pub use domain::Cell;
pub use error::{Result, SpreadsheetError};
pub use evaluator::{evaluate, CellResolver, FunctionLibrary};
pub use formula::{BinaryOp, CellRef, Expr, UnaryOp};
pub use types::{CellAddress, CellError, CellValue};
pub use workbook::{ChangeSet, Notifier, Workbook};
