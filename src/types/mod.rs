mod address;
mod error;
mod limits;
mod value;

pub use address::{CellAddress, MAX_COL, MAX_ROW, MAX_TRANSLATE_COL};
pub use error::CellError;
pub use limits::Limits;
pub use value::CellValue;
