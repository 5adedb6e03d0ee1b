mod json;
pub mod range;
mod sheet;
mod transaction;
#[allow(clippy::module_inception)]
mod workbook;

pub use self::range::{Contents, RangeBundle};
pub use self::sheet::Sheet;
pub use self::workbook::{ChangeSet, Notifier, Workbook};

#[cfg(test)]
mod tests;
