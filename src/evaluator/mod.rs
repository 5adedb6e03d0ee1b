pub mod coerce;
pub mod eval;
pub mod functions;

pub use eval::{evaluate, CellResolver, Resolution};
pub use functions::{FunctionLibrary, Thunk};
