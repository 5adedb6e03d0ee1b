use super::address::{MAX_COL, MAX_ROW};

/// Grid bounds, grouped for callers that want them as a unit (e.g. bounds
/// checks that report both axes together). The constants themselves live on
/// [`super::CellAddress`]'s module since that's where the grammar they bound
/// is parsed; this is just a named handle onto the same two values.
pub struct Limits;

impl Limits {
    pub const MAX_COL: u32 = MAX_COL;
    pub const MAX_ROW: u32 = MAX_ROW;
}
