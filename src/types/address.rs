use crate::error::{Result, SpreadsheetError};
use regex::Regex;
use std::sync::LazyLock;

/// Largest column (`ZZZZ`) and row (`9999`) this engine addresses.
pub const MAX_COL: u32 = 475_254;
pub const MAX_ROW: u32 = 9_999;

/// Column bound used specifically when translating a formula's cell
/// references during copy/move (see `formula::transform::translate`).
/// Narrower than [`MAX_COL`]: a destination can legally sit anywhere in the
/// addressable grid, but a reference *inside a pasted formula* that would
/// shift past column 9999 becomes `#REF!` rather than resolving live.
pub const MAX_TRANSLATE_COL: u32 = 9_999;

static ADDRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]{1,4})([1-9][0-9]{0,3})$").unwrap());

/// A resolved cell location: 1-based column and row, `A1` meaning `(1, 1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellAddress {
    pub col: u32,
    pub row: u32,
}

impl CellAddress {
    pub fn new(col: u32, row: u32) -> Self {
        CellAddress { col, row }
    }

    /// Base-26 decode, `A` = 1, `Z` = 26, `AA` = 27, ...
    pub fn column_to_label(mut col: u32) -> String {
        let mut label = Vec::new();
        while col > 0 {
            col -= 1;
            label.push((b'A' + (col % 26) as u8) as char);
            col /= 26;
        }
        label.iter().rev().collect()
    }

    /// Inverse of [`Self::column_to_label`]. Assumes `label` is uppercase ASCII letters.
    pub fn label_to_column(label: &str) -> u32 {
        label
            .bytes()
            .fold(0u32, |acc, c| acc * 26 + (c - b'A' + 1) as u32)
    }

    /// Parse an `A1`-style address (case-insensitive, trimmed by the caller).
    /// Rejects anything not matching `[A-Z]{1,4}[1-9][0-9]{0,3}` or out of the
    /// `ZZZZ`/`9999` bounds with "invalid cell location".
    pub fn parse(s: &str) -> Result<CellAddress> {
        let upper = s.to_ascii_uppercase();
        let caps = ADDRESS_RE
            .captures(&upper)
            .ok_or_else(|| SpreadsheetError::InvalidAddress(s.to_string()))?;
        let col = Self::label_to_column(&caps[1]);
        let row: u32 = caps[2]
            .parse()
            .map_err(|_| SpreadsheetError::InvalidAddress(s.to_string()))?;
        if col > MAX_COL || row > MAX_ROW {
            return Err(SpreadsheetError::InvalidAddress(s.to_string()));
        }
        Ok(CellAddress { col, row })
    }

    /// Offset this address, returning `None` if the result falls outside
    /// `[1, MAX_COL] x [1, MAX_ROW]` (the caller substitutes `#REF!`).
    pub fn translate(&self, d_col: i64, d_row: i64) -> Option<CellAddress> {
        let col = self.col as i64 + d_col;
        let row = self.row as i64 + d_row;
        if col < 1 || col as u32 > MAX_COL || row < 1 || row as u32 > MAX_ROW {
            None
        } else {
            Some(CellAddress::new(col as u32, row as u32))
        }
    }
}

impl std::fmt::Display for CellAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", Self::column_to_label(self.col), self.row)
    }
}
