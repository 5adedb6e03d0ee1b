use crate::types::CellError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The value a cell evaluates to. Exactly one of five shapes; there is no
/// "array"/"range" value because ranges never appear outside function
/// argument position and are expanded before a value is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Blank,
    Number(Decimal),
    Text(String),
    Boolean(bool),
    Error(CellError),
}

impl CellValue {
    /// Build a number value, stripping trailing zeros (`50.00` -> `50`).
    pub fn number(d: Decimal) -> CellValue {
        CellValue::Number(d.normalize())
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Blank)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CellValue::Error(_))
    }

    pub fn as_error(&self) -> Option<CellError> {
        match self {
            CellValue::Error(e) => Some(*e),
            _ => None,
        }
    }

    /// Relative ordering of types used when comparison falls back to
    /// cross-type comparison: `number < string < boolean`.
    pub fn type_rank(&self) -> u8 {
        match self {
            CellValue::Number(_) => 0,
            CellValue::Text(_) => 1,
            CellValue::Boolean(_) => 2,
            CellValue::Blank | CellValue::Error(_) => u8::MAX,
        }
    }

    /// Parse a whole-cell literal the way direct (non-formula) contents are
    /// interpreted: number, then boolean, then error literal, then text —
    /// in that order of precedence.
    pub fn parse_literal(s: &str) -> CellValue {
        if let Ok(d) = s.parse::<Decimal>() {
            return CellValue::number(d);
        }
        match s.to_ascii_uppercase().as_str() {
            "TRUE" => return CellValue::Boolean(true),
            "FALSE" => return CellValue::Boolean(false),
            _ => {}
        }
        if let Some(err) = CellError::from_literal(s) {
            return CellValue::Error(err);
        }
        CellValue::Text(s.to_string())
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Blank => write!(f, ""),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Error(e) => write!(f, "{}", e.literal()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn number_strips_trailing_zeros() {
        assert_eq!(CellValue::number(dec!(50.00)), CellValue::Number(dec!(50)));
        assert_eq!(CellValue::number(dec!(1.000)), CellValue::Number(dec!(1)));
    }

    #[test]
    fn literal_precedence_number_then_bool_then_error_then_text() {
        assert_eq!(CellValue::parse_literal("42"), CellValue::Number(dec!(42)));
        assert_eq!(CellValue::parse_literal("true"), CellValue::Boolean(true));
        assert_eq!(
            CellValue::parse_literal("#REF!"),
            CellValue::Error(CellError::BadReference)
        );
        assert_eq!(
            CellValue::parse_literal("hello"),
            CellValue::Text("hello".to_string())
        );
    }
}
