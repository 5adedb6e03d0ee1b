use serde::{Deserialize, Serialize};

/// A cell-level error value. These propagate through formulas like any other
/// value rather than unwinding the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellError {
    #[serde(rename = "#ERROR!")]
    ParseError,
    #[serde(rename = "#CIRCREF!")]
    CircularReference,
    #[serde(rename = "#REF!")]
    BadReference,
    #[serde(rename = "#NAME?")]
    BadName,
    #[serde(rename = "#VALUE!")]
    TypeError,
    #[serde(rename = "#DIV/0!")]
    DivideByZero,
}

impl CellError {
    /// The literal token this error is written/displayed as (`#REF!`, etc).
    pub fn literal(&self) -> &'static str {
        match self {
            CellError::ParseError => "#ERROR!",
            CellError::CircularReference => "#CIRCREF!",
            CellError::BadReference => "#REF!",
            CellError::BadName => "#NAME?",
            CellError::TypeError => "#VALUE!",
            CellError::DivideByZero => "#DIV/0!",
        }
    }

    /// A short human-readable message, distinct from the literal token.
    pub fn message(&self) -> &'static str {
        match self {
            CellError::ParseError => "the formula could not be parsed",
            CellError::CircularReference => "cell is part of a circular reference",
            CellError::BadReference => "formula refers to a missing sheet or cell",
            CellError::BadName => "unrecognised function or name",
            CellError::TypeError => "value has the wrong type for this operation",
            CellError::DivideByZero => "division by zero",
        }
    }

    /// Parse one of the six recognised error literals, case-insensitively.
    /// Used both by the tokenizer (error literals in formula text) and by
    /// whole-cell literal parsing (a cell whose entire contents is `#REF!`).
    pub fn from_literal(s: &str) -> Option<CellError> {
        match s.to_ascii_uppercase().as_str() {
            "#ERROR!" => Some(CellError::ParseError),
            "#CIRCREF!" => Some(CellError::CircularReference),
            "#REF!" => Some(CellError::BadReference),
            "#NAME?" => Some(CellError::BadName),
            "#VALUE!" => Some(CellError::TypeError),
            "#DIV/0!" => Some(CellError::DivideByZero),
            _ => None,
        }
    }
}

impl std::fmt::Display for CellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.literal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_round_trip() {
        for err in [
            CellError::ParseError,
            CellError::CircularReference,
            CellError::BadReference,
            CellError::BadName,
            CellError::TypeError,
            CellError::DivideByZero,
        ] {
            assert_eq!(CellError::from_literal(err.literal()), Some(err));
            assert_eq!(
                CellError::from_literal(&err.literal().to_lowercase()),
                Some(err)
            );
        }
    }

    #[test]
    fn unknown_literal_is_none() {
        assert_eq!(CellError::from_literal("#WAT!"), None);
    }
}
