use crate::types::{CellError, CellValue};
use rust_decimal::Decimal;
use std::cmp::Ordering;

/// Coerce to a number for arithmetic (unary +/-, binary +, -, *, /).
/// Blank -> 0, boolean -> 1/0, number -> itself, text -> parsed decimal
/// (whitespace-trimmed) or `TypeError`, error -> propagated.
pub fn to_arithmetic(v: &CellValue) -> Result<Decimal, CellError> {
    match v {
        CellValue::Blank => Ok(Decimal::ZERO),
        CellValue::Boolean(b) => Ok(if *b { Decimal::ONE } else { Decimal::ZERO }),
        CellValue::Number(n) => Ok(*n),
        CellValue::Text(s) => s.trim().parse::<Decimal>().map_err(|_| CellError::TypeError),
        CellValue::Error(e) => Err(*e),
    }
}

/// Coerce to a string for `&` concatenation. Blank -> `""`, boolean ->
/// `TRUE`/`FALSE`, number -> its stripped text form, text -> itself, error
/// -> propagated.
pub fn to_concat_string(v: &CellValue) -> Result<String, CellError> {
    match v {
        CellValue::Blank => Ok(String::new()),
        CellValue::Boolean(b) => Ok(if *b { "TRUE" } else { "FALSE" }.to_string()),
        CellValue::Number(n) => Ok(n.normalize().to_string()),
        CellValue::Text(s) => Ok(s.clone()),
        CellValue::Error(e) => Err(*e),
    }
}

/// Coerce to a boolean for `AND`/`OR`/`NOT`/`XOR`/`IF` condition context.
/// Blank -> `FALSE`, number -> `x != 0`, text -> `"true"`/`"false"`
/// case-insensitive or `TypeError`, boolean -> itself, error -> propagated.
pub fn to_boolean(v: &CellValue) -> Result<bool, CellError> {
    match v {
        CellValue::Blank => Ok(false),
        CellValue::Number(n) => Ok(!n.is_zero()),
        CellValue::Text(s) => match s.to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(CellError::TypeError),
        },
        CellValue::Boolean(b) => Ok(*b),
        CellValue::Error(e) => Err(*e),
    }
}

/// Compare two values for `=`/`<>`/`<`/`<=`/`>`/`>=`. Errors propagate
/// (leftmost wins); blanks are coerced to the type-zero of the other side
/// (or `0` if both are blank); cross-type comparisons fall back to
/// `number < string < boolean` via [`CellValue::type_rank`]; same-type
/// string comparisons are ASCII-lowercased first.
pub fn compare(a: &CellValue, b: &CellValue) -> Result<Ordering, CellError> {
    if let CellValue::Error(e) = a {
        return Err(*e);
    }
    if let CellValue::Error(e) = b {
        return Err(*e);
    }

    let (a, b) = match (a, b) {
        (CellValue::Blank, CellValue::Blank) => (CellValue::Number(Decimal::ZERO), CellValue::Number(Decimal::ZERO)),
        (CellValue::Blank, other) => (type_zero(other), other.clone()),
        (other, CellValue::Blank) => (other.clone(), type_zero(other)),
        (a, b) => (a.clone(), b.clone()),
    };

    if a.type_rank() == b.type_rank() {
        match (&a, &b) {
            (CellValue::Number(x), CellValue::Number(y)) => Ok(x.cmp(y)),
            (CellValue::Text(x), CellValue::Text(y)) => {
                Ok(x.to_ascii_lowercase().cmp(&y.to_ascii_lowercase()))
            }
            (CellValue::Boolean(x), CellValue::Boolean(y)) => Ok(x.cmp(y)),
            _ => unreachable!("blanks/errors already normalised away"),
        }
    } else {
        Ok(a.type_rank().cmp(&b.type_rank()))
    }
}

fn type_zero(v: &CellValue) -> CellValue {
    match v {
        CellValue::Number(_) => CellValue::Number(Decimal::ZERO),
        CellValue::Text(_) => CellValue::Text(String::new()),
        CellValue::Boolean(_) => CellValue::Boolean(false),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn arithmetic_ladder() {
        assert_eq!(to_arithmetic(&CellValue::Blank), Ok(Decimal::ZERO));
        assert_eq!(to_arithmetic(&CellValue::Boolean(true)), Ok(Decimal::ONE));
        assert_eq!(to_arithmetic(&CellValue::Text(" 4.5 ".to_string())), Ok(dec!(4.5)));
        assert_eq!(to_arithmetic(&CellValue::Text("x".to_string())), Err(CellError::TypeError));
        assert_eq!(to_arithmetic(&CellValue::Error(CellError::DivideByZero)), Err(CellError::DivideByZero));
    }

    #[test]
    fn concat_ladder() {
        assert_eq!(to_concat_string(&CellValue::Boolean(false)).unwrap(), "FALSE");
        assert_eq!(to_concat_string(&CellValue::Number(dec!(50.00))).unwrap(), "50");
    }

    #[test]
    fn boolean_ladder_rejects_non_boolean_text() {
        assert_eq!(to_boolean(&CellValue::Text("yes".to_string())), Err(CellError::TypeError));
        assert_eq!(to_boolean(&CellValue::Text("TRUE".to_string())), Ok(true));
        assert_eq!(to_boolean(&CellValue::Number(dec!(0))), Ok(false));
    }

    #[test]
    fn comparison_cross_type_falls_back_to_rank() {
        assert_eq!(
            compare(&CellValue::Number(dec!(1)), &CellValue::Text("a".to_string())),
            Ok(Ordering::Less)
        );
        assert_eq!(
            compare(&CellValue::Blank, &CellValue::Number(dec!(0))),
            Ok(Ordering::Equal)
        );
    }
}
