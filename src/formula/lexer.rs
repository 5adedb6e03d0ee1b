use crate::types::{CellError, MAX_COL, MAX_ROW};
use chumsky::prelude::*;

/// Low-level token-shaped combinators shared by the parser: numbers,
/// strings, error literals, and the raw pieces of a cell reference (column
/// letters, row digits, `$` locks) before the parser assembles them into an
/// `Expr`. Kept separate from `parser.rs` the way the grid's own tokenizer
/// and parser were split, even though here they're composed directly into
/// chumsky combinators rather than a materialised token stream.
pub type Extra<'a> = extra::Err<Rich<'a, char>>;

pub fn number<'a>() -> impl Parser<'a, &'a str, rust_decimal::Decimal, Extra<'a>> + Clone {
    text::int(10)
        .then(just('.').then(text::digits(10)).or_not())
        .to_slice()
        .try_map(|s: &str, span| {
            s.parse::<rust_decimal::Decimal>()
                .map_err(|_| Rich::custom(span, "invalid number literal"))
        })
}

pub fn string_literal<'a>() -> impl Parser<'a, &'a str, String, Extra<'a>> + Clone {
    just('"')
        .ignore_then(none_of('"').repeated().to_slice())
        .then_ignore(just('"'))
        .map(|s: &str| s.to_string())
}

pub fn error_literal<'a>() -> impl Parser<'a, &'a str, CellError, Extra<'a>> + Clone {
    just('#')
        .then(none_of(" \t\r\n(),").repeated().at_least(1).to_slice())
        .to_slice()
        .try_map(|s: &str, span| {
            CellError::from_literal(s).ok_or_else(|| Rich::custom(span, "unrecognised error literal"))
        })
}

pub fn ident<'a>() -> impl Parser<'a, &'a str, &'a str, Extra<'a>> + Clone {
    text::ascii::ident()
}

/// `$?[A-Za-z]+$?[0-9]+`, returning `(col_label, col_locked, row, row_locked)`.
pub fn addr_parts<'a>() -> impl Parser<'a, &'a str, (String, bool, u32, bool), Extra<'a>> + Clone {
    let dollar = just('$').or_not().map(|d| d.is_some());
    let col_letters = one_of('A'..='Z')
        .or(one_of('a'..='z'))
        .repeated()
        .at_least(1)
        .to_slice()
        .map(|s: &str| s.to_uppercase());

    dollar
        .then(col_letters)
        .then(dollar)
        .then(text::int(10))
        .try_map(|(((col_locked, col), row_locked), row_str): (((bool, String), bool), &str), span| {
            let row: u32 = row_str
                .parse()
                .map_err(|_| Rich::custom(span, "row number out of range"))?;
            Ok((col, col_locked, row, row_locked))
        })
}

/// A bare or single-quoted sheet name, not yet followed by `!`.
pub fn sheet_name<'a>() -> impl Parser<'a, &'a str, String, Extra<'a>> + Clone {
    choice((
        just('\'')
            .ignore_then(none_of('\'').repeated().to_slice())
            .then_ignore(just('\''))
            .map(|s: &str| s.to_string()),
        text::ascii::ident().map(|s: &str| s.to_string()),
    ))
}

pub fn column_in_bounds(col: u32) -> bool {
    col >= 1 && col <= MAX_COL
}

pub fn row_in_bounds(row: u32) -> bool {
    row >= 1 && row <= MAX_ROW
}
