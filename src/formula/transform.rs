use super::ast::Expr;
use crate::types::{CellAddress, MAX_ROW, MAX_TRANSLATE_COL};
use std::collections::HashSet;

/// A reference to a single cell as it appears in dependency bookkeeping:
/// lower-cased sheet name and upper-cased address, so lookups don't care
/// about the case the formula author happened to type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub sheet_lower: String,
    pub addr_upper: String,
}

impl CellRef {
    pub fn new(sheet: &str, addr: &str) -> CellRef {
        CellRef {
            sheet_lower: sheet.to_ascii_lowercase(),
            addr_upper: addr.to_ascii_uppercase(),
        }
    }
}

fn bare_sheet_ident(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn quote_sheet(name: &str) -> String {
    if bare_sheet_ident(name) {
        name.to_string()
    } else {
        format!("'{}'", name)
    }
}

fn addr_text(col: u32, row: u32, col_locked: bool, row_locked: bool) -> String {
    format!(
        "{}{}{}{}",
        if col_locked { "$" } else { "" },
        CellAddress::column_to_label(col),
        if row_locked { "$" } else { "" },
        row
    )
}

/// Canonical pretty-printer. Always prefixed with `=`; binary operators are
/// emitted with no surrounding whitespace; parenthesisation is reproduced
/// exactly as the parser recorded it, not re-derived from precedence.
pub fn stringify(expr: &Expr) -> String {
    format!("={}", stringify_node(expr))
}

fn stringify_node(expr: &Expr) -> String {
    match expr {
        Expr::Number(n) => n.to_string(),
        Expr::Text(s) => format!("\"{}\"", s),
        Expr::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Expr::ErrorLiteral(e) => e.literal().to_string(),
        Expr::CellRef {
            sheet,
            col,
            row,
            col_locked,
            row_locked,
        } => {
            let addr = addr_text(*col, *row, *col_locked, *row_locked);
            match sheet {
                Some(s) => format!("{}!{}", quote_sheet(s), addr),
                None => addr,
            }
        }
        Expr::FunctionCall { name, args } => {
            let rendered: Vec<String> = args.iter().map(stringify_node).collect();
            format!("{}({})", name, rendered.join(","))
        }
        Expr::Unary { op, expr } => format!("{}{}", op.symbol(), stringify_node(expr)),
        Expr::Binary { op, left, right } => {
            format!("{}{}{}", stringify_node(left), op.symbol(), stringify_node(right))
        }
        Expr::Paren(inner) => format!("({})", stringify_node(inner)),
    }
}

/// Replace any cell reference whose sheet case-insensitively equals `old`
/// with `new`. Unqualified references (no sheet component) are left alone —
/// they belong to whichever sheet the cell is on, and the cell itself is
/// renamed separately if it's the one that moved.
pub fn rename_sheet(expr: &Expr, old: &str, new: &str) -> Expr {
    let old_lower = old.to_ascii_lowercase();
    match expr {
        Expr::CellRef {
            sheet,
            col,
            row,
            col_locked,
            row_locked,
        } => {
            let renamed = match sheet {
                Some(s) if s.eq_ignore_ascii_case(&old_lower) || s.to_ascii_lowercase() == old_lower => {
                    Some(new.to_string())
                }
                other => other.clone(),
            };
            Expr::CellRef {
                sheet: renamed,
                col: *col,
                row: *row,
                col_locked: *col_locked,
                row_locked: *row_locked,
            }
        }
        Expr::FunctionCall { name, args } => Expr::FunctionCall {
            name: name.clone(),
            args: args.iter().map(|a| rename_sheet(a, old, new)).collect(),
        },
        Expr::Unary { op, expr } => Expr::Unary {
            op: *op,
            expr: Box::new(rename_sheet(expr, old, new)),
        },
        Expr::Binary { op, left, right } => Expr::Binary {
            op: *op,
            left: Box::new(rename_sheet(left, old, new)),
            right: Box::new(rename_sheet(right, old, new)),
        },
        Expr::Paren(inner) => Expr::Paren(Box::new(rename_sheet(inner, old, new))),
        leaf @ (Expr::Number(_) | Expr::Text(_) | Expr::Bool(_) | Expr::ErrorLiteral(_)) => leaf.clone(),
    }
}

/// Whether any cell reference in the tree has a sheet component matching
/// `name` case-insensitively. Used to short-circuit `rename_sheet` to a
/// no-op when nothing would change.
pub fn references_sheet(expr: &Expr, name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    match expr {
        Expr::CellRef { sheet: Some(s), .. } => s.to_ascii_lowercase() == lower,
        Expr::CellRef { sheet: None, .. } => false,
        Expr::FunctionCall { args, .. } => args.iter().any(|a| references_sheet(a, name)),
        Expr::Unary { expr, .. } | Expr::Paren(expr) => references_sheet(expr, name),
        Expr::Binary { left, right, .. } => {
            references_sheet(left, name) || references_sheet(right, name)
        }
        _ => false,
    }
}

/// Offset every cell reference by `(d_col, d_row)`, preserving the sheet
/// component verbatim. A reference that would shift past column
/// [`MAX_TRANSLATE_COL`] or row [`MAX_ROW`] becomes a `#REF!` error literal
/// instead — a narrower bound than the grid's own addressable width, since
/// this governs a reference *inside* a translated formula, not a paste
/// destination.
pub fn translate(expr: &Expr, d_col: i64, d_row: i64) -> Expr {
    match expr {
        Expr::CellRef {
            sheet,
            col,
            row,
            col_locked,
            row_locked,
        } => {
            let new_col = *col as i64 + d_col;
            let new_row = *row as i64 + d_row;
            let in_bounds = new_col >= 1
                && new_col as u32 <= MAX_TRANSLATE_COL
                && new_row >= 1
                && new_row as u32 <= MAX_ROW;
            if in_bounds {
                Expr::CellRef {
                    sheet: sheet.clone(),
                    col: new_col as u32,
                    row: new_row as u32,
                    col_locked: *col_locked,
                    row_locked: *row_locked,
                }
            } else {
                Expr::ErrorLiteral(crate::types::CellError::BadReference)
            }
        }
        Expr::FunctionCall { name, args } => Expr::FunctionCall {
            name: name.clone(),
            args: args.iter().map(|a| translate(a, d_col, d_row)).collect(),
        },
        Expr::Unary { op, expr } => Expr::Unary {
            op: *op,
            expr: Box::new(translate(expr, d_col, d_row)),
        },
        Expr::Binary { op, left, right } => Expr::Binary {
            op: *op,
            left: Box::new(translate(left, d_col, d_row)),
            right: Box::new(translate(right, d_col, d_row)),
        },
        Expr::Paren(inner) => Expr::Paren(Box::new(translate(inner, d_col, d_row))),
        leaf @ (Expr::Number(_) | Expr::Text(_) | Expr::Bool(_) | Expr::ErrorLiteral(_)) => leaf.clone(),
    }
}

/// Collect every `CellRef` occurring in the tree, qualifying unqualified
/// references with `containing_sheet`.
pub fn dependencies(expr: &Expr, containing_sheet: &str) -> HashSet<CellRef> {
    let mut out = HashSet::new();
    collect_dependencies(expr, containing_sheet, &mut out);
    out
}

fn collect_dependencies(expr: &Expr, containing_sheet: &str, out: &mut HashSet<CellRef>) {
    match expr {
        Expr::CellRef {
            sheet, col, row, ..
        } => {
            let sheet_name = sheet.as_deref().unwrap_or(containing_sheet);
            let addr = CellAddress::new(*col, *row).to_string();
            out.insert(CellRef::new(sheet_name, &addr));
        }
        Expr::FunctionCall { args, .. } => {
            for a in args {
                collect_dependencies(a, containing_sheet, out);
            }
        }
        Expr::Unary { expr, .. } | Expr::Paren(expr) => {
            collect_dependencies(expr, containing_sheet, out)
        }
        Expr::Binary { left, right, .. } => {
            collect_dependencies(left, containing_sheet, out);
            collect_dependencies(right, containing_sheet, out);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::parser::parse;

    #[test]
    fn stringify_round_trips_operators_without_spaces() {
        let e = parse("=1+2*3").unwrap();
        assert_eq!(stringify(&e), "=1+2*3");
    }

    #[test]
    fn stringify_preserves_parens() {
        let e = parse("=(1+2)*3").unwrap();
        assert_eq!(stringify(&e), "=(1+2)*3");
    }

    #[test]
    fn rename_sheet_updates_qualified_refs_only() {
        let e = parse("=Sheet1!A1+B1").unwrap();
        let renamed = rename_sheet(&e, "Sheet1", "Renamed");
        assert_eq!(stringify(&renamed), "=Renamed!A1+B1");
    }

    #[test]
    fn rename_sheet_is_noop_when_not_referenced() {
        let e = parse("=A1+B1").unwrap();
        assert!(!references_sheet(&e, "Sheet1"));
    }

    #[test]
    fn translate_shifts_addresses_and_errors_out_of_bounds() {
        let e = parse("=A1").unwrap();
        let moved = translate(&e, 1, 1);
        assert_eq!(stringify(&moved), "=B2");

        let edge = parse("=A1").unwrap();
        let out_of_bounds = translate(&edge, -1, 0);
        assert_eq!(
            out_of_bounds,
            Expr::ErrorLiteral(crate::types::CellError::BadReference)
        );
    }

    #[test]
    fn translate_errors_past_the_narrower_reference_column_bound() {
        // AB (col 28) shifted by +9972 lands at column 10000, past
        // `MAX_TRANSLATE_COL`, even though that column is still well inside
        // the grid's own addressable width (`MAX_COL`).
        let e = parse("=AB1").unwrap();
        let moved = translate(&e, 9_972, 0);
        assert_eq!(moved, Expr::ErrorLiteral(crate::types::CellError::BadReference));

        let at_bound = parse("=A1").unwrap();
        let moved = translate(&at_bound, (MAX_TRANSLATE_COL - 1) as i64, 0);
        assert_eq!(stringify(&moved), format!("={}1", CellAddress::column_to_label(MAX_TRANSLATE_COL)));
    }

    #[test]
    fn dependency_extraction_qualifies_unqualified_refs() {
        let e = parse("=A1+Sheet2!B2").unwrap();
        let deps = dependencies(&e, "Sheet1");
        assert!(deps.contains(&CellRef::new("Sheet1", "A1")));
        assert!(deps.contains(&CellRef::new("Sheet2", "B2")));
    }
}
