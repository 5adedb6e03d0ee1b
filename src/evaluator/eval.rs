use super::coerce;
use super::functions::{FunctionLibrary, Thunk};
use crate::formula::{BinaryOp, CellRef, Expr, UnaryOp};
use crate::types::{CellAddress, CellError, CellValue};

/// What a formula's cell reference resolves against. Implemented by
/// [`crate::workbook::Workbook`]; kept as a trait so the evaluator doesn't
/// need to know about sheets, just "does this (sheet, cell) exist".
pub trait CellResolver {
    fn resolve(&self, sheet_lower: &str, addr_upper: &str) -> Resolution;
}

pub enum Resolution {
    Value(CellValue),
    MissingSheet,
}

/// Evaluate a formula tree rooted at `current` (the cell the formula
/// belongs to, used for the defensive self-reference check and to qualify
/// unqualified cell references).
pub fn evaluate(expr: &Expr, current: &CellRef, resolver: &dyn CellResolver, functions: &FunctionLibrary) -> CellValue {
    match expr {
        Expr::Number(n) => CellValue::number(*n),
        Expr::Text(s) => CellValue::Text(s.clone()),
        Expr::Bool(b) => CellValue::Boolean(*b),
        Expr::ErrorLiteral(e) => CellValue::Error(*e),

        Expr::CellRef { sheet, col, row, .. } => {
            let target = referenced_cell(sheet.as_deref(), *col, *row, current);
            resolve_cell(&target, current, resolver)
        }

        Expr::Paren(inner) => evaluate(inner, current, resolver, functions),

        Expr::Unary { op, expr } => {
            let v = evaluate(expr, current, resolver, functions);
            match coerce::to_arithmetic(&v) {
                Ok(n) => CellValue::number(match op {
                    UnaryOp::Plus => n,
                    UnaryOp::Negate => -n,
                }),
                Err(e) => CellValue::Error(e),
            }
        }

        Expr::Binary { op, left, right } => evaluate_binary(*op, left, right, current, resolver, functions),

        Expr::FunctionCall { name, args } => {
            if name.eq_ignore_ascii_case("INDIRECT") {
                return evaluate_indirect(args, current, resolver, functions);
            }
            let thunks: Vec<Thunk> = args
                .iter()
                .map(|a| -> Thunk { Box::new(move || evaluate(a, current, resolver, functions)) })
                .collect();
            functions.call(name, &thunks)
        }
    }
}

fn referenced_cell(sheet: Option<&str>, col: u32, row: u32, current: &CellRef) -> CellRef {
    let sheet_name = sheet.unwrap_or(&current.sheet_lower);
    CellRef::new(sheet_name, &CellAddress::new(col, row).to_string())
}

fn resolve_cell(target: &CellRef, current: &CellRef, resolver: &dyn CellResolver) -> CellValue {
    if target == current {
        return CellValue::Error(CellError::CircularReference);
    }
    match resolver.resolve(&target.sheet_lower, &target.addr_upper) {
        Resolution::Value(v) => v,
        Resolution::MissingSheet => CellValue::Error(CellError::BadReference),
    }
}

fn evaluate_binary(
    op: BinaryOp,
    left: &Expr,
    right: &Expr,
    current: &CellRef,
    resolver: &dyn CellResolver,
    functions: &FunctionLibrary,
) -> CellValue {
    let l = evaluate(left, current, resolver, functions);
    // Errors propagate left-to-right: if the left operand is already an
    // error, the right operand is still evaluated in case of a real engine
    // implementation's side effects, but the left error always wins.
    let r = evaluate(right, current, resolver, functions);

    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
            let a = match coerce::to_arithmetic(&l) {
                Ok(n) => n,
                Err(e) => return CellValue::Error(e),
            };
            let b = match coerce::to_arithmetic(&r) {
                Ok(n) => n,
                Err(e) => return CellValue::Error(e),
            };
            match op {
                BinaryOp::Add => CellValue::number(a + b),
                BinaryOp::Sub => CellValue::number(a - b),
                BinaryOp::Mul => CellValue::number(a * b),
                BinaryOp::Div => {
                    if b.is_zero() {
                        CellValue::Error(CellError::DivideByZero)
                    } else {
                        CellValue::number(a / b)
                    }
                }
                _ => unreachable!(),
            }
        }
        BinaryOp::Concat => {
            let a = match coerce::to_concat_string(&l) {
                Ok(s) => s,
                Err(e) => return CellValue::Error(e),
            };
            let b = match coerce::to_concat_string(&r) {
                Ok(s) => s,
                Err(e) => return CellValue::Error(e),
            };
            CellValue::Text(a + &b)
        }
        BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            match coerce::compare(&l, &r) {
                Ok(ord) => CellValue::Boolean(match op {
                    BinaryOp::Eq => ord.is_eq(),
                    BinaryOp::Ne => ord.is_ne(),
                    BinaryOp::Lt => ord.is_lt(),
                    BinaryOp::Le => ord.is_le(),
                    BinaryOp::Gt => ord.is_gt(),
                    BinaryOp::Ge => ord.is_ge(),
                    _ => unreachable!(),
                }),
                Err(e) => CellValue::Error(e),
            }
        }
    }
}

fn evaluate_indirect(
    args: &[Expr],
    current: &CellRef,
    resolver: &dyn CellResolver,
    functions: &FunctionLibrary,
) -> CellValue {
    if args.len() != 1 {
        return CellValue::Error(CellError::TypeError);
    }
    let v = evaluate(&args[0], current, resolver, functions);
    let text = match coerce::to_concat_string(&v) {
        Ok(s) => s,
        Err(e) => return CellValue::Error(e),
    };

    let (sheet, addr) = match text.split_once('!') {
        Some((sheet, addr)) => (Some(sheet.trim_matches('\'')), addr),
        None => (None, text.as_str()),
    };

    match CellAddress::parse(addr) {
        Ok(a) => {
            let target = referenced_cell(sheet, a.col, a.row, current);
            resolve_cell(&target, current, resolver)
        }
        Err(_) => CellValue::Error(CellError::BadReference),
    }
}
