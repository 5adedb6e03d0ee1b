use super::ast::{BinaryOp, Expr, UnaryOp};
use super::lexer::{self, Extra};
use crate::types::CellAddress;
use chumsky::prelude::*;

/// Parse formula text, including the leading `=`. Returns `None` on any
/// parse failure — the caller stores an absent tree, which evaluates to
/// `ParseError`.
pub fn parse(contents: &str) -> Option<Expr> {
    let body = contents.strip_prefix('=')?;
    match expr_parser().then_ignore(end()).parse(body).into_result() {
        Ok(expr) => Some(expr),
        Err(errs) => {
            for e in errs {
                tracing::trace!(error = %e, "formula failed to parse");
            }
            None
        }
    }
}

fn expr_parser<'a>() -> impl Parser<'a, &'a str, Expr, Extra<'a>> {
    recursive(|expr| {
        let number = lexer::number().map(Expr::Number).padded();
        let string = lexer::string_literal().map(Expr::Text).padded();
        let error_literal = lexer::error_literal().map(Expr::ErrorLiteral).padded();

        let boolean = lexer::ident()
            .try_map(|s: &str, span| match s.to_ascii_uppercase().as_str() {
                "TRUE" => Ok(true),
                "FALSE" => Ok(false),
                _ => Err(Rich::custom(span, "not a boolean literal")),
            })
            .map(Expr::Bool)
            .padded();

        let cell_ref = lexer::sheet_name()
            .then_ignore(just('!'))
            .or_not()
            .then(lexer::addr_parts())
            .try_map(|(sheet, (col_label, col_locked, row, row_locked)), span| {
                let col = CellAddress::label_to_column(&col_label);
                if !lexer::column_in_bounds(col) || !lexer::row_in_bounds(row) {
                    return Err(Rich::custom(span, "cell reference out of bounds"));
                }
                Ok(Expr::CellRef {
                    sheet,
                    col,
                    row,
                    col_locked,
                    row_locked,
                })
            })
            .padded();

        let func_call = lexer::ident()
            .map(|s: &str| s.to_uppercase())
            .then_ignore(just('(').padded())
            .then(
                expr.clone()
                    .separated_by(just(',').padded())
                    .collect::<Vec<_>>(),
            )
            .then_ignore(just(')'))
            .map(|(name, args)| Expr::FunctionCall { name, args })
            .padded();

        let paren = expr
            .clone()
            .delimited_by(just('(').padded(), just(')'))
            .map(|e| Expr::Paren(Box::new(e)))
            .padded();

        let atom = choice((
            error_literal,
            number,
            string,
            func_call,
            cell_ref,
            boolean,
            paren,
        ));

        let unary = choice((
            just('+').to(UnaryOp::Plus),
            just('-').to(UnaryOp::Negate),
        ))
        .padded()
        .or_not()
        .then(atom)
        .map(|(op, a)| match op {
            Some(op) => Expr::Unary {
                op,
                expr: Box::new(a),
            },
            None => a,
        });

        let mul_op = choice((just('*').to(BinaryOp::Mul), just('/').to(BinaryOp::Div))).padded();
        let mul_expr = unary.clone().foldl(mul_op.then(unary).repeated(), |left, (op, right)| {
            Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            }
        });

        let add_op = choice((just('+').to(BinaryOp::Add), just('-').to(BinaryOp::Sub))).padded();
        let add_expr = mul_expr.clone().foldl(
            add_op.then(mul_expr).repeated(),
            |left, (op, right)| Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
        );

        let concat_op = just('&').to(BinaryOp::Concat).padded();
        let or_expr = add_expr.clone().foldl(
            concat_op.then(add_expr).repeated(),
            |left, (op, right)| Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
        );

        let compare_op = choice((
            just("==").to(BinaryOp::Eq),
            just("<>").to(BinaryOp::Ne),
            just("!=").to(BinaryOp::Ne),
            just(">=").to(BinaryOp::Ge),
            just("<=").to(BinaryOp::Le),
            just('>').to(BinaryOp::Gt),
            just('<').to(BinaryOp::Lt),
            just('=').to(BinaryOp::Eq),
        ))
        .padded();

        or_expr.clone().then(compare_op.then(or_expr).or_not()).map(|(left, rest)| match rest {
            Some((op, right)) => Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            None => left,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CellError;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_simple_arithmetic() {
        let e = parse("=1+2*3").unwrap();
        assert_eq!(
            e,
            Expr::Binary {
                op: BinaryOp::Add,
                left: Box::new(Expr::Number(dec!(1))),
                right: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    left: Box::new(Expr::Number(dec!(2))),
                    right: Box::new(Expr::Number(dec!(3))),
                }),
            }
        );
    }

    #[test]
    fn parses_parenthesised_precedence() {
        let e = parse("=(1+2)*3").unwrap();
        assert_eq!(
            e,
            Expr::Binary {
                op: BinaryOp::Mul,
                left: Box::new(Expr::Paren(Box::new(Expr::Binary {
                    op: BinaryOp::Add,
                    left: Box::new(Expr::Number(dec!(1))),
                    right: Box::new(Expr::Number(dec!(2))),
                }))),
                right: Box::new(Expr::Number(dec!(3))),
            }
        );
    }

    #[test]
    fn parses_qualified_cell_ref_with_locks() {
        let e = parse("=Sheet2!$A1").unwrap();
        assert_eq!(
            e,
            Expr::CellRef {
                sheet: Some("Sheet2".to_string()),
                col: 1,
                row: 1,
                col_locked: true,
                row_locked: false,
            }
        );
    }

    #[test]
    fn parses_function_call_with_nested_args() {
        let e = parse("=SUM(A1,B1,1+2)").unwrap();
        match e {
            Expr::FunctionCall { name, args } => {
                assert_eq!(name, "SUM");
                assert_eq!(args.len(), 3);
            }
            _ => panic!("expected FunctionCall"),
        }
    }

    #[test]
    fn parses_error_literal_and_string() {
        assert_eq!(
            parse("=#DIV/0!"),
            Some(Expr::ErrorLiteral(CellError::DivideByZero))
        );
        assert_eq!(parse(r#"="hi there""#), Some(Expr::Text("hi there".to_string())));
    }

    #[test]
    fn rejects_malformed_formula() {
        assert_eq!(parse("=1+"), None);
        assert_eq!(parse("=(1+2"), None);
    }
}
