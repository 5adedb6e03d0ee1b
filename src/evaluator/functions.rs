use super::coerce;
use crate::types::{CellError, CellValue};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// A zero-argument closure that evaluates one argument subexpression in the
/// enclosing environment. Functions receive a slice of these rather than a
/// slice of already-computed `CellValue`s so that `IF`/`IFERROR`/`AND`/`OR`
/// can skip evaluating an argument they don't need — short-circuiting is
/// realised by which thunks get called, not by any special-casing in the
/// evaluator itself.
pub type Thunk<'a> = Box<dyn Fn() -> CellValue + 'a>;

type FunctionImpl = Box<dyn Fn(&[Thunk]) -> CellValue + Sync + Send>;

pub struct FunctionLibrary {
    functions: HashMap<&'static str, FunctionImpl>,
}

impl FunctionLibrary {
    pub fn new() -> Self {
        let mut lib = FunctionLibrary {
            functions: HashMap::new(),
        };
        lib.register_logical();
        lib.register_lookup();
        lib.register_aggregate();
        lib.register_misc();
        lib
    }

    pub fn call(&self, name: &str, args: &[Thunk]) -> CellValue {
        match self.functions.get(name.to_uppercase().as_str()) {
            Some(f) => f(args),
            None => CellValue::Error(CellError::BadName),
        }
    }

    fn register(&mut self, name: &'static str, f: FunctionImpl) {
        self.functions.insert(name, f);
    }

    fn register_logical(&mut self) {
        self.register(
            "AND",
            Box::new(|args| {
                if args.is_empty() {
                    return CellValue::Error(CellError::TypeError);
                }
                for t in args {
                    match coerce::to_boolean(&t()) {
                        Ok(false) => return CellValue::Boolean(false),
                        Ok(true) => continue,
                        Err(e) => return CellValue::Error(e),
                    }
                }
                CellValue::Boolean(true)
            }),
        );

        self.register(
            "OR",
            Box::new(|args| {
                if args.is_empty() {
                    return CellValue::Error(CellError::TypeError);
                }
                for t in args {
                    match coerce::to_boolean(&t()) {
                        Ok(true) => return CellValue::Boolean(true),
                        Ok(false) => continue,
                        Err(e) => return CellValue::Error(e),
                    }
                }
                CellValue::Boolean(false)
            }),
        );

        self.register(
            "NOT",
            Box::new(|args| {
                if args.len() != 1 {
                    return CellValue::Error(CellError::TypeError);
                }
                match coerce::to_boolean(&args[0]()) {
                    Ok(b) => CellValue::Boolean(!b),
                    Err(e) => CellValue::Error(e),
                }
            }),
        );

        self.register(
            "XOR",
            Box::new(|args| {
                if args.is_empty() {
                    return CellValue::Error(CellError::TypeError);
                }
                let mut acc = false;
                for t in args {
                    match coerce::to_boolean(&t()) {
                        Ok(b) => acc ^= b,
                        Err(e) => return CellValue::Error(e),
                    }
                }
                CellValue::Boolean(acc)
            }),
        );

        self.register(
            "EXACT",
            Box::new(|args| {
                if args.len() != 2 {
                    return CellValue::Error(CellError::TypeError);
                }
                let a = match coerce::to_concat_string(&args[0]()) {
                    Ok(s) => s,
                    Err(e) => return CellValue::Error(e),
                };
                let b = match coerce::to_concat_string(&args[1]()) {
                    Ok(s) => s,
                    Err(e) => return CellValue::Error(e),
                };
                CellValue::Boolean(a == b)
            }),
        );

        self.register(
            "IF",
            Box::new(|args| {
                if args.len() != 2 && args.len() != 3 {
                    return CellValue::Error(CellError::TypeError);
                }
                match coerce::to_boolean(&args[0]()) {
                    Ok(true) => args[1](),
                    Ok(false) => {
                        if args.len() == 3 {
                            args[2]()
                        } else {
                            CellValue::Boolean(false)
                        }
                    }
                    Err(e) => CellValue::Error(e),
                }
            }),
        );

        self.register(
            "IFERROR",
            Box::new(|args| {
                if args.is_empty() || args.len() > 2 {
                    return CellValue::Error(CellError::TypeError);
                }
                let primary = args[0]();
                if primary.is_error() {
                    if args.len() == 2 {
                        args[1]()
                    } else {
                        CellValue::Text(String::new())
                    }
                } else {
                    primary
                }
            }),
        );
    }

    fn register_lookup(&mut self) {
        self.register(
            "CHOOSE",
            Box::new(|args| {
                if args.len() < 2 {
                    return CellValue::Error(CellError::TypeError);
                }
                let idx = match coerce::to_arithmetic(&args[0]()) {
                    Ok(d) => d,
                    Err(e) => return CellValue::Error(e),
                };
                if idx.fract() != Decimal::ZERO {
                    return CellValue::Error(CellError::TypeError);
                }
                let idx: i64 = match idx.try_into() {
                    Ok(i) => i,
                    Err(_) => return CellValue::Error(CellError::TypeError),
                };
                let choices = &args[1..];
                if idx < 1 || idx as usize > choices.len() {
                    return CellValue::Error(CellError::TypeError);
                }
                choices[(idx - 1) as usize]()
            }),
        );

        self.register(
            "INDIRECT",
            Box::new(|args| {
                if args.len() != 1 {
                    return CellValue::Error(CellError::TypeError);
                }
                match coerce::to_concat_string(&args[0]()) {
                    Ok(_) => {
                        // Actual resolution happens in `eval::evaluate`, which
                        // intercepts `INDIRECT` before dispatching here so it
                        // has access to the resolver. Reaching this arm means
                        // the call was made outside that path.
                        CellValue::Error(CellError::BadReference)
                    }
                    Err(e) => CellValue::Error(e),
                }
            }),
        );
    }

    fn register_aggregate(&mut self) {
        self.register("SUM", Box::new(|args| reduce_numeric(args, Decimal::ZERO, |a, b| a + b)));
        self.register(
            "MIN",
            Box::new(|args| reduce_numeric_nonempty(args, |a, b| if b < a { b } else { a })),
        );
        self.register(
            "MAX",
            Box::new(|args| reduce_numeric_nonempty(args, |a, b| if b > a { b } else { a })),
        );
        self.register(
            "AVERAGE",
            Box::new(|args| {
                if args.is_empty() {
                    return CellValue::Error(CellError::TypeError);
                }
                match reduce_numeric(args, Decimal::ZERO, |a, b| a + b) {
                    CellValue::Number(sum) => {
                        CellValue::number(sum / Decimal::from(args.len() as u64))
                    }
                    other => other,
                }
            }),
        );
    }

    fn register_misc(&mut self) {
        self.register(
            "ISBLANK",
            Box::new(|args| {
                if args.len() != 1 {
                    return CellValue::Error(CellError::TypeError);
                }
                CellValue::Boolean(args[0]().is_blank())
            }),
        );
        self.register(
            "ISERROR",
            Box::new(|args| {
                if args.len() != 1 {
                    return CellValue::Error(CellError::TypeError);
                }
                CellValue::Boolean(args[0]().is_error())
            }),
        );
        self.register(
            "VERSION",
            Box::new(|args| {
                if !args.is_empty() {
                    return CellValue::Error(CellError::TypeError);
                }
                CellValue::Text(env!("CARGO_PKG_VERSION").to_string())
            }),
        );
    }
}

impl Default for FunctionLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluate every thunk, coerce each to decimal, then left-to-right reduce
/// — the first error encountered short-circuits the rest.
fn reduce_numeric(args: &[Thunk], init: Decimal, f: impl Fn(Decimal, Decimal) -> Decimal) -> CellValue {
    let mut acc = init;
    for t in args {
        match coerce::to_arithmetic(&t()) {
            Ok(n) => acc = f(acc, n),
            Err(e) => return CellValue::Error(e),
        }
    }
    CellValue::number(acc)
}

fn reduce_numeric_nonempty(args: &[Thunk], f: impl Fn(Decimal, Decimal) -> Decimal) -> CellValue {
    if args.is_empty() {
        return CellValue::Error(CellError::TypeError);
    }
    let mut values = Vec::with_capacity(args.len());
    for t in args {
        match coerce::to_arithmetic(&t()) {
            Ok(n) => values.push(n),
            Err(e) => return CellValue::Error(e),
        }
    }
    let mut acc = values[0];
    for &n in &values[1..] {
        acc = f(acc, n);
    }
    CellValue::number(acc)
}
