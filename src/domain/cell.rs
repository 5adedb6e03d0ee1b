use crate::evaluator::{self, CellResolver, FunctionLibrary};
use crate::formula::{parser, transform, CellRef, Expr};
use crate::types::{CellError, CellValue};
use std::collections::HashSet;
use std::sync::Arc;

/// A single populated cell: its stored text, the parsed formula tree (if
/// any), and its last-computed value. Trees are held behind `Arc` so a
/// rename or translate that doesn't touch a given cell never has to clone
/// its tree — only cells whose formula text actually changes get a new one.
#[derive(Debug, Clone)]
pub struct Cell {
    reference: CellRef,
    contents: String,
    tree: Option<Arc<Expr>>,
    value: CellValue,
}

impl Cell {
    /// Parse `contents`, compute its dependency set implicitly (via
    /// [`Self::dependencies`]), and evaluate once against `resolver`. A
    /// formula cell whose contents is part of a cycle will hold a stale
    /// value here; the owning transaction corrects it afterwards via
    /// [`Self::mark_cyclical`].
    pub fn new(reference: CellRef, contents: &str, resolver: &dyn CellResolver, functions: &FunctionLibrary) -> Cell {
        let trimmed = contents.trim().to_string();
        if trimmed.starts_with('=') {
            let tree = parser::parse(&trimmed).map(Arc::new);
            let value = match &tree {
                Some(t) => evaluator::evaluate(t, &reference, resolver, functions),
                None => CellValue::Error(CellError::ParseError),
            };
            Cell {
                reference,
                contents: trimmed,
                tree,
                value,
            }
        } else {
            let value = CellValue::parse_literal(&trimmed);
            Cell {
                reference,
                contents: trimmed,
                tree: None,
                value,
            }
        }
    }

    pub fn reference(&self) -> &CellRef {
        &self.reference
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn tree(&self) -> Option<Arc<Expr>> {
        self.tree.clone()
    }

    pub fn value(&self) -> &CellValue {
        &self.value
    }

    /// Every cell syntactically referenced by this cell's formula, with
    /// unqualified references qualified against this cell's own sheet.
    /// Empty for a non-formula cell.
    pub fn dependencies(&self) -> HashSet<CellRef> {
        match &self.tree {
            Some(tree) => transform::dependencies(tree, &self.reference.sheet_lower),
            None => HashSet::new(),
        }
    }

    /// Rewrite this cell in place for a sheet rename: if the cell's own
    /// sheet matches `old`, its reference moves; either way, any qualified
    /// reference to `old` inside its formula becomes `new`.
    pub fn rename_sheet(&mut self, old: &str, new: &str) {
        if self.reference.sheet_lower == old.to_ascii_lowercase() {
            self.reference.sheet_lower = new.to_ascii_lowercase();
        }
        if let Some(tree) = &self.tree {
            if transform::references_sheet(tree, old) {
                let renamed = transform::rename_sheet(tree, old, new);
                self.contents = transform::stringify(&renamed);
                self.tree = Some(Arc::new(renamed));
            }
        }
    }

    pub fn mark_cyclical(&mut self) {
        self.value = CellValue::Error(CellError::CircularReference);
    }

    pub fn recompute_value(&mut self, resolver: &dyn CellResolver, functions: &FunctionLibrary) {
        self.value = match &self.tree {
            Some(tree) => evaluator::evaluate(tree, &self.reference, resolver, functions),
            None => self.value.clone(),
        };
    }

    /// Store an already-computed value directly, bypassing re-evaluation.
    /// Used by the transaction engine's topological recompute, which
    /// evaluates against the live workbook rather than a cell-local resolver.
    pub fn set_value(&mut self, value: CellValue) {
        self.value = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::Resolution;
    use rust_decimal_macros::dec;

    struct EmptyResolver;
    impl CellResolver for EmptyResolver {
        fn resolve(&self, _sheet_lower: &str, _addr_upper: &str) -> Resolution {
            Resolution::Value(CellValue::Blank)
        }
    }

    #[test]
    fn literal_cell_has_no_tree() {
        let functions = FunctionLibrary::new();
        let cell = Cell::new(CellRef::new("sheet1", "A1"), "42", &EmptyResolver, &functions);
        assert!(cell.tree().is_none());
        assert_eq!(cell.value(), &CellValue::Number(dec!(42)));
        assert!(cell.dependencies().is_empty());
    }

    #[test]
    fn formula_cell_extracts_dependencies() {
        let functions = FunctionLibrary::new();
        let cell = Cell::new(CellRef::new("sheet1", "A1"), "=B1+C1", &EmptyResolver, &functions);
        let deps = cell.dependencies();
        assert!(deps.contains(&CellRef::new("sheet1", "B1")));
        assert!(deps.contains(&CellRef::new("sheet1", "C1")));
    }

    #[test]
    fn unparseable_formula_is_parse_error() {
        let functions = FunctionLibrary::new();
        let cell = Cell::new(CellRef::new("sheet1", "A1"), "=1+", &EmptyResolver, &functions);
        assert_eq!(cell.value(), &CellValue::Error(CellError::ParseError));
    }

    #[test]
    fn mark_cyclical_overrides_value() {
        let functions = FunctionLibrary::new();
        let mut cell = Cell::new(CellRef::new("sheet1", "A1"), "=1+1", &EmptyResolver, &functions);
        cell.mark_cyclical();
        assert_eq!(cell.value(), &CellValue::Error(CellError::CircularReference));
    }

    #[test]
    fn rename_sheet_rewrites_formula_and_self_reference() {
        let functions = FunctionLibrary::new();
        let mut cell = Cell::new(CellRef::new("sheet1", "A1"), "=Sheet1!B1", &EmptyResolver, &functions);
        cell.rename_sheet("Sheet1", "Renamed");
        assert_eq!(cell.reference().sheet_lower, "renamed");
        assert_eq!(cell.contents(), "=Renamed!B1");
    }
}
