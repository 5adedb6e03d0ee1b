use super::range::{Contents, RangeBundle};
use crate::domain::Cell;
use crate::evaluator::{CellResolver, FunctionLibrary};
use crate::formula::{transform, CellRef};
use crate::types::CellAddress;
use crate::types::CellValue;
use std::collections::HashMap;

/// A sheet: a name plus a sparse map from populated locations to cells.
/// Owns no cross-sheet state — formula construction and recomputation both
/// need a resolver supplied by the owning [`super::workbook::Workbook`].
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    cells: HashMap<(u32, u32), Cell>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Sheet {
        Sheet {
            name: name.into(),
            cells: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, new_name: impl Into<String>) {
        self.name = new_name.into();
    }

    /// `None` or blank/whitespace-only contents deletes the cell; otherwise
    /// parses and evaluates `text` once against `resolver`, replacing
    /// whatever was at `addr`.
    pub fn set_cell_contents(
        &mut self,
        addr: CellAddress,
        contents: Option<&str>,
        sheet_lower: &str,
        resolver: &dyn CellResolver,
        functions: &FunctionLibrary,
    ) {
        match contents.map(str::trim).filter(|s| !s.is_empty()) {
            None => {
                self.cells.remove(&(addr.col, addr.row));
            }
            Some(text) => {
                let reference = CellRef::new(sheet_lower, &addr.to_string());
                let cell = Cell::new(reference, text, resolver, functions);
                self.cells.insert((addr.col, addr.row), cell);
            }
        }
    }

    pub fn get_cell(&self, addr: &CellAddress) -> Option<&Cell> {
        self.cells.get(&(addr.col, addr.row))
    }

    pub fn get_cell_contents(&self, addr: &CellAddress) -> Option<&str> {
        self.get_cell(addr).map(Cell::contents)
    }

    pub fn get_cell_value(&self, addr: &CellAddress) -> CellValue {
        self.get_cell(addr).map(|c| c.value().clone()).unwrap_or(CellValue::Blank)
    }

    pub fn iter_cells(&self) -> impl Iterator<Item = (&(u32, u32), &Cell)> {
        self.cells.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// `(max_col, max_row)` over populated cells, or `(0, 0)` if empty.
    pub fn extent(&self) -> (u32, u32) {
        self.cells
            .keys()
            .fold((0, 0), |(mc, mr), &(c, r)| (mc.max(c), mr.max(r)))
    }

    pub fn get_cell_by_ref(&self, r: &CellRef) -> Option<&Cell> {
        let addr = CellAddress::parse(&r.addr_upper).ok()?;
        self.cells.get(&(addr.col, addr.row))
    }

    pub fn get_cell_mut_by_ref(&mut self, r: &CellRef) -> Option<&mut Cell> {
        let addr = CellAddress::parse(&r.addr_upper).ok()?;
        self.cells.get_mut(&(addr.col, addr.row))
    }

    /// Rewrite every cell's formula/reference for a sheet rename. Called on
    /// every sheet in the workbook, not just the one being renamed — other
    /// sheets' cells may hold qualified references to `old`.
    pub fn rename_cell_refs(&mut self, old: &str, new: &str) {
        for cell in self.cells.values_mut() {
            cell.rename_sheet(old, new);
        }
    }

    fn bbox(start: CellAddress, end: CellAddress) -> (CellAddress, CellAddress) {
        let lo = CellAddress::new(start.col.min(end.col), start.row.min(end.row));
        let hi = CellAddress::new(start.col.max(end.col), start.row.max(end.row));
        (lo, hi)
    }

    /// Snapshot the axis-aligned box between `start` and `end` (corners may
    /// be given in either order). Only populated cells are carried; empty
    /// locations inside the box are simply absent from the bundle.
    pub fn copy_cells(&self, start: CellAddress, end: CellAddress) -> RangeBundle {
        let (lo, hi) = Self::bbox(start, end);
        let mut cells = HashMap::new();
        for row in lo.row..=hi.row {
            for col in lo.col..=hi.col {
                if let Some(cell) = self.cells.get(&(col, row)) {
                    cells.insert(
                        (col - lo.col, row - lo.row),
                        Contents {
                            text: cell.contents().to_string(),
                            tree: cell.tree(),
                        },
                    );
                }
            }
        }
        RangeBundle {
            origin: (lo.col, lo.row),
            cells,
        }
    }

    /// Like [`Self::copy_cells`], but also clears the source range.
    pub fn cut_cells(&mut self, start: CellAddress, end: CellAddress) -> RangeBundle {
        let bundle = self.copy_cells(start, end);
        let (lo, hi) = Self::bbox(start, end);
        for row in lo.row..=hi.row {
            for col in lo.col..=hi.col {
                self.cells.remove(&(col, row));
            }
        }
        bundle
    }

    /// Re-anchor `bundle` at `to`, translating every formula by the delta
    /// between the bundle's origin and `to`. The caller is responsible for
    /// having already checked that every destination cell lands in bounds
    /// (see [`super::workbook::bundle_fits`]) — this never fails partway.
    pub fn paste_cells(
        &mut self,
        to: CellAddress,
        bundle: RangeBundle,
        sheet_lower: &str,
        resolver: &dyn CellResolver,
        functions: &FunctionLibrary,
    ) {
        let d_col = to.col as i64 - bundle.origin.0 as i64;
        let d_row = to.row as i64 - bundle.origin.1 as i64;
        for ((rc, rr), contents) in bundle.cells {
            let target = CellAddress::new(to.col + rc, to.row + rr);
            let new_text = match &contents.tree {
                Some(tree) => transform::stringify(&transform::translate(tree, d_col, d_row)),
                None => contents.text,
            };
            self.set_cell_contents(target, Some(&new_text), sheet_lower, resolver, functions);
        }
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
    fn set_and_delete_cell_contents() {
        let functions = FunctionLibrary::new();
        let mut sheet = Sheet::new("Sheet1");
        let a1 = CellAddress::parse("A1").unwrap();
        sheet.set_cell_contents(a1, Some("42"), "sheet1", &EmptyResolver, &functions);
        assert_eq!(sheet.get_cell_value(&a1), CellValue::Number(dec!(42)));

        sheet.set_cell_contents(a1, Some("  "), "sheet1", &EmptyResolver, &functions);
        assert!(sheet.get_cell(&a1).is_none());
        assert_eq!(sheet.get_cell_value(&a1), CellValue::Blank);
    }

    #[test]
    fn extent_tracks_populated_cells() {
        let functions = FunctionLibrary::new();
        let mut sheet = Sheet::new("Sheet1");
        assert_eq!(sheet.extent(), (0, 0));
        sheet.set_cell_contents(
            CellAddress::parse("C4").unwrap(),
            Some("1"),
            "sheet1",
            &EmptyResolver,
            &functions,
        );
        assert_eq!(sheet.extent(), (3, 4));
    }

    #[test]
    fn copy_cells_translates_relative_refs_on_paste() {
        let functions = FunctionLibrary::new();
        let mut sheet = Sheet::new("Sheet1");
        for (addr, text) in [("A1", "5"), ("B1", "2"), ("C1", "=A1*B1")] {
            sheet.set_cell_contents(
                CellAddress::parse(addr).unwrap(),
                Some(text),
                "sheet1",
                &EmptyResolver,
                &functions,
            );
        }
        let bundle = sheet.copy_cells(CellAddress::parse("A1").unwrap(), CellAddress::parse("C1").unwrap());
        sheet.paste_cells(
            CellAddress::parse("A2").unwrap(),
            bundle,
            "sheet1",
            &EmptyResolver,
            &functions,
        );
        assert_eq!(
            sheet.get_cell_contents(&CellAddress::parse("C2").unwrap()),
            Some("=A2*B2")
        );
    }

    #[test]
    fn cut_cells_clears_the_source() {
        let functions = FunctionLibrary::new();
        let mut sheet = Sheet::new("Sheet1");
        let a1 = CellAddress::parse("A1").unwrap();
        sheet.set_cell_contents(a1, Some("1"), "sheet1", &EmptyResolver, &functions);
        let bundle = sheet.cut_cells(a1, a1);
        assert!(sheet.get_cell(&a1).is_none());
        assert_eq!(bundle.cells.len(), 1);
    }
}
