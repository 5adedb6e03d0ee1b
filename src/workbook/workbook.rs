use super::range::RangeBundle;
use super::sheet::Sheet;
use crate::error::{Result, SpreadsheetError};
use crate::evaluator::FunctionLibrary;
use crate::formula::CellRef;
use crate::types::{CellAddress, CellValue, MAX_COL, MAX_ROW};
use std::collections::HashSet;

/// The key under which a cell's value-change is reported: `(sheet name in
/// its original case, address in canonical upper-case form)`. Distinct from
/// [`CellRef`], which lower-cases the sheet for graph lookups — notifiers
/// want the name as the caller spelled it.
pub type ChangeSet = HashSet<(String, String)>;

pub type Notifier = Box<dyn Fn(&Workbook, &ChangeSet)>;

/// Characters permitted in a sheet name, beyond alphanumerics.
const SHEET_NAME_EXTRA_CHARS: &str = ".?!,:;@#$%^&*()-_ ";

/// Owns every sheet in the document and every registered change notifier.
/// Every method that mutates cell state does so through
/// [`Workbook::run_transaction`] (see `workbook::transaction`), so callers
/// never observe a half-recomputed workbook.
pub struct Workbook {
    pub(super) sheets: Vec<Sheet>,
    functions: FunctionLibrary,
    notifiers: Vec<Notifier>,
    sheet_counter: u32,
}

impl Workbook {
    pub fn new() -> Workbook {
        Workbook {
            sheets: Vec::new(),
            functions: FunctionLibrary::new(),
            notifiers: Vec::new(),
            sheet_counter: 0,
        }
    }

    pub(super) fn sheets(&self) -> impl Iterator<Item = &Sheet> {
        self.sheets.iter()
    }

    pub(super) fn functions(&self) -> &FunctionLibrary {
        &self.functions
    }

    pub(super) fn notifiers(&self) -> &[Notifier] {
        &self.notifiers
    }

    pub(super) fn sheet_by_lower(&self, lower: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name().to_ascii_lowercase() == lower)
    }

    pub(super) fn sheet_by_lower_mut(&mut self, lower: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name().to_ascii_lowercase() == lower)
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        let lower = name.to_ascii_lowercase();
        self.sheets.iter().position(|s| s.name().to_ascii_lowercase() == lower)
    }

    fn sheet_name_taken(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    fn validate_sheet_name(name: &str) -> Result<()> {
        if name.is_empty()
            || name.trim() != name
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || SHEET_NAME_EXTRA_CHARS.contains(c))
        {
            return Err(SpreadsheetError::InvalidSheetName(name.to_string()));
        }
        Ok(())
    }

    fn next_default_name(&mut self) -> String {
        loop {
            self.sheet_counter += 1;
            let candidate = format!("Sheet{}", self.sheet_counter);
            if !self.sheet_name_taken(&candidate) {
                return candidate;
            }
        }
    }

    /// Creates a sheet named `name`, or a fresh `SheetN` if `None`. Returns
    /// the name actually used.
    pub fn new_sheet(&mut self, name: Option<&str>) -> Result<String> {
        let name = match name {
            Some(n) => {
                Self::validate_sheet_name(n)?;
                if self.sheet_name_taken(n) {
                    return Err(SpreadsheetError::DuplicateSheetName(n.to_string()));
                }
                n.to_string()
            }
            None => self.next_default_name(),
        };
        let to_add = name.clone();
        self.run_transaction(None, move |wb, _resolver| {
            wb.sheets.push(Sheet::new(to_add));
            Ok(())
        })?;
        Ok(name)
    }

    pub fn del_sheet(&mut self, name: &str) -> Result<()> {
        let idx = self.index_of(name).ok_or_else(|| SpreadsheetError::SheetNotFound(name.to_string()))?;
        self.run_transaction(None, move |wb, _resolver| {
            wb.sheets.remove(idx);
            Ok(())
        })
    }

    /// Renames `old` to `new`, rewriting every qualified reference to `old`
    /// across *every* sheet, not just the renamed one.
    pub fn rename_sheet(&mut self, old: &str, new: &str) -> Result<()> {
        self.index_of(old).ok_or_else(|| SpreadsheetError::SheetNotFound(old.to_string()))?;
        Self::validate_sheet_name(new)?;
        if !old.eq_ignore_ascii_case(new) && self.sheet_name_taken(new) {
            return Err(SpreadsheetError::DuplicateSheetName(new.to_string()));
        }
        let old = old.to_string();
        let new = new.to_string();
        self.run_transaction(None, move |wb, _resolver| {
            for sheet in &mut wb.sheets {
                if sheet.name().eq_ignore_ascii_case(&old) {
                    sheet.rename(new.clone());
                }
                sheet.rename_cell_refs(&old, &new);
            }
            Ok(())
        })
    }

    pub fn move_sheet(&mut self, name: &str, to_index: usize) -> Result<()> {
        let from = self.index_of(name).ok_or_else(|| SpreadsheetError::SheetNotFound(name.to_string()))?;
        if to_index >= self.sheets.len() {
            return Err(SpreadsheetError::SheetIndexOutOfRange(to_index));
        }
        self.run_transaction(None, move |wb, _resolver| {
            let sheet = wb.sheets.remove(from);
            wb.sheets.insert(to_index, sheet);
            Ok(())
        })
    }

    /// Duplicates `name`'s cells into a new sheet appended at the end of the
    /// list, named `name_1`, `name_2`, ... (first unused suffix).
    pub fn copy_sheet(&mut self, name: &str) -> Result<String> {
        let idx = self.index_of(name).ok_or_else(|| SpreadsheetError::SheetNotFound(name.to_string()))?;
        let mut n = 1;
        let new_name = loop {
            let candidate = format!("{name}_{n}");
            if !self.sheet_name_taken(&candidate) {
                break candidate;
            }
            n += 1;
        };
        let to_add = new_name.clone();
        self.run_transaction(None, move |wb, _resolver| {
            let mut copy = wb.sheets[idx].clone();
            copy.rename(to_add);
            wb.sheets.push(copy);
            Ok(())
        })?;
        Ok(new_name)
    }

    pub fn set_cell_contents(&mut self, sheet: &str, addr: &str, contents: Option<&str>) -> Result<()> {
        let idx = self.index_of(sheet).ok_or_else(|| SpreadsheetError::SheetNotFound(sheet.to_string()))?;
        let addr = CellAddress::parse(addr)?;
        let sheet_lower = self.sheets[idx].name().to_ascii_lowercase();
        let dirty = HashSet::from([CellRef::new(&sheet_lower, &addr.to_string())]);
        let contents = contents.map(str::to_string);
        self.run_transaction(Some(dirty), move |wb, resolver| {
            wb.sheets[idx].set_cell_contents(addr, contents.as_deref(), &sheet_lower, resolver, &wb.functions);
            Ok(())
        })
    }

    pub fn get_cell_contents(&self, sheet: &str, addr: &str) -> Result<Option<String>> {
        let idx = self.index_of(sheet).ok_or_else(|| SpreadsheetError::SheetNotFound(sheet.to_string()))?;
        let addr = CellAddress::parse(addr)?;
        Ok(self.sheets[idx].get_cell_contents(&addr).map(str::to_string))
    }

    pub fn get_cell_value(&self, sheet: &str, addr: &str) -> Result<CellValue> {
        let idx = self.index_of(sheet).ok_or_else(|| SpreadsheetError::SheetNotFound(sheet.to_string()))?;
        let addr = CellAddress::parse(addr)?;
        Ok(self.sheets[idx].get_cell_value(&addr))
    }

    pub fn get_sheet_extent(&self, sheet: &str) -> Result<(u32, u32)> {
        let idx = self.index_of(sheet).ok_or_else(|| SpreadsheetError::SheetNotFound(sheet.to_string()))?;
        Ok(self.sheets[idx].extent())
    }

    pub fn list_sheets(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn notify_cells_changed(&mut self, callback: Notifier) {
        self.notifiers.push(callback);
    }

    pub fn move_cells(&mut self, sheet: &str, start: &str, end: &str, to: &str) -> Result<()> {
        self.move_or_copy_cells(sheet, start, end, to, true)
    }

    pub fn copy_cells(&mut self, sheet: &str, start: &str, end: &str, to: &str) -> Result<()> {
        self.move_or_copy_cells(sheet, start, end, to, false)
    }

    fn move_or_copy_cells(&mut self, sheet: &str, start: &str, end: &str, to: &str, cut: bool) -> Result<()> {
        let idx = self.index_of(sheet).ok_or_else(|| SpreadsheetError::SheetNotFound(sheet.to_string()))?;
        let start = CellAddress::parse(start)?;
        let end = CellAddress::parse(end)?;
        let to = CellAddress::parse(to)?;

        let bundle = self.sheets[idx].copy_cells(start, end);
        if !bundle_fits(&bundle, to) {
            return Err(SpreadsheetError::OutOfBounds);
        }

        let sheet_lower = self.sheets[idx].name().to_ascii_lowercase();
        let mut dirty = HashSet::new();
        if cut {
            let (lo, hi) = (
                CellAddress::new(start.col.min(end.col), start.row.min(end.row)),
                CellAddress::new(start.col.max(end.col), start.row.max(end.row)),
            );
            for row in lo.row..=hi.row {
                for col in lo.col..=hi.col {
                    dirty.insert(CellRef::new(&sheet_lower, &CellAddress::new(col, row).to_string()));
                }
            }
        }
        for (rc, rr) in bundle.cells.keys() {
            dirty.insert(CellRef::new(&sheet_lower, &CellAddress::new(to.col + rc, to.row + rr).to_string()));
        }

        self.run_transaction(Some(dirty), move |wb, resolver| {
            if cut {
                wb.sheets[idx].cut_cells(start, end);
            }
            wb.sheets[idx].paste_cells(to, bundle, &sheet_lower, resolver, &wb.functions);
            Ok(())
        })
    }

    pub fn load_workbook(&mut self, source: impl std::io::Read) -> Result<()> {
        super::json::load(self, source)
    }

    pub fn save_workbook(&self, dest: impl std::io::Write) -> Result<()> {
        super::json::save(self, dest)
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether every cell in `bundle`, re-anchored at `to`, lands within
/// `[1, MAX_COL] x [1, MAX_ROW]`. Checked before any mutation so an
/// out-of-bounds paste leaves the workbook untouched.
fn bundle_fits(bundle: &RangeBundle, to: CellAddress) -> bool {
    bundle.cells.keys().all(|&(rc, rr)| {
        let col = to.col as i64 + rc as i64;
        let row = to.row as i64 + rr as i64;
        col >= 1 && col as u32 <= MAX_COL && row >= 1 && row as u32 <= MAX_ROW
    })
}
