use super::Workbook;
use crate::types::{CellError, CellValue};
use rust_decimal_macros::dec;
use std::cell::RefCell;
use std::rc::Rc;

fn value(wb: &Workbook, sheet: &str, addr: &str) -> CellValue {
    wb.get_cell_value(sheet, addr).unwrap()
}

#[test]
fn diamond_dependency_recomputes_in_order() {
    let mut wb = Workbook::new();
    wb.new_sheet(Some("Sheet1")).unwrap();
    wb.set_cell_contents("Sheet1", "C1", Some("5")).unwrap();
    wb.set_cell_contents("Sheet1", "B1", Some("=C1+5")).unwrap();
    wb.set_cell_contents("Sheet1", "D1", Some("=C1")).unwrap();
    wb.set_cell_contents("Sheet1", "A1", Some("=B1+D1")).unwrap();

    assert_eq!(value(&wb, "Sheet1", "A1"), CellValue::Number(dec!(15)));
    assert_eq!(value(&wb, "Sheet1", "B1"), CellValue::Number(dec!(10)));
    assert_eq!(value(&wb, "Sheet1", "D1"), CellValue::Number(dec!(5)));

    wb.set_cell_contents("Sheet1", "C1", Some("10")).unwrap();
    assert_eq!(value(&wb, "Sheet1", "A1"), CellValue::Number(dec!(25)));
    assert_eq!(value(&wb, "Sheet1", "B1"), CellValue::Number(dec!(15)));
    assert_eq!(value(&wb, "Sheet1", "D1"), CellValue::Number(dec!(10)));
}

#[test]
fn cycle_marks_members_and_downstream_dependents_circular() {
    let mut wb = Workbook::new();
    wb.new_sheet(Some("Sheet1")).unwrap();
    wb.set_cell_contents("Sheet1", "A1", Some("=B1")).unwrap();
    wb.set_cell_contents("Sheet1", "B1", Some("=A1")).unwrap();
    wb.set_cell_contents("Sheet1", "D1", Some("=E1")).unwrap();
    wb.set_cell_contents("Sheet1", "C1", Some("=A1+D1")).unwrap();

    assert_eq!(value(&wb, "Sheet1", "A1"), CellValue::Error(CellError::CircularReference));
    assert_eq!(value(&wb, "Sheet1", "B1"), CellValue::Error(CellError::CircularReference));
    assert_eq!(value(&wb, "Sheet1", "C1"), CellValue::Error(CellError::CircularReference));

    wb.set_cell_contents("Sheet1", "E1", Some("4")).unwrap();
    assert_eq!(value(&wb, "Sheet1", "D1"), CellValue::Number(dec!(4)));
    assert_eq!(value(&wb, "Sheet1", "A1"), CellValue::Error(CellError::CircularReference));
    assert_eq!(value(&wb, "Sheet1", "B1"), CellValue::Error(CellError::CircularReference));
    assert_eq!(value(&wb, "Sheet1", "C1"), CellValue::Error(CellError::CircularReference));
}

#[test]
fn rename_sheet_propagates_to_quoted_qualified_references() {
    let mut wb = Workbook::new();
    wb.new_sheet(Some("Sheet1")).unwrap();
    wb.new_sheet(Some("Sheet2")).unwrap();
    wb.set_cell_contents("Sheet1", "A1", Some("Foo")).unwrap();
    wb.set_cell_contents("Sheet2", "B2", Some("='Sheet 3'!A1")).unwrap();

    assert_eq!(value(&wb, "Sheet2", "B2"), CellValue::Error(CellError::BadReference));

    wb.rename_sheet("Sheet1", "Sheet 3").unwrap();

    assert_eq!(value(&wb, "Sheet2", "B2"), CellValue::Text("Foo".to_string()));
    assert_eq!(
        wb.get_cell_contents("Sheet2", "B2").unwrap().as_deref(),
        Some("='Sheet 3'!A1")
    );
}

#[test]
fn copy_cells_translates_relative_references() {
    let mut wb = Workbook::new();
    wb.new_sheet(Some("Sheet1")).unwrap();
    wb.set_cell_contents("Sheet1", "A1", Some("5")).unwrap();
    wb.set_cell_contents("Sheet1", "B1", Some("2")).unwrap();
    wb.set_cell_contents("Sheet1", "C1", Some("=A1*B1")).unwrap();

    wb.copy_cells("Sheet1", "A1", "C1", "A2").unwrap();
    wb.set_cell_contents("Sheet1", "A2", Some("2")).unwrap();

    assert_eq!(value(&wb, "Sheet1", "C2"), CellValue::Number(dec!(4)));
}

#[test]
fn translate_out_of_bounds_becomes_ref_error() {
    let mut wb = Workbook::new();
    wb.new_sheet(Some("Sheet1")).unwrap();
    wb.set_cell_contents("Sheet1", "B1", Some("=A2")).unwrap();

    // Pasting one column to the left of B shifts every reference by -1; `A2`
    // inside the formula lands at column 0, outside the grid.
    wb.copy_cells("Sheet1", "B1", "B1", "A1").unwrap();

    assert_eq!(wb.get_cell_contents("Sheet1", "A1").unwrap().as_deref(), Some("=#REF!"));
    assert_eq!(value(&wb, "Sheet1", "A1"), CellValue::Error(CellError::BadReference));
}

#[test]
fn notification_coalescing_matches_scenario_six() {
    let mut wb = Workbook::new();
    wb.new_sheet(Some("Sheet1")).unwrap();
    let seen: Rc<RefCell<Vec<Vec<(String, String)>>>> = Rc::new(RefCell::new(Vec::new()));
    let recorder = seen.clone();
    wb.notify_cells_changed(Box::new(move |_wb, changed| {
        let mut sorted: Vec<(String, String)> = changed.iter().cloned().collect();
        sorted.sort();
        recorder.borrow_mut().push(sorted);
    }));

    wb.set_cell_contents("Sheet1", "A1", Some("1")).unwrap();
    wb.set_cell_contents("Sheet1", "A2", Some("=A1")).unwrap();
    wb.set_cell_contents("Sheet1", "A3", Some("=A1")).unwrap();
    wb.set_cell_contents("Sheet1", "A1", Some("2")).unwrap();

    let calls = seen.borrow();
    assert_eq!(calls.len(), 4);
    assert_eq!(calls[0], vec![("Sheet1".to_string(), "A1".to_string())]);
    assert_eq!(calls[1], vec![("Sheet1".to_string(), "A2".to_string())]);
    assert_eq!(calls[2], vec![("Sheet1".to_string(), "A3".to_string())]);
    assert_eq!(
        calls[3],
        vec![
            ("Sheet1".to_string(), "A1".to_string()),
            ("Sheet1".to_string(), "A2".to_string()),
            ("Sheet1".to_string(), "A3".to_string()),
        ]
    );
}

#[test]
fn setting_identical_contents_twice_produces_no_second_notification() {
    let mut wb = Workbook::new();
    wb.new_sheet(Some("Sheet1")).unwrap();
    let count = Rc::new(RefCell::new(0u32));
    let counter = count.clone();
    wb.notify_cells_changed(Box::new(move |_wb, _changed| {
        *counter.borrow_mut() += 1;
    }));

    wb.set_cell_contents("Sheet1", "A1", Some("42")).unwrap();
    assert_eq!(*count.borrow(), 1);
    wb.set_cell_contents("Sheet1", "A1", Some("42")).unwrap();
    assert_eq!(*count.borrow(), 1, "identical contents must not renotify");
}

#[test]
fn json_round_trip_preserves_sheets_and_contents() {
    let mut wb = Workbook::new();
    wb.new_sheet(Some("Sheet1")).unwrap();
    wb.new_sheet(Some("Sheet2")).unwrap();
    wb.set_cell_contents("Sheet1", "A1", Some("5")).unwrap();
    wb.set_cell_contents("Sheet1", "B1", Some("=A1*2")).unwrap();
    wb.set_cell_contents("Sheet2", "C3", Some("hello")).unwrap();

    let mut buf = Vec::new();
    wb.save_workbook(&mut buf).unwrap();

    let mut loaded = Workbook::new();
    loaded.load_workbook(buf.as_slice()).unwrap();

    assert_eq!(loaded.list_sheets(), vec!["Sheet1", "Sheet2"]);
    assert_eq!(loaded.get_cell_contents("Sheet1", "A1").unwrap().as_deref(), Some("5"));
    assert_eq!(
        loaded.get_cell_contents("Sheet1", "B1").unwrap().as_deref(),
        Some("=A1*2")
    );
    assert_eq!(value(&loaded, "Sheet1", "B1"), CellValue::Number(dec!(10)));
    assert_eq!(
        loaded.get_cell_contents("Sheet2", "C3").unwrap().as_deref(),
        Some("hello")
    );
}

#[test]
fn copy_sheet_appends_with_numeric_suffix() {
    let mut wb = Workbook::new();
    wb.new_sheet(Some("Budget")).unwrap();
    wb.set_cell_contents("Budget", "A1", Some("100")).unwrap();
    let copy_name = wb.copy_sheet("Budget").unwrap();
    assert_eq!(copy_name, "Budget_1");
    assert_eq!(wb.list_sheets(), vec!["Budget", "Budget_1"]);
    assert_eq!(value(&wb, "Budget_1", "A1"), CellValue::Number(dec!(100)));
}

#[test]
fn paste_outside_grid_bounds_is_rejected_and_leaves_workbook_unchanged() {
    let mut wb = Workbook::new();
    wb.new_sheet(Some("Sheet1")).unwrap();
    wb.set_cell_contents("Sheet1", "A1", Some("1")).unwrap();
    wb.set_cell_contents("Sheet1", "B1", Some("2")).unwrap();
    let before_a1 = wb.get_cell_contents("Sheet1", "A1").unwrap();
    let before_b1 = wb.get_cell_contents("Sheet1", "B1").unwrap();

    // A1:B1 is two cells wide; anchoring its left edge at the last column
    // pushes the right edge past MAX_COL.
    let result = wb.move_cells("Sheet1", "A1", "B1", "ZZZZ9999");
    assert!(result.is_err());
    assert_eq!(wb.get_cell_contents("Sheet1", "A1").unwrap(), before_a1);
    assert_eq!(wb.get_cell_contents("Sheet1", "B1").unwrap(), before_b1);
}
