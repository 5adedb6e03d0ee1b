use super::sheet::Sheet;
use super::workbook::Workbook;
use crate::error::{Result, SpreadsheetError};
use crate::types::CellAddress;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Write};

#[derive(Serialize, Deserialize)]
struct WorkbookJson {
    sheets: Vec<SheetJson>,
}

#[derive(Serialize, Deserialize)]
struct SheetJson {
    name: String,
    #[serde(rename = "cell-contents")]
    cell_contents: HashMap<String, String>,
}

/// Replaces `wb`'s entire contents with the workbook described by `source`,
/// wrapped in a single update transaction so existing notifiers still fire
/// over the old-to-new diff.
pub(super) fn load(wb: &mut Workbook, mut source: impl Read) -> Result<()> {
    let mut buf = String::new();
    source
        .read_to_string(&mut buf)
        .map_err(|e| SpreadsheetError::MalformedWorkbook(e.to_string()))?;
    let parsed: WorkbookJson =
        serde_json::from_str(&buf).map_err(|e| SpreadsheetError::MalformedWorkbook(e.to_string()))?;

    // Validate every address before touching `wb` at all, so a malformed
    // document later in the file can't leave the workbook partially
    // overwritten — the transaction below is then infallible.
    let mut sheets = Vec::with_capacity(parsed.sheets.len());
    for sheet_json in parsed.sheets {
        let mut cells = Vec::with_capacity(sheet_json.cell_contents.len());
        for (addr_str, text) in sheet_json.cell_contents {
            let addr = CellAddress::parse(&addr_str)
                .map_err(|_| SpreadsheetError::MalformedWorkbook(format!("invalid address '{addr_str}'")))?;
            cells.push((addr, text));
        }
        sheets.push((sheet_json.name, cells));
    }

    wb.run_transaction(None, move |wb, resolver| {
        wb.sheets.clear();
        for (name, cells) in sheets {
            let sheet_lower = name.to_ascii_lowercase();
            let mut sheet = Sheet::new(name);
            for (addr, text) in cells {
                sheet.set_cell_contents(addr, Some(&text), &sheet_lower, resolver, wb.functions());
            }
            wb.sheets.push(sheet);
        }
        Ok(())
    })
}

/// Emits compact JSON preserving sheet order and each sheet's trimmed cell
/// contents; empty cells are simply absent keys.
pub(super) fn save(wb: &Workbook, dest: impl Write) -> Result<()> {
    let doc = WorkbookJson {
        sheets: wb
            .sheets()
            .map(|sheet| SheetJson {
                name: sheet.name().to_string(),
                cell_contents: sheet
                    .iter_cells()
                    .map(|(&(col, row), cell)| (CellAddress::new(col, row).to_string(), cell.contents().to_string()))
                    .collect(),
            })
            .collect(),
    };
    serde_json::to_writer(dest, &doc).map_err(|e| SpreadsheetError::MalformedWorkbook(e.to_string()))
}
