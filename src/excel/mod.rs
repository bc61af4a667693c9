//! Writes extracted tables into xlsx workbooks.

use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use serde::Serialize;
use thiserror::Error;

use crate::pdf::PageResult;
use crate::table::{CellValue, ExtractedTable};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Excel's hard column limit.
const MAX_COLUMNS: usize = 16_384;
const MAX_SHEET_NAME: usize = 31;

#[derive(Debug, Error)]
pub enum ExcelError {
    #[error("Failed to create Excel file: {0}")]
    Xlsx(#[from] XlsxError),

    #[error("Failed to create Excel file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkbookSummary {
    pub path: PathBuf,
    pub total_tables: usize,
    pub total_rows: usize,
    pub file_size: u64,
}

/// One sheet per table: `Extracted Table`, `Extracted Table 2`, ...
pub fn write_tables(tables: &[ExtractedTable], path: &Path) -> Result<WorkbookSummary, ExcelError> {
    let mut workbook = Workbook::new();
    let mut total_tables = 0;
    let mut total_rows = 0;

    for (idx, table) in tables.iter().enumerate() {
        let name = if idx == 0 {
            "Extracted Table".to_string()
        } else {
            format!("Extracted Table {}", idx + 1)
        };
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet_name(&name))?;

        write_table(worksheet, table, 0)?;
        total_tables += 1;
        total_rows += table.row_count();
        tracing::debug!(
            "Sheet '{}': {} rows x {} columns",
            name,
            table.row_count(),
            table.column_count()
        );
    }

    if tables.is_empty() {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name("Extracted Table")?;
        worksheet.write_string(0, 0, "No tables found")?;
    }

    save(workbook, path, total_tables, total_rows)
}

/// One sheet per page, tables stacked with a blank row between them.
pub fn write_pdf_pages(pages: &[PageResult], path: &Path) -> Result<WorkbookSummary, ExcelError> {
    let mut workbook = Workbook::new();
    let mut total_tables = 0;
    let mut total_rows = 0;

    for page in pages {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet_name(&format!("Page {}", page.page_number)))?;

        if !page.success {
            let error = page.error.as_deref().unwrap_or("Unknown error");
            worksheet.write_string(0, 0, format!("Extraction failed: {error}"))?;
            continue;
        }

        let tables: Vec<&ExtractedTable> = page.tables.iter().filter(|t| !t.is_empty()).collect();
        if tables.is_empty() {
            worksheet.write_string(0, 0, "No tables found on this page")?;
            continue;
        }

        let mut row = 0;
        for table in tables {
            row = write_table(worksheet, table, row)? + 1;
            total_tables += 1;
            total_rows += table.row_count();
        }
    }

    if pages.is_empty() {
        let worksheet = workbook.add_worksheet();
        worksheet.write_string(0, 0, "No pages processed")?;
    }

    save(workbook, path, total_tables, total_rows)
}

/// Returns the first row after the table.
fn write_table(worksheet: &mut Worksheet, table: &ExtractedTable, start_row: u32) -> Result<u32, XlsxError> {
    let mut row = start_row;

    if !table.headers.is_empty() {
        write_row(worksheet, row, &table.headers)?;
        row += 1;
    }
    for cells in &table.data {
        write_row(worksheet, row, cells)?;
        row += 1;
    }
    Ok(row)
}

fn write_row(worksheet: &mut Worksheet, row: u32, cells: &[CellValue]) -> Result<(), XlsxError> {
    if cells.len() > MAX_COLUMNS {
        tracing::warn!(
            "Row {} has {} cells, truncating to {}",
            row + 1,
            cells.len(),
            MAX_COLUMNS
        );
    }
    for (col, cell) in cells.iter().take(MAX_COLUMNS).enumerate() {
        write_cell(worksheet, row, col as u16, cell)?;
    }
    Ok(())
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &CellValue) -> Result<(), XlsxError> {
    match cell {
        CellValue::Empty => {}
        CellValue::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        CellValue::Number(n) => match n.as_f64() {
            Some(f) => {
                worksheet.write_number(row, col, f)?;
            }
            None => {
                worksheet.write_string(row, col, n.to_string())?;
            }
        },
        CellValue::Text(s) => {
            if !s.is_empty() {
                worksheet.write_string(row, col, s)?;
            }
        }
        CellValue::Nested(v) => {
            worksheet.write_string(row, col, v.to_string())?;
        }
    }
    Ok(())
}

/// Strips characters Excel rejects and truncates to 31 chars.
fn sheet_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(MAX_SHEET_NAME)
        .collect();
    let cleaned = cleaned.trim_matches('\'').to_string();
    if cleaned.is_empty() { "Sheet".to_string() } else { cleaned }
}

fn save(
    mut workbook: Workbook,
    path: &Path,
    total_tables: usize,
    total_rows: usize,
) -> Result<WorkbookSummary, ExcelError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    workbook.save(path)?;
    let file_size = std::fs::metadata(path)?.len();

    tracing::info!(
        "Excel file saved: {} ({} tables, {} rows, {} bytes)",
        path.display(),
        total_tables,
        total_rows,
        file_size
    );

    Ok(WorkbookSummary {
        path: path.to_path_buf(),
        total_tables,
        total_rows,
        file_size,
    })
}
