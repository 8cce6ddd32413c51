use std::path::Path;

use rust_xlsxwriter::Workbook;

use crate::akwa::reports::error::Result;
use crate::akwa::reports::io::table_read::{TableFormat, detect_format};
use crate::akwa::reports::model::{CLIENT_COLUMN, FieldValue, Report};

const SHEET_NAME: &str = "Report";

/// Writes the report to `path`, as a workbook for `.xlsx` paths and as CSV
/// otherwise.
pub fn write_report(path: &Path, report: &Report) -> Result<()> {
    match detect_format(path) {
        TableFormat::Csv => write_csv(path, &report.columns, &report.rows()),
        TableFormat::Xlsx => write_workbook(path, report),
    }
}

/// Writes a header row followed by `rows` as CSV.
pub fn write_csv(path: &Path, columns: &[String], rows: &[Vec<String>]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_path(path)?;
    writer.write_record(columns)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes the report as a single-sheet workbook. Totals stay numeric so they
/// can be summed in the spreadsheet.
pub fn write_workbook(path: &Path, report: &Report) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col_idx, header) in report.columns.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, header)?;
    }

    for (row_idx, record) in report.records.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        for (col_idx, column) in report.columns.iter().enumerate() {
            let col = col_idx as u16;
            if column == CLIENT_COLUMN {
                worksheet.write_string(row, col, &record.entity)?;
                continue;
            }
            match record.field(column) {
                Some(FieldValue::Amount(value)) => {
                    worksheet.write_number(row, col, (*value * 100.0).round() / 100.0)?;
                }
                Some(FieldValue::Count(value)) => {
                    worksheet.write_number(row, col, *value as f64)?;
                }
                Some(FieldValue::Text(value)) => {
                    worksheet.write_string(row, col, value)?;
                }
                None => {}
            }
        }
    }

    let mut table = rust_xlsxwriter::Table::new();
    table.set_autofilter(true);
    let col_end = (report.columns.len() as u16).saturating_sub(1);
    let row_end = report.records.len() as u32;
    // A worksheet table needs at least one data row.
    if row_end > 0 {
        worksheet.add_table(0, 0, row_end, col_end, &table)?;
    }

    workbook.save(path)?;
    Ok(())
}
