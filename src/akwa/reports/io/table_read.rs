use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};
use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::akwa::reports::error::{ReportError, Result};
use crate::akwa::reports::model::{Cell, Table};

/// File layouts a table can be loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Xlsx,
}

/// Picks the table layout from the file extension, defaulting to CSV.
pub fn detect_format(path: &Path) -> TableFormat {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("xlsx") | Some("xlsm") => TableFormat::Xlsx,
        _ => TableFormat::Csv,
    }
}

/// Reads a headered table from a CSV file or the first sheet of a workbook.
pub fn read_table(path: &Path) -> Result<Table> {
    match detect_format(path) {
        TableFormat::Csv => read_csv(path),
        TableFormat::Xlsx => read_xlsx(path),
    }
}

/// Reads a CSV file. Every value stays text; typing is left to the metrics.
pub fn read_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_path(path)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|header| header.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(field.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(Table { headers, rows })
}

/// Reads the first worksheet of an `.xlsx` workbook.
pub fn read_xlsx(path: &Path) -> Result<Table> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ReportError::InvalidTable {
            path: path.to_path_buf(),
            reason: "workbook has no worksheets".into(),
        })??;

    let mut lines = range.rows();
    let headers: Vec<String> = match lines.next() {
        Some(first_row) => first_row
            .iter()
            .map(|cell| convert_cell(cell).as_text().trim().to_string())
            .collect(),
        None => Vec::new(),
    };
    let rows: Vec<Vec<Cell>> = lines
        .map(|row| row.iter().map(convert_cell).collect())
        .collect();

    Ok(Table { headers, rows })
}

fn convert_cell(cell: &DataType) -> Cell {
    match cell {
        DataType::String(value) if value.is_empty() => Cell::Empty,
        DataType::String(value) => Cell::Text(value.clone()),
        DataType::Float(value) => Cell::Number(*value),
        DataType::Int(value) => Cell::Number(*value as f64),
        DataType::Bool(value) => Cell::Text(value.to_string()),
        DataType::DateTime(serial) => match excel_serial_to_datetime(*serial) {
            Some(value) => Cell::DateTime(value),
            None => Cell::Number(*serial),
        },
        DataType::Empty => Cell::Empty,
        other => Cell::Text(other.to_string()),
    }
}

/// Converts an Excel serial date (days since 1899-12-30) to a timestamp.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}
