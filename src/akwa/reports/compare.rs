use std::collections::HashSet;
use std::path::Path;

use tracing::{info, instrument};

use crate::akwa::reports::error::{ReportError, Result};
use crate::akwa::reports::io::{table_read, table_write};
use crate::akwa::reports::model::{Cell, Table};

/// Rows of `input` that do not appear in `export`, in input order.
///
/// Cells are trimmed before comparison. Both tables must share a header.
pub fn missing_rows(input: &Table, export: &Table) -> Result<Vec<Vec<String>>> {
    let input_headers = trimmed(&input.headers);
    let export_headers = trimmed(&export.headers);
    if input_headers != export_headers {
        return Err(ReportError::HeaderMismatch {
            left: input_headers,
            right: export_headers,
        });
    }

    let width = input_headers.len();
    let loaded: HashSet<Vec<String>> = export.rows.iter().map(|row| flatten(row, width)).collect();

    Ok(input
        .rows
        .iter()
        .map(|row| flatten(row, width))
        .filter(|row| !loaded.contains(row))
        .collect())
}

/// Writes the rows of `input` missing from `export` to `output` as CSV.
#[instrument(
    level = "info",
    skip_all,
    fields(input = %input.display(), export = %export.display(), output = %output.display())
)]
pub fn compare_files(input: &Path, export: &Path, output: &Path) -> Result<usize> {
    for path in [input, export] {
        if !path.exists() {
            return Err(ReportError::MissingInput(path.to_path_buf()));
        }
    }

    let input_table = table_read::read_table(input)?;
    let export_table = table_read::read_table(export)?;
    let missing = missing_rows(&input_table, &export_table)?;

    table_write::write_csv(output, &trimmed(&input_table.headers), &missing)?;
    info!(
        missing = missing.len(),
        "rows not loaded saved to {}",
        output.display()
    );
    Ok(missing.len())
}

fn trimmed(values: &[String]) -> Vec<String> {
    values.iter().map(|value| value.trim().to_string()).collect()
}

fn flatten(row: &[Cell], width: usize) -> Vec<String> {
    (0..width)
        .map(|index| {
            row.get(index)
                .map(|cell| cell.as_text().trim().to_string())
                .unwrap_or_default()
        })
        .collect()
}
