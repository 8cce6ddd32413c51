//! Metrics computed over one client's export.

use std::cmp::Ordering;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::akwa::reports::model::{
    CLIENT_COLUMN, Cell, ERROR_SENTINEL, FieldValue, MISSING_SENTINEL, Table,
};
use crate::akwa::reports::normalize::{
    RawTimestamp, parse_amount, parse_date_text, parse_datetime_text, parse_timestamp,
};

pub const ROWS_FIELD: &str = "Rows";
pub const CODE_FIELD: &str = "Code";
pub const UPDATED_AT_FIELD: &str = "Updated At";
pub const STATUS_FIELD: &str = "Status";

const CODE_COLUMN: &str = "code";
const UPDATED_AT_COLUMN: &str = "updated_at";
const STATUS_COLUMN: &str = "status";
const NO_DATA_CODE: &str = "No Data";

/// Restricts a total to rows dated within the last `days` days of `as_of`.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub column: String,
    pub days: u32,
    pub as_of: NaiveDate,
}

impl Window {
    fn start(&self) -> NaiveDate {
        self.as_of - Duration::days(i64::from(self.days))
    }

    fn contains(&self, cell: &Cell) -> bool {
        let date = match cell {
            Cell::DateTime(value) => Some(value.date()),
            Cell::Text(value) => parse_date_text(value),
            Cell::Number(_) | Cell::Empty => None,
        };
        date.is_some_and(|date| date >= self.start())
    }
}

/// What to extract from each client's export.
#[derive(Debug, Clone, PartialEq)]
pub enum Metric {
    /// Sum of a currency or duration column.
    Total {
        column: String,
        label: String,
        window: Option<Window>,
    },
    /// Most recently updated task whose code contains `pattern`.
    LatestTask { pattern: String },
}

/// Result of extracting a metric for one client.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetch {
    Ok(Vec<(String, FieldValue)>),
    NoData,
    Error(String),
}

impl Metric {
    /// Output header for reports built from this metric.
    pub fn columns(&self) -> Vec<String> {
        let mut columns = vec![CLIENT_COLUMN.to_string()];
        match self {
            Metric::Total { label, .. } => {
                columns.push(label.clone());
                columns.push(ROWS_FIELD.to_string());
            }
            Metric::LatestTask { .. } => {
                columns.extend(
                    [CODE_FIELD, UPDATED_AT_FIELD, STATUS_FIELD]
                        .into_iter()
                        .map(String::from),
                );
            }
        }
        columns
    }

    pub fn compute(&self, table: &Table) -> Fetch {
        match self {
            Metric::Total {
                column,
                label,
                window,
            } => total(table, column, label, window.as_ref()),
            Metric::LatestTask { pattern } => latest_task(table, pattern),
        }
    }

    /// Sentinel fields for a client whose export could not be used.
    pub fn error_fields(&self) -> Vec<(String, FieldValue)> {
        match self {
            Metric::Total { label, .. } => vec![
                (label.clone(), FieldValue::text(ERROR_SENTINEL)),
                (ROWS_FIELD.to_string(), FieldValue::text(ERROR_SENTINEL)),
            ],
            Metric::LatestTask { .. } => task_fields(ERROR_SENTINEL, ERROR_SENTINEL, ""),
        }
    }

    /// Sentinel fields for a client with nothing to report.
    pub fn no_data_fields(&self) -> Vec<(String, FieldValue)> {
        match self {
            Metric::Total { label, .. } => vec![
                (label.clone(), FieldValue::Amount(0.0)),
                (ROWS_FIELD.to_string(), FieldValue::Count(0)),
            ],
            Metric::LatestTask { .. } => task_fields(NO_DATA_CODE, MISSING_SENTINEL, ""),
        }
    }
}

fn total(table: &Table, column: &str, label: &str, window: Option<&Window>) -> Fetch {
    let Some(index) = table.column(column) else {
        return Fetch::Error(format!("column '{column}' not found"));
    };
    let window_index = match window {
        Some(window) => match table.column(&window.column) {
            Some(index) => Some((window, index)),
            None => return Fetch::Error(format!("column '{}' not found", window.column)),
        },
        None => None,
    };

    let mut sum = 0.0;
    let mut rows = 0u64;
    for row in &table.rows {
        if let Some((window, date_index)) = window_index {
            if !window.contains(table.cell(row, date_index)) {
                continue;
            }
        }
        sum += cell_amount(table.cell(row, index));
        rows += 1;
    }

    Fetch::Ok(vec![
        (label.to_string(), FieldValue::Amount(round_cents(sum))),
        (ROWS_FIELD.to_string(), FieldValue::Count(rows)),
    ])
}

fn cell_amount(cell: &Cell) -> f64 {
    match cell {
        Cell::Number(value) if value.is_finite() => *value,
        Cell::Text(value) => parse_amount(value),
        _ => 0.0,
    }
}

fn round_cents(value: f64) -> f64 {
    // Adding zero turns a rounded -0.0 into 0.0.
    (value * 100.0).round() / 100.0 + 0.0
}

fn latest_task(table: &Table, pattern: &str) -> Fetch {
    let Some(code_index) = table.column(CODE_COLUMN) else {
        return Fetch::Error(format!("column '{CODE_COLUMN}' not found"));
    };
    let Some(updated_index) = table.column(UPDATED_AT_COLUMN) else {
        return Fetch::Error(format!("column '{UPDATED_AT_COLUMN}' not found"));
    };
    let status_index = table.column(STATUS_COLUMN);
    let pattern = pattern.to_lowercase();

    let mut latest: Option<(&[Cell], UpdateKey)> = None;
    for row in &table.rows {
        let code = table.cell(row, code_index).as_text();
        if !code.to_lowercase().contains(&pattern) {
            continue;
        }
        let key = UpdateKey::from_cell(table.cell(row, updated_index));
        let newer = match &latest {
            Some((_, best)) => key.cmp(best) == Ordering::Greater,
            None => true,
        };
        if newer {
            latest = Some((row.as_slice(), key));
        }
    }

    let Some((row, _)) = latest else {
        return Fetch::NoData;
    };

    let code = table.cell(row, code_index).as_text();
    let updated_at = match table.cell(row, updated_index) {
        Cell::DateTime(value) => parse_timestamp(&RawTimestamp::Native(*value)),
        Cell::Empty => MISSING_SENTINEL.to_string(),
        other => parse_timestamp(&RawTimestamp::Text(other.as_text())),
    };
    let status = status_index
        .map(|index| table.cell(row, index).as_text())
        .unwrap_or_default();

    Fetch::Ok(task_fields(&code, &updated_at, &status))
}

fn task_fields(code: &str, updated_at: &str, status: &str) -> Vec<(String, FieldValue)> {
    vec![
        (CODE_FIELD.to_string(), FieldValue::text(code)),
        (UPDATED_AT_FIELD.to_string(), FieldValue::text(updated_at)),
        (STATUS_FIELD.to_string(), FieldValue::text(status)),
    ]
}

/// Ordering of `updated_at` values: parseable timestamps outrank raw text,
/// raw text compares lexically, and blanks rank lowest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum UpdateKey {
    Blank,
    Raw(String),
    Parsed(NaiveDateTime),
}

impl UpdateKey {
    fn from_cell(cell: &Cell) -> Self {
        match cell {
            Cell::Empty => UpdateKey::Blank,
            Cell::DateTime(value) => UpdateKey::Parsed(*value),
            other => {
                let text = other.as_text();
                match parse_datetime_text(&text) {
                    Some(value) => UpdateKey::Parsed(value),
                    None => UpdateKey::Raw(text),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str], rows: &[&[&str]]) -> Table {
        Table {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|value| {
                            if value.is_empty() {
                                Cell::Empty
                            } else {
                                Cell::Text(value.to_string())
                            }
                        })
                        .collect()
                })
                .collect(),
        }
    }

    fn amount_metric(window: Option<Window>) -> Metric {
        Metric::Total {
            column: "Amount".into(),
            label: "Total".into(),
            window,
        }
    }

    #[test]
    fn totals_clean_every_cell() {
        let data = table(
            &["Id", "Amount"],
            &[&["1", "$1,000.10"], &["2", "N/A"], &["3", ""], &["4", "25"], &["5"]],
        );

        let fetch = amount_metric(None).compute(&data);

        assert_eq!(
            fetch,
            Fetch::Ok(vec![
                ("Total".into(), FieldValue::Amount(1025.1)),
                (ROWS_FIELD.into(), FieldValue::Count(5)),
            ])
        );
    }

    #[test]
    fn offsetting_amounts_total_plain_zero() {
        let data = table(&["Amount"], &[&["0.004"], &["-0.005"]]);

        let fetch = amount_metric(None).compute(&data);

        let Fetch::Ok(fields) = fetch else {
            panic!("expected totals, got {fetch:?}");
        };
        assert_eq!(fields[0].1.render(), "0.00");
    }

    #[test]
    fn missing_column_is_a_record_error() {
        let data = table(&["Id", "Sum"], &[&["1", "5"]]);
        assert_eq!(
            amount_metric(None).compute(&data),
            Fetch::Error("column 'Amount' not found".into())
        );
    }

    #[test]
    fn window_drops_old_and_undated_rows() {
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 30).expect("valid date");
        let window = Window {
            column: "Date".into(),
            days: 30,
            as_of,
        };
        let data = table(
            &["Date", "Amount"],
            &[
                &["2024-06-01", "10"],
                &["2024-05-31", "20"],
                &["2024-05-30", "40"],
                &["soon", "80"],
            ],
        );

        let fetch = amount_metric(Some(window)).compute(&data);

        assert_eq!(
            fetch,
            Fetch::Ok(vec![
                ("Total".into(), FieldValue::Amount(30.0)),
                (ROWS_FIELD.into(), FieldValue::Count(2)),
            ])
        );
    }

    #[test]
    fn latest_task_picks_newest_matching_code() {
        let data = table(
            &["code", "updated_at", "status"],
            &[
                &["charge_payment", "2024-01-02 10:00:00", "done"],
                &["charge_payment", "2024-03-01 08:30:00.250", "running"],
                &["charge_appointment", "2024-05-01 00:00:00", "done"],
                &["PAYMENT_sync", "2024-02-01", "done"],
            ],
        );

        let fetch = Metric::LatestTask {
            pattern: "payment".into(),
        }
        .compute(&data);

        assert_eq!(
            fetch,
            Fetch::Ok(task_fields(
                "charge_payment",
                "2024-03-01 08:30:00.250",
                "running"
            ))
        );
    }

    #[test]
    fn latest_task_without_match_has_no_data() {
        let data = table(&["code", "updated_at"], &[&["charge_appointment", "2024-05-01"]]);
        let metric = Metric::LatestTask {
            pattern: "payment".into(),
        };
        assert_eq!(metric.compute(&data), Fetch::NoData);
    }

    #[test]
    fn unparseable_update_time_is_kept_verbatim() {
        let data = table(&["code", "updated_at"], &[&["payment", "yesterday-ish"]]);
        let metric = Metric::LatestTask {
            pattern: "payment".into(),
        };
        assert_eq!(
            metric.compute(&data),
            Fetch::Ok(task_fields("payment", "yesterday-ish", ""))
        );
    }
}
