use chrono::NaiveDateTime;

use crate::akwa::reports::normalize::format_timestamp;

/// Placeholder written into metric fields when a client could not be read.
pub const ERROR_SENTINEL: &str = "ERROR";
/// Placeholder written into metric fields when a client had nothing to report.
pub const MISSING_SENTINEL: &str = "N/A";
/// Header of the leading column holding the client name.
pub const CLIENT_COLUMN: &str = "Client";

static EMPTY_CELL: Cell = Cell::Empty;

/// A single cell read from a client export.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    /// Cell already typed as a date by the source, e.g. an Excel date cell.
    DateTime(NaiveDateTime),
}

impl Cell {
    /// Renders the cell the way it would appear in a CSV export.
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(value) => value.clone(),
            Cell::Number(value) => value.to_string(),
            Cell::DateTime(value) => format_timestamp(value),
        }
    }
}

/// Headered rows loaded from a CSV file or a worksheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Locates a column by header, ignoring case and surrounding whitespace.
    pub fn column(&self, name: &str) -> Option<usize> {
        let wanted = name.trim();
        self.headers
            .iter()
            .position(|header| header.trim() == wanted)
            .or_else(|| {
                self.headers
                    .iter()
                    .position(|header| header.trim().eq_ignore_ascii_case(wanted))
            })
    }

    /// Returns the cell at `column` of `row`, treating ragged rows as empty.
    pub fn cell<'a>(&self, row: &'a [Cell], column: usize) -> &'a Cell {
        row.get(column).unwrap_or(&EMPTY_CELL)
    }
}

/// Typed metric value carried by a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    /// Currency or duration total, rendered with two decimals.
    Amount(f64),
    Count(u64),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn render(&self) -> String {
        match self {
            FieldValue::Text(value) => value.clone(),
            FieldValue::Amount(value) => format!("{value:.2}"),
            FieldValue::Count(value) => value.to_string(),
        }
    }
}

/// Outcome of reading one client.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordStatus {
    Ok,
    NoData,
    Error(String),
}

/// One report row: a client as named by the data source plus its metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Raw client name, exactly as the data source reported it.
    pub entity: String,
    /// Named metric values in output column order.
    pub fields: Vec<(String, FieldValue)>,
    pub status: RecordStatus,
}

impl Record {
    pub fn new(entity: impl Into<String>, fields: Vec<(String, FieldValue)>) -> Self {
        Self {
            entity: entity.into(),
            fields,
            status: RecordStatus::Ok,
        }
    }

    pub fn with_status(mut self, status: RecordStatus) -> Self {
        self.status = status;
        self
    }

    /// Looks up a metric value by field name.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.status, RecordStatus::Error(_))
    }
}

/// An ordered set of records ready to be written out.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Output header, starting with [`CLIENT_COLUMN`].
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Report {
    /// Flattens every record into rendered cells aligned with [`Report::columns`].
    /// Fields a record does not carry are left blank.
    pub fn rows(&self) -> Vec<Vec<String>> {
        self.records
            .iter()
            .map(|record| {
                self.columns
                    .iter()
                    .map(|column| {
                        if column == CLIENT_COLUMN {
                            record.entity.clone()
                        } else {
                            record.field(column).map(FieldValue::render).unwrap_or_default()
                        }
                    })
                    .collect()
            })
            .collect()
    }
}
