use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::akwa::reports::error::{ReportError, Result};
use crate::akwa::reports::io::table_read;
use crate::akwa::reports::model::{CLIENT_COLUMN, Table};
use crate::akwa::reports::normalize::normalize_name;

/// Raw client name → canonical client name, loaded once per run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    entries: BTreeMap<String, String>,
}

impl Mapping {
    pub fn get(&self, raw: &str) -> Option<&str> {
        self.entries.get(raw).map(String::as_str)
    }

    /// Maps a raw name, falling back to the raw name itself when unmapped.
    pub fn canonical<'a>(&'a self, raw: &'a str) -> &'a str {
        self.get(raw).unwrap_or(raw)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(raw, canonical)| (raw.into(), canonical.into()))
                .collect(),
        }
    }
}

/// Canonical client names in report order.
///
/// Duplicates are kept as loaded; lookups resolve to the first occurrence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderList {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl OrderList {
    pub fn push(&mut self, canonical: impl Into<String>) {
        let canonical = canonical.into();
        let index = self.names.len();
        self.positions
            .entry(normalize_name(&canonical))
            .or_insert(index);
        self.names.push(canonical);
    }

    /// Sort position of a canonical name, compared after normalisation.
    pub fn position(&self, canonical: &str) -> Option<usize> {
        self.positions.get(&normalize_name(canonical)).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for OrderList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut order = OrderList::default();
        for name in iter {
            order.push(name);
        }
        order
    }
}

/// One client entry of the client configuration file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClientConfig {
    pub name: String,
    /// Export holding the client's rows, relative to the configuration file.
    pub export: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ClientsFile {
    clients: Vec<ClientConfig>,
}

/// Loads the raw → canonical mapping from a JSON object.
///
/// When the object repeats a key the last value wins.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn load_mapping(path: &Path) -> Result<Mapping> {
    let source = read_config(path)?;
    let entries: BTreeMap<String, String> =
        serde_json::from_str(&source).map_err(|error| ReportError::config(path, error))?;
    info!(entries = entries.len(), "loaded client mapping");
    Ok(Mapping { entries })
}

/// Loads the desired client order, translating every row through `mapping`.
///
/// Rows whose client has no mapping entry are skipped with a warning.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn load_order(path: &Path, mapping: &Mapping) -> Result<OrderList> {
    if !path.exists() {
        return Err(ReportError::config(path, "file not found"));
    }
    let table = table_read::read_table(path).map_err(|error| ReportError::config(path, error))?;
    let order = order_from_table(&table, mapping);
    info!(clients = order.len(), "loaded client order");
    Ok(order)
}

/// Loads the list of clients to report on.
///
/// Relative export paths are resolved against the configuration file's
/// directory.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn load_clients(path: &Path) -> Result<Vec<ClientConfig>> {
    let source = read_config(path)?;
    let file: ClientsFile =
        serde_json::from_str(&source).map_err(|error| ReportError::config(path, error))?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));

    let clients = file
        .clients
        .into_iter()
        .map(|client| ClientConfig {
            export: base.join(&client.export),
            name: client.name,
        })
        .collect::<Vec<_>>();
    info!(clients = clients.len(), "loaded client configuration");
    Ok(clients)
}

fn order_from_table(table: &Table, mapping: &Mapping) -> OrderList {
    // Order files without a "Client" header carry the names in the first column.
    let column = table.column(CLIENT_COLUMN).unwrap_or(0);
    let mut order = OrderList::default();

    for row in &table.rows {
        let raw = table.cell(row, column).as_text();
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        match mapping.get(raw) {
            Some(canonical) => {
                debug!(raw, canonical, "ordered client");
                order.push(canonical);
            }
            None => warn!(client = raw, "no mapping found for client"),
        }
    }

    order
}

fn read_config(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|error| ReportError::config(path, error))
}
