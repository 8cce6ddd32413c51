//! Where per-client tables come from.
//!
//! A [`DataSource`] enumerates the clients of a run and loads each client's
//! export on demand. Loading errors are returned per client so the caller
//! can turn them into error records without stopping the run.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::akwa::reports::config::ClientConfig;
use crate::akwa::reports::error::{ReportError, Result};
use crate::akwa::reports::io::table_read;
use crate::akwa::reports::model::Table;

/// A client as enumerated by a data source.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Raw client name as the source reports it.
    pub name: String,
    pub location: PathBuf,
}

pub trait DataSource {
    /// Clients to report on, in fetch order.
    fn entities(&self) -> Result<Vec<Entity>>;

    /// Loads one client's rows.
    fn load(&self, entity: &Entity) -> Result<Table>;
}

/// Clients listed in a configuration file, each pointing at its own export.
#[derive(Debug, Clone)]
pub struct ClientListSource {
    clients: Vec<ClientConfig>,
}

impl ClientListSource {
    pub fn new(clients: Vec<ClientConfig>) -> Self {
        Self { clients }
    }
}

impl DataSource for ClientListSource {
    fn entities(&self) -> Result<Vec<Entity>> {
        Ok(self
            .clients
            .iter()
            .map(|client| Entity {
                name: client.name.clone(),
                location: client.export.clone(),
            })
            .collect())
    }

    fn load(&self, entity: &Entity) -> Result<Table> {
        load_export(&entity.location)
    }
}

/// Every CSV or workbook in a folder, one client per file, named after the
/// file stem.
#[derive(Debug, Clone)]
pub struct FolderSource {
    folder: PathBuf,
    excluded: Vec<PathBuf>,
}

impl FolderSource {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            excluded: Vec::new(),
        }
    }

    /// Skips `path` during discovery, e.g. a report written into the same
    /// folder by an earlier run.
    pub fn excluding(mut self, path: impl Into<PathBuf>) -> Self {
        self.excluded.push(path.into());
        self
    }

    fn is_excluded(&self, path: &Path) -> bool {
        self.excluded.iter().any(|excluded| same_file(excluded, path))
    }
}

impl DataSource for FolderSource {
    fn entities(&self) -> Result<Vec<Entity>> {
        if !self.folder.is_dir() {
            return Err(ReportError::MissingInput(self.folder.clone()));
        }

        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.folder)? {
            let path = entry?.path();
            if !path.is_file() || !is_export(&path) {
                continue;
            }
            if self.is_excluded(&path) {
                debug!(path = %path.display(), "skipping excluded file");
                continue;
            }
            paths.push(path);
        }
        // read_dir order is platform dependent.
        paths.sort();

        let entities: Vec<Entity> = paths
            .into_iter()
            .filter_map(|path| {
                let name = path.file_stem()?.to_string_lossy().into_owned();
                Some(Entity {
                    name,
                    location: path,
                })
            })
            .collect();
        debug!(
            folder = %self.folder.display(),
            count = entities.len(),
            "discovered exports"
        );
        Ok(entities)
    }

    fn load(&self, entity: &Entity) -> Result<Table> {
        load_export(&entity.location)
    }
}

fn is_export(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ["csv", "xlsx", "xlsm"]
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

fn same_file(left: &Path, right: &Path) -> bool {
    match (fs::canonicalize(left), fs::canonicalize(right)) {
        (Ok(left), Ok(right)) => left == right,
        _ => left == right,
    }
}

fn load_export(path: &Path) -> Result<Table> {
    if !path.exists() {
        return Err(ReportError::MissingInput(path.to_path_buf()));
    }
    table_read::read_table(path)
}
