use std::path::Path;

use tracing::{error, info, instrument, warn};

use crate::akwa::reports::config::{Mapping, OrderList};
use crate::akwa::reports::error::Result;
use crate::akwa::reports::io::table_write;
use crate::akwa::reports::metric::{Fetch, Metric};
use crate::akwa::reports::model::{Record, RecordStatus, Report};
use crate::akwa::reports::reconcile::reconcile;
use crate::akwa::reports::source::{DataSource, Entity};

/// Fetches every client from `source`, computes `metric`, and orders the
/// result against `order`.
///
/// Failures for one client become error records; only failing to enumerate
/// the clients aborts the run.
#[instrument(level = "info", skip_all, fields(?metric))]
pub fn build_report(
    source: &dyn DataSource,
    metric: &Metric,
    mapping: &Mapping,
    order: &OrderList,
) -> Result<Report> {
    let entities = source.entities()?;
    info!(client_count = entities.len(), "fetching clients");

    let records: Vec<Record> = entities
        .iter()
        .map(|entity| fetch_record(source, entity, metric))
        .collect();

    Ok(Report {
        columns: metric.columns(),
        records: reconcile(records, mapping, order),
    })
}

/// Builds the report and writes it to `output`.
#[instrument(level = "info", skip_all, fields(output = %output.display()))]
pub fn run_report(
    source: &dyn DataSource,
    metric: &Metric,
    mapping: &Mapping,
    order: &OrderList,
    output: &Path,
) -> Result<Report> {
    let report = build_report(source, metric, mapping, order)?;
    table_write::write_report(output, &report)?;
    let failed = report.records.iter().filter(|record| record.is_error()).count();
    info!(
        rows = report.records.len(),
        failed,
        "report written to {}",
        output.display()
    );
    Ok(report)
}

fn fetch_record(source: &dyn DataSource, entity: &Entity, metric: &Metric) -> Record {
    info!(client = %entity.name, "processing");

    let fetch = match source.load(entity) {
        Ok(table) => metric.compute(&table),
        Err(err) => Fetch::Error(err.to_string()),
    };

    match fetch {
        Fetch::Ok(fields) => {
            let record = Record::new(entity.name.clone(), fields);
            info!(client = %entity.name, fields = %summarize(&record), "done");
            record
        }
        Fetch::NoData => {
            warn!(client = %entity.name, "no data");
            Record::new(entity.name.clone(), metric.no_data_fields())
                .with_status(RecordStatus::NoData)
        }
        Fetch::Error(reason) => {
            error!(client = %entity.name, %reason, "failed to read client");
            Record::new(entity.name.clone(), metric.error_fields())
                .with_status(RecordStatus::Error(reason))
        }
    }
}

fn summarize(record: &Record) -> String {
    record
        .fields
        .iter()
        .map(|(name, value)| format!("{name}={}", value.render()))
        .collect::<Vec<_>>()
        .join(", ")
}
