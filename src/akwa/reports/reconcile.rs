use crate::akwa::reports::config::{Mapping, OrderList};
use crate::akwa::reports::model::Record;

/// Sort position of a record: the order-list index of its mapped name, or
/// `usize::MAX` when the client is unmapped or not listed.
pub fn sort_key(record: &Record, mapping: &Mapping, order: &OrderList) -> usize {
    order
        .position(mapping.canonical(&record.entity))
        .unwrap_or(usize::MAX)
}

/// Orders records to follow `order`.
///
/// The sort is stable: listed clients appear in list order, everything else
/// follows in the order it was fetched.
pub fn reconcile(mut records: Vec<Record>, mapping: &Mapping, order: &OrderList) -> Vec<Record> {
    records.sort_by_cached_key(|record| sort_key(record, mapping, order));
    records
}
