//! Core library for the akwa-reports command line application.
//!
//! The library exposes the building blocks behind the per-client summary
//! reports as well as the orchestration used by the CLI. Field cleaning lives
//! under [`akwa::reports::normalize`], the mapping and ordering files under
//! [`akwa::reports::config`], the ordering logic in
//! [`akwa::reports::reconcile`], data sources and metrics under
//! [`akwa::reports::source`] and [`akwa::reports::metric`], and the table
//! readers and writers under [`akwa::reports::io`].

pub mod akwa;

pub use akwa::reports::{
    ReportError, Result, compare, config, error, io, metric, model, normalize, reconcile, report,
    source,
};
