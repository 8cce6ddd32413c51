pub mod compare;
pub mod config;
pub mod error;
pub mod io;
pub mod metric;
pub mod model;
pub mod normalize;
pub mod reconcile;
pub mod report;
pub mod source;

pub use error::{ReportError, Result};
