use std::path::PathBuf;

use akwa_reports::akwa::reports::compare;
use akwa_reports::akwa::reports::config::{self, Mapping, OrderList};
use akwa_reports::akwa::reports::metric::{Metric, Window};
use akwa_reports::akwa::reports::report;
use akwa_reports::akwa::reports::source::{ClientListSource, DataSource, FolderSource};
use akwa_reports::{ReportError, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging(cli.verbose).and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|error| ReportError::Logging(error.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Report(args) => execute_report(args),
        Command::Compare(args) => execute_compare(args),
    }
}

fn execute_report(args: ReportArgs) -> Result<()> {
    let mapping = match &args.mapping {
        Some(path) => config::load_mapping(path)?,
        None => Mapping::default(),
    };
    let order = match &args.order {
        Some(path) => config::load_order(path, &mapping)?,
        None => OrderList::default(),
    };

    let source: Box<dyn DataSource> = match (&args.clients, &args.folder) {
        (Some(path), None) => Box::new(ClientListSource::new(config::load_clients(path)?)),
        (None, Some(folder)) => Box::new(FolderSource::new(folder).excluding(&args.output)),
        _ => {
            return Err(ReportError::InvalidArguments(
                "pass exactly one of --clients or --folder".into(),
            ));
        }
    };

    let metric = args.metric()?;
    report::run_report(source.as_ref(), &metric, &mapping, &order, &args.output)?;
    Ok(())
}

fn execute_compare(args: CompareArgs) -> Result<()> {
    compare::compare_files(&args.input, &args.export, &args.output)?;
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Build per-client summary reports ordered by a client list."
)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarise every client's export into one ordered report.
    Report(ReportArgs),
    /// List rows of an input CSV that are missing from a database export.
    Compare(CompareArgs),
}

#[derive(clap::Args)]
struct ReportArgs {
    /// Metric to extract from each client.
    #[arg(long, value_enum)]
    kind: ReportKind,

    /// JSON file listing the clients and their exports.
    #[arg(long, conflicts_with = "folder", required_unless_present = "folder")]
    clients: Option<PathBuf>,

    /// Folder whose CSV and workbook files are one client each.
    #[arg(long)]
    folder: Option<PathBuf>,

    /// JSON object mapping raw client names to canonical names.
    #[arg(long)]
    mapping: Option<PathBuf>,

    /// CSV or workbook with a "Client" column giving the report order.
    #[arg(long, requires = "mapping")]
    order: Option<PathBuf>,

    /// Report file path; `.xlsx` writes a workbook, anything else CSV.
    #[arg(long)]
    output: PathBuf,

    /// Column to total, overriding the report kind's default.
    #[arg(long)]
    column: Option<String>,

    /// Date column restricting totals to recent rows.
    #[arg(long)]
    window_column: Option<String>,

    /// Size of the date window in days.
    #[arg(long, default_value_t = 30, requires = "window_column")]
    days: u32,

    /// Last day of the date window; defaults to today.
    #[arg(long, requires = "window_column")]
    as_of: Option<NaiveDate>,
}

#[derive(clap::Args)]
struct CompareArgs {
    /// CSV that was supposed to be loaded.
    #[arg(long)]
    input: PathBuf,

    /// CSV exported from the database after the load.
    #[arg(long)]
    export: PathBuf,

    /// Where to write the rows that did not make it.
    #[arg(long, default_value = "not_loaded.csv")]
    output: PathBuf,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ReportKind {
    ChargeAmount,
    PaymentAmount,
    AppointmentDuration,
    LastPaymentTask,
    LastAppointmentTask,
}

impl ReportKind {
    fn default_total(self) -> Option<(&'static str, &'static str)> {
        match self {
            ReportKind::ChargeAmount => Some(("TotalChargeAmount", "Total Charge Amount")),
            ReportKind::PaymentAmount => Some(("Amount", "Total Payment Amount")),
            ReportKind::AppointmentDuration => {
                Some(("AppointmentDuration", "Total Appointment Duration"))
            }
            ReportKind::LastPaymentTask | ReportKind::LastAppointmentTask => None,
        }
    }

    fn task_pattern(self) -> Option<&'static str> {
        match self {
            ReportKind::LastPaymentTask => Some("payment"),
            ReportKind::LastAppointmentTask => Some("appointment"),
            _ => None,
        }
    }
}

impl ReportArgs {
    fn metric(&self) -> Result<Metric> {
        if let Some(pattern) = self.kind.task_pattern() {
            if self.column.is_some() || self.window_column.is_some() {
                return Err(ReportError::InvalidArguments(
                    "--column and --window-column only apply to total reports".into(),
                ));
            }
            return Ok(Metric::LatestTask {
                pattern: pattern.to_string(),
            });
        }

        let (default_column, label) = self.kind.default_total().ok_or_else(|| {
            ReportError::InvalidArguments(format!("no default column for {:?}", self.kind))
        })?;
        let window = self.window_column.as_ref().map(|column| Window {
            column: column.clone(),
            days: self.days,
            as_of: self
                .as_of
                .unwrap_or_else(|| chrono::Local::now().date_naive()),
        });
        let label = match window {
            Some(ref window) => format!("{label} (Last {} Days)", window.days),
            None => label.to_string(),
        };

        Ok(Metric::Total {
            column: self
                .column
                .clone()
                .unwrap_or_else(|| default_column.to_string()),
            label,
            window,
        })
    }
}
