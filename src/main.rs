//! CLI entry point for the ridership peak-hour analyzer.
//!
//! Provides subcommands for listing the routes of a trip export and for
//! running the peak-hour demand report over a selection of routes.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use ridership_peaks::{
    analyzers::analyze,
    config::ColumnLayout,
    fetch::load_source,
    output::{TextReport, print_pretty, to_json, write_report},
    parser::parse_sheet,
    records::{DateRange, TripRecord, available_routes, normalize},
};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Routes analyzed when none are requested explicitly.
const DEFAULT_ROUTE_COUNT: usize = 3;

#[derive(Parser)]
#[command(name = "ridership_peaks")]
#[command(about = "Peak-hour passenger demand per route from trip exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Path to a CSV/XLSX export, or a URL to fetch it from
    #[arg(value_name = "FILE_OR_URL")]
    source: String,

    /// JSON file with the zero-based column positions of the required fields
    #[arg(long)]
    layout: Option<String>,

    /// Column holding the route code (overrides the layout file)
    #[arg(long)]
    route_column: Option<usize>,

    /// Column holding the passenger count (overrides the layout file)
    #[arg(long)]
    passengers_column: Option<usize>,

    /// Column holding the trip start date and time (overrides the layout file)
    #[arg(long)]
    timestamp_column: Option<usize>,

    /// CSV delimiter; detected from the header when omitted
    #[arg(short, long)]
    delimiter: Option<char>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the peak-hour demand analysis
    Analyze {
        #[command(flatten)]
        input: SourceArgs,

        /// Route codes to analyze (comma separated); defaults to the first three routes
        #[arg(short, long, value_delimiter = ',')]
        routes: Vec<String>,

        /// Analyze every route in the export
        #[arg(long, conflicts_with = "routes")]
        all_routes: bool,

        /// First calendar date to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last calendar date to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Directory to write CSV tables into
        #[arg(short, long)]
        output_dir: Option<String>,

        /// Print the full result as JSON instead of the text report
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// List the route codes present in an export
    Routes {
        #[command(flatten)]
        input: SourceArgs,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/ridership_peaks.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("ridership_peaks.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            routes,
            all_routes,
            from,
            to,
            output_dir,
            json,
        } => {
            let records = DateRange { from, to }.apply(load_records(&input)?);
            let routes = select_routes(&records, routes, all_routes);
            run_analysis(&records, &routes, output_dir.as_deref(), json)?;
        }
        Commands::Routes { input } => {
            let records = load_records(&input)?;
            let routes = available_routes(&records);
            info!(total = routes.len(), "Routes found");
            for route in routes {
                println!("{route}");
            }
        }
    }

    Ok(())
}

/// Reads, parses and normalizes the export named by `input`.
#[tracing::instrument(skip_all, fields(source = %input.source))]
fn load_records(input: &SourceArgs) -> Result<Vec<TripRecord>> {
    let layout = match &input.layout {
        Some(path) => ColumnLayout::load(path)?,
        None => ColumnLayout::default(),
    }
    .with_overrides(
        input.route_column,
        input.passengers_column,
        input.timestamp_column,
    );

    let delimiter = match input.delimiter {
        Some(c) if c.is_ascii() => Some(c as u8),
        Some(c) => bail!("delimiter must be a single ASCII character, got {c:?}"),
        None => None,
    };

    let bytes = load_source(&input.source)?;
    let rows = parse_sheet(&bytes, &layout, delimiter)?;
    let records = normalize(&rows);

    if records.is_empty() {
        warn!(rows = rows.len(), "No trip rows with a readable timestamp");
    } else {
        info!(
            rows = rows.len(),
            records = records.len(),
            "Trip records loaded"
        );
    }
    Ok(records)
}

fn select_routes(records: &[TripRecord], requested: Vec<String>, all_routes: bool) -> Vec<String> {
    if !requested.is_empty() {
        return requested;
    }
    let available = available_routes(records);
    if all_routes {
        return available;
    }
    let routes: Vec<String> = available.into_iter().take(DEFAULT_ROUTE_COUNT).collect();
    info!(routes = ?routes, "No routes requested, using the first routes of the export");
    routes
}

#[tracing::instrument(skip(records), fields(records = records.len()))]
fn run_analysis(
    records: &[TripRecord],
    routes: &[String],
    output_dir: Option<&str>,
    json: bool,
) -> Result<()> {
    let result = analyze(records, routes)?;
    print_pretty(&result);

    if json {
        println!("{}", to_json(&result)?);
    } else {
        print!("{}", TextReport(&result));
    }

    if let Some(dir) = output_dir {
        let written = write_report(Path::new(dir), &result)?;
        info!(files = written.len(), dir, "Tables exported");
    }
    Ok(())
}
