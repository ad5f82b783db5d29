//! Output formatting and persistence for analysis results.
//!
//! Supports pretty-printing, JSON serialization, a plain-text report and one
//! CSV file per result table.

use anyhow::Result;
use csv::Writer;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzers::AnalysisResult;
use crate::analyzers::regime::{DayTypeRegime, WEEK, weekday_name};
use crate::analyzers::utility::ceil_display;

/// Logs the result using Rust's debug pretty-print format.
pub fn print_pretty(result: &AnalysisResult) {
    debug!("{:#?}", result);
}

/// Serializes the result as pretty-printed JSON.
pub fn to_json(result: &AnalysisResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Writes `rows` to a CSV file at `path`, replacing any existing file.
///
/// Headers are taken from the first row; an empty slice leaves an empty file.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    debug!(path = %path.display(), rows = rows.len(), "CSV written");
    Ok(())
}

/// Writes every result table into `dir` and returns the written paths.
pub fn write_report(dir: &Path, result: &AnalysisResult) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let peaks: Vec<_> = result.day_types.iter().map(|r| &r.peak).collect();
    let details: Vec<_> = result.day_types.iter().flat_map(|r| &r.detail).collect();

    let hourly = dir.join("hourly.csv");
    write_csv(&hourly, &result.hourly.rows())?;
    let peaks_path = dir.join("peaks.csv");
    write_csv(&peaks_path, &peaks)?;
    let detail_path = dir.join("peak_detail.csv");
    write_csv(&detail_path, &details)?;
    let summary_path = dir.join("route_summary.csv");
    write_csv(&summary_path, &result.route_summaries)?;

    info!(dir = %dir.display(), "Report tables written");
    Ok(vec![hourly, peaks_path, detail_path, summary_path])
}

/// Plain-text rendering of a result. Passenger values are rounded up to whole
/// passengers.
pub struct TextReport<'a>(pub &'a AnalysisResult);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;
        writeln!(f, "Peak-hour analysis for: {}", result.routes.join(", "))?;
        writeln!(f)?;

        writeln!(f, "1. Hourly demand (Monday..Sunday = total passengers in hour)")?;
        write!(f, "{:<6}", "Hour")?;
        for day in WEEK {
            write!(f, "{:>10}", weekday_name(day))?;
        }
        writeln!(f, "{:>17}", DayTypeRegime::Weekday.display_name())?;
        for row in result.hourly.rows() {
            write!(f, "{:<6}", row.hour.to_string())?;
            for value in [
                row.monday,
                row.tuesday,
                row.wednesday,
                row.thursday,
                row.friday,
                row.saturday,
                row.sunday,
            ] {
                write!(f, "{:>10}", ceil_display(value))?;
            }
            writeln!(f, "{:>17}", ceil_display(row.typical_workday))?;
        }
        writeln!(f)?;

        writeln!(f, "2. Peak hours and per-route detail")?;
        for report in &result.day_types {
            let peak = &report.peak;
            writeln!(
                f,
                "{} ({}): {} {} {}",
                peak.day_type,
                peak.reduction_label,
                peak.hour_label(),
                ceil_display(peak.value),
                peak.unit_label()
            )?;
            for row in &report.detail {
                writeln!(
                    f,
                    "    {:<12}{:>10}",
                    row.route_code,
                    ceil_display(row.aggregate_value)
                )?;
            }
        }
        writeln!(f)?;

        writeln!(f, "3. Daily passengers per route")?;
        writeln!(
            f,
            "{:<12}{:>16}{:>12}{:>12}",
            "Route", "Workday mean", "Saturday", "Sunday"
        )?;
        for summary in &result.route_summaries {
            writeln!(
                f,
                "{:<12}{:>16}{:>12}{:>12}",
                summary.route_code,
                ceil_display(summary.workday_daily_mean),
                summary.saturday_total,
                summary.sunday_total
            )?;
        }
        Ok(())
    }
}
