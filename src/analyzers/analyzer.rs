use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use tracing::info;

use crate::analyzers::hourly::HourlyAggregateTable;
use crate::analyzers::peak::{PeakDetailRow, PeakRecord, locate_peak, resolve_peak_detail};
use crate::analyzers::regime::DayTypeRegime;
use crate::analyzers::summary::{RouteDailySummary, summarize_routes};
use crate::error::Error;
use crate::records::TripRecord;

/// Peak and per-route breakdown of one day type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayTypeReport {
    pub peak: PeakRecord,
    pub detail: Vec<PeakDetailRow>,
}

/// Everything the peak-hour report shows for one route selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub routes: Vec<String>,
    pub hourly: HourlyAggregateTable,
    /// One report per day type, in [`DayTypeRegime::ALL`] order.
    pub day_types: Vec<DayTypeReport>,
    pub route_summaries: Vec<RouteDailySummary>,
}

impl AnalysisResult {
    pub fn report(&self, regime: DayTypeRegime) -> Option<&DayTypeReport> {
        self.day_types.iter().find(|r| r.peak.day_type == regime)
    }

    pub fn peak(&self, regime: DayTypeRegime) -> Option<&PeakRecord> {
        self.report(regime).map(|r| &r.peak)
    }

    pub fn detail(&self, regime: DayTypeRegime) -> &[PeakDetailRow] {
        self.report(regime)
            .map(|r| r.detail.as_slice())
            .unwrap_or_default()
    }
}

/// Runs the peak-hour analysis over the records of the selected routes.
///
/// `records` should already be restricted to the wanted date range. The three
/// day types are evaluated independently over the same read-only records.
///
/// # Errors
///
/// Returns [`Error::EmptySelection`] when `routes` is empty.
pub fn analyze(records: &[TripRecord], routes: &[String]) -> Result<AnalysisResult, Error> {
    if routes.is_empty() {
        return Err(Error::EmptySelection);
    }

    let mut seen = HashSet::new();
    let routes: Vec<String> = routes
        .iter()
        .filter(|r| seen.insert(r.as_str()))
        .cloned()
        .collect();
    let selected: HashSet<&str> = routes.iter().map(String::as_str).collect();

    let filtered: Vec<TripRecord> = records
        .iter()
        .filter(|r| selected.contains(r.route_code()))
        .cloned()
        .collect();

    let hourly = HourlyAggregateTable::from_records(&filtered);

    let day_types: Vec<DayTypeReport> = DayTypeRegime::ALL
        .par_iter()
        .map(|&regime| {
            let peak = locate_peak(regime, &hourly.series(regime));
            let detail = resolve_peak_detail(&filtered, &peak);
            DayTypeReport { peak, detail }
        })
        .collect();

    let route_summaries = summarize_routes(&filtered, &routes);

    info!(
        routes = routes.len(),
        records = filtered.len(),
        weekday_peak = %day_types[0].peak.hour_label(),
        saturday_peak = %day_types[1].peak.hour_label(),
        sunday_peak = %day_types[2].peak.hour_label(),
        "Peak analysis complete"
    );

    Ok(AnalysisResult {
        routes,
        hourly,
        day_types,
        route_summaries,
    })
}
