//! Per-route daily passenger summary.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::analyzers::regime::DayTypeRegime;
use crate::analyzers::utility::{mean, serialize_round2};
use crate::records::TripRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteDailySummary {
    pub route_code: String,
    /// Mean daily total over the Mon..Fri dates the route ran.
    #[serde(serialize_with = "serialize_round2")]
    pub workday_daily_mean: f64,
    pub saturday_total: u64,
    pub sunday_total: u64,
}

#[derive(Default)]
struct RouteTotals {
    workday_by_date: BTreeMap<NaiveDate, u64>,
    saturday: u64,
    sunday: u64,
}

/// Summarizes each of `routes`, in the given order. Routes without records
/// summarize to zeros.
pub fn summarize_routes(records: &[TripRecord], routes: &[String]) -> Vec<RouteDailySummary> {
    let mut totals: HashMap<&str, RouteTotals> = HashMap::new();
    for record in records {
        let entry = totals.entry(record.route_code()).or_default();
        let passengers = u64::from(record.passenger_count());
        match record.day_type() {
            DayTypeRegime::Weekday => {
                *entry
                    .workday_by_date
                    .entry(record.calendar_date())
                    .or_default() += passengers
            }
            DayTypeRegime::Saturday => entry.saturday += passengers,
            DayTypeRegime::Sunday => entry.sunday += passengers,
        }
    }

    routes
        .iter()
        .map(|route| match totals.get(route.as_str()) {
            Some(t) => {
                let daily: Vec<f64> = t.workday_by_date.values().map(|v| *v as f64).collect();
                RouteDailySummary {
                    route_code: route.clone(),
                    workday_daily_mean: mean(&daily),
                    saturday_total: t.saturday,
                    sunday_total: t.sunday,
                }
            }
            None => RouteDailySummary {
                route_code: route.clone(),
                workday_daily_mean: 0.0,
                saturday_total: 0,
                sunday_total: 0,
            },
        })
        .collect()
}
