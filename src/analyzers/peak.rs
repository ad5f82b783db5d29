//! Peak-hour location and the per-route breakdown at that hour.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

use crate::analyzers::hourly::HourlySeries;
use crate::analyzers::regime::{DayTypeRegime, day_index};
use crate::analyzers::utility::serialize_round2;
use crate::records::{HourBucket, TripRecord};

const NOT_AVAILABLE: &str = "N/A";

/// Peak of one day type's hourly series.
///
/// `hour` is `None` exactly when the series has no positive value, in which
/// case `value` is zero and the label is `N/A`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakRecord {
    pub day_type: DayTypeRegime,
    #[serde(serialize_with = "serialize_peak_hour")]
    pub hour: Option<HourBucket>,
    #[serde(serialize_with = "serialize_round2")]
    pub value: f64,
    pub reduction_label: &'static str,
}

impl PeakRecord {
    pub fn is_available(&self) -> bool {
        self.hour.is_some()
    }

    pub fn hour_label(&self) -> String {
        self.hour
            .map(|h| h.to_string())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    }

    pub fn unit_label(&self) -> &'static str {
        if self.is_available() {
            self.day_type.reduction().unit_label()
        } else {
            ""
        }
    }
}

fn serialize_peak_hour<S: Serializer>(
    hour: &Option<HourBucket>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match hour {
        Some(hour) => serializer.collect_str(hour),
        None => serializer.serialize_str(NOT_AVAILABLE),
    }
}

/// One route's contribution at a day type's peak hour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakDetailRow {
    pub route_code: String,
    #[serde(serialize_with = "serialize_round2")]
    pub aggregate_value: f64,
    pub day_type: DayTypeRegime,
    pub peak_hour: HourBucket,
}

/// Finds the hour with the largest value; ties go to the earliest hour.
pub fn locate_peak(regime: DayTypeRegime, series: &HourlySeries) -> PeakRecord {
    let mut best: Option<(HourBucket, f64)> = None;
    for hour in HourBucket::all() {
        let value = series[hour.index()];
        if value > best.map_or(0.0, |(_, v)| v) {
            best = Some((hour, value));
        }
    }

    match best {
        Some((hour, value)) => PeakRecord {
            day_type: regime,
            hour: Some(hour),
            value,
            reduction_label: regime.reduction().name(),
        },
        None => PeakRecord {
            day_type: regime,
            hour: None,
            value: 0.0,
            reduction_label: NOT_AVAILABLE,
        },
    }
}

/// Recomputes the peak hour per route with the day type's own reduction.
///
/// Records of the peak's day type and hour are summed per (route, weekday);
/// each route then folds its own weekday sums, so a route seen on three
/// weekdays is averaged over three regardless of other routes. Rows come
/// back by descending value, ties in route order. A peak without an hour
/// yields no rows.
pub fn resolve_peak_detail(records: &[TripRecord], peak: &PeakRecord) -> Vec<PeakDetailRow> {
    let Some(hour) = peak.hour else {
        return Vec::new();
    };
    let regime = peak.day_type;

    let mut per_route: BTreeMap<&str, BTreeMap<usize, u64>> = BTreeMap::new();
    for record in records
        .iter()
        .filter(|r| r.day_type() == regime && r.hour() == hour)
    {
        *per_route
            .entry(record.route_code())
            .or_default()
            .entry(day_index(record.weekday()))
            .or_default() += u64::from(record.passenger_count());
    }

    let reduction = regime.reduction();
    let mut rows: Vec<PeakDetailRow> = per_route
        .into_iter()
        .map(|(route_code, day_sums)| {
            let sums: Vec<f64> = day_sums.values().map(|v| *v as f64).collect();
            PeakDetailRow {
                route_code: route_code.to_string(),
                aggregate_value: reduction.reduce(&sums),
                day_type: regime,
                peak_hour: hour,
            }
        })
        .collect();

    rows.sort_by(|a, b| b.aggregate_value.total_cmp(&a.aggregate_value));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    // 2024-03-04 is a Monday.
    fn trip(route: &str, passengers: u32, at: &str) -> TripRecord {
        let ts = NaiveDateTime::parse_from_str(at, "%Y-%m-%d %H:%M").unwrap();
        TripRecord::new(route, passengers, ts)
    }

    fn series_with(values: &[(usize, f64)]) -> HourlySeries {
        let mut series = [0.0; HourBucket::COUNT];
        for (h, v) in values {
            series[*h] = *v;
        }
        series
    }

    fn peak_at(regime: DayTypeRegime, hour: u32) -> PeakRecord {
        PeakRecord {
            day_type: regime,
            hour: HourBucket::new(hour),
            value: 1.0,
            reduction_label: regime.reduction().name(),
        }
    }

    #[test]
    fn test_tie_goes_to_earliest_hour() {
        let series = series_with(&[(8, 50.0), (17, 50.0), (12, 20.0)]);
        let peak = locate_peak(DayTypeRegime::Weekday, &series);

        assert_eq!(peak.hour_label(), "08:00");
        assert_eq!(peak.value, 50.0);
        assert_eq!(peak.reduction_label, "Mean");
    }

    #[test]
    fn test_all_zero_series_is_not_available() {
        let peak = locate_peak(DayTypeRegime::Sunday, &[0.0; HourBucket::COUNT]);

        assert!(!peak.is_available());
        assert_eq!(peak.hour_label(), "N/A");
        assert_eq!(peak.value, 0.0);
        assert_eq!(peak.reduction_label, "N/A");
        assert_eq!(peak.unit_label(), "");
    }

    #[test]
    fn test_peak_serializes_na_hour() {
        let peak = locate_peak(DayTypeRegime::Saturday, &[0.0; HourBucket::COUNT]);
        let json = serde_json::to_value(&peak).unwrap();

        assert_eq!(json["hour"], "N/A");
        assert_eq!(json["day_type"], "saturday");
    }

    #[test]
    fn test_weekday_detail_uses_per_route_denominator() {
        let records = vec![
            // Route A: Mon/Tue/Wed at 08h -> 10, 20, 30
            trip("A", 10, "2024-03-04 08:10"),
            trip("A", 20, "2024-03-05 08:10"),
            trip("A", 30, "2024-03-06 08:10"),
            // Route B: Mon/Tue at 08h -> 5, 15
            trip("B", 5, "2024-03-04 08:20"),
            trip("B", 15, "2024-03-05 08:40"),
            // Outside the peak hour or day type
            trip("B", 100, "2024-03-07 09:00"),
            trip("B", 100, "2024-03-09 08:00"),
        ];
        let rows = resolve_peak_detail(&records, &peak_at(DayTypeRegime::Weekday, 8));

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].route_code, "A");
        assert_eq!(rows[0].aggregate_value, 20.0);
        assert_eq!(rows[1].route_code, "B");
        assert_eq!(rows[1].aggregate_value, 10.0);
        assert_eq!(rows[1].peak_hour.to_string(), "08:00");
    }

    #[test]
    fn test_weekday_detail_sums_same_weekday_across_weeks() {
        let records = vec![
            trip("A", 10, "2024-03-04 08:00"),
            trip("A", 30, "2024-03-11 08:00"),
            trip("A", 20, "2024-03-05 08:00"),
        ];
        let rows = resolve_peak_detail(&records, &peak_at(DayTypeRegime::Weekday, 8));

        // Monday sum 40, Tuesday sum 20
        assert_eq!(rows[0].aggregate_value, 30.0);
    }

    #[test]
    fn test_weekend_detail_is_a_sum_sorted_descending() {
        let records = vec![
            trip("A", 4, "2024-03-09 10:00"),
            trip("A", 4, "2024-03-16 10:30"),
            trip("B", 12, "2024-03-09 10:15"),
            trip("C", 1, "2024-03-10 10:00"),
        ];
        let rows = resolve_peak_detail(&records, &peak_at(DayTypeRegime::Saturday, 10));

        let values: Vec<(&str, f64)> = rows
            .iter()
            .map(|r| (r.route_code.as_str(), r.aggregate_value))
            .collect();
        assert_eq!(values, vec![("B", 12.0), ("A", 8.0)]);
    }

    #[test]
    fn test_unavailable_peak_skips_detail() {
        let records = vec![trip("A", 4, "2024-03-10 10:00")];
        let peak = locate_peak(DayTypeRegime::Saturday, &[0.0; HourBucket::COUNT]);

        assert!(resolve_peak_detail(&records, &peak).is_empty());
    }
}
