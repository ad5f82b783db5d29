//! Dense hour-by-weekday passenger table.

use chrono::Weekday;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use tracing::debug;

use crate::analyzers::regime::{DayTypeRegime, WEEK, day_index};
use crate::analyzers::utility::serialize_round2;
use crate::analyzers::workday::{regime_series, synthesize_typical_workday};
use crate::records::{HourBucket, TripRecord};

/// One value per hour bucket, `00:00` first.
pub type HourlySeries = [f64; HourBucket::COUNT];

/// Passenger sums per (hour, weekday) plus the synthesized typical workday.
///
/// Always 24 hours by 7 weekdays; cells without records hold zero.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyAggregateTable {
    days: [HourlySeries; 7],
    present: [bool; 7],
    typical_workday: HourlySeries,
}

/// A rendered row of [`HourlyAggregateTable`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyRow {
    pub hour: HourBucket,
    #[serde(serialize_with = "serialize_round2")]
    pub monday: f64,
    #[serde(serialize_with = "serialize_round2")]
    pub tuesday: f64,
    #[serde(serialize_with = "serialize_round2")]
    pub wednesday: f64,
    #[serde(serialize_with = "serialize_round2")]
    pub thursday: f64,
    #[serde(serialize_with = "serialize_round2")]
    pub friday: f64,
    #[serde(serialize_with = "serialize_round2")]
    pub saturday: f64,
    #[serde(serialize_with = "serialize_round2")]
    pub sunday: f64,
    #[serde(serialize_with = "serialize_round2")]
    pub typical_workday: f64,
}

impl HourlyAggregateTable {
    /// Groups `records` by (weekday, hour) with a single pass, then reshapes
    /// the sums into dense per-weekday columns.
    pub fn from_records(records: &[TripRecord]) -> Self {
        let mut cells: HashMap<(Weekday, HourBucket), u64> = HashMap::new();
        let mut present = [false; 7];

        for record in records {
            *cells.entry((record.weekday(), record.hour())).or_default() +=
                u64::from(record.passenger_count());
            present[day_index(record.weekday())] = true;
        }

        let mut days = [[0.0; HourBucket::COUNT]; 7];
        for ((weekday, hour), total) in cells {
            days[day_index(weekday)][hour.index()] = total as f64;
        }

        let typical_workday = synthesize_typical_workday(&days, &present);
        debug!(
            records = records.len(),
            present_days = present.iter().filter(|p| **p).count(),
            "Hourly aggregate built"
        );

        Self {
            days,
            present,
            typical_workday,
        }
    }

    pub fn day(&self, weekday: Weekday) -> &HourlySeries {
        &self.days[day_index(weekday)]
    }

    pub fn typical_workday(&self) -> &HourlySeries {
        &self.typical_workday
    }

    /// Whether `weekday` has at least one record in the aggregated set.
    pub fn is_present(&self, weekday: Weekday) -> bool {
        self.present[day_index(weekday)]
    }

    pub fn present_days(&self) -> Vec<Weekday> {
        WEEK.into_iter().filter(|d| self.is_present(*d)).collect()
    }

    /// The column a day type's peak is located on.
    pub fn series(&self, regime: DayTypeRegime) -> HourlySeries {
        regime_series(regime, &self.days, &self.present)
    }

    pub fn rows(&self) -> Vec<HourlyRow> {
        HourBucket::all()
            .map(|hour| {
                let h = hour.index();
                let at = |weekday: Weekday| self.day(weekday)[h];
                HourlyRow {
                    hour,
                    monday: at(Weekday::Mon),
                    tuesday: at(Weekday::Tue),
                    wednesday: at(Weekday::Wed),
                    thursday: at(Weekday::Thu),
                    friday: at(Weekday::Fri),
                    saturday: at(Weekday::Sat),
                    sunday: at(Weekday::Sun),
                    typical_workday: self.typical_workday[h],
                }
            })
            .collect()
    }
}

impl Serialize for HourlyAggregateTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rows())
    }
}
