//! Folds per-day hourly sums into one series per day type.
//!
//! The "typical workday" column is the Weekday regime's fold: for each hour,
//! the mean of Monday..Friday sums taken over the weekdays that appear
//! anywhere in the dataset. A weekday absent from the dataset is a missing
//! day and is left out of every hour's denominator; a present weekday that
//! is quiet at some hour still contributes a zero there.

use crate::analyzers::hourly::HourlySeries;
use crate::analyzers::regime::{DayTypeRegime, day_index};
use crate::records::HourBucket;

/// Reduces the hourly sums of `regime`'s present days into one series.
///
/// With no present day the result is all zeros.
pub fn regime_series(
    regime: DayTypeRegime,
    days: &[HourlySeries; 7],
    present: &[bool; 7],
) -> HourlySeries {
    let contributing: Vec<&HourlySeries> = regime
        .days()
        .iter()
        .map(|day| day_index(*day))
        .filter(|&i| present[i])
        .map(|i| &days[i])
        .collect();

    let reduction = regime.reduction();
    let mut series = [0.0; HourBucket::COUNT];
    let mut sums = Vec::with_capacity(contributing.len());
    for hour in HourBucket::all() {
        sums.clear();
        sums.extend(contributing.iter().map(|day| day[hour.index()]));
        series[hour.index()] = reduction.reduce(&sums);
    }
    series
}

pub fn synthesize_typical_workday(days: &[HourlySeries; 7], present: &[bool; 7]) -> HourlySeries {
    regime_series(DayTypeRegime::Weekday, days, present)
}
