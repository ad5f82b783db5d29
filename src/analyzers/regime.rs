//! Day-type classification and the reduction each day type aggregates with.

use chrono::Weekday;
use serde::Serialize;
use std::fmt;

use crate::analyzers::utility::mean;

/// Monday-first calendar week.
pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

const WORKDAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

/// How per-day passenger sums are combined into one value.
///
/// Both reductions start from sums grouped per weekday; they differ only in
/// how several weekdays are folded together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// Total over all contributing days.
    Sum,
    /// Arithmetic mean over the days that contributed at least one record.
    MeanOfSums,
}

impl Reduction {
    pub fn reduce(self, day_sums: &[f64]) -> f64 {
        match self {
            Reduction::Sum => day_sums.iter().sum(),
            Reduction::MeanOfSums => mean(day_sums),
        }
    }

    pub fn is_two_stage(self) -> bool {
        matches!(self, Reduction::MeanOfSums)
    }

    /// Short name shown next to peak metrics.
    pub fn name(self) -> &'static str {
        match self {
            Reduction::Sum => "Sum",
            Reduction::MeanOfSums => "Mean",
        }
    }

    pub fn unit_label(self) -> &'static str {
        match self {
            Reduction::Sum => "passengers (total in hour)",
            Reduction::MeanOfSums => "passengers (mean of hourly sums)",
        }
    }
}

/// Aggregation regime of a calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayTypeRegime {
    Weekday,
    Saturday,
    Sunday,
}

impl DayTypeRegime {
    pub const ALL: [DayTypeRegime; 3] = [
        DayTypeRegime::Weekday,
        DayTypeRegime::Saturday,
        DayTypeRegime::Sunday,
    ];

    /// The only place a weekday is mapped to a regime.
    pub fn of(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Sat => DayTypeRegime::Saturday,
            Weekday::Sun => DayTypeRegime::Sunday,
            _ => DayTypeRegime::Weekday,
        }
    }

    /// Weekdays classified under this regime.
    pub fn days(self) -> &'static [Weekday] {
        match self {
            DayTypeRegime::Weekday => &WORKDAYS,
            DayTypeRegime::Saturday => &[Weekday::Sat],
            DayTypeRegime::Sunday => &[Weekday::Sun],
        }
    }

    pub fn reduction(self) -> Reduction {
        match self {
            DayTypeRegime::Weekday => Reduction::MeanOfSums,
            DayTypeRegime::Saturday | DayTypeRegime::Sunday => Reduction::Sum,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            DayTypeRegime::Weekday => "Typical Workday",
            DayTypeRegime::Saturday => "Saturday",
            DayTypeRegime::Sunday => "Sunday",
        }
    }
}

impl fmt::Display for DayTypeRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Monday-based position, used to index per-day columns.
pub(crate) fn day_index(weekday: Weekday) -> usize {
    weekday.num_days_from_monday() as usize
}

pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        for day in WORKDAYS {
            assert_eq!(DayTypeRegime::of(day), DayTypeRegime::Weekday);
        }
        assert_eq!(DayTypeRegime::of(Weekday::Sat), DayTypeRegime::Saturday);
        assert_eq!(DayTypeRegime::of(Weekday::Sun), DayTypeRegime::Sunday);
    }

    #[test]
    fn test_days_round_trip_through_classifier() {
        for regime in DayTypeRegime::ALL {
            for day in regime.days() {
                assert_eq!(DayTypeRegime::of(*day), regime);
            }
        }
        let covered: usize = DayTypeRegime::ALL.iter().map(|r| r.days().len()).sum();
        assert_eq!(covered, 7);
    }

    #[test]
    fn test_reductions() {
        assert_eq!(Reduction::Sum.reduce(&[10.0, 20.0, 30.0]), 60.0);
        assert_eq!(Reduction::MeanOfSums.reduce(&[10.0, 20.0, 30.0]), 20.0);
        assert_eq!(Reduction::Sum.reduce(&[]), 0.0);
        assert_eq!(Reduction::MeanOfSums.reduce(&[]), 0.0);
    }

    #[test]
    fn test_only_weekday_is_two_stage() {
        assert!(DayTypeRegime::Weekday.reduction().is_two_stage());
        assert!(!DayTypeRegime::Saturday.reduction().is_two_stage());
        assert!(!DayTypeRegime::Sunday.reduction().is_two_stage());
    }

    #[test]
    fn test_day_index_is_monday_based() {
        assert_eq!(day_index(Weekday::Mon), 0);
        assert_eq!(day_index(Weekday::Sun), 6);
    }
}
