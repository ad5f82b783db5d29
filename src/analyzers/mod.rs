//! Peak-hour demand analysis.
//!
//! Trip records are summed per (weekday, hour) into a dense table, folded per
//! day type (Weekday, Saturday, Sunday) with that day type's reduction, and
//! scanned for the peak hour. The peak is then broken down per route using
//! the same reduction.

pub mod analyzer;
pub mod hourly;
pub mod peak;
pub mod regime;
pub mod summary;
pub mod utility;
pub mod workday;

pub use analyzer::{AnalysisResult, DayTypeReport, analyze};
pub use hourly::{HourlyAggregateTable, HourlyRow, HourlySeries};
pub use peak::{PeakDetailRow, PeakRecord, locate_peak, resolve_peak_detail};
pub use regime::{DayTypeRegime, Reduction};
pub use summary::{RouteDailySummary, summarize_routes};
