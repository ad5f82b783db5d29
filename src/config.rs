//! Positional layout of the trip export.

use crate::error::{Error, Field};
use serde::{Deserialize, Serialize};

/// Zero-based column positions of the fields the analysis needs.
///
/// Stored as a plain JSON object on disk:
/// ```json
/// { "route_code": 4, "passenger_count": 28, "timestamp": 42 }
/// ```
/// Missing keys fall back to the defaults (columns E, AC and AQ of the
/// operator's trip export).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    pub route_code: usize,
    pub passenger_count: usize,
    pub timestamp: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            route_code: 4,
            passenger_count: 28,
            timestamp: 42,
        }
    }
}

impl ColumnLayout {
    /// Loads the layout from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn with_overrides(
        mut self,
        route_code: Option<usize>,
        passenger_count: Option<usize>,
        timestamp: Option<usize>,
    ) -> Self {
        if let Some(index) = route_code {
            self.route_code = index;
        }
        if let Some(index) = passenger_count {
            self.passenger_count = index;
        }
        if let Some(index) = timestamp {
            self.timestamp = index;
        }
        self
    }

    /// Checks every field resolves against a header of `width` columns.
    ///
    /// Fields are checked in route, passengers, timestamp order and the first
    /// one out of range is reported.
    pub fn validate(&self, width: usize) -> Result<(), Error> {
        let fields = [
            (Field::RouteCode, self.route_code),
            (Field::PassengerCount, self.passenger_count),
            (Field::Timestamp, self.timestamp),
        ];
        match fields.into_iter().find(|(_, index)| *index >= width) {
            Some((field, index)) => Err(Error::MissingField {
                field,
                index,
                available: width,
            }),
            None => Ok(()),
        }
    }
}
