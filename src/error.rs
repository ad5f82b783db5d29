//! Error types for ingestion and analysis.

use std::{fmt, io};
use thiserror::Error;

/// The three fields every trip row must provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    RouteCode,
    PassengerCount,
    Timestamp,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::RouteCode => "route code",
            Field::PassengerCount => "passenger count",
            Field::Timestamp => "trip start timestamp",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("Json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(
        "Missing required field '{field}': expected column {index} (zero-based) but the sheet only has {available} columns"
    )]
    MissingField {
        field: Field,
        index: usize,
        available: usize,
    },
    #[error("Input has no header row")]
    EmptyInput,
    #[error("No routes selected for analysis")]
    EmptySelection,
}
