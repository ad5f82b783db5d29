//! Reads trip exports (CSV or spreadsheet workbooks) into raw string rows.
//!
//! Only the three columns addressed by [`ColumnLayout`] are kept. Typing and
//! validation of their contents is left to [`crate::records::normalize`].

use calamine::{Data, DataType, Reader, open_workbook_auto_from_rs};
use csv::ReaderBuilder;
use std::io::Cursor;
use tracing::debug;

use crate::config::ColumnLayout;
use crate::error::Error;

const DELIMITER_CANDIDATES: [u8; 3] = [b';', b',', b'\t'];
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

/// The three required fields of one export row, still untyped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTrip {
    pub route_code: String,
    pub passengers: String,
    pub started_at: String,
}

/// Parses an export held in memory.
///
/// Workbooks are recognized by their magic bytes; anything else is read as
/// delimited text. `delimiter` overrides CSV delimiter detection.
///
/// # Errors
///
/// Fails when the input has no header row, when a required column lies
/// beyond the header width, or when the payload is not readable at all.
pub fn parse_sheet(
    bytes: &[u8],
    layout: &ColumnLayout,
    delimiter: Option<u8>,
) -> Result<Vec<RawTrip>, Error> {
    let rows = if is_workbook(bytes) {
        parse_workbook(bytes, layout)?
    } else {
        parse_csv(bytes, layout, delimiter)?
    };
    debug!(rows = rows.len(), "Parsed export rows");
    Ok(rows)
}

pub fn is_workbook(bytes: &[u8]) -> bool {
    bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC)
}

/// Decodes text as UTF-8, falling back to Latin-1 for the whole payload.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Picks the most frequent candidate delimiter in the header line.
///
/// Ties go to `;`, the exporter's native separator.
pub fn detect_delimiter(header_line: &str) -> u8 {
    let count = |d: u8| header_line.bytes().filter(|&b| b == d).count();
    let mut best = DELIMITER_CANDIDATES[0];
    let mut best_count = count(best);
    for candidate in &DELIMITER_CANDIDATES[1..] {
        let n = count(*candidate);
        if n > best_count {
            best = *candidate;
            best_count = n;
        }
    }
    best
}

fn parse_csv(
    bytes: &[u8],
    layout: &ColumnLayout,
    delimiter: Option<u8>,
) -> Result<Vec<RawTrip>, Error> {
    let text = decode_text(bytes);
    let header_line = text
        .lines()
        .next()
        .filter(|line| !line.trim().is_empty())
        .ok_or(Error::EmptyInput)?;
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(header_line));

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let width = reader.headers()?.len();
    layout.validate(width)?;
    debug!(width, delimiter = ?char::from(delimiter), "CSV header resolved");

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let cell = |index: usize| record.get(index).unwrap_or("").to_string();
        rows.push(RawTrip {
            route_code: cell(layout.route_code),
            passengers: cell(layout.passenger_count),
            started_at: cell(layout.timestamp),
        });
    }
    Ok(rows)
}

/// Reads the first worksheet. Column positions are absolute (column A is 0)
/// and row 1 is the header, whatever the first non-empty cell is.
fn parse_workbook(bytes: &[u8], layout: &ColumnLayout) -> Result<Vec<RawTrip>, Error> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook.worksheet_range_at(0).ok_or(Error::EmptyInput)??;
    let (last_row, last_col) = range.end().ok_or(Error::EmptyInput)?;

    let width = last_col as usize + 1;
    layout.validate(width)?;
    debug!(width, start = ?range.start(), "Worksheet resolved");

    // Positions are below `width`, so they fit in u32.
    let cell = |row: u32, col: usize| cell_text(range.get_value((row, col as u32)));
    Ok((1..=last_row)
        .map(|row| RawTrip {
            route_code: cell(row, layout.route_code),
            passengers: cell(row, layout.passenger_count),
            started_at: cell(row, layout.timestamp),
        })
        .collect())
}

fn cell_text(cell: Option<&Data>) -> String {
    match cell {
        None | Some(Data::Empty) | Some(Data::Error(_)) => String::new(),
        Some(Data::String(s)) => s.trim().to_string(),
        Some(Data::Float(f)) if f.fract() == 0.0 => format!("{}", *f as i64),
        Some(Data::Float(f)) => f.to_string(),
        Some(Data::Int(i)) => i.to_string(),
        Some(Data::Bool(b)) => b.to_string(),
        Some(cell @ Data::DateTime(_)) => cell
            .as_datetime()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        Some(Data::DateTimeIso(s)) | Some(Data::DurationIso(s)) => s.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_layout() -> ColumnLayout {
        ColumnLayout {
            route_code: 0,
            passenger_count: 1,
            timestamp: 2,
        }
    }

    #[test]
    fn test_parse_semicolon_csv() {
        let csv = "Linha;Passageiros;Data Hora\n101;12;2024-03-04 08:00:00\n102;;04/03/2024 09:10\n";
        let rows = parse_sheet(csv.as_bytes(), &small_layout(), None).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].route_code, "101");
        assert_eq!(rows[0].passengers, "12");
        assert_eq!(rows[1].passengers, "");
        assert_eq!(rows[1].started_at, "04/03/2024 09:10");
    }

    #[test]
    fn test_parse_comma_csv_with_bom() {
        let csv = "\u{feff}route,pax,start\nA,3,2024-03-04 08:00:00\n";
        let rows = parse_sheet(csv.as_bytes(), &small_layout(), None).unwrap();
        assert_eq!(rows[0].route_code, "A");
    }

    #[test]
    fn test_explicit_delimiter_wins() {
        let csv = "a|b|c\nX|1|2024-03-04 08:00:00\n";
        let rows = parse_sheet(csv.as_bytes(), &small_layout(), Some(b'|')).unwrap();
        assert_eq!(rows[0].passengers, "1");
    }

    #[test]
    fn test_latin1_fallback() {
        let mut bytes = b"Linha;Passageiros;In".to_vec();
        bytes.push(0xED); // 'í' in Latin-1
        bytes.extend_from_slice(b"cio\nS\xE3o;4;2024-03-04 08:00:00\n");

        let rows = parse_sheet(&bytes, &small_layout(), None).unwrap();
        assert_eq!(rows[0].route_code, "São");
    }

    #[test]
    fn test_short_rows_read_as_empty_cells() {
        let csv = "a;b;c\nX;1\n";
        let rows = parse_sheet(csv.as_bytes(), &small_layout(), None).unwrap();
        assert_eq!(rows[0].started_at, "");
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let csv = "a;b;c\n1;2;3\n";
        let err = parse_sheet(csv.as_bytes(), &ColumnLayout::default(), None).unwrap_err();
        match err {
            Error::MissingField {
                field,
                index,
                available,
            } => {
                assert_eq!(field, crate::error::Field::RouteCode);
                assert_eq!(index, 4);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_input_is_fatal() {
        assert!(matches!(
            parse_sheet(b"", &small_layout(), None),
            Err(Error::EmptyInput)
        ));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c"), b';');
        assert_eq!(detect_delimiter("a,b,c"), b',');
        assert_eq!(detect_delimiter("a\tb\tc"), b'\t');
        assert_eq!(detect_delimiter("single"), b';');
    }

    #[test]
    fn test_workbook_magic() {
        assert!(is_workbook(b"PK\x03\x04rest"));
        assert!(is_workbook(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1]));
        assert!(!is_workbook(b"a;b;c"));
    }

    #[test]
    fn test_cell_text_renders_integers_without_fraction() {
        assert_eq!(cell_text(Some(&Data::Float(101.0))), "101");
        assert_eq!(cell_text(Some(&Data::Float(2.5))), "2.5");
        assert_eq!(cell_text(Some(&Data::String(" 7A ".into()))), "7A");
        assert_eq!(cell_text(Some(&Data::Empty)), "");
        assert_eq!(cell_text(None), "");
    }

    // Column A blank, headers in B..E, a second sheet that must be ignored.
    const BLANK_COLUMN_A: &[u8] = include_bytes!("../tests/fixtures/blank_column_a.xlsx");

    fn shifted_layout() -> ColumnLayout {
        ColumnLayout {
            route_code: 1,
            passenger_count: 2,
            timestamp: 3,
        }
    }

    #[test]
    fn test_workbook_positions_count_from_column_a() {
        let rows = parse_sheet(BLANK_COLUMN_A, &shifted_layout(), None).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            RawTrip {
                route_code: "101".to_string(),
                passengers: "30".to_string(),
                started_at: "2024-03-05 07:30:00".to_string(),
            }
        );
        assert_eq!(rows[1].route_code, "202");
        assert_eq!(rows[1].passengers, "12");
        assert_eq!(rows[1].started_at, "07/03/2024 18:20");
    }

    #[test]
    fn test_workbook_width_includes_blank_leading_column() {
        let layout = ColumnLayout {
            timestamp: 4,
            ..shifted_layout()
        };
        let rows = parse_sheet(BLANK_COLUMN_A, &layout, None).unwrap();
        assert_eq!(rows[0].started_at, "2024-03-05 08:00:00");

        let layout = ColumnLayout {
            timestamp: 5,
            ..shifted_layout()
        };
        match parse_sheet(BLANK_COLUMN_A, &layout, None).unwrap_err() {
            Error::MissingField {
                index, available, ..
            } => {
                assert_eq!(index, 5);
                assert_eq!(available, 5);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
