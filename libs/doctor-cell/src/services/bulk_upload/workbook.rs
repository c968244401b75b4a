use std::io::Cursor;
use std::iter;

use calamine::{open_workbook_from_rs, Data, DataType, Reader, Xlsx};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::error::BulkUploadError;

/// A spreadsheet cell, detached from the reader library.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// Empty, or text made only of whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Cells a spreadsheet user would consider "not filled in".
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Number(n) => *n == 0.0,
            CellValue::Bool(b) => !b,
            _ => false,
        }
    }

    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            CellValue::Number(n) => n.to_string(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Date(d) => d.to_string(),
            CellValue::Time(t) => t.to_string(),
            CellValue::DateTime(dt) => dt.to_string(),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(cell: &Data) -> Self {
        match cell {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(serial) => match cell.as_datetime() {
                Some(dt) => from_excel_serial(serial.as_f64(), dt),
                None => CellValue::Number(serial.as_f64()),
            },
            Data::DateTimeIso(s) => from_iso(s),
            Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(e) => CellValue::Text(format!("#{:?}", e)),
        }
    }
}

// Excel stores dates as day counts and times as fractions of a day.
fn from_excel_serial(serial: f64, dt: NaiveDateTime) -> CellValue {
    if serial < 1.0 {
        CellValue::Time(dt.time())
    } else if serial.fract() == 0.0 {
        CellValue::Date(dt.date())
    } else {
        CellValue::DateTime(dt)
    }
}

fn from_iso(raw: &str) -> CellValue {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        CellValue::DateTime(dt)
    } else if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        CellValue::Date(date)
    } else if let Ok(time) = NaiveTime::parse_from_str(raw, "%H:%M:%S%.f") {
        CellValue::Time(time)
    } else {
        CellValue::Text(raw.to_string())
    }
}

/// First worksheet as a rectangular grid anchored at A1.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetGrid {
    pub headers: Vec<CellValue>,
    pub rows: Vec<Vec<CellValue>>,
}

/// Reads the first sheet of an `.xlsx` workbook held in memory.
///
/// The workbook handle is dropped before returning on every path.
pub fn read_first_sheet(bytes: &[u8]) -> Result<SheetGrid, BulkUploadError> {
    let mut workbook: Xlsx<Cursor<&[u8]>> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e: calamine::XlsxError| processing_error(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| processing_error("workbook contains no worksheets"))?
        .map_err(|e| processing_error(e.to_string()))?;

    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let pad = start_col as usize;

    let mut grid: Vec<Vec<CellValue>> = range
        .rows()
        .map(|row| {
            iter::repeat(CellValue::Empty)
                .take(pad)
                .chain(row.iter().map(CellValue::from))
                .collect()
        })
        .collect();

    // Leading blank rows are trimmed by the reader; A1 must still hold the header.
    if start_row > 0 {
        grid.insert(0, Vec::new());
    }

    let mut rows = grid.into_iter();
    let headers = rows
        .next()
        .ok_or_else(|| processing_error("worksheet is empty"))?;

    Ok(SheetGrid {
        headers,
        rows: rows.collect(),
    })
}

fn processing_error(detail: impl std::fmt::Display) -> BulkUploadError {
    BulkUploadError::MalformedWorkbook(format!("Processing error: {}", detail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_blank_and_missing() {
        assert!(CellValue::Empty.is_blank());
        assert!(CellValue::text("   ").is_blank());
        assert!(!CellValue::text("   ").is_missing());
        assert!(CellValue::text("").is_missing());
        assert!(CellValue::Number(0.0).is_missing());
        assert!(!CellValue::text("drsmith").is_blank());
    }

    #[test]
    fn test_as_text_drops_integral_fraction() {
        assert_eq!(CellValue::Number(12345.0).as_text(), "12345");
        assert_eq!(CellValue::Number(1.5).as_text(), "1.5");
    }

    #[test]
    fn test_excel_serial_classification() {
        let dt = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(from_excel_serial(45444.0, dt), CellValue::Date(dt.date()));

        let morning = NaiveDate::from_ymd_opt(1899, 12, 31).unwrap().and_hms_opt(9, 0, 0).unwrap();
        assert_eq!(from_excel_serial(0.375, morning), CellValue::Time(morning.time()));

        let both = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
        assert_eq!(from_excel_serial(45444.375, both), CellValue::DateTime(both));
    }

    #[test]
    fn test_iso_cells() {
        assert_eq!(from_iso("2024-06-01"), CellValue::Date(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()));
        assert_eq!(from_iso("09:30:00"), CellValue::Time(NaiveTime::from_hms_opt(9, 30, 0).unwrap()));
        assert_eq!(from_iso("garbage"), CellValue::text("garbage"));
    }

    #[test]
    fn test_corrupt_bytes_are_a_processing_error() {
        assert_matches!(
            read_first_sheet(b"definitely not a zip archive"),
            Err(BulkUploadError::MalformedWorkbook(msg)) if msg.starts_with("Processing error:")
        );
    }
}
