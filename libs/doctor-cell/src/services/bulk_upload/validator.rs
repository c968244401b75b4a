use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use tracing::debug;

use shared_models::formats::{parse_date, parse_time};

use super::error::BulkUploadError;
use super::workbook::{read_first_sheet, CellValue, SheetGrid};

pub const REQUIRED_HEADERS: [&str; 4] = ["doctor_username", "date", "start_time", "end_time"];

pub const USERNAME_EMPTY: &str = "doctor_username cannot be empty";
pub const DATE_EMPTY: &str = "date cannot be empty";
pub const DATE_FORMAT_INVALID: &str = "date must be in DD-MM-YYYY format";
pub const START_TIME_FORMAT_INVALID: &str = "start_time must be in HH:MM format";
pub const END_TIME_FORMAT_INVALID: &str = "end_time must be in HH:MM format";
pub const END_NOT_AFTER_START: &str = "end_time must be after start_time";
pub const TIME_COMPARISON_INVALID: &str = "invalid time format for comparison";
pub const DUPLICATE_ENTRY: &str = "duplicate entry for this doctor, date, start_time and end_time";

/// One data row in fixed column order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub doctor_username: CellValue,
    pub date: CellValue,
    pub start_time: CellValue,
    pub end_time: CellValue,
}

impl RawRow {
    pub fn from_cells(cells: Vec<CellValue>) -> Option<Self> {
        let [doctor_username, date, start_time, end_time]: [CellValue; 4] = cells.try_into().ok()?;
        Some(Self {
            doctor_username,
            date,
            start_time,
            end_time,
        })
    }
}

/// A row that passed every check. `end_time > start_time` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedRecord {
    doctor_username: String,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
}

impl ValidatedRecord {
    pub fn new(
        doctor_username: impl Into<String>,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    ) -> Option<Self> {
        (end_time > start_time).then(|| Self {
            doctor_username: doctor_username.into(),
            date,
            start_time,
            end_time,
        })
    }

    pub fn doctor_username(&self) -> &str {
        &self.doctor_username
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn start_time(&self) -> NaiveTime {
        self.start_time
    }

    pub fn end_time(&self) -> NaiveTime {
        self.end_time
    }
}

/// Every failed check for one data row. `row_number` is 1-based, header excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub row_number: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid(Vec<ValidatedRecord>),
    Invalid(Vec<RowError>),
}

type DedupKey = (String, NaiveDate, NaiveTime, NaiveTime);

/// Parses an uploaded workbook and validates all of its data rows.
pub fn validate_upload(bytes: &[u8]) -> Result<ValidationOutcome, BulkUploadError> {
    let grid = read_first_sheet(bytes)?;
    validate_grid(grid)
}

pub fn validate_grid(grid: SheetGrid) -> Result<ValidationOutcome, BulkUploadError> {
    check_headers(&grid.headers)?;

    let rows = grid
        .rows
        .into_iter()
        .map(|cells| {
            RawRow::from_cells(cells).ok_or_else(|| {
                BulkUploadError::MalformedWorkbook(
                    "Processing error: data row does not have exactly four columns".to_string(),
                )
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(validate_rows(&rows))
}

pub fn check_headers(headers: &[CellValue]) -> Result<(), BulkUploadError> {
    let matches = headers.len() == REQUIRED_HEADERS.len()
        && headers
            .iter()
            .zip(REQUIRED_HEADERS)
            .all(|(cell, expected)| matches!(cell, CellValue::Text(s) if s == expected));

    if matches {
        return Ok(());
    }

    let actual: Vec<String> = headers.iter().map(CellValue::as_text).collect();
    Err(BulkUploadError::MalformedWorkbook(format!(
        "Invalid headers. Expected: {:?}, Got: {:?}",
        REQUIRED_HEADERS, actual
    )))
}

/// Validates rows without short-circuiting; any row error rejects the batch.
pub fn validate_rows(rows: &[RawRow]) -> ValidationOutcome {
    let mut records = Vec::with_capacity(rows.len());
    let mut row_errors = Vec::new();
    let mut seen: HashSet<DedupKey> = HashSet::new();

    for (index, row) in rows.iter().enumerate() {
        match validate_row(row, &mut seen) {
            Ok(record) => records.push(record),
            Err(errors) => row_errors.push(RowError {
                row_number: index + 1,
                errors,
            }),
        }
    }

    debug!(
        "Validated {} rows: {} accepted, {} rejected",
        rows.len(),
        records.len(),
        row_errors.len()
    );

    if row_errors.is_empty() {
        ValidationOutcome::Valid(records)
    } else {
        ValidationOutcome::Invalid(row_errors)
    }
}

fn validate_row(row: &RawRow, seen: &mut HashSet<DedupKey>) -> Result<ValidatedRecord, Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    let username = if row.doctor_username.is_blank() {
        errors.push(USERNAME_EMPTY.to_string());
        None
    } else {
        Some(row.doctor_username.as_text())
    };

    // Both date checks run; a blank cell reports both.
    if row.date.is_missing() {
        errors.push(DATE_EMPTY.to_string());
    }
    let date = coerce_date(&row.date);
    if date.is_none() {
        errors.push(DATE_FORMAT_INVALID.to_string());
    }

    let start = coerce_time(&row.start_time);
    if start.is_none() {
        errors.push(START_TIME_FORMAT_INVALID.to_string());
    }

    let end = coerce_time(&row.end_time);
    if end.is_none() {
        errors.push(END_TIME_FORMAT_INVALID.to_string());
    }

    if !row.start_time.is_missing() && !row.end_time.is_missing() {
        match (start, end) {
            (Some(start), Some(end)) if end <= start => errors.push(END_NOT_AFTER_START.to_string()),
            (Some(_), Some(_)) => {}
            _ => errors.push(TIME_COMPARISON_INVALID.to_string()),
        }
    }

    // Each missing value has already reported its own error.
    let (Some(username), Some(date), Some(start), Some(end)) = (username, date, start, end) else {
        return Err(errors);
    };

    // Keys are only built from fully coerced values.
    if !seen.insert((username.clone(), date, start, end)) {
        errors.push(DUPLICATE_ENTRY.to_string());
    }

    match ValidatedRecord::new(username, date, start, end) {
        Some(record) if errors.is_empty() => Ok(record),
        _ => Err(errors),
    }
}

/// Native dates are taken as-is; text must be `DD-MM-YYYY`.
fn coerce_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::Date(date) => Some(*date),
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::Text(raw) => parse_date(raw),
        _ => None,
    }
}

/// Native times are taken as-is; text must contain a colon and be `HH:MM`.
fn coerce_time(cell: &CellValue) -> Option<NaiveTime> {
    match cell {
        CellValue::Time(time) => Some(*time),
        CellValue::DateTime(dt) => Some(dt.time()),
        CellValue::Text(raw) if raw.contains(':') => parse_time(raw),
        _ => None,
    }
}
