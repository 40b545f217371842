//! Workbook ingestion (`.xlsx`, `.xlsm`, `.xlsb`, `.xls`, `.ods`).
//!
//! Decoding is delegated to `calamine`; this module owns the mapping from a sheet's cell grid to
//! [`Record`]s:
//!
//! - the first row of the sheet's used range is the header row
//! - every later row becomes one record keyed by those headers
//! - empty cells (and the missing tail of a short row) are left out of the record
//! - numbers stay numbers, booleans stay booleans, date cells follow [`DateRepresentation`]

use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Cursor;

use calamine::{Data, ExcelDateTime, Ods, Range, Reader, Sheets, Xls, Xlsb, Xlsx};
use chrono::{NaiveDate, NaiveDateTime};
use rayon::prelude::*;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{CellValue, Record, SheetSet, ISO_DATETIME};

use super::sniff::{workbook_flavor, WorkbookFlavor};

const EMPTY_HEADER: &str = "__EMPTY";

/// How date cells are represented in records.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DateRepresentation {
    /// [`CellValue::Date`] (default).
    #[default]
    DateTime,
    /// The raw Excel serial number as [`CellValue::Number`].
    Serial,
    /// [`CellValue::Text`] rendered with a `chrono` format pattern, e.g. `"%Y-%m-%d"`.
    Formatted(String),
}

/// Options controlling how sheets map to records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularOptions {
    /// Date cell representation.
    pub dates: DateRepresentation,
    /// Drop data rows whose cells are all empty instead of emitting empty records.
    pub skip_blank_rows: bool,
}

impl Default for TabularOptions {
    fn default() -> Self {
        Self {
            dates: DateRepresentation::default(),
            skip_blank_rows: true,
        }
    }
}

type WorkbookReader<'a> = Sheets<Cursor<&'a [u8]>>;

fn open_workbook(bytes: &[u8]) -> IngestionResult<WorkbookReader<'_>> {
    let cursor = Cursor::new(bytes);
    let sheets = match workbook_flavor(bytes)? {
        WorkbookFlavor::Xlsx => Sheets::Xlsx(Xlsx::new(cursor).map_err(calamine::Error::from)?),
        WorkbookFlavor::Xlsb => Sheets::Xlsb(Xlsb::new(cursor).map_err(calamine::Error::from)?),
        WorkbookFlavor::Xls => Sheets::Xls(Xls::new(cursor).map_err(calamine::Error::from)?),
        WorkbookFlavor::Ods => Sheets::Ods(Ods::new(cursor).map_err(calamine::Error::from)?),
    };
    Ok(sheets)
}

/// Sheet names in workbook order.
pub fn sheet_names(bytes: &[u8]) -> IngestionResult<Vec<String>> {
    Ok(open_workbook(bytes)?.sheet_names().to_vec())
}

/// Read the first sheet (in the workbook's own ordering) into records.
///
/// Fails with [`IngestionError::MissingSheet`] when the workbook has no sheets: "first sheet" has
/// no referent there, so an empty result would be a lie.
pub fn read_first_sheet(bytes: &[u8], options: &TabularOptions) -> IngestionResult<Vec<Record>> {
    let mut workbook = open_workbook(bytes)?;
    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(IngestionError::MissingSheet { sheet: None })?;
    let range = workbook.worksheet_range(&first)?;
    Ok(records_from_range(&range, options))
}

/// Read a single sheet by name.
pub fn read_sheet(bytes: &[u8], name: &str, options: &TabularOptions) -> IngestionResult<Vec<Record>> {
    let mut workbook = open_workbook(bytes)?;
    if !workbook.sheet_names().iter().any(|s| s == name) {
        return Err(IngestionError::MissingSheet {
            sheet: Some(name.to_string()),
        });
    }
    let range = workbook.worksheet_range(name)?;
    Ok(records_from_range(&range, options))
}

/// Read every sheet into records, keyed by sheet name in workbook order.
///
/// A workbook without sheets yields an empty [`SheetSet`].
pub fn read_all_sheets(bytes: &[u8], options: &TabularOptions) -> IngestionResult<SheetSet> {
    let mut workbook = open_workbook(bytes)?;

    // Decoding needs `&mut` access to the workbook, so ranges are pulled sequentially; the
    // cell-to-record conversion is independent per sheet.
    let mut ranges: Vec<(String, Range<Data>)> = Vec::new();
    for name in workbook.sheet_names().to_vec() {
        let range = workbook.worksheet_range(&name)?;
        ranges.push((name, range));
    }

    let sheets: Vec<(String, Vec<Record>)> = ranges
        .into_par_iter()
        .map(|(name, range)| {
            let records = records_from_range(&range, options);
            (name, records)
        })
        .collect();

    Ok(SheetSet::from_sheets(sheets))
}

fn records_from_range(range: &Range<Data>, options: &TabularOptions) -> Vec<Record> {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Vec::new();
    };
    let headers = header_labels(header_row, &options.dates);

    let mut records = Vec::new();
    for row in rows {
        let record: Record = headers
            .iter()
            .zip(row.iter())
            .filter_map(|(header, cell)| {
                convert_cell(cell, &options.dates).map(|value| (header.as_str(), value))
            })
            .collect();

        if record.is_empty() && options.skip_blank_rows {
            continue;
        }
        records.push(record);
    }
    records
}

/// Header labels for a header row, made unique.
///
/// Empty header cells are labelled `__EMPTY`; repeated labels get `_1`, `_2`, ... appended,
/// skipping candidates that already occur in the row.
fn header_labels(row: &[Data], dates: &DateRepresentation) -> Vec<String> {
    let raw: Vec<String> = row
        .iter()
        .map(|cell| {
            convert_cell(cell, dates)
                .map(|v| v.to_string())
                .unwrap_or_default()
        })
        .collect();

    let mut counts: HashMap<String, usize> = HashMap::new();
    for label in &raw {
        if !label.is_empty() {
            counts.entry(label.clone()).or_insert(0);
        }
    }

    let mut used: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(raw.len());
    for label in raw {
        let base = if label.is_empty() {
            EMPTY_HEADER.to_string()
        } else {
            label
        };
        let label = match used.get(&base).copied() {
            None => {
                used.insert(base.clone(), 1);
                base
            }
            Some(mut n) => {
                let candidate = loop {
                    let candidate = format!("{base}_{n}");
                    n += 1;
                    if !used.contains_key(&candidate) && !counts.contains_key(&candidate) {
                        break candidate;
                    }
                };
                used.insert(base, n);
                used.insert(candidate.clone(), 1);
                candidate
            }
        };
        out.push(label);
    }
    out
}

fn convert_cell(cell: &Data, dates: &DateRepresentation) -> Option<CellValue> {
    match cell {
        Data::Empty => None,
        Data::String(s) => Some(CellValue::Text(s.clone())),
        Data::Int(i) => Some(CellValue::Number(*i as f64)),
        Data::Float(f) => Some(CellValue::Number(*f)),
        Data::Bool(b) => Some(CellValue::Bool(*b)),
        Data::DateTime(dt) => Some(convert_excel_datetime(dt, dates)),
        Data::DateTimeIso(s) => Some(convert_iso_datetime(s, dates)),
        Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
        Data::Error(e) => Some(CellValue::Text(e.to_string())),
    }
}

fn convert_excel_datetime(dt: &ExcelDateTime, dates: &DateRepresentation) -> CellValue {
    let serial = dt.as_f64();
    if dt.is_duration() {
        return CellValue::Number(serial);
    }
    match (dates, dt.as_datetime()) {
        (DateRepresentation::Serial, _) | (_, None) => CellValue::Number(serial),
        (DateRepresentation::DateTime, Some(d)) => CellValue::Date(d),
        (DateRepresentation::Formatted(pattern), Some(d)) => CellValue::Text(format_date(&d, pattern)),
    }
}

fn convert_iso_datetime(s: &str, dates: &DateRepresentation) -> CellValue {
    let Some(d) = parse_iso_datetime(s) else {
        return CellValue::Text(s.to_string());
    };
    match dates {
        DateRepresentation::DateTime => CellValue::Date(d),
        DateRepresentation::Serial => CellValue::Number(excel_serial(&d)),
        DateRepresentation::Formatted(pattern) => CellValue::Text(format_date(&d, pattern)),
    }
}

fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, ISO_DATETIME)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Days since 1899-12-30, the 1900 date system's effective epoch for serials after Feb 1900.
fn excel_serial(d: &NaiveDateTime) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|e| e.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    (*d - epoch).num_milliseconds() as f64 / 86_400_000.0
}

/// Render with a user pattern, falling back to ISO-8601 if the pattern is invalid.
fn format_date(d: &NaiveDateTime, pattern: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", d.format(pattern)).is_err() {
        return d.format(ISO_DATETIME).to_string();
    }
    out
}
