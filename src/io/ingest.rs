//! Ingest of `year;hdi;tapPrevalence` records.
//!
//! Design goals:
//! - **Lenient rows**: a line with the wrong field count or a non-numeric
//!   field is dropped, never fatal for the batch
//! - **Reported drops**: dropped lines are kept as `RowError`s and logged
//! - **Order-free**: records are parsed in parallel; downstream code never
//!   depends on entry order
//!
//! An input where every line is malformed yields an empty entry set; the fit
//! stage then reports `InsufficientData` per year.

use std::fs::File;
use std::io::{Read, stdin};
use std::path::Path;

use csv::StringRecord;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::{Entry, parse_fields};
use crate::error::AppError;

/// A line that was dropped during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: parsed entries + what was dropped.
#[derive(Debug, Clone)]
pub struct IngestedEntries {
    pub entries: Vec<Entry>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Read entries from a file path, or from stdin when `path` is `None`.
pub fn load_entries(path: Option<&Path>) -> Result<IngestedEntries, AppError> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .map_err(|e| AppError::new(2, format!("Failed to open input '{}': {e}", path.display())))?;
            read_entries(file)
        }
        None => read_entries(stdin().lock()),
    }
}

/// Read all records from `reader`.
///
/// Only an I/O failure of the underlying reader is an error; bad lines are
/// collected in `row_errors`.
pub fn read_entries<R: Read>(reader: R) -> Result<IngestedEntries, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    let mut row_errors = Vec::new();

    for result in reader.records() {
        match result {
            Ok(record) => {
                let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
                records.push((line, record));
            }
            Err(e) => {
                if e.is_io_error() {
                    return Err(AppError::new(2, format!("Failed to read input: {e}")));
                }
                let line = e.position().map(|p| p.line() as usize).unwrap_or(0);
                row_errors.push(RowError {
                    line,
                    message: format!("unreadable record: {e}"),
                });
            }
        }
    }
    let rows_read = records.len() + row_errors.len();

    let parsed: Vec<(usize, Result<Entry, String>)> = records
        .par_iter()
        .map(|(line, record)| (*line, parse_record(record)))
        .collect();

    let mut entries = Vec::with_capacity(parsed.len());
    for (line, result) in parsed {
        match result {
            Ok(entry) => entries.push(entry),
            Err(message) => {
                debug!(line, %message, "dropping malformed line");
                row_errors.push(RowError { line, message });
            }
        }
    }

    if !row_errors.is_empty() {
        warn!(dropped = row_errors.len(), "ignored malformed input lines");
    }
    info!(rows_read, entries = entries.len(), "ingest complete");

    Ok(IngestedEntries {
        entries,
        row_errors,
        rows_read,
    })
}

fn parse_record(record: &StringRecord) -> Result<Entry, String> {
    if record.len() != 3 {
        return Err(format!("expected 3 fields, found {}", record.len()));
    }
    parse_fields(&record[0], &record[1], &record[2])
}
