//! CSV import pipeline: parse and validate an uploaded batch.
//!
//! Parsing is pure. It checks every row on its own and removes duplicates
//! inside the batch. Checks against existing records and the commit happen
//! in the registry reducer, under the store's write lock.

use crate::error::TrackerError;
use crate::types::{normalize_email, Attendee, AttendeeDraft, DraftError};
use csv::{ReaderBuilder, Trim};
use serde::Serialize;
use std::collections::HashSet;

/// Why a row was left out of the import.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Name empty after trimming
    MissingName,
    /// Email empty or not `local@domain`
    InvalidEmail,
    /// An earlier row in the same upload has this email
    DuplicateInBatch,
    /// An existing attendee already has this email
    EmailConflict,
}

/// One rejected row, numbered from 1 after the header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct RejectedRow {
    /// 1-based data row number
    pub row: usize,
    /// Why it was rejected
    pub reason: RejectReason,
}

/// A row that passed validation and is unique within its batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchRow {
    /// 1-based data row number
    pub row: usize,
    /// Validated draft
    pub draft: AttendeeDraft,
}

/// Outcome of parsing an upload, before it touches the registry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedBatch {
    /// Data rows read
    pub total_processed: usize,
    /// Rows to commit, in file order
    pub rows: Vec<BatchRow>,
    /// Rows already excluded
    pub rejected: Vec<RejectedRow>,
}

/// Response body for `POST /upload-csv`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Newly created attendees, in file order
    pub attendees: Vec<Attendee>,
    /// Data rows read
    pub total_processed: usize,
    /// Equal to `attendees.len()`
    pub added: usize,
    /// Equal to `rejected.len()`
    pub skipped: usize,
    /// Rejected rows by row number
    pub rejected: Vec<RejectedRow>,
}

#[derive(Default)]
struct Columns {
    name: Option<usize>,
    email: Option<usize>,
    role: Option<usize>,
    phone: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut columns = Self::default();
        for (index, header) in headers.iter().enumerate() {
            let slot = match canonical_header(header).as_str() {
                "name" => &mut columns.name,
                "email" => &mut columns.email,
                "role" => &mut columns.role,
                "phone number" | "phone" => &mut columns.phone,
                _ => continue,
            };
            // First matching column wins
            slot.get_or_insert(index);
        }
        columns
    }
}

/// Lowercase, treat `_` as a space, and collapse runs of whitespace.
fn canonical_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Check the upload's file name, then parse its bytes.
///
/// # Errors
///
/// Returns [`TrackerError::MalformedCsv`] for a file name not ending in
/// `.csv`, or whenever [`parse_batch`] fails.
pub fn parse_upload(file_name: Option<&str>, bytes: &[u8]) -> Result<ParsedBatch, TrackerError> {
    if let Some(name) = file_name {
        if !name.to_ascii_lowercase().ends_with(".csv") {
            return Err(TrackerError::MalformedCsv(format!(
                "{name} is not a .csv file"
            )));
        }
    }
    parse_batch(bytes)
}

/// Parse CSV bytes with a header row into a validated batch.
///
/// Row-level problems only exclude the row.
///
/// # Errors
///
/// Returns [`TrackerError::MalformedCsv`] when the input is not UTF-8, is
/// not valid CSV, or lacks a `name` or `email` column.
pub fn parse_batch(bytes: &[u8]) -> Result<ParsedBatch, TrackerError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| TrackerError::MalformedCsv(format!("upload is not UTF-8: {e}")))?;

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| TrackerError::MalformedCsv(e.to_string()))?;
    let columns = Columns::from_headers(headers);

    let (Some(name_col), Some(email_col)) = (columns.name, columns.email) else {
        let missing: Vec<&str> = [("name", columns.name), ("email", columns.email)]
            .into_iter()
            .filter(|(_, index)| index.is_none())
            .map(|(label, _)| label)
            .collect();
        return Err(TrackerError::MalformedCsv(format!(
            "missing required column(s): {}",
            missing.join(", ")
        )));
    };

    let mut batch = ParsedBatch::default();
    let mut seen_emails = HashSet::new();

    for (index, record) in reader.records().enumerate() {
        let row = index + 1;
        let record = record
            .map_err(|e| TrackerError::MalformedCsv(format!("row {row}: {e}")))?;
        batch.total_processed += 1;

        let field = |column: Option<usize>| {
            column
                .and_then(|c| record.get(c))
                .map(str::to_string)
        };

        let draft = AttendeeDraft {
            name: field(Some(name_col)).unwrap_or_default(),
            email: field(Some(email_col)).unwrap_or_default(),
            role: field(columns.role),
            phone_number: field(columns.phone),
        };

        let draft = match draft.validated() {
            Ok(draft) => draft,
            Err(error) => {
                let reason = match error {
                    DraftError::MissingName => RejectReason::MissingName,
                    DraftError::InvalidEmail => RejectReason::InvalidEmail,
                };
                batch.rejected.push(RejectedRow { row, reason });
                continue;
            },
        };

        if !seen_emails.insert(normalize_email(&draft.email)) {
            batch.rejected.push(RejectedRow {
                row,
                reason: RejectReason::DuplicateInBatch,
            });
            continue;
        }

        batch.rows.push(BatchRow { row, draft });
    }

    Ok(batch)
}
