use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

use crate::data::{ImportRow, RowStatus};
use crate::error::ImportError;

/// Per-import switches layered on top of the default row rules
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Flag rows that end up with no name at all as errors
    pub require_name: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Email,
    FirstName,
    LastName,
    Name,
}

/// Map a header cell onto a known column, case-insensitively.
pub fn match_header(header: &str) -> Option<Column> {
    let normalized = header
        .trim_start_matches('\u{feff}')
        .trim()
        .trim_matches('"')
        .trim()
        .to_lowercase();
    match normalized.as_str() {
        "email" | "e-mail" => Some(Column::Email),
        "first_name" | "firstname" | "first name" | "first" => Some(Column::FirstName),
        "last_name" | "lastname" | "last name" | "last" => Some(Column::LastName),
        "name" | "full_name" | "fullname" | "full name" => Some(Column::Name),
        _ => None,
    }
}

#[derive(Debug)]
struct ColumnMap {
    email: usize,
    first_name: Option<usize>,
    last_name: Option<usize>,
    name: Option<usize>,
}

impl ColumnMap {
    fn from_header(headers: &StringRecord) -> Result<Self, ImportError> {
        let mut email = None;
        let mut first_name = None;
        let mut last_name = None;
        let mut name = None;

        // First matching column wins when a header repeats
        for (idx, header) in headers.iter().enumerate() {
            let slot = match match_header(header) {
                Some(Column::Email) => &mut email,
                Some(Column::FirstName) => &mut first_name,
                Some(Column::LastName) => &mut last_name,
                Some(Column::Name) => &mut name,
                None => continue,
            };
            slot.get_or_insert(idx);
        }

        Ok(Self {
            email: email.ok_or(ImportError::MissingEmailColumn)?,
            first_name,
            last_name,
            name,
        })
    }
}

fn malformed(err: csv::Error) -> ImportError {
    ImportError::Malformed {
        line: err.position().map(|p| p.line()).unwrap_or(0),
        message: err.to_string(),
    }
}

pub fn parse(text: &str) -> Result<Vec<ImportRow>, ImportError> {
    parse_with(text, ParseOptions::default())
}

/// Parse raw CSV text into rows. The first non-blank line is the header.
///
/// Rows whose email cell is empty are dropped without a trace; every other
/// row is emitted in input order with a `valid` or `error` status.
pub fn parse_with(text: &str, options: ParseOptions) -> Result<Vec<ImportRow>, ImportError> {
    // Excel's "CSV UTF-8" export starts with a byte-order mark
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers().map_err(malformed)?.clone();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ImportError::Empty);
    }
    let columns = ColumnMap::from_header(&headers)?;

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for record in reader.records() {
        let record = record.map_err(malformed)?;
        let cell = |column: Option<usize>| {
            column
                .and_then(|i| record.get(i))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let Some(email) = cell(Some(columns.email)).map(|e| e.to_lowercase()) else {
            skipped += 1;
            continue;
        };

        let first_name = cell(columns.first_name);
        let last_name = cell(columns.last_name);
        let name = cell(columns.name).unwrap_or_else(|| {
            format!(
                "{} {}",
                first_name.as_deref().unwrap_or(""),
                last_name.as_deref().unwrap_or("")
            )
            .trim()
            .to_string()
        });

        let mut row = ImportRow {
            line: record.position().map(|p| p.line() as usize).unwrap_or(0),
            email,
            first_name,
            last_name,
            name,
            status: RowStatus::Valid,
            reason: None,
        };

        if !row.email.contains('@') {
            row.mark(RowStatus::Error, "Invalid email format");
        } else if options.require_name && row.name.is_empty() {
            row.mark(RowStatus::Error, "Missing name");
        }

        rows.push(row);
    }

    tracing::debug!(rows = rows.len(), skipped, "Parsed CSV");
    Ok(rows)
}

/// Flag valid rows whose email is already known, or repeats an earlier row
/// of the same file. Error rows are left untouched.
pub fn mark_duplicates<I>(rows: &mut [ImportRow], existing: I)
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let existing: HashSet<String> = existing
        .into_iter()
        .map(|e| e.as_ref().trim().to_lowercase())
        .collect();
    let mut seen = HashSet::new();

    for row in rows.iter_mut().filter(|r| r.is_valid()) {
        if existing.contains(&row.email) {
            row.mark(RowStatus::Duplicate, "Email already exists");
        } else if !seen.insert(row.email.clone()) {
            row.mark(RowStatus::Duplicate, "Duplicate email in file");
        }
    }
}

/// Rows that will actually be submitted
pub fn importable(rows: &[ImportRow]) -> Vec<&ImportRow> {
    rows.iter().filter(|r| r.is_valid()).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub batch_id: Uuid,
    pub total: usize,
    pub valid: usize,
    pub errors: usize,
    pub duplicates: usize,
}

impl ImportSummary {
    pub fn from_rows(rows: &[ImportRow]) -> Self {
        let count = |status: RowStatus| rows.iter().filter(|r| r.status == status).count();
        Self {
            batch_id: Uuid::new_v4(),
            total: rows.len(),
            valid: count(RowStatus::Valid),
            errors: count(RowStatus::Error),
            duplicates: count(RowStatus::Duplicate),
        }
    }
}
