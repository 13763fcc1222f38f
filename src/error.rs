use thiserror::Error;

use crate::status::Section;

/// Fatal CSV problems. Any of these aborts the whole import attempt.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("CSV file is empty")]
    Empty,

    #[error("CSV must have an 'email' column")]
    MissingEmailColumn,

    #[error("Malformed CSV at line {line}: {message}")]
    Malformed { line: u64, message: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuilderError {
    #[error("Form is not ready to submit: {}", format_sections(.blocking))]
    NotSubmittable { blocking: Vec<Section> },
}

fn format_sections(sections: &[Section]) -> String {
    sections
        .iter()
        .map(|s| s.label())
        .collect::<Vec<_>>()
        .join(", ")
}
