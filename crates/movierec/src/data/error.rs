use thiserror::Error;

/// Errors raised while reading rating data.
///
/// A single malformed row aborts the whole load or split; rows are never skipped.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The input has no header row.
    #[error("missing header row")]
    MissingHeader,

    /// A row is shorter than the schema requires.
    #[error("line {line}: missing field `{field}`")]
    MissingField { line: u64, field: String },

    /// A field could not be coerced to its expected type.
    #[error("line {line}: field `{field}` is not a valid {expected}: {value:?}")]
    InvalidField {
        line: u64,
        field: String,
        expected: &'static str,
        value: String,
    },

    /// The CSV layer rejected the input (unequal row lengths, bad UTF-8, ...).
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

impl ParseError {
    pub(crate) fn invalid(
        line: u64,
        field: impl Into<String>,
        expected: &'static str,
        value: &str,
    ) -> Self {
        Self::InvalidField {
            line,
            field: field.into(),
            expected,
            value: value.to_string(),
        }
    }
}
