//! Typed user/movie observations.

use std::fmt::{Debug, Display};
use std::hash::Hash;

use csv::StringRecord;
use serde::{Deserialize, Serialize};

use super::error::ParseError;
use super::schema::{Column, ColumnKind, InputSchema};

const USER_COLUMN: &str = "userId";
const MOVIE_COLUMN: &str = "movieId";
const LABEL_COLUMN: &str = "Label";

/// A labeled (user, movie) observation that can be read from a CSV row.
///
/// Implementations read the first three columns (`userId,movieId,label`) and ignore any
/// trailing columns such as a timestamp.
pub trait LabeledRecord: Sized + Clone + Debug {
    /// Raw identifier type for users and movies.
    type Id: Clone + Eq + Hash + Debug + Display;

    /// Whether the label column holds `0`/`1` relevance rather than a star rating.
    /// Raw rating files are binarized before splitting when this is set.
    const BINARY_LABEL: bool;

    /// Columns this record type is read from.
    fn schema() -> InputSchema;

    /// Parse a record from a CSV row. `line` is used for error reporting only.
    fn from_row(row: &StringRecord, line: u64) -> Result<Self, ParseError>;

    /// Parse a raw identifier as it would appear in the id columns.
    fn parse_id(raw: &str, field: &str) -> Result<Self::Id, ParseError>;

    fn user_id(&self) -> &Self::Id;

    fn movie_id(&self) -> &Self::Id;
}

fn field<'r>(
    row: &'r StringRecord,
    index: usize,
    name: &str,
    line: u64,
) -> Result<&'r str, ParseError> {
    row.get(index).ok_or_else(|| ParseError::MissingField {
        line,
        field: name.to_string(),
    })
}

fn parse_u32(raw: &str, name: &str, line: u64) -> Result<u32, ParseError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| ParseError::invalid(line, name, "unsigned integer", raw))
}

fn parse_f32(raw: &str, name: &str, line: u64) -> Result<f32, ParseError> {
    match raw.trim().parse::<f32>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ParseError::invalid(line, name, "finite number", raw)),
    }
}

fn parse_bool(raw: &str, name: &str, line: u64) -> Result<bool, ParseError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        return Ok(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Ok(false);
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v == 1.0 => Ok(true),
        Ok(v) if v == 0.0 => Ok(false),
        _ => Err(ParseError::invalid(line, name, "boolean (0/1/true/false)", raw)),
    }
}

// =============================================================================
// RatingRecord
// =============================================================================

/// A user's star rating for a movie (regression schema).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingRecord {
    pub user_id: u32,
    pub movie_id: u32,
    /// Star rating, nominally in `[1, 5]`.
    pub label: f32,
}

impl RatingRecord {
    pub fn new(user_id: u32, movie_id: u32, label: f32) -> Self {
        Self {
            user_id,
            movie_id,
            label,
        }
    }
}

impl LabeledRecord for RatingRecord {
    type Id = u32;

    const BINARY_LABEL: bool = false;

    fn schema() -> InputSchema {
        InputSchema::new(vec![
            Column::new(USER_COLUMN, ColumnKind::UInt32, 0),
            Column::new(MOVIE_COLUMN, ColumnKind::UInt32, 1),
            Column::new(LABEL_COLUMN, ColumnKind::Float32, 2),
        ])
    }

    fn from_row(row: &StringRecord, line: u64) -> Result<Self, ParseError> {
        Ok(Self {
            user_id: parse_u32(field(row, 0, USER_COLUMN, line)?, USER_COLUMN, line)?,
            movie_id: parse_u32(field(row, 1, MOVIE_COLUMN, line)?, MOVIE_COLUMN, line)?,
            label: parse_f32(field(row, 2, LABEL_COLUMN, line)?, LABEL_COLUMN, line)?,
        })
    }

    fn parse_id(raw: &str, field: &str) -> Result<u32, ParseError> {
        parse_u32(raw, field, 0)
    }

    fn user_id(&self) -> &u32 {
        &self.user_id
    }

    fn movie_id(&self) -> &u32 {
        &self.movie_id
    }
}

// =============================================================================
// RelevanceRecord
// =============================================================================

/// Whether a user found a movie relevant (classification schema).
///
/// Ids are kept as text tokens; the label comes from binarizing a rating
/// (see [`binarize_rating`](super::binarize_rating)).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelevanceRecord {
    pub user_id: String,
    pub movie_id: String,
    pub label: bool,
}

impl RelevanceRecord {
    pub fn new(user_id: impl Into<String>, movie_id: impl Into<String>, label: bool) -> Self {
        Self {
            user_id: user_id.into(),
            movie_id: movie_id.into(),
            label,
        }
    }
}

impl LabeledRecord for RelevanceRecord {
    type Id = String;

    const BINARY_LABEL: bool = true;

    fn schema() -> InputSchema {
        InputSchema::new(vec![
            Column::new(USER_COLUMN, ColumnKind::Text, 0),
            Column::new(MOVIE_COLUMN, ColumnKind::Text, 1),
            Column::new(LABEL_COLUMN, ColumnKind::Boolean, 2),
        ])
    }

    fn from_row(row: &StringRecord, line: u64) -> Result<Self, ParseError> {
        Ok(Self {
            user_id: field(row, 0, USER_COLUMN, line)?.to_string(),
            movie_id: field(row, 1, MOVIE_COLUMN, line)?.to_string(),
            label: parse_bool(field(row, 2, LABEL_COLUMN, line)?, LABEL_COLUMN, line)?,
        })
    }

    fn parse_id(raw: &str, _field: &str) -> Result<String, ParseError> {
        Ok(raw.to_string())
    }

    fn user_id(&self) -> &String {
        &self.user_id
    }

    fn movie_id(&self) -> &String {
        &self.movie_id
    }
}
