//! Input schema carried alongside fitted models.
//!
//! The schema names the columns (and their types) a model was trained on. It is embedded in
//! every saved artifact so that loading alone is enough to rebuild a compatible predictor.

use serde::{Deserialize, Serialize};

/// Logical type of an input column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Unsigned integer identifier.
    UInt32,
    /// 32-bit float.
    Float32,
    /// Free text token.
    Text,
    /// Boolean label.
    Boolean,
}

/// A single input column: name, type, and position in the source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub index: u32,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind, index: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            index,
        }
    }
}

/// Ordered set of input columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct InputSchema {
    pub columns: Vec<Column>,
}

impl InputSchema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Number of fields a row must have to satisfy this schema.
    pub fn min_row_width(&self) -> usize {
        self.columns
            .iter()
            .map(|c| c.index as usize + 1)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_lookup_and_width() {
        let schema = InputSchema::new(vec![
            Column::new("userId", ColumnKind::UInt32, 0),
            Column::new("Label", ColumnKind::Float32, 2),
        ]);

        assert_eq!(schema.column("Label").map(|c| c.kind), Some(ColumnKind::Float32));
        assert!(schema.column("timestamp").is_none());
        assert_eq!(schema.min_row_width(), 3);
    }
}
