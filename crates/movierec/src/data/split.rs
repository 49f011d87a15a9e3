//! Deterministic train/test partitioning of raw rating files.
//!
//! The splitter never shuffles: rows are ordered by their timestamp column (stable, so ties
//! keep file order), the earliest `floor(p * N)` rows become the training set and the latest
//! `floor((1 - p) * N)` rows become the test set.
//!
//! # Boundary behavior
//!
//! Both counts are floored independently, so for some `(p, N)` the sets leave one middle row
//! uncovered (e.g. `p = 0.9, N = 15` yields 13 + 1). The sets never overlap.
//!
//! # Already-binary files
//!
//! A file read from disk carries no marker of whether its labels were binarized. When every
//! label is exactly `0` or `1`, [`RatingTable::binarize`] treats the column as relevance
//! labels and leaves it untouched, so re-splitting a binarized file is a no-op on labels.
//! A raw file in which every rating happens to be one star is read the same way.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use csv::StringRecord;
use serde::{Deserialize, Serialize};

use super::error::ParseError;
use crate::config::ConfigError;

/// Ratings strictly above this value are considered relevant.
pub const BINARIZE_THRESHOLD: f32 = 3.0;

/// Guard against binary floating-point error in the split-count floors.
const COUNT_EPSILON: f64 = 1e-9;

/// Map a star rating to a relevance label.
#[inline]
pub fn binarize_rating(rating: f32) -> u8 {
    if rating > BINARIZE_THRESHOLD { 1 } else { 0 }
}

// =============================================================================
// RatingTable
// =============================================================================

/// What the label column of a [`RatingTable`] currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LabelKind {
    /// Raw star ratings.
    #[default]
    Rating,
    /// `1`/`0` relevance labels.
    Binary,
}

/// Raw rating rows with their header, kept as text so rewritten files preserve
/// field order and any extra columns.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingTable {
    header: StringRecord,
    rows: Vec<StringRecord>,
    label_kind: LabelKind,
}

impl RatingTable {
    /// Build a table of raw ratings from a header and data rows.
    pub fn from_rows(header: StringRecord, rows: Vec<StringRecord>) -> Self {
        Self {
            header,
            rows,
            label_kind: LabelKind::Rating,
        }
    }

    /// Read a table from CSV text with a header row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ParseError> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let header = csv.headers()?.clone();
        if header.is_empty() {
            return Err(ParseError::MissingHeader);
        }

        let rows = csv.records().collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_rows(header, rows))
    }

    /// Read a table from a CSV file.
    pub fn read_csv(path: impl AsRef<Path>) -> crate::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::from_reader(file)?)
    }

    /// Write header and rows as CSV.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv = csv::WriterBuilder::new().flexible(true).from_writer(writer);
        csv.write_record(&self.header)?;
        for row in &self.rows {
            csv.write_record(row)?;
        }
        csv.flush()?;
        Ok(())
    }

    pub fn header(&self) -> &StringRecord {
        &self.header
    }

    pub fn rows(&self) -> &[StringRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn label_kind(&self) -> LabelKind {
        self.label_kind
    }

    /// Rewrite the label column to `1`/`0` using [`binarize_rating`].
    ///
    /// A table that is already binary, or whose labels are all `0`/`1`, is left untouched
    /// and marked [`LabelKind::Binary`]. Every label is validated before any row is
    /// rewritten.
    pub fn binarize(&mut self, label_column: usize) -> Result<(), ParseError> {
        if self.label_kind == LabelKind::Binary {
            return Ok(());
        }

        let labels = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| self.parse_label(row, i, label_column))
            .collect::<Result<Vec<_>, _>>()?;
        if labels.iter().all(|&v| v == 0.0 || v == 1.0) {
            self.label_kind = LabelKind::Binary;
            return Ok(());
        }

        for (row, rating) in self.rows.iter_mut().zip(labels) {
            let label = binarize_rating(rating).to_string();
            let mut rewritten: StringRecord = row
                .iter()
                .enumerate()
                .map(|(i, field)| if i == label_column { label.as_str() } else { field })
                .collect();
            rewritten.set_position(row.position().cloned());
            *row = rewritten;
        }

        self.label_kind = LabelKind::Binary;
        Ok(())
    }

    fn field_name(&self, column: usize) -> String {
        self.header
            .get(column)
            .map_or_else(|| format!("column {column}"), str::to_string)
    }

    fn parse_label(
        &self,
        row: &StringRecord,
        index: usize,
        column: usize,
    ) -> Result<f32, ParseError> {
        let raw = self.raw_field(row, index, column)?;
        match raw.trim().parse::<f32>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => {
                let line = line_of(row, index);
                Err(ParseError::invalid(line, self.field_name(column), "number", raw))
            }
        }
    }

    fn parse_sort_key(
        &self,
        row: &StringRecord,
        index: usize,
        column: usize,
    ) -> Result<i64, ParseError> {
        let raw = self.raw_field(row, index, column)?;
        raw.trim().parse::<i64>().map_err(|_| {
            ParseError::invalid(line_of(row, index), self.field_name(column), "integer", raw)
        })
    }

    fn check_id(&self, row: &StringRecord, index: usize, column: usize) -> Result<(), ParseError> {
        let raw = self.raw_field(row, index, column)?;
        match raw.trim().parse::<u32>() {
            Ok(_) => Ok(()),
            Err(_) => Err(ParseError::invalid(
                line_of(row, index),
                self.field_name(column),
                "unsigned integer",
                raw,
            )),
        }
    }

    fn raw_field<'r>(
        &self,
        row: &'r StringRecord,
        index: usize,
        column: usize,
    ) -> Result<&'r str, ParseError> {
        row.get(column).ok_or_else(|| ParseError::MissingField {
            line: line_of(row, index),
            field: self.field_name(column),
        })
    }
}

/// 1-based source line of a row; falls back to its index for tables built in memory.
fn line_of(row: &StringRecord, index: usize) -> u64 {
    row.position().map_or(index as u64 + 2, |p| p.line())
}

// =============================================================================
// DatasetSplitter
// =============================================================================

/// Row counts produced by a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSummary {
    pub total_rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub binarized: bool,
}

/// Chronological train/test splitter.
///
/// # Example
///
/// ```
/// use movierec::DatasetSplitter;
///
/// let splitter = DatasetSplitter::new(0.9).unwrap();
/// assert_eq!(splitter.split_counts(100), (90, 10));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetSplitter {
    /// Fraction of rows (earliest first) used for training, in `(0, 1)`.
    pub train_fraction: f64,
    /// Replace ratings with `1`/`0` relevance labels before splitting.
    pub binarize: bool,
    /// Zero-based index of the rating column.
    pub label_column: usize,
    /// Zero-based index of the integer timestamp column.
    pub sort_column: usize,
    /// Zero-based indices of the user and movie id columns; both must hold unsigned integers.
    pub id_columns: [usize; 2],
}

impl Default for DatasetSplitter {
    fn default() -> Self {
        Self {
            train_fraction: 0.9,
            binarize: false,
            label_column: 2,
            sort_column: 3,
            id_columns: [0, 1],
        }
    }
}

impl DatasetSplitter {
    /// Create a splitter with the given training fraction.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidSplitFraction`] unless `0 < train_fraction < 1`.
    pub fn new(train_fraction: f64) -> Result<Self, ConfigError> {
        let splitter = Self {
            train_fraction,
            ..Default::default()
        };
        splitter.validate()?;
        Ok(splitter)
    }

    pub fn with_binarize(mut self, binarize: bool) -> Self {
        self.binarize = binarize;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.train_fraction > 0.0 && self.train_fraction < 1.0) {
            return Err(ConfigError::InvalidSplitFraction(self.train_fraction));
        }
        Ok(())
    }

    /// `(train, test)` row counts for a table of `n` rows. Never sums to more than `n`.
    pub fn split_counts(&self, n: usize) -> (usize, usize) {
        let p = self.train_fraction;
        let train = ((p * n as f64) + COUNT_EPSILON).floor() as usize;
        let test = (((1.0 - p) * n as f64) + COUNT_EPSILON).floor() as usize;
        let train = train.min(n);
        (train, test.min(n - train))
    }

    /// Split a table into `(train, test)`.
    ///
    /// Binarizes first if configured, then orders rows by timestamp. All rows are validated
    /// before anything is produced.
    pub fn split(
        &self,
        mut table: RatingTable,
    ) -> Result<(RatingTable, RatingTable), ParseError> {
        for (i, row) in table.rows.iter().enumerate() {
            for column in self.id_columns {
                table.check_id(row, i, column)?;
            }
        }
        if self.binarize {
            table.binarize(self.label_column)?;
        } else {
            for (i, row) in table.rows.iter().enumerate() {
                table.parse_label(row, i, self.label_column)?;
            }
        }

        let mut keyed = table
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| Ok((table.parse_sort_key(row, i, self.sort_column)?, i)))
            .collect::<Result<Vec<_>, ParseError>>()?;
        keyed.sort_by_key(|&(key, _)| key);

        let n = keyed.len();
        let (n_train, n_test) = self.split_counts(n);

        let pick = |range: &[(i64, usize)]| RatingTable {
            header: table.header.clone(),
            rows: range.iter().map(|&(_, i)| table.rows[i].clone()).collect(),
            label_kind: table.label_kind,
        };

        let train = pick(&keyed[..n_train]);
        let test = pick(&keyed[n - n_test..]);
        Ok((train, test))
    }

    /// Read `source`, split it, and write the train and test files.
    ///
    /// Nothing is written unless every row parses. Each output is staged in a temporary
    /// file next to its destination and only renamed into place once both are complete.
    pub fn split_file(
        &self,
        source: impl AsRef<Path>,
        train_dest: impl AsRef<Path>,
        test_dest: impl AsRef<Path>,
    ) -> crate::Result<SplitSummary> {
        self.validate()?;
        let source = source.as_ref();
        let table = RatingTable::read_csv(source)?;
        let total_rows = table.len();

        let (train, test) = self.split(table)?;

        let train_file = crate::io::stage(train_dest.as_ref(), |w| train.write_csv(w))?;
        let test_file = crate::io::stage(test_dest.as_ref(), |w| test.write_csv(w))?;
        crate::io::commit(train_file, train_dest.as_ref())?;
        crate::io::commit(test_file, test_dest.as_ref())?;

        let summary = SplitSummary {
            total_rows,
            train_rows: train.len(),
            test_rows: test.len(),
            binarized: self.binarize,
        };
        tracing::info!(
            source = %source.display(),
            total = summary.total_rows,
            train = summary.train_rows,
            test = summary.test_rows,
            binarized = summary.binarized,
            "split dataset"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn table(csv: &str) -> RatingTable {
        RatingTable::from_reader(csv.as_bytes()).unwrap()
    }

    fn column(table: &RatingTable, col: usize) -> Vec<String> {
        table.rows().iter().map(|r| r[col].to_string()).collect()
    }

    #[test]
    fn binarize_threshold() {
        assert_eq!(binarize_rating(5.0), 1);
        assert_eq!(binarize_rating(3.5), 1);
        assert_eq!(binarize_rating(3.0), 0);
        assert_eq!(binarize_rating(1.0), 0);
    }

    #[test]
    fn split_counts_ninety_ten() {
        let splitter = DatasetSplitter::default();
        assert_eq!(splitter.split_counts(100), (90, 10));
        assert_eq!(splitter.split_counts(10), (9, 1));
        assert_eq!(splitter.split_counts(0), (0, 0));
        // Floors leave the middle row out.
        assert_eq!(splitter.split_counts(15), (13, 1));
    }

    #[test]
    fn invalid_fraction_rejected() {
        for p in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            assert!(DatasetSplitter::new(p).is_err(), "fraction {p}");
        }
    }

    #[test]
    fn split_orders_by_timestamp() {
        let t = table(
            "userId,movieId,rating,timestamp\n\
             1,1,4,30\n1,2,5,10\n1,3,1,20\n2,1,2,40\n2,2,3,50\n\
             2,3,4,60\n3,1,5,70\n3,2,1,80\n3,3,2,90\n3,4,3,100\n",
        );
        let (train, test) = DatasetSplitter::default().split(t).unwrap();
        assert_eq!(train.len(), 9);
        assert_eq!(test.len(), 1);
        assert_eq!(column(&train, 3)[..3], ["10", "20", "30"]);
        assert_eq!(column(&test, 3), ["100"]);
        assert_eq!(train.header(), test.header());
    }

    #[test]
    fn ties_keep_file_order() {
        let t = table("u,m,r,t\n1,1,4,5\n1,2,5,5\n1,3,1,1\n");
        let splitter = DatasetSplitter::new(0.5).unwrap();
        let (train, test) = splitter.split(t).unwrap();
        assert_eq!(column(&train, 1), ["3"]);
        assert_eq!(column(&test, 1), ["2"]);
    }

    #[test]
    fn binarize_is_idempotent() {
        let mut t = table("u,m,r,t\n1,1,4,1\n1,2,3,2\n1,3,3.5,3\n");
        t.binarize(2).unwrap();
        let once = t.clone();
        t.binarize(2).unwrap();
        assert_eq!(t, once);
        assert_eq!(column(&t, 2), ["1", "0", "1"]);
        assert_eq!(t.label_kind(), LabelKind::Binary);
    }

    #[test]
    fn binarized_split_only_contains_binary_labels() {
        let t = table("u,m,r,t\n1,1,4,1\n1,2,2,2\n1,3,5,3\n1,4,1,4\n");
        let splitter = DatasetSplitter::new(0.5).unwrap().with_binarize(true);
        let (train, test) = splitter.split(t).unwrap();
        assert_eq!(column(&train, 2), ["1", "0"]);
        assert_eq!(column(&test, 2), ["1", "0"]);
    }

    #[test]
    fn non_integer_timestamp_aborts() {
        let t = table("u,m,r,t\n1,1,4,1\n1,2,2,yesterday\n");
        let err = DatasetSplitter::default().split(t).unwrap_err();
        assert!(matches!(err, ParseError::InvalidField { line: 3, .. }), "{err}");
    }

    #[test]
    fn non_numeric_label_aborts() {
        let t = table("u,m,r,t\n1,1,great,1\n");
        assert!(DatasetSplitter::default().split(t).is_err());
    }

    #[test]
    fn missing_sort_column_aborts() {
        let t = table("u,m,r\n1,1,4\n");
        let err = DatasetSplitter::default().split(t).unwrap_err();
        assert!(matches!(err, ParseError::MissingField { .. }));
    }

    #[test]
    fn split_file_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("ratings.csv");
        let mut csv = String::from("userId,movieId,rating,timestamp\n");
        for i in 0..20 {
            csv.push_str(&format!("{},{},{},{}\n", i % 3, i, 1 + i % 5, 1000 - i));
        }
        std::fs::write(&source, csv).unwrap();

        let train_path = dir.path().join("ratings-train.csv");
        let test_path = dir.path().join("ratings-test.csv");
        let summary = DatasetSplitter::default()
            .split_file(&source, &train_path, &test_path)
            .unwrap();

        assert_eq!(summary.total_rows, 20);
        assert_eq!((summary.train_rows, summary.test_rows), (18, 2));

        let train = std::fs::read_to_string(&train_path).unwrap();
        assert!(train.starts_with("userId,movieId,rating,timestamp\n"));
        assert_eq!(train.lines().count(), 19);
        // Latest timestamps (i = 0, 1) land in the test file.
        let test = std::fs::read_to_string(&test_path).unwrap();
        assert!(test.contains("0,0,1,1000"));
    }

    #[test]
    fn binary_column_is_not_binarized_again() {
        let mut t = table("u,m,r,t\n1,1,1,1\n1,2,0,2\n1,3,1,3\n");
        t.binarize(2).unwrap();
        assert_eq!(column(&t, 2), ["1", "0", "1"]);
        assert_eq!(t.label_kind(), LabelKind::Binary);
    }

    #[test]
    fn resplitting_a_binarized_file_keeps_labels() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("ratings.csv");
        std::fs::write(&source, "u,m,r,t\n1,1,4,1\n1,2,5,2\n1,3,2,3\n1,4,4.5,4\n").unwrap();
        let splitter = DatasetSplitter::new(0.5).unwrap().with_binarize(true);

        let (train1, test1) = (dir.path().join("train1.csv"), dir.path().join("test1.csv"));
        splitter.split_file(&source, &train1, &test1).unwrap();
        let once = RatingTable::read_csv(&train1).unwrap();
        assert_eq!(column(&once, 2), ["1", "1"]);

        let (train2, test2) = (dir.path().join("train2.csv"), dir.path().join("test2.csv"));
        splitter.split_file(&train1, &train2, &test2).unwrap();
        let twice = RatingTable::read_csv(&train2).unwrap();
        let resplit_test = RatingTable::read_csv(&test2).unwrap();
        assert_eq!(column(&twice, 2), ["1"]);
        assert_eq!(column(&resplit_test, 2), ["1"]);
    }

    #[test]
    fn non_numeric_ids_abort() {
        for csv in ["u,m,r,t\nabc,1,4,1\n1,2,5,2\n", "u,m,r,t\n1,1,4,1\n1,xyz,5,2\n"] {
            let err = DatasetSplitter::default().split(table(csv)).unwrap_err();
            assert!(matches!(err, ParseError::InvalidField { .. }), "{err}");
        }
        let err = DatasetSplitter::default()
            .with_binarize(true)
            .split(table("u,m,r,t\n1,1,4,1\n1,-2,5,2\n"))
            .unwrap_err();
        assert!(matches!(err, ParseError::InvalidField { line: 3, .. }), "{err}");
    }

    #[test]
    fn split_file_writes_nothing_on_bad_id() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("ratings.csv");
        std::fs::write(&source, "userId,movieId,rating,timestamp\nabc,1,4,1\n1,xyz,5,2\n").unwrap();

        let train_path = dir.path().join("train.csv");
        let test_path = dir.path().join("test.csv");
        let result = DatasetSplitter::default().split_file(&source, &train_path, &test_path);

        assert!(matches!(result, Err(crate::Error::Parse(_))));
        assert!(!train_path.exists());
        assert!(!test_path.exists());
    }

    #[test]
    fn split_file_writes_nothing_on_bad_row() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("ratings.csv");
        std::fs::write(&source, "u,m,r,t\n1,1,4,1\n1,2,x,2\n").unwrap();

        let train_path = dir.path().join("train.csv");
        let test_path = dir.path().join("test.csv");
        let result = DatasetSplitter::default().split_file(&source, &train_path, &test_path);

        assert!(matches!(result, Err(crate::Error::Parse(_))));
        assert!(!train_path.exists());
        assert!(!test_path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    proptest! {
        #[test]
        fn split_counts_never_overlap(p in 0.01f64..0.99, n in 0usize..5000) {
            let splitter = DatasetSplitter::new(p).unwrap();
            let (train, test) = splitter.split_counts(n);
            prop_assert!(train + test <= n);
            prop_assert!(train + test + 2 >= n);
        }

        #[test]
        fn tenth_multiples_split_exactly(k in 0usize..500) {
            let n = k * 10;
            prop_assert_eq!(DatasetSplitter::default().split_counts(n), (9 * k, k));
        }
    }
}
