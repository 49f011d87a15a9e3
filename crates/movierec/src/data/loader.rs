//! CSV loading of typed records.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::error::ParseError;
use super::record::LabeledRecord;

/// Read records from any reader producing `userId,movieId,label[,...]` CSV with a header.
///
/// The first malformed row aborts the read.
pub fn read_records<R: LabeledRecord, Rd: Read>(reader: Rd) -> Result<Vec<R>, ParseError> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    if csv.headers()?.is_empty() {
        return Err(ParseError::MissingHeader);
    }

    let mut records = Vec::new();
    for (i, row) in csv.records().enumerate() {
        let row = row?;
        // Header is line 1.
        let line = row.position().map_or(i as u64 + 2, |p| p.line());
        records.push(R::from_row(&row, line)?);
    }
    Ok(records)
}

/// Load records from a CSV file.
pub fn load_records<R: LabeledRecord>(path: impl AsRef<Path>) -> crate::Result<Vec<R>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let records = read_records(file)?;
    tracing::debug!(path = %path.display(), rows = records.len(), "loaded records");
    Ok(records)
}
