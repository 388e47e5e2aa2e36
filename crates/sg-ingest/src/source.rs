//! CSV record source.
//!
//! # CSV format
//!
//! A header row names the fields; every following row becomes one
//! [`Record`] with string values.  Columns are matched by name, so extra
//! columns (e.g. the `geometry` or `reversed` columns written by osmnx) are
//! carried along and ignored by the loader.
//!
//! ```csv
//! osmid,y,x,ref,highway,street_count
//! 21656929,50.0870,14.4200,,traffic_signals,4
//! 21656930,50.0880,14.4200,,,3
//! ```
//!
//! Rows with a different field count than the header are accepted; missing
//! trailing fields are simply absent.  Rows the CSV reader cannot decode at
//! all (e.g. invalid UTF-8) are reported per row and counted as malformed by
//! the loader.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde_json::Value;

use crate::error::{IngestResult, RowError};
use crate::record::Record;

/// Streams [`Record`]s out of a CSV document.
pub struct CsvSource<R> {
    reader:  csv::Reader<R>,
    headers: Vec<String>,
}

impl CsvSource<File> {
    pub fn from_path(path: &Path) -> IngestResult<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }
}

impl<R: Read> CsvSource<R> {
    /// Like [`CsvSource::from_path`] but accepts any `Read` source.
    ///
    /// Fails if the header row cannot be read.
    pub fn from_reader(reader: R) -> IngestResult<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
        Ok(Self { reader, headers })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Iterate over rows.  Each item is one decoded record or the reason the
    /// row could not be decoded.
    pub fn records(&mut self) -> impl Iterator<Item = Result<Record, RowError>> + '_ {
        let headers = &self.headers;
        self.reader.records().map(move |row| {
            let row = row.map_err(|e| RowError::malformed("<row>", e.to_string()))?;
            Ok(headers
                .iter()
                .zip(row.iter())
                .map(|(h, v)| (h.clone(), Value::String(v.to_string())))
                .collect())
        })
    }
}
