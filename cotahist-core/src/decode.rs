//! Fixed-width record decoder.
//!
//! A COTAHIST archive is a zip holding exactly one Latin-1 text file. The
//! first line is a header record and the last line a trailer record; both are
//! dropped. Every line in between is sliced by [`schema::COLUMNS`] and each
//! slice goes through its column's [`Transform`].
//!
//! Decoding is all-or-nothing: one bad record fails the whole artifact.

use crate::schema::{self, ColumnDescriptor, Transform, RECORD_WIDTH};
use polars::prelude::*;
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use thiserror::Error;

/// Upper bound on the buffer reserved up front for an archive entry.
const MAX_PREALLOCATION: usize = 64 << 20;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unreadable archive: {0}")]
    Archive(String),

    #[error("archive must contain exactly one file, found {0}")]
    EntryCount(usize),

    #[error("expected a header and a trailer line, found {0} line(s)")]
    MissingStructuralLines(usize),

    #[error("line {line}: record is {length} bytes, expected at least {expected}")]
    Truncated {
        line: usize,
        length: usize,
        expected: usize,
    },

    #[error("line {line}: column '{column}' rejected {raw:?}: {reason}")]
    Field {
        line: usize,
        column: &'static str,
        raw: String,
        reason: String,
    },

    #[error("table assembly failed: {0}")]
    Table(String),

    #[error("cannot read {path}: {reason}")]
    Io { path: String, reason: String },
}

/// Decode a COTAHIST zip archive held in memory.
pub fn decode(archive: &[u8]) -> Result<DataFrame, DecodeError> {
    let content = extract_single_entry(archive)?;
    decode_records(&content)
}

/// Decode a COTAHIST zip archive from disk.
pub fn decode_file(path: &Path) -> Result<DataFrame, DecodeError> {
    let bytes = fs::read(path).map_err(|e| DecodeError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    decode(&bytes)
}

/// Decode the uncompressed fixed-width text (header, records, trailer).
pub fn decode_records(content: &[u8]) -> Result<DataFrame, DecodeError> {
    let lines = split_lines(content);
    if lines.len() < 2 {
        return Err(DecodeError::MissingStructuralLines(lines.len()));
    }
    let records = &lines[1..lines.len() - 1];

    let mut buffers: Vec<ColumnBuffer> = schema::columns()
        .iter()
        .map(|col| ColumnBuffer::for_column(col, records.len()))
        .collect();

    for (i, record) in records.iter().enumerate() {
        // Line numbers are 1-based and count the header.
        let line = i + 2;
        if record.len() < RECORD_WIDTH {
            return Err(DecodeError::Truncated {
                line,
                length: record.len(),
                expected: RECORD_WIDTH,
            });
        }
        for (col, buffer) in schema::columns().iter().zip(buffers.iter_mut()) {
            let raw = latin1(&record[col.start..col.end]);
            buffer.push(&raw).map_err(|reason| DecodeError::Field {
                line,
                column: col.name,
                raw,
                reason,
            })?;
        }
    }

    let columns = schema::columns()
        .iter()
        .zip(buffers)
        .map(|(col, buffer)| buffer.into_column(col))
        .collect::<Result<Vec<_>, _>>()?;

    DataFrame::new(columns).map_err(|e| DecodeError::Table(e.to_string()))
}

/// Serialize a decoded table to gzip-compressed Parquet bytes.
pub fn encode_parquet(df: &DataFrame) -> Result<Vec<u8>, DecodeError> {
    let mut buf = Vec::new();
    ParquetWriter::new(&mut buf)
        .with_compression(ParquetCompression::Gzip(None))
        .finish(&mut df.clone())
        .map_err(|e| DecodeError::Table(format!("write parquet: {e}")))?;
    Ok(buf)
}

/// Read Parquet bytes back into a table.
pub fn read_parquet(bytes: &[u8]) -> Result<DataFrame, DecodeError> {
    ParquetReader::new(Cursor::new(bytes))
        .finish()
        .map_err(|e| DecodeError::Table(format!("read parquet: {e}")))
}

fn extract_single_entry(archive: &[u8]) -> Result<Vec<u8>, DecodeError> {
    let mut zip = ::zip::ZipArchive::new(Cursor::new(archive))
        .map_err(|e| DecodeError::Archive(e.to_string()))?;

    if zip.len() != 1 {
        return Err(DecodeError::EntryCount(zip.len()));
    }

    let mut entry = zip
        .by_index(0)
        .map_err(|e| DecodeError::Archive(e.to_string()))?;
    // The declared size comes from the archive itself; cap the reservation.
    let declared = usize::try_from(entry.size()).unwrap_or(usize::MAX);
    let mut content = Vec::with_capacity(declared.min(MAX_PREALLOCATION));
    entry
        .read_to_end(&mut content)
        .map_err(|e| DecodeError::Archive(format!("inflate {}: {e}", entry.name())))?;
    Ok(content)
}

/// Split on `\n`, dropping a trailing `\r` and any blank lines after the
/// last record.
fn split_lines(content: &[u8]) -> Vec<&[u8]> {
    let mut lines: Vec<&[u8]> = content
        .split(|&b| b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .collect();
    while lines.last().is_some_and(|l| l.iter().all(u8::is_ascii_whitespace)) {
        lines.pop();
    }
    lines
}

/// ISO-8859-1 maps every byte to the code point of the same value.
fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Typed accumulator for one column, chosen from the column's transform.
enum ColumnBuffer {
    Str(Vec<String>),
    Int(Vec<Option<i64>>),
    Float { values: Vec<Option<f64>>, scale: f64 },
    Date(Vec<Option<i32>>),
}

impl ColumnBuffer {
    fn for_column(col: &ColumnDescriptor, capacity: usize) -> Self {
        match col.transform {
            Transform::Trim => ColumnBuffer::Str(Vec::with_capacity(capacity)),
            Transform::Integer => ColumnBuffer::Int(Vec::with_capacity(capacity)),
            Transform::Decimal => ColumnBuffer::Float {
                values: Vec::with_capacity(capacity),
                scale: 1.0,
            },
            Transform::Cents => ColumnBuffer::Float {
                values: Vec::with_capacity(capacity),
                scale: 100.0,
            },
            Transform::Date => ColumnBuffer::Date(Vec::with_capacity(capacity)),
        }
    }

    fn push(&mut self, raw: &str) -> Result<(), String> {
        match self {
            ColumnBuffer::Str(values) => values.push(raw.trim().to_string()),
            ColumnBuffer::Int(values) => values.push(schema::parse_integer(raw)?),
            ColumnBuffer::Float { values, scale } => {
                values.push(schema::parse_decimal(raw)?.map(|v| v / *scale))
            }
            ColumnBuffer::Date(values) => {
                values.push(schema::parse_date(raw)?.map(schema::date_to_epoch_days))
            }
        }
        Ok(())
    }

    fn into_column(self, col: &ColumnDescriptor) -> Result<Column, DecodeError> {
        let name = PlSmallStr::from(col.name);
        let column = match self {
            ColumnBuffer::Str(values) => Column::new(name, values),
            ColumnBuffer::Int(values) => Column::new(name, values),
            ColumnBuffer::Float { values, .. } => Column::new(name, values),
            ColumnBuffer::Date(values) => Column::new(name, values)
                .cast(&DataType::Date)
                .map_err(|e| DecodeError::Table(format!("{} date cast: {e}", col.name)))?,
        };
        Ok(column)
    }
}
