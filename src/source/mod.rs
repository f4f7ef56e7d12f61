//! Chunked flat-file reader.
//!
//! Yields batches of records from a delimited file in source order,
//! projected down to the caller's column subset so unused fields are never
//! materialized. The reader is restartable from the start (open it again)
//! but not resumable mid-stream.
//!
//! A malformed individual record is surfaced inside the batch rather than
//! dropped; the normalizer's tolerance policy decides what happens to it.

use crate::error::EtlError;
use std::fs::File;
use std::path::{Path, PathBuf};

/// One source record, fields in projection order.
pub type Record = Vec<String>;

#[derive(Debug)]
pub struct ChunkedReader {
    reader: csv::Reader<File>,
    /// Source column index for each projected column.
    projection: Vec<usize>,
    chunk_size: usize,
    path: PathBuf,
    done: bool,
}

impl ChunkedReader {
    /// Open a delimited file and project it to `columns`, in that order.
    ///
    /// Fails with `SourceUnavailable` when the file cannot be opened and
    /// with `InvalidSource` when an expected column is missing from the
    /// header row.
    pub fn open(
        path: &Path,
        delimiter: u8,
        columns: &[&str],
        chunk_size: usize,
    ) -> Result<Self, EtlError> {
        let file = File::open(path).map_err(|source| EtlError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

        // IMDb exports contain raw quote characters in fields; quoting is
        // plain text here, not CSV structure.
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .quoting(delimiter == b',')
            .flexible(true)
            .from_reader(file);

        let headers = reader.headers()?.clone();
        let mut projection = Vec::with_capacity(columns.len());
        for column in columns {
            let index = headers
                .iter()
                .position(|h| h == *column)
                .ok_or_else(|| EtlError::InvalidSource {
                    path: path.to_path_buf(),
                    column: column.to_string(),
                })?;
            projection.push(index);
        }

        Ok(ChunkedReader {
            reader,
            projection,
            chunk_size,
            path: path.to_path_buf(),
            done: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Iterator for ChunkedReader {
    /// One batch of records; individually malformed records appear as
    /// `Err` entries in source order.
    type Item = Vec<Result<Record, EtlError>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut chunk = Vec::with_capacity(self.chunk_size);
        let mut raw = csv::StringRecord::new();
        while chunk.len() < self.chunk_size {
            match self.reader.read_record(&mut raw) {
                Ok(true) => {
                    let record = self
                        .projection
                        .iter()
                        .map(|&i| raw.get(i).unwrap_or("").to_string())
                        .collect();
                    chunk.push(Ok(record));
                }
                Ok(false) => {
                    self.done = true;
                    break;
                }
                Err(e) => chunk.push(Err(EtlError::Malformed(e))),
            }
        }

        if chunk.is_empty() {
            None
        } else {
            Some(chunk)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn tsv_fixture(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn reads_in_chunks_with_projection() {
        let file = tsv_fixture(
            "tconst\ttitleType\tprimaryTitle\n\
             tt1\tshort\tCarmencita\n\
             tt2\tmovie\tL'arrivee d'un train\n\
             tt3\tmovie\tThe Kiss\n",
        );

        let mut reader =
            ChunkedReader::open(file.path(), b'\t', &["primaryTitle", "tconst"], 2).unwrap();

        let first = reader.next().unwrap();
        assert_eq!(first.len(), 2);
        let record = first[0].as_ref().unwrap();
        // Projection order, not source order
        assert_eq!(record, &vec!["Carmencita".to_string(), "tt1".to_string()]);

        let second = reader.next().unwrap();
        assert_eq!(second.len(), 1);
        assert!(reader.next().is_none());
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let err = ChunkedReader::open(Path::new("/no/such/file.tsv"), b'\t', &["tconst"], 10)
            .unwrap_err();
        assert!(matches!(err, EtlError::SourceUnavailable { .. }));
    }

    #[test]
    fn missing_column_is_invalid_source() {
        let file = tsv_fixture("tconst\ttitleType\ntt1\tshort\n");
        let err =
            ChunkedReader::open(file.path(), b'\t', &["tconst", "genres"], 10).unwrap_err();
        match err {
            EtlError::InvalidSource { column, .. } => assert_eq!(column, "genres"),
            other => panic!("expected InvalidSource, got {other:?}"),
        }
    }

    #[test]
    fn short_record_pads_missing_fields() {
        let file = tsv_fixture("tconst\ttitleType\tgenres\ntt1\tshort\n");
        let mut reader =
            ChunkedReader::open(file.path(), b'\t', &["tconst", "genres"], 10).unwrap();
        let chunk = reader.next().unwrap();
        let record = chunk[0].as_ref().unwrap();
        assert_eq!(record, &vec!["tt1".to_string(), String::new()]);
    }

    #[test]
    fn quotes_are_plain_text_in_tab_sources() {
        let file = tsv_fixture("tconst\tprimaryTitle\ntt1\t\"Weird Al\" Yankovic\n");
        let mut reader =
            ChunkedReader::open(file.path(), b'\t', &["primaryTitle"], 10).unwrap();
        let chunk = reader.next().unwrap();
        let record = chunk[0].as_ref().unwrap();
        assert_eq!(record[0], "\"Weird Al\" Yankovic");
    }

    #[test]
    fn restart_from_start_by_reopening() {
        let file = tsv_fixture("tconst\ntt1\ntt2\n");
        let count = |path: &Path| {
            ChunkedReader::open(path, b'\t', &["tconst"], 10)
                .unwrap()
                .flatten()
                .count()
        };
        assert_eq!(count(file.path()), 2);
        assert_eq!(count(file.path()), 2);
    }
}
