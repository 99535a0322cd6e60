// Pipeline ingestion: reading line-delimited JSON exports into raw records

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::ResolvedSource;
use crate::domain::Dataset;
use crate::error::{QualityError, Result};
use crate::metrics::IngestionMetrics;

/// One export line parsed into a JSON object, before normalization
pub type RawRecord = Map<String, Value>;

/// What happened while reading one export file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub path: PathBuf,
    /// Lines in the file, including skipped and blank ones
    pub lines_read: usize,
    /// Leading lines dropped by configuration
    pub lines_skipped: usize,
    /// 1-based line numbers that were not a JSON object
    pub malformed_lines: Vec<usize>,
}

impl LoadReport {
    pub fn malformed_count(&self) -> usize {
        self.malformed_lines.len()
    }
}

/// Raw records of one export plus its load report
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub dataset: Dataset,
    pub records: Vec<RawRecord>,
    pub report: LoadReport,
}

/// Read `path`, skip its first `skip` lines and parse every remaining
/// non-empty line as a standalone JSON object.
///
/// Lines that are not valid UTF-8 JSON, or are JSON but not an object, are
/// dropped and counted. Skipped lines are never decoded. Only I/O failures
/// (missing or unreadable file) are errors.
pub fn load_json_lines(path: &Path, skip: usize) -> Result<(Vec<RawRecord>, LoadReport)> {
    let file = File::open(path).map_err(|e| QualityError::io(path, e))?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    let mut report = LoadReport {
        path: path.to_path_buf(),
        ..LoadReport::default()
    };

    // Lines are split as raw bytes so an undecodable line is only malformed
    for (index, line) in reader.split(b'\n').enumerate() {
        let line = line.map_err(|e| QualityError::io(path, e))?;
        let line_number = index + 1;
        report.lines_read += 1;

        if index < skip {
            report.lines_skipped += 1;
            debug!(line = line_number, "Skipping leading line");
            continue;
        }
        let line = line.strip_suffix(b"\r").unwrap_or(&line);
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        match serde_json::from_slice::<Value>(line) {
            Ok(Value::Object(object)) => records.push(object),
            Ok(other) => {
                warn!(
                    path = %path.display(),
                    line = line_number,
                    kind = json_kind(&other),
                    "Dropping line that is not a JSON object"
                );
                report.malformed_lines.push(line_number);
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    line = line_number,
                    error = %e,
                    "Dropping malformed JSON line"
                );
                report.malformed_lines.push(line_number);
            }
        }
    }

    Ok((records, report))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Load one configured export
pub fn load_dataset(source: &ResolvedSource) -> Result<LoadedDataset> {
    let dataset_name = source.dataset.name();
    let (records, report) = match load_json_lines(&source.path, source.skip_lines) {
        Ok(loaded) => loaded,
        Err(e) => {
            IngestionMetrics::record_load_failure(dataset_name);
            return Err(e);
        }
    };

    IngestionMetrics::record_load(
        dataset_name,
        records.len(),
        report.malformed_count(),
        report.lines_skipped,
    );
    info!(
        dataset = dataset_name,
        path = %source.path.display(),
        records = records.len(),
        malformed = report.malformed_count(),
        skipped = report.lines_skipped,
        "Loaded export"
    );

    Ok(LoadedDataset {
        dataset: source.dataset,
        records,
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_lines(content: &str) -> NamedTempFile {
        write_bytes(content.as_bytes())
    }

    fn write_bytes(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        file
    }

    #[test]
    fn test_parses_each_line_as_an_object() {
        let file = write_lines("{\"_id\": \"a\"}\n{\"_id\": \"b\"}\n");
        let (records, report) = load_json_lines(file.path(), 0).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["_id"], "b");
        assert_eq!(report.lines_read, 2);
        assert!(report.malformed_lines.is_empty());
    }

    #[test]
    fn test_skips_leading_lines() {
        let file = write_lines("\u{1f}garbage header\n{\"_id\": \"a\"}\n");
        let (records, report) = load_json_lines(file.path(), 1).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(report.lines_skipped, 1);
        assert!(report.malformed_lines.is_empty());
    }

    #[test]
    fn test_malformed_lines_are_dropped_not_fatal() {
        let file = write_lines("{\"_id\": \"a\"}\n{not json\n[1, 2]\n\n{\"_id\": \"b\"}\n");
        let (records, report) = load_json_lines(file.path(), 0).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(report.malformed_lines, vec![2, 3]);
        assert_eq!(report.lines_read, 5);
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = load_json_lines(Path::new("/no/such/export.json"), 0).unwrap_err();
        assert!(matches!(err, QualityError::Io { .. }));
    }

    #[test]
    fn test_skip_beyond_end_yields_empty_table() {
        let file = write_lines("{\"_id\": \"a\"}\n");
        let (records, report) = load_json_lines(file.path(), 5).unwrap();
        assert!(records.is_empty());
        assert_eq!(report.lines_skipped, 1);
    }

    #[test]
    fn test_undecodable_header_is_skipped_without_decoding() {
        let file = write_bytes(b"\xff\xfe\x1f\x8b garbage\n{\"_id\": \"a\"}\n");
        let (records, report) = load_json_lines(file.path(), 1).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["_id"], "a");
        assert_eq!(report.lines_skipped, 1);
        assert!(report.malformed_lines.is_empty());
    }

    #[test]
    fn test_undecodable_line_is_dropped_not_fatal() {
        let file = write_bytes(b"{\"_id\": \"a\"}\n{\"_id\": \"\xff\"}\n{\"_id\": \"b\"}\n");
        let (records, report) = load_json_lines(file.path(), 0).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(report.malformed_lines, vec![2]);
        assert_eq!(report.lines_read, 3);
    }

    #[test]
    fn test_crlf_line_endings_are_accepted() {
        let file = write_lines("{\"_id\": \"a\"}\r\n\r\n{\"_id\": \"b\"}\r\n");
        let (records, report) = load_json_lines(file.path(), 0).unwrap();
        assert_eq!(records.len(), 2);
        assert!(report.malformed_lines.is_empty());
    }
}
