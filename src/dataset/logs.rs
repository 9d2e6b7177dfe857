//! Readers for the files of a session directory.

use crate::defaults;
use crate::error::{EegError, Result};
use crate::report::{Diagnostic, Reporter};
use crate::stream::types::Marker;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const SOURCE: &str = "logs";

/// Parsed sample log, rows in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleLog {
    /// Data channel names in column order; `timestamp` and `TRG` excluded.
    pub channels: Vec<String>,
    pub timestamps: Vec<f64>,
    /// Row-major values, `channels.len()` per row.
    pub values: Vec<f64>,
    /// Rows that could not be parsed and were skipped.
    pub malformed_rows: usize,
}

impl SampleLog {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Channel values of row `index`.
    pub fn row(&self, index: usize) -> &[f64] {
        let width = self.channels.len();
        &self.values[index * width..(index + 1) * width]
    }

    /// Index of the first row whose timestamp is `>= t`.
    ///
    /// Relies on the log being sorted by timestamp.
    pub fn first_at_or_after(&self, t: f64) -> usize {
        self.timestamps.partition_point(|&ts| ts < t)
    }
}

/// One row of the marker log.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerRow {
    pub timestamp: f64,
    pub marker: Marker,
    /// Line number in the marker log, for diagnostics.
    pub line: u64,
}

/// Fails with [`EegError::MissingLog`] unless `dir/file` exists.
pub fn require_log(dir: &Path, file: &str) -> Result<PathBuf> {
    let path = dir.join(file);
    if path.is_file() {
        Ok(path)
    } else {
        Err(EegError::MissingLog {
            file: file.to_string(),
            dir: dir.to_path_buf(),
        })
    }
}

fn open(path: &Path) -> Result<csv::Reader<fs::File>> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(|source| EegError::LogRead {
            path: path.to_path_buf(),
            source,
        })
}

fn column(headers: &csv::StringRecord, path: &Path, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| EegError::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
        })
}

fn parse_field(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
) -> std::result::Result<f64, String> {
    let field = record
        .get(index)
        .ok_or_else(|| format!("missing '{name}' field"))?;
    field
        .parse::<f64>()
        .map_err(|_| format!("'{field}' is not a number in column '{name}'"))
}

/// Reads `data.csv`.
///
/// Rows that fail to parse are skipped, reported and counted. A timestamp that
/// goes backwards is reported once; rows are kept in file order regardless.
pub fn read_sample_log(path: &Path, reporter: &dyn Reporter) -> Result<SampleLog> {
    let mut reader = open(path)?;
    let headers = reader
        .headers()
        .map_err(|source| EegError::LogRead {
            path: path.to_path_buf(),
            source,
        })?
        .clone();

    let timestamp_column = column(&headers, path, defaults::TIMESTAMP_COLUMN)?;
    let data_columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| {
            !h.is_empty() && *h != defaults::TIMESTAMP_COLUMN && *h != defaults::TRIGGER_COLUMN
        })
        .map(|(i, h)| (i, h.to_string()))
        .collect();

    let mut log = SampleLog {
        channels: data_columns.iter().map(|(_, name)| name.clone()).collect(),
        ..SampleLog::default()
    };
    let mut row = Vec::with_capacity(data_columns.len());
    let mut unsorted_reported = false;

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(source) if source.is_io_error() => {
                return Err(EegError::LogRead {
                    path: path.to_path_buf(),
                    source,
                });
            }
            Err(error) => {
                let line = error.position().map(|p| p.line()).unwrap_or(0);
                log.malformed_rows += 1;
                reporter.report(
                    SOURCE,
                    &Diagnostic::MalformedRow {
                        path: path.to_path_buf(),
                        line,
                        reason: error.to_string(),
                    },
                );
                continue;
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let parsed = parse_field(&record, timestamp_column, defaults::TIMESTAMP_COLUMN).and_then(
            |timestamp| {
                row.clear();
                for (index, name) in &data_columns {
                    row.push(parse_field(&record, *index, name)?);
                }
                Ok(timestamp)
            },
        );
        let timestamp = match parsed {
            Ok(timestamp) => timestamp,
            Err(reason) => {
                log.malformed_rows += 1;
                reporter.report(
                    SOURCE,
                    &Diagnostic::MalformedRow {
                        path: path.to_path_buf(),
                        line,
                        reason,
                    },
                );
                continue;
            }
        };

        if !unsorted_reported
            && let Some(&last) = log.timestamps.last()
            && timestamp < last
        {
            unsorted_reported = true;
            reporter.report(
                SOURCE,
                &Diagnostic::UnsortedSamples {
                    path: path.to_path_buf(),
                    line,
                },
            );
        }

        log.timestamps.push(timestamp);
        log.values.extend_from_slice(&row);
    }

    Ok(log)
}

/// Reads `markers.csv`. Any malformed row fails the whole read.
pub fn read_marker_log(path: &Path) -> Result<Vec<MarkerRow>> {
    let mut reader = open(path)?;
    let headers = reader
        .headers()
        .map_err(|source| EegError::LogRead {
            path: path.to_path_buf(),
            source,
        })?
        .clone();
    let timestamp_column = column(&headers, path, defaults::TIMESTAMP_COLUMN)?;
    let marker_column = column(&headers, path, defaults::MARKER_COLUMN)?;

    let mut markers = Vec::new();
    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(source) if source.is_io_error() => {
                return Err(EegError::LogRead {
                    path: path.to_path_buf(),
                    source,
                });
            }
            Err(error) => {
                return Err(EegError::MalformedMarker {
                    path: path.to_path_buf(),
                    line: error.position().map(|p| p.line()).unwrap_or(0),
                    message: error.to_string(),
                });
            }
        };
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let malformed = |message: String| EegError::MalformedMarker {
            path: path.to_path_buf(),
            line,
            message,
        };

        let timestamp = parse_field(&record, timestamp_column, defaults::TIMESTAMP_COLUMN)
            .map_err(malformed)?;
        let marker = match record.get(marker_column) {
            Some(field) if !field.is_empty() => Marker::parse(field),
            _ => return Err(malformed("empty marker field".to_string())),
        };

        markers.push(MarkerRow {
            timestamp,
            marker,
            line,
        });
    }

    Ok(markers)
}

/// Reads the stimulus frequencies from `frequencies.txt`.
///
/// A missing file falls back to the legacy stimulus set and reports it.
pub fn read_stimuli(path: &Path, reporter: &dyn Reporter) -> Result<Vec<f64>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let stimuli = defaults::LEGACY_STIMULI.to_vec();
            reporter.report(
                SOURCE,
                &Diagnostic::DefaultStimuli {
                    path: path.to_path_buf(),
                    stimuli: stimuli.clone(),
                },
            );
            return Ok(stimuli);
        }
        Err(e) => return Err(e.into()),
    };

    let Some(line) = text.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return Err(EegError::MalformedStimuli {
            path: path.to_path_buf(),
            message: "file is empty".to_string(),
        });
    };

    line.split(',')
        .map(str::trim)
        .map(|field| {
            field.parse::<f64>().map_err(|_| EegError::MalformedStimuli {
                path: path.to_path_buf(),
                message: format!("'{field}' is not a frequency"),
            })
        })
        .collect()
}

/// Writes `frequencies.txt` as a single comma-separated line.
pub fn write_stimuli(path: &Path, stimuli: &[f64]) -> Result<()> {
    let line = stimuli
        .iter()
        .map(f64::to_string)
        .collect::<Vec<_>>()
        .join(",");
    fs::write(path, format!("{line}\n"))?;
    Ok(())
}
