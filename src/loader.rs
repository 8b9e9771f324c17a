use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use itertools::Itertools;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use rayon::prelude::*;

use crate::error::Error;
use crate::iterutils::ParallelRouteErrorsExt;
use crate::models::LogRecord;
use crate::parser::{self, ParseError};

/// Grammar of the bracketed timestamp field, e.g. `01/Jul/1995:00:00:01 -0400`.
pub const TIMESTAMP_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Reference instant for the `epoch_seconds` column. All timestamps are
/// normalized to UTC before subtracting, so differing `-0400`/`+0000` offsets
/// across records compare correctly.
static EPOCH_REFERENCE: Lazy<DateTime<Utc>> =
    Lazy::new(|| Utc.with_ymd_and_hms(1995, 1, 1, 0, 0, 0).unwrap());

/// Extension allow-list the original analysis keeps when asked to focus on
/// document-like resources.
pub const DOCUMENT_EXTENSIONS: &[&str] = &[
    "htm", "html", "pdf", "asp", "exe", "txt", "doc", "ppt", "xls", "xml",
];

const PARSE_CHUNK_SIZE: usize = 100_000;
const PROGRESS_EVERY: usize = 500_000;
const SKIPPED_LINE_SAMPLES: usize = 5;

/// Line tally of one load. `skipped` covers blank lines and grammar
/// mismatches alike; `total_lines == valid + skipped` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadStats {
    pub total_lines: usize,
    pub valid: usize,
    pub skipped: usize,
}

/// Line iterator that replaces invalid UTF-8 instead of failing; 1995-era
/// access logs carry arbitrary bytes.
pub struct LossyLines<R> {
    reader: R,
    buf: Vec<u8>,
}

pub fn lossy_lines<R: BufRead>(reader: R) -> LossyLines<R> {
    LossyLines {
        reader,
        buf: Vec::new(),
    }
}

impl<R: BufRead> Iterator for LossyLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<io::Result<String>> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.ends_with(b"\n") {
                    self.buf.pop();
                }
                if self.buf.ends_with(b"\r") {
                    self.buf.pop();
                }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

pub fn load_file(path: impl AsRef<Path>) -> Result<(Vec<LogRecord>, LoadStats), Error> {
    let path = path.as_ref();
    info!("loading access log from {}", path.display());
    let file = File::open(path)?;
    load(BufReader::new(file))
}

/// Drives the line parser over a whole source and derives the typed columns.
///
/// Per-line failures are skipped and counted, never fatal. The load itself
/// fails only when the source cannot be read or when nothing parses at all.
pub fn load<R: BufRead>(source: R) -> Result<(Vec<LogRecord>, LoadStats), Error> {
    let (err_tx, err_rx) = crossbeam_channel::unbounded::<ParseError>();
    let mut records: Vec<LogRecord> = Vec::new();
    let mut total_lines = 0usize;

    for chunk in &lossy_lines(source).chunks(PARSE_CHUNK_SIZE) {
        let mut batch: Vec<String> = Vec::with_capacity(PARSE_CHUNK_SIZE);
        for line in chunk {
            let line = line?;
            total_lines += 1;
            if total_lines % PROGRESS_EVERY == 0 {
                info!("read {} lines, {} records so far", total_lines, records.len());
            }
            // Blank lines are never offered to the parser, only counted.
            if line.trim().is_empty() {
                continue;
            }
            batch.push(line);
        }
        let parsed: Vec<LogRecord> = batch
            .par_drain(..)
            .map(|line| parser::parse(&line))
            .route_errors(&err_tx)
            .map(LogRecord::from_parsed)
            .collect();
        records.extend(parsed);
    }
    drop(err_tx);

    let mut unparseable = 0usize;
    for err in err_rx.try_iter() {
        if unparseable < SKIPPED_LINE_SAMPLES {
            debug!("{}", err);
        }
        unparseable += 1;
    }

    let stats = LoadStats {
        total_lines,
        valid: records.len(),
        skipped: total_lines - records.len(),
    };
    info!(
        "parsed {} lines: {} valid, {} skipped ({} of those unparseable)",
        stats.total_lines, stats.valid, stats.skipped, unparseable
    );

    if stats.valid == 0 {
        return Err(Error::NoValidData {
            total_lines: stats.total_lines,
            skipped: stats.skipped,
        });
    }

    derive_time_columns(&mut records);
    derive_extensions(&mut records);
    Ok((records, stats))
}

/// Parses `timestamp_raw` and fills `event_time` plus the UTC-normalized
/// `epoch_seconds`. A conversion failure nulls the columns for that record
/// only; the record stays in the table.
fn derive_time_columns(records: &mut [LogRecord]) {
    records.par_iter_mut().for_each(|rec| {
        rec.event_time = DateTime::parse_from_str(&rec.timestamp_raw, TIMESTAMP_FORMAT).ok();
        rec.epoch_seconds = rec.event_time.map(|dt| {
            let since_reference = dt.with_timezone(&Utc) - *EPOCH_REFERENCE;
            since_reference.num_milliseconds() as f64 / 1000.0
        });
    });
    let missing = records.iter().filter(|r| r.event_time.is_none()).count();
    if missing > 0 {
        warn!("{} records have an unconvertible timestamp", missing);
    }
}

fn derive_extensions(records: &mut [LogRecord]) {
    records.par_iter_mut().for_each(|rec| {
        rec.extension = page_extension(&rec.page);
    });
}

/// Lowercase suffix of the last path segment, without the leading dot.
/// Empty for directories, dotless names and dot-leading names.
pub fn page_extension(page: &str) -> String {
    let segment = page.rsplit('/').next().unwrap_or("");
    match segment.rfind('.') {
        Some(idx) if idx > 0 => segment[idx + 1..].to_lowercase(),
        _ => String::new(),
    }
}

/// Keeps records whose extension is allowed or empty (pages without a
/// suffix are typically directories and stay in).
pub fn filter_by_extensions(records: Vec<LogRecord>, allowed: &HashSet<String>) -> Vec<LogRecord> {
    let before = records.len();
    let kept: Vec<LogRecord> = records
        .into_iter()
        .filter(|r| r.extension.is_empty() || allowed.contains(&r.extension))
        .collect();
    info!(
        "extension filter: {} rows before, {} after, {} removed",
        before,
        kept.len(),
        before - kept.len()
    );
    kept
}
