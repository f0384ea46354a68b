//! Chronological scan over a device's segments.

use crate::clock::{Clock, SystemClock};
use crate::error::{Result, SerialcupError};
use crate::query::filter::LineFilter;
use crate::query::range::{RangeGate, RangeMarker};
use crate::segment::{list_segments, split_record, SegmentFile};
use bstr::ByteSlice;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Parameters of one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub dir: PathBuf,
    pub device_id: String,
    pub start: String,
    pub end: String,
    pub pattern: Option<String>,
    pub rewrite: Option<String>,
}

impl QueryRequest {
    pub fn new(
        dir: impl Into<PathBuf>,
        device_id: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        Self {
            dir: dir.into(),
            device_id: device_id.into(),
            start: start.into(),
            end: end.into(),
            pattern: None,
            rewrite: None,
        }
    }

    /// Keep only lines matching `pattern`, rewriting them with `rewrite` when given.
    pub fn with_filter(mut self, pattern: impl Into<String>, rewrite: Option<String>) -> Self {
        self.pattern = Some(pattern.into());
        self.rewrite = rewrite;
        self
    }
}

/// Plans queries against segment directories.
pub struct QueryEngine {
    clock: Arc<dyn Clock>,
}

impl Default for QueryEngine {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl QueryEngine {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Resolve the range, select candidate segments and return the lazy line sequence.
    ///
    /// Boundary and pattern errors surface here, before any segment is read.
    pub fn run(&self, request: &QueryRequest) -> Result<QueryLines> {
        let start = RangeMarker::resolve(&request.start, self.clock.as_ref())?;
        let end = RangeMarker::resolve(&request.end, self.clock.as_ref())?;
        let gate = RangeGate::new(start, end);

        let filter = match &request.pattern {
            Some(pattern) => Some(LineFilter::new(pattern, request.rewrite.as_deref())?),
            None => None,
        };

        let (start_ms, end_ms) = gate.time_bounds();
        let segments: VecDeque<SegmentFile> = list_segments(&request.dir, &request.device_id)?
            .into_iter()
            .filter(|segment| {
                let keep = segment.name.may_overlap(start_ms, end_ms);
                if !keep {
                    log::debug!("skipping {} outside range", segment.path.display());
                }
                keep
            })
            .collect();

        log::debug!(
            "query {} in {}: {} candidate segments",
            request.device_id,
            request.dir.display(),
            segments.len()
        );

        Ok(QueryLines {
            segments,
            current: None,
            gate,
            filter,
            buf: Vec::new(),
            finished: false,
        })
    }
}

struct OpenSegment {
    path: PathBuf,
    reader: BufReader<File>,
}

/// Matching lines in chronological order, read lazily one segment at a time.
///
/// A read failure is yielded once as an error and ends the sequence.
pub struct QueryLines {
    segments: VecDeque<SegmentFile>,
    current: Option<OpenSegment>,
    gate: RangeGate,
    filter: Option<LineFilter>,
    buf: Vec<u8>,
    finished: bool,
}

impl QueryLines {
    /// Write every line to `out`, newline-terminated. Returns the number of lines written.
    ///
    /// A closed pipe on `out` ends the output early without error.
    pub fn write_to<W: Write>(self, out: &mut W) -> Result<u64> {
        let mut count = 0;
        for line in self {
            let line = line?;
            match writeln!(out, "{line}") {
                Ok(()) => count += 1,
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => return Ok(count),
                Err(e) => return Err(SerialcupError::file_error("Failed to write output", e)),
            }
        }
        match out.flush() {
            Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => {
                Err(SerialcupError::file_error("Failed to write output", e))
            }
            _ => Ok(count),
        }
    }

    fn open_next(&mut self) -> Option<Result<()>> {
        let segment = self.segments.pop_front()?;
        match File::open(&segment.path) {
            Ok(file) => {
                log::debug!("scanning {}", segment.path.display());
                self.current = Some(OpenSegment {
                    path: segment.path,
                    reader: BufReader::new(file),
                });
                Some(Ok(()))
            }
            Err(e) => Some(Err(SerialcupError::file_error(
                format!("Failed to open segment: {}", segment.path.display()),
                e,
            ))),
        }
    }

    fn process(&mut self) -> Option<String> {
        let text = self.buf.to_str_lossy();
        let text = text.trim_end_matches(['\n', '\r']);

        let Some((timestamp_ms, payload)) = split_record(text) else {
            if !text.is_empty() {
                log::debug!("skipping malformed record {:?}", text);
            }
            return None;
        };

        if !self.gate.admit(timestamp_ms, payload) {
            return None;
        }

        match &self.filter {
            Some(filter) => filter.apply(text).map(|line| line.into_owned()),
            None => Some(text.to_string()),
        }
    }

    fn fail(&mut self, error: SerialcupError) -> Option<Result<String>> {
        self.finished = true;
        self.current = None;
        Some(Err(error))
    }
}

impl Iterator for QueryLines {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }

            let Some(segment) = self.current.as_mut() else {
                match self.open_next() {
                    Some(Ok(())) => continue,
                    Some(Err(e)) => return self.fail(e),
                    None => {
                        self.finished = true;
                        return None;
                    }
                }
            };

            self.buf.clear();
            match segment.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => self.current = None,
                Ok(_) => {
                    if let Some(line) = self.process() {
                        return Some(Ok(line));
                    }
                }
                Err(e) => {
                    let message = format!("Failed to read segment: {}", segment.path.display());
                    return self.fail(SerialcupError::file_error(message, e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use tempfile::TempDir;

    fn write_segment(dir: &TempDir, name: &str, content: &str) {
        std::fs::write(dir.path().join(name), content).unwrap();
    }

    fn collect(request: &QueryRequest) -> Vec<String> {
        QueryEngine::new(Arc::new(ManualClock::new(2_000_000_000_000)))
            .run(request)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn malformed_and_partial_records_are_skipped() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        write_segment(
            &dir,
            "dev.2023_11_14_2213.1700000000.txt",
            "1700000000001,a\ngarbage\n\n1700000000002,b\n17000000",
        );

        let lines = collect(&QueryRequest::new(dir.path(), "dev", "-", "-"));
        assert_eq!(lines, vec!["1700000000001,a", "1700000000002,b"]);
    }

    #[test]
    fn time_spec_errors_abort_before_scanning() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let request = QueryRequest::new(dir.path().join("missing"), "dev", "now-5x", "now");

        let result = QueryEngine::default().run(&request);
        assert!(matches!(result, Err(SerialcupError::TimeSpec { .. })));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let request = QueryRequest::new(dir.path().join("missing"), "dev", "-", "-");
        assert!(QueryEngine::default().run(&request).is_err());
    }

    #[test]
    fn write_to_counts_lines() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        write_segment(
            &dir,
            "dev.2023_11_14_2213.1700000000.txt",
            "1700000000001,a\n1700000000002,b\n",
        );

        let lines = QueryEngine::default()
            .run(&QueryRequest::new(dir.path(), "dev", "", ""))
            .unwrap();
        let mut out = Vec::new();
        assert_eq!(lines.write_to(&mut out).unwrap(), 2);
        assert_eq!(out, b"1700000000001,a\n1700000000002,b\n");
    }
}
