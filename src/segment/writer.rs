//! Append-only writer for one segment file.

use crate::error::{Result, SerialcupError};
use crate::segment::{LogLine, SegmentName};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Open segment accepting appends. Every append is flushed before returning.
#[derive(Debug)]
pub struct SegmentWriter {
    file: File,
    path: PathBuf,
    name: SegmentName,
}

impl SegmentWriter {
    /// Open (or reopen for append) the segment `name` inside `dir`.
    pub fn create(dir: &Path, name: SegmentName) -> Result<Self> {
        let path = dir.join(name.to_string());
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                SerialcupError::file_error(
                    format!("Failed to open segment: {}", path.display()),
                    e,
                )
            })?;

        log::debug!("opened segment {}", path.display());
        Ok(Self { file, path, name })
    }

    /// Write one record and flush it to the OS.
    pub fn append(&mut self, line: &LogLine) -> Result<()> {
        self.file
            .write_all(line.encode().as_bytes())
            .and_then(|()| self.file.flush())
            .map_err(|e| {
                SerialcupError::file_error(
                    format!("Failed to append to segment: {}", self.path.display()),
                    e,
                )
            })
    }

    /// Flush and sync, then release the handle.
    pub fn close(mut self) -> Result<()> {
        self.file
            .flush()
            .and_then(|()| self.file.sync_all())
            .map_err(|e| {
                SerialcupError::file_error(
                    format!("Failed to close segment: {}", self.path.display()),
                    e,
                )
            })?;
        log::debug!("closed segment {}", self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &SegmentName {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn segment_name() -> SegmentName {
        SegmentName::parse("dev.2024_03_01_1230.1709296200.txt").unwrap()
    }

    #[test]
    fn appends_are_visible_immediately() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let mut writer = SegmentWriter::create(dir.path(), segment_name()).unwrap();

        writer.append(&LogLine::new(1, "first")).unwrap();
        writer.append(&LogLine::new(2, "second,with,commas")).unwrap();

        let content = std::fs::read_to_string(writer.path()).unwrap();
        assert_eq!(content, "1,first\n2,second,with,commas\n");
        writer.close().unwrap();
    }

    #[test]
    fn reopening_appends_instead_of_truncating() {
        let dir = TempDir::new().expect("Failed to create temp directory");

        let mut writer = SegmentWriter::create(dir.path(), segment_name()).unwrap();
        writer.append(&LogLine::new(1, "before")).unwrap();
        writer.close().unwrap();

        let mut writer = SegmentWriter::create(dir.path(), segment_name()).unwrap();
        writer.append(&LogLine::new(2, "after")).unwrap();
        let path = writer.path().to_path_buf();
        writer.close().unwrap();

        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "1,before\n2,after\n"
        );
    }

    #[test]
    fn missing_directory_is_a_file_error() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let missing = dir.path().join("nope");

        match SegmentWriter::create(&missing, segment_name()) {
            Err(SerialcupError::FileError { message, .. }) => {
                assert!(message.contains("Failed to open segment"));
            }
            other => panic!("expected FileError, got {other:?}"),
        }
    }
}
