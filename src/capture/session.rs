//! Capture session state: the open segment, its age and the pause flag.

use crate::clock::Clock;
use crate::error::{Result, SerialcupError};
use crate::segment::{LogLine, SegmentName, SegmentWriter, MAX_DURATION_SECS};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Whether device data is being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Running,
    Paused,
}

/// All mutable state of one capture run. Owned by the capture loop and passed to it by
/// exclusive reference.
pub struct CaptureSession {
    dir: PathBuf,
    device_id: String,
    extension: String,
    clock: Arc<dyn Clock>,
    writer: Option<SegmentWriter>,
    created_ms: i64,
    state: CaptureState,
    segments_opened: usize,
}

impl CaptureSession {
    /// Create `dir` if needed and open the first segment, named from the current time.
    pub fn open(
        dir: impl Into<PathBuf>,
        device_id: impl Into<String>,
        extension: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            SerialcupError::file_error(format!("Failed to create directory: {}", dir.display()), e)
        })?;

        let mut session = Self {
            dir,
            device_id: device_id.into(),
            extension: extension.into(),
            clock,
            writer: None,
            created_ms: 0,
            state: CaptureState::Running,
            segments_opened: 0,
        };
        let now = session.clock.now();
        session.open_segment(now)?;
        Ok(session)
    }

    /// Append `payload` stamped with the current time, rotating first if the open segment
    /// has reached its maximum age. Returns the line as written.
    pub fn append(&mut self, payload: &str) -> Result<LogLine> {
        let now = self.clock.now();
        let now_ms = now.timestamp_millis();

        if now_ms - self.created_ms >= MAX_DURATION_SECS * 1000 {
            self.rotate(now)?;
        }

        let line = LogLine::new(now_ms, payload);
        self.writer
            .as_mut()
            .ok_or_else(|| SerialcupError::other("capture session is closed"))?
            .append(&line)?;
        Ok(line)
    }

    /// Flip between running and paused, returning the new state.
    pub fn toggle_pause(&mut self) -> CaptureState {
        self.state = match self.state {
            CaptureState::Running => CaptureState::Paused,
            CaptureState::Paused => CaptureState::Running,
        };
        self.state
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_paused(&self) -> bool {
        self.state == CaptureState::Paused
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the segment currently receiving appends.
    pub fn current_segment(&self) -> Option<&Path> {
        self.writer.as_ref().map(SegmentWriter::path)
    }

    /// Name of the segment currently receiving appends.
    pub fn current_name(&self) -> Option<&SegmentName> {
        self.writer.as_ref().map(SegmentWriter::name)
    }

    pub fn segments_opened(&self) -> usize {
        self.segments_opened
    }

    /// Flush and close the open segment. Later calls are no-ops.
    pub fn close(&mut self) -> Result<()> {
        match self.writer.take() {
            Some(writer) => writer.close(),
            None => Ok(()),
        }
    }

    fn rotate(&mut self, now: DateTime<Local>) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            log::info!("rotating segment {}", writer.name());
            writer.close()?;
        }
        self.open_segment(now)
    }

    fn open_segment(&mut self, now: DateTime<Local>) -> Result<()> {
        let name = SegmentName::for_creation(self.device_id.clone(), now, self.extension.clone());
        self.writer = Some(SegmentWriter::create(&self.dir, name)?);
        self.created_ms = now.timestamp_millis();
        self.segments_opened += 1;
        Ok(())
    }
}
