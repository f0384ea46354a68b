//! Segment file naming.
//!
//! `<device_id>.<YYYY_MM_DD_HHMM>.<creation_epoch_secs>.<ext>`
//!
//! The local-time label keeps lexicographic order chronological, and the epoch field lets a
//! reader bound a segment's span without opening it.

use crate::error::{Result, SerialcupError};
use chrono::{DateTime, Local};
use std::fmt;
use std::path::Path;

/// Fixed rotation period. No line in a segment is written later than this after creation.
pub const MAX_DURATION_SECS: i64 = 3600;

/// Extension used for new segments unless configured otherwise.
pub const DEFAULT_EXTENSION: &str = "txt";

const LABEL_FORMAT: &str = "%Y_%m_%d_%H%M";

/// Parsed identity of one rotation segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentName {
    pub device_id: String,
    pub label: String,
    pub created_epoch_secs: i64,
    pub extension: String,
}

impl SegmentName {
    /// Name for a segment created at `created`.
    pub fn for_creation(
        device_id: impl Into<String>,
        created: DateTime<Local>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            label: created.format(LABEL_FORMAT).to_string(),
            created_epoch_secs: created.timestamp(),
            extension: extension.into(),
        }
    }

    /// Parse a file name. The device id may itself contain dots, so fields are taken from
    /// the right.
    pub fn parse(file_name: &str) -> Option<Self> {
        let mut fields = file_name.rsplitn(4, '.');
        let extension = fields.next()?;
        let epoch = fields.next()?;
        let label = fields.next()?;
        let device_id = fields.next()?;

        if device_id.is_empty() || label.is_empty() || extension.is_empty() {
            return None;
        }
        if epoch.is_empty() || !epoch.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        Some(Self {
            device_id: device_id.to_string(),
            label: label.to_string(),
            created_epoch_secs: epoch.parse().ok()?,
            extension: extension.to_string(),
        })
    }

    /// Parse the file name component of `path`.
    pub fn from_path(path: &Path) -> Result<Self> {
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(Self::parse)
            .ok_or_else(|| SerialcupError::InvalidSegmentName {
                path: path.to_path_buf(),
            })
    }

    /// Latest second at which this segment can hold a line.
    pub fn end_epoch_secs(&self) -> i64 {
        self.created_epoch_secs.saturating_add(MAX_DURATION_SECS)
    }

    /// False when the segment's whole span falls outside `[start_ms, end_ms]`.
    ///
    /// Bounds are compared at second resolution, matching the precision of the name.
    pub fn may_overlap(&self, start_ms: Option<i64>, end_ms: Option<i64>) -> bool {
        if let Some(start) = start_ms {
            if self.end_epoch_secs() < start.div_euclid(1000) {
                return false;
            }
        }
        if let Some(end) = end_ms {
            if self.created_epoch_secs > end.div_euclid(1000) {
                return false;
            }
        }
        true
    }
}

impl fmt::Display for SegmentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.device_id, self.label, self.created_epoch_secs, self.extension
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn name_encodes_label_and_epoch() {
        let created = Local.timestamp_opt(1_700_000_000, 0).unwrap();
        let name = SegmentName::for_creation("A9XYZ", created, DEFAULT_EXTENSION);

        let expected_label = created.format("%Y_%m_%d_%H%M").to_string();
        assert_eq!(
            name.to_string(),
            format!("A9XYZ.{expected_label}.1700000000.txt")
        );
        assert_eq!(SegmentName::parse(&name.to_string()), Some(name));
    }

    #[test]
    fn device_ids_with_dots_survive_parsing() {
        let name = SegmentName::parse("usb.A9.XYZ.2024_03_01_1230.1709296200.txt").unwrap();
        assert_eq!(name.device_id, "usb.A9.XYZ");
        assert_eq!(name.label, "2024_03_01_1230");
        assert_eq!(name.created_epoch_secs, 1_709_296_200);
    }

    #[test]
    fn foreign_names_are_rejected() {
        assert_eq!(SegmentName::parse("notes.txt"), None);
        assert_eq!(SegmentName::parse("A9XYZ.label.notanumber.txt"), None);
        assert_eq!(SegmentName::parse(".label.1700000000.txt"), None);
        assert_eq!(SegmentName::parse("A9XYZ.label.1700000000."), None);
    }

    #[test]
    fn from_path_reports_the_offending_path() {
        let path = Path::new("/data/notes.txt");
        match SegmentName::from_path(path) {
            Err(SerialcupError::InvalidSegmentName { path: reported }) => {
                assert_eq!(reported, path)
            }
            other => panic!("expected InvalidSegmentName, got {other:?}"),
        }

        let name = SegmentName::from_path(Path::new("/data/dev.x.1000.txt")).unwrap();
        assert_eq!(name.device_id, "dev");
    }

    #[test]
    fn huge_epoch_fields_do_not_overflow() {
        let name = SegmentName::parse("dev.x.9223372036854775807.txt").unwrap();
        assert_eq!(name.end_epoch_secs(), i64::MAX);
        assert!(name.may_overlap(Some(1_700_000_000_000), None));
        assert!(!name.may_overlap(Some(1_700_000_000_000), Some(1_700_000_000_000)));
    }

    #[test]
    fn overlap_uses_full_rotation_span() {
        let name = SegmentName::parse("dev.x.1000.txt").unwrap();

        assert!(name.may_overlap(None, None));
        // Start inside the last second of the span still overlaps.
        assert!(name.may_overlap(Some(4_600_999), None));
        assert!(!name.may_overlap(Some(4_601_000), None));
        assert!(name.may_overlap(None, Some(1_000_000)));
        assert!(!name.may_overlap(None, Some(999_999)));
    }
}
