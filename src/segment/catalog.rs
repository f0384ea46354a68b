//! Directory listing of a device's segments.

use crate::error::{Result, SerialcupError};
use crate::segment::SegmentName;
use std::path::{Path, PathBuf};

/// A segment found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentFile {
    pub name: SegmentName,
    pub path: PathBuf,
}

/// List the segments of `device_id` in `dir`, in file name order.
///
/// File name order is chronological because the name's second field is a zero-padded
/// local-time label. Files that carry the device prefix but do not parse are skipped.
pub fn list_segments(dir: &Path, device_id: &str) -> Result<Vec<SegmentFile>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        SerialcupError::file_error(format!("Failed to list directory: {}", dir.display()), e)
    })?;

    let prefix = format!("{device_id}.");
    let mut segments = Vec::new();

    for entry in entries {
        let entry = entry.map_err(|e| {
            SerialcupError::file_error(format!("Failed to list directory: {}", dir.display()), e)
        })?;
        let file_name = entry.file_name();
        let Some(file_name) = file_name.to_str() else {
            continue;
        };
        if !file_name.starts_with(&prefix) {
            continue;
        }

        let path = entry.path();
        match SegmentName::from_path(&path) {
            Ok(name) if name.device_id == device_id => segments.push(SegmentFile { name, path }),
            Ok(_) => {
                // Longer device id sharing our prefix, e.g. `dev.a` vs `dev`.
            }
            Err(e) => log::warn!("skipping {}", e),
        }
    }

    segments.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn lists_only_this_device_in_name_order() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        touch(dir.path(), "dev.2024_03_01_1330.1709299800.txt");
        touch(dir.path(), "dev.2024_03_01_1230.1709296200.txt");
        touch(dir.path(), "other.2024_03_01_1230.1709296200.txt");
        touch(dir.path(), "device.2024_03_01_1230.1709296200.txt");
        touch(dir.path(), "dev.junk");

        let segments = list_segments(dir.path(), "dev").unwrap();
        let epochs: Vec<i64> = segments
            .iter()
            .map(|s| s.name.created_epoch_secs)
            .collect();
        assert_eq!(epochs, vec![1_709_296_200, 1_709_299_800]);
    }

    #[test]
    fn dotted_device_ids_do_not_capture_each_other() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        touch(dir.path(), "dev.a.2024_03_01_1230.1709296200.txt");
        touch(dir.path(), "dev.2024_03_01_1230.1709296200.txt");

        assert_eq!(list_segments(dir.path(), "dev").unwrap().len(), 1);
        assert_eq!(list_segments(dir.path(), "dev.a").unwrap().len(), 1);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        assert!(list_segments(&dir.path().join("missing"), "dev").is_err());
    }
}
