//! Serial device enumeration.
//!
//! Devices are discovered through udev's stable symlink directory, whose entries look like
//! `usb-FTDI_FT232R_USB_UART_A9XYZ123-if00-port0`. The trailing underscore-separated field
//! before the interface suffix is the adapter's serial number.

use crate::error::{Result, SerialcupError};
use std::path::{Path, PathBuf};

/// Default directory of stable serial device links on Linux.
pub const DEFAULT_DEVICE_DIR: &str = "/dev/serial/by-id";

/// A serial device visible to the system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Stable link name
    pub name: String,
    /// Serial number parsed from the link name, when it has one
    pub serial_number: Option<String>,
    /// Path to open (the stable link itself)
    pub path: PathBuf,
    /// Kernel device node the link points to
    pub target: PathBuf,
}

impl DeviceInfo {
    fn from_link(path: PathBuf) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_string();
        let target = std::fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
        Some(Self {
            serial_number: serial_from_link_name(&name),
            name,
            path,
            target,
        })
    }

    /// True when `device_id` names this device, by serial number or full link name.
    pub fn matches(&self, device_id: &str) -> bool {
        self.serial_number.as_deref() == Some(device_id) || self.name == device_id
    }
}

/// Enumerate devices in `dir`, sorted by name. A missing directory means no devices.
pub fn list_devices(dir: &Path) -> Result<Vec<DeviceInfo>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("device directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(SerialcupError::file_error(
                format!("Failed to list devices in {}", dir.display()),
                e,
            ))
        }
    };

    let mut devices = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            SerialcupError::file_error(format!("Failed to list devices in {}", dir.display()), e)
        })?;
        if let Some(info) = DeviceInfo::from_link(entry.path()) {
            devices.push(info);
        }
    }
    devices.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(devices)
}

/// Find the device identified by `device_id` in `dir`.
pub fn find_device(dir: &Path, device_id: &str) -> Result<DeviceInfo> {
    let devices = list_devices(dir)?;

    // Exact serial number wins over a link name that happens to equal another device's id.
    devices
        .iter()
        .find(|d| d.serial_number.as_deref() == Some(device_id))
        .or_else(|| devices.iter().find(|d| d.matches(device_id)))
        .cloned()
        .ok_or_else(|| SerialcupError::device_not_found(device_id))
}

/// Extract the serial number from a udev by-id link name.
pub fn serial_from_link_name(name: &str) -> Option<String> {
    let (_bus, rest) = name.split_once('-')?;
    let identity = match rest.rfind("-if") {
        Some(idx) => &rest[..idx],
        None => rest,
    };
    let serial = identity.rsplit('_').next()?;
    if serial.is_empty() {
        None
    } else {
        Some(serial.to_string())
    }
}
