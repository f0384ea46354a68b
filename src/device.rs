//! Serial device access.
//!
//! The capture engine only sees [`LineSource`]; this module supplies the real implementation
//! over a serial device node plus discovery of attached devices.

pub mod discovery;
pub mod source;
pub mod termios;

pub use discovery::{find_device, list_devices, DeviceInfo, DEFAULT_DEVICE_DIR};
pub use source::{LineSource, SerialLineSource};
pub use termios::{parse_baud_rate, LineMode};

use crate::error::{Result, SerialcupError};
use std::fs::OpenOptions;

/// Open `device` at `baud` as a line source.
pub fn open_device(device: &DeviceInfo, baud: u32) -> Result<SerialLineSource<tokio::fs::File>> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(&device.path)
        .map_err(|e| {
            SerialcupError::device(format!("cannot open {}: {e}", device.path.display()))
        })?;

    let mode = termios::configure(&file, baud)?;
    log::info!(
        "opened {} ({}) at {baud} baud",
        device.name,
        device.target.display()
    );

    Ok(
        SerialLineSource::new(tokio::fs::File::from_std(file), device.name.clone())
            .idle_on_eof(mode == LineMode::Terminal),
    )
}
