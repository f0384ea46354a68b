//! Serial line configuration.

use crate::error::{Result, SerialcupError};
use std::fs::File;

/// Standard rates accepted on every platform.
pub const STANDARD_BAUD_RATES: &[u32] = &[
    1200, 2400, 4800, 9600, 19200, 38400, 57600, 115_200, 230_400,
];

/// Deciseconds a read may wait for the first byte before returning empty-handed.
#[cfg(unix)]
const READ_TIMEOUT_DECISECONDS: u8 = 10;

/// Whether the handle was configured as a terminal. Non-terminal nodes such as FIFOs are
/// read as plain byte streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMode {
    Terminal,
    Stream,
}

/// Put `file` into raw mode at `baud` with a bounded read timeout.
#[cfg(unix)]
pub fn configure(file: &File, baud: u32) -> Result<LineMode> {
    use nix::errno::Errno;
    use nix::sys::termios::{self, ControlFlags, SetArg, SpecialCharacterIndices};

    let mut tio = match termios::tcgetattr(file) {
        Ok(tio) => tio,
        Err(Errno::ENOTTY) => {
            log::warn!("device is not a terminal; reading it as a plain stream");
            return Ok(LineMode::Stream);
        }
        Err(e) => return Err(SerialcupError::device(format!("tcgetattr failed: {e}"))),
    };

    termios::cfmakeraw(&mut tio);
    termios::cfsetspeed(&mut tio, baud_rate(baud)?)
        .map_err(|e| SerialcupError::device(format!("cfsetspeed failed: {e}")))?;
    tio.control_flags |= ControlFlags::CREAD | ControlFlags::CLOCAL;
    tio.control_chars[SpecialCharacterIndices::VMIN as usize] = 0;
    tio.control_chars[SpecialCharacterIndices::VTIME as usize] = READ_TIMEOUT_DECISECONDS;

    termios::tcsetattr(file, SetArg::TCSANOW, &tio)
        .map_err(|e| SerialcupError::device(format!("tcsetattr failed: {e}")))?;
    Ok(LineMode::Terminal)
}

#[cfg(not(unix))]
pub fn configure(_file: &File, _baud: u32) -> Result<LineMode> {
    log::warn!("serial line configuration is not supported on this platform");
    Ok(LineMode::Stream)
}

#[cfg(unix)]
fn baud_rate(baud: u32) -> Result<nix::sys::termios::BaudRate> {
    use nix::sys::termios::BaudRate;

    let rate = match baud {
        1200 => BaudRate::B1200,
        2400 => BaudRate::B2400,
        4800 => BaudRate::B4800,
        9600 => BaudRate::B9600,
        19200 => BaudRate::B19200,
        38400 => BaudRate::B38400,
        57600 => BaudRate::B57600,
        115_200 => BaudRate::B115200,
        230_400 => BaudRate::B230400,
        other => {
            return Err(SerialcupError::invalid_argument(format!(
                "unsupported baud rate {other}"
            )))
        }
    };
    Ok(rate)
}

/// Parse a baud rate argument, accepting only standard rates.
pub fn parse_baud_rate(input: &str) -> Result<u32> {
    let baud: u32 = input
        .trim()
        .parse()
        .map_err(|_| SerialcupError::invalid_argument(format!("baud rate '{input}' is not a number")))?;

    if STANDARD_BAUD_RATES.contains(&baud) {
        Ok(baud)
    } else {
        Err(SerialcupError::invalid_argument(format!(
            "unsupported baud rate {baud}, expected one of {STANDARD_BAUD_RATES:?}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_rates_parse() {
        assert_eq!(parse_baud_rate("115200").unwrap(), 115_200);
        assert_eq!(parse_baud_rate(" 9600 ").unwrap(), 9600);
    }

    #[test]
    fn odd_rates_are_rejected() {
        assert!(matches!(
            parse_baud_rate("12345"),
            Err(SerialcupError::InvalidArgument { .. })
        ));
        assert!(parse_baud_rate("fast").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn regular_files_are_read_as_streams() {
        let file = tempfile::tempfile().unwrap();
        assert_eq!(configure(&file, 9600).unwrap(), LineMode::Stream);
    }
}
