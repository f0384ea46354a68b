//! Line-oriented device reading with a bounded wait.

use crate::error::{Result, SerialcupError};
use async_trait::async_trait;
use bstr::ByteSlice;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// A source of text lines that never blocks longer than the wait it is given.
#[async_trait]
pub trait LineSource: Send {
    /// Read the next non-blank line.
    ///
    /// `Ok(None)` means no complete line arrived within `wait`; it is not an error.
    async fn read_line(&mut self, wait: Duration) -> Result<Option<String>>;

    /// Release the underlying handle. Called exactly once when capture stops.
    async fn close(&mut self) -> Result<()>;
}

/// [`LineSource`] over any async byte stream, typically a serial device node.
///
/// Bytes of a line that has not finished arriving when the wait expires stay buffered and
/// are completed by a later read, so a timeout never splits or drops a line.
pub struct SerialLineSource<R> {
    reader: Option<BufReader<R>>,
    pending: Vec<u8>,
    description: String,
    idle_on_eof: bool,
}

impl<R: AsyncRead + Unpin + Send> SerialLineSource<R> {
    /// Wrap a stream whose end means the device went away.
    pub fn new(reader: R, description: impl Into<String>) -> Self {
        Self {
            reader: Some(BufReader::new(reader)),
            pending: Vec::new(),
            description: description.into(),
            idle_on_eof: false,
        }
    }

    /// Treat zero-byte reads as "no data yet" rather than end of stream.
    ///
    /// Serial terminals configured with an inter-byte timeout report an idle line this way.
    pub fn idle_on_eof(mut self, idle: bool) -> Self {
        self.idle_on_eof = idle;
        self
    }

    fn take_line(&mut self) -> Option<String> {
        let line = self.pending.trim().to_str_lossy().into_owned();
        self.pending.clear();
        if line.is_empty() {
            None
        } else {
            Some(line)
        }
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> LineSource for SerialLineSource<R> {
    async fn read_line(&mut self, wait: Duration) -> Result<Option<String>> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| SerialcupError::device(format!("{} is closed", self.description)))?;

        match tokio::time::timeout(wait, reader.read_until(b'\n', &mut self.pending)).await {
            Err(_elapsed) => Ok(None),
            Ok(Err(e)) => Err(SerialcupError::device(format!(
                "read from {} failed: {e}",
                self.description
            ))),
            Ok(Ok(0)) if self.idle_on_eof => Ok(None),
            Ok(Ok(0)) => {
                if self.pending.is_empty() {
                    Err(SerialcupError::device(format!(
                        "{} stopped producing data",
                        self.description
                    )))
                } else {
                    Ok(self.take_line())
                }
            }
            Ok(Ok(_)) if self.pending.ends_with(b"\n") => Ok(self.take_line()),
            // Stopped short of a newline on a zero-byte read: an inter-byte timeout on an
            // idle terminal, end of input otherwise.
            Ok(Ok(_)) if self.idle_on_eof => Ok(None),
            Ok(Ok(_)) => Ok(self.take_line()),
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.reader.take().is_some() {
            log::debug!("closed {}", self.description);
        }
        Ok(())
    }
}
