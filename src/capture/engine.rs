//! The capture loop.
//!
//! Two inputs feed the loop: the device, read with a bounded wait, and operator lines
//! arriving over an mpsc channel from a blocking stdin thread. Operator input is always
//! drained before the device is polled. While paused the device is not touched and the loop
//! sleeps on the operator channel alone.

use crate::capture::session::{CaptureSession, CaptureState};
use crate::device::LineSource;
use crate::error::Result;
use std::future::Future;
use std::io::Write;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;

/// Counters reported when a capture run ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub device_lines: u64,
    pub annotations: u64,
}

/// Drives one capture run over a device source and an operator channel.
pub struct CaptureEngine<S, W> {
    source: S,
    operator_rx: UnboundedReceiver<String>,
    operator_open: bool,
    console: W,
    read_timeout: Duration,
    stats: CaptureStats,
}

impl<S: LineSource, W: Write + Send> CaptureEngine<S, W> {
    pub fn new(
        source: S,
        operator_rx: UnboundedReceiver<String>,
        console: W,
        read_timeout: Duration,
    ) -> Self {
        Self {
            source,
            operator_rx,
            operator_open: true,
            console,
            read_timeout,
            stats: CaptureStats::default(),
        }
    }

    /// Run until `shutdown` resolves or an error stops the loop.
    ///
    /// The device and the session's open segment are closed on every exit path; a close
    /// failure is reported only if the loop itself succeeded.
    pub async fn run<F>(&mut self, session: &mut CaptureSession, shutdown: F) -> Result<CaptureStats>
    where
        F: Future<Output = ()> + Send,
    {
        tokio::pin!(shutdown);

        log::info!(
            "capturing {} into {}",
            session.device_id(),
            session.dir().display()
        );
        self.notice("STARTED capture");
        self.notice("- Hit <Enter> to pause/resume");
        self.notice("- Type text and hit <Enter> to insert a line into a file with captured data");

        let outcome = self.event_loop(session, shutdown.as_mut()).await;

        let source_closed = self.source.close().await;
        let session_closed = session.close();
        self.notice("STOPPED capture");

        if let Err(ref e) = outcome {
            log::error!("capture stopped: {}", e);
        }
        outcome?;
        source_closed?;
        session_closed?;

        log::info!(
            "capture finished: {} device lines, {} annotations",
            self.stats.device_lines,
            self.stats.annotations
        );
        Ok(self.stats)
    }

    pub fn stats(&self) -> CaptureStats {
        self.stats
    }

    pub fn console(&self) -> &W {
        &self.console
    }

    async fn event_loop<F>(
        &mut self,
        session: &mut CaptureSession,
        mut shutdown: Pin<&mut F>,
    ) -> Result<()>
    where
        F: Future<Output = ()> + Send,
    {
        loop {
            self.drain_operator(session)?;

            if session.is_paused() {
                if !self.operator_open {
                    self.notice("operator input closed while paused");
                    return Ok(());
                }

                tokio::select! {
                    () = shutdown.as_mut() => return Ok(()),
                    text = self.operator_rx.recv() => match text {
                        Some(text) => self.handle_operator(session, text)?,
                        None => self.operator_closed(),
                    },
                }
                continue;
            }

            tokio::select! {
                biased;
                () = shutdown.as_mut() => return Ok(()),
                text = self.operator_rx.recv(), if self.operator_open => match text {
                    Some(text) => self.handle_operator(session, text)?,
                    None => self.operator_closed(),
                },
                read = self.source.read_line(self.read_timeout) => {
                    if let Some(data) = read? {
                        session.append(&data)?;
                        self.stats.device_lines += 1;
                    }
                }
            }
        }
    }

    fn drain_operator(&mut self, session: &mut CaptureSession) -> Result<()> {
        while self.operator_open {
            match self.operator_rx.try_recv() {
                Ok(text) => self.handle_operator(session, text)?,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => self.operator_closed(),
            }
        }
        Ok(())
    }

    fn handle_operator(&mut self, session: &mut CaptureSession, text: String) -> Result<()> {
        if text.is_empty() {
            match session.toggle_pause() {
                CaptureState::Paused => self.notice("PAUSED capture"),
                CaptureState::Running => self.notice("RESUMED capture"),
            }
        } else {
            let line = session.append(&text)?;
            self.stats.annotations += 1;
            self.notice(&format!("INSERTED: {line}"));
        }
        Ok(())
    }

    fn operator_closed(&mut self) {
        log::info!("operator input closed; capturing device data only");
        self.operator_open = false;
    }

    /// Operator-facing status line. Console failures never stop a capture.
    fn notice(&mut self, message: &str) {
        let written = writeln!(self.console, "> {message}").and_then(|()| self.console.flush());
        if let Err(e) = written {
            log::warn!("console write failed: {}", e);
        }
    }
}
