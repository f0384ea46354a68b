//! Capture subsystem: appends device lines and operator annotations to rotating segments.
//!
//! - [`session`] owns the open segment, rotation and the pause flag
//! - [`operator`] forwards operator lines from a blocking reader thread
//! - [`engine`] runs the loop that ties device, operator and session together

pub mod engine;
pub mod operator;
pub mod session;

pub use engine::{CaptureEngine, CaptureStats};
pub use operator::spawn_operator_thread;
pub use session::{CaptureSession, CaptureState};
