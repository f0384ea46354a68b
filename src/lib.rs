//! # serialcup - Serial Capture and Query
//!
//! Records lines from a serial device into hour-long rotating files and reconstructs
//! ordered sub-ranges of them later.
//!
//! ## Features
//!
//! - **Rotating capture**: every line is stamped with epoch milliseconds and flushed
//!   immediately; files rotate after [`segment::MAX_DURATION_SECS`]
//! - **Operator control**: <Enter> pauses and resumes device capture, typed text is inserted
//!   as an annotation even while paused
//! - **Range queries**: bounds may be timestamps (`1700000000`, `2024-03-01 12:00:00`,
//!   `now-1h`) or annotation labels, mixed freely
//! - **Filter and rewrite**: optional regex with back-reference templates
//!
//! ## Architecture
//!
//! - [`error`] - Centralized error types and handling
//! - [`segment`] - Record format, file naming, writing and listing
//! - [`timespec`] - Time specification parsing
//! - [`device`] - Serial device discovery and bounded-wait line reading
//! - [`capture`] - Capture session and loop
//! - [`query`] - Range scan over rotated files
//! - [`config`] - Optional user settings

// Core modules
pub mod clock;
pub mod config;
pub mod error;
pub mod segment;
pub mod timespec;

// Subsystems
pub mod capture;
pub mod device;
pub mod query;

// Re-export commonly used types for convenience
pub use error::{Result, SerialcupError};

// Public API surface for external usage
pub use capture::{CaptureEngine, CaptureSession};
pub use config::Settings;
pub use query::{QueryEngine, QueryRequest};
pub use segment::{LogLine, MAX_DURATION_SECS};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
