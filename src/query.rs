//! Query subsystem: reconstructs ordered sub-ranges of captured data.
//!
//! A query resolves its two boundaries once ([`RangeMarker`]), lists the device's segments,
//! skips those whose name proves they lie outside the time range, then streams the rest
//! through the [`RangeGate`] and the optional [`LineFilter`].

pub mod engine;
pub mod filter;
pub mod range;

pub use engine::{QueryEngine, QueryLines, QueryRequest};
pub use filter::LineFilter;
pub use range::{RangeGate, RangeMarker};
