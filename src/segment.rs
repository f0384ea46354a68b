//! On-disk segment format: record lines, file names, writing and listing.
//!
//! A capture session writes `<epoch_ms>,<payload>` lines into segments that rotate every
//! [`MAX_DURATION_SECS`]. Segment file names carry enough information for the query engine to
//! order them and skip the ones outside a time range without reading them.

pub mod catalog;
pub mod line;
pub mod name;
pub mod writer;

pub use catalog::{list_segments, SegmentFile};
pub use line::{split_record, LogLine};
pub use name::{SegmentName, DEFAULT_EXTENSION, MAX_DURATION_SECS};
pub use writer::SegmentWriter;
