//! Range boundaries and the label state machine.

use crate::clock::Clock;
use crate::error::Result;
use crate::timespec::parse_time_spec;

/// Boundary strings that mean "no gate on this side".
pub const OPEN_MARKERS: &[&str] = &["", "-"];

/// One side of a query range, resolved once per query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeMarker {
    /// No bound on this side
    Open,
    /// Absolute bound in epoch milliseconds, inclusive
    Timestamp(i64),
    /// Payload that opens (start) or closes (end) a region on exact match
    Label(String),
}

impl RangeMarker {
    /// Resolve a boundary string. Fails only for malformed time specs such as `now-5x`.
    pub fn resolve(input: &str, clock: &dyn Clock) -> Result<Self> {
        if OPEN_MARKERS.contains(&input) {
            return Ok(Self::Open);
        }
        Ok(match parse_time_spec(input, clock)? {
            Some(ms) => Self::Timestamp(ms),
            None => Self::Label(input.to_string()),
        })
    }

    pub fn timestamp(&self) -> Option<i64> {
        match self {
            Self::Timestamp(ms) => Some(*ms),
            _ => None,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Label(label) => Some(label),
            _ => None,
        }
    }
}

/// Decides, line by line, whether a record falls inside the query range.
///
/// Timestamp bounds are checked first. Label bounds then toggle an inside flag: the line
/// equal to the start label enters the region, the next line equal to the end label leaves
/// it, and neither boundary line is admitted. A start label can open several regions in
/// one scan.
#[derive(Debug, Clone)]
pub struct RangeGate {
    start: RangeMarker,
    end: RangeMarker,
    inside: bool,
}

impl RangeGate {
    pub fn new(start: RangeMarker, end: RangeMarker) -> Self {
        let inside = !matches!(start, RangeMarker::Label(_));
        Self { start, end, inside }
    }

    /// `(start_ms, end_ms)` for the sides that are timestamps.
    pub fn time_bounds(&self) -> (Option<i64>, Option<i64>) {
        (self.start.timestamp(), self.end.timestamp())
    }

    pub fn is_inside(&self) -> bool {
        self.inside
    }

    /// Feed the next record in scan order; returns whether it belongs in the output.
    pub fn admit(&mut self, timestamp_ms: i64, payload: &str) -> bool {
        let (start_ms, end_ms) = self.time_bounds();
        if start_ms.is_some_and(|start| timestamp_ms < start) {
            return false;
        }
        if end_ms.is_some_and(|end| timestamp_ms > end) {
            return false;
        }

        if self.inside {
            if self.end.label() == Some(payload) {
                self.inside = false;
                return false;
            }
            true
        } else {
            if self.start.label() == Some(payload) {
                self.inside = true;
            }
            false
        }
    }
}
