//! Time specification parsing for query range boundaries.
//!
//! A boundary string resolves to an absolute epoch-millisecond instant when it is one of
//! the recognized forms, checked in order:
//!
//! 1. ten digits: whole seconds since the epoch
//! 2. thirteen digits: milliseconds since the epoch
//! 3. `YYYY-MM-DD HH:MM:SS` in local time
//! 4. `now`
//! 5. `now-<N><unit>` with unit `s`, `m`, `h` or `d`
//!
//! Anything else is "not a timestamp" and the caller uses it as a label. Only strings that
//! commit to a form and then break it are errors: an unknown unit in `now-<N><unit>`, an
//! impossible calendar date, or a local time skipped by a DST transition.

use crate::clock::Clock;
use crate::error::{Result, SerialcupError};
use chrono::{LocalResult, NaiveDateTime, TimeZone};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const NOW: &str = "now";
const NOW_MINUS: &str = "now-";

/// Resolve `input` to epoch milliseconds, or `Ok(None)` when it is not a time spec.
pub fn parse_time_spec(input: &str, clock: &dyn Clock) -> Result<Option<i64>> {
    if is_digits(input, 10) {
        return Ok(Some(parse_digits(input)? * 1000));
    }

    if is_digits(input, 13) {
        return Ok(Some(parse_digits(input)?));
    }

    if has_datetime_shape(input) {
        return parse_local_datetime(input).map(Some);
    }

    if input == NOW {
        return Ok(Some(clock.now().timestamp_millis()));
    }

    if let Some(relative) = input.strip_prefix(NOW_MINUS) {
        return parse_relative(input, relative, clock);
    }

    Ok(None)
}

fn is_digits(input: &str, len: usize) -> bool {
    input.len() == len && input.bytes().all(|b| b.is_ascii_digit())
}

fn parse_digits(input: &str) -> Result<i64> {
    input
        .parse::<i64>()
        .map_err(|e| SerialcupError::time_spec(input, e.to_string()))
}

/// Strict `dddd-dd-dd dd:dd:dd` shape check, so that labels such as `2024-release` are
/// never mistaken for a malformed date.
fn has_datetime_shape(input: &str) -> bool {
    const SHAPE: &[u8] = b"dddd-dd-dd dd:dd:dd";
    input.len() == SHAPE.len()
        && input.bytes().zip(SHAPE).all(|(b, &s)| match s {
            b'd' => b.is_ascii_digit(),
            _ => b == s,
        })
}

fn parse_local_datetime(input: &str) -> Result<i64> {
    let naive = NaiveDateTime::parse_from_str(input, DATETIME_FORMAT)
        .map_err(|e| SerialcupError::time_spec(input, e.to_string()))?;

    match chrono::Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.timestamp_millis()),
        // Repeated wall-clock hour (DST fold): take the first occurrence.
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.timestamp_millis()),
        LocalResult::None => Err(SerialcupError::time_spec(
            input,
            "local time does not exist in the current time zone",
        )),
    }
}

fn parse_relative(input: &str, relative: &str, clock: &dyn Clock) -> Result<Option<i64>> {
    let digits_end = relative
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(relative.len());

    // `now-ish` and friends are ordinary labels.
    if digits_end == 0 {
        return Ok(None);
    }

    let (amount, unit) = relative.split_at(digits_end);
    let unit_ms: i64 = match unit {
        "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        "" => {
            return Err(SerialcupError::time_spec(
                input,
                "missing unit, expected one of s, m, h, d",
            ))
        }
        other => {
            return Err(SerialcupError::time_spec(
                input,
                format!("unknown unit '{other}', expected one of s, m, h, d"),
            ))
        }
    };

    let offset = amount
        .parse::<i64>()
        .ok()
        .and_then(|n| n.checked_mul(unit_ms))
        .ok_or_else(|| SerialcupError::time_spec(input, "offset out of range"))?;

    clock
        .now()
        .timestamp_millis()
        .checked_sub(offset)
        .map(Some)
        .ok_or_else(|| SerialcupError::time_spec(input, "offset out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::Local;
    use proptest::prelude::*;

    const NOW_MS: i64 = 1_700_000_123_456;

    fn parse(input: &str) -> Result<Option<i64>> {
        parse_time_spec(input, &ManualClock::new(NOW_MS))
    }

    #[test]
    fn epoch_seconds_are_scaled_to_millis() {
        assert_eq!(parse("1700000000").unwrap(), Some(1_700_000_000_000));
    }

    #[test]
    fn epoch_millis_are_taken_verbatim() {
        assert_eq!(parse("1700000000000").unwrap(), Some(1_700_000_000_000));
    }

    #[test]
    fn other_digit_counts_are_labels() {
        assert_eq!(parse("170000000").unwrap(), None);
        assert_eq!(parse("17000000000").unwrap(), None);
    }

    #[test]
    fn local_datetime_is_resolved_in_local_zone() {
        let expected = Local
            .with_ymd_and_hms(2024, 3, 1, 12, 30, 15)
            .earliest()
            .unwrap()
            .timestamp_millis();
        assert_eq!(parse("2024-03-01 12:30:15").unwrap(), Some(expected));
    }

    #[test]
    fn impossible_date_is_an_error() {
        let err = parse("2024-02-30 10:00:00").unwrap_err();
        assert!(matches!(err, SerialcupError::TimeSpec { .. }));
    }

    #[test]
    fn now_reads_the_clock() {
        assert_eq!(parse("now").unwrap(), Some(NOW_MS));
    }

    #[test]
    fn relative_units() {
        assert_eq!(parse("now-30s").unwrap(), Some(NOW_MS - 30_000));
        assert_eq!(parse("now-10m").unwrap(), Some(NOW_MS - 600_000));
        assert_eq!(parse("now-2h").unwrap(), Some(NOW_MS - 7_200_000));
        assert_eq!(parse("now-1d").unwrap(), Some(NOW_MS - 86_400_000));
    }

    #[test]
    fn unknown_relative_unit_is_an_error() {
        match parse("now-5x") {
            Err(SerialcupError::TimeSpec { input, message }) => {
                assert_eq!(input, "now-5x");
                assert!(message.contains("'x'"));
            }
            other => panic!("expected time spec error, got {other:?}"),
        }
        assert!(parse("now-5").is_err());
        assert!(parse("now-5mm").is_err());
    }

    #[test]
    fn relative_overflow_is_an_error() {
        assert!(parse("now-99999999999999999999d").is_err());
    }

    #[test]
    fn everything_else_is_a_label() {
        for label in ["release-v2", "start", "now-ish", "NOW", "2024-03-01", ""] {
            assert_eq!(parse(label).unwrap(), None, "{label:?} should be a label");
        }
    }

    proptest! {
        #[test]
        fn seconds_and_millis_agree(secs in 1_000_000_000i64..=9_999_999_999) {
            let from_secs = parse(&secs.to_string()).unwrap();
            let from_millis = parse(&(secs * 1000).to_string()).unwrap();
            prop_assert_eq!(from_secs, Some(secs * 1000));
            prop_assert_eq!(from_secs, from_millis);
        }

        #[test]
        fn relative_offsets_subtract_from_now(n in 0i64..100_000, unit in "[smhd]") {
            let scale = match unit.as_str() {
                "s" => 1_000,
                "m" => 60_000,
                "h" => 3_600_000,
                _ => 86_400_000,
            };
            prop_assert_eq!(parse(&format!("now-{n}{unit}")).unwrap(), Some(NOW_MS - n * scale));
        }

        #[test]
        fn non_numeric_words_are_labels(word in "[a-z][a-z0-9_-]{0,15}") {
            prop_assume!(word != "now" && !word.starts_with("now-"));
            prop_assert_eq!(parse(&word).unwrap(), None);
        }
    }
}
