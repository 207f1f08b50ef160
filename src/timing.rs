use crate::error::ShortError;

use std::fmt;
use std::time::Duration;

use chrono::{NaiveTime, Timelike};

const WINDOW_FORMAT: &str = "%H:%M:%S";
const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Inclusive span of the source video to keep, as times of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Window {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Parses both bounds from `HH:MM:SS` strings. Bounds are not checked
    /// against each other; see [`Window::ensure_ordered`].
    pub fn parse(start: &str, end: &str) -> Result<Self, ShortError> {
        Ok(Self::new(parse_clock(start)?, parse_clock(end)?))
    }

    pub fn ensure_ordered(&self) -> Result<(), ShortError> {
        if self.start < self.end {
            Ok(())
        } else {
            Err(ShortError::InvalidWindow {
                start: self.start.to_string(),
                end: self.end.to_string(),
            })
        }
    }

    pub fn start_secs(&self) -> u64 {
        u64::from(self.start.num_seconds_from_midnight())
    }

    pub fn end_secs(&self) -> u64 {
        u64::from(self.end.num_seconds_from_midnight())
    }

    /// Whole seconds from midnight to the window start.
    pub fn shift(&self) -> i64 {
        seconds_between(NaiveTime::MIN, self.start)
    }

    /// The same window as seen from a track shifted left by [`Window::shift`]:
    /// it starts at midnight and keeps its length.
    pub fn rebased(&self) -> Window {
        let length = self.end_secs().saturating_sub(self.start_secs());
        Window::new(NaiveTime::MIN, time_of_day(Duration::from_secs(length)))
    }

    /// `HH-MM-SS_HH-MM-SS`, used to name clip files.
    pub fn file_tag(&self) -> String {
        format!(
            "{}_{}",
            self.start.format("%H-%M-%S"),
            self.end.format("%H-%M-%S")
        )
    }

    pub fn contains_overlap(&self, show_at: Duration, hide_at: Duration) -> bool {
        time_of_day(show_at) <= self.end && time_of_day(hide_at) >= self.start
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            self.start.format(WINDOW_FORMAT),
            self.end.format(WINDOW_FORMAT)
        )
    }
}

/// Parses an `HH:MM:SS` time of day.
pub fn parse_clock(input: &str) -> Result<NaiveTime, ShortError> {
    NaiveTime::parse_from_str(input.trim(), WINDOW_FORMAT)
        .map_err(|_| ShortError::InvalidTime(input.to_string()))
}

/// Clap value parser for `HH:MM:SS` arguments.
pub fn clock_arg(input: &str) -> Result<NaiveTime, String> {
    parse_clock(input).map_err(|e| e.to_string())
}

/// Whole seconds from `start` to `end`, both `HH:MM:SS`. Negative when `end`
/// comes first.
pub fn time_difference_in_seconds(start: &str, end: &str) -> Result<i64, ShortError> {
    Ok(seconds_between(parse_clock(start)?, parse_clock(end)?))
}

fn seconds_between(start: NaiveTime, end: NaiveTime) -> i64 {
    (end - start).num_seconds()
}

/// Clap value parser for a shift: whole seconds, or an `HH:MM:SS` origin
/// meaning "the seconds from midnight to this time".
pub fn shift_arg(input: &str) -> Result<i64, String> {
    match input.trim().parse::<i64>() {
        Ok(secs) => Ok(secs),
        Err(_) => time_difference_in_seconds("00:00:00", input).map_err(|e| e.to_string()),
    }
}

/// Time of day reached `offset` after midnight. Offsets of a day or more wrap.
pub fn time_of_day(offset: Duration) -> NaiveTime {
    let secs = (offset.as_secs() % SECONDS_PER_DAY) as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, offset.subsec_nanos())
        .unwrap_or(NaiveTime::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn parses_window_bounds() {
        let window = Window::parse("00:05:10", "00:05:20").unwrap();
        assert_eq!(window.start, hms(0, 5, 10));
        assert_eq!(window.end, hms(0, 5, 20));
        assert_eq!(window.to_string(), "00:05:10-00:05:20");
    }

    #[test]
    fn accepts_unpadded_clock() {
        assert_eq!(parse_clock("0:5:10").unwrap(), hms(0, 5, 10));
    }

    #[test]
    fn rejects_bad_clock() {
        assert!(parse_clock("00:05").is_err());
        assert!(parse_clock("25:00:00").is_err());
        assert!(parse_clock("nope").is_err());
    }

    #[test]
    fn difference_in_seconds() {
        assert_eq!(time_difference_in_seconds("00:05:10", "00:05:20").unwrap(), 10);
        assert_eq!(time_difference_in_seconds("00:00:00", "00:05:10").unwrap(), 310);
        assert_eq!(time_difference_in_seconds("01:00:00", "00:59:30").unwrap(), -30);
        assert!(time_difference_in_seconds("00:00:00", "x").is_err());
    }

    #[test]
    fn shift_accepts_seconds_or_origin() {
        assert_eq!(shift_arg("310"), Ok(310));
        assert_eq!(shift_arg("-5"), Ok(-5));
        assert_eq!(shift_arg("00:05:10"), Ok(310));
        assert!(shift_arg("five").is_err());
    }

    #[test]
    fn rebased_window_starts_at_midnight() {
        let window = Window::parse("00:05:10", "00:05:20").unwrap();
        assert_eq!(window.shift(), 310);
        assert_eq!(window.rebased(), Window::new(hms(0, 0, 0), hms(0, 0, 10)));
    }

    #[test]
    fn ordering_is_checked() {
        assert!(Window::parse("00:05:10", "00:05:20").unwrap().ensure_ordered().is_ok());
        assert!(Window::parse("00:05:20", "00:05:20").unwrap().ensure_ordered().is_err());
        assert!(Window::parse("00:05:30", "00:05:20").unwrap().ensure_ordered().is_err());
    }

    #[test]
    fn file_tag_uses_dashes() {
        let window = Window::parse("0:5:10", "0:5:20").unwrap();
        assert_eq!(window.file_tag(), "00-05-10_00-05-20");
    }

    #[test]
    fn time_of_day_keeps_millis_and_wraps() {
        assert_eq!(
            time_of_day(Duration::from_millis(312_500)),
            NaiveTime::from_hms_milli_opt(0, 5, 12, 500).unwrap()
        );
        assert_eq!(time_of_day(Duration::from_secs(SECONDS_PER_DAY + 5)), hms(0, 0, 5));
    }

    #[test]
    fn overlap_is_inclusive() {
        let window = Window::parse("00:00:10", "00:00:20").unwrap();
        let secs = Duration::from_secs;
        assert!(window.contains_overlap(secs(5), secs(10)));
        assert!(window.contains_overlap(secs(20), secs(25)));
        assert!(window.contains_overlap(secs(12), secs(15)));
        assert!(!window.contains_overlap(secs(0), secs(9)));
        assert!(!window.contains_overlap(Duration::from_millis(20_001), secs(30)));
    }
}
