//! Duration normalization for repertoire items.
//!
//! Every accepted input shape is reduced to whole hours and minutes. Any
//! sub-minute remainder is truncated, never rounded. Blank input is
//! "no duration", which is distinct from a zero-length [`Duration`].

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use thiserror::Error;

const SECS_PER_MINUTE: u32 = 60;
const SECS_PER_HOUR: u32 = 3600;

/// The single validation failure of the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid duration format '{input}'. Use HH:MM or HH:MM:SS.")]
pub struct DurationError {
    input: String,
}

impl DurationError {
    fn new(input: impl fmt::Display) -> Self {
        Self {
            input: input.to_string(),
        }
    }

    /// The rejected input, as submitted.
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// Canonical elapsed time: total seconds, always a whole number of minutes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(from = "u32", into = "u32")]
pub struct Duration {
    total_secs: u32,
}

impl Duration {
    pub const ZERO: Self = Self { total_secs: 0 };

    /// Truncates `secs` down to the nearest whole minute.
    pub fn from_seconds(secs: u32) -> Self {
        Self {
            total_secs: secs - secs % SECS_PER_MINUTE,
        }
    }

    pub fn from_hours_minutes(hours: u32, minutes: u32) -> Option<Self> {
        hours
            .checked_mul(SECS_PER_HOUR)?
            .checked_add(minutes.checked_mul(SECS_PER_MINUTE)?)
            .map(Self::from_seconds)
    }

    pub fn as_seconds(self) -> u32 {
        self.total_secs
    }

    pub fn hours(self) -> u32 {
        self.total_secs / SECS_PER_HOUR
    }

    pub fn minutes(self) -> u32 {
        (self.total_secs % SECS_PER_HOUR) / SECS_PER_MINUTE
    }
}

impl From<u32> for Duration {
    fn from(secs: u32) -> Self {
        Self::from_seconds(secs)
    }
}

impl From<Duration> for u32 {
    fn from(duration: Duration) -> Self {
        duration.total_secs
    }
}

impl From<Duration> for std::time::Duration {
    fn from(duration: Duration) -> Self {
        std::time::Duration::from_secs(duration.total_secs.into())
    }
}

/// `H:MM`: hours unpadded, minutes always two digits.
impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}", self.hours(), self.minutes())
    }
}

/// Strict clock parsing. Blank text is an error here; use
/// [`DurationInput::normalize`] where blank means "no duration".
impl FromStr for Duration {
    type Err = DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_clock(s.trim()).map(Self::from_seconds)
    }
}

/// The external shapes a duration may arrive in.
#[derive(Debug, Clone, PartialEq)]
pub enum DurationInput {
    /// An elapsed-time value, e.g. a previously stored duration.
    Elapsed(std::time::Duration),
    /// A time-picker value; seconds are ignored.
    TimeOfDay(NaiveTime),
    /// `H:MM`, `HH:MM` or `HH:MM:SS`.
    Text(String),
    /// A raw count of seconds.
    Seconds(i64),
}

impl DurationInput {
    /// Maps a JSON payload field onto an input shape. `null` is absent.
    pub fn from_json(value: &Value) -> Result<Option<Self>, DurationError> {
        match value {
            Value::Null => Ok(None),
            Value::String(text) => Ok(Some(Self::Text(text.clone()))),
            Value::Number(number) => {
                if let Some(secs) = number.as_i64() {
                    return Ok(Some(Self::Seconds(secs)));
                }
                number
                    .as_f64()
                    .and_then(whole_seconds)
                    .map(|secs| Some(Self::Seconds(secs)))
                    .ok_or_else(|| DurationError::new(number))
            }
            Value::Object(fields) => clock_fields(fields)
                .map(|time| Some(Self::TimeOfDay(time)))
                .ok_or_else(|| DurationError::new(value)),
            other => Err(DurationError::new(other)),
        }
    }

    /// Converts this input into its canonical form. `Ok(None)` is "no duration".
    pub fn normalize(&self) -> Result<Option<Duration>, DurationError> {
        Ok(self.total_seconds()?.map(Duration::from_seconds))
    }

    fn total_seconds(&self) -> Result<Option<u32>, DurationError> {
        match self {
            Self::Elapsed(elapsed) => u32::try_from(elapsed.as_secs())
                .map(Some)
                .map_err(|_| DurationError::new(format!("{}s", elapsed.as_secs()))),
            Self::TimeOfDay(time) => Ok(Some(
                time.hour() * SECS_PER_HOUR + time.minute() * SECS_PER_MINUTE,
            )),
            Self::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    Ok(None)
                } else {
                    parse_clock(text).map(Some)
                }
            }
            Self::Seconds(secs) => u32::try_from(*secs)
                .map(Some)
                .map_err(|_| DurationError::new(secs)),
        }
    }
}

impl From<Duration> for DurationInput {
    fn from(duration: Duration) -> Self {
        Self::Elapsed(duration.into())
    }
}

impl From<std::time::Duration> for DurationInput {
    fn from(elapsed: std::time::Duration) -> Self {
        Self::Elapsed(elapsed)
    }
}

impl From<NaiveTime> for DurationInput {
    fn from(time: NaiveTime) -> Self {
        Self::TimeOfDay(time)
    }
}

impl From<&str> for DurationInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for DurationInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<i64> for DurationInput {
    fn from(secs: i64) -> Self {
        Self::Seconds(secs)
    }
}

/// Normalizes an optional input. Absent input is "no duration", never zero.
pub fn normalize(input: Option<DurationInput>) -> Result<Option<Duration>, DurationError> {
    match input {
        Some(input) => input.normalize(),
        None => Ok(None),
    }
}

/// Formats an optional duration for display; "no duration" renders empty.
pub fn format_optional(duration: Option<Duration>) -> String {
    duration.map(|d| d.to_string()).unwrap_or_default()
}

/// Formats a raw value (`H:MM:SS`, `H:MM` or numeric seconds) as `H:MM`.
///
/// Never fails: anything that cannot be interpreted is shown as-is.
pub fn display_hhmm(raw: &str) -> String {
    raw_total_seconds(raw.trim())
        .map(|secs| Duration::from_seconds(secs).to_string())
        .unwrap_or_else(|| raw.to_string())
}

fn raw_total_seconds(raw: &str) -> Option<u32> {
    let parts: Vec<&str> = raw.split(':').collect();
    let total = match parts.as_slice() {
        [hours, minutes, seconds] => {
            clock_seconds(hours, minutes)?.checked_add(seconds.parse::<i64>().ok()?)?
        }
        [hours, minutes] => clock_seconds(hours, minutes)?,
        [seconds] => whole_seconds(seconds.parse::<f64>().ok()?)?,
        _ => return None,
    };
    u32::try_from(total).ok()
}

fn clock_seconds(hours: &str, minutes: &str) -> Option<i64> {
    let hours = hours.parse::<i64>().ok()?.checked_mul(SECS_PER_HOUR.into())?;
    let minutes = minutes.parse::<i64>().ok()?.checked_mul(SECS_PER_MINUTE.into())?;
    hours.checked_add(minutes)
}

/// Truncates a fractional second count; `None` if negative or out of range.
fn whole_seconds(secs: f64) -> Option<i64> {
    (secs.is_finite() && (0.0..=f64::from(u32::MAX)).contains(&secs)).then(|| secs.trunc() as i64)
}

/// `H:MM` or `HH:MM`, optionally followed by `:SS`. Seconds are validated
/// and then dropped.
fn parse_clock(text: &str) -> Result<u32, DurationError> {
    let invalid = || DurationError::new(text);
    let mut segments = text.split(':');

    let hours = segments
        .next()
        .filter(|s| is_digits(s, 1..=2))
        .ok_or_else(invalid)?;
    let minutes = segments
        .next()
        .filter(|s| is_digits(s, 2..=2))
        .ok_or_else(invalid)?;
    if let Some(seconds) = segments.next() {
        if !is_digits(seconds, 2..=2) {
            return Err(invalid());
        }
    }
    if segments.next().is_some() {
        return Err(invalid());
    }

    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
    Ok(hours * SECS_PER_HOUR + minutes * SECS_PER_MINUTE)
}

fn is_digits(segment: &str, len: RangeInclusive<usize>) -> bool {
    len.contains(&segment.len()) && segment.bytes().all(|b| b.is_ascii_digit())
}

fn clock_fields(fields: &Map<String, Value>) -> Option<NaiveTime> {
    let component = |name: &str| fields.get(name).and_then(Value::as_u64);
    let hour = u32::try_from(component("hour")?).ok()?;
    let minute = u32::try_from(component("minute")?).ok()?;
    let second = match fields.get("second") {
        None | Some(Value::Null) => 0,
        Some(_) => u32::try_from(component("second")?).ok()?,
    };
    NaiveTime::from_hms_opt(hour, minute, second)
}
