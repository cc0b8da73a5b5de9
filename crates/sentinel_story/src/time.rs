//! Event timestamps and how the timeline renders them.
//!
//! Graph exporters write timestamps in a few shapes: RFC 3339 strings,
//! pandas-style `2018-04-06 11:20:00.123456` strings without an offset, bare
//! dates, or integer epoch milliseconds. [`EventTime::resolve`] accepts all of
//! them. Strings without an offset are wall-clock times: they are read in
//! the zone of the [`TimelineClock`] that renders them, so a naive
//! `11:20:00` always prints as `11:20:00 AM`.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Formats tried, in order, for timestamps that carry no UTC offset.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// `toLocaleTimeString()` layout for the en-US locale, e.g. `3:04:05 PM`.
const TIMELINE_FORMAT: &str = "%-I:%M:%S %p";

/// The raw `ts` value of an edge, as found in the graph document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventTime {
    /// Milliseconds since the Unix epoch.
    EpochMillis(i64),
    /// A textual date/time.
    Text(String),
}

impl EventTime {
    /// Parses the value into a UTC instant, reading naive strings as UTC.
    ///
    /// Returns `None` when the value is not a recognizable date/time.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_story::EventTime;
    ///
    /// let ts = EventTime::from("2024-01-01T00:00:00Z");
    /// assert!(ts.parse().is_some());
    ///
    /// let ts = EventTime::from("2018-04-06 11:20:00.123456");
    /// assert!(ts.parse().is_some());
    ///
    /// assert!(EventTime::from("yesterday").parse().is_none());
    /// ```
    pub fn parse(&self) -> Option<DateTime<Utc>> {
        self.resolve(TimelineClock::Utc)
    }

    /// Parses the value into a UTC instant, reading naive strings in `clock`'s zone.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_story::{EventTime, TimelineClock};
    ///
    /// let ts = EventTime::from("2018-04-06 11:20:00");
    /// let local = ts.resolve(TimelineClock::Local).unwrap();
    /// assert_eq!(TimelineClock::Local.format(&local), "11:20:00 AM");
    /// ```
    pub fn resolve(&self, clock: TimelineClock) -> Option<DateTime<Utc>> {
        match self {
            EventTime::EpochMillis(ms) => DateTime::from_timestamp_millis(*ms),
            EventTime::Text(raw) => match parse_text(raw.trim())? {
                Parsed::Instant(ts) => Some(ts),
                Parsed::Naive(naive) => clock.localize(&naive),
            },
        }
    }
}

enum Parsed {
    Instant(DateTime<Utc>),
    Naive(NaiveDateTime),
}

impl Default for EventTime {
    fn default() -> Self {
        EventTime::Text(String::new())
    }
}

impl From<&str> for EventTime {
    fn from(raw: &str) -> Self {
        EventTime::Text(raw.to_string())
    }
}

impl From<String> for EventTime {
    fn from(raw: String) -> Self {
        EventTime::Text(raw)
    }
}

impl From<DateTime<Utc>> for EventTime {
    fn from(ts: DateTime<Utc>) -> Self {
        EventTime::Text(ts.to_rfc3339())
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTime::EpochMillis(ms) => write!(f, "{}", ms),
            EventTime::Text(raw) => f.write_str(raw),
        }
    }
}

fn parse_text(raw: &str) -> Option<Parsed> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(Parsed::Instant(ts.with_timezone(&Utc)));
    }
    // pandas writes "+00:00" offsets after a space-separated time
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(Parsed::Instant(ts.with_timezone(&Utc)));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Parsed::Naive(naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(Parsed::Naive)
}

/// The clock the timeline renders event times in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineClock {
    /// The host's local time zone, as a browser would show it.
    #[default]
    Local,
    /// Coordinated Universal Time; deterministic across hosts.
    Utc,
}

impl TimelineClock {
    /// Renders an instant as a wall-clock time, e.g. `12:00:00 AM`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_story::{EventTime, TimelineClock};
    ///
    /// let ts = EventTime::from("2024-01-01T13:05:09Z").parse().unwrap();
    /// assert_eq!(TimelineClock::Utc.format(&ts), "1:05:09 PM");
    /// ```
    pub fn format(&self, ts: &DateTime<Utc>) -> String {
        match self {
            TimelineClock::Local => ts.with_timezone(&Local).format(TIMELINE_FORMAT).to_string(),
            TimelineClock::Utc => ts.format(TIMELINE_FORMAT).to_string(),
        }
    }

    /// Reads a wall-clock time in this clock's zone.
    ///
    /// A local time skipped by a DST transition moves forward an hour.
    fn localize(&self, naive: &NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            TimelineClock::Utc => Some(naive.and_utc()),
            TimelineClock::Local => Local
                .from_local_datetime(naive)
                .earliest()
                .or_else(|| {
                    let shifted = naive.checked_add_signed(TimeDelta::hours(1))?;
                    Local.from_local_datetime(&shifted).earliest()
                })
                .map(|ts| ts.with_timezone(&Utc)),
        }
    }
}
