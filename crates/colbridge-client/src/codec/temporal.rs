//! Date, time and timestamp values.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime};
use colbridge_common::{DATE_EPOCH_OFFSET, NANOS_PER_DAY, NANOS_PER_MILLI};

use crate::error::{ClientError, ClientResult};

/// Days between 0001-01-01 and 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

/// A calendar date without time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SqlDate(NaiveDate);

impl SqlDate {
    /// Builds a date from a day count relative to 1970-01-01.
    pub fn from_epoch_days(days: i64) -> ClientResult<Self> {
        days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(|ce| i32::try_from(ce).ok())
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .map(Self)
            .ok_or_else(|| ClientError::decode("date", format!("{} days is out of range", days)))
    }

    /// Decodes the wire form: an unsigned day count centred on `2^31`.
    pub fn from_wire(raw: u32) -> ClientResult<Self> {
        Self::from_epoch_days(i64::from(raw) - DATE_EPOCH_OFFSET)
    }

    /// Encodes the wire form.
    pub fn to_wire(&self) -> u32 {
        (self.epoch_days() + DATE_EPOCH_OFFSET) as u32
    }

    /// Days since 1970-01-01.
    pub fn epoch_days(&self) -> i64 {
        i64::from(self.0.num_days_from_ce()) - UNIX_EPOCH_DAYS_FROM_CE
    }

    /// The calendar date.
    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for SqlDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for SqlDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Millisecond-precision time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SqlTime {
    millis: i64,
}

impl SqlTime {
    /// Converts nanoseconds since midnight, flooring to milliseconds.
    pub fn from_nanos(nanos: i64) -> ClientResult<Self> {
        if !(0..NANOS_PER_DAY).contains(&nanos) {
            return Err(ClientError::decode(
                "time",
                format!("{} ns is outside a day", nanos),
            ));
        }
        Ok(Self {
            millis: nanos.div_euclid(NANOS_PER_MILLI),
        })
    }

    /// Milliseconds since midnight.
    pub fn millis(&self) -> i64 {
        self.millis
    }

    /// Nanoseconds since midnight, at millisecond resolution.
    pub fn nanos(&self) -> i64 {
        self.millis * NANOS_PER_MILLI
    }

    /// The time of day.
    pub fn time(&self) -> NaiveTime {
        let secs = (self.millis / 1_000) as u32;
        let nanos = ((self.millis % 1_000) * NANOS_PER_MILLI) as u32;
        NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos).unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for SqlTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.time().format("%H:%M:%S%.3f"))
    }
}

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SqlTimestamp {
    millis: i64,
}

impl SqlTimestamp {
    /// Wraps a millisecond count unchanged.
    pub const fn from_millis(millis: i64) -> Self {
        Self { millis }
    }

    /// Milliseconds since the epoch.
    pub fn millis(&self) -> i64 {
        self.millis
    }

    /// The instant in UTC, if representable.
    pub fn to_datetime(&self) -> Option<DateTime<chrono::Utc>> {
        DateTime::from_timestamp_millis(self.millis)
    }
}

impl fmt::Display for SqlTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.3f")),
            None => write!(f, "{}", self.millis),
        }
    }
}
