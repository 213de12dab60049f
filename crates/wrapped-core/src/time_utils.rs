use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::{Result, WrappedError};

/// Date format used for every calendar-day key in the summary.
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Uses the `iana-time-zone` crate directly – no subprocess calls.
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

/// Resolve a timezone setting (`"auto"` or an IANA name) into a [`Tz`].
pub fn resolve_timezone(name: &str) -> Result<Tz> {
    let name = if name.eq_ignore_ascii_case("auto") {
        get_system_timezone()
    } else {
        name.to_string()
    };
    name.parse::<Tz>()
        .map_err(|_| WrappedError::InvalidTimezone(name))
}

// ── LocalClock ────────────────────────────────────────────────────────────────

/// The three histogram coordinates of one instant in local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalBuckets {
    /// 0..=23
    pub hour: u32,
    /// 0 = Sunday .. 6 = Saturday
    pub weekday: u32,
    pub date: NaiveDate,
}

impl LocalBuckets {
    pub fn hour_key(&self) -> String {
        self.hour.to_string()
    }

    pub fn weekday_key(&self) -> String {
        self.weekday.to_string()
    }

    pub fn date_key(&self) -> String {
        format_date_key(self.date)
    }
}

/// Interprets UTC instants in one fixed local timezone.
#[derive(Debug, Clone, Copy)]
pub struct LocalClock {
    tz: Tz,
}

impl LocalClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Hour, weekday and calendar date of `dt` in this clock's timezone.
    pub fn buckets(&self, dt: DateTime<Utc>) -> LocalBuckets {
        let local = dt.with_timezone(&self.tz);
        LocalBuckets {
            hour: local.hour(),
            weekday: local.weekday().num_days_from_sunday(),
            date: local.date_naive(),
        }
    }

    pub fn local_date(&self, dt: DateTime<Utc>) -> NaiveDate {
        dt.with_timezone(&self.tz).date_naive()
    }
}

impl Default for LocalClock {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

// ── Date keys ─────────────────────────────────────────────────────────────────

pub fn format_date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD` key, `None` for anything else.
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, DATE_KEY_FORMAT).ok()
}

/// Number of calendar days from `first` to `last`, counting both ends.
pub fn inclusive_day_span(first: NaiveDate, last: NaiveDate) -> i64 {
    (last - first).num_days().abs() + 1
}
