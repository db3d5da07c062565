//! Timestamp formatting for sink output

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write;

use super::diagnostic;

/// How an event timestamp is written
///
/// # Examples
///
/// ```
/// use rust_structured_logger::core::TimestampFormat;
/// use chrono::{TimeZone, Utc};
///
/// let at = Utc.with_ymd_and_hms(2026, 3, 1, 8, 5, 9).unwrap();
/// assert_eq!(TimestampFormat::Iso8601.format(&at), "2026-03-01T08:05:09.000Z");
/// assert_eq!(TimestampFormat::Custom("%H:%M".into()).format(&at), "08:05");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// `2026-03-01T08:05:09.123Z`
    #[default]
    Iso8601,

    /// `2026-03-01T08:05:09.123456Z`
    Iso8601Micros,

    /// `2026-03-01T08:05:09.123+00:00`
    Rfc3339,

    /// Seconds since the epoch
    Unix,

    /// Milliseconds since the epoch
    UnixMillis,

    /// Microseconds since the epoch
    UnixMicros,

    /// Any strftime format string
    ///
    /// A string chrono cannot interpret formats as [`TimestampFormat::Iso8601`].
    Custom(String),
}

impl TimestampFormat {
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::Iso8601Micros => datetime.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            TimestampFormat::Rfc3339 => datetime.to_rfc3339(),
            TimestampFormat::Unix => datetime.timestamp().to_string(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::UnixMicros => datetime.timestamp_micros().to_string(),
            TimestampFormat::Custom(format_str) => {
                let mut text = String::new();
                match write!(text, "{}", datetime.format(format_str)) {
                    Ok(()) => text,
                    Err(_) => TimestampFormat::Iso8601.format(datetime),
                }
            }
        }
    }

    /// Whether a custom format string is one chrono can interpret
    #[must_use]
    pub fn is_valid(&self) -> bool {
        match self {
            TimestampFormat::Custom(format_str) => {
                !StrftimeItems::new(format_str).any(|item| matches!(item, Item::Error))
            }
            _ => true,
        }
    }

    /// This format, or the default with a diagnostic when it is not valid
    #[must_use]
    pub fn or_default_when_invalid(self) -> Self {
        if self.is_valid() {
            return self;
        }
        diagnostic::warning(format!(
            "Invalid timestamp format {:?}; using ISO 8601",
            self
        ));
        TimestampFormat::default()
    }

    /// JSON form: numbers for the Unix formats, strings otherwise
    #[must_use]
    pub fn to_json(&self, datetime: &DateTime<Utc>) -> Value {
        match self {
            TimestampFormat::Unix => Value::from(datetime.timestamp()),
            TimestampFormat::UnixMillis => Value::from(datetime.timestamp_millis()),
            TimestampFormat::UnixMicros => Value::from(datetime.timestamp_micros()),
            _ => Value::String(self.format(datetime)),
        }
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TimestampFormat::Unix | TimestampFormat::UnixMillis | TimestampFormat::UnixMicros
        )
    }
}
