use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;

use crate::Time;

/// Zone-less layouts the backend is known to send, tried in order
const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Timestamp as found on the wire: either an ISO-8601 string, or the
/// `[year, month, day, hour, minute, second, nanos]` tuple a Java
/// `LocalDateTime` serializes to (trailing fields may be omitted).
///
/// Any other JSON value (`null`, a bare number, a tuple with fractional
/// fields) is kept as `Unparsed` so the record around it still loads.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Text(String),
    Parts(Vec<i64>),
    Unparsed(serde_json::Value),
}

impl Default for RawTimestamp {
    fn default() -> RawTimestamp {
        RawTimestamp::Text(String::new())
    }
}

impl From<&str> for RawTimestamp {
    fn from(s: &str) -> RawTimestamp {
        RawTimestamp::Text(String::from(s))
    }
}

impl From<Vec<i64>> for RawTimestamp {
    fn from(parts: Vec<i64>) -> RawTimestamp {
        RawTimestamp::Parts(parts)
    }
}

impl From<Time> for RawTimestamp {
    fn from(t: Time) -> RawTimestamp {
        RawTimestamp::Text(t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum TimestampError {
    #[error("Unrecognized timestamp format {0:?}")]
    Format(String),

    #[error("Timestamp tuple has {0} fields, expected 3 to 7")]
    TupleLength(usize),

    #[error("Timestamp tuple {0:?} is not a valid date")]
    OutOfRange(Vec<i64>),

    #[error("Local time {0} does not exist in time zone {1:?}")]
    NonexistentLocalTime(NaiveDateTime, Tz),
}

/// The instant every unparseable timestamp collapses to
pub fn epoch() -> Time {
    Time::default()
}

fn localize(naive: NaiveDateTime, zone: &Tz) -> Result<Time, TimestampError> {
    zone.from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
        .ok_or(TimestampError::NonexistentLocalTime(naive, *zone))
}

fn parse_text(s: &str, zone: &Tz) -> Result<Time, TimestampError> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.with_timezone(&Utc));
    }
    if let Ok(t) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(t.with_timezone(&Utc));
    }
    for fmt in LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return localize(naive, zone);
        }
    }
    if let Some(naive) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return localize(naive, zone);
    }
    Err(TimestampError::Format(String::from(s)))
}

fn parse_parts(parts: &[i64], zone: &Tz) -> Result<Time, TimestampError> {
    if !(3..=7).contains(&parts.len()) {
        return Err(TimestampError::TupleLength(parts.len()));
    }
    let field = |i: usize| parts.get(i).copied().unwrap_or(0);
    let out_of_range = || TimestampError::OutOfRange(parts.to_vec());
    let year = i32::try_from(field(0)).map_err(|_| out_of_range())?;
    let [month, day, hour, minute, second, nanos] = [1, 2, 3, 4, 5, 6]
        .map(|i| u32::try_from(field(i)).unwrap_or(u32::MAX));
    let naive = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_nano_opt(hour, minute, second, nanos))
        .ok_or_else(out_of_range)?;
    localize(naive, zone)
}

impl RawTimestamp {
    /// Resolve to an instant, reading zone-less values as wall-clock time in
    /// `zone`
    pub fn parse_in(&self, zone: &Tz) -> Result<Time, TimestampError> {
        match self {
            RawTimestamp::Text(s) => parse_text(s, zone),
            RawTimestamp::Parts(parts) => parse_parts(parts, zone),
            RawTimestamp::Unparsed(v) => Err(TimestampError::Format(v.to_string())),
        }
    }

    /// Like `parse_in`, but never fails: anything invalid becomes the epoch
    pub fn normalize_in(&self, zone: &Tz) -> Time {
        match self.parse_in(zone) {
            Ok(t) => t,
            Err(err) => {
                tracing::debug!(timestamp = ?self, %err, "falling back to epoch");
                epoch()
            }
        }
    }
}
