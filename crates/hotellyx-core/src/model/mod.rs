//! Persisted record shapes: requests, rooms, and services.

pub mod request;
pub mod room;
pub mod service;

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

pub use request::{Priority, Request, RequestStatus, StatusStamps, TimelineEntry};
pub use room::{Room, RoomStatus};
pub use service::{ActionLabel, Service, ServiceCategory, UpsellRules};

/// Render an instant the way every record persists it
/// (`2026-02-07T12:00:00.000Z`).
#[must_use]
pub fn format_iso(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an RFC 3339 timestamp, normalizing any offset to UTC.
#[must_use]
pub fn parse_iso(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

fn normalize(input: &str) -> String {
    input.trim().to_ascii_lowercase()
}

/// Serde adapters so timestamps persist with millisecond precision.
pub(crate) mod iso {
    use chrono::{DateTime, Utc};
    use serde::Serializer;

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_iso(*ts))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::Serializer;

        #[allow(clippy::ref_option)]
        pub fn serialize<S: Serializer>(
            ts: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => s.serialize_str(&super::super::format_iso(*ts)),
                None => s.serialize_none(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{format_iso, parse_iso};
    use chrono::{TimeZone, Utc};

    #[test]
    fn iso_format_matches_persisted_shape() {
        let ts = Utc.with_ymd_and_hms(2026, 2, 7, 13, 0, 0).unwrap();
        assert_eq!(format_iso(ts), "2026-02-07T13:00:00.000Z");
        assert_eq!(parse_iso("2026-02-07T13:00:00.000Z"), Some(ts));
    }

    #[test]
    fn parse_normalizes_offsets_and_rejects_garbage() {
        let ts = Utc.with_ymd_and_hms(2026, 2, 7, 13, 0, 0).unwrap();
        assert_eq!(parse_iso("2026-02-07T15:00:00+02:00"), Some(ts));
        assert_eq!(parse_iso("yesterday"), None);
        assert_eq!(parse_iso(""), None);
    }
}
