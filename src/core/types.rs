//! core::types
//!
//! Small value types shared across the store.
//!
//! - [`UtcTimestamp`] - RFC3339 timestamp recorded in document envelopes

use serde::{Deserialize, Serialize};

/// A UTC timestamp, serialized as RFC3339.
///
/// # Example
///
/// ```
/// use coffer::core::types::UtcTimestamp;
///
/// let now = UtcTimestamp::now();
/// let parsed = UtcTimestamp::parse(&now.to_string()).unwrap();
/// assert_eq!(parsed, now);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UtcTimestamp(chrono::DateTime<chrono::Utc>);

impl UtcTimestamp {
    /// Create a timestamp for the current moment.
    pub fn now() -> Self {
        Self(chrono::Utc::now())
    }

    /// Create a timestamp from a chrono DateTime.
    pub fn from_datetime(dt: chrono::DateTime<chrono::Utc>) -> Self {
        Self(dt)
    }

    /// Parse an RFC3339 string, normalizing the offset to UTC.
    ///
    /// Returns `None` if the string is not a valid RFC3339 timestamp.
    pub fn parse(s: &str) -> Option<Self> {
        chrono::DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| Self(dt.with_timezone(&chrono::Utc)))
    }

    /// Get the underlying datetime.
    pub fn as_datetime(&self) -> &chrono::DateTime<chrono::Utc> {
        &self.0
    }
}

impl std::fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
