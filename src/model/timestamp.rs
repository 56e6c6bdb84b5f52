//! RFC 3339 timestamps as Discord sends them, such as a member's `joined_at`.

use std::fmt;

use dep_time::format_description::well_known::Rfc3339;
use dep_time::serde::rfc3339;
use dep_time::OffsetDateTime;
use serde::{Deserialize, Serialize};

/// Milliseconds between the Unix epoch and 2015-01-01, where snowflake time starts.
const DISCORD_EPOCH_MS: i128 = 1_420_070_400_000;

/// A point in time, (de)serialized as an RFC 3339 string and displayed the same way.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Timestamp(#[serde(with = "rfc3339")] OffsetDateTime);

impl Timestamp {
    /// The creation time encoded in the upper bits of a snowflake.
    pub(crate) fn from_snowflake(id: u64) -> Self {
        let millis = i128::from(id >> 22) + DISCORD_EPOCH_MS;
        let created = OffsetDateTime::from_unix_timestamp_nanos(millis * 1_000_000);
        Self(created.unwrap_or(OffsetDateTime::UNIX_EPOCH))
    }

    /// Parses an RFC 3339 string. The offset is required.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if `input` is not RFC 3339.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        OffsetDateTime::parse(input, &Rfc3339).map(Self).map_err(ParseError)
    }

    /// Seconds since the Unix epoch.
    #[must_use]
    pub fn unix_timestamp(&self) -> i64 {
        self.0.unix_timestamp()
    }
}

impl From<OffsetDateTime> for Timestamp {
    fn from(inner: OffsetDateTime) -> Self {
        Self(inner)
    }
}

impl From<Timestamp> for OffsetDateTime {
    fn from(timestamp: Timestamp) -> Self {
        timestamp.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.format(&Rfc3339).map_err(|_| fmt::Error)?)
    }
}

/// An RFC 3339 string that could not be parsed into a [`Timestamp`].
#[derive(Debug)]
pub struct ParseError(dep_time::error::Parse);

impl std::error::Error for ParseError {}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
