// Copyright (c) James Kassemi, SC, US. All rights reserved.

use chrono::{DateTime, FixedOffset, ParseError, SecondsFormat, Utc};

/// Parse an RFC3339 timestamp. Fractional seconds up to nanosecond precision
/// are optional, so both `2017-09-22T11:45:47Z` and the nano form parse.
pub fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>, ParseError> {
    DateTime::parse_from_rfc3339(value)
}

/// Signed span from `start_time` to `end_time`, in seconds.
pub fn duration_seconds(start_time: &str, end_time: &str) -> Result<f64, ParseError> {
    let end = parse_timestamp(end_time)?;
    let start = parse_timestamp(start_time)?;
    let span = end.signed_duration_since(start);
    Ok(span
        .num_nanoseconds()
        .map(|nanos| nanos as f64 / 1_000_000_000.0)
        .unwrap_or_else(|| span.num_milliseconds() as f64 / 1_000.0))
}

/// Current instant in the RFC3339-nano form the closure records use.
pub fn now_rfc3339_nanos() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
}
