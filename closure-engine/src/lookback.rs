// Copyright (c) James Kassemi, SC, US. All rights reserved.

use chrono::{DateTime, Utc};
use core_types::timefmt;

/// Floor below which a tick never shrinks its query window.
pub(crate) const MIN_LOOKBACK_MINUTES: i64 = 10;

/// Safety overlap added on top of the last-closure age; adjacent ticks
/// re-cover each other's tail.
const LOOKBACK_OVERLAP_MINUTES: f64 = 5.0;

/// Minutes to query this tick, derived from the age of the latest closure the
/// engine itself emitted. Unparseable input degrades to the configured
/// maximum, which is also what a cold start sees.
pub(crate) fn lookback_from_latest(
    event_time: &str,
    now: DateTime<Utc>,
    max_lookback: i64,
) -> i64 {
    let latest = match timefmt::parse_timestamp(event_time) {
        Ok(parsed) => parsed.with_timezone(&Utc),
        Err(_) => return max_lookback,
    };

    let age_minutes = (now - latest).num_milliseconds() as f64 / 60_000.0;
    let lookback = (age_minutes + LOOKBACK_OVERLAP_MINUTES).floor() as i64;
    lookback.max(MIN_LOOKBACK_MINUTES)
}
