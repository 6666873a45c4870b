//! Decides whether a cached token may still be handed out.
//!
//! A token leaves the cache well before its real expiry: at
//! `valid_from + min(threshold% of lifetime, max caching time)`.
//! Callers never get a token that is about to lapse mid-request.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::helpers::time::{now_utc, saturating_add, to_time_delta};
use crate::token::IssuedToken;

/// Instant after which `token` is due for renewal.
pub fn effective_expiration(
    token: &IssuedToken,
    renewal_threshold_percent: u8,
    max_caching_duration: Duration,
) -> DateTime<Utc> {
    let threshold_span = percent_of(token.lifetime(), renewal_threshold_percent);
    let span = threshold_span.min(to_time_delta(max_caching_duration));
    saturating_add(token.valid_from(), span)
}

pub fn is_usable(
    token: Option<&IssuedToken>,
    renewal_threshold_percent: u8,
    max_caching_duration: Duration,
) -> bool {
    is_usable_at(token, renewal_threshold_percent, max_caching_duration, now_utc())
}

pub fn is_usable_at(
    token: Option<&IssuedToken>,
    renewal_threshold_percent: u8,
    max_caching_duration: Duration,
    now: DateTime<Utc>,
) -> bool {
    token
        .map(|token| effective_expiration(token, renewal_threshold_percent, max_caching_duration) > now)
        .unwrap_or(false)
}

const NANOS_PER_SEC: i128 = 1_000_000_000;

// exact to the nanosecond; |result| <= |delta| so the conversion back cannot overflow
fn percent_of(delta: TimeDelta, percent: u8) -> TimeDelta {
    let percent = i128::from(percent.min(100));
    let nanos = i128::from(delta.num_seconds()) * NANOS_PER_SEC + i128::from(delta.subsec_nanos());
    let scaled = nanos * percent / 100;
    let secs = scaled.div_euclid(NANOS_PER_SEC);
    let subsec = scaled.rem_euclid(NANOS_PER_SEC);
    i64::try_from(secs)
        .ok()
        .zip(u32::try_from(subsec).ok())
        .and_then(|(secs, subsec)| TimeDelta::new(secs, subsec))
        .unwrap_or(TimeDelta::MAX)
}
