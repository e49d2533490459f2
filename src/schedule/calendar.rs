//! Calendar arithmetic in the configured fixed offset.
//!
//! All stored timestamps are epoch milliseconds; "local" always means the
//! `schedule.utc_offset` offset, never the host timezone.

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use super::ScheduleError;
use crate::catalog::parse_slot_time;

/// Minimum gap between two uses of the same asset
pub const COOLDOWN_MS: i64 = 72 * HOUR_MS;

const HOUR_MS: i64 = 60 * 60 * 1000;

/// Current wall clock as epoch ms
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Wall-clock `at` in `offset` as epoch ms
fn local_ms(at: NaiveDateTime, offset: FixedOffset) -> i64 {
    match at.and_local_timezone(offset).single() {
        Some(local) => local.timestamp_millis(),
        // Fixed offsets have no gaps or folds; only range overflow lands here
        None => at.and_utc().timestamp_millis() - i64::from(offset.local_minus_utc()) * 1000,
    }
}

/// Local midnight of `date` as epoch ms
pub fn local_midnight_ms(date: NaiveDate, offset: FixedOffset) -> i64 {
    local_ms(date.and_time(NaiveTime::MIN), offset)
}

/// Local noon of `date`; the value written to `lastUsed`
pub fn day_noon_ms(date: NaiveDate, offset: FixedOffset) -> i64 {
    local_midnight_ms(date, offset) + 12 * HOUR_MS
}

/// `date` at the slot's `HH:MM` in local time; `None` unless the time is a
/// valid zero-padded slot time
pub fn slot_time_ms(date: NaiveDate, time: &str, offset: FixedOffset) -> Option<i64> {
    let time = parse_slot_time(time)?;
    Some(local_ms(date.and_time(time), offset))
}

/// Whether an asset last used at `last_used` may run on the day whose noon is `target_noon`
pub fn is_off_cooldown(last_used: Option<i64>, target_noon: i64) -> bool {
    match last_used {
        None => true,
        Some(last_used) => target_noon - last_used > COOLDOWN_MS,
    }
}

/// Every date from `start` to `end`, both inclusive; empty when `start > end`
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut current = start;
    while current <= end {
        days.push(current);
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    days
}

/// Number of days covered by an inclusive range (0 when reversed)
pub fn range_len_days(start: NaiveDate, end: NaiveDate) -> i64 {
    if start > end {
        0
    } else {
        (end - start).num_days() + 1
    }
}

/// Parses a `YYYY-MM-DD` calendar date
pub fn parse_date(raw: &str) -> Result<NaiveDate, ScheduleError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ScheduleError::InvalidDate(raw.to_string()))
}
