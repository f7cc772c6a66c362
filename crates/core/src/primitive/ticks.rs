//! Tick conversions for calendar and interval values
//!
//! A tick is 100 nanoseconds. Calendar ticks count from
//! `0001-01-01T00:00:00` (no time zone); interval ticks are a signed span.

use crate::error::{CodecError, Result};
use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone, Timelike};

/// Ticks per second
pub const TICKS_PER_SECOND: i64 = 10_000_000;

/// Nanoseconds per tick
pub const NANOS_PER_TICK: i64 = 100;

/// Seconds between `0001-01-01T00:00:00` and the Unix epoch
pub const UNIX_EPOCH_SECONDS: i64 = 62_135_596_800;

/// Calendar ticks of a naive timestamp.
///
/// Sub-tick precision is truncated. Leap-second nanoseconds are clamped
/// into the current second.
pub fn datetime_to_ticks(value: &NaiveDateTime) -> Result<i64> {
    let secs = value.and_utc().timestamp() + UNIX_EPOCH_SECONDS;
    if secs < 0 {
        return Err(CodecError::invalid(format!(
            "timestamp {} precedes 0001-01-01",
            value
        )));
    }
    let nanos = i64::from(value.nanosecond().min(999_999_999));
    secs.checked_mul(TICKS_PER_SECOND)
        .and_then(|t| t.checked_add(nanos / NANOS_PER_TICK))
        .ok_or_else(|| CodecError::invalid(format!("timestamp {} overflows ticks", value)))
}

/// Naive timestamp from calendar ticks.
pub fn ticks_to_datetime(ticks: i64) -> Result<NaiveDateTime> {
    if ticks < 0 {
        return Err(CodecError::invalid(format!("negative calendar ticks {}", ticks)));
    }
    let secs = ticks / TICKS_PER_SECOND - UNIX_EPOCH_SECONDS;
    let nanos = ((ticks % TICKS_PER_SECOND) * NANOS_PER_TICK) as u32;
    DateTime::from_timestamp(secs, nanos)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| CodecError::invalid(format!("calendar ticks {} out of range", ticks)))
}

/// Interval ticks of a signed duration.
pub fn duration_to_ticks(value: &Duration) -> Result<i64> {
    let secs = value.num_seconds();
    let sub_nanos = (*value - Duration::seconds(secs))
        .num_nanoseconds()
        .unwrap_or(0);
    secs.checked_mul(TICKS_PER_SECOND)
        .and_then(|t| t.checked_add(sub_nanos / NANOS_PER_TICK))
        .ok_or_else(|| CodecError::invalid(format!("interval {} overflows ticks", value)))
}

/// Signed duration from interval ticks.
pub fn ticks_to_duration(ticks: i64) -> Duration {
    Duration::seconds(ticks / TICKS_PER_SECOND)
        + Duration::nanoseconds((ticks % TICKS_PER_SECOND) * NANOS_PER_TICK)
}

/// Split an offset timestamp into local calendar ticks and offset ticks.
pub fn offset_datetime_to_ticks(value: &DateTime<FixedOffset>) -> Result<(i64, i64)> {
    let local = datetime_to_ticks(&value.naive_local())?;
    let offset = i64::from(value.offset().local_minus_utc()) * TICKS_PER_SECOND;
    Ok((local, offset))
}

/// Rebuild an offset timestamp from local calendar ticks and offset ticks.
pub fn ticks_to_offset_datetime(local: i64, offset: i64) -> Result<DateTime<FixedOffset>> {
    if offset % TICKS_PER_SECOND != 0 {
        return Err(CodecError::invalid(format!(
            "offset ticks {} are not whole seconds",
            offset
        )));
    }
    let offset_secs = i32::try_from(offset / TICKS_PER_SECOND)
        .map_err(|_| CodecError::invalid(format!("offset ticks {} out of range", offset)))?;
    let zone = FixedOffset::east_opt(offset_secs)
        .ok_or_else(|| CodecError::invalid(format!("offset {}s out of range", offset_secs)))?;
    let naive = ticks_to_datetime(local)?;
    zone.from_local_datetime(&naive)
        .single()
        .ok_or_else(|| CodecError::invalid(format!("local time {} is ambiguous", naive)))
}
