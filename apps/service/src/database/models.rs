//! Row mapping and timestamp encoding for `ping_stats`.
//!
//! Timestamps are stored as naive UTC text in a fixed-width layout, so string
//! comparison in SQL orders them chronologically.

use chrono::{DateTime, NaiveDateTime, Utc};
use libsql::Row;

use crate::error::{Error, Result};
use crate::monitoring::MetricsRecord;

/// Layout written by this crate, e.g. `2025-10-19 12:00:00.000000`.
const STORAGE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Layout of range query bounds, e.g. `2025-10-19T12:00:00`.
pub const RANGE_BOUND_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const RANGE_BOUND_EXPECTED: &str = "YYYY-MM-DDTHH:MM:SS";

/// Columns selected for every record query, in [`record_from_row`] order.
pub const RECORD_COLUMNS: &str = "timestamp, min, avg, max, stddev, COALESCE(packet_loss, 0.0)";

/// Convert a UTC instant to its stored text.
pub fn timestamp_to_storage(timestamp: &DateTime<Utc>) -> String {
    timestamp.naive_utc().format(STORAGE_FORMAT).to_string()
}

/// Convert stored text back to a UTC instant.
///
/// Accepts the storage layout with any fractional precision, plus what older
/// writers left behind: RFC 3339, offset-suffixed text and Go's
/// `time.Time.String()` form.
pub fn timestamp_from_storage(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(ts.with_timezone(&Utc));
    }

    parse_go_time_string(raw).ok_or_else(|| Error::CorruptRecord {
        reason: format!("unreadable timestamp {raw:?}"),
    })
}

/// `2025-10-19 12:00:00.123456789 -0700 PDT m=+5.000000001`
///
/// The zone abbreviation and the monotonic clock reading are dropped; the
/// numeric offset alone fixes the instant.
fn parse_go_time_string(raw: &str) -> Option<DateTime<Utc>> {
    let wall_clock = raw.split(" m=").next()?;
    let mut parts = wall_clock.split_whitespace();
    let (date, time, offset) = (parts.next()?, parts.next()?, parts.next()?);

    DateTime::parse_from_str(&format!("{date} {time} {offset}"), "%Y-%m-%d %H:%M:%S%.f %z")
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Whether `raw` is already in the layout [`timestamp_to_storage`] writes.
pub fn is_storage_form(raw: &str) -> bool {
    raw.len() == 26 && NaiveDateTime::parse_from_str(raw, STORAGE_FORMAT).is_ok()
}

/// Parse a `YYYY-MM-DDTHH:MM:SS` range bound, interpreted as UTC.
pub fn parse_range_bound(value: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), RANGE_BOUND_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| Error::InvalidTimeFormat {
            value: value.to_string(),
            expected: RANGE_BOUND_EXPECTED,
        })
}

/// Parse both bounds of a range query and make sure they are in order.
pub fn parse_range(start: &str, end: &str) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start_ts = parse_range_bound(start)?;
    let end_ts = parse_range_bound(end)?;

    if start_ts > end_ts {
        return Err(Error::InvalidTimeFormat {
            value: format!("{start} .. {end}"),
            expected: "a start no later than the end",
        });
    }

    Ok((start_ts, end_ts))
}

/// Parse an RFC 3339 instant used for incremental polling.
pub fn parse_since(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| Error::InvalidTimeFormat { value: value.to_string(), expected: "RFC 3339" })
}

/// Build a record from a row selected with [`RECORD_COLUMNS`].
pub fn record_from_row(row: &Row) -> Result<MetricsRecord> {
    let timestamp: String = row.get(0)?;

    Ok(MetricsRecord {
        timestamp: timestamp_from_storage(&timestamp)?,
        min: row.get::<Option<f64>>(1)?,
        avg: row.get::<Option<f64>>(2)?,
        max: row.get::<Option<f64>>(3)?,
        stddev: row.get::<Option<f64>>(4)?,
        packet_loss: row.get::<f64>(5)?,
    })
}
