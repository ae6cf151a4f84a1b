//! ESPI interval reading parser.
//!
//! Turns a raw [`UsageDocument`] into [`GreenButtonData`]: per interval
//! reading, `start` and `duration` are whole seconds (epoch and elapsed),
//! `cost` is thousandths of a cent. Both instants become civil dates in a
//! caller-supplied zone, and the output is sorted ascending by interval
//! end regardless of document order.

use chrono::{NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use wattbill_core::{GreenButtonData, MeterReading};

use super::error::PortalError;
use super::green_button::UsageDocument;

fn interval_reading_regex() -> Regex {
    Regex::new(r"(?is)<(?:[a-z0-9]+:)?IntervalReading\b[^>]*>(.*?)</(?:[a-z0-9]+:)?IntervalReading\s*>")
        .expect("Invalid regex")
}

fn element_regex(name: &str) -> Regex {
    Regex::new(&format!(
        r"(?is)<(?:[a-z0-9]+:)?{name}\s*>\s*(-?\d+)\s*</(?:[a-z0-9]+:)?{name}\s*>"
    ))
    .expect("Invalid regex")
}

/// Parses every interval reading in `doc` into zone-aware meter readings.
///
/// # Errors
///
/// [`PortalError::MissingCostField`] when any reading has no cost element;
/// the whole parse fails rather than silently dropping the reading.
/// [`PortalError::MalformedUsageDocument`] for a missing start/duration,
/// an out-of-range timestamp, or a negative cost.
pub fn parse_usage_document(
    doc: &UsageDocument,
    zone: Tz,
) -> Result<GreenButtonData, PortalError> {
    let start_re = element_regex("start");
    let duration_re = element_regex("duration");
    let cost_re = element_regex("cost");

    let mut meter_readings = Vec::new();
    for reading in interval_reading_regex().captures_iter(doc.as_str()) {
        let body = &reading[1];

        let start = capture_i64(&start_re, body)?
            .ok_or_else(|| malformed("interval reading has no start element"))?;
        let duration = capture_i64(&duration_re, body)?
            .ok_or_else(|| malformed("interval reading has no duration element"))?;
        let raw_cost = capture_i64(&cost_re, body)?.ok_or(PortalError::MissingCostField)?;

        // Thousandths of a cent to whole cents. Truncation is the
        // document's own unit convention, not a rounding choice.
        let cost_cents = raw_cost / 1000;
        if cost_cents < 0 {
            return Err(malformed(format!("negative cost {raw_cost}")));
        }

        meter_readings.push(MeterReading {
            interval_start: civil_date(start, zone)?,
            interval_end: civil_date(start + duration, zone)?,
            cost_cents,
        });
    }

    // Document order is unspecified; consumers rely on ascending interval
    // end. Vec::sort_by_key is stable.
    meter_readings.sort_by_key(|reading| reading.interval_end);

    Ok(GreenButtonData { meter_readings })
}

fn capture_i64(re: &Regex, body: &str) -> Result<Option<i64>, PortalError> {
    match re.captures(body) {
        None => Ok(None),
        Some(captures) => captures[1]
            .parse::<i64>()
            .map(Some)
            .map_err(|e| malformed(format!("unparseable element value: {e}"))),
    }
}

fn civil_date(epoch_seconds: i64, zone: Tz) -> Result<NaiveDate, PortalError> {
    let instant = Utc
        .timestamp_opt(epoch_seconds, 0)
        .single()
        .ok_or_else(|| malformed(format!("timestamp {epoch_seconds} out of range")))?;
    Ok(instant.with_timezone(&zone).date_naive())
}

fn malformed(message: impl Into<String>) -> PortalError {
    PortalError::MalformedUsageDocument(message.into())
}

// ============================================================================
// Tests
// ============================================================================
