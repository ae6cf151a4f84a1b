//! Report formatting.
//!
//! Renders a [`UsageReport`] the way the emailed report used to read:
//! a dated subject line and a short plain-text body, or JSON for
//! scripting.

use chrono::{Datelike, NaiveDate};
use wattbill_core::UsageReport;

/// Subject line, e.g. `Electricity Usage Report for 7/17–8/16`.
pub fn subject(report: &UsageReport) -> String {
    format!(
        "Electricity Usage Report for {}–{}",
        short_date(report.interval_start),
        short_date(report.interval_end)
    )
}

/// Plain-text body.
pub fn body_text(report: &UsageReport) -> String {
    format!(
        "Billing interval: {} to {} ({} days)\nPurchased from O&R: ${:.2}",
        report.interval_start,
        report.interval_end,
        (report.interval_end - report.interval_start).num_days(),
        report.cost_dollars(),
    )
}

/// JSON rendering for scripting.
///
/// # Errors
///
/// Returns a `serde_json` error if serialization fails, which it does not
/// for this type.
pub fn to_json(report: &UsageReport, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(report)
    } else {
        serde_json::to_string(report)
    }
}

/// Month/day without leading zeros, matching the original report subject.
fn short_date(date: NaiveDate) -> String {
    format!("{}/{}", date.month(), date.day())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> UsageReport {
        UsageReport {
            interval_start: NaiveDate::from_ymd_opt(2017, 7, 17).unwrap(),
            interval_end: NaiveDate::from_ymd_opt(2017, 8, 16).unwrap(),
            cost_cents: 15043,
        }
    }

    #[test]
    fn test_subject() {
        assert_eq!(
            subject(&report()),
            "Electricity Usage Report for 7/17–8/16"
        );
    }

    #[test]
    fn test_body_text() {
        let body = body_text(&report());
        assert!(body.contains("2017-07-17 to 2017-08-16 (30 days)"));
        assert!(body.contains("Purchased from O&R: $150.43"));
    }

    #[test]
    fn test_json_round_trips() {
        let json = to_json(&report(), false).unwrap();
        let back: UsageReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report());
    }
}
