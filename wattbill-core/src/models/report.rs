//! The derived usage report.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::models::usage::GreenButtonData;

/// A usage report covering the most recent billing interval.
///
/// This is what the reporter ultimately emits: the latest interval the
/// portal knows about, plus its cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageReport {
    /// First day of the reported billing interval.
    pub interval_start: NaiveDate,
    /// Last day of the reported billing interval.
    pub interval_end: NaiveDate,
    /// Cost of the interval in whole cents.
    pub cost_cents: i64,
}

impl UsageReport {
    /// Builds a report from the most recent meter reading.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NoReadings`] when the download was empty; an
    /// empty download is a schema problem, not a zero-usage report.
    pub fn from_green_button(data: &GreenButtonData) -> Result<Self, CoreError> {
        let latest = data.latest().ok_or(CoreError::NoReadings)?;
        Ok(Self {
            interval_start: latest.interval_start,
            interval_end: latest.interval_end,
            cost_cents: latest.cost_cents,
        })
    }

    /// The billing date: the day the reported interval ended.
    pub fn billing_date(&self) -> NaiveDate {
        self.interval_end
    }

    /// Cost in dollars, for display only.
    #[allow(clippy::cast_precision_loss)]
    pub fn cost_dollars(&self) -> f64 {
        self.cost_cents as f64 / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::usage::MeterReading;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_report_uses_latest_reading() {
        let data = GreenButtonData {
            meter_readings: vec![
                MeterReading {
                    interval_start: date(2017, 6, 13),
                    interval_end: date(2017, 7, 13),
                    cost_cents: 12000,
                },
                MeterReading {
                    interval_start: date(2017, 7, 13),
                    interval_end: date(2017, 8, 12),
                    cost_cents: 15000,
                },
            ],
        };

        let report = UsageReport::from_green_button(&data).unwrap();
        assert_eq!(report.interval_start, date(2017, 7, 13));
        assert_eq!(report.billing_date(), date(2017, 8, 12));
        assert_eq!(report.cost_cents, 15000);
    }

    #[test]
    fn test_empty_download_is_an_error() {
        let err = UsageReport::from_green_button(&GreenButtonData::default()).unwrap_err();
        assert!(matches!(err, CoreError::NoReadings));
    }
}
