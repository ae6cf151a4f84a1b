//! Green Button usage types.
//!
//! The portal's Green Button download is an ESPI document of interval
//! readings. These types hold the normalized result: civil-date billing
//! intervals with costs in whole cents.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ============================================================================
// Meter Reading
// ============================================================================

/// One billing interval from the Green Button feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeterReading {
    /// First day of the billing interval, in the reporting time zone.
    pub interval_start: NaiveDate,
    /// Last day of the billing interval (start instant + reported duration).
    pub interval_end: NaiveDate,
    /// What the customer paid O&R for the interval, in whole cents.
    pub cost_cents: i64,
}

impl MeterReading {
    /// Length of the billing interval in days.
    pub fn interval_days(&self) -> i64 {
        (self.interval_end - self.interval_start).num_days()
    }

    /// Cost in dollars, for display only.
    #[allow(clippy::cast_precision_loss)]
    pub fn cost_dollars(&self) -> f64 {
        self.cost_cents as f64 / 100.0
    }
}

// ============================================================================
// Green Button Data
// ============================================================================

/// The full set of meter readings from one Green Button download,
/// ascending by interval end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreenButtonData {
    /// Meter readings, sorted ascending by interval end.
    pub meter_readings: Vec<MeterReading>,
}

impl GreenButtonData {
    /// The most recent reading, if any.
    pub fn latest(&self) -> Option<&MeterReading> {
        self.meter_readings.last()
    }

    /// Returns true if the download contained no readings.
    pub fn is_empty(&self) -> bool {
        self.meter_readings.is_empty()
    }

    /// Validates the parsed data.
    ///
    /// Ensures readings are sorted ascending by interval end, intervals do
    /// not run backwards, and no cost is negative. Call this after parsing
    /// a download to catch malformed documents the parser let through.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidData`] naming the first violation.
    pub fn validate(&self) -> Result<(), CoreError> {
        for pair in self.meter_readings.windows(2) {
            if pair[0].interval_end > pair[1].interval_end {
                return Err(CoreError::InvalidData(format!(
                    "readings out of order: {} after {}",
                    pair[1].interval_end, pair[0].interval_end
                )));
            }
        }
        for reading in &self.meter_readings {
            if reading.interval_end < reading.interval_start {
                return Err(CoreError::InvalidData(format!(
                    "interval ends before it starts: {} > {}",
                    reading.interval_start, reading.interval_end
                )));
            }
            if reading.cost_cents < 0 {
                return Err(CoreError::InvalidData(format!(
                    "negative cost: {} cents",
                    reading.cost_cents
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
