//! Domain models.
//!
//! - [`usage`] - Green Button meter readings
//! - [`report`] - The derived usage report

pub mod report;
pub mod usage;

pub use report::UsageReport;
pub use usage::{GreenButtonData, MeterReading};
