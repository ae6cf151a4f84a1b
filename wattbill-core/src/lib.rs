// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Wattbill Core
//!
//! Domain models shared by the wattbill crates.
//!
//! ## Key Types
//!
//! - [`MeterReading`] - One billing interval with its cost in whole cents
//! - [`GreenButtonData`] - Ordered set of meter readings from one download
//! - [`UsageReport`] - The report derived from the most recent reading

pub mod error;
pub mod models;

pub use error::CoreError;
pub use models::{GreenButtonData, MeterReading, UsageReport};
