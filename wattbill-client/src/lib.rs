// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Wattbill Client
//!
//! Protocol-emulation client for the Orange & Rockland customer portal.
//!
//! The portal exposes no public API; usage data comes from replaying the
//! browser flow: a three-phase cookie login, then a scripted form
//! submission on the Green Button billing page. See [`oru`] for the
//! protocol details.

pub mod oru;

pub use oru::auth::{AuthToken, AuthenticatedSession};
pub use oru::error::{AuthPhase, FetchStage, PortalError};
pub use oru::green_button::{GreenButtonClient, UsageDocument};
pub use oru::parser::parse_usage_document;
pub use oru::session::{Endpoints, PortalSession};
