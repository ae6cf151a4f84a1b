//! Orange & Rockland customer portal client.
//!
//! The portal authenticates with a three-phase, order-dependent handshake:
//!
//! 1. POST credentials to the CMS login endpoint; the response JSON
//!    carries a redirect URL. Bad credentials are signaled by the redirect
//!    target, not the HTTP status.
//! 2. GET the redirect; the session cookie is issued here.
//! 3. GET the account status page. The request looks useless, but the
//!    portal does not honor the session cookies until this page has been
//!    loaded once.
//!
//! After that, the Green Button download is a two-request choreography:
//! GET the billing page, then POST the download trigger with every hidden
//! form field from the page replayed verbatim.

pub mod auth;
pub mod error;
pub mod forms;
pub mod green_button;
pub mod parser;
pub mod session;
