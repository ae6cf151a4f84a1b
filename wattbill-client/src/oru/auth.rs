//! Three-phase login handshake and logout.
//!
//! Skipping or reordering a phase silently breaks every later request, so
//! the handshake is modeled as a consuming state transition: an
//! unauthenticated [`PortalSession`] goes in, an [`AuthenticatedSession`]
//! comes out, and the only constructor of the latter runs all three phases
//! in order. Partial completion never yields a usable session.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use url::Url;

use super::error::{AuthPhase, PortalError};
use super::session::PortalSession;

// ============================================================================
// Constants
// ============================================================================

/// Name of the session cookie issued during token exchange.
pub const AUTH_COOKIE_NAME: &str = "LogCOOKPl95FnjAT";

/// Marker in the phase-1 redirect target that signals rejected credentials.
/// The portal answers bad credentials with HTTP 200 and a redirect to the
/// password-reset page.
const FORGOT_PASSWORD_MARKER: &str = "ForgotPassword";

// ============================================================================
// Wire Types
// ============================================================================

/// Phase-1 request body.
#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    #[serde(rename = "LoginEmail")]
    login_email: &'a str,
    #[serde(rename = "LoginPassword")]
    login_password: &'a str,
    #[serde(rename = "LoginRememberMe")]
    login_remember_me: bool,
    #[serde(rename = "ReturnUrl")]
    return_url: &'a str,
}

/// Phase-1 response body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    auth_redirect_url: String,
}

// ============================================================================
// Auth Token
// ============================================================================

/// Opaque session identifier: the value of the portal's session cookie.
///
/// Proves a login completed; needed for nothing else besides logout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    /// The raw cookie value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Handshake
// ============================================================================

impl PortalSession {
    /// Runs the three-phase login handshake, consuming the unauthenticated
    /// session.
    ///
    /// # Errors
    ///
    /// [`PortalError::InvalidCredentials`] when phase 1 redirects to the
    /// password-reset page; [`PortalError::LoginUnavailable`] for a
    /// transport or decode failure in any phase, or a missing session
    /// cookie after phase 2.
    #[instrument(skip(self, password))]
    pub async fn log_in(
        self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticatedSession, PortalError> {
        let exchange_url = self.submit_credentials(username, password).await?;
        let token = self.exchange_token(&exchange_url).await?;
        self.activate_session().await?;

        info!("Logged in to the portal");
        Ok(AuthenticatedSession {
            session: self,
            token,
        })
    }

    /// Phase 1: POST the credentials and extract the token-exchange URL
    /// from the response JSON.
    async fn submit_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Url, PortalError> {
        debug!("Auth phase 1/3: submitting credentials");

        let body = LoginRequest {
            login_email: username,
            login_password: password,
            login_remember_me: false,
            return_url: "",
        };

        let response = self
            .http()
            .post(self.endpoints().login())
            .json(&body)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| PortalError::LoginUnavailable {
                phase: AuthPhase::Credentials,
                reason: e.to_string(),
            })?;

        // Typed decode: a body without the redirect field is a phase-1
        // failure, distinct from the semantic bad-credentials signal below.
        let login: LoginResponse =
            response.json().await.map_err(|e| PortalError::LoginUnavailable {
                phase: AuthPhase::Credentials,
                reason: format!("bad login response body: {e}"),
            })?;

        if login.auth_redirect_url.contains(FORGOT_PASSWORD_MARKER) {
            return Err(PortalError::InvalidCredentials);
        }

        Url::parse(&login.auth_redirect_url).map_err(|e| PortalError::LoginUnavailable {
            phase: AuthPhase::Credentials,
            reason: format!("bad redirect URL {:?}: {e}", login.auth_redirect_url),
        })
    }

    /// Phase 2: GET the token-exchange URL and read the session cookie it
    /// set. A 200 without the cookie still means there is no session.
    async fn exchange_token(&self, exchange_url: &Url) -> Result<AuthToken, PortalError> {
        debug!("Auth phase 2/3: exchanging token");

        self.http()
            .get(exchange_url.clone())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| PortalError::LoginUnavailable {
                phase: AuthPhase::TokenExchange,
                reason: e.to_string(),
            })?;

        match self.cookie_value(exchange_url, AUTH_COOKIE_NAME) {
            Some(value) => Ok(AuthToken(value)),
            None => Err(PortalError::LoginUnavailable {
                phase: AuthPhase::TokenExchange,
                reason: format!(
                    "no {AUTH_COOKIE_NAME} cookie was set; username or password may be incorrect"
                ),
            }),
        }
    }

    /// Phase 3: load the account status page and discard the body.
    ///
    /// The request looks useless, but the portal redirects every later
    /// request to the login page until this one page has been loaded,
    /// session cookie or not.
    async fn activate_session(&self) -> Result<(), PortalError> {
        debug!("Auth phase 3/3: activating session");

        self.http()
            .get(self.endpoints().account_status())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| PortalError::LoginUnavailable {
                phase: AuthPhase::Activation,
                reason: e.to_string(),
            })?;

        Ok(())
    }
}

// ============================================================================
// Authenticated Session
// ============================================================================

/// A portal session with a completed login handshake.
///
/// Holding this type proves phases 1-3 all ran, so the cookie jar is valid
/// for the billing endpoints. Dropping it without [`log_out`](Self::log_out)
/// simply abandons the server-side session.
#[derive(Debug)]
pub struct AuthenticatedSession {
    session: PortalSession,
    token: AuthToken,
}

impl AuthenticatedSession {
    /// The session token obtained in phase 2.
    pub fn token(&self) -> &AuthToken {
        &self.token
    }

    pub(crate) fn session(&self) -> &PortalSession {
        &self.session
    }

    /// Ends the portal session, consuming it.
    ///
    /// # Errors
    ///
    /// [`PortalError::LogoutFailed`]. Callers treat this as non-fatal but
    /// should log it; data fetched earlier stays valid.
    #[instrument(skip(self))]
    pub async fn log_out(self) -> Result<(), PortalError> {
        self.session
            .http()
            .get(self.session.endpoints().logoff())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| PortalError::LogoutFailed(e.to_string()))?;

        debug!("Logged out of the portal");
        Ok(())
    }
}
