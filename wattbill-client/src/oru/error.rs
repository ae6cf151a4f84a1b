//! Portal error taxonomy.

use std::fmt;

use thiserror::Error;

// ============================================================================
// Phase / Stage Tags
// ============================================================================

/// Phases of the login handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// Phase 1: credential submission to the CMS login endpoint.
    Credentials,
    /// Phase 2: token-exchange redirect and session cookie read.
    TokenExchange,
    /// Phase 3: account-status activation request.
    Activation,
}

impl AuthPhase {
    /// One-based phase number.
    pub fn number(self) -> u8 {
        match self {
            AuthPhase::Credentials => 1,
            AuthPhase::TokenExchange => 2,
            AuthPhase::Activation => 3,
        }
    }
}

impl fmt::Display for AuthPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Stages of the Green Button download choreography.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    /// GET of the billing page that renders the hidden state fields.
    PageLoad,
    /// POST of the download trigger form.
    DocumentRequest,
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStage::PageLoad => write!(f, "page-load"),
            FetchStage::DocumentRequest => write!(f, "document-request"),
        }
    }
}

// ============================================================================
// Portal Errors
// ============================================================================

/// Errors produced by the portal client.
///
/// No variant is retried internally; callers restart from phase 1 if they
/// want another attempt.
#[derive(Debug, Error)]
pub enum PortalError {
    /// Transport or decode failure during the login handshake, or a
    /// missing session cookie after phase 2.
    #[error("login unavailable (auth phase {phase}/3): {reason}")]
    LoginUnavailable {
        /// Which handshake phase failed.
        phase: AuthPhase,
        /// Underlying cause, stringified.
        reason: String,
    },

    /// Phase 1 redirected to the password-reset page: the portal's way of
    /// rejecting the credentials.
    #[error("incorrect username or password")]
    InvalidCredentials,

    /// Transport failure while fetching the Green Button document.
    #[error("usage fetch failed ({stage}): {reason}")]
    UsageFetchFailed {
        /// Which download stage failed.
        stage: FetchStage,
        /// Underlying cause, stringified.
        reason: String,
    },

    /// The response body is not a usable ESPI document.
    #[error("malformed usage document: {0}")]
    MalformedUsageDocument(String),

    /// An interval reading has no cost element. A missing cost means a
    /// schema mismatch, never a zero-cost reading.
    #[error("interval reading has no cost element")]
    MissingCostField,

    /// The logoff request failed. Non-fatal to callers.
    #[error("logout failed: {0}")]
    LogoutFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(AuthPhase::Credentials.to_string(), "1");
        assert_eq!(AuthPhase::TokenExchange.to_string(), "2");
        assert_eq!(AuthPhase::Activation.to_string(), "3");
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(FetchStage::PageLoad.to_string(), "page-load");
        assert_eq!(FetchStage::DocumentRequest.to_string(), "document-request");
    }

    #[test]
    fn test_login_unavailable_message_carries_phase() {
        let err = PortalError::LoginUnavailable {
            phase: AuthPhase::TokenExchange,
            reason: "no cookie".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "login unavailable (auth phase 2/3): no cookie"
        );
    }
}
