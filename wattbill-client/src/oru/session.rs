//! Shared HTTP session context.
//!
//! Every portal request in one run goes through a single [`PortalSession`]:
//! a `reqwest` client wired to a shared cookie jar, plus the contractual
//! endpoint set. The handshake and the Green Button download both depend on
//! cookie state left behind by earlier requests, so the session is never
//! shared across runs and at most one request is in flight at a time.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use url::Url;

// ============================================================================
// Constants
// ============================================================================

/// Production CMS login endpoint.
const LOGIN_URL: &str =
    "https://www.oru.com/sitecore/api/ssc/ConEd-Cms-Services-Controllers-Okta/User/0/Login";

/// Production My Account portal root.
const PORTAL_ROOT: &str = "https://apps.coned.com/ORMyAccount/Forms/";

/// Path of the phase-3 activation page, relative to the portal root.
const ACCOUNT_STATUS_PATH: &str = "System/accountStatus.aspx";

/// Path of the Green Button billing page, relative to the portal root.
const GREEN_BUTTON_PATH: &str = "Billing/GreenButtonData.aspx";

/// Path of the logoff page, relative to the portal root.
const LOGOFF_PATH: &str = "logoff.aspx";

/// HTTP timeout for every portal request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Endpoints
// ============================================================================

/// The portal's contractual endpoints.
///
/// Paths and the login URL must match the provider exactly; they are only
/// overridable so tests can point the session at a local mock server.
#[derive(Debug, Clone)]
pub struct Endpoints {
    login_url: Url,
    portal_root: Url,
}

impl Endpoints {
    /// The real portal endpoints.
    pub fn production() -> Self {
        Self {
            login_url: Url::parse(LOGIN_URL).expect("hardcoded login URL is valid"),
            portal_root: Url::parse(PORTAL_ROOT).expect("hardcoded portal root is valid"),
        }
    }

    /// Custom endpoints, for tests against a mock server.
    ///
    /// `portal_root` is treated as a directory: a missing trailing slash is
    /// added so relative paths join under it rather than replacing its last
    /// segment.
    pub fn new(login_url: Url, mut portal_root: Url) -> Self {
        if !portal_root.path().ends_with('/') {
            portal_root.set_path(&format!("{}/", portal_root.path()));
        }
        Self {
            login_url,
            portal_root,
        }
    }

    /// Phase-1 credential submission endpoint.
    pub fn login(&self) -> Url {
        self.login_url.clone()
    }

    /// Phase-3 activation page.
    pub fn account_status(&self) -> Url {
        self.join(ACCOUNT_STATUS_PATH)
    }

    /// Green Button billing page (GET and POST target).
    pub fn green_button(&self) -> Url {
        self.join(GREEN_BUTTON_PATH)
    }

    /// Logoff page.
    pub fn logoff(&self) -> Url {
        self.join(LOGOFF_PATH)
    }

    fn join(&self, path: &str) -> Url {
        self.portal_root
            .join(path)
            .expect("relative path joins onto portal root")
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::production()
    }
}

// ============================================================================
// Portal Session
// ============================================================================

/// Unauthenticated portal session.
///
/// Owns the cookie jar that the whole run shares. The only way forward is
/// [`PortalSession::log_in`](crate::oru::auth), which consumes this value
/// and returns an [`AuthenticatedSession`](crate::oru::auth::AuthenticatedSession)
/// once all three handshake phases have run.
#[derive(Debug)]
pub struct PortalSession {
    http: reqwest::Client,
    cookies: Arc<Jar>,
    endpoints: Endpoints,
}

impl PortalSession {
    /// Creates a session against the production portal.
    pub fn new() -> Self {
        Self::with_endpoints(Endpoints::production())
    }

    /// Creates a session against custom endpoints.
    pub fn with_endpoints(endpoints: Endpoints) -> Self {
        let cookies = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .cookie_provider(Arc::clone(&cookies))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            cookies,
            endpoints,
        }
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Value of the named cookie currently stored for `url`, if any.
    pub(crate) fn cookie_value(&self, url: &Url, name: &str) -> Option<String> {
        let header = self.cookies.cookies(url)?;
        let header = header.to_str().ok()?;
        header.split(';').find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then(|| value.to_string())
        })
    }
}

impl Default for PortalSession {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
