//! Green Button document download.
//!
//! The download is a two-request choreography. The billing page GET
//! renders per-load state tokens as hidden inputs; the POST that triggers
//! the XML download must replay them or the portal rejects it (or returns
//! an empty document). The download button itself is an
//! `<input type="image">`, so the trigger form carries click coordinates.

use std::collections::HashMap;

use tracing::{debug, instrument};

use super::auth::AuthenticatedSession;
use super::error::{FetchStage, PortalError};
use super::forms;

// ============================================================================
// Constants
// ============================================================================

/// ESPI namespace every Green Button document declares.
pub const ESPI_NAMESPACE: &str = "http://naesb.org/espi";

/// Fixed download-trigger parameters: electricity data, XML format, and
/// the image-button click coordinates.
const TRIGGER_PARAMS: &[(&str, &str)] = &[
    ("OptEnergy", "E"),
    ("optFileFormat", "XML"),
    ("imgGreenButton.x", "1"),
    ("imgGreenButton.y", "1"),
];

// ============================================================================
// Usage Document
// ============================================================================

/// Raw Green Button document, held as an immutable parse source.
#[derive(Debug, Clone)]
pub struct UsageDocument {
    xml: String,
}

impl UsageDocument {
    /// Wraps a response body, rejecting bodies that are not ESPI XML
    /// (a login redirect page, for instance).
    ///
    /// # Errors
    ///
    /// [`PortalError::MalformedUsageDocument`] when the body does not
    /// declare the ESPI namespace.
    pub fn from_xml(xml: String) -> Result<Self, PortalError> {
        if !xml.contains(ESPI_NAMESPACE) {
            return Err(PortalError::MalformedUsageDocument(format!(
                "response does not declare the {ESPI_NAMESPACE} namespace"
            )));
        }
        Ok(Self { xml })
    }

    /// The raw XML text.
    pub fn as_str(&self) -> &str {
        &self.xml
    }
}

// ============================================================================
// Green Button Client
// ============================================================================

/// Downloads the Green Button usage document over an authenticated session.
#[derive(Debug)]
pub struct GreenButtonClient<'a> {
    session: &'a AuthenticatedSession,
}

impl<'a> GreenButtonClient<'a> {
    /// Creates a client over an authenticated session.
    pub fn new(session: &'a AuthenticatedSession) -> Self {
        Self { session }
    }

    /// GETs the billing page, replays its hidden fields in the download
    /// POST, and returns the resulting document.
    ///
    /// # Errors
    ///
    /// [`PortalError::UsageFetchFailed`] for a transport failure in either
    /// request; [`PortalError::MalformedUsageDocument`] when the POST body
    /// comes back as something other than ESPI XML.
    #[instrument(skip(self))]
    pub async fn fetch_usage_document(&self) -> Result<UsageDocument, PortalError> {
        let session = self.session.session();
        let url = session.endpoints().green_button();

        debug!("Loading Green Button billing page");
        let page = session
            .http()
            .get(url.clone())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| PortalError::UsageFetchFailed {
                stage: FetchStage::PageLoad,
                reason: e.to_string(),
            })?
            .text()
            .await
            .map_err(|e| PortalError::UsageFetchFailed {
                stage: FetchStage::PageLoad,
                reason: e.to_string(),
            })?;

        let hidden = forms::extract_hidden_fields(&page);
        debug!(hidden_fields = hidden.len(), "Scraped billing page state");

        let form = build_download_form(&hidden);

        debug!("Requesting Green Button XML");
        let body = session
            .http()
            .post(url)
            .form(&form)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| PortalError::UsageFetchFailed {
                stage: FetchStage::DocumentRequest,
                reason: e.to_string(),
            })?
            .text()
            .await
            .map_err(|e| PortalError::UsageFetchFailed {
                stage: FetchStage::DocumentRequest,
                reason: e.to_string(),
            })?;

        UsageDocument::from_xml(body)
    }
}

/// Builds the download POST body: the fixed trigger parameters first, then
/// every scraped hidden field. A hidden field sharing a trigger name is
/// dropped; the explicit trigger intent always wins.
fn build_download_form(hidden: &HashMap<String, String>) -> Vec<(String, String)> {
    let mut form: Vec<(String, String)> = TRIGGER_PARAMS
        .iter()
        .map(|&(name, value)| (name.to_string(), value.to_string()))
        .collect();

    for (name, value) in hidden {
        if TRIGGER_PARAMS.iter().any(|&(fixed, _)| fixed == name) {
            continue;
        }
        form.push((name.clone(), value.clone()));
    }
    form
}

// ============================================================================
// Tests
// ============================================================================
