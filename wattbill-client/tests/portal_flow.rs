//! End-to-end portal choreography tests against a mock server.
//!
//! These cover the three-phase handshake ordering, both bad-credential
//! signals, the hidden-field replay in the Green Button download, and
//! logout.

use chrono_tz::America::New_York;
use serde_json::json;
use url::Url;
use wattbill_client::{
    AuthPhase, Endpoints, FetchStage, GreenButtonClient, PortalError, PortalSession,
    parse_usage_document,
};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const AUTH_COOKIE: &str = "LogCOOKPl95FnjAT";

fn session_for(server: &MockServer) -> PortalSession {
    let endpoints = Endpoints::new(
        Url::parse(&format!("{}/login", server.uri())).unwrap(),
        Url::parse(&format!("{}/portal/", server.uri())).unwrap(),
    );
    PortalSession::with_endpoints(endpoints)
}

async fn mount_login(server: &MockServer, redirect_url: &str) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_partial_json(json!({
            "LoginEmail": "oruUser",
            "LoginPassword": "oruPass",
            "LoginRememberMe": false,
            "ReturnUrl": "",
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "authRedirectUrl": redirect_url })),
        )
        .mount(server)
        .await;
}

async fn mount_exchange_with_cookie(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/exchange"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", format!("{AUTH_COOKIE}=tok123; Path=/")),
        )
        .mount(server)
        .await;
}

async fn mount_account_status(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/portal/System/accountStatus.aspx"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>status</html>"))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn login_runs_all_three_phases_in_order() {
    let server = MockServer::start().await;
    mount_login(&server, &format!("{}/exchange", server.uri())).await;
    mount_exchange_with_cookie(&server).await;
    mount_account_status(&server).await;

    let session = session_for(&server)
        .log_in("oruUser", "oruPass")
        .await
        .unwrap();

    assert_eq!(session.token().as_str(), "tok123");

    let requests = server.received_requests().await.unwrap();
    let paths: Vec<&str> = requests.iter().map(|r| r.url.path()).collect();
    assert_eq!(
        paths,
        vec!["/login", "/exchange", "/portal/System/accountStatus.aspx"]
    );
}

#[tokio::test]
async fn forgot_password_redirect_is_invalid_credentials() {
    let server = MockServer::start().await;
    mount_login(
        &server,
        &format!("{}/accounts-billing/ForgotPassword", server.uri()),
    )
    .await;

    // Phase 2 must never run after the bad-credentials signal.
    Mock::given(method("GET"))
        .and(path("/accounts-billing/ForgotPassword"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = session_for(&server)
        .log_in("oruUser", "oruPass")
        .await
        .unwrap_err();

    assert!(matches!(err, PortalError::InvalidCredentials));
}

#[tokio::test]
async fn missing_session_cookie_is_phase_two_failure() {
    let server = MockServer::start().await;
    mount_login(&server, &format!("{}/exchange", server.uri())).await;

    // Exchange succeeds at the HTTP level but never sets the cookie.
    Mock::given(method("GET"))
        .and(path("/exchange"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let err = session_for(&server)
        .log_in("oruUser", "oruPass")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PortalError::LoginUnavailable {
            phase: AuthPhase::TokenExchange,
            ..
        }
    ));
}

#[tokio::test]
async fn login_endpoint_failure_is_phase_one_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = session_for(&server)
        .log_in("oruUser", "oruPass")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PortalError::LoginUnavailable {
            phase: AuthPhase::Credentials,
            ..
        }
    ));
}

#[tokio::test]
async fn activation_failure_is_phase_three_failure() {
    let server = MockServer::start().await;
    mount_login(&server, &format!("{}/exchange", server.uri())).await;
    mount_exchange_with_cookie(&server).await;

    Mock::given(method("GET"))
        .and(path("/portal/System/accountStatus.aspx"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = session_for(&server)
        .log_in("oruUser", "oruPass")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PortalError::LoginUnavailable {
            phase: AuthPhase::Activation,
            ..
        }
    ));
}

#[tokio::test]
async fn download_replays_hidden_fields_and_keeps_trigger_params() {
    let server = MockServer::start().await;
    mount_login(&server, &format!("{}/exchange", server.uri())).await;
    mount_exchange_with_cookie(&server).await;
    mount_account_status(&server).await;

    let billing_page = r#"
        <form method="post" action="GreenButtonData.aspx">
            <input type="hidden" name="__VIEWSTATE" value="dDwtMTA=" />
            <input type="hidden" name="OptEnergy" value="G" />
            <input type="image" name="imgGreenButton" src="gb.png" />
        </form>
    "#;
    let espi = r#"<feed xmlns:espi="http://naesb.org/espi">
        <espi:IntervalReading>
            <espi:cost>150000</espi:cost>
            <espi:timePeriod>
                <espi:duration>2592000</espi:duration>
                <espi:start>1500000000</espi:start>
            </espi:timePeriod>
        </espi:IntervalReading>
    </feed>"#;

    Mock::given(method("GET"))
        .and(path("/portal/Billing/GreenButtonData.aspx"))
        .respond_with(ResponseTemplate::new(200).set_body_string(billing_page))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/portal/Billing/GreenButtonData.aspx"))
        .respond_with(ResponseTemplate::new(200).set_body_string(espi))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&server)
        .log_in("oruUser", "oruPass")
        .await
        .unwrap();

    let document = GreenButtonClient::new(&session)
        .fetch_usage_document()
        .await
        .unwrap();

    let data = parse_usage_document(&document, New_York).unwrap();
    assert_eq!(data.meter_readings.len(), 1);
    assert_eq!(data.meter_readings[0].cost_cents, 150);

    let requests = server.received_requests().await.unwrap();
    let post = requests
        .iter()
        .find(|r| r.method.to_string() == "POST" && r.url.path().ends_with("GreenButtonData.aspx"))
        .unwrap();
    let body = String::from_utf8(post.body.clone()).unwrap();

    assert!(body.contains("OptEnergy=E"));
    assert!(body.contains("optFileFormat=XML"));
    assert!(body.contains("imgGreenButton.x=1"));
    assert!(body.contains("imgGreenButton.y=1"));
    assert!(body.contains("__VIEWSTATE=dDwtMTA%3D"));
    // The scraped OptEnergy=G must not override the trigger parameter.
    assert!(!body.contains("OptEnergy=G"));
}

#[tokio::test]
async fn non_espi_download_is_malformed_document() {
    let server = MockServer::start().await;
    mount_login(&server, &format!("{}/exchange", server.uri())).await;
    mount_exchange_with_cookie(&server).await;
    mount_account_status(&server).await;

    Mock::given(method("GET"))
        .and(path("/portal/Billing/GreenButtonData.aspx"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/portal/Billing/GreenButtonData.aspx"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>session expired</html>"))
        .mount(&server)
        .await;

    let session = session_for(&server)
        .log_in("oruUser", "oruPass")
        .await
        .unwrap();

    let err = GreenButtonClient::new(&session)
        .fetch_usage_document()
        .await
        .unwrap_err();
    assert!(matches!(err, PortalError::MalformedUsageDocument(_)));
}

#[tokio::test]
async fn billing_page_failure_is_page_load_stage() {
    let server = MockServer::start().await;
    mount_login(&server, &format!("{}/exchange", server.uri())).await;
    mount_exchange_with_cookie(&server).await;
    mount_account_status(&server).await;

    Mock::given(method("GET"))
        .and(path("/portal/Billing/GreenButtonData.aspx"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let session = session_for(&server)
        .log_in("oruUser", "oruPass")
        .await
        .unwrap();

    let err = GreenButtonClient::new(&session)
        .fetch_usage_document()
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PortalError::UsageFetchFailed {
            stage: FetchStage::PageLoad,
            ..
        }
    ));
}

#[tokio::test]
async fn logout_hits_logoff_endpoint() {
    let server = MockServer::start().await;
    mount_login(&server, &format!("{}/exchange", server.uri())).await;
    mount_exchange_with_cookie(&server).await;
    mount_account_status(&server).await;

    Mock::given(method("GET"))
        .and(path("/portal/logoff.aspx"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&server)
        .log_in("oruUser", "oruPass")
        .await
        .unwrap();
    session.log_out().await.unwrap();
}

#[tokio::test]
async fn failed_logout_is_reported() {
    let server = MockServer::start().await;
    mount_login(&server, &format!("{}/exchange", server.uri())).await;
    mount_exchange_with_cookie(&server).await;
    mount_account_status(&server).await;

    Mock::given(method("GET"))
        .and(path("/portal/logoff.aspx"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let session = session_for(&server)
        .log_in("oruUser", "oruPass")
        .await
        .unwrap();
    let err = session.log_out().await.unwrap_err();
    assert!(matches!(err, PortalError::LogoutFailed(_)));
}
