//! Run orchestration.
//!
//! One run: gating check, login, Green Button fetch + parse, report
//! derivation, settings update, logout. Logout failures are logged and
//! otherwise ignored; everything else aborts the run.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use thiserror::Error;
use tracing::{info, instrument, warn};
use wattbill_client::{AuthenticatedSession, GreenButtonClient, PortalError, PortalSession,
    parse_usage_document};
use wattbill_core::{CoreError, UsageReport};

use crate::settings::{Settings, SettingsError};

/// Minimum days between reports. Billing cycles are monthly; running any
/// sooner can only re-fetch the interval already reported.
const MIN_DAYS_BETWEEN_REPORTS: i64 = 28;

/// Reporter errors.
#[derive(Debug, Error)]
pub enum ReporterError {
    /// Settings could not be loaded, saved, or resolved.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// The portal client failed.
    #[error(transparent)]
    Portal(#[from] PortalError),

    /// The fetched data could not become a report.
    #[error(transparent)]
    Report(#[from] CoreError),
}

/// Outcome of one reporter run.
#[derive(Debug)]
pub enum RunOutcome {
    /// A new report was produced.
    Reported(UsageReport),
    /// Skipped without logging in: too few days since the last report.
    TooSoon {
        /// Billing date of the last emitted report.
        last_report: NaiveDate,
    },
    /// Fetched, but the portal has nothing newer than the last report.
    AlreadyReported {
        /// Billing date the portal still reports.
        billing_date: NaiveDate,
    },
}

/// Decides whether enough days have passed to bother logging in.
fn enough_days_elapsed(today: NaiveDate, last_report: Option<NaiveDate>) -> bool {
    match last_report {
        None => true,
        Some(last) => (today - last).num_days() >= MIN_DAYS_BETWEEN_REPORTS,
    }
}

/// Decides whether a fetched billing date is news.
fn is_new_billing_date(billing_date: NaiveDate, last_report: Option<NaiveDate>) -> bool {
    last_report.is_none_or(|last| billing_date > last)
}

/// Runs the reporter once against the production portal.
///
/// `force` bypasses the day-count gating (not the already-reported check);
/// `dry_run` skips persisting the new billing date.
///
/// # Errors
///
/// Any [`ReporterError`]; no partial results accompany an error.
#[instrument(skip(settings))]
pub async fn run(
    settings: &mut Settings,
    force: bool,
    dry_run: bool,
) -> Result<RunOutcome, ReporterError> {
    let zone = settings.zone()?;
    let today = Utc::now().with_timezone(&zone).date_naive();

    if !force {
        if let Some(last) = settings.most_recent_report_date {
            if !enough_days_elapsed(today, Some(last)) {
                info!(last_report = %last, "Too few days since the last report, skipping run");
                return Ok(RunOutcome::TooSoon { last_report: last });
            }
        }
    }

    let password = settings.password()?;
    let session = PortalSession::new()
        .log_in(&settings.username, &password)
        .await?;

    // Fetch before logging out; the session must stay valid until the
    // document is in hand.
    let fetched = fetch_report(&session, zone).await;

    if let Err(e) = session.log_out().await {
        warn!(error = %e, "Logout failed");
    }

    let report = fetched?;

    if !is_new_billing_date(report.billing_date(), settings.most_recent_report_date) {
        info!(billing_date = %report.billing_date(), "Billing date already reported, skipping");
        return Ok(RunOutcome::AlreadyReported {
            billing_date: report.billing_date(),
        });
    }

    if !dry_run {
        settings.most_recent_report_date = Some(report.billing_date());
    }

    info!(billing_date = %report.billing_date(), cost_cents = report.cost_cents, "Report ready");
    Ok(RunOutcome::Reported(report))
}

async fn fetch_report(
    session: &AuthenticatedSession,
    zone: Tz,
) -> Result<UsageReport, ReporterError> {
    let document = GreenButtonClient::new(session).fetch_usage_document().await?;
    let data = parse_usage_document(&document, zone)?;
    data.validate()?;
    Ok(UsageReport::from_green_button(&data)?)
}

// ============================================================================
// Tests
// ============================================================================
