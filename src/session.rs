//! Drives a strictly sequential scraping session over a set of listing
//! surfaces.
//!
//! All mutable session state (cancellation flag, settings, the operator's
//! detected address) lives in an explicit context passed into the loop;
//! there are no ambient globals. Cancellation is cooperative: the flag is
//! polled between listings and between major steps, and in-flight work
//! for the current listing is allowed to finish.

use crate::details;
use crate::discovery::{Discovery, EmailDiscovery};
use crate::error::{AppError, Result};
use crate::harvester;
use crate::models::{ListingDetails, ListingRecord, ScrapeSettings};
use crate::store::ResultStore;
use crate::surface::ListingSurface;
use crate::validator::EmailValidator;
use indicatif::ProgressBar;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub(crate) struct SessionContext {
    active: Arc<AtomicBool>,
    pub settings: ScrapeSettings,
    /// The operator's own address, detected on the first snapshot and
    /// excluded from every validation for the rest of the session.
    self_email: Option<String>,
    self_email_probed: bool,
}

impl SessionContext {
    pub(crate) fn new(settings: ScrapeSettings) -> Self {
        Self {
            active: Arc::new(AtomicBool::new(true)),
            settings,
            self_email: None,
            self_email_probed: false,
        }
    }

    /// Handle for cancelling the session from another task (Ctrl-C).
    pub(crate) fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.active.clone()
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct SessionReport {
    pub scraped: usize,
    pub duplicates: usize,
    pub failed: usize,
    pub cancelled: bool,
}

/// Processes every surface in order: extract details, run discovery with
/// all its fallbacks, dedup on (name, address), append to the store.
/// Listing-level failures are logged and skipped; only an empty surface
/// set is fatal to the session.
pub(crate) async fn run_session<S: ListingSurface>(
    ctx: &mut SessionContext,
    surfaces: Vec<S>,
    engine: &EmailDiscovery,
    store: &mut ResultStore,
    progress: Option<&ProgressBar>,
) -> Result<SessionReport> {
    if surfaces.is_empty() {
        return Err(AppError::Surface(
            "no listing snapshots found; point --input at a directory of captured listing pages"
                .to_string(),
        ));
    }

    let total = surfaces.len();
    let delay = Duration::from_millis(ctx.settings.delay_ms);
    let mut report = SessionReport::default();

    for (index, mut surface) in surfaces.into_iter().enumerate() {
        if !ctx.is_active() {
            tracing::warn!(target: "session", "Session cancelled, stopping at listing {}/{}", index, total);
            report.cancelled = true;
            break;
        }

        let label = surface.label();
        tracing::info!(target: "session", "Processing listing {}/{}: {}", index + 1, total, label);

        match process_listing(ctx, &mut surface, engine, store).await {
            Ok(ListingOutcome::Scraped) => report.scraped += 1,
            Ok(ListingOutcome::Duplicate) => report.duplicates += 1,
            Ok(ListingOutcome::Unusable(reason)) => {
                tracing::warn!(target: "session", "Skipping {}: {}", label, reason);
                report.failed += 1;
            }
            Err(e) => {
                tracing::warn!(target: "session", "Listing {} failed: {}", label, e);
                report.failed += 1;
            }
        }

        if let Some(bar) = progress {
            bar.inc(1);
        }

        if index + 1 < total && ctx.is_active() {
            tokio::time::sleep(delay).await;
        }
    }

    tracing::info!(
        target: "session",
        "Session finished: {} scraped, {} duplicates, {} failed{}",
        report.scraped,
        report.duplicates,
        report.failed,
        if report.cancelled { " (cancelled)" } else { "" }
    );
    Ok(report)
}

enum ListingOutcome {
    Scraped,
    Duplicate,
    Unusable(String),
}

async fn process_listing<S: ListingSurface>(
    ctx: &mut SessionContext,
    surface: &mut S,
    engine: &EmailDiscovery,
    store: &mut ResultStore,
) -> Result<ListingOutcome> {
    let details = {
        let doc = surface.snapshot()?;
        if !ctx.self_email_probed {
            ctx.self_email = harvester::detect_operator_email(&doc);
            ctx.self_email_probed = true;
            if let Some(own) = &ctx.self_email {
                tracing::info!(target: "session", "Operator email detected and excluded: {}", own);
            }
        }
        details::extract_details(&doc)
    };

    if details.name.is_empty() {
        return Ok(ListingOutcome::Unusable(
            "listing panel has no business name".to_string(),
        ));
    }
    if store.contains(&details.name, details.address.as_deref()) {
        return Ok(ListingOutcome::Duplicate);
    }

    let validator = EmailValidator::new(ctx.self_email.clone());
    let discovery = engine.discover(surface, &details, &validator).await?;
    let record = build_record(details, discovery);

    if let (Some(email), Some(source)) = (&record.email, record.email_source) {
        tracing::info!(
            target: "session",
            "Found email for '{}': {} ({})",
            record.name,
            email,
            source.as_str()
        );
    } else {
        tracing::info!(target: "session", "No email found for '{}'", record.name);
    }

    if store.append(record)? {
        Ok(ListingOutcome::Scraped)
    } else {
        Ok(ListingOutcome::Duplicate)
    }
}

/// Merges the listing details, the discovery finding and the model
/// enrichment into the persisted record.
pub(crate) fn build_record(details: ListingDetails, discovery: Discovery) -> ListingRecord {
    let (email, additional_emails, email_source) = match discovery.finding {
        Some(finding) => (
            Some(finding.primary),
            finding.additional,
            Some(finding.provenance),
        ),
        None => (None, Vec::new(), None),
    };

    let additional_phones: Vec<String> = discovery
        .enrichment
        .phones
        .iter()
        .filter(|phone| details.phone.as_deref() != Some(phone.as_str()) && phone.len() > 6)
        .cloned()
        .collect();

    ListingRecord {
        name: details.name,
        address: details.address,
        phone: details.phone,
        additional_phones,
        website: details.website,
        rating: details.rating,
        email,
        additional_emails,
        social_media: discovery.enrichment.social_media,
        additional_contacts: discovery.enrichment.additional_contacts,
        email_source,
    }
}
