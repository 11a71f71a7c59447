//! The escalation pipeline that turns one listing visit into an email
//! finding.
//!
//! States run linearly with no backtracking: DOM harvest, domain
//! inference, relay fetch of the business website, model analysis, model
//! generation with a deterministic tail. Each remote state catches its own
//! failures and degrades to the next one; nothing here aborts the listing.

use crate::domain::domain_from_url;
use crate::harvester::{self, ContactLink};
use crate::infer;
use crate::model::{ModelClient, ModelEnrichment};
use crate::models::{EmailFinding, ListingDetails, Provenance, ScrapeSettings};
use crate::ranker;
use crate::relay::RelayClient;
use crate::scanner;
use crate::surface::ListingSurface;
use crate::validator::EmailValidator;
use crate::error::Result;
use std::time::Duration;

/// How many harvest passes to take over one listing before escalating.
const MAX_HARVEST_ATTEMPTS: u32 = 3;

/// Everything the discovery pipeline learned about one listing.
#[derive(Debug, Default)]
pub(crate) struct Discovery {
    pub finding: Option<EmailFinding>,
    /// Extra contact data from the model analysis state, kept even when
    /// its emails were all rejected.
    pub enrichment: ModelEnrichment,
    pub contact_links: Vec<ContactLink>,
}

pub(crate) struct EmailDiscovery {
    relay: RelayClient,
    model: ModelClient,
    settings: ScrapeSettings,
    settle_delay: Duration,
}

impl EmailDiscovery {
    pub(crate) fn new(
        relay: RelayClient,
        model: ModelClient,
        settings: ScrapeSettings,
        settle_delay: Duration,
    ) -> Self {
        Self {
            relay,
            model,
            settings,
            settle_delay,
        }
    }

    /// Runs every discovery state for one listing until a state produces
    /// an accepted finding or all states are exhausted.
    pub(crate) async fn discover(
        &self,
        surface: &mut dyn ListingSurface,
        details: &ListingDetails,
        validator: &EmailValidator,
    ) -> Result<Discovery> {
        let mut discovery = Discovery::default();

        // State 0: harvest the panel, expanding collapsed sections
        // between passes. A pass that expanded nothing leaves the surface
        // unchanged, so rescanning it cannot find anything new.
        let mut harvested: Vec<String> = Vec::new();
        for attempt in 1..=MAX_HARVEST_ATTEMPTS {
            let outcome = {
                let doc = surface.snapshot()?;
                harvester::harvest(&doc, validator)
            };
            let collapsed = outcome.expandable_controls;
            discovery.contact_links = outcome.contact_links;
            harvested = outcome.emails;
            if !harvested.is_empty() {
                tracing::debug!(
                    target: "discovery",
                    "Harvest pass {} found {} candidates",
                    attempt,
                    harvested.len()
                );
                break;
            }
            if attempt == MAX_HARVEST_ATTEMPTS {
                break;
            }
            let expanded = surface.expand_collapsed();
            if expanded == 0 {
                if collapsed > 0 {
                    tracing::debug!(
                        target: "discovery",
                        "{} collapsed controls present but the surface cannot expand them",
                        collapsed
                    );
                }
                tracing::debug!(target: "discovery", "Surface unchanged after pass {}, not retrying", attempt);
                break;
            }
            tracing::debug!(target: "discovery", "Expanded {} controls, rescanning", expanded);
            tokio::time::sleep(self.settle_delay).await;
        }

        if !harvested.is_empty() {
            let ranked = ranker::rank(harvested, &details.name);
            discovery.finding = EmailFinding::from_ranked(ranked, Provenance::Direct);
            return Ok(discovery);
        }

        // State 1: infer from the website domain.
        let domain = details
            .website
            .as_deref()
            .and_then(|website| domain_from_url(website).ok())
            .unwrap_or_default();
        if !domain.is_empty() {
            let inferred = infer::infer_from_domain(&domain, &details.name, validator);
            if !inferred.is_empty() {
                tracing::info!(
                    target: "discovery",
                    "No direct candidates; inferred {} addresses from {}",
                    inferred.len(),
                    domain
                );
                discovery.finding = EmailFinding::from_ranked(inferred, Provenance::Inferred);
                return Ok(discovery);
            }
        }

        // State 2: fetch the website through a relay and scan the body.
        if let Some(website) = details.website.as_deref() {
            match self.relay.fetch(website).await {
                Ok(body) => {
                    let candidates: Vec<String> = scanner::scan_text(&body)
                        .into_iter()
                        .filter(|email| validator.validate(email))
                        .collect();
                    if !candidates.is_empty() {
                        let ranked = ranker::rank(candidates, &details.name);
                        discovery.finding = EmailFinding::from_ranked(ranked, Provenance::Website);
                        return Ok(discovery);
                    }
                    tracing::debug!(target: "discovery", "Website body held no acceptable candidates");
                }
                Err(e) => {
                    tracing::warn!(target: "discovery", "Website fetch failed: {}", e);
                }
            }
        }

        if !self.settings.model_fallback {
            tracing::info!(target: "discovery", "No email found for '{}' (model fallback disabled)", details.name);
            return Ok(discovery);
        }

        // State 3: model analysis of the known business data.
        if self.model.is_configured() {
            match self.model.analyze_listing(details).await {
                Ok(enrichment) => {
                    let accepted: Vec<String> = enrichment
                        .emails
                        .iter()
                        .map(|email| email.trim().to_lowercase())
                        .filter(|email| validator.validate(email))
                        .collect();
                    discovery.enrichment = enrichment;
                    if !accepted.is_empty() {
                        let ranked = ranker::rank(accepted, &details.name);
                        discovery.finding = EmailFinding::from_ranked(ranked, Provenance::Ai);
                        return Ok(discovery);
                    }
                    if !discovery.enrichment.is_empty() {
                        tracing::debug!(target: "discovery", "No acceptable model emails; keeping enrichment extras");
                    }
                }
                Err(e) => {
                    tracing::warn!(target: "discovery", "Model analysis failed: {}", e);
                }
            }

            // State 4: model generation from the prompt template.
            let prompt = render_prompt(&self.settings.prompt_template, details);
            match self.model.generate_address(&prompt).await {
                Ok(Some(email)) if validator.validate(&email) => {
                    discovery.finding = EmailFinding::from_ranked(vec![email], Provenance::Ai);
                    return Ok(discovery);
                }
                Ok(_) => {
                    tracing::debug!(target: "discovery", "Model produced no usable address");
                }
                Err(e) => {
                    tracing::warn!(target: "discovery", "Model generation failed: {}", e);
                }
            }
        } else {
            tracing::debug!(target: "discovery", "Model collaborator not configured, using deterministic tail");
        }

        // Deterministic tail of state 4: a name-derived guess that needs
        // no network at all.
        if let Some(guess) = infer::deterministic_guess(&details.name) {
            if validator.validate(&guess) {
                tracing::info!(target: "discovery", "Falling back to deterministic guess {}", guess);
                discovery.finding = EmailFinding::from_ranked(vec![guess], Provenance::Inferred);
                return Ok(discovery);
            }
        }

        tracing::info!(target: "discovery", "No email found for '{}'", details.name);
        Ok(discovery)
    }
}

/// Fills the {businessName}, {businessType} and {location} placeholders.
fn render_prompt(template: &str, details: &ListingDetails) -> String {
    template
        .replace("{businessName}", &details.name)
        .replace(
            "{businessType}",
            details.business_type.as_deref().unwrap_or("business"),
        )
        .replace(
            "{location}",
            details.location.as_deref().unwrap_or("unknown location"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_PROMPT_TEMPLATE;
    use crate::relay::DEFAULT_RELAY_ENDPOINTS;
    use crate::surface::StaticSnapshot;

    fn engine(model_fallback: bool, api_key: Option<&str>) -> EmailDiscovery {
        let http = reqwest::Client::new();
        let relay = RelayClient::new(
            http.clone(),
            // Unroutable endpoint so state 2 fails fast in tests.
            vec!["http://127.0.0.1:9/".to_string()],
        );
        let model = ModelClient::new(
            http,
            "http://127.0.0.1:9/v1/chat/completions".to_string(),
            "test-model".to_string(),
            api_key.map(|k| k.to_string()),
        );
        let settings = ScrapeSettings {
            model_fallback,
            ..ScrapeSettings::default()
        };
        EmailDiscovery::new(relay, model, settings, Duration::from_millis(1))
    }

    fn details(name: &str, website: Option<&str>) -> ListingDetails {
        ListingDetails {
            name: name.to_string(),
            website: website.map(|w| w.to_string()),
            ..ListingDetails::default()
        }
    }

    #[tokio::test]
    async fn test_direct_harvest_short_circuits() {
        let mut surface = StaticSnapshot {
            html: r#"<html><body><div class="section-contact-info">Email us at info [at] acme [dot] com</div></body></html>"#.to_string(),
        };
        let discovery = engine(false, None)
            .discover(
                &mut surface,
                &details("Acme Corp", None),
                &EmailValidator::new(None),
            )
            .await
            .unwrap();
        let finding = discovery.finding.unwrap();
        assert_eq!(finding.primary, "info@acme.com");
        assert_eq!(finding.provenance, Provenance::Direct);
    }

    #[tokio::test]
    async fn test_empty_harvest_escalates_to_inference() {
        let mut surface = StaticSnapshot {
            html: "<html><body><h1>Acme Corp</h1></body></html>".to_string(),
        };
        let discovery = engine(false, None)
            .discover(
                &mut surface,
                &details("Acme Corp", Some("https://www.acme.com")),
                &EmailValidator::new(None),
            )
            .await
            .unwrap();
        let finding = discovery.finding.unwrap();
        assert_eq!(finding.primary, "info@acme.com");
        assert_eq!(finding.provenance, Provenance::Inferred);
    }

    #[tokio::test]
    async fn test_no_domain_no_model_ends_with_deterministic_tail() {
        let mut surface = StaticSnapshot {
            html: "<html><body><h1>Acme Corp</h1></body></html>".to_string(),
        };
        let discovery = engine(true, None)
            .discover(
                &mut surface,
                &details("Acme Corp", None),
                &EmailValidator::new(None),
            )
            .await
            .unwrap();
        let finding = discovery.finding.unwrap();
        assert_eq!(finding.primary, "info@acmecorp.com");
        assert_eq!(finding.provenance, Provenance::Inferred);
    }

    #[tokio::test]
    async fn test_fallback_disabled_yields_no_finding() {
        let mut surface = StaticSnapshot {
            html: "<html><body><h1>Acme Corp</h1></body></html>".to_string(),
        };
        let discovery = engine(false, None)
            .discover(
                &mut surface,
                &details("Acme Corp", None),
                &EmailValidator::new(None),
            )
            .await
            .unwrap();
        assert!(discovery.finding.is_none());
    }

    #[tokio::test]
    async fn test_blocked_domain_with_failing_fetch_and_no_model() {
        // Domain inference refuses the map provider's own domain and the
        // relay endpoint is unreachable, so a disabled model means no
        // finding at all.
        let mut surface = StaticSnapshot {
            html: "<html><body><h1>Acme Corp</h1></body></html>".to_string(),
        };
        let discovery = engine(false, None)
            .discover(
                &mut surface,
                &details("Acme Corp", Some("https://maps.google.com/place/acme")),
                &EmailValidator::new(None),
            )
            .await
            .unwrap();
        assert!(discovery.finding.is_none());
    }

    #[test]
    fn test_render_prompt() {
        let mut d = details("Acme Corp", None);
        d.business_type = Some("bakery".to_string());
        d.location = Some("Springfield".to_string());
        let prompt = render_prompt(DEFAULT_PROMPT_TEMPLATE, &d);
        assert!(prompt.contains("Acme Corp"));
        assert!(prompt.contains("bakery"));
        assert!(prompt.contains("Springfield"));
        assert!(!prompt.contains("{businessName}"));
    }

    #[test]
    fn test_default_relays_present() {
        assert_eq!(DEFAULT_RELAY_ENDPOINTS.len(), 3);
    }
}
