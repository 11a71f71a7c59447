//! Defines the core data structures used in the lead-sleuth application.

use serde::{Deserialize, Serialize};

/// Records which pipeline stage produced an accepted email address.
///
/// Propagated into the persisted record and the per-session statistics.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Provenance {
    /// Found directly on the listing's details panel.
    Direct,
    /// Found by fetching the business website through a relay.
    Website,
    /// Produced by the language-model collaborator.
    Ai,
    /// Derived from the website domain or the business name.
    Inferred,
}

impl Provenance {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Provenance::Direct => "direct",
            Provenance::Website => "website",
            Provenance::Ai => "ai",
            Provenance::Inferred => "inferred",
        }
    }
}

/// Raw fields read off one listing's details panel in a single visit.
///
/// `additional_info` is a free-text blob (description, hours, review
/// snippets, categories) used only as model-prompt context; it never feeds
/// back into candidate validation.
#[derive(Debug, Clone, Default)]
pub(crate) struct ListingDetails {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub rating: Option<String>,
    pub business_type: Option<String>,
    pub location: Option<String>,
    pub additional_info: String,
}

/// The outcome of the email-discovery pipeline for one listing.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct EmailFinding {
    /// The single address designated primary for the listing.
    pub primary: String,
    /// Remaining accepted addresses; never contains the primary and never
    /// contains case-insensitive duplicates.
    pub additional: Vec<String>,
    pub provenance: Provenance,
}

impl EmailFinding {
    /// Builds a finding from a ranked candidate list, collapsing
    /// case-insensitive duplicates. Returns `None` for an empty list.
    pub(crate) fn from_ranked(ranked: Vec<String>, provenance: Provenance) -> Option<Self> {
        let mut iter = ranked.into_iter();
        let primary = iter.next()?;
        let mut seen = std::collections::HashSet::new();
        seen.insert(primary.to_lowercase());
        let additional = iter.filter(|e| seen.insert(e.to_lowercase())).collect();
        Some(Self {
            primary,
            additional,
            provenance,
        })
    }
}

/// The persisted unit of output, one per scraped listing.
///
/// Identity is the (name, address) pair; a later record with a matching
/// pair is dropped rather than merged, and records are never mutated after
/// insertion.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub(crate) struct ListingRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub additional_phones: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub additional_emails: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub social_media: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    #[serde(default)]
    pub additional_contacts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_source: Option<Provenance>,
}

impl ListingRecord {
    /// The dedup key for the persisted collection.
    pub(crate) fn key(&self) -> (String, String) {
        (
            self.name.clone(),
            self.address.clone().unwrap_or_default(),
        )
    }
}

/// Settings captured when a scraping session starts.
///
/// Owned by the caller, passed by value into the session and immutable for
/// its duration.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub(crate) struct ScrapeSettings {
    /// Delay between listings, in milliseconds.
    pub delay_ms: u64,
    /// Whether a live surface should auto-scroll to load more results.
    /// Carried and persisted even when the surface cannot scroll.
    pub auto_scroll: bool,
    /// Whether the language-model fallback states may run.
    pub model_fallback: bool,
    /// Prompt template for the generation state, with {businessName},
    /// {businessType} and {location} placeholders.
    pub prompt_template: String,
}

pub(crate) const DEFAULT_PROMPT_TEMPLATE: &str = "Based on the business {businessName} which is a {businessType} located in {location}, what would be their most likely business email address?";

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            delay_ms: 1500,
            auto_scroll: true,
            model_fallback: true,
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }
}

/// Counters for how primary emails were obtained, one bump per stored
/// record that has a primary email.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct EmailStats {
    pub direct: u64,
    pub website: u64,
    pub ai: u64,
    pub inferred: u64,
}

impl EmailStats {
    pub(crate) fn record(&mut self, provenance: Provenance) {
        match provenance {
            Provenance::Direct => self.direct += 1,
            Provenance::Website => self.website += 1,
            Provenance::Ai => self.ai += 1,
            Provenance::Inferred => self.inferred += 1,
        }
    }

    pub(crate) fn total(&self) -> u64 {
        self.direct + self.website + self.ai + self.inferred
    }
}

/// Everything the store persists: the ordered record collection plus the
/// provenance statistics.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub(crate) struct StoreData {
    #[serde(default)]
    pub records: Vec<ListingRecord>,
    #[serde(default)]
    pub stats: EmailStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finding_excludes_primary_from_additional() {
        let finding = EmailFinding::from_ranked(
            vec![
                "info@acme.com".to_string(),
                "INFO@ACME.COM".to_string(),
                "sales@acme.com".to_string(),
            ],
            Provenance::Direct,
        )
        .unwrap();
        assert_eq!(finding.primary, "info@acme.com");
        assert_eq!(finding.additional, vec!["sales@acme.com".to_string()]);
    }

    #[test]
    fn test_finding_empty_input() {
        assert!(EmailFinding::from_ranked(Vec::new(), Provenance::Direct).is_none());
    }

    #[test]
    fn test_stats_record_per_provenance() {
        let mut stats = EmailStats::default();
        stats.record(Provenance::Direct);
        stats.record(Provenance::Direct);
        stats.record(Provenance::Ai);
        stats.record(Provenance::Inferred);
        stats.record(Provenance::Website);
        assert_eq!(stats.direct, 2);
        assert_eq!(stats.website, 1);
        assert_eq!(stats.ai, 1);
        assert_eq!(stats.inferred, 1);
        assert_eq!(stats.total(), 5);
    }

    #[test]
    fn test_record_key_tolerates_missing_address() {
        let record = ListingRecord {
            name: "Acme Corp".to_string(),
            address: None,
            phone: None,
            additional_phones: Vec::new(),
            website: None,
            rating: None,
            email: None,
            additional_emails: Vec::new(),
            social_media: Vec::new(),
            additional_contacts: Vec::new(),
            email_source: None,
        };
        assert_eq!(record.key(), ("Acme Corp".to_string(), String::new()));
    }
}
