//! Decides whether a scanned email candidate is a plausible business
//! contact address.
//!
//! Rejection rules run in a fixed order; the first one that fires wins.
//! Consumer mail providers get a softening pass: business signal in the
//! local part overrides the suspicious-shape rejection, and absent both
//! signal and suspicion the address is accepted (lenient default).

use crate::scanner;
use once_cell::sync::Lazy;
use regex::Regex;

/// Substrings that mark a candidate as noise: placeholder domains,
/// platform/analytics/social hosts, link shorteners, image density
/// suffixes, and pure infra mailbox roles.
static DENYLIST: &[&str] = &[
    "example.com",
    "example.org",
    "test.com",
    "localhost",
    "noreply@",
    "no-reply@",
    "donotreply@",
    "@2x",
    "@3x",
    "sentry.io",
    "gstatic.com",
    "googleapis.com",
    "google.com",
    "facebook.com",
    "twitter.com",
    "instagram.com",
    "linkedin.com",
    "maps.google.com",
    "youtu.be",
    "youtube.com",
    "bit.ly",
    "tinyurl.com",
    "goo.gl",
    "ow.ly",
    "short.link",
    "placeholder",
    "dummy",
    "fake",
    "invalid",
    "admin@",
    "webmaster@",
    "postmaster@",
    "hostmaster@",
    "abuse@",
    "security@",
    "privacy@",
    "legal@",
    "dmca@",
    "copyright@",
];

/// Consumer mail providers whose addresses are usually personal.
static PERSONAL_PROVIDERS: &[&str] = &[
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "aol.com",
    "icloud.com",
    "me.com",
    "mac.com",
    "live.com",
    "msn.com",
    "protonmail.com",
    "yandex.com",
    "mail.com",
    "inbox.com",
];

/// Local-part keywords that signal a business mailbox even on a consumer
/// provider. Shared with the result ranker.
pub(crate) static BUSINESS_KEYWORDS: &[&str] = &[
    "info",
    "contact",
    "sales",
    "support",
    "admin",
    "office",
    "business",
    "service",
    "help",
    "inquiry",
    "marketing",
    "team",
    "reception",
    "booking",
    "reservations",
    "orders",
    "customerservice",
    "hello",
    "welcome",
    "general",
    "mail",
    "enquiry",
    "enquiries",
    "shop",
    "store",
    "company",
    "corp",
    "inc",
    "llc",
    "group",
    "services",
    "solutions",
    "consulting",
    "management",
    "director",
    "manager",
    "owner",
    "ceo",
    "president",
    "founder",
    "principal",
    "partner",
];

/// Shapes that look personal or auto-generated.
static SUSPICIOUS_SHAPES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^[a-z]{1,3}[0-9]{4,}$",
        r"^[0-9]{4,}$",
        r"^(test|demo|sample|temp)",
        r"^(user|admin|root|system)$",
        r"^[a-z]{1,2}[0-9]{1,2}$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("suspicious shape pattern"))
    .collect()
});

/// Shapes that read like a business name used as a local part.
static BUSINESS_NAME_SHAPES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^[a-z]+[a-z0-9]*[a-z]+$",
        r"^[a-z]+[._-][a-z]+",
        r"^[a-z]{4,}[0-9]{1,3}$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("business name shape pattern"))
    .collect()
});

/// Shapes that are almost certainly a person's mailbox on a consumer
/// provider (firstname1234, john.doe99, ...).
static OBVIOUS_PERSONAL_SHAPES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^[a-z]+[0-9]{4,}$",
        r"^[a-z]{1,2}[0-9]{4,}$",
        r"^[a-z]+\.[a-z]+[0-9]{2,}$",
        r"^[a-z]+[0-9]{4,}[a-z]*$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("personal shape pattern"))
    .collect()
});

/// Validates candidates against the rule set, excluding the operator's own
/// address for the running session.
#[derive(Debug, Clone, Default)]
pub(crate) struct EmailValidator {
    self_email: Option<String>,
}

impl EmailValidator {
    pub(crate) fn new(self_email: Option<String>) -> Self {
        Self {
            self_email: self_email.map(|e| e.trim().to_lowercase()),
        }
    }

    /// Accepts or rejects one candidate. Pure and idempotent: the same
    /// input always yields the same decision.
    pub(crate) fn validate(&self, candidate: &str) -> bool {
        let email = candidate.trim().to_lowercase();

        if !scanner::is_email_format(&email) {
            return false;
        }

        if let Some(own) = &self.self_email {
            if email == *own {
                tracing::debug!(target: "validator", "Filtered out operator email: {}", email);
                return false;
            }
        }

        if DENYLIST.iter().any(|blocked| email.contains(blocked)) {
            return false;
        }

        let Some((local, domain)) = email.split_once('@') else {
            return false;
        };

        if domain.len() < 4 {
            return false;
        }
        let labels: Vec<&str> = domain.split('.').collect();
        if labels.len() < 2 || labels.last().map_or(true, |tld| tld.len() < 2) {
            return false;
        }

        let suspicious = SUSPICIOUS_SHAPES.iter().any(|re| re.is_match(local));
        let personal_provider = PERSONAL_PROVIDERS.iter().any(|p| domain == *p);

        if personal_provider {
            let has_keyword = BUSINESS_KEYWORDS.iter().any(|k| local.contains(k));
            let named_like_business = BUSINESS_NAME_SHAPES.iter().any(|re| re.is_match(local));
            if has_keyword || named_like_business {
                return true;
            }
            if suspicious {
                tracing::debug!(target: "validator", "Filtered suspicious personal email: {}", email);
                return false;
            }
            if OBVIOUS_PERSONAL_SHAPES.iter().any(|re| re.is_match(local)) {
                tracing::debug!(target: "validator", "Filtered obviously personal email: {}", email);
                return false;
            }
            return true;
        }

        !suspicious
    }
}
