//! Derives plausible addresses from a known website domain and the
//! business name, for listings that publish no email at all.

use crate::validator::EmailValidator;
use std::collections::HashSet;

/// At most this many inferred guesses are reported per listing.
pub(crate) const MAX_INFERRED: usize = 5;

/// Domains we never infer against: the map provider's own properties and
/// the big social hosts.
static BLOCKED_DOMAINS: &[&str] = &["google.com", "facebook.com"];

/// Common business mailbox prefixes, most likely first.
static COMMON_PREFIXES: &[&str] = &[
    "info",
    "contact",
    "hello",
    "admin",
    "support",
    "sales",
    "enquiries",
    "enquiry",
    "mail",
    "office",
    "reception",
    "general",
    "team",
    "help",
    "service",
    "customerservice",
    "customer.service",
    "customer-service",
    "reservations",
    "booking",
    "bookings",
    "orders",
    "shop",
    "store",
    "online",
    "web",
    "website",
];

/// Generates validated guesses for `domain`, headed by the prefix list and
/// followed by name-derived candidates. Deterministic for a given input;
/// capped at [`MAX_INFERRED`].
pub(crate) fn infer_from_domain(
    domain: &str,
    business_name: &str,
    validator: &EmailValidator,
) -> Vec<String> {
    if domain.is_empty() || BLOCKED_DOMAINS.iter().any(|blocked| domain.contains(blocked)) {
        return Vec::new();
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut candidates: Vec<String> = Vec::new();
    let mut push = |email: String| {
        if seen.insert(email.clone()) {
            candidates.push(email);
        }
    };

    for prefix in COMMON_PREFIXES {
        push(format!("{}@{}", prefix, domain));
    }

    let clean_name = sanitize_name(business_name, 20);
    if clean_name.len() > 3 {
        push(format!("{}@{}", clean_name, domain));
        push(format!("info@{}.com", clean_name));
        push(format!("contact@{}.com", clean_name));
    }
    let first_word = business_name
        .split_whitespace()
        .next()
        .map(|w| sanitize_name(w, 20))
        .unwrap_or_default();
    if first_word.len() > 3 {
        push(format!("{}@{}", first_word, domain));
    }

    candidates
        .into_iter()
        .filter(|email| validator.validate(email))
        .take(MAX_INFERRED)
        .collect()
}

/// Last-resort guess used when every other discovery state came up empty:
/// a deterministic `info@` on a domain spelled from the business name.
pub(crate) fn deterministic_guess(business_name: &str) -> Option<String> {
    let clean_name = sanitize_name(business_name, 30);
    if clean_name.is_empty() {
        return None;
    }
    Some(format!("info@{}.com", clean_name))
}

fn sanitize_name(name: &str, max_len: usize) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(max_len)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> EmailValidator {
        EmailValidator::new(None)
    }

    #[test]
    fn test_deterministic_and_capped() {
        let first = infer_from_domain("acme.com", "Acme Corp", &validator());
        let second = infer_from_domain("acme.com", "Acme Corp", &validator());
        assert_eq!(first, second);
        assert_eq!(first.len(), MAX_INFERRED);
        assert_eq!(first[0], "info@acme.com");
    }

    #[test]
    fn test_denylisted_prefixes_filtered() {
        let guesses = infer_from_domain("acme.com", "Acme Corp", &validator());
        assert!(!guesses.contains(&"admin@acme.com".to_string()));
    }

    #[test]
    fn test_blocked_domains_yield_nothing() {
        assert!(infer_from_domain("maps.google.com", "Acme", &validator()).is_empty());
        assert!(infer_from_domain("facebook.com", "Acme", &validator()).is_empty());
        assert!(infer_from_domain("", "Acme", &validator()).is_empty());
    }

    #[test]
    fn test_deterministic_guess() {
        assert_eq!(
            deterministic_guess("Joe's Diner & Grill"),
            Some("info@joesdinergrill.com".to_string())
        );
        assert_eq!(deterministic_guess("!!!"), None);
    }
}
