//! Orders a deduplicated candidate set so business-likely addresses come
//! first; the head of the result becomes the listing's primary email.

use crate::validator::BUSINESS_KEYWORDS;

/// Partitions candidates into business-likely and other, preserving
/// discovery order inside each partition. A candidate is business-likely
/// when its local part carries a business keyword or its domain shares a
/// word of four or more characters with the business name.
pub(crate) fn rank(candidates: Vec<String>, business_name: &str) -> Vec<String> {
    let name_words: Vec<String> = business_name
        .to_lowercase()
        .split_whitespace()
        .filter(|word| word.len() > 3)
        .map(|word| word.to_string())
        .collect();

    let mut business_likely: Vec<String> = Vec::new();
    let mut other: Vec<String> = Vec::new();

    for email in candidates {
        let lower = email.to_lowercase();
        let (local, domain) = lower.split_once('@').unwrap_or((lower.as_str(), ""));
        let has_keyword = BUSINESS_KEYWORDS.iter().any(|k| local.contains(k));
        let domain_matches_name = name_words.iter().any(|word| domain.contains(word.as_str()));
        if has_keyword || domain_matches_name {
            business_likely.push(email);
        } else {
            other.push(email);
        }
    }

    business_likely.extend(other);
    business_likely
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_candidates_first() {
        let ranked = rank(
            vec![
                "jane@randomhost.net".to_string(),
                "info@randomhost.net".to_string(),
            ],
            "Some Business",
        );
        assert_eq!(ranked[0], "info@randomhost.net");
        assert_eq!(ranked[1], "jane@randomhost.net");
    }

    #[test]
    fn test_domain_name_match_counts_as_business() {
        let ranked = rank(
            vec![
                "jane@randomhost.net".to_string(),
                "jane@acmebakery.com".to_string(),
            ],
            "Acme Bakery Springfield",
        );
        assert_eq!(ranked[0], "jane@acmebakery.com");
    }

    #[test]
    fn test_order_preserved_within_partitions() {
        let ranked = rank(
            vec![
                "a@nowhere.net".to_string(),
                "info@x.org".to_string(),
                "b@nowhere.net".to_string(),
                "sales@y.org".to_string(),
            ],
            "Unrelated",
        );
        assert_eq!(
            ranked,
            vec![
                "info@x.org".to_string(),
                "sales@y.org".to_string(),
                "a@nowhere.net".to_string(),
                "b@nowhere.net".to_string(),
            ]
        );
    }
}
