//! Utility functions for handling domain names and URLs.

use crate::error::{AppError, Result};
use url::Url;

/// Extracts the base domain name (e.g., "example.com") from a URL string.
/// Handles missing schemes, "www." prefixes, and ports.
pub(crate) fn domain_from_url(website_url: &str) -> Result<String> {
    if website_url.trim().is_empty() {
        return Err(AppError::DomainExtraction(
            "Input URL string is empty".to_string(),
        ));
    }

    let url = normalize_url(website_url)?;
    let host = url.host_str().ok_or_else(|| {
        AppError::DomainExtraction(format!("Could not extract host from URL: {}", website_url))
    })?;

    let domain = host.strip_prefix("www.").unwrap_or(host).to_lowercase();
    tracing::debug!("Extracted domain '{}' from '{}'", domain, website_url);
    Ok(domain)
}

/// Parses a website string into a `Url`, adding a https scheme if absent.
pub(crate) fn normalize_url(website_url: &str) -> Result<Url> {
    let trimmed = website_url.trim();
    if trimmed.is_empty() {
        return Err(AppError::InsufficientInput(
            "Website URL is empty".to_string(),
        ));
    }
    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    Url::parse(&with_scheme).map_err(AppError::UrlParse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_from_url_simple() {
        assert_eq!(
            domain_from_url("https://www.example.com").unwrap(),
            "example.com"
        );
        assert_eq!(domain_from_url("http://example.com").unwrap(), "example.com");
        assert_eq!(domain_from_url("example.com").unwrap(), "example.com");
    }

    #[test]
    fn test_domain_from_url_edge_cases() {
        assert_eq!(domain_from_url("www.example.com").unwrap(), "example.com");
        assert_eq!(
            domain_from_url("https://EXAMPLE.com/path?query=1").unwrap(),
            "example.com"
        );
        assert_eq!(
            domain_from_url("http://example.com:8080").unwrap(),
            "example.com"
        );
        assert_eq!(
            domain_from_url("https://sub.domain.example.co.uk").unwrap(),
            "sub.domain.example.co.uk"
        );
    }

    #[test]
    fn test_domain_from_url_invalid() {
        assert!(domain_from_url("").is_err());
        assert!(domain_from_url("http://").is_err());
    }
}
