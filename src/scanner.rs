//! Finds raw email-shaped substrings in arbitrary text.
//!
//! The scanners deliberately over-generate: every candidate they report has
//! passed the canonical format grammar, but business-plausibility filtering
//! happens downstream in the validator.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// How a pattern family captures the address out of its match.
enum Shape {
    /// The whole match is the address.
    Whole,
    /// Group 1 is the address.
    Inner,
    /// Groups 1 and 2 are the local part and the domain.
    Split,
}

/// Pattern families applied in order: standard grammar, quoted, bracketed,
/// mailto URIs, whitespace around the `@`, and non-ASCII local/domain
/// characters.
static EMAIL_PATTERNS: Lazy<Vec<(Regex, Shape)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"[A-Za-z0-9][A-Za-z0-9._-]*@[A-Za-z0-9][A-Za-z0-9.-]*\.[A-Za-z]{2,}")
                .expect("standard email pattern"),
            Shape::Whole,
        ),
        (
            Regex::new(r#"["']([A-Za-z0-9._-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,})["']"#)
                .expect("quoted email pattern"),
            Shape::Inner,
        ),
        (
            Regex::new(r"[<\[]([A-Za-z0-9._-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,})[>\]]")
                .expect("bracketed email pattern"),
            Shape::Inner,
        ),
        (
            Regex::new(r"mailto:([A-Za-z0-9._-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,})")
                .expect("mailto email pattern"),
            Shape::Inner,
        ),
        (
            Regex::new(r"([A-Za-z0-9._-]+)\s*@\s*([A-Za-z0-9.-]+\.[A-Za-z]{2,})")
                .expect("spaced email pattern"),
            Shape::Split,
        ),
        (
            Regex::new(
                r"([A-Za-z0-9._\x{0080}-\x{FFFF}-]+@[A-Za-z0-9.\x{0080}-\x{FFFF}-]+\.[A-Za-z]{2,})",
            )
            .expect("unicode email pattern"),
            Shape::Inner,
        ),
    ]
});

/// Obfuscation spellings of `@` and the final `.`: `[at]`/`(at)`/spelled
/// "at", `[dot]`/`(dot)`/spelled "dot", the fullwidth at sign, and a space
/// or underscore standing in for the last dot.
static OBFUSCATION_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)([A-Za-z0-9._-]+)\s*\[at\]\s*([A-Za-z0-9.-]+)\s*\[dot\]\s*([A-Za-z]{2,})",
        r"(?i)([A-Za-z0-9._-]+)\s*\(at\)\s*([A-Za-z0-9.-]+)\s*\(dot\)\s*([A-Za-z]{2,})",
        r"(?i)([A-Za-z0-9._-]+)\s+at\s+([A-Za-z0-9.-]+)\s+dot\s+([A-Za-z]{2,})",
        r"([A-Za-z0-9._-]+)\s*＠\s*([A-Za-z0-9.-]+\.[A-Za-z]{2,})",
        r"([A-Za-z0-9._-]+)@([A-Za-z0-9-]+)[\s_]([A-Za-z]{2,})",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("obfuscation pattern"))
    .collect()
});

static FORMAT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email format pattern")
});

/// Checks the canonical format grammar: `local@domain.tld` with the domain
/// holding at least two labels and a top label of length >= 2.
pub(crate) fn is_email_format(candidate: &str) -> bool {
    FORMAT_RE.is_match(candidate)
}

/// Returns the distinct lowercase email candidates found in `text`, in
/// discovery order. Every candidate has passed [`is_email_format`].
pub(crate) fn scan_text(text: &str) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut found: Vec<String> = Vec::new();

    for (pattern, shape) in EMAIL_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            let email = match shape {
                Shape::Whole => caps.get(0).map(|m| m.as_str().to_string()),
                Shape::Inner => caps.get(1).map(|m| m.as_str().to_string()),
                Shape::Split => match (caps.get(1), caps.get(2)) {
                    (Some(local), Some(domain)) => {
                        Some(format!("{}@{}", local.as_str().trim(), domain.as_str().trim()))
                    }
                    _ => None,
                },
            };
            if let Some(email) = email {
                let email = email.trim().to_lowercase();
                if is_email_format(&email) && seen.insert(email.clone()) {
                    found.push(email);
                }
            }
        }
    }

    found
}

/// Decodes obfuscated spellings back to canonical addresses and re-checks
/// them through the same format grammar.
pub(crate) fn decode_obfuscated(text: &str) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut found: Vec<String> = Vec::new();

    for pattern in OBFUSCATION_PATTERNS.iter() {
        for caps in pattern.captures_iter(text) {
            let email = match (caps.get(1), caps.get(2), caps.get(3)) {
                (Some(local), Some(domain), Some(tld)) => Some(format!(
                    "{}@{}.{}",
                    local.as_str(),
                    domain.as_str(),
                    tld.as_str()
                )),
                (Some(local), Some(domain), None) => {
                    Some(format!("{}@{}", local.as_str(), domain.as_str()))
                }
                _ => None,
            };
            if let Some(email) = email {
                let email = email.trim().to_lowercase();
                if is_email_format(&email) && seen.insert(email.clone()) {
                    found.push(email);
                }
            }
        }
    }

    found
}
