//! Reads the listing's structured fields off the details panel.

use crate::landmarks;
use crate::models::ListingDetails;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static RATING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+\.?\d*)").expect("rating pattern"));

/// Extracts the listing's name, contact fields and prompt-context blob
/// from a details-panel snapshot. Missing fields stay `None`; only the
/// name is required for the listing to count as scraped, and that check
/// belongs to the caller.
pub(crate) fn extract_details(doc: &Html) -> ListingDetails {
    let mut details = ListingDetails::default();

    if let Some(name) = first_text(doc, &landmarks::NAME_SELECTOR) {
        details.name = name;
    }

    let categories: Vec<String> = landmarks::CATEGORY_SELECTORS
        .iter()
        .flat_map(|selector| doc.select(selector))
        .map(element_text)
        .filter(|t| !t.is_empty())
        .collect();
    if !categories.is_empty() {
        details.business_type = Some(categories.join(", "));
    }

    if let Some(address) = first_text(doc, &landmarks::ADDRESS_SELECTOR) {
        details.location = Some(address.clone());
        details.address = Some(address);
    }

    details.phone = first_text(doc, &landmarks::PHONE_SELECTOR);

    details.website = doc
        .select(&landmarks::WEBSITE_SELECTOR)
        .next()
        .and_then(|el| el.value().attr("href"))
        .map(|href| href.to_string());

    details.rating = doc
        .select(&landmarks::RATING_SELECTOR)
        .next()
        .and_then(|el| el.value().attr("aria-label"))
        .and_then(|label| RATING_RE.captures(label))
        .map(|caps| caps[1].to_string());

    details.additional_info = additional_info(doc);

    details
}

/// Free-text context for the model prompt: description, hours, the first
/// few review snippets, categories and about sections. Bounded so a
/// review-heavy panel cannot balloon the prompt.
fn additional_info(doc: &Html) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(description) = first_text(doc, &landmarks::DESCRIPTION_SELECTOR) {
        parts.push(description);
    }
    if let Some(hours) = first_text(doc, &landmarks::HOURS_SELECTOR) {
        parts.push(hours);
    }

    let mut review_count = 0;
    for selector in landmarks::REVIEW_TEXT_SELECTORS.iter() {
        for element in doc.select(selector) {
            if review_count >= 3 {
                break;
            }
            let text = element_text(element);
            if !text.is_empty() {
                parts.push(text.chars().take(200).collect());
                review_count += 1;
            }
        }
    }

    for selector in landmarks::CATEGORY_SELECTORS.iter() {
        for element in doc.select(selector) {
            let text = element_text(element);
            if !text.is_empty() {
                parts.push(text);
            }
        }
    }
    for selector in landmarks::ABOUT_SELECTORS.iter() {
        for element in doc.select(selector) {
            let text = element_text(element);
            if !text.is_empty() {
                parts.push(text);
            }
        }
    }

    parts.join(" ").trim().to_string()
}

fn first_text(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

/// Collects an element's text fragments the way a rendered panel shows
/// them: trimmed and space-joined.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PANEL: &str = r#"
        <html><body>
          <div data-section-id="pane">
            <h1> Acme Bakery </h1>
            <button jsaction="pane.rating.category">Bakery</button>
            <button data-item-id="address">12 Main St, Springfield</button>
            <button data-item-id="phone:tel">+1 555 0100</button>
            <a data-item-id="authority" href="https://www.acmebakery.com">acmebakery.com</a>
            <span role="img" aria-label="4.6 stars 120 reviews"></span>
            <div data-item-id="description">Fresh bread daily.</div>
          </div>
        </body></html>"#;

    #[test]
    fn test_extracts_all_fields() {
        let doc = Html::parse_document(PANEL);
        let details = extract_details(&doc);
        assert_eq!(details.name, "Acme Bakery");
        assert_eq!(details.business_type.as_deref(), Some("Bakery"));
        assert_eq!(details.address.as_deref(), Some("12 Main St, Springfield"));
        assert_eq!(details.location.as_deref(), Some("12 Main St, Springfield"));
        assert_eq!(details.phone.as_deref(), Some("+1 555 0100"));
        assert_eq!(
            details.website.as_deref(),
            Some("https://www.acmebakery.com")
        );
        assert_eq!(details.rating.as_deref(), Some("4.6"));
        assert!(details.additional_info.contains("Fresh bread daily."));
    }

    #[test]
    fn test_missing_fields_stay_none() {
        let doc = Html::parse_document("<html><body><h1>Nameless Cafe</h1></body></html>");
        let details = extract_details(&doc);
        assert_eq!(details.name, "Nameless Cafe");
        assert!(details.address.is_none());
        assert!(details.phone.is_none());
        assert!(details.website.is_none());
        assert!(details.rating.is_none());
    }

    #[test]
    fn test_review_snippets_are_bounded() {
        let long_review = "x".repeat(500);
        let html = format!(
            r#"<html><body><h1>B</h1><div class="MyEned">{}</div><div class="MyEned">{}</div><div class="MyEned">{}</div><div class="MyEned">{}</div></body></html>"#,
            long_review, long_review, long_review, long_review
        );
        let doc = Html::parse_document(&html);
        let details = extract_details(&doc);
        // At most three snippets of at most 200 chars each.
        assert!(details.additional_info.len() <= 3 * 200 + 2);
    }
}
