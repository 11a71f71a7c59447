//! Walks a details-panel snapshot and collects validated email candidates.
//!
//! The harvest visits its surfaces in priority order and feeds every raw
//! text fragment through the scanner and the validator. Duplicates
//! collapse case-insensitively; the output preserves discovery order so
//! the ranker sees candidates the way the panel presented them.

use crate::details::element_text;
use crate::landmarks;
use crate::scanner;
use crate::scope::PanelScope;
use crate::validator::EmailValidator;
use scraper::{ElementRef, Html};
use serde::Serialize;
use std::collections::HashSet;

/// A link that looks like it leads to a contact page. Collected for the
/// caller; the harvest itself never dereferences them.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub(crate) struct ContactLink {
    pub url: String,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct HarvestOutcome {
    /// Validated candidates in discovery order.
    pub emails: Vec<String>,
    pub contact_links: Vec<ContactLink>,
    /// In-scope collapsed controls seen on the snapshot. A live surface
    /// may be able to expand these between harvest passes.
    pub expandable_controls: usize,
}

struct Collector<'a> {
    validator: &'a EmailValidator,
    seen: HashSet<String>,
    found: Vec<String>,
}

impl<'a> Collector<'a> {
    fn new(validator: &'a EmailValidator) -> Self {
        Self {
            validator,
            seen: HashSet::new(),
            found: Vec::new(),
        }
    }

    fn absorb(&mut self, text: &str) {
        for email in scanner::scan_text(text) {
            self.push(email);
        }
    }

    fn absorb_obfuscated(&mut self, text: &str) {
        for email in scanner::decode_obfuscated(text) {
            self.push(email);
        }
    }

    fn push(&mut self, email: String) {
        if self.validator.validate(&email) && self.seen.insert(email.clone()) {
            tracing::debug!(target: "harvest", "Accepted candidate: {}", email);
            self.found.push(email);
        }
    }
}

/// Harvests one snapshot. Bounded by document size; restartable.
pub(crate) fn harvest(doc: &Html, validator: &EmailValidator) -> HarvestOutcome {
    let scope = PanelScope::new(doc);
    let mut collector = Collector::new(validator);

    // Priority surfaces: contact, about, hours and editorial sections,
    // including their attributes and raw markup.
    for selector in landmarks::CONTACT_SECTION_SELECTORS.iter() {
        for element in doc.select(selector) {
            if !scope.in_scope(element) {
                continue;
            }
            if element.value().name() == "a" {
                if let Some(href) = element.value().attr("href") {
                    if let Some(address) = href.strip_prefix("mailto:") {
                        let address = address.split('?').next().unwrap_or("").trim();
                        if !address.is_empty() {
                            collector.push(address.to_lowercase());
                        }
                    }
                }
            }
            let text = element_text(element);
            collector.absorb(&text);
            collector.absorb_obfuscated(&text);
            for (_, value) in element.value().attrs() {
                if value.contains('@') {
                    collector.absorb(value);
                }
            }
            let markup = element.inner_html();
            if markup.contains('@') {
                collector.absorb(&markup);
            }
        }
    }

    // Every in-scope text node that mentions an @.
    for node in doc.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let content: &str = &text.text;
        if !content.contains('@') {
            continue;
        }
        let Some(parent) = node.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        if scope.in_scope(parent) {
            collector.absorb(content);
        }
    }

    // Clickable labels: visible text, else aria-label, else title.
    for selector in landmarks::CLICKABLE_SELECTORS.iter() {
        for element in doc.select(selector) {
            if !scope.in_scope(element) {
                continue;
            }
            let text = element_text(element);
            let label = if !text.is_empty() {
                text
            } else {
                element
                    .value()
                    .attr("aria-label")
                    .or_else(|| element.value().attr("title"))
                    .unwrap_or("")
                    .to_string()
            };
            collector.absorb(&label);
        }
    }

    // Structured data blocks, re-serialized so nested values surface.
    for script in doc.select(&landmarks::LD_JSON_SELECTOR) {
        let raw: String = script.text().collect();
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(&raw) {
            collector.absorb(&value.to_string());
        }
    }

    // Meta tags.
    for meta in doc.select(&landmarks::META_EMAIL_SELECTOR) {
        if let Some(content) = meta.value().attr("content") {
            collector.absorb(content);
        }
    }

    // Review bodies.
    for selector in landmarks::REVIEW_SELECTORS.iter() {
        for element in doc.select(selector) {
            if scope.in_scope(element) {
                collector.absorb(&element_text(element));
            }
        }
    }

    // Social and external links, text and href.
    for selector in landmarks::SOCIAL_LINK_SELECTORS.iter() {
        for element in doc.select(selector) {
            if !scope.in_scope(element) {
                continue;
            }
            let href = element.value().attr("href").unwrap_or("");
            let combined = format!("{} {}", element_text(element), href);
            collector.absorb(&combined);
        }
    }

    // Hidden or collapsed sections; their text is parsed even when the
    // rendered panel keeps it invisible.
    for selector in landmarks::HIDDEN_SELECTORS.iter() {
        for element in doc.select(selector) {
            if !scope.in_scope(element) {
                continue;
            }
            let text = element_text(element);
            if text.is_empty() {
                collector.absorb(&element.inner_html());
            } else {
                collector.absorb(&text);
            }
        }
    }

    // Image alt text and titles.
    for selector in landmarks::IMAGE_EMAIL_SELECTORS.iter() {
        for element in doc.select(selector) {
            if !scope.in_scope(element) {
                continue;
            }
            let alt = element.value().attr("alt").unwrap_or("");
            let title = element.value().attr("title").unwrap_or("");
            collector.absorb(&format!("{} {}", alt, title));
        }
    }

    let contact_links = collect_contact_links(doc, &scope);

    let expandable_controls = landmarks::EXPANDABLE_CONTROL_SELECTORS
        .iter()
        .flat_map(|selector| doc.select(selector))
        .filter(|element| scope.in_scope(*element))
        .count();

    HarvestOutcome {
        emails: collector.found,
        contact_links,
        expandable_controls,
    }
}

/// Links whose href, label or text carries a contact keyword.
fn collect_contact_links(doc: &Html, scope: &PanelScope) -> Vec<ContactLink> {
    let mut links = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for link in doc.select(&landmarks::ANCHOR_SELECTOR) {
        if !scope.in_scope(link) {
            continue;
        }
        let href = link.value().attr("href").unwrap_or("");
        let href_lower = href.to_lowercase();
        let text = element_text(link);
        let text_lower = text.to_lowercase();
        let aria_lower = link
            .value()
            .attr("aria-label")
            .unwrap_or("")
            .to_lowercase();

        let matched = landmarks::CONTACT_LINK_KEYWORDS.iter().any(|keyword| {
            href_lower.contains(keyword)
                || text_lower.contains(keyword)
                || aria_lower.contains(keyword)
        });
        if matched && !href.is_empty() && seen.insert(href.to_string()) {
            links.push(ContactLink {
                url: href.to_string(),
                text,
            });
        }
    }

    links
}

/// Scans account and profile chrome for the operator's own address so it
/// can be excluded from every validation for the session. Prefers
/// gmail.com matches when falling back to raw script content.
pub(crate) fn detect_operator_email(doc: &Html) -> Option<String> {
    for selector in landmarks::PROFILE_ATTR_SELECTORS.iter() {
        for element in doc.select(selector) {
            let mut haystack = String::new();
            for attr in [
                "alt",
                "title",
                "data-email",
                "data-account-email",
                "data-user-email",
                "aria-label",
            ] {
                if let Some(value) = element.value().attr(attr) {
                    haystack.push_str(value);
                    haystack.push(' ');
                }
            }
            haystack.push_str(&element_text(element));
            if let Some(email) = scanner::scan_text(&haystack).into_iter().next() {
                tracing::debug!(target: "harvest", "Detected operator email via profile chrome");
                return Some(email);
            }
        }
    }

    for selector in landmarks::PROFILE_MENU_SELECTORS.iter() {
        for element in doc.select(selector) {
            if let Some(email) = scanner::scan_text(&element_text(element)).into_iter().next() {
                tracing::debug!(target: "harvest", "Detected operator email via account menu");
                return Some(email);
            }
        }
    }

    for script in doc.select(&landmarks::SCRIPT_SELECTOR) {
        let content: String = script.text().collect();
        if !content.contains('@') {
            continue;
        }
        if let Some(email) = scanner::scan_text(&content)
            .into_iter()
            .find(|e| e.ends_with("@gmail.com"))
        {
            tracing::debug!(target: "harvest", "Detected operator email via page scripts");
            return Some(email);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn harvest_html(html: &str) -> HarvestOutcome {
        let doc = Html::parse_document(html);
        harvest(&doc, &EmailValidator::new(None))
    }

    #[test]
    fn test_obfuscated_contact_section() {
        let outcome = harvest_html(
            r#"<html><body><div class="section-contact-info">Email us at info [at] acme [dot] com</div></body></html>"#,
        );
        assert_eq!(outcome.emails, vec!["info@acme.com".to_string()]);
    }

    #[test]
    fn test_mailto_link() {
        let outcome = harvest_html(
            r#"<html><body><div class="section-contact-info"><a href="mailto:Book@Inn.net?subject=hi">Email</a></div></body></html>"#,
        );
        assert!(outcome.emails.contains(&"book@inn.net".to_string()));
    }

    #[test]
    fn test_attribute_and_hidden_candidates() {
        let outcome = harvest_html(
            r#"<html><body>
                <div class="section-info" data-tooltip="reach hello@shop.io"></div>
                <div class="hidden">support@shop.io</div>
            </body></html>"#,
        );
        assert!(outcome.emails.contains(&"hello@shop.io".to_string()));
        assert!(outcome.emails.contains(&"support@shop.io".to_string()));
    }

    #[test]
    fn test_structured_data_and_meta() {
        let outcome = harvest_html(
            r#"<html><head>
                <script type="application/ld+json">{"@type":"LocalBusiness","email":"desk@firm.org"}</script>
                <meta name="contact" content="meta-contact@firm.org">
            </head><body></body></html>"#,
        );
        assert!(outcome.emails.contains(&"desk@firm.org".to_string()));
        assert!(outcome.emails.contains(&"meta-contact@firm.org".to_string()));
    }

    #[test]
    fn test_chrome_candidates_excluded() {
        let outcome = harvest_html(
            r#"<html><body>
                <header>header-owner@corp.com</header>
                <div class="section-contact-info">real@corp.com</div>
            </body></html>"#,
        );
        assert_eq!(outcome.emails, vec!["real@corp.com".to_string()]);
    }

    #[test]
    fn test_self_email_never_accepted() {
        let doc = Html::parse_document(
            r#"<html><body><div class="section-contact-info">owner@gmail.com and info@acme.com</div></body></html>"#,
        );
        let validator = EmailValidator::new(Some("owner@gmail.com".to_string()));
        let outcome = harvest(&doc, &validator);
        assert_eq!(outcome.emails, vec!["info@acme.com".to_string()]);
    }

    #[test]
    fn test_contact_links_collected_not_dereferenced() {
        let outcome = harvest_html(
            r#"<html><body><div class="section-info">
                <a href="https://acme.com/kontakt">Kontakt</a>
                <a href="https://acme.com/menu">Menu</a>
            </div></body></html>"#,
        );
        assert_eq!(outcome.contact_links.len(), 1);
        assert_eq!(outcome.contact_links[0].url, "https://acme.com/kontakt");
    }

    #[test]
    fn test_operator_email_detection() {
        let doc = Html::parse_document(
            r#"<html><body>
                <div class="gb_A"><img alt="Account: owner@gmail.com"></div>
                <div class="section-contact-info">info@acme.com</div>
            </body></html>"#,
        );
        assert_eq!(
            detect_operator_email(&doc),
            Some("owner@gmail.com".to_string())
        );
    }

    #[test]
    fn test_operator_email_absent() {
        let doc = Html::parse_document("<html><body><p>nothing here</p></body></html>");
        assert_eq!(detect_operator_email(&doc), None);
    }
}
