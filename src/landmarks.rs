//! Landmark tables for the host page: a soft schema, kept as data.
//!
//! The host markup is not contractually stable, so every concern gets an
//! ordered selector table here. Absorbing markup drift means editing a
//! table, never the pipeline code. Selectors that fail to parse are
//! skipped so a single stale entry cannot take a whole table down.

use once_cell::sync::Lazy;
use scraper::Selector;

pub(crate) const LANDMARK_TABLE_VERSION: u32 = 1;

fn compile(table: &[&str]) -> Vec<Selector> {
    table
        .iter()
        .filter_map(|raw| match Selector::parse(raw) {
            Ok(selector) => Some(selector),
            Err(_) => {
                tracing::warn!(target: "landmarks", "Skipping unparsable selector: {}", raw);
                None
            }
        })
        .collect()
}

/// Containers that make up the business-details panel.
pub(crate) static PANEL_LANDMARKS: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile(&[
        "[data-section-id=\"pane\"]",
        "[data-section-id=\"overlay\"]",
        ".section-layout-root",
        ".section-layout",
        ".section-hero-header",
        ".section-info",
        ".section-editorial",
        ".section-reviews",
        ".section-contact-info",
        ".section-hours",
        ".section-about",
        ".section-description",
        ".section-directions",
        ".section-overview",
        ".section-business-details",
        ".rogA2c",
        ".PbZDve",
        ".PYvSYb",
        ".LBgpqf",
        ".AeaXub",
        ".Io6YTe",
        ".t39EBf",
        ".OqCZI",
    ])
});

/// Page chrome: header, navigation, search box, and the operator's profile
/// area. Containment here disqualifies a node even when a panel landmark
/// also contains it.
pub(crate) static CHROME_LANDMARKS: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile(&[
        ".gb_A",
        ".gb_u",
        ".gb_z",
        ".gb_lb",
        ".gb_H",
        ".gb_mb",
        ".gb_nb",
        "[data-section-id=\"searchbox\"]",
        "[data-section-id=\"directions\"]",
        "[data-section-id=\"navbar\"]",
        "[data-section-id=\"header\"]",
        "nav",
        "header",
        ".navbar",
        ".header",
        ".navigation",
    ])
});

/// Priority surfaces for contact data: direct contact sections, about and
/// editorial areas, hours, attribute-carrying nodes, and the generic info
/// containers the host page rotates through.
pub(crate) static CONTACT_SECTION_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile(&[
        "[data-item-id=\"email\"]",
        "[data-item-id*=\"contact\"]",
        "[data-item-id*=\"phone:email\"]",
        "[data-item-id*=\"email:primary\"]",
        "a[href^=\"mailto:\"]",
        ".section-contact-info",
        ".contact-info",
        ".business-contact",
        ".section-contact",
        ".contact-details",
        ".business-info",
        "[data-item-id=\"description\"]",
        "[data-item-id=\"about\"]",
        "[data-item-id=\"editorial\"]",
        "[data-section-id=\"editorial\"]",
        ".PbZDve",
        ".PYvSYb",
        ".LBgpqf",
        ".AeaXub",
        ".section-editorial-quote",
        ".section-editorial-text",
        ".section-editorial-content",
        ".section-description",
        ".section-about",
        ".rogA2c",
        ".section-business-details",
        ".section-info-definition",
        ".section-info-hover-text",
        ".section-editorial-attribution",
        ".section-editorial-review",
        "[data-item-id=\"oh\"]",
        "[data-item-id=\"hours\"]",
        ".section-info-line",
        ".section-info-text",
        ".section-hours",
        ".section-open-hours",
        ".t39EBf",
        ".OqCZI",
        ".Io6YTe",
        ".section-contact-line",
        ".section-contact-text",
        ".section-directions-text",
        ".section-directions-description",
        ".section-review-text",
        ".section-review-content",
        ".section-overview-text",
        ".section-overview-content",
        ".section-hero-header-description",
        ".section-hero-header-text",
        "[data-value*=\"@\"]",
        "[data-email]",
        "[data-contact-email]",
        "[data-business-email]",
        "[title*=\"@\"]",
        "[aria-label*=\"@\"]",
        "[data-tooltip*=\"@\"]",
        ".email-link",
        ".contact-email",
        ".business-email",
        ".email-address",
        ".contact-address",
        ".email-info",
        ".contact-info-item",
        ".business-contact-item",
        ".info-item",
        ".contact-method",
        ".business-method",
        ".business-contact-method",
        ".section-layout",
        ".section-layout-root",
        ".section-hero-header",
        ".section-info",
        ".section-editorial",
        ".section-reviews",
        "[data-test-id*=\"contact\"]",
        "[data-test-id*=\"email\"]",
        ".contact-card",
        ".info-card",
        ".business-card",
        "span[aria-label*=\"email\"]",
        "span[aria-label*=\"Email\"]",
        "span[aria-label*=\"contact\"]",
        "div[aria-label*=\"email\"]",
        "div[aria-label*=\"Email\"]",
        "div[aria-label*=\"contact\"]",
        "[data-email-address]",
        "[data-contact-method]",
        ".widget-pane-link",
        ".widget-pane-info",
        ".place-result-info",
        ".place-contact-info",
        ".ugiz4pqJLAG__primary-text",
        ".ugiz4pqJLAG__secondary-text",
        ".RcCsl",
        ".MyEned",
        ".section-result-text-content",
        ".section-result-details",
        ".section-result-action",
        "[data-tooltip*=\"Email\"]",
        "[data-tooltip*=\"email\"]",
        "[data-tooltip*=\"Contact\"]",
        "[data-tooltip*=\"contact\"]",
    ])
});

/// Review bodies, which occasionally quote a business address.
pub(crate) static REVIEW_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile(&[
        ".MyEned",
        ".wiI7pd",
        ".GHT2ce",
        ".jJc9Ad",
        ".rsqaWe",
        ".K7oBsc",
        ".GWSFIe",
        ".section-review-text",
        ".section-review-content",
        ".review-text",
        ".review-content",
        ".review-body",
        ".user-review",
        ".business-review",
    ])
});

/// Collapsed or hidden content that may hold an address once expanded.
pub(crate) static HIDDEN_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile(&[
        "[style*=\"display: none\"]",
        "[style*=\"visibility: hidden\"]",
        ".collapsed",
        ".hidden",
        ".expandable",
        ".show-more",
        ".additional-info",
        ".more-info",
        ".extra-info",
        ".expanded-content",
        ".toggle-content",
    ])
});

/// Controls a live surface can activate to expand collapsed sections.
pub(crate) static EXPANDABLE_CONTROL_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile(&[
        "[data-value=\"Show more\"]",
        "[data-value=\"See more\"]",
        ".show-more",
        ".expand",
        ".more-info",
        "[aria-expanded=\"false\"]",
    ])
});

/// Anything clickable whose label might carry an address.
pub(crate) static CLICKABLE_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile(&[
        "a",
        "button",
        "[role=\"button\"]",
        "[onclick]",
        "[data-click]",
    ])
});

/// Social profiles and external links shown on the panel.
pub(crate) static SOCIAL_LINK_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile(&[
        "a[href*=\"facebook\"]",
        "a[href*=\"twitter\"]",
        "a[href*=\"instagram\"]",
        "a[href*=\"linkedin\"]",
        "a[href*=\"yelp\"]",
        "a[href*=\"foursquare\"]",
        "a[href*=\"http\"]",
    ])
});

/// Attribute-bearing nodes in the account chrome that leak the operator's
/// own address.
pub(crate) static PROFILE_ATTR_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile(&[
        "[data-ogsr-up] img[alt*=\"@\"]",
        "[data-ogsr-up] img[data-value*=\"@\"]",
        ".gb_A img[alt*=\"@\"]",
        ".gb_A img[data-value*=\"@\"]",
        ".gb_A img[data-email]",
        ".gb_A [data-email]",
        ".gb_A [title*=\"@\"]",
        ".gb_A [aria-label*=\"@\"]",
        "img[alt*=\"@gmail.com\"]",
        "img[title*=\"@gmail.com\"]",
        "[data-account-email]",
        "[data-user-email]",
    ])
});

/// Account menus and profile dropdowns, scanned as text.
pub(crate) static PROFILE_MENU_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile(&[".gb_A", ".gb_u", ".gb_z", ".gb_lb", ".gb_H", ".gb_mb", ".gb_nb"])
});

pub(crate) static LD_JSON_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("script[type=\"application/ld+json\"]").expect("ld+json selector")
});

pub(crate) static SCRIPT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script").expect("script selector"));

pub(crate) static META_EMAIL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("meta[content*=\"@\"]").expect("meta selector"));

pub(crate) static IMAGE_EMAIL_SELECTORS: Lazy<Vec<Selector>> =
    Lazy::new(|| compile(&["img[alt*=\"@\"]", "img[title*=\"@\"]"]));

pub(crate) static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("anchor selector"));

/// Keywords (several languages) marking a link as a contact page.
pub(crate) static CONTACT_LINK_KEYWORDS: &[&str] = &[
    "contact",
    "contacto",
    "kontakt",
    "contato",
    "contatto",
    "email",
    "e-mail",
    "mail",
    "about",
    "about-us",
    "aboutus",
    "sobre",
    "connect",
    "reach",
    "get-in-touch",
    "support",
    "help",
    "customer-service",
    "inquiry",
    "enquiry",
    "inquire",
    "message",
    "write",
    "feedback",
];

// Detail-field selectors for the listing's structured attributes.

pub(crate) static NAME_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1").expect("name selector"));

pub(crate) static CATEGORY_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    compile(&["button[jsaction*=\"pane.rating.category\"]", ".DkEaL"])
});

pub(crate) static ADDRESS_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("button[data-item-id=\"address\"]").expect("address selector"));

pub(crate) static PHONE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("button[data-item-id^=\"phone\"]").expect("phone selector"));

pub(crate) static WEBSITE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[data-item-id=\"authority\"]").expect("website selector"));

pub(crate) static RATING_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("span[role=\"img\"][aria-label*=\"star\"]").expect("rating selector")
});

pub(crate) static DESCRIPTION_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("[data-item-id=\"description\"]").expect("description selector")
});

pub(crate) static HOURS_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("[data-item-id=\"oh\"]").expect("hours selector"));

pub(crate) static REVIEW_TEXT_SELECTORS: Lazy<Vec<Selector>> =
    Lazy::new(|| compile(&[".MyEned", ".wiI7pd"]));

pub(crate) static ABOUT_SELECTORS: Lazy<Vec<Selector>> =
    Lazy::new(|| compile(&[".PbZDve", ".PYvSYb", ".LBgpqf"]));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_compile() {
        assert!(!PANEL_LANDMARKS.is_empty());
        assert!(!CHROME_LANDMARKS.is_empty());
        assert!(CONTACT_SECTION_SELECTORS.len() > 50);
        assert!(!REVIEW_SELECTORS.is_empty());
        assert!(!HIDDEN_SELECTORS.is_empty());
        assert!(!CLICKABLE_SELECTORS.is_empty());
        assert_eq!(LANDMARK_TABLE_VERSION, 1);
    }
}
