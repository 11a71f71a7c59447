//! Decides whether a DOM location belongs to the business-details region
//! of a snapshot, as opposed to page chrome.

use crate::landmarks;
use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

/// Containment filter built once per snapshot.
///
/// Landmark matches are collected up front as node-id sets so each scope
/// query is a single walk up the ancestor chain.
pub(crate) struct PanelScope {
    panel_ids: HashSet<NodeId>,
    chrome_ids: HashSet<NodeId>,
}

impl PanelScope {
    pub(crate) fn new(doc: &Html) -> Self {
        Self {
            panel_ids: collect_ids(doc, &landmarks::PANEL_LANDMARKS),
            chrome_ids: collect_ids(doc, &landmarks::CHROME_LANDMARKS),
        }
    }

    /// True when the element sits inside the business-details panel.
    ///
    /// Chrome containment disqualifies the node even when a panel landmark
    /// also contains it. A node matched by no landmark at all counts as in
    /// scope: the host page renames containers often, and losing recall to
    /// drift is worse than scanning a little extra text.
    pub(crate) fn in_scope(&self, element: ElementRef<'_>) -> bool {
        for id in self_and_ancestor_ids(element) {
            if self.chrome_ids.contains(&id) {
                return false;
            }
        }
        for id in self_and_ancestor_ids(element) {
            if self.panel_ids.contains(&id) {
                return true;
            }
        }
        true
    }
}

fn collect_ids(doc: &Html, selectors: &[Selector]) -> HashSet<NodeId> {
    selectors
        .iter()
        .flat_map(|selector| doc.select(selector))
        .map(|element| element.id())
        .collect()
}

fn self_and_ancestor_ids(element: ElementRef<'_>) -> impl Iterator<Item = NodeId> + '_ {
    std::iter::once(element.id()).chain(element.ancestors().map(|node| node.id()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_match<'a>(doc: &'a Html, css: &str) -> ElementRef<'a> {
        let selector = Selector::parse(css).unwrap();
        doc.select(&selector).next().unwrap()
    }

    #[test]
    fn test_panel_content_in_scope() {
        let doc = Html::parse_document(
            r#"<body><div class="section-contact-info"><span id="x">info@acme.com</span></div></body>"#,
        );
        let scope = PanelScope::new(&doc);
        assert!(scope.in_scope(first_match(&doc, "#x")));
    }

    #[test]
    fn test_chrome_content_out_of_scope() {
        let doc = Html::parse_document(
            r#"<body><header><span id="x">owner@gmail.com</span></header></body>"#,
        );
        let scope = PanelScope::new(&doc);
        assert!(!scope.in_scope(first_match(&doc, "#x")));
    }

    #[test]
    fn test_exclusion_wins_over_panel() {
        let doc = Html::parse_document(
            r#"<body><div class="section-layout"><nav><span id="x">a@b.com</span></nav></div></body>"#,
        );
        let scope = PanelScope::new(&doc);
        assert!(!scope.in_scope(first_match(&doc, "#x")));
    }

    #[test]
    fn test_unrecognized_markup_defaults_in_scope() {
        let doc = Html::parse_document(
            r#"<body><div class="totally-new-container"><span id="x">hi</span></div></body>"#,
        );
        let scope = PanelScope::new(&doc);
        assert!(scope.in_scope(first_match(&doc, "#x")));
    }
}
