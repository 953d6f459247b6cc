use scraper::{Html, Selector};
use thiserror::Error;
use url::Url;

use crate::frontier::normalize_url;

/// Text and outgoing links of one HTML page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPage {
    pub text: String,
    /// Absolute http(s) URLs without fragments, in document order.
    pub links: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("body looks binary, not HTML")]
    Binary,
}

pub trait PageParser: Send + Sync + 'static {
    fn parse(&self, html: &str, base: &Url) -> Result<ParsedPage, ParseError>;
}

// Text under these elements is not page content.
const SKIPPED: &[&str] = &["script", "style", "noscript", "template"];

pub struct HtmlParser {
    anchors: Selector,
}

impl HtmlParser {
    pub fn new() -> Self {
        Self { anchors: Selector::parse("a[href]").expect("valid selector") }
    }
}

impl Default for HtmlParser {
    fn default() -> Self { Self::new() }
}

impl PageParser for HtmlParser {
    fn parse(&self, html: &str, base: &Url) -> Result<ParsedPage, ParseError> {
        if html.contains('\0') {
            return Err(ParseError::Binary);
        }
        let doc = Html::parse_document(html);

        let mut parts: Vec<&str> = Vec::new();
        for node in doc.root_element().descendants() {
            let Some(text) = node.value().as_text() else { continue };
            let hidden = node
                .ancestors()
                .filter_map(|a| a.value().as_element())
                .any(|el| SKIPPED.iter().any(|name| *name == el.name()));
            if hidden {
                continue;
            }
            let t = text.trim();
            if !t.is_empty() {
                parts.push(t);
            }
        }

        let mut links = Vec::new();
        for a in doc.select(&self.anchors) {
            let Some(href) = a.value().attr("href") else { continue };
            let Ok(joined) = base.join(href.trim()) else { continue };
            if let Some(u) = normalize_url(joined.as_str()) {
                links.push(u.to_string());
            }
        }

        Ok(ParsedPage { text: parts.join(" "), links })
    }
}
