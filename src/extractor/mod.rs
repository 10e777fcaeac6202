//! Main-content extraction for arbitrary article pages.
//!
//! Extraction runs an ordered list of [`Strategy`] values against one parsed
//! document and keeps the first that produces enough text:
//!
//! 1. semantic and CMS container selectors, most specific meaning first;
//! 2. a paragraph-density scan that picks the element whose direct `<p>` children
//!    carry the most text, minus navigation and other page chrome.
//!
//! The parsed document is never modified. Boilerplate removal in the density scan
//! works on a filtered text copy of the chosen container.

use std::collections::HashSet;

use scraper::{node::Node, ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::{fetcher::RawHtml, util::html::decode_html};

/// Extracted text must be strictly longer than this many characters.
pub const MIN_CONTENT_CHARS: usize = 250;

/// Phase-one selectors in priority order.
pub const CONTENT_SELECTORS: [&str; 9] = [
    "article",
    "main",
    r#"div[role="article"]"#,
    "div.article-body",
    "div.story-content",
    "div#main-content",
    "div#content",
    "div.post-content",
    "div.entry-content",
];

/// Elements whose text is never visible.
const HIDDEN_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

/// Page chrome removed from the density winner before measuring it. Includes every
/// hidden tag so the winner is measured on visible text only.
const BOILERPLATE_TAGS: [&str; 8] = [
    "nav", "footer", "aside", "header", "script", "style", "noscript", "template",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Selector(&'static str),
    ParagraphDensity,
}

impl Strategy {
    /// All strategies in the order they are tried.
    pub fn ordered() -> impl Iterator<Item = Strategy> {
        CONTENT_SELECTORS
            .into_iter()
            .map(Strategy::Selector)
            .chain(std::iter::once(Strategy::ParagraphDensity))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Selector(selector) => *selector,
            Strategy::ParagraphDensity => "paragraph-density",
        }
    }

    /// Run this strategy alone. `Some` only when the text passes the length floor.
    pub fn apply(&self, document: &Html) -> Option<String> {
        let text = match self {
            Strategy::Selector(selector) => select_first(document, selector)
                .map(|element| collect_text(element, &HIDDEN_TAGS))?,
            Strategy::ParagraphDensity => {
                let container = densest_paragraph_parent(document)?;
                collect_text(container, &BOILERPLATE_TAGS)
            }
        };

        long_enough(&text).then_some(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub text: String,
    pub strategy: Strategy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    Text(Extracted),
    NotFound,
}

/// Decode and extract a fetched page.
pub fn extract(raw: &RawHtml) -> ExtractionOutcome {
    let html = decode_html(&raw.body, raw.content_type.as_deref());
    extract_from_str(&html)
}

pub fn extract_from_str(html: &str) -> ExtractionOutcome {
    let document = Html::parse_document(html);

    for strategy in Strategy::ordered() {
        if let Some(text) = strategy.apply(&document) {
            debug!(
                strategy = strategy.label(),
                chars = text.chars().count(),
                "main content located"
            );
            return ExtractionOutcome::Text(Extracted { text, strategy });
        }
    }

    debug!("no strategy produced enough content");
    ExtractionOutcome::NotFound
}

fn long_enough(text: &str) -> bool {
    text.chars().count() > MIN_CONTENT_CHARS
}

fn select_first<'a>(document: &'a Html, selector: &str) -> Option<ElementRef<'a>> {
    let parsed = match Selector::parse(selector) {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!(selector, error = %err, "invalid content selector");
            return None;
        }
    };
    document.select(&parsed).next()
}

/// Parent of some `<p>` with the longest visible text. Each parent is scored once;
/// on equal scores the one met first in document order is kept.
fn densest_paragraph_parent(document: &Html) -> Option<ElementRef<'_>> {
    let paragraphs = Selector::parse("p").ok()?;

    let mut seen = HashSet::new();
    let mut best: Option<(ElementRef<'_>, usize)> = None;
    let mut paragraph_count = 0usize;

    for paragraph in document.select(&paragraphs) {
        paragraph_count += 1;
        let Some(parent) = paragraph.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        if !seen.insert(parent.id()) {
            continue;
        }

        let score = collect_text(parent, &HIDDEN_TAGS).chars().count();
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((parent, score));
        }
    }

    if paragraph_count == 0 {
        debug!("document has no paragraphs, skipping density scan");
        return None;
    }

    debug!(
        paragraphs = paragraph_count,
        parents = seen.len(),
        best_score = best.map(|(_, score)| score).unwrap_or_default(),
        "density scan finished"
    );
    best.map(|(parent, _)| parent)
}

/// Whitespace-normalized text under `root`, skipping subtrees rooted at any tag in
/// `skip`.
fn collect_text(root: ElementRef<'_>, skip: &[&str]) -> String {
    let mut words: Vec<&str> = Vec::new();
    let mut stack: Vec<_> = root.children().rev().collect();

    while let Some(node) = stack.pop() {
        match node.value() {
            Node::Text(text) => words.extend(text.split_whitespace()),
            Node::Element(element) => {
                if !skip.contains(&element.name()) {
                    stack.extend(node.children().rev());
                }
            }
            _ => {}
        }
    }

    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prose(topic: &str, sentences: usize) -> String {
        (0..sentences)
            .map(|i| format!("Sentence {i} about {topic} keeps the reader informed today."))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn page(body: &str) -> String {
        format!("<html><head><title>t</title></head><body>{body}</body></html>")
    }

    fn expect_text(outcome: ExtractionOutcome) -> Extracted {
        match outcome {
            ExtractionOutcome::Text(extracted) => extracted,
            ExtractionOutcome::NotFound => panic!("expected extracted text"),
        }
    }

    #[test]
    fn length_floor_is_strict() {
        let at_floor = "a".repeat(MIN_CONTENT_CHARS);
        let html = page(&format!("<article>{at_floor}</article>"));
        assert_eq!(extract_from_str(&html), ExtractionOutcome::NotFound);

        let over = "a".repeat(MIN_CONTENT_CHARS + 1);
        let html = page(&format!("<article>{over}</article>"));
        let extracted = expect_text(extract_from_str(&html));
        assert_eq!(extracted.text, over);
        assert_eq!(extracted.strategy, Strategy::Selector("article"));
    }

    #[test]
    fn selector_text_is_whitespace_normalized() {
        let body = prose("rivers", 6);
        let spaced = body.replace(' ', " \n\t  ");
        let html = page(&format!(
            "<article>\n  <h1>Headline</h1>\n<div>{spaced}</div>\n</article>"
        ));
        let extracted = expect_text(extract_from_str(&html));
        assert_eq!(extracted.text, format!("Headline {body}"));
    }

    #[test]
    fn article_selector_beats_lower_priority_selectors() {
        let article = prose("elections", 6);
        let body = prose("weather", 12);
        let html = page(&format!(
            r#"<div class="article-body"><p>{body}</p></div><article><p>{article}</p></article>"#
        ));
        let extracted = expect_text(extract_from_str(&html));
        assert_eq!(extracted.text, article);
        assert_eq!(extracted.strategy, Strategy::Selector("article"));
    }

    #[test]
    fn main_region_beats_class_conventions() {
        let main = prose("markets", 6);
        let entry = prose("sports", 9);
        let html = page(&format!(
            r#"<div class="entry-content">{entry}</div><main>{main}</main>"#
        ));
        let extracted = expect_text(extract_from_str(&html));
        assert_eq!(extracted.text, main);
        assert_eq!(extracted.strategy, Strategy::Selector("main"));
    }

    #[test]
    fn class_selector_used_when_semantic_regions_missing() {
        let story = prose("science", 6);
        let html = page(&format!(r#"<div class="story-content">{story}</div>"#));
        let extracted = expect_text(extract_from_str(&html));
        assert_eq!(extracted.strategy, Strategy::Selector("div.story-content"));
    }

    #[test]
    fn hidden_text_is_not_counted() {
        let script = "x".repeat(400);
        let html = page(&format!(
            "<article><script>var s = '{script}';</script><p>Short teaser.</p></article>"
        ));
        assert_eq!(extract_from_str(&html), ExtractionOutcome::NotFound);
    }

    #[test]
    fn short_semantic_region_falls_through_to_density() {
        let story = prose("harbours", 4);
        let more = prose("shipping", 3);
        let html = page(&format!(
            "<article>Just a teaser.</article><div class=\"wrap\"><p>{story}</p><p>{more}</p></div>"
        ));
        let extracted = expect_text(extract_from_str(&html));
        assert_eq!(extracted.strategy, Strategy::ParagraphDensity);
        assert_eq!(extracted.text, format!("{story} {more}"));
    }

    #[test]
    fn no_paragraphs_short_circuits() {
        let long = prose("nothing", 10);
        let html = page(&format!("<div><span>{long}</span></div>"));
        let document = Html::parse_document(&html);
        assert!(densest_paragraph_parent(&document).is_none());
        assert_eq!(Strategy::ParagraphDensity.apply(&document), None);
        assert_eq!(extract_from_str(&html), ExtractionOutcome::NotFound);
    }

    #[test]
    fn density_prefers_richest_container() {
        let teaser = prose("ads", 1);
        let story = prose("budget", 8);
        let html = page(&format!(
            r#"<div class="side"><p>{teaser}</p></div><section><p>{story}</p><p>{story}</p></section>"#
        ));
        let extracted = expect_text(extract_from_str(&html));
        assert_eq!(extracted.text, format!("{story} {story}"));
    }

    #[test]
    fn density_tie_keeps_first_container() {
        let first = "a".repeat(300);
        let second = "b".repeat(300);
        let html = page(&format!(
            "<section><p>{first}</p></section><section><p>{second}</p></section>"
        ));
        let extracted = expect_text(extract_from_str(&html));
        assert_eq!(extracted.text, first);
    }

    #[test]
    fn parents_are_scored_once() {
        let html = page("<div><p>one</p><p>two</p><p>three</p></div><section><p>four</p></section>");
        let document = Html::parse_document(&html);
        let parent = densest_paragraph_parent(&document).unwrap();
        assert_eq!(parent.value().name(), "div");
    }

    #[test]
    fn boilerplate_is_excluded_from_density_text() {
        let story = prose("transit", 6);
        let html = page(&format!(
            "<div><nav>Home World Sports Opinion</nav><header>Site banner</header>\
             <p>{story}</p><aside>Related links</aside><footer>Copyright notice</footer></div>"
        ));
        let extracted = expect_text(extract_from_str(&html));
        assert_eq!(extracted.text, story);
        assert!(!extracted.text.contains("Home World Sports"));
        assert!(!extracted.text.contains("Copyright"));
    }

    #[test]
    fn boilerplate_only_container_is_not_found() {
        let menu = "Menu ".repeat(80);
        let html = page(&format!("<div><nav>{menu}</nav><p>Subscribe to continue.</p></div>"));
        assert_eq!(extract_from_str(&html), ExtractionOutcome::NotFound);
    }

    #[test]
    fn noscript_notice_does_not_count_as_density_text() {
        let notice = "Please enable JavaScript to view this page properly. ".repeat(8);
        let html = page(&format!(
            "<div><p>Subscribe.</p><noscript>{notice}</noscript></div>"
        ));
        assert_eq!(extract_from_str(&html), ExtractionOutcome::NotFound);
    }

    #[test]
    fn density_text_skips_noscript_but_keeps_story() {
        let story = prose("harbours", 6);
        let html = page(&format!(
            "<div><p>{story}</p><noscript>Please enable JavaScript.</noscript></div>"
        ));
        let extracted = expect_text(extract_from_str(&html));
        assert_eq!(extracted.strategy, Strategy::ParagraphDensity);
        assert_eq!(extracted.text, story);
    }

    #[test]
    fn extraction_leaves_document_untouched() {
        let story = prose("courts", 6);
        let html = page(&format!("<div><nav>Top links</nav><p>{story}</p></div>"));
        let document = Html::parse_document(&html);
        assert!(Strategy::ParagraphDensity.apply(&document).is_some());
        let nav = Selector::parse("nav").unwrap();
        assert_eq!(document.select(&nav).count(), 1);
    }

    #[test]
    fn raw_bytes_are_decoded_before_extraction() {
        let mut body = b"<html><body><article>".to_vec();
        body.extend(std::iter::repeat(b"Caf\xe9 society news. ".as_slice()).take(20).flatten());
        body.extend_from_slice(b"</article></body></html>");
        let raw = RawHtml {
            body,
            content_type: Some("text/html; charset=ISO-8859-1".to_string()),
        };
        let extracted = expect_text(extract(&raw));
        assert!(extracted.text.starts_with("Café society news."));
    }

    #[test]
    fn strategies_are_tried_in_declared_order() {
        let labels: Vec<_> = Strategy::ordered().map(|s| s.label()).collect();
        assert_eq!(labels.first(), Some(&"article"));
        assert_eq!(labels[1], "main");
        assert_eq!(labels.last(), Some(&"paragraph-density"));
        assert_eq!(labels.len(), CONTENT_SELECTORS.len() + 1);
    }
}
