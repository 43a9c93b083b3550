//! Parsed document tree and the bounded walks the field heuristics run on.
//!
//! Every traversal here has a hard cap on the number of nodes it visits, so
//! the cost of an extraction is predictable even on adversarial markup.

use disclosure_common::{LookupError, Result};
use regex::Regex;
use scraper::{ElementRef, Html, Node};

use crate::decode::decode_document;

/// Nodes (elements and text) visited by a forward walk from an anchor.
pub const MAX_FORWARD_NODES: usize = 128;
/// Levels climbed when looking for an enclosing element.
pub const MAX_ANCESTOR_DEPTH: usize = 12;

/// Elements whose text content is never a label.
const NON_CONTENT_TAGS: &[&str] = &["script", "style", "noscript", "template"];
/// Elements html5ever synthesizes for any input, markup or not.
const SCAFFOLD_TAGS: &[&str] = &["html", "head", "body"];

/// An HTML document parsed once for one extraction.
pub struct ParsedTree {
    html: Html,
}

impl ParsedTree {
    pub fn html(&self) -> &Html {
        &self.html
    }

    /// Recoverable problems html5ever repaired while building the tree.
    pub fn recovered_errors(&self) -> usize {
        self.html.errors.len()
    }

    /// First text node (document order) matching `label`, returned as its
    /// parent element.
    pub fn find_anchor(&self, label: &LabelPattern) -> Option<ElementRef<'_>> {
        self.html
            .tree
            .root()
            .descendants()
            .filter_map(|node| match node.value() {
                Node::Text(text) if label.matches(text) => node.parent(),
                _ => None,
            })
            .filter_map(ElementRef::wrap)
            .find(|parent| !NON_CONTENT_TAGS.contains(&parent.value().name()))
    }
}

/// Parse raw document bytes into a tree.
///
/// This is the only hard failure of an extraction: bytes that cannot be
/// decoded, blank input, and input that yields neither an element nor any
/// text (a lone comment, a bare doctype) are rejected. Anything else becomes
/// a tree, however broken the markup.
pub fn parse_document(bytes: &[u8]) -> Result<ParsedTree> {
    parse_served(bytes, None)
}

/// Like [`parse_document`], honouring the charset of the served `Content-Type`.
pub fn parse_served(bytes: &[u8], content_type: Option<&str>) -> Result<ParsedTree> {
    let text = decode_document(bytes, content_type)?;
    parse_str(&text)
}

pub fn parse_str(text: &str) -> Result<ParsedTree> {
    if text.trim().is_empty() {
        return Err(LookupError::Parse("document is empty".into()));
    }

    let html = Html::parse_document(text);
    let root = html.root_element();
    let has_content = root
        .descendants()
        .any(|node| match node.value() {
            Node::Element(el) => !SCAFFOLD_TAGS.contains(&el.name()),
            Node::Text(t) => !t.trim().is_empty(),
            _ => false,
        });
    if !has_content {
        return Err(LookupError::Parse("document has no elements and no text".into()));
    }

    let tree = ParsedTree { html };
    tracing::debug!(
        recovered_errors = tree.recovered_errors(),
        bytes = text.len(),
        "extract.parsed"
    );
    Ok(tree)
}

/// Case-insensitive label phrase; any whitespace run between words matches.
#[derive(Debug, Clone)]
pub struct LabelPattern {
    phrase: &'static str,
    re: Regex,
}

impl LabelPattern {
    pub fn new(phrase: &'static str) -> std::result::Result<Self, regex::Error> {
        let words: Vec<String> = phrase.split_whitespace().map(regex::escape).collect();
        let re = Regex::new(&format!(r"(?i){}", words.join(r"\s+")))?;
        Ok(Self { phrase, re })
    }

    pub fn phrase(&self) -> &'static str {
        self.phrase
    }

    pub fn matches(&self, text: &str) -> bool {
        self.re.is_match(text)
    }
}

/// Elements after `anchor` in document order: its own descendants first,
/// then everything that follows it. Visits at most `MAX_FORWARD_NODES` nodes.
pub fn following_elements<'a>(anchor: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    let start = *anchor;
    start
        .descendants()
        .skip(1)
        .chain(
            std::iter::once(start)
                .chain(start.ancestors())
                .flat_map(|node| node.next_siblings())
                .flat_map(|sibling| sibling.descendants()),
        )
        .take(MAX_FORWARD_NODES)
        .filter_map(ElementRef::wrap)
}

/// Nearest element named `tag` among `from` and its ancestors, climbing at
/// most `MAX_ANCESTOR_DEPTH` levels.
pub fn enclosing<'a>(from: ElementRef<'a>, tag: &str) -> Option<ElementRef<'a>> {
    let start = *from;
    std::iter::once(start)
        .chain(start.ancestors())
        .take(MAX_ANCESTOR_DEPTH + 1)
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == tag)
}

/// Concatenated text of an element with whitespace runs collapsed.
pub fn normalized_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
