//! Markup handling for rendered pages: visible text, scripts, embedded JSON.

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use serde_json::Value;

use crate::error::AppError;
use crate::json;

/// Elements whose text is never rendered.
const HIDDEN: &[&str] = &["script", "style", "noscript", "template"];

/// Elements treated as self-contained text blocks when scoping a page.
const BLOCKS: &[&str] = &[
    "main", "section", "article", "table", "tbody", "tr", "ul", "ol", "li", "div", "p",
];

/// Blocks shorter than this carry no draw worth scanning.
const MIN_BLOCK_CHARS: usize = 40;

/// Compiled selectors and patterns for markup work. Built once per pipeline.
#[derive(Debug, Clone)]
pub struct MarkupScanner {
    scripts: Selector,
    blocks: Selector,
    soft_404: Regex,
}

impl MarkupScanner {
    pub fn new() -> Result<Self, AppError> {
        Ok(Self {
            scripts: parse_selector("script")?,
            blocks: parse_selector(&BLOCKS.join(", "))?,
            soft_404: Regex::new(
                r"(?i)\bnot\s+found\b|page\s+wasn.?t\s+a\s+winner|\b404\s+(?:error|page)\b",
            )?,
        })
    }

    /// True for error pages served with a success status.
    pub fn is_soft_404(&self, text: &str) -> bool {
        self.soft_404.is_match(text)
    }

    /// Raw contents of every `<script>` element, in document order.
    pub fn scripts(&self, html: &Html) -> Vec<String> {
        html.select(&self.scripts)
            .map(|el| el.text().collect::<String>())
            .filter(|s| !s.trim().is_empty())
            .collect()
    }

    /// Visible text of every block element long enough to hold a draw,
    /// followed by the whole page.
    pub fn text_blocks(&self, html: &Html) -> Vec<String> {
        let mut blocks: Vec<String> = html
            .select(&self.blocks)
            .map(visible_text)
            .filter(|t| t.len() > MIN_BLOCK_CHARS)
            .collect();
        blocks.push(visible_text(html.root_element()));
        blocks
    }
}

/// Compile a CSS selector, mapping the parse error into [`AppError`].
pub fn parse_selector(css: &str) -> Result<Selector, AppError> {
    Selector::parse(css).map_err(|e| AppError::Generic(format!("Invalid selector {css:?}: {e}")))
}

/// Strip markup down to the visible text of a whole document.
pub fn html_to_text(body: &str) -> String {
    visible_text(Html::parse_document(body).root_element())
}

/// Visible text under `element` with whitespace collapsed to single spaces.
pub fn visible_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    for node in element.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| HIDDEN.contains(&e.name()))
        });
        if !hidden {
            raw.push_str(text);
            raw.push(' ');
        }
    }
    collapse_whitespace(&raw)
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Undo the HTML entity escaping commonly applied to JSON inside attributes
/// and scripts.
pub fn unescape_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&#x22;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Parseable JSON objects and arrays embedded in `text`, in order of
/// appearance, at most `limit` of them.
///
/// Each span is decoded from a `{` or `[` onward; a span that parses is
/// skipped over whole, so nested values are not reported twice.
pub fn json_spans(text: &str, limit: usize) -> Vec<Value> {
    let mut found = Vec::new();
    let mut pos = 0;

    while found.len() < limit {
        let Some(rel) = text[pos..].find(['{', '[']) else {
            break;
        };
        let start = pos + rel;
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) if is_container_with_content(&value) => {
                found.push(value);
                pos = start + stream.byte_offset().max(1);
            }
            _ => pos = start + 1,
        }
    }

    found
}

fn is_container_with_content(value: &Value) -> bool {
    match value {
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => false,
    }
}

/// JSON spans recovered from a markup body: script contents first (raw, then
/// entity-unescaped), then the unescaped body as a whole.
pub fn embedded_json(scanner: &MarkupScanner, body: &str, limit: usize) -> Vec<Value> {
    let html = Html::parse_document(body);
    let mut spans = Vec::new();

    for script in scanner.scripts(&html) {
        if spans.len() >= limit {
            break;
        }
        let mut found = json_spans(&script, limit - spans.len());
        if found.is_empty() {
            found = json_spans(&unescape_entities(&script), limit - spans.len());
        }
        spans.extend(found);
    }

    if spans.len() < limit {
        let unescaped = unescape_entities(body);
        let fresh: Vec<Value> = json_spans(&unescaped, limit - spans.len())
            .into_iter()
            .filter(|v| !spans.contains(v))
            .collect();
        spans.extend(fresh);
    }

    spans.into_iter().map(json::unwrap_asmx).collect()
}
