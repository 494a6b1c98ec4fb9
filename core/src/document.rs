use anyhow::{Context, Result};
use ego_tree::NodeRef;
use lazy_static::lazy_static;
use scraper::{Html, Node, Selector};
use serde::Deserialize;
use std::fs;
use std::path::Path;

lazy_static! {
    static ref TITLE_SEL: Selector = Selector::parse("title").expect("valid selector");
}

/// Tags whose text never counts as visible page content.
const SKIPPED_TAGS: [&str; 5] = ["script", "style", "code", "head", "title"];

/// One crawler-produced document as stored on disk.
#[derive(Debug, Deserialize)]
pub struct RawDoc {
    pub url: String,
    pub content: String,
    #[serde(default)]
    pub encoding: String,
}

impl RawDoc {
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading document {}", path.display()))?;
        let doc = serde_json::from_str(&data)
            .with_context(|| format!("decoding document {}", path.display()))?;
        Ok(doc)
    }
}

/// Cheap pre-filter run before any parsing: the raw content must contain
/// `<html` (case-insensitive) within its first 1024 bytes.
pub fn is_valid_html(content: &str) -> bool {
    let head = &content.as_bytes()[..content.len().min(1024)];
    head.windows(5).any(|w| w.eq_ignore_ascii_case(b"<html"))
}

/// A parsed page exposing the visible text, the title, and per-tag text
/// for structural boosting.
pub struct WebPage {
    pub url: String,
    pub title: String,
    texts: Vec<String>,
    html: Html,
}

impl WebPage {
    pub fn parse(raw: &RawDoc) -> Self {
        let html = Html::parse_document(&raw.content);
        let mut texts = Vec::new();
        collect_text(html.tree.root(), &mut texts);
        let title = html
            .select(&TITLE_SEL)
            .next()
            .map(|el| collapse_ws(&el.text().collect::<String>()))
            .unwrap_or_default();
        WebPage { url: raw.url.clone(), title, texts, html }
    }

    /// Visible text strings, whitespace-collapsed, in document order.
    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    /// Collapsed text of every element with the given tag name.
    pub fn tag_texts(&self, tag: &str) -> Vec<String> {
        let sel = match Selector::parse(tag) {
            Ok(sel) => sel,
            Err(_) => return Vec::new(),
        };
        self.html
            .select(&sel)
            .map(|el| collapse_ws(&el.text().collect::<String>()))
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Polynomial rolling hash over the concatenated visible text. Pages
    /// differing only in whitespace hash identically since each string is
    /// collapsed before hashing.
    pub fn fingerprint(&self) -> u32 {
        let mut h: u32 = 0;
        for s in &self.texts {
            for c in s.chars() {
                h = h.wrapping_mul(31).wrapping_add(c as u32);
            }
        }
        h
    }
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut Vec<String>) {
    match node.value() {
        Node::Element(el) if SKIPPED_TAGS.contains(&el.name()) => return,
        Node::Text(text) => {
            let s = collapse_ws(text);
            if !s.is_empty() {
                out.push(s);
            }
        }
        _ => {}
    }
    for child in node.children() {
        collect_text(child, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(content: &str) -> WebPage {
        WebPage::parse(&RawDoc {
            url: "http://example.com".into(),
            content: content.into(),
            encoding: "utf-8".into(),
        })
    }

    #[test]
    fn html_gate_checks_first_kilobyte() {
        assert!(is_valid_html("<!DOCTYPE html><HTML><body></body></HTML>"));
        assert!(!is_valid_html("{\"not\": \"a web page\"}"));
        let buried = format!("{}<html>", " ".repeat(2000));
        assert!(!is_valid_html(&buried));
    }

    #[test]
    fn extraction_skips_script_style_and_title() {
        let p = page(
            "<html><head><title>Nope</title><style>p{color:red}</style></head>\
             <body><p>alpha  beta</p><script>var x = 1;</script></body></html>",
        );
        assert_eq!(p.texts(), ["alpha beta"]);
        assert_eq!(p.title, "Nope");
    }

    #[test]
    fn fingerprint_ignores_whitespace_differences() {
        let a = page("<html><body><p>alpha   beta</p></body></html>");
        let b = page("<html><body><p>alpha\n\tbeta</p></body></html>");
        assert_eq!(a.fingerprint(), b.fingerprint());
        let c = page("<html><body><p>alpha gamma</p></body></html>");
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn tag_texts_collects_every_heading() {
        let p = page("<html><body><h1>One</h1><p>body</p><h1>Two</h1></body></html>");
        assert_eq!(p.tag_texts("h1"), ["One", "Two"]);
        assert!(p.tag_texts("h2").is_empty());
    }
}
