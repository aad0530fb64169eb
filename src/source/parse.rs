//! Syndication payload parsing.
//!
//! [`parse`] turns the raw text a relay returns into [`NewsItem`]s.  It
//! never fails: a payload that is not well-formed XML, or that holds neither
//! RSS items nor Atom entries, yields an empty vector and a log line.
//!
//! The document is first checked for well-formedness with `quick-xml`
//! (building a small element tree on the way).  RSS 0.9x/1.0/2.0 channels
//! are then read with the [`rss`] crate; when that finds no items the tree
//! is searched for Atom `<entry>` elements instead.

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use super::news_item::{parse_timestamp, NewsItem};

/// Parse `raw` into items tagged with `source_id`.
pub fn parse(raw: &str, source_id: &str) -> Vec<NewsItem> {
    parse_at(raw, source_id, Utc::now())
}

/// Like [`parse`], with an explicit fallback time for undated items.
pub fn parse_at(raw: &str, source_id: &str, now: DateTime<Utc>) -> Vec<NewsItem> {
    let root = match Element::parse_document(raw) {
        Ok(root) => root,
        Err(e) => {
            tracing::warn!(source_id, error = %e, "malformed feed payload");
            return Vec::new();
        }
    };

    let items = rss_items(raw, source_id, now);
    if !items.is_empty() {
        return items;
    }

    let entries = atom_entries(&root, source_id, now);
    if entries.is_empty() {
        tracing::debug!(source_id, root = %root.name, "feed holds no items or entries");
    }
    entries
}

fn rss_items(raw: &str, source_id: &str, now: DateTime<Utc>) -> Vec<NewsItem> {
    let channel = match rss::Channel::read_from(raw.as_bytes()) {
        Ok(channel) => channel,
        Err(e) => {
            tracing::debug!(source_id, error = %e, "not an RSS channel");
            return Vec::new();
        }
    };

    channel
        .items()
        .iter()
        .enumerate()
        .map(|(index, item)| NewsItem {
            id: format!("{source_id}-{index}"),
            title: item.title().unwrap_or_default().trim().to_string(),
            description: strip_html(item.description().unwrap_or_default())
                .trim()
                .to_string(),
            link: item.link().unwrap_or_default().to_string(),
            published_at: parse_timestamp(item.pub_date(), now),
            source_id: source_id.to_string(),
        })
        .collect()
}

fn atom_entries(root: &Element, source_id: &str, now: DateTime<Utc>) -> Vec<NewsItem> {
    root.descendants("entry")
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let text_of = |name: &str| {
                entry
                    .find(name)
                    .map(Element::text_content)
                    .unwrap_or_default()
            };

            let summary = text_of("summary");
            let body = if summary.is_empty() {
                text_of("content")
            } else {
                summary
            };
            let link = entry
                .descendants("link")
                .into_iter()
                .find_map(|l| l.attr("href"))
                .unwrap_or_default()
                .to_string();
            let updated = entry.find("updated").map(Element::text_content);

            NewsItem {
                id: format!("{source_id}-{index}"),
                title: text_of("title").trim().to_string(),
                description: strip_html(&body).trim().to_string(),
                link,
                published_at: parse_timestamp(updated.as_deref(), now),
                source_id: source_id.to_string(),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// HTML stripping
// ---------------------------------------------------------------------------

/// Remove markup from an HTML fragment, keeping only its text.
///
/// Tags and comments are dropped and character references, numeric or any
/// HTML5 named entity, decoded.  A `<` that does not start a tag is kept as
/// text.
pub fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(pos) = rest.find('<') {
        text.push_str(&rest[..pos]);
        let after = &rest[pos..];

        if let Some(comment) = after.strip_prefix("<!--") {
            rest = match comment.find("-->") {
                Some(end) => &comment[end + 3..],
                None => "",
            };
            continue;
        }

        let starts_tag = after[1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'));
        if !starts_tag {
            text.push('<');
            rest = &after[1..];
            continue;
        }

        rest = match after.find('>') {
            Some(end) => &after[end + 1..],
            None => "",
        };
    }
    text.push_str(rest);

    html_escape::decode_html_entities(&text).into_owned()
}

// ---------------------------------------------------------------------------
// Minimal element tree
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
enum XmlError {
    #[error(transparent)]
    Syntax(#[from] quick_xml::Error),

    #[error("document has no root element")]
    NoRoot,

    #[error("text outside the root element")]
    StrayText,

    #[error("more than one root element")]
    MultipleRoots,

    #[error("element <{0}> is never closed")]
    Unclosed(String),
}

#[derive(Debug)]
enum Node {
    Element(Element),
    Text(String),
}

/// An element with its local (namespace-free) name.
#[derive(Debug)]
struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    fn open(start: &BytesStart<'_>) -> Result<Self, XmlError> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            attrs.push((key, value));
        }
        Ok(Self {
            name,
            attrs,
            children: Vec::new(),
        })
    }

    fn parse_document(raw: &str) -> Result<Self, XmlError> {
        let mut reader = Reader::from_str(raw);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(Element::open(&start)?),
                Event::Empty(start) => {
                    let element = Element::open(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    // quick-xml already rejects mismatched end names.
                    if let Some(element) = stack.pop() {
                        attach(&mut stack, &mut root, element)?;
                    }
                }
                Event::Text(text) => {
                    let text = text.unescape()?;
                    push_text(&mut stack, &text)?;
                }
                Event::CData(data) => {
                    let text = String::from_utf8_lossy(&data).into_owned();
                    push_text(&mut stack, &text)?;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(open) = stack.pop() {
            return Err(XmlError::Unclosed(open.name));
        }
        root.ok_or(XmlError::NoRoot)
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// All descendants named `name`, in document order.
    fn descendants(&self, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect(name, &mut found);
        found
    }

    fn collect<'a>(&'a self, name: &str, found: &mut Vec<&'a Element>) {
        for child in &self.children {
            if let Node::Element(el) = child {
                if el.name == name {
                    found.push(el);
                }
                el.collect(name, found);
            }
        }
    }

    /// First descendant named `name`.
    fn find(&self, name: &str) -> Option<&Element> {
        self.children.iter().find_map(|child| match child {
            Node::Element(el) if el.name == name => Some(el),
            Node::Element(el) => el.find(name),
            Node::Text(_) => None,
        })
    }

    fn text_content(&self) -> String {
        let mut out = String::new();
        self.append_text(&mut out);
        out
    }

    fn append_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(el) => el.append_text(out),
            }
        }
    }
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_some() => return Err(XmlError::MultipleRoots),
        None => *root = Some(element),
    }
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str) -> Result<(), XmlError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Text(text.to_string())),
        None if text.trim().is_empty() => {}
        None => return Err(XmlError::StrayText),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
