//! HTML serialization.
//!
//! The emitter derives outbound command HTML from the same serializer the
//! host tree uses for rendering, so host and browser state match
//! byte-for-byte modulo the identity attribute, which [`strip_sync_ids`]
//! removes for display and comparison.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::dom::{Node, SYNC_ID_ATTR};

/// Elements serialized without children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose text children are serialized without entity escaping.
fn is_raw_text(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

fn write_node(node: &Node, raw_text: bool, out: &mut String) {
    if let Some(tag) = node.tag() {
        out.push('<');
        out.push_str(tag);
        // Identity attribute first, then attributes in insertion order.
        out.push(' ');
        out.push_str(SYNC_ID_ATTR);
        out.push_str("=\"");
        escape_attr(node.id(), out);
        out.push('"');
        for (name, value) in node.attributes() {
            out.push(' ');
            out.push_str(&name);
            out.push_str("=\"");
            escape_attr(&value, out);
            out.push('"');
        }
        out.push('>');
        if is_void(tag) {
            return;
        }
        let raw = is_raw_text(tag);
        for child in node.children() {
            write_node(&child, raw, out);
        }
        out.push_str("</");
        out.push_str(tag);
        out.push('>');
    } else if let Some(data) = node.text_data() {
        if node.is_text() {
            if raw_text {
                out.push_str(data);
            } else {
                escape_text(data, out);
            }
        } else {
            out.push_str("<!--");
            out.push_str(data);
            out.push_str("-->");
        }
    } else {
        // Document or fragment: children only.
        for child in node.children() {
            write_node(&child, raw_text, out);
        }
    }
}

/// HTML of `node` and its subtree, escaping text by its current parent.
pub fn outer_html(node: &Node) -> String {
    let raw = node
        .parent()
        .and_then(|p| p.tag().map(is_raw_text))
        .unwrap_or(false);
    let mut out = String::new();
    write_node(node, raw, &mut out);
    out
}

/// HTML of `node`'s children.
pub fn inner_html(node: &Node) -> String {
    let raw = node.tag().map(is_raw_text).unwrap_or(false);
    let mut out = String::new();
    for child in node.children() {
        write_node(&child, raw, &mut out);
    }
    out
}

/// HTML of `child` as it will read once inside `parent`.
///
/// Used by the emitter before attaching: text escaping depends on the
/// prospective parent, so the command carries exactly what the local tree
/// will render after the mutation.
pub(crate) fn child_html_in(parent: &Node, child: &Node) -> String {
    let raw = parent.tag().map(is_raw_text).unwrap_or(false);
    let mut out = String::new();
    write_node(child, raw, &mut out);
    out
}

static SYNC_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r#" {SYNC_ID_ATTR}="[^"]*""#)).expect("identity attribute pattern")
});

/// Remove the identity attribute from an HTML string.
pub fn strip_sync_ids(html: &str) -> String {
    SYNC_ID_RE.replace_all(html, "").into_owned()
}
