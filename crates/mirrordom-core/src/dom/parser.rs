//! HTML fragment parsing for `set_inner_html`.
//!
//! Parsing is delegated to html5ever; the RcDom result is converted into our
//! own nodes, each registered with the context so browser events can address
//! them. Any identity attribute present in the input is discarded - parsed
//! elements always get fresh identities.

use html5ever::tendril::TendrilSink;
use html5ever::{ParseOpts, QualName, local_name, namespace_url, ns, parse_fragment};
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};

use mirrordom_protocols::DomError;

use crate::dom::{Node, SYNC_ID_ATTR};
use crate::sync::SyncContext;

/// Parse `html` into a detached fragment owned by `ctx`.
pub(crate) fn parse_fragment_html(ctx: &SyncContext, html: &str) -> Result<Node, DomError> {
    let dom: RcDom = parse_fragment(
        RcDom::default(),
        ParseOpts::default(),
        QualName::new(None, ns!(html), local_name!("div")),
        Vec::new(),
    )
    .from_utf8()
    .read_from(&mut html.as_bytes())
    .map_err(|err| DomError::Parse(err.to_string()))?;

    let fragment = ctx.create_fragment();
    // Fragment parsing wraps the result in a synthetic <html> element.
    for child in dom.document.children.borrow().iter() {
        if let RcNodeData::Element { .. } = &child.data {
            for grandchild in child.children.borrow().iter() {
                convert_into(ctx, grandchild, &fragment)?;
            }
        } else {
            convert_into(ctx, child, &fragment)?;
        }
    }
    Ok(fragment)
}

fn convert_into(ctx: &SyncContext, handle: &Handle, parent: &Node) -> Result<(), DomError> {
    match &handle.data {
        RcNodeData::Text { contents } => {
            let text = ctx.create_text(&contents.borrow());
            parent.append_child(&text)
        }
        RcNodeData::Comment { contents } => {
            let comment = ctx.create_comment(contents);
            parent.append_child(&comment)
        }
        RcNodeData::Element { name, attrs, .. } => {
            let element = ctx.element_node(&name.local, None);
            for attr in attrs.borrow().iter() {
                let attr_name = attr.name.local.to_string();
                if attr_name != SYNC_ID_ATTR {
                    element.set_attribute(&attr_name, &attr.value)?;
                }
            }
            parent.append_child(&element)?;
            for child in handle.children.borrow().iter() {
                convert_into(ctx, child, &element)?;
            }
            Ok(())
        }
        // Doctypes and processing instructions have no place in a fragment.
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::strip_sync_ids;

    #[test]
    fn test_parse_simple_fragment() {
        let ctx = SyncContext::new();
        let frag = parse_fragment_html(&ctx, "<p>hello</p>").unwrap();
        assert_eq!(strip_sync_ids(&frag.html()), "<p>hello</p>");
    }

    #[test]
    fn test_parse_nested_elements_and_attributes() {
        let ctx = SyncContext::new();
        let frag =
            parse_fragment_html(&ctx, r#"<ul class="menu"><li>a</li><li>b</li></ul>"#).unwrap();
        assert_eq!(
            strip_sync_ids(&frag.html()),
            r#"<ul class="menu"><li>a</li><li>b</li></ul>"#
        );
    }

    #[test]
    fn test_parse_bare_text() {
        let ctx = SyncContext::new();
        let frag = parse_fragment_html(&ctx, "just text").unwrap();
        assert_eq!(frag.html(), "just text");
    }

    #[test]
    fn test_parsed_elements_are_registered() {
        let ctx = SyncContext::new();
        let frag = parse_fragment_html(&ctx, "<span></span>").unwrap();
        let span = &frag.children()[0];
        let resolved = ctx.resolve(span.id()).unwrap();
        assert!(Node::ptr_eq(&resolved, span));
    }

    #[test]
    fn test_incoming_identity_attribute_is_discarded() {
        let ctx = SyncContext::new();
        let frag = parse_fragment_html(&ctx, r#"<b mdom-id="999">x</b>"#).unwrap();
        let bold = &frag.children()[0];
        assert_ne!(bold.id(), "999");
        assert!(bold.get_attribute(SYNC_ID_ATTR).is_none());
    }

    #[test]
    fn test_malformed_markup_is_recovered() {
        let ctx = SyncContext::new();
        let frag = parse_fragment_html(&ctx, "<i>unclosed").unwrap();
        assert_eq!(strip_sync_ids(&frag.html()), "<i>unclosed</i>");
    }
}
