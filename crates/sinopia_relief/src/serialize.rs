//! Markup serialization.
//!
//! Produces the same markup a browser would for `innerHTML`/`outerHTML`:
//! text and attribute values are escaped, markers become comments, void
//! elements have no closing tag.

use sinopia_carton::{is_raw_text_tag, is_void_tag};

use crate::node::{Node, NodeKind};

/// Serialize the children of `node`.
pub fn inner_html(node: &Node) -> String {
    let mut out = String::new();
    let raw = node.tag().is_some_and(|tag| is_raw_text_tag(&tag));
    for child in node.children() {
        write_node(&child, raw, &mut out);
    }
    out
}

/// Serialize `node` itself. For a fragment this equals [`inner_html`].
pub fn outer_html(node: &Node) -> String {
    let mut out = String::new();
    write_node(node, false, &mut out);
    out
}

fn write_node(node: &Node, raw_text: bool, out: &mut String) {
    match node.kind() {
        NodeKind::Fragment => {
            for child in node.children() {
                write_node(&child, false, out);
            }
        }
        NodeKind::Text(text) => {
            if raw_text {
                out.push_str(&text);
            } else {
                out.push_str(&htmlize::escape_text(text.as_str()));
            }
        }
        NodeKind::Marker(data) => {
            out.push_str("<!--");
            out.push_str(&data.replace("-->", "--&gt;"));
            out.push_str("-->");
        }
        NodeKind::Element(el) => {
            out.push('<');
            out.push_str(&el.tag);
            for attr in &el.attrs {
                out.push(' ');
                out.push_str(&attr.name);
                out.push_str("=\"");
                out.push_str(&htmlize::escape_attribute(attr.value.as_str()));
                out.push('"');
            }
            out.push('>');

            if is_void_tag(&el.tag) {
                return;
            }

            let raw = is_raw_text_tag(&el.tag);
            for child in node.children() {
                write_node(&child, raw, out);
            }
            out.push_str("</");
            out.push_str(&el.tag);
            out.push('>');
        }
    }
}

impl Node {
    /// Markup of this node's children.
    pub fn inner_html(&self) -> String {
        inner_html(self)
    }

    /// Markup of this node including itself.
    pub fn outer_html(&self) -> String {
        outer_html(self)
    }
}
