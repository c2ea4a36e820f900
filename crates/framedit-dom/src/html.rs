use crate::document::Document;
use crate::node::{NodeData, NodeId};
use std::fmt::Write as _;

const VOID_TAGS: &[&str] = &["br", "link", "meta", "img", "input", "hr"];

impl Document {
    /// Serializes the whole document, doctype included.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        if let Some(doctype) = self.doctype() {
            out.push_str(doctype);
        }
        self.write_node(&mut out, self.root());
        out
    }

    /// Serializes one node and its subtree.
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_node(&mut out, node);
        out
    }

    fn write_node(&self, out: &mut String, node: NodeId) {
        let Ok(entry) = self.node(node) else {
            return;
        };
        let element = match &entry.data {
            NodeData::Text(text) => {
                escape_into(out, text, false);
                return;
            }
            NodeData::Element(element) => element,
        };

        out.push('<');
        out.push_str(&element.tag);
        for (name, value) in &element.attributes {
            let _ = write!(out, " {name}=\"");
            escape_into(out, value, true);
            out.push('"');
        }
        if !element.style.is_empty() {
            out.push_str(" style=\"");
            escape_into(out, &element.style.to_string(), true);
            out.push('"');
        }

        if VOID_TAGS.contains(&element.tag.as_str()) {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for &child in &entry.children {
            self.write_node(out, child);
        }
        let _ = write!(out, "</{}>", element.tag);
    }
}

fn escape_into(out: &mut String, text: &str, attribute: bool) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}
