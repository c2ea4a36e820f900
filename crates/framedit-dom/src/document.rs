use crate::error::{DomError, DomResult};
use crate::node::{BoxMetrics, Node, NodeData, NodeId};
use crate::style::{RuleId, Style, StyleRule, StyleSheet};
use slab::Slab;

/// Font measurements used by the headless layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    pub line_height: f32,
    pub char_width: f32,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            line_height: 16.0,
            char_width: 8.0,
        }
    }
}

/// A document: an arena of nodes rooted at `<html>`, plus its style sheets.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Slab<Node>,
    root: NodeId,
    head: NodeId,
    body: NodeId,
    pub(crate) doctype: Option<String>,
    sheets: Vec<StyleSheet>,
    pending_sheets: Vec<NodeId>,
    live_style_sheets: bool,
    next_rule: u32,
    pub(crate) font: FontMetrics,
    pub(crate) body_margin: f32,
    pub(crate) viewport_width: f32,
    focused: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty `<html><head></head><body></body></html>` skeleton.
    pub fn new() -> Self {
        let mut nodes = Slab::new();
        let root = NodeId(nodes.insert(Node::element("html")));
        let head = NodeId(nodes.insert(Node::element("head")));
        let body = NodeId(nodes.insert(Node::element("body")));
        nodes[head.0].parent = Some(root);
        nodes[body.0].parent = Some(root);
        nodes[root.0].children = vec![head, body];

        Self {
            nodes,
            root,
            head,
            body,
            doctype: None,
            sheets: Vec::new(),
            pending_sheets: Vec::new(),
            live_style_sheets: true,
            next_rule: 0,
            font: FontMetrics::default(),
            body_margin: 8.0,
            viewport_width: 800.0,
            focused: false,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn head(&self) -> NodeId {
        self.head
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn doctype(&self) -> Option<&str> {
        self.doctype.as_deref()
    }

    pub fn set_doctype(&mut self, doctype: impl Into<String>) {
        self.doctype = Some(doctype.into());
    }

    pub fn font(&self) -> FontMetrics {
        self.font
    }

    pub fn set_font(&mut self, font: FontMetrics) {
        self.font = font;
    }

    pub fn body_margin(&self) -> f32 {
        self.body_margin
    }

    pub fn set_body_margin(&mut self, margin: f32) {
        self.body_margin = margin.max(0.0);
    }

    pub fn set_viewport_width(&mut self, width: f32) {
        self.viewport_width = width.max(0.0);
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
    }

    pub fn has_focus(&self) -> bool {
        self.focused
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(node.0)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        NodeId(self.nodes.insert(Node::element(tag)))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        NodeId(self.nodes.insert(Node::text(text)))
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Inserts `child` before `reference`, or at the end when `reference` is `None`.
    /// A child that already has a parent is moved.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        self.node(child)?;
        if self.node(parent)?.as_element().is_none() {
            return Err(DomError::NotAnElement(parent));
        }
        if self.ancestors(parent).any(|ancestor| ancestor == child) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if let Some(reference) = reference {
            if self.node(reference)?.parent != Some(parent) {
                return Err(DomError::NotAChild {
                    parent,
                    child: reference,
                });
            }
        }

        self.detach(child)?;
        let children = &mut self.nodes[parent.0].children;
        let index = reference
            .and_then(|reference| children.iter().position(|&entry| entry == reference))
            .unwrap_or(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);

        if self.is_connected(child) {
            self.register_sheets(child);
        }
        Ok(())
    }

    /// Swaps `old` for `new` under `parent` and discards `old`.
    pub fn replace_child(&mut self, parent: NodeId, new: NodeId, old: NodeId) -> DomResult<()> {
        self.insert_before(parent, new, Some(old))?;
        self.remove_child(parent, old)
    }

    /// Unlinks a node from its parent, keeping it (and its subtree) alive.
    pub fn detach(&mut self, node: NodeId) -> DomResult<()> {
        let Some(parent) = self.node(node)?.parent else {
            return Ok(());
        };
        self.unregister_sheets(node);
        self.nodes[parent.0].children.retain(|&entry| entry != node);
        self.nodes[node.0].parent = None;
        Ok(())
    }

    /// Removes a child and frees its subtree.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        if self.node(child)?.parent != Some(parent) {
            return Err(DomError::NotAChild { parent, child });
        }
        self.detach(child)?;
        self.destroy(child);
        Ok(())
    }

    fn destroy(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(removed) = self.nodes.try_remove(current.0) {
                stack.extend(removed.children);
            }
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|entry| entry.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|entry| entry.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).first().copied()
    }

    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).last().copied()
    }

    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let siblings = self.children(self.parent(node)?);
        let index = siblings.iter().position(|&entry| entry == node)?;
        siblings.get(index + 1).copied()
    }

    /// The node's ancestors, nearest first.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(node), move |&current| self.parent(current))
    }

    /// Nearest inclusive ancestor with the given tag.
    pub fn closest(&self, node: NodeId, tag: &str) -> Option<NodeId> {
        std::iter::once(node)
            .chain(self.ancestors(node))
            .find(|&candidate| self.tag(candidate) == Some(tag))
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        node == self.root || self.ancestors(node).any(|ancestor| ancestor == self.root)
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0).and_then(Node::tag)
    }

    /// Text of a text node.
    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(node.0)?.data {
            NodeData::Text(text) => Some(text),
            NodeData::Element(_) => None,
        }
    }

    pub fn set_text(&mut self, node: NodeId, text: &str) -> DomResult<()> {
        match &mut self.node_mut(node)?.data {
            NodeData::Text(existing) => {
                existing.clear();
                existing.push_str(text);
                Ok(())
            }
            NodeData::Element(_) => Err(DomError::NotAnElement(node)),
        }
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            match self.nodes.get(current.0).map(|entry| &entry.data) {
                Some(NodeData::Text(text)) => out.push_str(text),
                Some(NodeData::Element(_)) => {
                    stack.extend(self.children(current).iter().rev().copied());
                }
                None => {}
            }
        }
        out
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes
            .get(node.0)?
            .as_element()?
            .attributes
            .get(name)
            .map(String::as_str)
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> DomResult<()> {
        if name.eq_ignore_ascii_case("style") {
            *self.style_mut(node)? = Style::parse(value);
            return Ok(());
        }
        self.element_mut(node)?
            .attributes
            .insert(name.to_ascii_lowercase(), value.to_string());
        Ok(())
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> DomResult<Option<String>> {
        Ok(self.element_mut(node)?.attributes.remove(name))
    }

    pub fn attributes(&self, node: NodeId) -> impl Iterator<Item = (&str, &str)> {
        self.nodes
            .get(node.0)
            .and_then(Node::as_element)
            .into_iter()
            .flat_map(|element| element.attributes.iter())
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.nodes
            .get(node.0)
            .map(|entry| entry.has_class(class))
            .unwrap_or(false)
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) -> DomResult<()> {
        if self.has_class(node, class) {
            return Ok(());
        }
        let attributes = &mut self.element_mut(node)?.attributes;
        let classes = attributes.entry("class".to_string()).or_default();
        if !classes.is_empty() {
            classes.push(' ');
        }
        classes.push_str(class);
        Ok(())
    }

    pub fn style(&self, node: NodeId) -> Option<&Style> {
        self.nodes
            .get(node.0)
            .and_then(Node::as_element)
            .map(|element| &element.style)
    }

    pub fn style_mut(&mut self, node: NodeId) -> DomResult<&mut Style> {
        Ok(&mut self.element_mut(node)?.style)
    }

    /// Geometry from the most recent [`Document::reflow`].
    pub fn metrics(&self, node: NodeId) -> BoxMetrics {
        self.nodes
            .get(node.0)
            .map(|entry| entry.metrics)
            .unwrap_or_default()
    }

    pub fn offset_top(&self, node: NodeId) -> f32 {
        self.metrics(node).offset_top
    }

    pub fn offset_height(&self, node: NodeId) -> f32 {
        self.metrics(node).offset_height
    }

    pub fn offset_width(&self, node: NodeId) -> f32 {
        self.metrics(node).offset_width
    }

    pub fn offset_parent(&self, node: NodeId) -> Option<NodeId> {
        self.metrics(node).offset_parent
    }

    pub fn scroll_top(&self, node: NodeId) -> f32 {
        self.nodes
            .get(node.0)
            .map(|entry| entry.scroll_top)
            .unwrap_or(0.0)
    }

    pub fn set_scroll_top(&mut self, node: NodeId, top: f32) -> DomResult<()> {
        self.node_mut(node)?.scroll_top = top.max(0.0);
        Ok(())
    }

    /// Whether style sheets appear as soon as their owner element is attached.
    ///
    /// Some engines populate the style sheet list lazily; turning this off
    /// reproduces that, and turning it back on publishes the deferred sheets.
    pub fn set_style_sheets_live(&mut self, live: bool) {
        self.live_style_sheets = live;
        if live {
            for owner in std::mem::take(&mut self.pending_sheets) {
                if self.contains(owner) && self.is_connected(owner) {
                    self.sheets.push(StyleSheet::new(owner));
                }
            }
        }
    }

    pub fn style_sheets(&self) -> &[StyleSheet] {
        &self.sheets
    }

    pub fn style_sheet_count(&self) -> usize {
        self.sheets.len()
    }

    /// Inserts a rule at `index` in the given sheet.
    pub fn insert_rule(
        &mut self,
        sheet: usize,
        selector: &str,
        declarations: &str,
        index: usize,
    ) -> DomResult<RuleId> {
        let id = RuleId(self.next_rule);
        let target = self
            .sheets
            .get_mut(sheet)
            .ok_or(DomError::UnknownSheet(sheet))?;
        let index = index.min(target.rules.len());
        target.rules.insert(
            index,
            StyleRule {
                id,
                selector: selector.trim().to_string(),
                style: Style::parse(declarations),
            },
        );
        self.next_rule += 1;
        Ok(id)
    }

    pub fn rule_style(&self, rule: RuleId) -> Option<&Style> {
        self.sheets
            .iter()
            .flat_map(|sheet| sheet.rules.iter())
            .find(|entry| entry.id == rule)
            .map(|entry| &entry.style)
    }

    pub fn rule_style_mut(&mut self, rule: RuleId) -> DomResult<&mut Style> {
        self.sheets
            .iter_mut()
            .flat_map(|sheet| sheet.rules.iter_mut())
            .find(|entry| entry.id == rule)
            .map(|entry| &mut entry.style)
            .ok_or(DomError::UnknownRule(rule))
    }

    pub(crate) fn node(&self, node: NodeId) -> DomResult<&Node> {
        self.nodes.get(node.0).ok_or(DomError::UnknownNode(node))
    }

    pub(crate) fn node_mut(&mut self, node: NodeId) -> DomResult<&mut Node> {
        self.nodes.get_mut(node.0).ok_or(DomError::UnknownNode(node))
    }

    pub(crate) fn set_metrics(&mut self, node: NodeId, metrics: BoxMetrics) {
        if let Some(entry) = self.nodes.get_mut(node.0) {
            entry.metrics = metrics;
        }
    }

    fn element_mut(&mut self, node: NodeId) -> DomResult<&mut crate::node::Element> {
        self.node_mut(node)?
            .as_element_mut()
            .ok_or(DomError::NotAnElement(node))
    }

    fn owns_sheet(&self, node: NodeId) -> bool {
        match self.tag(node) {
            Some("style") => true,
            Some("link") => self
                .attribute(node, "rel")
                .map(|rel| rel.eq_ignore_ascii_case("stylesheet"))
                .unwrap_or(false),
            _ => false,
        }
    }

    fn subtree(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    fn register_sheets(&mut self, node: NodeId) {
        for owner in self.subtree(node) {
            if !self.owns_sheet(owner) {
                continue;
            }
            if self.live_style_sheets {
                self.sheets.push(StyleSheet::new(owner));
            } else {
                self.pending_sheets.push(owner);
            }
        }
    }

    fn unregister_sheets(&mut self, node: NodeId) {
        let removed = self.subtree(node);
        self.sheets.retain(|sheet| !removed.contains(&sheet.owner));
        self.pending_sheets.retain(|owner| !removed.contains(owner));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_and_mutates_tree() {
        let mut doc = Document::new();
        let body = doc.body();
        let div = doc.create_element("DIV");
        let text = doc.create_text("hello");
        doc.append_child(div, text).unwrap();
        doc.append_child(body, div).unwrap();

        assert_eq!(doc.tag(div), Some("div"));
        assert_eq!(doc.parent(div), Some(body));
        assert_eq!(doc.text_content(body), "hello");
        assert!(doc.is_connected(text));

        doc.remove_child(body, div).unwrap();
        assert!(!doc.contains(div));
        assert!(!doc.contains(text));
    }

    #[test]
    fn insert_before_orders_children() {
        let mut doc = Document::new();
        let body = doc.body();
        let first = doc.create_element("p");
        let second = doc.create_element("p");
        doc.append_child(body, second).unwrap();
        doc.insert_before(body, first, Some(second)).unwrap();

        assert_eq!(doc.children(body), &[first, second]);
        assert_eq!(doc.next_sibling(first), Some(second));
    }

    #[test]
    fn rejects_cycles_and_foreign_children() {
        let mut doc = Document::new();
        let outer = doc.create_element("div");
        let inner = doc.create_element("div");
        doc.append_child(outer, inner).unwrap();

        assert_eq!(
            doc.append_child(inner, outer),
            Err(DomError::HierarchyRequest {
                parent: inner,
                child: outer
            })
        );
        let stray = doc.create_element("span");
        assert_eq!(
            doc.remove_child(outer, stray),
            Err(DomError::NotAChild {
                parent: outer,
                child: stray
            })
        );
    }

    #[test]
    fn style_elements_register_sheets() {
        let mut doc = Document::new();
        let style = doc.create_element("style");
        assert_eq!(doc.style_sheet_count(), 0);

        let head = doc.head();
        doc.append_child(head, style).unwrap();
        assert_eq!(doc.style_sheet_count(), 1);

        let rule = doc.insert_rule(0, ".a .b", "height: auto", 0).unwrap();
        doc.rule_style_mut(rule).unwrap().set("height", "12px");
        assert_eq!(doc.rule_style(rule).unwrap().px("height"), Some(12.0));

        doc.remove_child(head, style).unwrap();
        assert_eq!(doc.style_sheet_count(), 0);
        assert!(doc.rule_style(rule).is_none());
    }

    #[test]
    fn lazy_style_sheets_publish_later() {
        let mut doc = Document::new();
        doc.set_style_sheets_live(false);
        let style = doc.create_element("style");
        let body = doc.body();
        doc.append_child(body, style).unwrap();
        assert_eq!(doc.style_sheet_count(), 0);

        doc.set_style_sheets_live(true);
        assert_eq!(doc.style_sheet_count(), 1);
    }

    #[test]
    fn closest_finds_enclosing_form() {
        let mut doc = Document::new();
        let form = doc.create_element("form");
        let field = doc.create_element("textarea");
        doc.append_child(form, field).unwrap();
        let body = doc.body();
        doc.append_child(body, form).unwrap();

        assert_eq!(doc.closest(field, "form"), Some(form));
        assert_eq!(doc.closest(form, "textarea"), None);
    }

    #[test]
    fn style_attribute_is_parsed() {
        let mut doc = Document::new();
        let div = doc.create_element("div");
        doc.set_attribute(div, "style", "width: 40px; display: none")
            .unwrap();
        assert_eq!(doc.style(div).unwrap().px("width"), Some(40.0));
        assert_eq!(doc.attribute(div, "style"), None);
    }
}
