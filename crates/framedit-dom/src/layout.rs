use crate::document::Document;
use crate::node::{BoxMetrics, NodeData, NodeId};
use std::collections::HashMap;

const INLINE_TAGS: &[&str] = &[
    "span", "a", "b", "i", "em", "strong", "code", "tt", "label", "font", "small",
];
const HIDDEN_TAGS: &[&str] = &["head", "script", "style", "link", "meta", "title"];
const DEFAULT_FRAME_WIDTH: f32 = 300.0;
const DEFAULT_FRAME_HEIGHT: f32 = 150.0;

#[derive(Debug, Clone, Copy)]
struct Placed {
    top: f32,
    left: f32,
    height: f32,
    width: f32,
}

struct Pass {
    line_height: f32,
    char_width: f32,
    placed: HashMap<NodeId, Placed>,
}

impl Document {
    /// Recomputes every node's [`BoxMetrics`].
    ///
    /// Block elements stack vertically; text and inline elements share line
    /// boxes of the font's line height, and `<br>` closes the current line.
    /// Absolutely positioned elements sit at their static position (or at an
    /// explicit `top`) without taking up space in the flow.
    pub fn reflow(&mut self) {
        let mut pass = Pass {
            line_height: self.font.line_height,
            char_width: self.font.char_width,
            placed: HashMap::new(),
        };

        let margin = self.body_margin;
        let body = self.body();
        let root = self.root();
        let available = (self.viewport_width - margin * 2.0).max(0.0);
        let body_box = self.place(&mut pass, body, margin, margin, available, margin, false);
        pass.placed.insert(
            root,
            Placed {
                top: 0.0,
                left: 0.0,
                height: body_box.height + margin * 2.0,
                width: self.viewport_width,
            },
        );

        let nodes: Vec<NodeId> = pass.placed.keys().copied().collect();
        for node in nodes {
            let placed = pass.placed[&node];
            let offset_parent = if node == root || node == body {
                None
            } else {
                self.ancestors(node)
                    .find(|&ancestor| ancestor == body || self.is_positioned(ancestor))
            };
            let origin = offset_parent
                .and_then(|parent| pass.placed.get(&parent))
                .map(|parent| (parent.top, parent.left))
                .unwrap_or((0.0, 0.0));
            self.set_metrics(
                node,
                BoxMetrics {
                    offset_top: placed.top - origin.0,
                    offset_left: placed.left - origin.1,
                    offset_width: placed.width,
                    offset_height: placed.height,
                    offset_parent,
                },
            );
        }
    }

    fn is_positioned(&self, node: NodeId) -> bool {
        matches!(
            self.style(node).and_then(|style| style.get("position")),
            Some("relative" | "absolute" | "fixed")
        )
    }

    fn is_absolute(&self, node: NodeId) -> bool {
        matches!(
            self.style(node).and_then(|style| style.get("position")),
            Some("absolute" | "fixed")
        )
    }

    fn is_hidden(&self, node: NodeId) -> bool {
        self.tag(node)
            .map(|tag| HIDDEN_TAGS.contains(&tag))
            .unwrap_or(false)
            || self.style(node).and_then(|style| style.get("display")) == Some("none")
    }

    /// Pixel value from the inline style, falling back to matching rules.
    fn resolved_px(&self, node: NodeId, property: &str) -> Option<f32> {
        if let Some(value) = self.style(node).and_then(|style| style.px(property)) {
            return Some(value);
        }
        let mut found = None;
        for sheet in self.style_sheets() {
            for rule in sheet.rules() {
                if let Some(value) = rule.style.px(property) {
                    if rule
                        .class_chain()
                        .map(|chain| self.matches_chain(node, &chain))
                        .unwrap_or(false)
                    {
                        found = Some(value);
                    }
                }
            }
        }
        found
    }

    fn matches_chain(&self, node: NodeId, chain: &[&str]) -> bool {
        let Some((last, rest)) = chain.split_last() else {
            return false;
        };
        if !self.has_class(node, last) {
            return false;
        }
        let mut pending = rest.iter().rev().peekable();
        for ancestor in self.ancestors(node) {
            match pending.peek() {
                Some(class) if self.has_class(ancestor, class) => {
                    pending.next();
                }
                Some(_) => {}
                None => break,
            }
        }
        pending.peek().is_none()
    }

    #[allow(clippy::too_many_arguments)]
    fn place(
        &self,
        pass: &mut Pass,
        node: NodeId,
        top: f32,
        left: f32,
        available: f32,
        containing_top: f32,
        shrink: bool,
    ) -> Placed {
        if self.is_hidden(node) {
            let placed = Placed {
                top,
                left,
                height: 0.0,
                width: 0.0,
            };
            pass.placed.insert(node, placed);
            return placed;
        }

        let tag = self.tag(node).unwrap_or_default();
        let absolute = self.is_absolute(node);
        let (top, left) = if absolute {
            let style = self.style(node);
            (
                style
                    .and_then(|style| style.px("top"))
                    .map(|offset| containing_top + offset)
                    .unwrap_or(top),
                style
                    .and_then(|style| style.px("left"))
                    .map(|offset| left + offset)
                    .unwrap_or(left),
            )
        } else {
            (top, left)
        };

        if tag == "iframe" {
            let placed = Placed {
                top,
                left,
                height: self.resolved_px(node, "height").unwrap_or(DEFAULT_FRAME_HEIGHT),
                width: self.resolved_px(node, "width").unwrap_or(DEFAULT_FRAME_WIDTH),
            };
            pass.placed.insert(node, placed);
            return placed;
        }

        let padding_top = self
            .style(node)
            .and_then(|style| style.px("padding-top"))
            .unwrap_or(0.0);
        let child_containing_top = if self.is_positioned(node) {
            top
        } else {
            containing_top
        };
        let inline = INLINE_TAGS.contains(&tag);
        let shrink = shrink || absolute || inline;
        let explicit_width = self.resolved_px(node, "width");
        let inner_width = explicit_width.unwrap_or(available);

        let line_height = pass.line_height;
        let content_top = top + padding_top;
        let mut cursor = content_top;
        let mut line_open = false;
        let mut line_width = 0.0f32;
        let mut widest = 0.0f32;

        for &child in self.children(node) {
            let data = match self.node(child) {
                Ok(entry) => &entry.data,
                Err(_) => continue,
            };
            match data {
                NodeData::Text(text) => {
                    if !text.is_empty() {
                        line_open = true;
                        line_width += text.chars().count() as f32 * pass.char_width;
                    }
                }
                NodeData::Element(element) => {
                    let child_tag = element.tag.as_str();
                    if child_tag == "br" {
                        pass.placed.insert(
                            child,
                            Placed {
                                top: cursor,
                                left: left + line_width,
                                height: line_height,
                                width: 0.0,
                            },
                        );
                        cursor += line_height;
                        line_open = false;
                        widest = widest.max(line_width);
                        line_width = 0.0;
                    } else if self.is_hidden(child) {
                        self.place(pass, child, cursor, left, 0.0, child_containing_top, shrink);
                    } else if self.is_absolute(child) {
                        let static_top = if line_open { cursor + line_height } else { cursor };
                        self.place(
                            pass,
                            child,
                            static_top,
                            left,
                            inner_width,
                            child_containing_top,
                            shrink,
                        );
                    } else if INLINE_TAGS.contains(&child_tag) {
                        let placed = self.place(
                            pass,
                            child,
                            cursor,
                            left + line_width,
                            inner_width,
                            child_containing_top,
                            shrink,
                        );
                        line_open = true;
                        line_width += placed.width;
                        if placed.height > line_height {
                            cursor += placed.height - line_height;
                        }
                    } else {
                        if line_open {
                            cursor += line_height;
                            line_open = false;
                            widest = widest.max(line_width);
                            line_width = 0.0;
                        }
                        let placed = self.place(
                            pass,
                            child,
                            cursor,
                            left,
                            inner_width,
                            child_containing_top,
                            shrink,
                        );
                        widest = widest.max(placed.width);
                        cursor += placed.height;
                    }
                }
            }
        }
        if line_open {
            cursor += line_height;
        }
        widest = widest.max(line_width);

        let height = self
            .resolved_px(node, "height")
            .unwrap_or(padding_top + (cursor - content_top));
        let width = match explicit_width {
            Some(width) => width,
            None if shrink => widest,
            None => available,
        };

        let placed = Placed {
            top,
            left,
            height,
            width,
        };
        pass.placed.insert(node, placed);
        placed
    }
}
