use crate::style::Style;
use std::collections::BTreeMap;

/// Identifies a node within one [`crate::Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// Geometry produced by the last reflow, in CSS pixels.
///
/// `offset_top`/`offset_left` are relative to `offset_parent`, the nearest
/// positioned ancestor (or the body).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoxMetrics {
    pub offset_top: f32,
    pub offset_left: f32,
    pub offset_width: f32,
    pub offset_height: f32,
    pub offset_parent: Option<NodeId>,
}

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub style: Style,
}

#[derive(Debug, Clone)]
pub(crate) enum NodeData {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub data: NodeData,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub metrics: BoxMetrics,
    pub scroll_top: f32,
}

impl Node {
    pub fn element(tag: &str) -> Self {
        Self::new(NodeData::Element(Element {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            style: Style::default(),
        }))
    }

    pub fn text(text: &str) -> Self {
        Self::new(NodeData::Text(text.to_string()))
    }

    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            children: Vec::new(),
            metrics: BoxMetrics::default(),
            scroll_top: 0.0,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match &self.data {
            NodeData::Element(element) => Some(element),
            NodeData::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match &mut self.data {
            NodeData::Element(element) => Some(element),
            NodeData::Text(_) => None,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        self.as_element().map(|element| element.tag.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.as_element()
            .and_then(|element| element.attributes.get("class"))
            .map(|classes| classes.split_whitespace().any(|entry| entry == class))
            .unwrap_or(false)
    }
}
