use crate::error::{HostError, HostResult};
use crate::LINE_NUMBERS_CLASS;
use framedit_dom::{DomResult, Document, NodeId};
use std::fmt;

type AttachFn = Box<dyn FnOnce(&mut Document, NodeId) -> DomResult<()>>;

/// Where the editor frame goes in the page.
pub enum Placement {
    /// Append to the end of a container.
    Append(NodeId),
    /// Take the place of an existing element, which is discarded.
    Replace(NodeId),
    /// Insert right after an existing element.
    InsertAfter(NodeId),
    /// Arbitrary attach function.
    Custom(AttachFn),
}

/// The page elements that carry the line-number column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GutterNodes {
    /// Relatively positioned wrapper around the frame and the column.
    pub container: NodeId,
    /// The absolutely positioned, overflow-hidden number column.
    pub numbers: NodeId,
}

impl Placement {
    pub fn with(attach: impl FnOnce(&mut Document, NodeId) -> DomResult<()> + 'static) -> Self {
        Self::Custom(Box::new(attach))
    }

    pub(crate) fn attach(self, page: &mut Document, node: NodeId) -> HostResult<()> {
        match self {
            Self::Append(container) => page.append_child(container, node)?,
            Self::Replace(element) => {
                let parent = page.parent(element).ok_or(HostError::Detached(element))?;
                page.replace_child(parent, node, element)?;
            }
            Self::InsertAfter(element) => {
                let parent = page.parent(element).ok_or(HostError::Detached(element))?;
                let next = page.next_sibling(element);
                page.insert_before(parent, node, next)?;
            }
            Self::Custom(attach) => attach(page, node)?,
        }
        Ok(())
    }

    /// Attaches `frame` inside a wrapper that also holds the number column.
    pub(crate) fn attach_with_line_numbers(
        self,
        page: &mut Document,
        frame: NodeId,
    ) -> HostResult<GutterNodes> {
        let container = page.create_element("div");
        page.style_mut(container)?.set("position", "relative");

        let numbers = page.create_element("div");
        page.add_class(numbers, LINE_NUMBERS_CLASS)?;
        let style = page.style_mut(numbers)?;
        style.set("position", "absolute");
        style.set("height", "100%");
        style.set("top", "0px");
        style.set("overflow", "hidden");

        self.attach(page, container)?;
        page.append_child(container, frame)?;
        page.append_child(container, numbers)?;
        Ok(GutterNodes { container, numbers })
    }
}

impl fmt::Debug for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Append(node) => f.debug_tuple("Append").field(node).finish(),
            Self::Replace(node) => f.debug_tuple("Replace").field(node).finish(),
            Self::InsertAfter(node) => f.debug_tuple("InsertAfter").field(node).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_swaps_the_element() {
        let mut page = Document::new();
        let body = page.body();
        let old = page.create_element("div");
        page.append_child(body, old).unwrap();
        let frame = page.create_element("iframe");

        Placement::Replace(old).attach(&mut page, frame).unwrap();
        assert_eq!(page.children(body), &[frame]);
        assert!(!page.contains(old));
    }

    #[test]
    fn insert_after_keeps_following_siblings() {
        let mut page = Document::new();
        let body = page.body();
        let field = page.create_element("textarea");
        let footer = page.create_element("p");
        page.append_child(body, field).unwrap();
        page.append_child(body, footer).unwrap();
        let frame = page.create_element("iframe");

        Placement::InsertAfter(field).attach(&mut page, frame).unwrap();
        assert_eq!(page.children(body), &[field, frame, footer]);
    }

    #[test]
    fn detached_targets_are_rejected() {
        let mut page = Document::new();
        let loose = page.create_element("div");
        let frame = page.create_element("iframe");
        assert_eq!(
            Placement::InsertAfter(loose).attach(&mut page, frame),
            Err(HostError::Detached(loose))
        );
    }

    #[test]
    fn line_numbers_wrap_the_frame() {
        let mut page = Document::new();
        let body = page.body();
        let frame = page.create_element("iframe");
        let nodes = Placement::Append(body)
            .attach_with_line_numbers(&mut page, frame)
            .unwrap();

        assert_eq!(page.children(nodes.container), &[frame, nodes.numbers]);
        assert!(page.has_class(nodes.numbers, LINE_NUMBERS_CLASS));
        assert_eq!(
            page.style(nodes.numbers).unwrap().get("overflow"),
            Some("hidden")
        );
    }

    #[test]
    fn custom_placement_runs_the_callback() {
        let mut page = Document::new();
        let body = page.body();
        let frame = page.create_element("iframe");
        Placement::with(move |page, node| page.append_child(body, node))
            .attach(&mut page, frame)
            .unwrap();
        assert_eq!(page.parent(frame), Some(body));
    }
}
