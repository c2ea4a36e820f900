//! Measuring the hosted document from the outside.
//!
//! Two values can only be read once the frame has painted: the height of one
//! rendered line and the offset of the first line from the top of the frame.
//! Both are found by dropping a small absolutely positioned probe into the
//! frame document, letting one layout pass happen, then reading it back.

use crate::error::HostResult;
use crate::placement::GutterNodes;
use framedit_config::GutterSettings;
use framedit_dom::{Document, NodeId, RuleId};

/// Selector of the rule that pins every number cell to the sampled line height.
pub const CELL_SELECTOR: &str = ".framedit-line-numbers .framedit-line-div";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub line_height: f32,
    pub top_offset: f32,
}

/// A probe inserted into the frame document, waiting for a layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingProbe {
    probe: NodeId,
    first: NodeId,
    second: NodeId,
}

impl PendingProbe {
    pub fn node(&self) -> NodeId {
        self.probe
    }
}

/// Top of `node` relative to the document, summed along its offset parents.
pub fn node_top(doc: &Document, node: NodeId) -> f32 {
    let mut top = 0.0;
    let mut current = Some(node);
    while let Some(node) = current {
        top += doc.offset_top(node);
        current = doc.offset_parent(node);
    }
    top
}

#[derive(Debug, Default)]
pub struct GeometrySampler {
    style_node: Option<NodeId>,
    rule: Option<RuleId>,
    failed_attempts: u32,
}

impl GeometrySampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(&self) -> Option<RuleId> {
        self.rule
    }

    /// Attempts made while the page had no style sheets.
    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    /// Returns the cell rule, creating it on first success.
    ///
    /// `Ok(None)` means the page has not published any style sheet yet and
    /// the caller should try again later. The `<style>` element is only
    /// created once, so repeated attempts leave the page unchanged.
    pub fn ensure_rule(&mut self, page: &mut Document) -> HostResult<Option<RuleId>> {
        if let Some(rule) = self.rule {
            return Ok(Some(rule));
        }
        if self.style_node.is_none() {
            let node = page.create_element("style");
            page.set_attribute(node, "type", "text/css")?;
            let body = page.body();
            page.append_child(body, node)?;
            self.style_node = Some(node);
        }

        let sheets = page.style_sheet_count();
        if sheets == 0 {
            self.failed_attempts += 1;
            return Ok(None);
        }
        let rule = page.insert_rule(sheets - 1, CELL_SELECTOR, "height: auto", 0)?;
        self.rule = Some(rule);
        Ok(Some(rule))
    }

    /// Sizes the number column and inserts a probe at the top of the frame body.
    ///
    /// The probe holds two non-breaking spaces split by a line break. It must
    /// not be read before the frame document has been laid out again.
    pub fn begin(
        &self,
        page: &mut Document,
        nodes: GutterNodes,
        settings: &GutterSettings,
        frame_doc: &mut Document,
    ) -> HostResult<PendingProbe> {
        let mut width = page.offset_width(nodes.numbers);
        if width <= settings.min_width_px {
            width = settings.default_width_px;
            page.style_mut(nodes.numbers)?.set("width", format!("{width}px"));
        }
        page.style_mut(nodes.container)?
            .set("margin-left", format!("{width}px"));
        page.style_mut(nodes.numbers)?.set("left", format!("-{width}px"));

        let probe = frame_doc.create_element("div");
        frame_doc.style_mut(probe)?.set("position", "absolute");
        let first = frame_doc.create_element("span");
        let br = frame_doc.create_element("br");
        let second = frame_doc.create_element("span");
        for span in [first, second] {
            let space = frame_doc.create_text("\u{a0}");
            frame_doc.append_child(span, space)?;
        }
        for child in [first, br, second] {
            frame_doc.append_child(probe, child)?;
        }

        let body = frame_doc.body();
        let anchor = frame_doc.first_child(body);
        frame_doc.insert_before(body, probe, anchor)?;
        Ok(PendingProbe {
            probe,
            first,
            second,
        })
    }

    /// Reads a laid-out probe, applies the results to the gutter and removes it.
    pub fn settle(
        &self,
        pending: PendingProbe,
        page: &mut Document,
        scroller: NodeId,
        frame_doc: &mut Document,
    ) -> HostResult<Metrics> {
        let top_offset = node_top(frame_doc, pending.probe);
        let line_height = frame_doc.offset_top(pending.second) - frame_doc.offset_top(pending.first);

        page.style_mut(scroller)?
            .set("padding-top", format!("{top_offset}px"));
        if let Some(rule) = self.rule {
            page.rule_style_mut(rule)?
                .set("height", format!("{line_height}px"));
        }
        self.cancel(pending, frame_doc)?;

        Ok(Metrics {
            line_height,
            top_offset,
        })
    }

    /// Removes a probe without reading it.
    pub fn cancel(&self, pending: PendingProbe, frame_doc: &mut Document) -> HostResult<()> {
        if let Some(parent) = frame_doc.parent(pending.probe) {
            frame_doc.remove_child(parent, pending.probe)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::Placement;
    use framedit_dom::FontMetrics;

    struct Fixture {
        page: Document,
        frame_doc: Document,
        nodes: GutterNodes,
        scroller: NodeId,
    }

    fn fixture() -> Fixture {
        let mut page = Document::new();
        let body = page.body();
        let frame = page.create_element("iframe");
        let nodes = Placement::Append(body)
            .attach_with_line_numbers(&mut page, frame)
            .unwrap();
        let scroller = page.create_element("div");
        page.append_child(nodes.numbers, scroller).unwrap();

        let mut frame_doc = Document::new();
        frame_doc.set_body_margin(4.0);
        frame_doc.set_font(FontMetrics {
            line_height: 16.0,
            char_width: 8.0,
        });
        let line = frame_doc.create_element("div");
        let text = frame_doc.create_text("fn main() {}");
        frame_doc.append_child(line, text).unwrap();
        let frame_body = frame_doc.body();
        frame_doc.append_child(frame_body, line).unwrap();

        Fixture {
            page,
            frame_doc,
            nodes,
            scroller,
        }
    }

    #[test]
    fn node_top_sums_offset_parents() {
        let Fixture { mut frame_doc, .. } = fixture();
        frame_doc.reflow();
        let line = frame_doc.children(frame_doc.body())[0];
        assert_eq!(node_top(&frame_doc, line), 4.0);
    }

    #[test]
    fn rule_waits_for_a_style_sheet() {
        let mut page = Document::new();
        page.set_style_sheets_live(false);
        let mut sampler = GeometrySampler::new();

        assert_eq!(sampler.ensure_rule(&mut page).unwrap(), None);
        assert_eq!(sampler.ensure_rule(&mut page).unwrap(), None);
        assert_eq!(sampler.failed_attempts(), 2);
        // Retrying must not pile up style elements.
        let styles = page
            .children(page.body())
            .iter()
            .filter(|&&node| page.tag(node) == Some("style"))
            .count();
        assert_eq!(styles, 1);

        page.set_style_sheets_live(true);
        let rule = sampler.ensure_rule(&mut page).unwrap().unwrap();
        assert_eq!(page.rule_style(rule).unwrap().get("height"), Some("auto"));
        assert_eq!(sampler.ensure_rule(&mut page).unwrap(), Some(rule));
    }

    #[test]
    fn degenerate_width_falls_back_to_default() {
        let Fixture {
            mut page,
            mut frame_doc,
            nodes,
            ..
        } = fixture();
        page.reflow();
        let sampler = GeometrySampler::new();
        sampler
            .begin(&mut page, nodes, &GutterSettings::default(), &mut frame_doc)
            .unwrap();

        let numbers = page.style(nodes.numbers).unwrap();
        assert_eq!(numbers.get("width"), Some("25px"));
        assert_eq!(numbers.get("left"), Some("-25px"));
        assert_eq!(
            page.style(nodes.container).unwrap().get("margin-left"),
            Some("25px")
        );
    }

    #[test]
    fn probe_measures_line_height_and_offset() {
        let Fixture {
            mut page,
            mut frame_doc,
            nodes,
            scroller,
        } = fixture();
        let mut sampler = GeometrySampler::new();
        let rule = sampler.ensure_rule(&mut page).unwrap().unwrap();
        page.reflow();

        let pending = sampler
            .begin(&mut page, nodes, &GutterSettings::default(), &mut frame_doc)
            .unwrap();
        assert_eq!(frame_doc.first_child(frame_doc.body()), Some(pending.node()));

        frame_doc.reflow();
        let metrics = sampler
            .settle(pending, &mut page, scroller, &mut frame_doc)
            .unwrap();

        assert_eq!(
            metrics,
            Metrics {
                line_height: 16.0,
                top_offset: 4.0
            }
        );
        assert!(!frame_doc.contains(pending.node()));
        assert_eq!(page.style(scroller).unwrap().get("padding-top"), Some("4px"));
        assert_eq!(page.rule_style(rule).unwrap().get("height"), Some("16px"));
    }
}
