//! The line-number column kept beside the editing frame.
//!
//! The gutter cannot see the hosted lines, only the frame body's height.
//! Whenever that height changes it re-samples the geometry and appends enough
//! numbered cells to cover the new height; cells are never removed and
//! numbering never restarts.

use crate::error::HostResult;
use crate::geometry::{GeometrySampler, Metrics, PendingProbe};
use crate::placement::GutterNodes;
use crate::timer::{TimerId, Timers};
use crate::LINE_CELL_CLASS;
use framedit_config::GutterSettings;
use framedit_dom::{Document, NodeId};

/// Timer and notification events the gutter reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GutterEvent {
    /// The page had no style sheets on the last install attempt.
    StyleRetry,
    /// The frame has been laid out since the probe went in.
    ProbeSettled,
    /// Periodic height check.
    Poll,
    /// The hosted document scrolled.
    Scroll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GutterPhase {
    Uninitialized,
    Active,
    /// The style-sheet retry cap was reached before the page had a sheet.
    Abandoned,
    Disposed,
}

#[derive(Debug)]
pub struct Gutter {
    nodes: GutterNodes,
    frame: NodeId,
    settings: GutterSettings,
    sampler: GeometrySampler,
    phase: GutterPhase,
    scroller: Option<NodeId>,
    retry_timer: Option<TimerId>,
    poll_timer: Option<TimerId>,
    settling: Option<(TimerId, PendingProbe)>,
    next_number: u64,
    prev_height: Option<f32>,
    metrics: Option<Metrics>,
    cells: Vec<NodeId>,
}

impl Gutter {
    /// `frame` is the frame element in the page, `nodes` the column beside it.
    pub fn new(nodes: GutterNodes, frame: NodeId, settings: GutterSettings) -> Self {
        Self {
            nodes,
            frame,
            settings,
            sampler: GeometrySampler::new(),
            phase: GutterPhase::Uninitialized,
            scroller: None,
            retry_timer: None,
            poll_timer: None,
            settling: None,
            next_number: 1,
            prev_height: None,
            metrics: None,
            cells: Vec::new(),
        }
    }

    pub fn phase(&self) -> GutterPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == GutterPhase::Active
    }

    pub fn nodes(&self) -> GutterNodes {
        self.nodes
    }

    pub fn scroller(&self) -> Option<NodeId> {
        self.scroller
    }

    /// Last sampled geometry; `None` until the first probe settles.
    pub fn metrics(&self) -> Option<Metrics> {
        self.metrics
    }

    /// The number the next appended cell will carry.
    pub fn next_number(&self) -> u64 {
        self.next_number
    }

    pub fn cells(&self) -> &[NodeId] {
        &self.cells
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Frame body height seen by the last height check.
    pub fn observed_height(&self) -> Option<f32> {
        self.prev_height
    }

    pub fn style_retries(&self) -> u32 {
        self.sampler.failed_attempts()
    }

    /// Starts the gutter, or schedules another attempt if the page is not
    /// ready. Once active it samples immediately and then polls.
    pub fn install(
        &mut self,
        page: &mut Document,
        frame_doc: &mut Document,
        timers: &mut impl Timers<GutterEvent>,
    ) -> HostResult<()> {
        if self.phase != GutterPhase::Uninitialized {
            return Ok(());
        }

        if self.sampler.ensure_rule(page)?.is_none() {
            let failures = self.sampler.failed_attempts();
            if self
                .settings
                .max_style_retries
                .is_some_and(|max| failures > max)
            {
                tracing::warn!(
                    "Giving up on line numbers after {} style sheet retries",
                    failures - 1
                );
                self.phase = GutterPhase::Abandoned;
                return Ok(());
            }
            tracing::debug!(
                "No style sheets yet, retrying line numbers in {}ms",
                self.settings.style_retry_ms
            );
            let retry = timers.set_timeout(self.settings.style_retry_ms, GutterEvent::StyleRetry);
            self.retry_timer = Some(retry);
            return Ok(());
        }

        let scroller = page.create_element("div");
        page.append_child(self.nodes.numbers, scroller)?;
        self.scroller = Some(scroller);
        self.phase = GutterPhase::Active;
        tracing::info!(
            "Line numbers installed after {} style sheet retries",
            self.sampler.failed_attempts()
        );

        self.update(page, frame_doc, timers)?;
        let poll = timers.set_interval(self.settings.poll_interval_ms, GutterEvent::Poll);
        self.poll_timer = Some(poll);
        Ok(())
    }

    pub fn handle(
        &mut self,
        event: GutterEvent,
        page: &mut Document,
        frame_doc: &mut Document,
        timers: &mut impl Timers<GutterEvent>,
    ) -> HostResult<()> {
        match event {
            GutterEvent::StyleRetry => {
                self.retry_timer = None;
                self.install(page, frame_doc, timers)
            }
            GutterEvent::ProbeSettled => self.settle(page, frame_doc),
            GutterEvent::Poll | GutterEvent::Scroll => self.update(page, frame_doc, timers),
        }
    }

    /// Height check, then scroll sync.
    ///
    /// A height change while a probe is still pending is left for a later
    /// check to pick up, so growth is delayed but never lost.
    pub fn update(
        &mut self,
        page: &mut Document,
        frame_doc: &mut Document,
        timers: &mut impl Timers<GutterEvent>,
    ) -> HostResult<()> {
        if !self.is_active() {
            return Ok(());
        }

        let height = frame_doc.offset_height(frame_doc.body());
        if self.prev_height != Some(height) && self.settling.is_none() {
            self.prev_height = Some(height);
            let pending = self
                .sampler
                .begin(page, self.nodes, &self.settings, frame_doc)?;
            let timer = timers.set_timeout(0, GutterEvent::ProbeSettled);
            self.settling = Some((timer, pending));
        }

        self.sync_scroll(page, frame_doc)
    }

    fn settle(&mut self, page: &mut Document, frame_doc: &mut Document) -> HostResult<()> {
        let (Some((_, pending)), Some(scroller)) = (self.settling.take(), self.scroller) else {
            return Ok(());
        };
        let metrics = self.sampler.settle(pending, page, scroller, frame_doc)?;
        tracing::debug!(
            "Sampled line height {}px, top offset {}px",
            metrics.line_height,
            metrics.top_offset
        );
        self.metrics = Some(metrics);

        // Styles changed above; lay the page out again before reading it.
        page.reflow();
        let missing = self.settings.overscan_px
            + frame_doc
                .offset_height(frame_doc.body())
                .max(page.offset_height(self.frame))
            - page.offset_height(scroller);
        let count = cells_for(missing, self.settings.fill_step_px);
        self.append_cells(page, scroller, count)?;
        self.sync_scroll(page, frame_doc)
    }

    fn append_cells(
        &mut self,
        page: &mut Document,
        scroller: NodeId,
        count: usize,
    ) -> HostResult<()> {
        if count == 0 {
            return Ok(());
        }
        let mut buffer = itoa::Buffer::new();
        for _ in 0..count {
            let cell = page.create_element("div");
            page.add_class(cell, LINE_CELL_CLASS)?;
            let label = page.create_text(buffer.format(self.next_number));
            page.append_child(cell, label)?;
            page.append_child(scroller, cell)?;
            self.cells.push(cell);
            self.next_number += 1;
        }
        tracing::debug!(
            "Appended {} line number cells, next is {}",
            count,
            self.next_number
        );
        Ok(())
    }

    fn sync_scroll(&self, page: &mut Document, frame_doc: &Document) -> HostResult<()> {
        let top = frame_doc
            .scroll_top(frame_doc.body())
            .max(frame_doc.scroll_top(frame_doc.root()));
        page.set_scroll_top(self.nodes.numbers, top)?;
        Ok(())
    }

    /// Cancels every timer and drops a pending probe. The gutter stays inert
    /// afterwards; its cells are left in the page.
    pub fn dispose(
        &mut self,
        frame_doc: &mut Document,
        timers: &mut impl Timers<GutterEvent>,
    ) -> HostResult<()> {
        for timer in [self.retry_timer.take(), self.poll_timer.take()]
            .into_iter()
            .flatten()
        {
            timers.clear(timer);
        }
        if let Some((timer, pending)) = self.settling.take() {
            timers.clear(timer);
            self.sampler.cancel(pending, frame_doc)?;
        }
        self.phase = GutterPhase::Disposed;
        tracing::debug!("Line numbers disposed with {} cells", self.cells.len());
        Ok(())
    }
}

/// Number of cells needed to cover `missing` pixels, rounded up per `step`.
pub fn cells_for(missing: f32, step: f32) -> usize {
    if missing <= 0.0 || step <= 0.0 {
        return 0;
    }
    (missing / step).ceil() as usize
}
