use crate::error::HostResult;
use crate::gutter::{Gutter, GutterEvent};
use crate::placement::{GutterNodes, Placement};
use crate::timer::Timers;
use framedit_config::EditorConfig;
use framedit_dom::{Document, NodeId, ShellSpec};

/// Class carried by the body of every hosted document.
pub const BODY_CLASS: &str = "editbox";

/// One isolated editing surface: the frame element in the page, the document
/// loaded into it and, when enabled, the line-number gutter beside it.
#[derive(Debug)]
pub struct FrameHost {
    frame: NodeId,
    outer: NodeId,
    gutter_nodes: Option<GutterNodes>,
    document: Document,
    config: EditorConfig,
    ready: bool,
    initialized: bool,
    gutter: Option<Gutter>,
}

impl FrameHost {
    /// Creates the frame, attaches it to the page and writes its document.
    ///
    /// The frame is not ready until [`FrameHost::mark_loaded`] is called.
    pub fn create(
        page: &mut Document,
        placement: Placement,
        config: EditorConfig,
    ) -> HostResult<Self> {
        let frame = page.create_element("iframe");
        page.set_attribute(frame, "frameborder", "0")?;
        page.set_attribute(frame, "src", "about:blank")?;
        let style = page.style_mut(frame)?;
        style.set("border", "0");
        style.set("width", config.width.as_str());
        style.set("height", config.height.as_str());
        style.set("display", "block");

        let (outer, gutter_nodes) = if config.line_numbers {
            let nodes = placement.attach_with_line_numbers(page, frame)?;
            (nodes.container, Some(nodes))
        } else {
            placement.attach(page, frame)?;
            (frame, None)
        };

        let mut document = Self::write_document(&config)?;
        if let Some(width) = config.width.px() {
            document.set_viewport_width(width);
        }
        tracing::info!(
            "Created editor frame with {} scripts and {} style sheets",
            document.script_sources().len(),
            config.stylesheet.len()
        );

        Ok(Self {
            frame,
            outer,
            gutter_nodes,
            document,
            config,
            ready: false,
            initialized: false,
            gutter: None,
        })
    }

    /// Builds the document the frame loads: style sheets, then the shared
    /// scripts, then the parser scripts.
    pub fn write_document(config: &EditorConfig) -> HostResult<Document> {
        let shell = ShellSpec {
            stylesheets: config.stylesheet.iter().map(str::to_string).collect(),
            scripts: config.script_resources().collect(),
            spellcheck: !config.disable_spellcheck,
            body_class: BODY_CLASS.to_string(),
        };
        Ok(Document::shell(&shell)?)
    }

    /// Records that the frame finished loading. Only the first call counts.
    pub fn mark_loaded(&mut self) -> bool {
        if self.ready {
            return false;
        }
        self.ready = true;
        tracing::info!("Editor frame loaded");
        true
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Installs the gutter if line numbers are enabled. Returns `false` if
    /// the host was already initialized.
    pub fn init(
        &mut self,
        page: &mut Document,
        timers: &mut impl Timers<GutterEvent>,
    ) -> HostResult<bool> {
        if self.initialized {
            return Ok(false);
        }
        self.initialized = true;
        if !self.ready {
            tracing::debug!("Initializing editor frame before it finished loading");
        }

        if let Some(nodes) = self.gutter_nodes {
            let mut gutter = Gutter::new(nodes, self.frame, self.config.gutter.clone());
            gutter.install(page, &mut self.document, timers)?;
            self.gutter = Some(gutter);
        }
        Ok(true)
    }

    pub fn handle(
        &mut self,
        event: GutterEvent,
        page: &mut Document,
        timers: &mut impl Timers<GutterEvent>,
    ) -> HostResult<()> {
        match self.gutter.as_mut() {
            Some(gutter) => gutter.handle(event, page, &mut self.document, timers),
            None => Ok(()),
        }
    }

    /// Scrolls the hosted document and notifies the gutter.
    pub fn scroll_to(
        &mut self,
        top: f32,
        page: &mut Document,
        timers: &mut impl Timers<GutterEvent>,
    ) -> HostResult<()> {
        let body = self.document.body();
        self.document.set_scroll_top(body, top)?;
        self.handle(GutterEvent::Scroll, page, timers)
    }

    /// Stops the gutter and removes the frame from the page.
    pub fn dispose(
        &mut self,
        page: &mut Document,
        timers: &mut impl Timers<GutterEvent>,
    ) -> HostResult<()> {
        if let Some(gutter) = self.gutter.as_mut() {
            gutter.dispose(&mut self.document, timers)?;
        }
        if let Some(parent) = page.parent(self.outer) {
            page.remove_child(parent, self.outer)?;
        }
        tracing::info!("Editor frame disposed");
        Ok(())
    }

    pub fn focus(&mut self) {
        self.document.focus();
    }

    /// Lays out the hosted document.
    pub fn reflow(&mut self) {
        self.document.reflow();
    }

    /// The frame element in the page.
    pub fn frame(&self) -> NodeId {
        self.frame
    }

    /// The outermost node this host attached to the page.
    pub fn outer(&self) -> NodeId {
        self.outer
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn gutter(&self) -> Option<&Gutter> {
        self.gutter.as_ref()
    }
}
