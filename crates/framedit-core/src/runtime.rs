//! Owns the page, the editors placed on it and the timers they run on.

use crate::engine::EditingEngine;
use crate::error::{EditorError, EditorResult};
use crate::facade::FrameEditor;
use crate::text_engine::TextEngine;
use framedit_config::EditorConfig;
use framedit_dom::{Document, NodeId};
use framedit_host::{FrameHost, GutterEvent, Millis, Placement, Scheduler, Scoped};
use slab::Slab;
use std::fmt;

/// Key of an editor inside a [`Runtime`]. Keys of disposed editors may be
/// handed out again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EditorId(usize);

impl fmt::Display for EditorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "editor#{}", self.0)
    }
}

/// Runs once, right before the editor's gutter is installed.
pub type InitCallback = Box<dyn FnOnce(&mut FrameEditor)>;

#[derive(Debug, Clone, Copy)]
pub(crate) struct SubmitHook {
    pub(crate) form: NodeId,
    pub(crate) field: NodeId,
    pub(crate) editor: EditorId,
}

/// Single-threaded event loop over a page.
///
/// Timers run as Tokio tasks, but their events are only handled inside
/// [`Runtime::advance`], one at a time. Before each one, the page and every
/// hosted document are laid out again so that handlers read current geometry.
pub struct Runtime {
    pub(crate) page: Document,
    scheduler: Scheduler<EditorId, GutterEvent>,
    pub(crate) editors: Slab<FrameEditor>,
    pub(crate) submit_hooks: Vec<SubmitHook>,
}

impl Runtime {
    /// A runtime over an empty page. Must be called from within a Tokio
    /// runtime.
    pub fn new() -> EditorResult<Self> {
        Self::with_page(Document::new())
    }

    pub fn with_page(page: Document) -> EditorResult<Self> {
        Ok(Self {
            page,
            scheduler: Scheduler::new()?,
            editors: Slab::new(),
            submit_hooks: Vec::new(),
        })
    }

    pub fn page(&self) -> &Document {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Document {
        &mut self.page
    }

    pub fn now(&self) -> Millis {
        self.scheduler.now()
    }

    /// Number of timers still scheduled, across all editors.
    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    /// Creates an editor driven by the reference [`TextEngine`].
    pub fn create(&mut self, placement: Placement, config: EditorConfig) -> EditorResult<EditorId> {
        let engine = Box::new(TextEngine::from_config(&config));
        self.create_with_engine(placement, config, engine)
    }

    pub fn create_with_engine(
        &mut self,
        placement: Placement,
        config: EditorConfig,
        engine: Box<dyn EditingEngine>,
    ) -> EditorResult<EditorId> {
        for key in config.extra.keys() {
            tracing::debug!("Ignoring unknown editor option {}", key);
        }
        let host = FrameHost::create(&mut self.page, placement, config)?;
        let editor = FrameEditor::new(host, engine)?;
        let uuid = editor.uuid();
        let id = EditorId(self.editors.insert(editor));
        tracing::info!("Created {} ({})", id, uuid);
        Ok(id)
    }

    pub fn editor(&self, id: EditorId) -> EditorResult<&FrameEditor> {
        self.editors
            .get(id.0)
            .ok_or(EditorError::UnknownEditor(id))
    }

    /// Mutable access to an editor. Edits made through it are stamped with
    /// the runtime's current time.
    pub fn editor_mut(&mut self, id: EditorId) -> EditorResult<&mut FrameEditor> {
        let now = self.scheduler.now();
        let editor = self
            .editors
            .get_mut(id.0)
            .ok_or(EditorError::UnknownEditor(id))?;
        editor.engine_mut().set_clock(now);
        Ok(editor)
    }

    pub fn editors(&self) -> impl Iterator<Item = (EditorId, &FrameEditor)> {
        self.editors
            .iter()
            .map(|(key, editor)| (EditorId(key), editor))
    }

    /// Signals that the editor's frame finished loading. Returns `false` if
    /// it already had.
    pub fn mark_loaded(&mut self, id: EditorId) -> EditorResult<bool> {
        let editor = self
            .editors
            .get_mut(id.0)
            .ok_or(EditorError::UnknownEditor(id))?;
        Ok(editor.host_mut().mark_loaded())
    }

    /// Completes initialization: runs `callback`, then installs the gutter.
    /// A second call does nothing.
    pub fn init(&mut self, id: EditorId, callback: Option<InitCallback>) -> EditorResult<()> {
        let now = self.scheduler.now();
        let editor = self
            .editors
            .get_mut(id.0)
            .ok_or(EditorError::UnknownEditor(id))?;
        if editor.host().is_initialized() {
            tracing::debug!("{} is already initialized", id);
            return Ok(());
        }
        editor.engine_mut().set_clock(now);
        if let Some(callback) = callback {
            callback(editor);
        }

        editor.host_mut().reflow();
        self.page.reflow();
        let mut timers = Scoped::new(&mut self.scheduler, id);
        editor.host_mut().init(&mut self.page, &mut timers)?;
        tracing::debug!("Initialized {}", id);
        Ok(())
    }

    /// Lays out the page and every hosted document.
    pub fn reflow(&mut self) {
        self.page.reflow();
        for (_, editor) in self.editors.iter_mut() {
            editor.host_mut().reflow();
        }
    }

    /// Runs for `ms` milliseconds, handling every timer event that falls due
    /// on the way. Returns the number of events handled.
    pub async fn advance(&mut self, ms: Millis) -> EditorResult<usize> {
        let deadline = self.scheduler.instant_at(self.scheduler.now() + ms);
        let mut ran = 0;
        while let Some((id, event)) = self.scheduler.next_until(deadline).await {
            self.reflow();
            let Some(editor) = self.editors.get_mut(id.0) else {
                tracing::debug!("Dropping {:?} for disposed {}", event, id);
                continue;
            };
            let mut timers = Scoped::new(&mut self.scheduler, id);
            editor.host_mut().handle(event, &mut self.page, &mut timers)?;
            ran += 1;
        }
        Ok(ran)
    }

    /// Scrolls the editor's document to `top` and lets its gutter follow.
    pub fn scroll_frame(&mut self, id: EditorId, top: f32) -> EditorResult<()> {
        self.reflow();
        let editor = self
            .editors
            .get_mut(id.0)
            .ok_or(EditorError::UnknownEditor(id))?;
        let mut timers = Scoped::new(&mut self.scheduler, id);
        editor.host_mut().scroll_to(top, &mut self.page, &mut timers)?;
        Ok(())
    }

    /// Stops the editor's timers and removes it from the page.
    pub fn dispose(&mut self, id: EditorId) -> EditorResult<()> {
        let mut editor = self
            .editors
            .try_remove(id.0)
            .ok_or(EditorError::UnknownEditor(id))?;
        let mut timers = Scoped::new(&mut self.scheduler, id);
        editor.host_mut().dispose(&mut self.page, &mut timers)?;
        self.submit_hooks.retain(|hook| hook.editor != id);
        tracing::info!("Disposed {}", id);
        Ok(())
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("now", &self.scheduler.now())
            .field("editors", &self.editors.len())
            .field("pending_timers", &self.scheduler.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framedit_host::LINE_CELL_CLASS;

    fn numbered_config() -> EditorConfig {
        EditorConfig {
            line_numbers: true,
            ..EditorConfig::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_editor_is_an_error() {
        let mut runtime = Runtime::new().unwrap();
        let body = runtime.page().body();
        let id = runtime
            .create(Placement::Append(body), EditorConfig::default())
            .unwrap();
        runtime.dispose(id).unwrap();
        assert!(matches!(
            runtime.editor(id),
            Err(EditorError::UnknownEditor(missing)) if missing == id
        ));
        assert!(runtime.dispose(id).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn init_runs_callback_once() {
        let mut runtime = Runtime::new().unwrap();
        let body = runtime.page().body();
        let id = runtime
            .create(Placement::Append(body), numbered_config())
            .unwrap();
        assert!(runtime.mark_loaded(id).unwrap());
        assert!(!runtime.mark_loaded(id).unwrap());

        runtime
            .init(
                id,
                Some(Box::new(|editor: &mut FrameEditor| {
                    editor.set_code("one\ntwo").unwrap();
                })),
            )
            .unwrap();
        runtime
            .init(
                id,
                Some(Box::new(|editor: &mut FrameEditor| {
                    editor.set_code("replaced").unwrap();
                })),
            )
            .unwrap();

        let editor = runtime.editor(id).unwrap();
        assert_eq!(editor.get_code(), "one\ntwo");
        assert!(editor.host().is_initialized());
    }

    #[tokio::test(start_paused = true)]
    async fn advance_runs_due_gutter_tasks() {
        let mut runtime = Runtime::new().unwrap();
        let body = runtime.page().body();
        let id = runtime
            .create(Placement::Append(body), numbered_config())
            .unwrap();
        runtime.mark_loaded(id).unwrap();
        runtime.init(id, None).unwrap();

        let ran = runtime.advance(1_000).await.unwrap();
        assert!(ran >= 2);
        assert_eq!(runtime.now(), 1_000);

        let editor = runtime.editor(id).unwrap();
        let gutter = editor.host().gutter().unwrap();
        assert!(gutter.is_active());
        let cells = runtime
            .page()
            .children(gutter.scroller().unwrap())
            .iter()
            .filter(|&&cell| runtime.page().has_class(cell, LINE_CELL_CLASS))
            .count();
        assert_eq!(cells, gutter.cell_count());
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_clears_timers_and_page() {
        let mut runtime = Runtime::new().unwrap();
        let body = runtime.page().body();
        let id = runtime
            .create(Placement::Append(body), numbered_config())
            .unwrap();
        runtime.mark_loaded(id).unwrap();
        runtime.init(id, None).unwrap();
        runtime.advance(100).await.unwrap();
        assert!(runtime.pending_timers() > 0);
        let outer = runtime.editor(id).unwrap().host().outer();

        runtime.dispose(id).unwrap();
        assert_eq!(runtime.pending_timers(), 0);
        assert!(!runtime.page().is_connected(outer));
        assert!(!runtime.page().children(body).contains(&outer));
        assert_eq!(runtime.advance(5_000).await.unwrap(), 0);
    }
}
