//! Upgrading an existing `<textarea>` (or `<input>`) into an editor.

use crate::error::{EditorError, EditorResult};
use crate::runtime::{EditorId, Runtime, SubmitHook};
use framedit_config::{Dimension, EditorConfig};
use framedit_dom::{Document, NodeId};
use framedit_host::Placement;

impl Runtime {
    /// Replaces a text field with an editor placed right after it.
    ///
    /// The field is hidden, not removed. Inline `width`/`height` on the
    /// field override the configured size, and the field's value becomes the
    /// initial content unless `config.content` is set. If the field sits in a
    /// form, [`Runtime::submit_form`] copies the editor's code back into it.
    pub fn from_text_field(
        &mut self,
        field: NodeId,
        mut config: EditorConfig,
    ) -> EditorResult<EditorId> {
        if !matches!(self.page.tag(field), Some("textarea" | "input")) {
            return Err(EditorError::NotATextField(field));
        }

        if let Some(style) = self.page.style(field) {
            if let Some(width) = style.get("width") {
                config.width = Dimension::new(width);
            }
            if let Some(height) = style.get("height") {
                config.height = Dimension::new(height);
            }
        }
        if config.content.is_none() {
            config.content = Some(field_value(&self.page, field));
        }
        self.page.style_mut(field)?.set("display", "none");

        let form = self.page.closest(field, "form");
        let id = self.create(Placement::InsertAfter(field), config)?;
        match form {
            Some(form) => {
                self.submit_hooks.push(SubmitHook {
                    form,
                    field,
                    editor: id,
                });
                tracing::debug!("{} will write back to its field on submit", id);
            }
            None => tracing::debug!("{} replaces a field outside any form", id),
        }
        Ok(id)
    }

    /// Runs the submit hooks of `form`. Returns the number of fields updated.
    pub fn submit_form(&mut self, form: NodeId) -> EditorResult<usize> {
        let hooks: Vec<SubmitHook> = self
            .submit_hooks
            .iter()
            .filter(|hook| hook.form == form)
            .copied()
            .collect();
        for hook in &hooks {
            let code = self.editor(hook.editor)?.get_code();
            set_field_value(&mut self.page, hook.field, &code)?;
        }
        Ok(hooks.len())
    }
}

fn field_value(page: &Document, field: NodeId) -> String {
    match page.tag(field) {
        Some("input") => page.attribute(field, "value").unwrap_or_default().to_string(),
        _ => page.text_content(field),
    }
}

fn set_field_value(page: &mut Document, field: NodeId, value: &str) -> EditorResult<()> {
    if page.tag(field) == Some("input") {
        page.set_attribute(field, "value", value)?;
        return Ok(());
    }
    for child in page.children(field).to_vec() {
        page.remove_child(field, child)?;
    }
    let text = page.create_text(value);
    page.append_child(field, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_with_textarea(runtime: &mut Runtime, value: &str) -> (NodeId, NodeId) {
        let page = runtime.page_mut();
        let form = page.create_element("form");
        let area = page.create_element("textarea");
        let text = page.create_text(value);
        page.append_child(area, text).unwrap();
        page.append_child(form, area).unwrap();
        let body = page.body();
        page.append_child(body, form).unwrap();
        (form, area)
    }

    #[tokio::test(start_paused = true)]
    async fn field_is_hidden_and_editor_follows_it() {
        let mut runtime = Runtime::new().unwrap();
        let (form, area) = form_with_textarea(&mut runtime, "hello");
        runtime
            .page_mut()
            .style_mut(area)
            .unwrap()
            .set("width", "400px");

        let id = runtime
            .from_text_field(area, EditorConfig::default())
            .unwrap();
        let page = runtime.page();
        assert_eq!(page.style(area).unwrap().get("display"), Some("none"));

        let editor = runtime.editor(id).unwrap();
        assert_eq!(page.children(form), &[area, editor.host().outer()]);
        assert_eq!(editor.host().config().width.as_str(), "400px");
        assert_eq!(editor.host().config().height.as_str(), "300px");
        assert_eq!(editor.get_code(), "hello");
    }

    #[tokio::test(start_paused = true)]
    async fn submit_copies_code_back() {
        let mut runtime = Runtime::new().unwrap();
        let (form, area) = form_with_textarea(&mut runtime, "hello");
        let id = runtime
            .from_text_field(area, EditorConfig::default())
            .unwrap();
        runtime
            .editor_mut(id)
            .unwrap()
            .set_code("hello\nworld")
            .unwrap();

        assert_eq!(runtime.submit_form(form).unwrap(), 1);
        assert_eq!(runtime.page().text_content(area), "hello\nworld");
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_content_wins_over_field_value() {
        let mut runtime = Runtime::new().unwrap();
        let body = runtime.page().body();
        let input = runtime.page_mut().create_element("input");
        runtime
            .page_mut()
            .set_attribute(input, "value", "from field")
            .unwrap();
        runtime.page_mut().append_child(body, input).unwrap();

        let config = EditorConfig {
            content: Some("from config".into()),
            ..EditorConfig::default()
        };
        let id = runtime.from_text_field(input, config).unwrap();
        assert_eq!(runtime.editor(id).unwrap().get_code(), "from config");
    }

    #[tokio::test(start_paused = true)]
    async fn rejects_other_elements() {
        let mut runtime = Runtime::new().unwrap();
        let div = runtime.page_mut().create_element("div");
        assert!(matches!(
            runtime.from_text_field(div, EditorConfig::default()),
            Err(EditorError::NotATextField(node)) if node == div
        ));
    }
}
