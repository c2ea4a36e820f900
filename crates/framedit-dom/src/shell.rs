use crate::document::Document;
use crate::error::DomResult;

pub const DOCTYPE: &str = "<!DOCTYPE HTML PUBLIC \"-//W3C//DTD HTML 4.0 Transitional//EN\" \"http://www.w3.org/TR/html4/loose.dtd\">";

/// Everything needed to build the document loaded into an editor frame.
///
/// Scripts are emitted in the given order, so shared utilities must come
/// before anything that depends on them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellSpec {
    pub stylesheets: Vec<String>,
    pub scripts: Vec<String>,
    pub spellcheck: bool,
    pub body_class: String,
}

impl Document {
    /// Builds the frame document as a node tree; values are escaped when serialized.
    pub fn shell(spec: &ShellSpec) -> DomResult<Self> {
        let mut doc = Document::new();
        doc.set_doctype(DOCTYPE);
        let head = doc.head();

        for href in &spec.stylesheets {
            let link = doc.create_element("link");
            doc.set_attribute(link, "rel", "stylesheet")?;
            doc.set_attribute(link, "type", "text/css")?;
            doc.set_attribute(link, "href", href)?;
            doc.append_child(head, link)?;
        }
        for src in &spec.scripts {
            let script = doc.create_element("script");
            doc.set_attribute(script, "type", "text/javascript")?;
            doc.set_attribute(script, "src", src)?;
            doc.append_child(head, script)?;
        }

        let body = doc.body();
        doc.style_mut(body)?.set("border-width", "0");
        if !spec.body_class.is_empty() {
            doc.set_attribute(body, "class", &spec.body_class)?;
        }
        doc.set_attribute(body, "spellcheck", if spec.spellcheck { "true" } else { "false" })?;
        Ok(doc)
    }

    /// `src` of every script in the head, in document order.
    pub fn script_sources(&self) -> Vec<&str> {
        self.children(self.head())
            .iter()
            .filter(|&&node| self.tag(node) == Some("script"))
            .filter_map(|&node| self.attribute(node, "src"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ShellSpec {
        ShellSpec {
            stylesheets: vec!["css/xml.css".into()],
            scripts: vec!["js/util.js".into(), "js/parsexml.js".into()],
            spellcheck: false,
            body_class: "editbox".into(),
        }
    }

    #[test]
    fn shell_orders_resources_and_sets_body() {
        let doc = Document::shell(&spec()).unwrap();
        assert_eq!(doc.script_sources(), vec!["js/util.js", "js/parsexml.js"]);
        assert_eq!(doc.style_sheet_count(), 1);

        let body = doc.body();
        assert_eq!(doc.attribute(body, "class"), Some("editbox"));
        assert_eq!(doc.attribute(body, "spellcheck"), Some("false"));
        assert_eq!(doc.style(body).unwrap().get("border-width"), Some("0"));
    }

    #[test]
    fn serialized_shell_is_escaped() {
        let mut spec = spec();
        spec.stylesheets = vec!["a.css\"><script>alert(1)</script>".into()];
        let html = Document::shell(&spec).unwrap().to_html();

        assert!(html.starts_with(DOCTYPE));
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("href=\"a.css&quot;&gt;&lt;script&gt;"));
        assert!(html.contains("spellcheck=\"false\""));
    }
}
