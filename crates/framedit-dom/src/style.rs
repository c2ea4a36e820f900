use crate::node::NodeId;
use std::fmt;

/// Ordered CSS declarations, as found in a `style` attribute or a rule body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style {
    declarations: Vec<(String, String)>,
}

impl Style {
    /// Parses `"name: value; name: value"`.
    pub fn parse(text: &str) -> Self {
        let mut style = Self::default();
        for declaration in text.split(';') {
            if let Some((name, value)) = declaration.split_once(':') {
                let name = name.trim();
                let value = value.trim();
                if !name.is_empty() && !value.is_empty() {
                    style.set(name, value);
                }
            }
        }
        style
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.declarations
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .declarations
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some((_, existing)) => *existing = value,
            None => self.declarations.push((name.to_ascii_lowercase(), value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self
            .declarations
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(name))?;
        Some(self.declarations.remove(index).1)
    }

    /// Pixel value of a property written as `Npx` (or a bare `0`).
    pub fn px(&self, name: &str) -> Option<f32> {
        let value = self.get(name)?.trim();
        if value == "0" {
            return Some(0.0);
        }
        value.strip_suffix("px")?.trim().parse().ok()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.declarations
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (name, value)) in self.declarations.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{name}: {value};")?;
        }
        Ok(())
    }
}

/// Stable identity of a rule; survives insertion of other rules before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(pub(crate) u32);

#[derive(Debug, Clone)]
pub struct StyleRule {
    pub(crate) id: RuleId,
    pub selector: String,
    pub style: Style,
}

impl StyleRule {
    /// Only descendant combinations of class selectors are understood, e.g.
    /// `.numbers .cell`. Anything else never matches.
    pub(crate) fn class_chain(&self) -> Option<Vec<&str>> {
        self.selector
            .split_whitespace()
            .map(|part| part.strip_prefix('.'))
            .collect::<Option<Vec<_>>>()
            .filter(|chain| !chain.is_empty() && chain.iter().all(|class| !class.is_empty()))
    }
}

/// A style sheet owned by a `<style>` or `<link>` element.
#[derive(Debug, Clone)]
pub struct StyleSheet {
    pub(crate) owner: NodeId,
    pub(crate) rules: Vec<StyleRule>,
}

impl StyleSheet {
    pub(crate) fn new(owner: NodeId) -> Self {
        Self {
            owner,
            rules: Vec::new(),
        }
    }

    pub fn owner(&self) -> NodeId {
        self.owner
    }

    pub fn rules(&self) -> &[StyleRule] {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_prints_declarations() {
        let style = Style::parse("position: absolute; top:0px;; height : 16px");
        assert_eq!(style.get("position"), Some("absolute"));
        assert_eq!(style.px("top"), Some(0.0));
        assert_eq!(style.px("height"), Some(16.0));
        assert_eq!(
            style.to_string(),
            "position: absolute; top: 0px; height: 16px;"
        );
    }

    #[test]
    fn non_pixel_values_have_no_px() {
        let style = Style::parse("height: 100%; width: auto");
        assert_eq!(style.px("height"), None);
        assert_eq!(style.px("width"), None);
    }

    #[test]
    fn class_chain_rejects_other_selectors() {
        let rule = |selector: &str| StyleRule {
            id: RuleId(0),
            selector: selector.into(),
            style: Style::default(),
        };
        assert_eq!(rule(".a .b").class_chain(), Some(vec!["a", "b"]));
        assert_eq!(rule("div .b").class_chain(), None);
        assert_eq!(rule("").class_chain(), None);
    }
}
