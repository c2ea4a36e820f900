use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Shared utility resources loaded into every frame, in load order.
pub const DEFAULT_BASE_RESOURCES: &[&str] = &[
    "util.js",
    "stringstream.js",
    "select.js",
    "undo.js",
    "editor.js",
    "tokenize.js",
];

/// A list of resource paths that may be written as a single string or a list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OneOrMany", into = "Vec<String>")]
pub struct ResourceList(Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrMany> for ResourceList {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(entry) => Self::new([entry]),
            OneOrMany::Many(entries) => Self::new(entries),
        }
    }
}

impl From<ResourceList> for Vec<String> {
    fn from(value: ResourceList) -> Self {
        value.0
    }
}

impl ResourceList {
    /// Builds a list, dropping blank entries.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(
            entries
                .into_iter()
                .map(Into::into)
                .filter(|entry| !entry.trim().is_empty())
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|entry| entry.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for ResourceList {
    fn from(value: &str) -> Self {
        Self::new([value])
    }
}

impl From<Vec<&str>> for ResourceList {
    fn from(value: Vec<&str>) -> Self {
        Self::new(value)
    }
}

/// A CSS length as written in configuration, e.g. `"300px"` or `"100%"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dimension(String);

impl Dimension {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Absolute pixel value, if the dimension is expressed in pixels.
    pub fn px(&self) -> Option<f32> {
        let trimmed = self.0.trim();
        let number = trimmed.strip_suffix("px").unwrap_or(trimmed);
        number.trim().parse::<f32>().ok().filter(|value| value.is_finite())
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Dimension {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Timing and sizing knobs for the line-number gutter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GutterSettings {
    /// Height poll period.
    pub poll_interval_ms: u64,
    /// Delay before retrying when the page has no style sheets yet.
    pub style_retry_ms: u64,
    /// Give up after this many style-sheet retries. `None` retries until disposed.
    pub max_style_retries: Option<u32>,
    /// Width applied when the measured column width is degenerate.
    pub default_width_px: f32,
    /// Measured widths at or below this are considered degenerate.
    pub min_width_px: f32,
    /// Extra height rendered past the end of the document.
    pub overscan_px: f32,
    /// Pixel step used to turn missing height into a cell count.
    pub fill_step_px: f32,
}

impl Default for GutterSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            style_retry_ms: 50,
            max_style_retries: None,
            default_width_px: 25.0,
            min_width_px: 10.0,
            overscan_px: 20.0,
            fill_step_px: 10.0,
        }
    }
}

/// Fully resolved configuration for one editor instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Style sheets linked into the hosted document.
    pub stylesheet: ResourceList,
    /// Prefix prepended to every script resource.
    pub path: String,
    /// Language-specific resources, loaded after `base_resources`.
    pub parser_resources: ResourceList,
    /// Shared utilities, loaded first and in this order.
    pub base_resources: Vec<String>,
    pub lines_per_pass: u32,
    pub pass_delay: u64,
    pub continuous_scanning: bool,
    pub undo_depth: usize,
    /// Edits closer together than this are grouped into one undo step.
    pub undo_delay: u64,
    pub disable_spellcheck: bool,
    pub text_wrapping: bool,
    pub read_only: bool,
    pub width: Dimension,
    pub height: Dimension,
    pub auto_match_parens: bool,
    pub dumb_tabs: bool,
    pub normal_tab: bool,
    pub line_numbers: bool,
    /// Initial document content.
    pub content: Option<String>,
    pub parser_config: Option<Value>,
    pub gutter: GutterSettings,
    /// Unrecognized options, kept for the engine but otherwise unused.
    pub extra: BTreeMap<String, Value>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            stylesheet: ResourceList::default(),
            path: String::new(),
            parser_resources: ResourceList::default(),
            base_resources: DEFAULT_BASE_RESOURCES
                .iter()
                .map(|entry| entry.to_string())
                .collect(),
            lines_per_pass: 15,
            pass_delay: 200,
            continuous_scanning: false,
            undo_depth: 50,
            undo_delay: 800,
            disable_spellcheck: true,
            text_wrapping: true,
            read_only: false,
            width: Dimension::new("100%"),
            height: Dimension::new("300px"),
            auto_match_parens: false,
            dumb_tabs: false,
            normal_tab: false,
            line_numbers: false,
            content: None,
            parser_config: None,
            gutter: GutterSettings::default(),
            extra: BTreeMap::new(),
        }
    }
}

impl EditorConfig {
    /// Returns a new configuration with every field set in `options` replaced.
    pub fn overlay(mut self, options: &EditorOptions) -> Self {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }

        set(&mut self.stylesheet, &options.stylesheet);
        set(&mut self.path, &options.path);
        set(&mut self.parser_resources, &options.parser_resources);
        set(&mut self.base_resources, &options.base_resources);
        set(&mut self.lines_per_pass, &options.lines_per_pass);
        set(&mut self.pass_delay, &options.pass_delay);
        set(&mut self.continuous_scanning, &options.continuous_scanning);
        set(&mut self.undo_depth, &options.undo_depth);
        set(&mut self.undo_delay, &options.undo_delay);
        set(&mut self.disable_spellcheck, &options.disable_spellcheck);
        set(&mut self.text_wrapping, &options.text_wrapping);
        set(&mut self.read_only, &options.read_only);
        set(&mut self.width, &options.width);
        set(&mut self.height, &options.height);
        set(&mut self.auto_match_parens, &options.auto_match_parens);
        set(&mut self.dumb_tabs, &options.dumb_tabs);
        set(&mut self.normal_tab, &options.normal_tab);
        set(&mut self.line_numbers, &options.line_numbers);
        set(&mut self.gutter, &options.gutter);

        if options.content.is_some() {
            self.content = options.content.clone();
        }
        if options.parser_config.is_some() {
            self.parser_config = options.parser_config.clone();
        }
        for (key, value) in &options.extra {
            self.extra.insert(key.clone(), value.clone());
        }
        self
    }

    /// Script resources in load order: shared utilities, then parser resources.
    pub fn script_resources(&self) -> impl Iterator<Item = String> + '_ {
        self.base_resources
            .iter()
            .map(String::as_str)
            .chain(self.parser_resources.iter())
            .map(|file| format!("{}{}", self.path, file))
    }
}

/// A partial configuration record. Unset fields keep the value underneath.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stylesheet: Option<ResourceList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, alias = "parserfile", skip_serializing_if = "Option::is_none")]
    pub parser_resources: Option<ResourceList>,
    #[serde(default, alias = "basefiles", skip_serializing_if = "Option::is_none")]
    pub base_resources: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines_per_pass: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_delay: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuous_scanning: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub undo_depth: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub undo_delay: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disable_spellcheck: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_wrapping: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<Dimension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<Dimension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_match_parens: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dumb_tabs: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal_tab: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_numbers: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser_config: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gutter: Option<GutterSettings>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl EditorOptions {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_toml_str(&contents)
        }
    }

    /// Like [`EditorOptions::load`], but a missing file yields empty options.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Ok(options) => Ok(options),
            Err(ConfigError::Io(err)) if err.kind() == io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(err) => Err(err),
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Names of options that were not recognized.
    pub fn unknown_keys(&self) -> impl Iterator<Item = &str> {
        self.extra.keys().map(|key| key.as_str())
    }

    /// Resolves these options against the built-in defaults.
    pub fn resolve(&self) -> EditorConfig {
        EditorConfig::default().overlay(self)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to parse editor options: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to parse editor options as JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to serialize editor options: {0}")]
    Serialize(#[from] toml::ser::Error),
}
