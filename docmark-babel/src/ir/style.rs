//! Text and paragraph styles.
//!
//! Stored styles only ever hold fields that were explicitly set: `None`
//! means "inherit", never "off". Effective styles are computed on demand by
//! [`resolve_text_style`] and [`resolve_paragraph_style`], which fold a chain
//! of ancestors without touching the stored nodes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Font families rendered as code.
const MONOSPACE_FAMILIES: &[&str] = &[
    "Courier New",
    "Courier",
    "Consolas",
    "Roboto Mono",
    "Source Code Pro",
    "Inconsolata",
    "Fira Code",
    "JetBrains Mono",
    "Ubuntu Mono",
];

/// Font family assigned to code parsed from markdown.
pub const CODE_FONT_FAMILY: &str = "Courier New";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    /// `#rrggbb`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground_color: Option<String>,
    /// `#rrggbb`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    /// Points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_offset: Option<BaselineOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BaselineOffset {
    None,
    Superscript,
    Subscript,
}

impl TextStyle {
    pub fn bold() -> Self {
        TextStyle {
            bold: Some(true),
            ..TextStyle::default()
        }
    }

    pub fn italic() -> Self {
        TextStyle {
            italic: Some(true),
            ..TextStyle::default()
        }
    }

    pub fn code() -> Self {
        TextStyle {
            font_family: Some(CODE_FONT_FAMILY.to_string()),
            ..TextStyle::default()
        }
    }

    pub fn link(url: impl Into<String>) -> Self {
        TextStyle {
            link: Some(url.into()),
            ..TextStyle::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &TextStyle::default()
    }

    /// Field-wise override: fields set on `self` win, absent ones come from `parent`.
    pub fn over(&self, parent: &TextStyle) -> TextStyle {
        TextStyle {
            bold: self.bold.or(parent.bold),
            italic: self.italic.or(parent.italic),
            strikethrough: self.strikethrough.or(parent.strikethrough),
            underline: self.underline.or(parent.underline),
            foreground_color: self
                .foreground_color
                .clone()
                .or_else(|| parent.foreground_color.clone()),
            background_color: self
                .background_color
                .clone()
                .or_else(|| parent.background_color.clone()),
            font_family: self
                .font_family
                .clone()
                .or_else(|| parent.font_family.clone()),
            font_size: self.font_size.or(parent.font_size),
            baseline_offset: self.baseline_offset.or(parent.baseline_offset),
            link: self.link.clone().or_else(|| parent.link.clone()),
        }
    }

    pub fn is_monospace(&self) -> bool {
        self.font_family
            .as_deref()
            .map(|family| MONOSPACE_FAMILIES.contains(&family))
            .unwrap_or(false)
    }

    /// The part of an effective style that markdown can carry: emphasis
    /// toggles, the link, and whether the font is monospace.
    pub fn markup_projection(&self) -> TextStyle {
        TextStyle {
            bold: Some(self.bold.unwrap_or(false)),
            italic: Some(self.italic.unwrap_or(false)),
            strikethrough: Some(self.strikethrough.unwrap_or(false)),
            underline: Some(self.underline.unwrap_or(false)),
            font_family: self
                .is_monospace()
                .then(|| CODE_FONT_FAMILY.to_string()),
            link: self.link.clone(),
            ..TextStyle::default()
        }
    }

    /// Names of the fields whose values differ between two styles, in the
    /// remote service's field-mask spelling.
    pub fn changed_fields(&self, other: &TextStyle) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.bold != other.bold {
            fields.push("bold");
        }
        if self.italic != other.italic {
            fields.push("italic");
        }
        if self.strikethrough != other.strikethrough {
            fields.push("strikethrough");
        }
        if self.underline != other.underline {
            fields.push("underline");
        }
        if self.foreground_color != other.foreground_color {
            fields.push("foregroundColor");
        }
        if self.background_color != other.background_color {
            fields.push("backgroundColor");
        }
        if self.font_family != other.font_family {
            fields.push("weightedFontFamily");
        }
        if self.font_size != other.font_size {
            fields.push("fontSize");
        }
        if self.baseline_offset != other.baseline_offset {
            fields.push("baselineOffset");
        }
        if self.link != other.link {
            fields.push("link");
        }
        fields
    }
}

/// Named paragraph styles. Level 0 is normal text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NamedStyleType {
    #[serde(rename = "NORMAL_TEXT")]
    NormalText,
    #[serde(rename = "TITLE")]
    Title,
    #[serde(rename = "SUBTITLE")]
    Subtitle,
    #[serde(rename = "HEADING_1")]
    Heading1,
    #[serde(rename = "HEADING_2")]
    Heading2,
    #[serde(rename = "HEADING_3")]
    Heading3,
    #[serde(rename = "HEADING_4")]
    Heading4,
    #[serde(rename = "HEADING_5")]
    Heading5,
    #[serde(rename = "HEADING_6")]
    Heading6,
}

impl NamedStyleType {
    /// Heading level 1-6, or 0 for normal text. Title and subtitle have no level.
    pub fn heading_level(self) -> Option<u8> {
        match self {
            NamedStyleType::NormalText => Some(0),
            NamedStyleType::Heading1 => Some(1),
            NamedStyleType::Heading2 => Some(2),
            NamedStyleType::Heading3 => Some(3),
            NamedStyleType::Heading4 => Some(4),
            NamedStyleType::Heading5 => Some(5),
            NamedStyleType::Heading6 => Some(6),
            NamedStyleType::Title | NamedStyleType::Subtitle => None,
        }
    }

    pub fn from_heading_level(level: u8) -> Self {
        match level {
            0 => NamedStyleType::NormalText,
            1 => NamedStyleType::Heading1,
            2 => NamedStyleType::Heading2,
            3 => NamedStyleType::Heading3,
            4 => NamedStyleType::Heading4,
            5 => NamedStyleType::Heading5,
            _ => NamedStyleType::Heading6,
        }
    }

    /// Parses the remote service's spelling, e.g. `HEADING_2`.
    pub fn parse(name: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(name.to_string())).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Alignment {
    Start,
    Center,
    End,
    Justified,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub named_style: Option<NamedStyleType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
    /// Points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indent_start: Option<f64>,
    /// Points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indent_first_line: Option<f64>,
    /// Assigned by the remote service; volatile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_id: Option<String>,
}

impl ParagraphStyle {
    pub fn named(named_style: NamedStyleType) -> Self {
        ParagraphStyle {
            named_style: Some(named_style),
            ..ParagraphStyle::default()
        }
    }

    pub fn heading(level: u8) -> Self {
        ParagraphStyle::named(NamedStyleType::from_heading_level(level))
    }

    pub fn over(&self, parent: &ParagraphStyle) -> ParagraphStyle {
        ParagraphStyle {
            named_style: self.named_style.or(parent.named_style),
            alignment: self.alignment.or(parent.alignment),
            indent_start: self.indent_start.or(parent.indent_start),
            indent_first_line: self.indent_first_line.or(parent.indent_first_line),
            heading_id: self.heading_id.clone().or_else(|| parent.heading_id.clone()),
        }
    }

    pub fn changed_fields(&self, other: &ParagraphStyle) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.named_style != other.named_style {
            fields.push("namedStyleType");
        }
        if self.alignment != other.alignment {
            fields.push("alignment");
        }
        if self.indent_start != other.indent_start {
            fields.push("indentStart");
        }
        if self.indent_first_line != other.indent_first_line {
            fields.push("indentFirstLine");
        }
        fields
    }
}

/// Defaults attached to one named style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleDefaults {
    #[serde(default)]
    pub text: TextStyle,
    #[serde(default)]
    pub paragraph: ParagraphStyle,
}

/// The document's shared named style table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamedStyles {
    styles: BTreeMap<NamedStyleType, StyleDefaults>,
}

impl NamedStyles {
    pub fn insert(&mut self, named_style: NamedStyleType, defaults: StyleDefaults) {
        self.styles.insert(named_style, defaults);
    }

    pub fn get(&self, named_style: NamedStyleType) -> Option<&StyleDefaults> {
        self.styles.get(&named_style)
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Inheritance chain for a named style, nearest ancestor first.
    /// Every named style inherits from normal text.
    fn chain(&self, named_style: NamedStyleType) -> Vec<&StyleDefaults> {
        let mut chain = Vec::with_capacity(2);
        chain.extend(self.get(named_style));
        if named_style != NamedStyleType::NormalText {
            chain.extend(self.get(NamedStyleType::NormalText));
        }
        chain
    }
}

/// Computes the effective text style of a run inside a paragraph.
///
/// The run's own fields override the paragraph's named style defaults, which
/// in turn override normal text.
pub fn resolve_text_style(
    run: Option<&TextStyle>,
    paragraph: Option<&ParagraphStyle>,
    named_styles: &NamedStyles,
) -> TextStyle {
    let named = paragraph
        .and_then(|style| style.named_style)
        .unwrap_or(NamedStyleType::NormalText);
    let inherited = named_styles
        .chain(named)
        .into_iter()
        .rev()
        .fold(TextStyle::default(), |acc, defaults| defaults.text.over(&acc));
    match run {
        Some(style) => style.over(&inherited),
        None => inherited,
    }
}

/// The text style a paragraph's runs inherit before their own fields apply.
pub fn inherited_text_style(
    paragraph: Option<&ParagraphStyle>,
    named_styles: &NamedStyles,
) -> TextStyle {
    resolve_text_style(None, paragraph, named_styles)
}

/// Computes the effective paragraph style by folding named style defaults.
pub fn resolve_paragraph_style(
    paragraph: Option<&ParagraphStyle>,
    named_styles: &NamedStyles,
) -> ParagraphStyle {
    let named = paragraph
        .and_then(|style| style.named_style)
        .unwrap_or(NamedStyleType::NormalText);
    let inherited = named_styles
        .chain(named)
        .into_iter()
        .rev()
        .fold(ParagraphStyle::default(), |acc, defaults| {
            defaults.paragraph.over(&acc)
        });
    match paragraph {
        Some(style) => style.over(&inherited),
        None => inherited,
    }
}
