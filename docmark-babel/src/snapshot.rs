//! Remote document snapshot mapping.
//!
//! Reads the remote service's document JSON into a [`DocumentTree`]. The
//! wire shapes are private serde structs mirroring the vendor schema
//! (camelCase, every field optional); the public entry points only ever hand
//! out validated trees.
//!
//! Only accepted content is modelled. Suggested insertions and element
//! kinds without a model become [`Opaque`] placeholders that keep their
//! length, so every index after them still lines up with the remote one. A
//! paragraph suggested in full, newline included, is one structural
//! placeholder. The body's implicit leading section break and the trailing
//! newline of every paragraph are dropped, since both are implied by the
//! index rules of [`crate::common::linearize`].

use crate::common::linearize::utf16_len;
use crate::error::DocError;
use crate::ir::nodes::{
    AutoText, DateMention, DateProperties, DocumentTree, FootnoteRef, InlineImage, InlineNode,
    ListMembership, Opaque, Paragraph, PersonMention, PersonProperties, RichLink,
    RichLinkProperties, SectionBreak, Segment, SegmentKind, StructuralNode, Styled, Tab, Table,
    TableCell, TableOfContents, TextRun,
};
use crate::ir::style::{
    Alignment, BaselineOffset, NamedStyleType, NamedStyles, ParagraphStyle, StyleDefaults,
    TextStyle,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Tab id and title given to the single tab of an untabbed document.
pub const LEGACY_TAB_ID: &str = "t.0";
pub const LEGACY_TAB_TITLE: &str = "Tab 1";

/// Kind recorded on placeholders for pending suggested insertions.
pub const SUGGESTED_INSERTION: &str = "suggestedInsertion";

pub fn from_json(text: &str) -> Result<DocumentTree, DocError> {
    let raw: RawDocument = serde_json::from_str(text).map_err(DocError::Snapshot)?;
    map_document(raw)
}

pub fn from_value(value: serde_json::Value) -> Result<DocumentTree, DocError> {
    let raw: RawDocument = serde_json::from_value(value).map_err(DocError::Snapshot)?;
    map_document(raw)
}

fn map_document(raw: RawDocument) -> Result<DocumentTree, DocError> {
    let RawDocument {
        document_id,
        title,
        tabs,
        legacy,
    } = raw;

    let (tabs, named_styles) = if tabs.is_empty() {
        let named_styles = named_styles(legacy.named_styles.as_ref());
        let tab = map_tab(LEGACY_TAB_ID.to_string(), LEGACY_TAB_TITLE.to_string(), legacy, Vec::new())?;
        (vec![tab], named_styles)
    } else {
        let named_styles = named_styles(tabs[0].document_tab.named_styles.as_ref());
        let tabs = tabs
            .into_iter()
            .map(map_raw_tab)
            .collect::<Result<Vec<_>, _>>()?;
        (tabs, named_styles)
    };

    debug!(document = %document_id, tabs = tabs.len(), "mapped document snapshot");
    Ok(DocumentTree::new(document_id, title, tabs)?.with_named_styles(named_styles))
}

fn map_raw_tab(raw: RawTab) -> Result<Tab, DocError> {
    let RawTab {
        tab_properties,
        document_tab,
        child_tabs,
    } = raw;
    map_tab(tab_properties.tab_id, tab_properties.title, document_tab, child_tabs)
}

fn map_tab(
    id: String,
    title: String,
    content: RawDocumentTab,
    children: Vec<RawTab>,
) -> Result<Tab, DocError> {
    let mapper = Mapper {
        lists: &content.lists,
        inline_objects: &content.inline_objects,
    };

    let mut body = match &content.body {
        Some(body) => mapper.blocks(&body.content)?,
        None => Vec::new(),
    };
    if matches!(body.first(), Some(StructuralNode::SectionBreak(_))) {
        body.remove(0);
    }

    let mut tab = Tab::new(id, title, body);
    if let Some((header_id, header)) = content.headers.iter().next() {
        tab.header = Some(Segment::new(
            header_id.clone(),
            SegmentKind::Header,
            mapper.blocks(&header.content)?,
        ));
    }
    if let Some((footer_id, footer)) = content.footers.iter().next() {
        tab.footer = Some(Segment::new(
            footer_id.clone(),
            SegmentKind::Footer,
            mapper.blocks(&footer.content)?,
        ));
    }
    for (footnote_id, footnote) in &content.footnotes {
        tab.footnotes.insert(
            footnote_id.clone(),
            Segment::new(
                footnote_id.clone(),
                SegmentKind::Footnote,
                mapper.blocks(&footnote.content)?,
            ),
        );
    }
    tab.children = children
        .into_iter()
        .map(map_raw_tab)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tab)
}

fn named_styles(raw: Option<&RawNamedStyles>) -> NamedStyles {
    let mut styles = NamedStyles::default();
    for style in raw.map(|raw| raw.styles.as_slice()).unwrap_or_default() {
        let Some(named_style) = NamedStyleType::parse(&style.named_style_type) else {
            continue;
        };
        styles.insert(
            named_style,
            StyleDefaults {
                text: style.text_style.as_ref().map(text_style).unwrap_or_default(),
                paragraph: style
                    .paragraph_style
                    .as_ref()
                    .map(paragraph_style)
                    .unwrap_or_default(),
            },
        );
    }
    styles
}

struct Mapper<'a> {
    lists: &'a BTreeMap<String, RawList>,
    inline_objects: &'a BTreeMap<String, RawInlineObject>,
}

impl Mapper<'_> {
    fn blocks(&self, content: &[RawStructural]) -> Result<Vec<StructuralNode>, DocError> {
        let mut blocks = Vec::with_capacity(content.len());
        for element in content {
            if let Some(paragraph) = &element.paragraph {
                blocks.push(self.paragraph(paragraph));
            } else if let Some(table) = &element.table {
                blocks.push(StructuralNode::Table(self.table(table)?));
            } else if let Some(section_break) = &element.section_break {
                blocks.push(StructuralNode::SectionBreak(SectionBreak {
                    section_type: section_break
                        .section_style
                        .as_ref()
                        .and_then(|style| style.section_type.clone()),
                }));
            } else if let Some(toc) = &element.table_of_contents {
                blocks.push(StructuralNode::TableOfContents(TableOfContents {
                    content: self.blocks(&toc.content)?,
                }));
            } else {
                let kind = unknown_kind(&element.other);
                warn!(kind = %kind, "unmodelled block kept as an opaque placeholder");
                blocks.push(StructuralNode::Opaque(Opaque {
                    kind,
                    length: span_len(element.start_index, element.end_index),
                }));
            }
        }
        Ok(blocks)
    }

    fn table(&self, table: &RawTable) -> Result<Table, DocError> {
        let rows = table
            .table_rows
            .iter()
            .map(|row| {
                row.table_cells
                    .iter()
                    .map(|cell| self.blocks(&cell.content).map(TableCell::new))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Table::new(rows)
    }

    fn paragraph(&self, paragraph: &RawParagraph) -> StructuralNode {
        let suggested = !paragraph.elements.is_empty()
            && paragraph.elements.iter().all(RawElement::is_suggested);
        if suggested {
            return StructuralNode::Opaque(Opaque {
                kind: SUGGESTED_INSERTION.to_string(),
                length: paragraph.elements.iter().map(RawElement::len).sum(),
            });
        }

        let mut elements: Vec<InlineNode> = paragraph
            .elements
            .iter()
            .map(|element| self.element(element))
            .collect();

        // The newline belongs to the paragraph end, even inside a suggestion.
        let ends_in_newline = paragraph
            .elements
            .last()
            .and_then(|element| element.text_run.as_ref())
            .is_some_and(|run| run.content.ends_with('\n'));
        if ends_in_newline {
            let emptied = match elements.last_mut() {
                Some(InlineNode::TextRun(last)) => {
                    last.content.pop();
                    last.content.is_empty()
                }
                Some(InlineNode::Opaque(last)) => {
                    last.length = last.length.saturating_sub(1);
                    last.length == 0
                }
                _ => false,
            };
            if emptied {
                elements.pop();
            }
        }

        StructuralNode::Paragraph(Paragraph {
            elements,
            style: paragraph.paragraph_style.as_ref().map(paragraph_style),
            list: paragraph.bullet.as_ref().map(|bullet| self.list(bullet)),
        })
    }

    fn list(&self, bullet: &RawBullet) -> ListMembership {
        let nesting_level = bullet.nesting_level.unwrap_or(0);
        let ordered = self
            .lists
            .get(&bullet.list_id)
            .and_then(|list| list.list_properties.nesting_levels.get(nesting_level))
            .and_then(|level| level.glyph_type.as_deref())
            .is_some_and(|glyph| !matches!(glyph, "GLYPH_TYPE_UNSPECIFIED" | "NONE"));
        ListMembership {
            list_id: bullet.list_id.clone(),
            nesting_level,
            ordered,
        }
    }

    fn element(&self, element: &RawElement) -> InlineNode {
        if element.is_suggested() {
            return InlineNode::Opaque(Opaque {
                kind: SUGGESTED_INSERTION.to_string(),
                length: element.len(),
            });
        }
        let style = |raw: &Option<RawTextStyle>| raw.as_ref().map(text_style);

        if let Some(run) = &element.text_run {
            return InlineNode::TextRun(TextRun {
                content: run.content.clone(),
                style: style(&run.text_style),
                suggested_deletion_ids: run.suggested_deletion_ids.clone(),
            });
        }
        if let Some(object) = &element.inline_object_element {
            let embedded = self
                .inline_objects
                .get(&object.inline_object_id)
                .map(|object| &object.inline_object_properties.embedded_object);
            return InlineNode::InlineImage(InlineImage {
                object_id: object.inline_object_id.clone(),
                description: embedded.and_then(|embedded| embedded.description.clone()),
                content_uri: embedded
                    .and_then(|embedded| embedded.image_properties.as_ref())
                    .and_then(|image| image.content_uri.clone()),
                style: style(&object.text_style),
            });
        }
        if let Some(styled) = &element.page_break {
            return InlineNode::PageBreak(Styled { style: style(&styled.text_style) });
        }
        if let Some(styled) = &element.column_break {
            return InlineNode::ColumnBreak(Styled { style: style(&styled.text_style) });
        }
        if element.horizontal_rule.is_some() {
            return InlineNode::Rule;
        }
        if let Some(styled) = &element.equation {
            return InlineNode::InlineEquation(Styled { style: style(&styled.text_style) });
        }
        if let Some(reference) = &element.footnote_reference {
            return InlineNode::FootnoteRef(FootnoteRef {
                footnote_id: reference.footnote_id.clone(),
                style: style(&reference.text_style),
            });
        }
        if let Some(person) = &element.person {
            return InlineNode::PersonMention(PersonMention {
                properties: PersonProperties {
                    person_id: person.person_id.clone(),
                    name: person.person_properties.name.clone(),
                    email: person.person_properties.email.clone(),
                },
                style: style(&person.text_style),
            });
        }
        if let Some(link) = &element.rich_link {
            let properties = &link.rich_link_properties;
            return InlineNode::RichLink(RichLink {
                properties: RichLinkProperties {
                    rich_link_id: link.rich_link_id.clone(),
                    title: properties.title.clone(),
                    uri: properties.uri.clone(),
                    mime_type: properties.mime_type.clone(),
                },
                style: style(&link.text_style),
            });
        }
        if let Some(auto) = &element.auto_text {
            return InlineNode::AutoText(AutoText {
                auto_text_type: auto.kind.clone(),
                style: style(&auto.text_style),
            });
        }
        if let Some(date) = &element.date_element {
            let properties = &date.date_element_properties;
            return InlineNode::DateMention(DateMention {
                display_text: properties.display_text.clone().unwrap_or_default(),
                properties: DateProperties {
                    timestamp: properties.timestamp.clone(),
                    locale: properties.locale.clone(),
                    date_format: properties.date_format.clone(),
                    time_format: properties.time_format.clone(),
                    time_zone_id: properties.time_zone_id.clone(),
                },
                style: style(&date.text_style),
            });
        }

        let kind = unknown_kind(&element.other);
        warn!(kind = %kind, "unmodelled inline element kept as an opaque placeholder");
        InlineNode::Opaque(Opaque {
            kind,
            length: element.len(),
        })
    }
}

/// Name of the first field nothing else claimed, e.g. `"chip"`.
fn unknown_kind(other: &BTreeMap<String, serde_json::Value>) -> String {
    other
        .keys()
        .next()
        .cloned()
        .unwrap_or_else(|| "unknown".to_string())
}

/// Length from the remote index pair; one unit when it is missing.
fn span_len(start: Option<usize>, end: Option<usize>) -> usize {
    match (start, end) {
        (Some(start), Some(end)) if end > start => end - start,
        _ => 1,
    }
}

impl RawElement {
    fn is_suggested(&self) -> bool {
        let ids = [
            self.text_run.as_ref().map(|run| &run.suggested_insertion_ids),
            self.inline_object_element
                .as_ref()
                .map(|object| &object.suggested_insertion_ids),
            self.page_break.as_ref().map(|styled| &styled.suggested_insertion_ids),
            self.column_break.as_ref().map(|styled| &styled.suggested_insertion_ids),
            self.horizontal_rule.as_ref().map(|styled| &styled.suggested_insertion_ids),
            self.equation.as_ref().map(|styled| &styled.suggested_insertion_ids),
            self.footnote_reference
                .as_ref()
                .map(|reference| &reference.suggested_insertion_ids),
            self.person.as_ref().map(|person| &person.suggested_insertion_ids),
            self.rich_link.as_ref().map(|link| &link.suggested_insertion_ids),
            self.auto_text.as_ref().map(|auto| &auto.suggested_insertion_ids),
            self.date_element.as_ref().map(|date| &date.suggested_insertion_ids),
        ];
        ids.into_iter().flatten().any(|ids| !ids.is_empty())
    }

    /// Length in UTF-16 code units.
    fn len(&self) -> usize {
        match &self.text_run {
            Some(run) => utf16_len(&run.content),
            None => span_len(self.start_index, self.end_index),
        }
    }
}

fn text_style(raw: &RawTextStyle) -> TextStyle {
    TextStyle {
        bold: raw.bold,
        italic: raw.italic,
        strikethrough: raw.strikethrough,
        underline: raw.underline,
        foreground_color: raw.foreground_color.as_ref().and_then(hex_color),
        background_color: raw.background_color.as_ref().and_then(hex_color),
        font_family: raw
            .weighted_font_family
            .as_ref()
            .and_then(|family| family.font_family.clone()),
        font_size: raw.font_size.as_ref().and_then(|size| size.magnitude),
        baseline_offset: raw.baseline_offset.as_deref().and_then(|offset| match offset {
            "SUPERSCRIPT" => Some(BaselineOffset::Superscript),
            "SUBSCRIPT" => Some(BaselineOffset::Subscript),
            "NONE" => Some(BaselineOffset::None),
            _ => None,
        }),
        link: raw.link.as_ref().and_then(|link| {
            link.url
                .clone()
                .or_else(|| link.heading_id.as_ref().map(|id| format!("#heading={id}")))
                .or_else(|| link.bookmark_id.as_ref().map(|id| format!("#bookmark={id}")))
        }),
    }
}

fn paragraph_style(raw: &RawParagraphStyle) -> ParagraphStyle {
    ParagraphStyle {
        named_style: raw
            .named_style_type
            .as_deref()
            .and_then(NamedStyleType::parse),
        alignment: raw.alignment.as_deref().and_then(|alignment| {
            serde_json::from_value::<Alignment>(serde_json::Value::String(alignment.to_string()))
                .ok()
        }),
        indent_start: raw.indent_start.as_ref().and_then(|indent| indent.magnitude),
        indent_first_line: raw
            .indent_first_line
            .as_ref()
            .and_then(|indent| indent.magnitude),
        heading_id: raw.heading_id.clone(),
    }
}

/// `#rrggbb` for an opaque colour; channels are fractions in `0..=1`.
fn hex_color(raw: &RawOptionalColor) -> Option<String> {
    let rgb = raw.color.as_ref()?.rgb_color.as_ref()?;
    let channel = |value: Option<f64>| (value.unwrap_or(0.0).clamp(0.0, 1.0) * 255.0).round() as u8;
    Some(format!(
        "#{:02x}{:02x}{:02x}",
        channel(rgb.red),
        channel(rgb.green),
        channel(rgb.blue)
    ))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    #[serde(default)]
    document_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    tabs: Vec<RawTab>,
    /// Content of an untabbed document, stored at the top level.
    #[serde(flatten)]
    legacy: RawDocumentTab,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTab {
    #[serde(default)]
    tab_properties: RawTabProperties,
    #[serde(default)]
    document_tab: RawDocumentTab,
    #[serde(default)]
    child_tabs: Vec<RawTab>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawTabProperties {
    tab_id: String,
    title: String,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawDocumentTab {
    body: Option<RawSegment>,
    headers: BTreeMap<String, RawSegment>,
    footers: BTreeMap<String, RawSegment>,
    footnotes: BTreeMap<String, RawSegment>,
    lists: BTreeMap<String, RawList>,
    named_styles: Option<RawNamedStyles>,
    inline_objects: BTreeMap<String, RawInlineObject>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawSegment {
    content: Vec<RawStructural>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawStructural {
    start_index: Option<usize>,
    end_index: Option<usize>,
    paragraph: Option<RawParagraph>,
    table: Option<RawTable>,
    section_break: Option<RawSectionBreak>,
    table_of_contents: Option<RawSegment>,
    #[serde(flatten)]
    other: BTreeMap<String, serde_json::Value>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawParagraph {
    elements: Vec<RawElement>,
    paragraph_style: Option<RawParagraphStyle>,
    bullet: Option<RawBullet>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawBullet {
    list_id: String,
    nesting_level: Option<usize>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawParagraphStyle {
    named_style_type: Option<String>,
    alignment: Option<String>,
    indent_start: Option<RawDimension>,
    indent_first_line: Option<RawDimension>,
    heading_id: Option<String>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawDimension {
    magnitude: Option<f64>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawElement {
    start_index: Option<usize>,
    end_index: Option<usize>,
    text_run: Option<RawTextRun>,
    inline_object_element: Option<RawInlineObjectElement>,
    page_break: Option<RawStyled>,
    column_break: Option<RawStyled>,
    horizontal_rule: Option<RawStyled>,
    equation: Option<RawStyled>,
    footnote_reference: Option<RawFootnoteReference>,
    person: Option<RawPerson>,
    rich_link: Option<RawRichLink>,
    auto_text: Option<RawAutoText>,
    date_element: Option<RawDateElement>,
    #[serde(flatten)]
    other: BTreeMap<String, serde_json::Value>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawTextRun {
    content: String,
    text_style: Option<RawTextStyle>,
    suggested_insertion_ids: Vec<String>,
    suggested_deletion_ids: Vec<String>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawStyled {
    text_style: Option<RawTextStyle>,
    suggested_insertion_ids: Vec<String>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawInlineObjectElement {
    inline_object_id: String,
    text_style: Option<RawTextStyle>,
    suggested_insertion_ids: Vec<String>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawFootnoteReference {
    footnote_id: String,
    text_style: Option<RawTextStyle>,
    suggested_insertion_ids: Vec<String>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawPerson {
    person_id: Option<String>,
    person_properties: RawPersonProperties,
    text_style: Option<RawTextStyle>,
    suggested_insertion_ids: Vec<String>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawPersonProperties {
    name: Option<String>,
    email: String,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawRichLink {
    rich_link_id: Option<String>,
    rich_link_properties: RawRichLinkProperties,
    text_style: Option<RawTextStyle>,
    suggested_insertion_ids: Vec<String>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawRichLinkProperties {
    title: String,
    uri: String,
    mime_type: Option<String>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawAutoText {
    #[serde(rename = "type")]
    kind: Option<String>,
    text_style: Option<RawTextStyle>,
    suggested_insertion_ids: Vec<String>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawDateElement {
    date_element_properties: RawDateProperties,
    text_style: Option<RawTextStyle>,
    suggested_insertion_ids: Vec<String>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawDateProperties {
    timestamp: Option<String>,
    locale: Option<String>,
    date_format: Option<String>,
    time_format: Option<String>,
    time_zone_id: Option<String>,
    display_text: Option<String>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawTextStyle {
    bold: Option<bool>,
    italic: Option<bool>,
    underline: Option<bool>,
    strikethrough: Option<bool>,
    foreground_color: Option<RawOptionalColor>,
    background_color: Option<RawOptionalColor>,
    weighted_font_family: Option<RawFontFamily>,
    font_size: Option<RawDimension>,
    baseline_offset: Option<String>,
    link: Option<RawLink>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawOptionalColor {
    color: Option<RawColor>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawColor {
    rgb_color: Option<RawRgb>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawRgb {
    red: Option<f64>,
    green: Option<f64>,
    blue: Option<f64>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawFontFamily {
    font_family: Option<String>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawLink {
    url: Option<String>,
    heading_id: Option<String>,
    bookmark_id: Option<String>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawTable {
    table_rows: Vec<RawTableRow>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawTableRow {
    table_cells: Vec<RawSegment>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawSectionBreak {
    section_style: Option<RawSectionStyle>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawSectionStyle {
    section_type: Option<String>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawList {
    list_properties: RawListProperties,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawListProperties {
    nesting_levels: Vec<RawNestingLevel>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawNestingLevel {
    glyph_type: Option<String>,
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct RawNamedStyles {
    styles: Vec<RawNamedStyle>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawNamedStyle {
    named_style_type: String,
    text_style: Option<RawTextStyle>,
    paragraph_style: Option<RawParagraphStyle>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawInlineObject {
    inline_object_properties: RawInlineObjectProperties,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawInlineObjectProperties {
    embedded_object: RawEmbeddedObject,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawEmbeddedObject {
    description: Option<String>,
    image_properties: Option<RawImageProperties>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawImageProperties {
    content_uri: Option<String>,
}
