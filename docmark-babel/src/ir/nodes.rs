//! Core data structures for the document tree.
//!
//! A [`DocumentTree`] is an immutable snapshot: it is produced either by the
//! snapshot mapping ([`crate::snapshot`]) or by the markdown parser, and is
//! never mutated once built. Both the serializer and the differ consume it.

use crate::error::DocError;
use crate::ir::style::{NamedStyles, ParagraphStyle, TextStyle};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Root of a document: an ordered, never-empty list of tabs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTree {
    pub document_id: String,
    pub title: String,
    tabs: Vec<Tab>,
    #[serde(default)]
    pub named_styles: NamedStyles,
}

impl DocumentTree {
    /// Builds a document, validating containment rules across every tab.
    pub fn new(
        document_id: impl Into<String>,
        title: impl Into<String>,
        tabs: Vec<Tab>,
    ) -> Result<Self, DocError> {
        let doc = DocumentTree {
            document_id: document_id.into(),
            title: title.into(),
            tabs,
            named_styles: NamedStyles::default(),
        };
        doc.validate()?;
        Ok(doc)
    }

    /// Replaces the shared named style table.
    pub fn with_named_styles(mut self, named_styles: NamedStyles) -> Self {
        self.named_styles = named_styles;
        self
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    /// Finds a tab anywhere in the tab hierarchy.
    pub fn find_tab(&self, tab_id: &str) -> Option<&Tab> {
        fn find<'a>(tabs: &'a [Tab], tab_id: &str) -> Option<&'a Tab> {
            tabs.iter().find_map(|tab| {
                if tab.id == tab_id {
                    Some(tab)
                } else {
                    find(&tab.children, tab_id)
                }
            })
        }
        find(&self.tabs, tab_id)
    }

    /// All tabs in document order (pre-order over the tab hierarchy).
    pub fn flatten_tabs(&self) -> Vec<&Tab> {
        fn collect<'a>(tabs: &'a [Tab], out: &mut Vec<&'a Tab>) {
            for tab in tabs {
                out.push(tab);
                collect(&tab.children, out);
            }
        }
        let mut out = Vec::new();
        collect(&self.tabs, &mut out);
        out
    }
}

/// A tab owns one body, optional header/footer, footnotes and child tabs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: String,
    pub title: String,
    pub body: Segment,
    #[serde(default)]
    pub header: Option<Segment>,
    #[serde(default)]
    pub footer: Option<Segment>,
    #[serde(default)]
    pub footnotes: BTreeMap<String, Segment>,
    #[serde(default)]
    pub children: Vec<Tab>,
}

impl Tab {
    pub fn new(id: impl Into<String>, title: impl Into<String>, body: Vec<StructuralNode>) -> Self {
        Tab {
            id: id.into(),
            title: title.into(),
            body: Segment::body(body),
            header: None,
            footer: None,
            footnotes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Segments of this tab (not its children) in canonical order:
    /// body, header, footer, then footnotes by identifier.
    pub fn segments(&self) -> Vec<&Segment> {
        let mut segments = vec![&self.body];
        segments.extend(self.header.iter());
        segments.extend(self.footer.iter());
        segments.extend(self.footnotes.values());
        segments
    }
}

/// The kind of content stream a segment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SegmentKind {
    Body,
    Header,
    Footer,
    Footnote,
}

/// An ordered run of structural nodes, addressed by `(tab_id, segment id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    /// Empty for the body.
    pub id: String,
    pub kind: SegmentKind,
    pub content: Vec<StructuralNode>,
}

impl Segment {
    pub fn body(content: Vec<StructuralNode>) -> Self {
        Segment {
            id: String::new(),
            kind: SegmentKind::Body,
            content,
        }
    }

    pub fn new(id: impl Into<String>, kind: SegmentKind, content: Vec<StructuralNode>) -> Self {
        Segment {
            id: id.into(),
            kind,
            content,
        }
    }
}

/// Address of a segment within a document.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentKey {
    pub tab_id: String,
    pub segment_id: String,
}

impl SegmentKey {
    pub fn new(tab_id: impl Into<String>, segment_id: impl Into<String>) -> Self {
        SegmentKey {
            tab_id: tab_id.into(),
            segment_id: segment_id.into(),
        }
    }
}

impl fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segment_id.is_empty() {
            write!(f, "{}/body", self.tab_id)
        } else {
            write!(f, "{}/{}", self.tab_id, self.segment_id)
        }
    }
}

/// Block-level content of a segment or table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StructuralNode {
    Paragraph(Paragraph),
    Table(Table),
    SectionBreak(SectionBreak),
    TableOfContents(TableOfContents),
    BlockEquation(BlockEquation),
    Opaque(Opaque),
}

impl StructuralNode {
    /// Stable kind name, shared by markers, metadata records and warnings.
    pub fn kind_name(&self) -> &'static str {
        match self {
            StructuralNode::Paragraph(_) => "paragraph",
            StructuralNode::Table(_) => "table",
            StructuralNode::SectionBreak(_) => "sectionBreak",
            StructuralNode::TableOfContents(_) => "tableOfContents",
            StructuralNode::BlockEquation(_) => "blockEquation",
            StructuralNode::Opaque(_) => "opaque",
        }
    }
}

/// A paragraph of inline content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    pub elements: Vec<InlineNode>,
    #[serde(default)]
    pub style: Option<ParagraphStyle>,
    #[serde(default)]
    pub list: Option<ListMembership>,
}

impl Paragraph {
    pub fn new(elements: Vec<InlineNode>) -> Self {
        Paragraph {
            elements,
            style: None,
            list: None,
        }
    }

    /// A paragraph holding a single unstyled text run.
    pub fn text(text: impl Into<String>) -> Self {
        Paragraph::new(vec![InlineNode::TextRun(TextRun::plain(text))])
    }

    pub fn with_style(mut self, style: ParagraphStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn with_list(mut self, list: ListMembership) -> Self {
        self.list = Some(list);
        self
    }

    /// Concatenated text of every text run.
    pub fn plain_text(&self) -> String {
        self.elements
            .iter()
            .filter_map(|element| match element {
                InlineNode::TextRun(run) => Some(run.content.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Membership of a paragraph in a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMembership {
    pub list_id: String,
    pub nesting_level: usize,
    #[serde(default)]
    pub ordered: bool,
}

/// A table stored as a dense row-major grid of cells.
///
/// Cells are addressed by `(row, column)` coordinates into the grid rather
/// than through nested row objects, which keeps traversal and equality flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    rows: usize,
    columns: usize,
    cells: Vec<TableCell>,
}

impl Table {
    /// Builds a table from rows of cells. Rows must all have the same width
    /// and cells may not contain section breaks or tables of contents.
    pub fn new(rows: Vec<Vec<TableCell>>) -> Result<Self, DocError> {
        let row_count = rows.len();
        let columns = rows.first().map(Vec::len).unwrap_or(0);
        if row_count == 0 || columns == 0 {
            return Err(DocError::StructureViolation {
                path: "table".to_string(),
                reason: "tables need at least one row and one column".to_string(),
            });
        }

        let mut cells = Vec::with_capacity(row_count * columns);
        for (row_index, row) in rows.into_iter().enumerate() {
            if row.len() != columns {
                return Err(DocError::StructureViolation {
                    path: format!("table/row[{row_index}]"),
                    reason: format!("row has {} cells, expected {columns}", row.len()),
                });
            }
            cells.extend(row);
        }

        let table = Table {
            rows: row_count,
            columns,
            cells,
        };
        table.check_cells()?;
        Ok(table)
    }

    /// Convenience constructor for a grid of single-paragraph text cells.
    pub fn from_text<S: AsRef<str>>(rows: &[Vec<S>]) -> Result<Self, DocError> {
        Table::new(
            rows.iter()
                .map(|row| {
                    row.iter()
                        .map(|text| TableCell::text(text.as_ref()))
                        .collect()
                })
                .collect(),
        )
    }

    fn check_cells(&self) -> Result<(), DocError> {
        for (index, cell) in self.cells.iter().enumerate() {
            for node in &cell.content {
                if matches!(
                    node,
                    StructuralNode::SectionBreak(_) | StructuralNode::TableOfContents(_)
                ) {
                    return Err(DocError::StructureViolation {
                        path: format!(
                            "table/cell[{},{}]",
                            index / self.columns,
                            index % self.columns
                        ),
                        reason: format!("{} is not allowed inside a table cell", node.kind_name()),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&TableCell> {
        if row >= self.rows || column >= self.columns {
            return None;
        }
        self.cells.get(row * self.columns + column)
    }

    /// Cells of one row, left to right.
    pub fn row(&self, row: usize) -> &[TableCell] {
        let start = (row * self.columns).min(self.cells.len());
        let end = (start + self.columns).min(self.cells.len());
        &self.cells[start..end]
    }

    /// Iterates `(row, column, cell)` in row-major order.
    pub fn iter_cells(&self) -> impl Iterator<Item = (usize, usize, &TableCell)> {
        let columns = self.columns;
        self.cells
            .iter()
            .enumerate()
            .map(move |(index, cell)| (index / columns, index % columns, cell))
    }

    /// A table of the same shape whose cells hold one empty paragraph each.
    pub fn emptied(&self) -> Table {
        Table {
            rows: self.rows,
            columns: self.columns,
            cells: vec![TableCell::text(""); self.cells.len()],
        }
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [TableCell] {
        &mut self.cells
    }
}

/// A table cell: a nested sequence of structural nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    pub content: Vec<StructuralNode>,
}

impl TableCell {
    pub fn new(content: Vec<StructuralNode>) -> Self {
        TableCell { content }
    }

    pub fn text(text: &str) -> Self {
        let paragraph = if text.is_empty() {
            Paragraph::default()
        } else {
            Paragraph::text(text)
        };
        TableCell {
            content: vec![StructuralNode::Paragraph(paragraph)],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionBreak {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableOfContents {
    #[serde(default)]
    pub content: Vec<StructuralNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockEquation {}

/// Remote content kept out of markdown: pending suggested insertions and
/// element kinds without a model. It never renders and never compares; it
/// only holds its place in the index space so edits around it stay
/// addressed correctly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opaque {
    /// What the remote element was, e.g. `suggestedInsertion`.
    pub kind: String,
    /// Length in UTF-16 code units.
    pub length: usize,
}

/// Inline content of a paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InlineNode {
    TextRun(TextRun),
    InlineImage(InlineImage),
    PageBreak(Styled),
    ColumnBreak(Styled),
    Rule,
    FootnoteRef(FootnoteRef),
    DateMention(DateMention),
    PersonMention(PersonMention),
    RichLink(RichLink),
    AutoText(AutoText),
    InlineEquation(Styled),
    Opaque(Opaque),
}

impl InlineNode {
    /// Stable kind name, shared by markers, metadata records and warnings.
    pub fn kind_name(&self) -> &'static str {
        match self {
            InlineNode::TextRun(_) => "textRun",
            InlineNode::InlineImage(_) => "image",
            InlineNode::PageBreak(_) => "pageBreak",
            InlineNode::ColumnBreak(_) => "columnBreak",
            InlineNode::Rule => "rule",
            InlineNode::FootnoteRef(_) => "footnoteRef",
            InlineNode::DateMention(_) => "date",
            InlineNode::PersonMention(_) => "person",
            InlineNode::RichLink(_) => "richLink",
            InlineNode::AutoText(_) => "autoText",
            InlineNode::InlineEquation(_) => "equation",
            InlineNode::Opaque(_) => "opaque",
        }
    }

    /// Style carried by the node, if any. Rules never carry one.
    pub fn style(&self) -> Option<&TextStyle> {
        match self {
            InlineNode::TextRun(run) => run.style.as_ref(),
            InlineNode::InlineImage(image) => image.style.as_ref(),
            InlineNode::PageBreak(styled)
            | InlineNode::ColumnBreak(styled)
            | InlineNode::InlineEquation(styled) => styled.style.as_ref(),
            InlineNode::Rule | InlineNode::Opaque(_) => None,
            InlineNode::FootnoteRef(footnote) => footnote.style.as_ref(),
            InlineNode::DateMention(date) => date.style.as_ref(),
            InlineNode::PersonMention(person) => person.style.as_ref(),
            InlineNode::RichLink(link) => link.style.as_ref(),
            InlineNode::AutoText(auto) => auto.style.as_ref(),
        }
    }
}

/// A run of text sharing one style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRun {
    pub content: String,
    #[serde(default)]
    pub style: Option<TextStyle>,
    /// Pending deletion suggestions on accepted text; volatile.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested_deletion_ids: Vec<String>,
}

impl TextRun {
    pub fn plain(content: impl Into<String>) -> Self {
        TextRun {
            content: content.into(),
            style: None,
            suggested_deletion_ids: Vec::new(),
        }
    }

    pub fn styled(content: impl Into<String>, style: TextStyle) -> Self {
        TextRun {
            content: content.into(),
            style: Some(style),
            suggested_deletion_ids: Vec::new(),
        }
    }
}

/// Style holder for inline nodes that have no payload of their own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Styled {
    #[serde(default)]
    pub style: Option<TextStyle>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage {
    /// Remote inline object id; empty for externally hosted images.
    pub object_id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content_uri: Option<String>,
    #[serde(default)]
    pub style: Option<TextStyle>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FootnoteRef {
    pub footnote_id: String,
    #[serde(default)]
    pub style: Option<TextStyle>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateMention {
    pub display_text: String,
    #[serde(default)]
    pub properties: DateProperties,
    #[serde(default)]
    pub style: Option<TextStyle>,
}

/// Date element fields that markdown cannot express.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone_id: Option<String>,
}

impl DateProperties {
    pub fn is_default(&self) -> bool {
        self == &DateProperties::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonMention {
    pub properties: PersonProperties,
    #[serde(default)]
    pub style: Option<TextStyle>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichLink {
    pub properties: RichLinkProperties,
    #[serde(default)]
    pub style: Option<TextStyle>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichLinkProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rich_link_id: Option<String>,
    pub title: String,
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoText {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_text_type: Option<String>,
    #[serde(default)]
    pub style: Option<TextStyle>,
}
