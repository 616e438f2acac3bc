//! Content equality.
//!
//! Two trees are content-equal when they are equal after normalization.
//! Normalization:
//!
//! - merges adjacent text runs with identical style and drops empty runs
//! - clears volatile fields (suggestion ids, heading ids, list ids, image
//!   content URIs of hosted images)
//! - strips style fields that restate what the paragraph's named style
//!   already provides, then treats an empty style as absent
//! - treats `NORMAL_TEXT` as the absence of a named style
//! - drops opaque placeholders, which have no content to compare
//!
//! Strict equality is plain `==`.

use crate::ir::nodes::{
    DocumentTree, InlineNode, Paragraph, Segment, StructuralNode, Styled, Tab, TableCell, TextRun,
};
use crate::ir::style::{
    inherited_text_style, NamedStyleType, NamedStyles, ParagraphStyle, TextStyle,
};

impl DocumentTree {
    /// Equality that ignores volatile fields and style restatements.
    pub fn content_eq(&self, other: &DocumentTree) -> bool {
        let left: Vec<Tab> = self
            .tabs()
            .iter()
            .map(|tab| normalize_tab(tab, &self.named_styles))
            .collect();
        let right: Vec<Tab> = other
            .tabs()
            .iter()
            .map(|tab| normalize_tab(tab, &other.named_styles))
            .collect();
        left == right
    }

    /// Field-by-field equality, volatile fields included.
    pub fn strict_eq(&self, other: &DocumentTree) -> bool {
        self == other
    }
}

/// Content equality for two block sequences sharing one named style table.
pub fn content_eq_blocks(
    left: &[StructuralNode],
    right: &[StructuralNode],
    named_styles: &NamedStyles,
) -> bool {
    normalize_blocks(left, named_styles) == normalize_blocks(right, named_styles)
}

fn normalize_tab(tab: &Tab, named_styles: &NamedStyles) -> Tab {
    let segment = |segment: &Segment| Segment {
        content: normalize_blocks(&segment.content, named_styles),
        ..segment.clone()
    };
    Tab {
        id: tab.id.clone(),
        title: tab.title.clone(),
        body: segment(&tab.body),
        header: tab.header.as_ref().map(segment),
        footer: tab.footer.as_ref().map(segment),
        footnotes: tab
            .footnotes
            .iter()
            .map(|(id, footnote)| (id.clone(), segment(footnote)))
            .collect(),
        children: tab
            .children
            .iter()
            .map(|child| normalize_tab(child, named_styles))
            .collect(),
    }
}

/// Normalized copy of a block sequence.
pub fn normalize_blocks(blocks: &[StructuralNode], named_styles: &NamedStyles) -> Vec<StructuralNode> {
    Normalizer {
        named_styles,
        keep_opaque: false,
    }
    .blocks(blocks)
}

/// Like [`normalize_blocks`], but opaque placeholders stay where they are so
/// the result still spans the same index range.
pub fn normalize_blocks_keeping_opaque(
    blocks: &[StructuralNode],
    named_styles: &NamedStyles,
) -> Vec<StructuralNode> {
    Normalizer {
        named_styles,
        keep_opaque: true,
    }
    .blocks(blocks)
}

struct Normalizer<'a> {
    named_styles: &'a NamedStyles,
    keep_opaque: bool,
}

impl Normalizer<'_> {
    fn blocks(&self, blocks: &[StructuralNode]) -> Vec<StructuralNode> {
        blocks
            .iter()
            .filter(|block| self.keep_opaque || !matches!(block, StructuralNode::Opaque(_)))
            .map(|block| self.block(block))
            .collect()
    }

    fn block(&self, block: &StructuralNode) -> StructuralNode {
        match block {
            StructuralNode::Paragraph(paragraph) => StructuralNode::Paragraph(self.paragraph(paragraph)),
            StructuralNode::Table(table) => {
                let mut table = table.clone();
                for cell in table.cells_mut() {
                    *cell = self.cell(cell);
                }
                StructuralNode::Table(table)
            }
            StructuralNode::TableOfContents(toc) => {
                let mut toc = toc.clone();
                toc.content = self.blocks(&toc.content);
                StructuralNode::TableOfContents(toc)
            }
            StructuralNode::SectionBreak(_)
            | StructuralNode::BlockEquation(_)
            | StructuralNode::Opaque(_) => block.clone(),
        }
    }

    fn cell(&self, cell: &TableCell) -> TableCell {
        let content = self.blocks(&cell.content);
        if content.is_empty() {
            return TableCell::new(vec![StructuralNode::Paragraph(Paragraph::default())]);
        }
        TableCell::new(content)
    }

    fn paragraph(&self, paragraph: &Paragraph) -> Paragraph {
        normalize_paragraph(paragraph, self.named_styles, self.keep_opaque)
    }
}

fn normalize_paragraph(paragraph: &Paragraph, named_styles: &NamedStyles, keep_opaque: bool) -> Paragraph {
    let inherited = inherited_text_style(paragraph.style.as_ref(), named_styles);

    let mut elements: Vec<InlineNode> = Vec::with_capacity(paragraph.elements.len());
    for element in &paragraph.elements {
        if !keep_opaque && matches!(element, InlineNode::Opaque(_)) {
            continue;
        }
        let element = normalize_inline(element, &inherited);
        if let InlineNode::TextRun(run) = &element {
            if run.content.is_empty() {
                continue;
            }
            if let Some(InlineNode::TextRun(previous)) = elements.last_mut() {
                if previous.style == run.style {
                    previous.content.push_str(&run.content);
                    continue;
                }
            }
        }
        elements.push(element);
    }

    Paragraph {
        elements,
        style: paragraph.style.as_ref().and_then(normalize_paragraph_style),
        list: paragraph.list.as_ref().map(|list| {
            let mut list = list.clone();
            list.list_id.clear();
            list
        }),
    }
}

fn normalize_paragraph_style(style: &ParagraphStyle) -> Option<ParagraphStyle> {
    let mut style = style.clone();
    style.heading_id = None;
    if style.named_style == Some(NamedStyleType::NormalText) {
        style.named_style = None;
    }
    (style != ParagraphStyle::default()).then_some(style)
}

fn normalize_inline(element: &InlineNode, inherited: &TextStyle) -> InlineNode {
    let style = |style: &Option<TextStyle>| {
        style
            .as_ref()
            .map(|style| strip_inherited(style, inherited))
            .filter(|style| !style.is_empty())
    };
    match element {
        InlineNode::TextRun(run) => InlineNode::TextRun(TextRun {
            content: run.content.clone(),
            style: style(&run.style),
            suggested_deletion_ids: Vec::new(),
        }),
        InlineNode::InlineImage(image) => {
            let mut image = image.clone();
            if !image.object_id.is_empty() {
                image.content_uri = None;
            }
            image.style = style(&image.style);
            InlineNode::InlineImage(image)
        }
        InlineNode::PageBreak(styled) => {
            InlineNode::PageBreak(Styled { style: style(&styled.style) })
        }
        InlineNode::ColumnBreak(styled) => {
            InlineNode::ColumnBreak(Styled { style: style(&styled.style) })
        }
        InlineNode::InlineEquation(styled) => {
            InlineNode::InlineEquation(Styled { style: style(&styled.style) })
        }
        InlineNode::Rule => InlineNode::Rule,
        InlineNode::Opaque(opaque) => InlineNode::Opaque(opaque.clone()),
        InlineNode::FootnoteRef(reference) => {
            let mut reference = reference.clone();
            reference.style = style(&reference.style);
            InlineNode::FootnoteRef(reference)
        }
        InlineNode::DateMention(date) => {
            let mut date = date.clone();
            date.style = style(&date.style);
            InlineNode::DateMention(date)
        }
        InlineNode::PersonMention(person) => {
            let mut person = person.clone();
            person.style = style(&person.style);
            InlineNode::PersonMention(person)
        }
        InlineNode::RichLink(link) => {
            let mut link = link.clone();
            link.style = style(&link.style);
            InlineNode::RichLink(link)
        }
        InlineNode::AutoText(auto) => {
            let mut auto = auto.clone();
            auto.style = style(&auto.style);
            InlineNode::AutoText(auto)
        }
    }
}

/// Drops fields whose value the run would inherit anyway. An explicit
/// `false` on a toggle the ancestors leave unset is a restatement too.
fn strip_inherited(style: &TextStyle, inherited: &TextStyle) -> TextStyle {
    fn toggle(own: Option<bool>, inherited: Option<bool>) -> Option<bool> {
        match own {
            Some(value) if value == inherited.unwrap_or(false) => None,
            other => other,
        }
    }
    fn value<T: Clone + PartialEq>(own: &Option<T>, inherited: &Option<T>) -> Option<T> {
        match own {
            Some(_) if own == inherited => None,
            other => other.clone(),
        }
    }

    TextStyle {
        bold: toggle(style.bold, inherited.bold),
        italic: toggle(style.italic, inherited.italic),
        strikethrough: toggle(style.strikethrough, inherited.strikethrough),
        underline: toggle(style.underline, inherited.underline),
        foreground_color: value(&style.foreground_color, &inherited.foreground_color),
        background_color: value(&style.background_color, &inherited.background_color),
        font_family: value(&style.font_family, &inherited.font_family),
        font_size: value(&style.font_size, &inherited.font_size),
        baseline_offset: value(&style.baseline_offset, &inherited.baseline_offset),
        link: value(&style.link, &inherited.link),
    }
}
