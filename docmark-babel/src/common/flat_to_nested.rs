//! Folds a flat event stream back into structural and inline nodes.
//!
//! # The High-Level Concept
//!
//! The reader emits events in document order; this module rebuilds the tree
//! with a stack of open containers. A `Start` event pushes a frame, the
//! matching `End` event pops it and hands the finished node to the nearest
//! block container below it (the segment root, a footnote definition or a
//! table cell). Inline events always go to the frame on top of the stack.
//!
//! # Lists
//!
//! Lists are not nodes of the document model. A list frame only allocates a
//! fresh list id; paragraphs finished inside list items receive list
//! membership whose nesting level is the number of open lists minus one,
//! and are emitted straight into the enclosing block container.
//!
//! # Markers
//!
//! Reserved comments arrive as [`Event::Marker`] / [`Event::CloseMarker`].
//! Self-contained markers become nodes immediately. A wrapping marker opens a
//! frame that captures its readable fallback until the closing marker; the
//! node is then taken from the side-channel record when one matches the
//! marker's token, or rebuilt from the fallback otherwise. A wrapping frame
//! that is never closed is finished as soon as a non-inline event arrives.
//!
//! # Table Cells
//!
//! A table cell collects inline content into a paragraph; a line break
//! finishes that paragraph and starts the next one, so a cell written as
//! `a<br>b` holds two paragraphs.

use crate::error::ParseError;
use crate::formats::markdown::markers::{self, MarkerRole};
use crate::ir::events::{Event, Marker, Span};
use crate::ir::nodes::{
    AutoText, BlockEquation, DateMention, FootnoteRef, InlineImage, InlineNode, ListMembership,
    Paragraph, PersonMention, PersonProperties, RichLink, RichLinkProperties, SectionBreak,
    StructuralNode, Styled, Table, TableCell, TableOfContents, TextRun,
};
use crate::ir::style::{NamedStyleType, ParagraphStyle, TextStyle, CODE_FONT_FAMILY};
use crate::metadata::MetadataRecord;
use serde::de::DeserializeOwned;

/// What the fold needs besides the events.
#[derive(Debug, Clone, Copy, Default)]
pub struct FoldContext<'a> {
    pub record: Option<&'a MetadataRecord>,
    /// Footnote ids of the base document in first-reference order, used
    /// when the record has no footnote id map.
    pub footnote_order: &'a [String],
}

impl FoldContext<'_> {
    /// Remote footnote id for a `[^label]` reference.
    pub fn footnote_id(&self, label: &str) -> String {
        if let Some(id) = self
            .record
            .and_then(|record| record.footnote_id_map.get(label))
        {
            return id.clone();
        }
        label
            .parse::<usize>()
            .ok()
            .and_then(|ordinal| ordinal.checked_sub(1))
            .and_then(|index| self.footnote_order.get(index))
            .cloned()
            .unwrap_or_else(|| format!("footnote-{label}"))
    }
}

/// Result of folding one segment's events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Folded {
    pub blocks: Vec<StructuralNode>,
    /// Footnote definitions as `(footnote id, content)`, in source order.
    pub footnotes: Vec<(String, Vec<StructuralNode>)>,
}

/// Folds `events` into blocks. Fails only when a side-channel record that a
/// marker points at does not describe a node.
pub fn events_to_blocks(events: &[Event], ctx: &FoldContext<'_>) -> Result<Folded, ParseError> {
    let mut folder = Folder {
        ctx,
        stack: vec![StackNode::Root(Vec::new())],
        footnotes: Vec::new(),
        lists_seen: 0,
    };
    for event in events {
        folder.event(event)?;
    }
    folder.finish()
}

#[derive(Debug, Default)]
struct InlineBuffer {
    elements: Vec<InlineNode>,
    spans: Vec<Span>,
}

impl InlineBuffer {
    fn style(&self, code: bool) -> Option<TextStyle> {
        let mut style = TextStyle::default();
        for span in &self.spans {
            match span {
                Span::Bold => style.bold = Some(true),
                Span::Italic => style.italic = Some(true),
                Span::Strikethrough => style.strikethrough = Some(true),
                Span::Underline => style.underline = Some(true),
                Span::Link(url) => style.link = Some(url.clone()),
            }
        }
        if code {
            style.font_family = Some(CODE_FONT_FAMILY.to_string());
        }
        (!style.is_empty()).then_some(style)
    }

    fn push_text(&mut self, text: &str, code: bool) {
        if text.is_empty() {
            return;
        }
        let style = self.style(code);
        if let Some(InlineNode::TextRun(last)) = self.elements.last_mut() {
            if last.style == style {
                last.content.push_str(text);
                return;
            }
        }
        self.elements.push(InlineNode::TextRun(TextRun {
            content: text.to_string(),
            style,
            suggested_deletion_ids: Vec::new(),
        }));
    }

    fn close(&mut self, span: &Span) {
        if let Some(position) = self.spans.iter().rposition(|open| open == span) {
            self.spans.remove(position);
        }
    }

    /// Empties the buffer, keeping open spans for the next line.
    fn take_elements(&mut self) -> Vec<InlineNode> {
        std::mem::take(&mut self.elements)
    }
}

/// Fallback content captured between a wrapping marker and its close.
#[derive(Debug)]
struct Wrap {
    marker: Marker,
    text: String,
    link: Option<String>,
    image: Option<InlineImage>,
}

#[derive(Debug)]
enum StackNode {
    Root(Vec<StructuralNode>),
    Footnote {
        id: String,
        blocks: Vec<StructuralNode>,
    },
    List {
        ordered: bool,
        list_id: String,
    },
    ListItem,
    Paragraph {
        style: Option<ParagraphStyle>,
        inline: InlineBuffer,
    },
    Table {
        rows: Vec<Vec<TableCell>>,
    },
    TableRow {
        cells: Vec<TableCell>,
    },
    TableCell {
        parts: Vec<StructuralNode>,
        inline: InlineBuffer,
        /// A block marker written as the whole of the current part.
        block: Option<StructuralNode>,
    },
    Wrap(Wrap),
}

struct Folder<'a> {
    ctx: &'a FoldContext<'a>,
    stack: Vec<StackNode>,
    footnotes: Vec<(String, Vec<StructuralNode>)>,
    lists_seen: usize,
}

impl Folder<'_> {
    fn event(&mut self, event: &Event) -> Result<(), ParseError> {
        if let Some(StackNode::Wrap(wrap)) = self.stack.last_mut() {
            match event {
                Event::Text(text) | Event::Code(text) => {
                    wrap.text.push_str(text);
                    return Ok(());
                }
                Event::StartSpan(Span::Link(url)) => {
                    wrap.link = Some(url.clone());
                    return Ok(());
                }
                Event::Image(image) => {
                    wrap.image = Some(image.clone());
                    return Ok(());
                }
                Event::StartSpan(_)
                | Event::EndSpan(_)
                | Event::LineBreak
                | Event::FootnoteRef(_)
                | Event::Marker(_) => return Ok(()),
                Event::CloseMarker => return self.finish_wrap(),
                _ => self.finish_wrap()?,
            }
        }

        match event {
            Event::StartParagraph => self.stack.push(StackNode::Paragraph {
                style: None,
                inline: InlineBuffer::default(),
            }),
            Event::StartHeading(level) => self.stack.push(StackNode::Paragraph {
                style: Some(ParagraphStyle::heading(*level)),
                inline: InlineBuffer::default(),
            }),
            Event::EndParagraph | Event::EndHeading => {
                if let Some(StackNode::Paragraph { style, inline }) =
                    self.pop_if(|node| matches!(node, StackNode::Paragraph { .. }))
                {
                    let paragraph = Paragraph {
                        elements: inline.elements,
                        style,
                        list: None,
                    };
                    self.emit_paragraph(paragraph);
                }
            }
            Event::EmptyParagraph => self.emit_paragraph(Paragraph::default()),

            Event::StartList { ordered } => {
                self.lists_seen += 1;
                self.stack.push(StackNode::List {
                    ordered: *ordered,
                    list_id: format!("list-{}", self.lists_seen),
                });
            }
            Event::EndList => {
                self.pop_if(|node| matches!(node, StackNode::List { .. }));
            }
            Event::StartListItem => self.stack.push(StackNode::ListItem),
            Event::EndListItem => {
                self.pop_if(|node| matches!(node, StackNode::ListItem));
            }

            Event::StartTable => self.stack.push(StackNode::Table { rows: Vec::new() }),
            Event::EndTable => {
                if let Some(StackNode::Table { rows }) =
                    self.pop_if(|node| matches!(node, StackNode::Table { .. }))
                {
                    if let Some(table) = build_table(rows)? {
                        self.emit_block(StructuralNode::Table(table));
                    }
                }
            }
            Event::StartTableRow => self.stack.push(StackNode::TableRow { cells: Vec::new() }),
            Event::EndTableRow => {
                if let Some(StackNode::TableRow { cells }) =
                    self.pop_if(|node| matches!(node, StackNode::TableRow { .. }))
                {
                    if let Some(StackNode::Table { rows }) = self.stack.last_mut() {
                        rows.push(cells);
                    }
                }
            }
            Event::StartTableCell => self.stack.push(StackNode::TableCell {
                parts: Vec::new(),
                inline: InlineBuffer::default(),
                block: None,
            }),
            Event::EndTableCell => {
                self.finish_cell_part();
                if let Some(StackNode::TableCell { parts, .. }) =
                    self.pop_if(|node| matches!(node, StackNode::TableCell { .. }))
                {
                    if let Some(StackNode::TableRow { cells }) = self.stack.last_mut() {
                        cells.push(TableCell::new(parts));
                    }
                }
            }

            Event::StartFootnoteDefinition(label) => self.stack.push(StackNode::Footnote {
                id: self.ctx.footnote_id(label),
                blocks: Vec::new(),
            }),
            Event::EndFootnoteDefinition => {
                if let Some(StackNode::Footnote { id, blocks }) =
                    self.pop_if(|node| matches!(node, StackNode::Footnote { .. }))
                {
                    self.footnotes.push((id, blocks));
                }
            }

            Event::CodeBlock(literal) => {
                for line in literal.lines() {
                    let paragraph = if line.is_empty() {
                        Paragraph::default()
                    } else {
                        Paragraph::new(vec![InlineNode::TextRun(TextRun::styled(
                            line,
                            TextStyle::code(),
                        ))])
                    };
                    self.emit_paragraph(paragraph);
                }
            }
            Event::ThematicBreak => self.emit_paragraph(Paragraph::new(vec![InlineNode::Rule])),

            Event::StartSpan(span) => {
                if let Some(inline) = self.inline() {
                    inline.spans.push(span.clone());
                }
            }
            Event::EndSpan(span) => {
                if let Some(inline) = self.inline() {
                    inline.close(span);
                }
            }
            Event::Text(text) => {
                if let Some(inline) = self.inline() {
                    inline.push_text(text, false);
                }
            }
            Event::Code(text) => {
                if let Some(inline) = self.inline() {
                    inline.push_text(text, true);
                }
            }
            Event::LineBreak => {
                if matches!(self.stack.last(), Some(StackNode::TableCell { .. })) {
                    self.finish_cell_part();
                } else if let Some(inline) = self.inline() {
                    inline.push_text("\u{000B}", false);
                }
            }
            Event::Image(image) => {
                let style = self.inline().and_then(|inline| inline.style(false));
                let image = InlineImage {
                    style,
                    ..image.clone()
                };
                self.push_inline(InlineNode::InlineImage(image));
            }
            Event::FootnoteRef(label) => {
                let reference = FootnoteRef {
                    footnote_id: self.ctx.footnote_id(label),
                    style: None,
                };
                self.push_inline(InlineNode::FootnoteRef(reference));
            }
            Event::Marker(marker) => self.marker(marker)?,
            // A close without an open wrap has nothing to close.
            Event::CloseMarker => {}
        }
        Ok(())
    }

    fn marker(&mut self, marker: &Marker) -> Result<(), ParseError> {
        match markers::role(&marker.kind) {
            Some(MarkerRole::Wrapped) => {
                if self.inline().is_some() {
                    self.stack.push(StackNode::Wrap(Wrap {
                        marker: marker.clone(),
                        text: String::new(),
                        link: None,
                        image: None,
                    }));
                }
            }
            Some(MarkerRole::Inline) => {
                let node = match recorded::<InlineNode>(self.ctx.record, marker)? {
                    Some(node) => node,
                    None => match marker.kind.as_str() {
                        "pageBreak" => InlineNode::PageBreak(Styled::default()),
                        "columnBreak" => InlineNode::ColumnBreak(Styled::default()),
                        "equation" => InlineNode::InlineEquation(Styled::default()),
                        _ => InlineNode::Rule,
                    },
                };
                self.push_inline(node);
            }
            Some(MarkerRole::Block) => {
                let node = match recorded::<StructuralNode>(self.ctx.record, marker)? {
                    Some(node) => node,
                    None => match marker.kind.as_str() {
                        "sectionBreak" => StructuralNode::SectionBreak(SectionBreak::default()),
                        "tableOfContents" => {
                            StructuralNode::TableOfContents(TableOfContents::default())
                        }
                        _ => StructuralNode::BlockEquation(BlockEquation::default()),
                    },
                };
                match self.stack.last_mut() {
                    Some(StackNode::TableCell { block, .. }) => *block = Some(node),
                    _ => self.emit_block(node),
                }
            }
            Some(MarkerRole::Heading) => {
                if let Some(StackNode::Paragraph {
                    style: Some(style), ..
                }) = self.stack.last_mut()
                {
                    style.named_style = Some(if marker.kind == "title" {
                        NamedStyleType::Title
                    } else {
                        NamedStyleType::Subtitle
                    });
                }
            }
            None => {}
        }
        Ok(())
    }

    fn finish_wrap(&mut self) -> Result<(), ParseError> {
        let Some(StackNode::Wrap(wrap)) =
            self.pop_if(|node| matches!(node, StackNode::Wrap(_)))
        else {
            return Ok(());
        };
        let node = match recorded::<InlineNode>(self.ctx.record, &wrap.marker)? {
            Some(node) => Some(node),
            None => fallback(wrap),
        };
        if let Some(node) = node {
            self.push_inline(node);
        }
        Ok(())
    }

    fn finish_cell_part(&mut self) {
        if let Some(StackNode::TableCell {
            parts,
            inline,
            block,
        }) = self.stack.last_mut()
        {
            let elements = inline.take_elements();
            match block.take() {
                Some(node) if elements.is_empty() => parts.push(node),
                Some(node) => {
                    parts.push(node);
                    parts.push(StructuralNode::Paragraph(Paragraph::new(elements)));
                }
                None => parts.push(StructuralNode::Paragraph(Paragraph::new(elements))),
            }
        }
    }

    fn inline(&mut self) -> Option<&mut InlineBuffer> {
        match self.stack.last_mut() {
            Some(StackNode::Paragraph { inline, .. }) | Some(StackNode::TableCell { inline, .. }) => {
                Some(inline)
            }
            _ => None,
        }
    }

    fn push_inline(&mut self, node: InlineNode) {
        if let Some(inline) = self.inline() {
            inline.elements.push(node);
        }
    }

    /// Gives a finished paragraph the list membership of its position.
    fn emit_paragraph(&mut self, mut paragraph: Paragraph) {
        let mut depth = 0;
        let mut innermost: Option<(bool, &str)> = None;
        let mut in_item = false;
        for node in self.stack.iter().rev() {
            match node {
                StackNode::Root(_) | StackNode::Footnote { .. } | StackNode::TableCell { .. } => {
                    break
                }
                StackNode::ListItem => in_item = true,
                StackNode::List { ordered, list_id } => {
                    depth += 1;
                    innermost.get_or_insert((*ordered, list_id.as_str()));
                }
                _ => {}
            }
        }
        if let (true, Some((ordered, list_id))) = (in_item, innermost) {
            paragraph.list = Some(ListMembership {
                list_id: list_id.to_string(),
                nesting_level: depth - 1,
                ordered,
            });
        }
        self.emit_block(StructuralNode::Paragraph(paragraph));
    }

    fn emit_block(&mut self, block: StructuralNode) {
        for node in self.stack.iter_mut().rev() {
            match node {
                StackNode::Root(blocks)
                | StackNode::Footnote { blocks, .. }
                | StackNode::TableCell { parts: blocks, .. } => {
                    blocks.push(block);
                    return;
                }
                _ => {}
            }
        }
    }

    fn pop_if(&mut self, accept: impl Fn(&StackNode) -> bool) -> Option<StackNode> {
        if self.stack.len() > 1 && self.stack.last().is_some_and(accept) {
            self.stack.pop()
        } else {
            None
        }
    }

    /// Closes whatever is still open and returns the root content.
    fn finish(mut self) -> Result<Folded, ParseError> {
        while self.stack.len() > 1 {
            match self.stack.last() {
                Some(StackNode::Wrap(_)) => self.finish_wrap()?,
                Some(StackNode::Paragraph { .. }) => self.event(&Event::EndParagraph)?,
                Some(StackNode::Footnote { .. }) => self.event(&Event::EndFootnoteDefinition)?,
                _ => {
                    self.stack.pop();
                }
            }
        }
        let blocks = match self.stack.pop() {
            Some(StackNode::Root(blocks)) => blocks,
            _ => Vec::new(),
        };
        Ok(Folded {
            blocks,
            footnotes: self.footnotes,
        })
    }
}

/// Pads short rows with empty cells so the grid is rectangular.
fn build_table(mut rows: Vec<Vec<TableCell>>) -> Result<Option<Table>, ParseError> {
    let columns = rows.first().map(Vec::len).unwrap_or(0);
    if columns == 0 {
        return Ok(None);
    }
    for row in &mut rows {
        row.resize_with(columns, || TableCell::text(""));
    }
    Table::new(rows)
        .map(Some)
        .map_err(|err| ParseError::new(err.to_string(), 0))
}

/// The node a marker's token points at, when the record has one of the
/// marker's kind.
fn recorded<T: DeserializeOwned>(
    record: Option<&MetadataRecord>,
    marker: &Marker,
) -> Result<Option<T>, ParseError> {
    let Some(token) = &marker.token else {
        return Ok(None);
    };
    let Some(entry) = record.and_then(|record| record.find(token)) else {
        return Ok(None);
    };
    if entry.kind != marker.kind {
        return Ok(None);
    }
    serde_json::from_value(entry.fields.clone())
        .map(Some)
        .map_err(|err| {
            ParseError::new(
                format!("record {token} is not a valid {}: {err}", marker.kind),
                marker.line,
            )
        })
}

/// Degraded node rebuilt from the readable fallback alone.
fn fallback(wrap: Wrap) -> Option<InlineNode> {
    let Wrap {
        marker,
        text,
        link,
        image,
    } = wrap;
    match marker.kind.as_str() {
        "person" => {
            let email = link
                .as_deref()
                .and_then(|link| link.strip_prefix("mailto:"))
                .map(str::to_string)
                .unwrap_or_else(|| text.clone());
            let name = (!text.is_empty() && text != email).then_some(text);
            Some(InlineNode::PersonMention(PersonMention {
                properties: PersonProperties {
                    person_id: None,
                    name,
                    email,
                },
                style: None,
            }))
        }
        "richLink" => Some(InlineNode::RichLink(RichLink {
            properties: RichLinkProperties {
                rich_link_id: None,
                title: text,
                uri: link.unwrap_or_default(),
                mime_type: None,
            },
            style: None,
        })),
        "date" => Some(InlineNode::DateMention(DateMention {
            display_text: text,
            ..DateMention::default()
        })),
        "autoText" => Some(InlineNode::AutoText(AutoText::default())),
        "image" => image.map(InlineNode::InlineImage),
        _ => None,
    }
}
