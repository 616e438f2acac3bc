//! Linearizes segments into the token streams the differ compares.
//!
//! Text becomes word tokens (a word carries its leading whitespace, so
//! `"hello world"` is `["hello", " world"]`) and every paragraph contributes
//! a closing `ParagraphEnd` token. Tables are spelled out with one-unit
//! sentinels around their cells (table start, row start, cell start, table
//! end), so cell text is tokenized like any other text. Everything else
//! (section breaks, tables of contents, non-text inline nodes) is one
//! object token. Each token knows its start index and its length in UTF-16
//! code units, the addressing unit of the remote service.
//!
//! Opaque placeholders produce no tokens. They are recorded as hidden spans
//! instead, and token indices skip them: a token's `start` is its position
//! in the visible text. Text on both sides of a placeholder is tokenized as
//! if the placeholder were not there.
//!
//! Lengths follow the remote model: a paragraph end and every non-text
//! inline node cost one unit; a table costs
//! `1 + Σrows(1 + Σcells(1 + content)) + 1`; a table of contents costs
//! `1 + content + 1`.

use crate::common::paths::index_base;
use crate::ir::equality::normalize_blocks_keeping_opaque;
use crate::ir::nodes::{
    InlineNode, ListMembership, Paragraph, Segment, SegmentKey, StructuralNode, Table,
};
use crate::ir::style::{resolve_text_style, NamedStyleType, NamedStyles, ParagraphStyle, TextStyle};
use std::ops::Range;

pub fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

pub fn inline_len(node: &InlineNode) -> usize {
    match node {
        InlineNode::TextRun(run) => utf16_len(&run.content),
        InlineNode::Opaque(opaque) => opaque.length,
        _ => 1,
    }
}

pub fn paragraph_len(paragraph: &Paragraph) -> usize {
    paragraph.elements.iter().map(inline_len).sum::<usize>() + 1
}

pub fn table_len(table: &Table) -> usize {
    let rows: usize = (0..table.rows())
        .map(|row| {
            1 + table
                .row(row)
                .iter()
                .map(|cell| 1 + blocks_len(&cell.content))
                .sum::<usize>()
        })
        .sum();
    1 + rows + 1
}

pub fn block_len(node: &StructuralNode) -> usize {
    match node {
        StructuralNode::Paragraph(paragraph) => paragraph_len(paragraph),
        StructuralNode::Table(table) => table_len(table),
        StructuralNode::TableOfContents(toc) => 1 + blocks_len(&toc.content) + 1,
        StructuralNode::SectionBreak(_) | StructuralNode::BlockEquation(_) => 1,
        StructuralNode::Opaque(opaque) => opaque.length,
    }
}

pub fn blocks_len(blocks: &[StructuralNode]) -> usize {
    blocks.iter().map(block_len).sum()
}

/// A stretch of a word sharing one markup style.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleSpan {
    pub len: usize,
    pub style: TextStyle,
}

/// Payload of an object token.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectNode {
    Inline(InlineNode),
    Block(StructuralNode),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Word {
        text: String,
        spans: Vec<StyleSpan>,
    },
    ParagraphEnd {
        /// Index of the paragraph's first code unit.
        paragraph_start: usize,
        style: ParagraphStyle,
        list: Option<ListMembership>,
        /// Last paragraph of a table cell.
        closes_cell: bool,
    },
    Object {
        /// Canonical JSON of the node; equal keys mean equal objects.
        key: String,
        node: ObjectNode,
    },
    TableStart {
        /// Same shape as the table, every cell holding one empty paragraph.
        empty: Table,
        /// Token index of the matching `TableEnd`.
        end: usize,
        /// Token ranges of every cell's content, row-major.
        cells: Vec<Range<usize>>,
    },
    RowStart,
    CellStart,
    TableEnd,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Visible code-unit index.
    pub start: usize,
    pub len: usize,
}

impl Token {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Whether two tokens are the same content, ignoring style. Tables
    /// only need the same shape; their cells are compared one by one.
    pub fn same_content(&self, other: &Token) -> bool {
        match (&self.kind, &other.kind) {
            (TokenKind::Word { text: a, .. }, TokenKind::Word { text: b, .. }) => a == b,
            (TokenKind::ParagraphEnd { .. }, TokenKind::ParagraphEnd { .. }) => true,
            (TokenKind::Object { key: a, .. }, TokenKind::Object { key: b, .. }) => a == b,
            (TokenKind::TableStart { empty: a, .. }, TokenKind::TableStart { empty: b, .. }) => {
                a.rows() == b.rows() && a.columns() == b.columns()
            }
            (TokenKind::RowStart, TokenKind::RowStart)
            | (TokenKind::CellStart, TokenKind::CellStart)
            | (TokenKind::TableEnd, TokenKind::TableEnd) => true,
            _ => false,
        }
    }

    pub fn is_paragraph_end(&self) -> bool {
        matches!(self.kind, TokenKind::ParagraphEnd { .. })
    }

    /// True when `index` falls strictly inside a surrogate pair of this token.
    pub fn splits_surrogate_at(&self, index: usize) -> bool {
        let TokenKind::Word { text, .. } = &self.kind else {
            return false;
        };
        if index <= self.start || index >= self.end() {
            return false;
        }
        text.encode_utf16()
            .nth(index - self.start)
            .map(|unit| (0xDC00..=0xDFFF).contains(&unit))
            .unwrap_or(false)
    }
}

/// Remote content with no tokens of its own, sitting just before the
/// visible code unit `at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HiddenSpan {
    pub at: usize,
    pub len: usize,
}

/// The token stream of one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSegment {
    pub key: SegmentKey,
    pub base: usize,
    pub tokens: Vec<Token>,
    /// Ordered by `at`.
    pub hidden: Vec<HiddenSpan>,
}

impl LinearSegment {
    /// Visible index just past the last token.
    pub fn end(&self) -> usize {
        self.tokens.last().map(Token::end).unwrap_or(self.base)
    }

    /// Remote index just past the segment's content.
    pub fn remote_end(&self) -> usize {
        self.end() + self.hidden.iter().map(|span| span.len).sum::<usize>()
    }

    /// Remote index of the visible code unit `index`.
    pub fn remote_index(&self, index: usize) -> usize {
        index
            + self
                .hidden
                .iter()
                .take_while(|span| span.at <= index)
                .map(|span| span.len)
                .sum::<usize>()
    }

    /// Remote range covering the visible `range` and every hidden span
    /// strictly inside it.
    pub fn remote_range(&self, range: Range<usize>) -> Range<usize> {
        let end = range.end
            + self
                .hidden
                .iter()
                .take_while(|span| span.at < range.end)
                .map(|span| span.len)
                .sum::<usize>();
        self.remote_index(range.start)..end
    }

    pub fn splits_surrogate(&self, index: usize) -> bool {
        self.tokens.iter().any(|token| token.splits_surrogate_at(index))
    }

    /// Splits a token range into units for matching: a whole table is one
    /// unit, every other token is its own.
    pub fn units(&self, range: Range<usize>) -> Vec<Range<usize>> {
        let mut units = Vec::new();
        let mut index = range.start;
        while index < range.end {
            let next = match &self.tokens[index].kind {
                TokenKind::TableStart { end, .. } => end + 1,
                _ => index + 1,
            };
            units.push(index..next.min(range.end));
            index = next;
        }
        units
    }
}

/// Linearizes a segment after normalizing away volatile fields.
pub fn linearize(tab_id: &str, segment: &Segment, named_styles: &NamedStyles) -> LinearSegment {
    let base = index_base(segment.kind);
    let mut builder = Builder {
        named_styles,
        cursor: base,
        tokens: Vec::new(),
        hidden: Vec::new(),
    };
    builder.blocks(normalize_blocks_keeping_opaque(&segment.content, named_styles), false);
    LinearSegment {
        key: SegmentKey::new(tab_id, segment.id.clone()),
        base,
        tokens: builder.tokens,
        hidden: builder.hidden,
    }
}

struct Builder<'a> {
    named_styles: &'a NamedStyles,
    cursor: usize,
    tokens: Vec<Token>,
    hidden: Vec<HiddenSpan>,
}

impl Builder<'_> {
    fn push(&mut self, kind: TokenKind, len: usize) {
        self.tokens.push(Token {
            kind,
            start: self.cursor,
            len,
        });
        self.cursor += len;
    }

    fn hide(&mut self, at: usize, len: usize) {
        if len > 0 {
            self.hidden.push(HiddenSpan { at, len });
        }
    }

    fn object(&mut self, node: ObjectNode, len: usize) {
        let key = match &node {
            ObjectNode::Inline(inline) => serde_json::to_string(inline),
            ObjectNode::Block(block) => serde_json::to_string(block),
        }
        .unwrap_or_default();
        self.push(TokenKind::Object { key, node }, len);
    }

    fn blocks(&mut self, blocks: Vec<StructuralNode>, in_cell: bool) {
        let last = blocks.len().saturating_sub(1);
        for (index, block) in blocks.into_iter().enumerate() {
            match block {
                StructuralNode::Paragraph(paragraph) => {
                    self.paragraph(paragraph, in_cell && index == last)
                }
                StructuralNode::Table(table) => self.table(&table),
                StructuralNode::Opaque(opaque) => self.hide(self.cursor, opaque.length),
                other => {
                    let len = block_len(&other);
                    self.object(ObjectNode::Block(other), len);
                }
            }
        }
    }

    fn table(&mut self, table: &Table) {
        let first = self.tokens.len();
        self.push(
            TokenKind::TableStart {
                empty: table.emptied(),
                end: first,
                cells: Vec::new(),
            },
            1,
        );
        let mut cells = Vec::with_capacity(table.rows() * table.columns());
        for row in 0..table.rows() {
            self.push(TokenKind::RowStart, 1);
            for cell in table.row(row) {
                self.push(TokenKind::CellStart, 1);
                let start = self.tokens.len();
                self.blocks(cell.content.clone(), true);
                cells.push(start..self.tokens.len());
            }
        }
        let end = self.tokens.len();
        self.push(TokenKind::TableEnd, 1);

        if let TokenKind::TableStart {
            end: table_end,
            cells: table_cells,
            ..
        } = &mut self.tokens[first].kind
        {
            *table_end = end;
            *table_cells = cells;
        }
    }

    fn paragraph(&mut self, paragraph: Paragraph, closes_cell: bool) {
        let paragraph_start = self.cursor;
        let mut stretch: Vec<(String, TextStyle)> = Vec::new();
        let mut stretch_len = 0;

        for element in &paragraph.elements {
            match element {
                InlineNode::TextRun(run) => {
                    let style = resolve_text_style(
                        run.style.as_ref(),
                        paragraph.style.as_ref(),
                        self.named_styles,
                    )
                    .markup_projection();
                    stretch_len += utf16_len(&run.content);
                    stretch.push((run.content.clone(), style));
                }
                InlineNode::Opaque(opaque) => self.hide(self.cursor + stretch_len, opaque.length),
                other => {
                    self.words(std::mem::take(&mut stretch));
                    stretch_len = 0;
                    self.object(ObjectNode::Inline(other.clone()), 1);
                }
            }
        }
        self.words(stretch);

        let named = paragraph
            .style
            .as_ref()
            .and_then(|style| style.named_style)
            .unwrap_or(NamedStyleType::NormalText);
        self.push(
            TokenKind::ParagraphEnd {
                paragraph_start,
                style: ParagraphStyle::named(named),
                list: paragraph.list.clone(),
                closes_cell,
            },
            1,
        );
    }

    /// Splits consecutive text runs into word tokens with per-word style spans.
    fn words(&mut self, stretch: Vec<(String, TextStyle)>) {
        if stretch.is_empty() {
            return;
        }
        // Style of every code unit, run by run.
        let mut run_bounds: Vec<(usize, usize, &TextStyle)> = Vec::new();
        let mut text = String::new();
        let mut offset = 0;
        for (content, style) in &stretch {
            let len = utf16_len(content);
            run_bounds.push((offset, offset + len, style));
            offset += len;
            text.push_str(content);
        }

        let mut word_start = 0;
        let mut unit_start = 0;
        let mut unit = 0;
        let mut previous_whitespace = true;
        let mut words: Vec<(usize, usize, usize)> = Vec::new();
        for (byte, c) in text.char_indices() {
            if c.is_whitespace() && !previous_whitespace && byte > word_start {
                words.push((word_start, byte, unit_start));
                word_start = byte;
                unit_start = unit;
            }
            previous_whitespace = c.is_whitespace();
            unit += c.len_utf16();
        }
        if word_start < text.len() {
            words.push((word_start, text.len(), unit_start));
        }

        for (byte_start, byte_end, unit_start) in words {
            let word = &text[byte_start..byte_end];
            let len = utf16_len(word);
            let unit_end = unit_start + len;
            let mut spans: Vec<StyleSpan> = Vec::new();
            for &(run_start, run_end, style) in &run_bounds {
                let overlap_start = run_start.max(unit_start);
                let overlap_end = run_end.min(unit_end);
                if overlap_start >= overlap_end {
                    continue;
                }
                match spans.last_mut() {
                    Some(last) if &last.style == style => last.len += overlap_end - overlap_start,
                    _ => spans.push(StyleSpan {
                        len: overlap_end - overlap_start,
                        style: style.clone(),
                    }),
                }
            }
            self.push(
                TokenKind::Word {
                    text: word.to_string(),
                    spans,
                },
                len,
            );
        }
    }
}
