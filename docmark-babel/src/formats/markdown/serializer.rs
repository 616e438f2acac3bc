//! Markdown writer.
//!
//! Renders one segment to markdown text plus its side-channel record.
//! Blocks are first rendered to chunks so that items of one list can be
//! joined tightly while every other block is separated by a blank line.
//! Inline content is rendered from pieces: each text piece knows the
//! emphasis marks it needs relative to its paragraph's named style, and the
//! renderer opens and closes delimiters only where the marks change, so
//! adjacent runs with the same style share one delimited span.

use super::markers::{self, CLOSE_MARKER};
use super::MarkdownOptions;
use crate::common::paths::image_placeholder;
use crate::error::Warning;
use crate::ir::nodes::{
    InlineImage, InlineNode, Paragraph, Segment, SegmentKey, SegmentKind, StructuralNode, Tab,
    Table, TableCell,
};
use crate::ir::style::{
    inherited_text_style, resolve_text_style, NamedStyleType, NamedStyles, TextStyle,
};
use crate::ir::traverse::{footnote_order, NodePath, PathStep};
use crate::metadata::{MetadataMode, MetadataRecord};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

/// Separates two adjacent lists that would otherwise merge.
pub const LIST_SEPARATOR: &str = "<!-- end list -->";

const LINE_BREAK: &str = "<br>";

/// Rendered form of one segment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SerializedSegment {
    pub text: String,
    pub metadata: MetadataRecord,
    pub warnings: Vec<Warning>,
}

pub struct SerializeContext<'a> {
    /// Output file, relative to the document directory. Image placeholders
    /// are written relative to it.
    pub file_path: &'a Path,
    pub named_styles: &'a NamedStyles,
    pub options: &'a MarkdownOptions,
}

/// Renders `segment` of `tab`. A body segment is followed by the
/// definitions of every footnote of the tab, numbered in first-reference
/// order.
pub fn serialize_segment(
    tab: &Tab,
    segment: &Segment,
    ctx: &SerializeContext<'_>,
) -> SerializedSegment {
    let order = footnote_order(tab);
    let mut writer = Writer {
        file_path: ctx.file_path,
        named_styles: ctx.named_styles,
        options: ctx.options,
        key: SegmentKey::new(&tab.id, segment.id.clone()),
        steps: Vec::new(),
        ordinals: order
            .iter()
            .enumerate()
            .map(|(index, id)| (id.clone(), index + 1))
            .collect(),
        record: MetadataRecord::default(),
        warnings: Vec::new(),
    };

    let chunks = writer.blocks(&segment.content);
    let mut text = join(chunks);
    if segment.kind == SegmentKind::Body && !order.is_empty() {
        let definitions = writer.footnote_definitions(tab, &order);
        if !text.is_empty() {
            text.push_str("\n\n");
        }
        text.push_str(&definitions);
    }
    if !text.is_empty() {
        text.push('\n');
    }

    SerializedSegment {
        text,
        metadata: writer.record,
        warnings: writer.warnings,
    }
}

struct Writer<'a> {
    file_path: &'a Path,
    named_styles: &'a NamedStyles,
    options: &'a MarkdownOptions,
    key: SegmentKey,
    steps: Vec<PathStep>,
    ordinals: BTreeMap<String, usize>,
    record: MetadataRecord,
    warnings: Vec<Warning>,
}

enum Chunk {
    Block(String),
    Item { list_id: String, text: String },
}

fn join(chunks: Vec<Chunk>) -> String {
    let mut out = String::new();
    let mut previous_list: Option<String> = None;
    for chunk in chunks {
        let (text, list) = match chunk {
            Chunk::Block(text) => (text, None),
            Chunk::Item { list_id, text } => (text, Some(list_id)),
        };
        if !out.is_empty() {
            match (&previous_list, &list) {
                (Some(previous), Some(current)) if previous == current => out.push('\n'),
                (Some(_), Some(_)) => {
                    out.push_str("\n\n");
                    out.push_str(LIST_SEPARATOR);
                    out.push_str("\n\n");
                }
                _ => out.push_str("\n\n"),
            }
        }
        out.push_str(&text);
        previous_list = list;
    }
    out
}

impl Writer<'_> {
    fn blocks(&mut self, blocks: &[StructuralNode]) -> Vec<Chunk> {
        let mut chunks = Vec::with_capacity(blocks.len());
        // (list id, rendered level) of the previous item
        let mut previous_item: Option<(String, usize)> = None;
        let mut index = 0;

        while index < blocks.len() {
            self.steps.push(PathStep::Block(index));
            let block = &blocks[index];
            index += 1;

            match block {
                StructuralNode::Paragraph(paragraph) if self.is_code_line(paragraph) => {
                    let mut lines = vec![paragraph.plain_text()];
                    while let Some(StructuralNode::Paragraph(next)) = blocks.get(index) {
                        if !self.is_code_line(next) {
                            break;
                        }
                        lines.push(next.plain_text());
                        index += 1;
                    }
                    previous_item = None;
                    chunks.push(Chunk::Block(code_fence(&lines)));
                }
                StructuralNode::Paragraph(paragraph) => match &paragraph.list {
                    Some(list) => {
                        // Markdown cannot skip nesting levels.
                        let level = match &previous_item {
                            Some((list_id, previous)) if list_id == &list.list_id => {
                                list.nesting_level.min(previous + 1)
                            }
                            _ => 0,
                        };
                        previous_item = Some((list.list_id.clone(), level));
                        let bullet = if list.ordered { "1. " } else { "- " };
                        let text = format!(
                            "{}{bullet}{}",
                            "    ".repeat(level),
                            self.paragraph(paragraph)
                        );
                        chunks.push(Chunk::Item {
                            list_id: list.list_id.clone(),
                            text,
                        });
                    }
                    None => {
                        previous_item = None;
                        chunks.push(Chunk::Block(self.paragraph(paragraph)));
                    }
                },
                StructuralNode::Table(table) => {
                    previous_item = None;
                    chunks.push(Chunk::Block(self.table(table)));
                }
                StructuralNode::Opaque(_) => {}
                other => {
                    previous_item = None;
                    chunks.push(Chunk::Block(self.block_marker(other)));
                }
            }
            self.steps.pop();
        }
        chunks
    }

    /// A paragraph made only of monospace text, rendered inside a fence.
    fn is_code_line(&self, paragraph: &Paragraph) -> bool {
        if paragraph.list.is_some()
            || paragraph.elements.is_empty()
            || named_style(paragraph) != NamedStyleType::NormalText
        {
            return false;
        }
        if inherited_text_style(paragraph.style.as_ref(), self.named_styles).is_monospace() {
            return false;
        }
        let code = TextStyle::code().markup_projection();
        paragraph.elements.iter().all(|element| match element {
            InlineNode::TextRun(run) => {
                !run.content.is_empty()
                    && !run.content.contains(is_line_break)
                    && resolve_text_style(
                        run.style.as_ref(),
                        paragraph.style.as_ref(),
                        self.named_styles,
                    )
                    .markup_projection()
                        == code
            }
            _ => false,
        })
    }

    fn paragraph(&mut self, paragraph: &Paragraph) -> String {
        let named = named_style(paragraph);
        if named == NamedStyleType::NormalText
            && matches!(paragraph.elements.as_slice(), [InlineNode::Rule])
        {
            return "---".to_string();
        }

        let content = self.inline(paragraph, false);
        match named {
            NamedStyleType::NormalText if content.is_empty() => LINE_BREAK.to_string(),
            NamedStyleType::NormalText => escape_line_start(content),
            NamedStyleType::Title => format!(
                "# {}{}",
                markers::render("title", None),
                escape_heading_end(content)
            ),
            NamedStyleType::Subtitle => format!(
                "## {}{}",
                markers::render("subtitle", None),
                escape_heading_end(content)
            ),
            heading => {
                let hashes = "#".repeat(usize::from(heading.heading_level().unwrap_or(1)));
                if content.is_empty() {
                    hashes
                } else {
                    format!("{hashes} {}", escape_heading_end(content))
                }
            }
        }
    }

    fn inline(&mut self, paragraph: &Paragraph, in_table: bool) -> String {
        let inherited = inherited_text_style(paragraph.style.as_ref(), self.named_styles);
        let mut pieces = Vec::with_capacity(paragraph.elements.len());

        for (index, element) in paragraph.elements.iter().enumerate() {
            self.steps.push(PathStep::Element(index));
            match element {
                InlineNode::TextRun(run) => {
                    let effective = resolve_text_style(
                        run.style.as_ref(),
                        paragraph.style.as_ref(),
                        self.named_styles,
                    );
                    text_pieces(&run.content, &effective, &inherited, &mut pieces);
                }
                InlineNode::Opaque(_) => {}
                other => {
                    let raw = self.inline_object(other, in_table);
                    pieces.push(Piece::Raw(raw));
                }
            }
            self.steps.pop();
        }

        protect_edges(&render_pieces(&pieces, in_table))
    }

    fn inline_object(&mut self, node: &InlineNode, in_table: bool) -> String {
        match node {
            InlineNode::TextRun(run) => escape(&run.content, in_table),
            InlineNode::FootnoteRef(reference) => {
                let ordinal = self
                    .ordinals
                    .get(&reference.footnote_id)
                    .copied()
                    .unwrap_or_default();
                format!("[^{ordinal}]")
            }
            InlineNode::PageBreak(_)
            | InlineNode::ColumnBreak(_)
            | InlineNode::InlineEquation(_)
            | InlineNode::Rule => {
                let token = self.record_inline(node);
                markers::render(node.kind_name(), token.as_deref())
            }
            InlineNode::InlineImage(image) => {
                let markdown = self.image(image, in_table);
                if markers::degraded_inline(node) == *node {
                    return markdown;
                }
                match self.record_inline(node) {
                    Some(token) => format!(
                        "{}{markdown}{CLOSE_MARKER}",
                        markers::render(node.kind_name(), Some(&token))
                    ),
                    None => markdown,
                }
            }
            InlineNode::PersonMention(person) => {
                let properties = &person.properties;
                let text = properties
                    .name
                    .as_deref()
                    .filter(|name| !name.is_empty())
                    .unwrap_or(&properties.email);
                let fallback = format!(
                    "[{}]({})",
                    escape(text, in_table),
                    link_destination(&format!("mailto:{}", properties.email), in_table)
                );
                self.wrapped(node, &fallback)
            }
            InlineNode::RichLink(link) => {
                let properties = &link.properties;
                let text = if properties.title.is_empty() {
                    &properties.uri
                } else {
                    &properties.title
                };
                let fallback = format!(
                    "[{}]({})",
                    escape(text, in_table),
                    link_destination(&properties.uri, in_table)
                );
                self.wrapped(node, &fallback)
            }
            InlineNode::DateMention(date) => {
                let fallback = escape(&date.display_text, in_table);
                self.wrapped(node, &fallback)
            }
            InlineNode::AutoText(_) => self.wrapped(node, ""),
            InlineNode::Opaque(_) => String::new(),
        }
    }

    fn wrapped(&mut self, node: &InlineNode, fallback: &str) -> String {
        let token = self.record_inline(node);
        format!(
            "{}{fallback}{CLOSE_MARKER}",
            markers::render(node.kind_name(), token.as_deref())
        )
    }

    fn image(&self, image: &InlineImage, in_table: bool) -> String {
        let destination = if image.object_id.is_empty() {
            image.content_uri.clone().unwrap_or_default()
        } else {
            image_placeholder(self.file_path, &self.options.images_dir, &image.object_id)
        };
        format!(
            "![{}]({})",
            escape(image.description.as_deref().unwrap_or_default(), in_table),
            link_destination(&destination, in_table)
        )
    }

    fn table(&mut self, table: &Table) -> String {
        let mut lines = Vec::with_capacity(table.rows() + 1);
        for row in 0..table.rows() {
            let mut cells = Vec::with_capacity(table.columns());
            for (column, cell) in table.row(row).iter().enumerate() {
                self.steps.push(PathStep::Cell { row, column });
                cells.push(self.cell(cell));
                self.steps.pop();
            }
            lines.push(format!("| {} |", cells.join(" | ")));
            if row == 0 {
                lines.push(format!("|{}", " --- |".repeat(table.columns())));
            }
        }
        lines.join("\n")
    }

    /// Cell blocks flattened onto one line.
    fn cell(&mut self, cell: &TableCell) -> String {
        let mut parts = Vec::with_capacity(cell.content.len());
        for (index, block) in cell.content.iter().enumerate() {
            if matches!(block, StructuralNode::Opaque(_)) {
                continue;
            }
            self.steps.push(PathStep::Block(index));
            let part = match block {
                StructuralNode::Paragraph(paragraph) => self.inline(paragraph, true),
                StructuralNode::Table(nested) => {
                    self.unrepresentable("nestedTable");
                    let mut words = Vec::new();
                    table_text(nested, &mut words);
                    escape(&words.join(" "), true)
                }
                other => self.block_marker(other),
            };
            parts.push(part);
            self.steps.pop();
        }
        parts.join(&self.options.cell_line_break)
    }

    fn block_marker(&mut self, block: &StructuralNode) -> String {
        let needed = markers::degraded_block(block) != *block;
        let token = self.record(block.kind_name(), needed, || serde_json::to_value(block));
        markers::render(block.kind_name(), token.as_deref())
    }

    fn footnote_definitions(&mut self, tab: &Tab, order: &[String]) -> String {
        let body_key = self.key.clone();
        let mut definitions = Vec::with_capacity(order.len());

        for (index, id) in order.iter().enumerate() {
            let ordinal = index + 1;
            let text = match tab.footnotes.get(id) {
                Some(footnote) => {
                    self.key = SegmentKey::new(&tab.id, footnote.id.clone());
                    let chunks = self.blocks(&footnote.content);
                    join(chunks)
                }
                None => String::new(),
            };
            let text = if text.is_empty() {
                LINE_BREAK.to_string()
            } else {
                text
            };
            definitions.push(format!("[^{ordinal}]: {}", indent_continuation(&text)));
            if self.options.metadata != MetadataMode::Disabled {
                self.record
                    .footnote_id_map
                    .insert(ordinal.to_string(), id.clone());
            }
        }

        self.key = body_key;
        definitions.join("\n\n")
    }

    fn record_inline(&mut self, node: &InlineNode) -> Option<String> {
        let needed = markers::degraded_inline(node) != *node;
        self.record(node.kind_name(), needed, || serde_json::to_value(node))
    }

    /// Allocates a record for a node its markup cannot carry in full.
    fn record(
        &mut self,
        kind: &str,
        needed: bool,
        fields: impl FnOnce() -> serde_json::Result<serde_json::Value>,
    ) -> Option<String> {
        if !needed {
            return None;
        }
        if self.options.metadata == MetadataMode::Disabled {
            self.unrepresentable(kind);
            return None;
        }
        match fields() {
            Ok(fields) => Some(self.record.push(kind, fields)),
            Err(_) => {
                self.unrepresentable(kind);
                None
            }
        }
    }

    fn unrepresentable(&mut self, feature: &str) {
        let position = NodePath {
            segment: self.key.clone(),
            steps: self.steps.clone(),
        }
        .to_string();
        warn!(feature, %position, "feature reduced to its plain-text fallback");
        self.warnings.push(Warning::UnrepresentableFeature {
            feature: feature.to_string(),
            position,
        });
    }
}

fn named_style(paragraph: &Paragraph) -> NamedStyleType {
    paragraph
        .style
        .as_ref()
        .and_then(|style| style.named_style)
        .unwrap_or(NamedStyleType::NormalText)
}

fn table_text(table: &Table, words: &mut Vec<String>) {
    for (_, _, cell) in table.iter_cells() {
        for block in &cell.content {
            match block {
                StructuralNode::Paragraph(paragraph) => {
                    let text = paragraph.plain_text();
                    if !text.is_empty() {
                        words.push(text);
                    }
                }
                StructuralNode::Table(nested) => table_text(nested, words),
                _ => {}
            }
        }
    }
}

/// Emphasis delimiters, outermost first. Stars go innermost so they
/// always touch the text they wrap.
#[derive(Debug, Clone, PartialEq)]
enum Mark {
    Link(String),
    Strike,
    Underline,
    Bold,
    Italic,
}

impl Mark {
    fn is_star(&self) -> bool {
        matches!(self, Mark::Bold | Mark::Italic)
    }

    fn open(&self) -> &'static str {
        match self {
            Mark::Link(_) => "[",
            Mark::Strike => "~~",
            Mark::Bold => "**",
            Mark::Italic => "*",
            Mark::Underline => "<u>",
        }
    }

    fn close(&self, in_table: bool) -> String {
        match self {
            Mark::Link(url) => format!("]({})", link_destination(url, in_table)),
            Mark::Strike => "~~".to_string(),
            Mark::Bold => "**".to_string(),
            Mark::Italic => "*".to_string(),
            Mark::Underline => "</u>".to_string(),
        }
    }
}

fn marks(effective: &TextStyle, inherited: &TextStyle) -> Vec<Mark> {
    let on = |toggle: Option<bool>| toggle.unwrap_or(false);
    let mut marks = Vec::new();
    if let Some(url) = &effective.link {
        if effective.link != inherited.link {
            marks.push(Mark::Link(url.clone()));
        }
    }
    if on(effective.strikethrough) && !on(inherited.strikethrough) {
        marks.push(Mark::Strike);
    }
    if on(effective.underline) && !on(inherited.underline) {
        marks.push(Mark::Underline);
    }
    if on(effective.bold) && !on(inherited.bold) {
        marks.push(Mark::Bold);
    }
    if on(effective.italic) && !on(inherited.italic) {
        marks.push(Mark::Italic);
    }
    marks
}

#[derive(Debug)]
enum Piece {
    Text {
        text: String,
        marks: Vec<Mark>,
        code: bool,
        /// Whitespace only; kept out of emphasis at span edges.
        space: bool,
    },
    /// A line break inside the paragraph.
    Break { marks: Vec<Mark> },
    /// Pre-rendered markup; closes every open mark.
    Raw(String),
}

fn is_line_break(c: char) -> bool {
    c == '\u{000B}' || c == '\n'
}

fn text_pieces(content: &str, effective: &TextStyle, inherited: &TextStyle, pieces: &mut Vec<Piece>) {
    let marks = marks(effective, inherited);
    let code = effective.is_monospace() && !inherited.is_monospace();

    for (index, line) in content.split(is_line_break).enumerate() {
        if index > 0 {
            pieces.push(Piece::Break {
                marks: marks.clone(),
            });
        }
        if line.is_empty() {
            continue;
        }
        if code {
            pieces.push(Piece::Text {
                text: line.to_string(),
                marks: marks.clone(),
                code: true,
                space: false,
            });
            continue;
        }

        let mut start = 0;
        let mut current: Option<bool> = None;
        for (byte, c) in line.char_indices() {
            let space = c.is_whitespace();
            if current.is_some_and(|previous| previous != space) {
                pieces.push(Piece::Text {
                    text: line[start..byte].to_string(),
                    marks: marks.clone(),
                    code: false,
                    space: !space,
                });
                start = byte;
            }
            current = Some(space);
        }
        pieces.push(Piece::Text {
            text: line[start..].to_string(),
            marks: marks.clone(),
            code: false,
            space: current.unwrap_or(false),
        });
    }
}

fn render_pieces(pieces: &[Piece], in_table: bool) -> String {
    let mut out = String::new();
    let mut open: Vec<Mark> = Vec::new();

    for (index, piece) in pieces.iter().enumerate() {
        match piece {
            Piece::Raw(raw) => {
                transition(&mut out, &mut open, &[], raw.chars().next(), in_table);
                if raw.starts_with('[') {
                    escape_trailing_bang(&mut out);
                }
                out.push_str(raw);
            }
            Piece::Break { marks } => {
                transition(&mut out, &mut open, marks, Some('<'), in_table);
                out.push_str(LINE_BREAK);
            }
            Piece::Text {
                text, marks, space, ..
            } if *space => {
                let next = next_marks(&pieces[index + 1..]);
                let keep = open
                    .iter()
                    .take_while(|mark| marks.contains(mark) && next.contains(mark))
                    .count();
                let continuing = open[..keep].to_vec();
                transition(&mut out, &mut open, &continuing, text.chars().next(), in_table);
                out.push_str(&escape(text, in_table));
            }
            Piece::Text {
                text, marks, code, ..
            } => {
                let first = if *code { Some('`') } else { text.chars().next() };
                transition(&mut out, &mut open, marks, first, in_table);
                if *code {
                    out.push_str(&code_span(text, in_table));
                } else {
                    out.push_str(&escape(text, in_table));
                }
            }
        }
    }
    transition(&mut out, &mut open, &[], None, in_table);
    out
}

/// Marks of the next piece that is not whitespace.
fn next_marks(rest: &[Piece]) -> &[Mark] {
    for piece in rest {
        match piece {
            Piece::Text { space: true, .. } => continue,
            Piece::Text { marks, .. } | Piece::Break { marks } => return marks,
            Piece::Raw(_) => return &[],
        }
    }
    &[]
}

/// Empty comment written between delimiters that would otherwise fuse into
/// one ambiguous run. Readers drop it like any foreign comment.
const DELIMITER_BREAK: &str = "<!-- -->";

/// Closes the open marks that `wanted` drops and opens the ones it adds.
///
/// Marks stay open for as long as they are wanted, so the stack only
/// unwinds down to the first dropped mark. New marks go on top in
/// [`Mark`] order.
fn transition(
    out: &mut String,
    open: &mut Vec<Mark>,
    wanted: &[Mark],
    next: Option<char>,
    in_table: bool,
) {
    let keep = open.iter().take_while(|mark| wanted.contains(mark)).count();
    let closing: Vec<Mark> = open.drain(keep..).rev().collect();
    let opening: Vec<Mark> = wanted
        .iter()
        .filter(|mark| !open.contains(mark))
        .cloned()
        .collect();
    if closing.is_empty() && opening.is_empty() {
        return;
    }

    let inside_word = out.chars().next_back().is_some_and(|c| !c.is_whitespace())
        && next.is_some_and(|c| !c.is_whitespace());
    for mark in &closing {
        out.push_str(&mark.close(in_table));
    }
    if inside_word && !fuses_cleanly(&closing, &opening) {
        out.push_str(DELIMITER_BREAK);
    }
    for mark in opening {
        if matches!(mark, Mark::Link(_)) {
            escape_trailing_bang(out);
        }
        out.push_str(mark.open());
        open.push(mark);
    }
}

/// Whether delimiters written between two word characters still flank the
/// text the way they are meant to. One delimiter always does, and so does a
/// one-way run of `*` since stars sit next to the text; anything else
/// leaves some delimiter touching punctuation on its inner side or folds a
/// closer into the following opener.
fn fuses_cleanly(closing: &[Mark], opening: &[Mark]) -> bool {
    let stars = |marks: &[Mark]| marks.iter().all(Mark::is_star);
    match (closing.len(), opening.len()) {
        (0, 0) | (1, 0) | (0, 1) => true,
        (_, 0) => stars(closing),
        (0, _) => stars(opening),
        _ => false,
    }
}

/// `!` directly before `[` would turn a link into an image.
fn escape_trailing_bang(out: &mut String) {
    if out.ends_with('!') && !out.ends_with("\\!") {
        out.insert(out.len() - 1, '\\');
    }
}

fn escape(text: &str, in_table: bool) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (index, &c) in chars.iter().enumerate() {
        let next = chars.get(index + 1).copied();
        let escaped = match c {
            '\\' | '*' | '_' | '`' | '[' | ']' | '~' | '^' => true,
            '<' => next.is_some_and(|n| n.is_ascii_alphabetic() || matches!(n, '/' | '!' | '?')),
            '&' => next.is_some_and(|n| n == '#' || n.is_ascii_alphabetic()),
            '|' => in_table,
            _ => false,
        };
        if escaped {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn code_span(text: &str, in_table: bool) -> String {
    let text = if in_table {
        text.replace('|', "\\|")
    } else {
        text.to_string()
    };
    let fence = "`".repeat(longest_run(&text, '`') + 1);
    let pad = text.starts_with('`')
        || text.ends_with('`')
        || (text.starts_with(' ') && text.ends_with(' ') && !text.trim().is_empty());
    if pad {
        format!("{fence} {text} {fence}")
    } else {
        format!("{fence}{text}{fence}")
    }
}

fn code_fence(lines: &[String]) -> String {
    let longest = lines
        .iter()
        .map(|line| longest_run(line, '`'))
        .max()
        .unwrap_or(0);
    let fence = "`".repeat(longest.max(2) + 1);
    format!("{fence}\n{}\n{fence}", lines.join("\n"))
}

fn longest_run(text: &str, target: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == target {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

fn link_destination(url: &str, in_table: bool) -> String {
    let url = if in_table {
        url.replace('|', "\\|")
    } else {
        url.to_string()
    };
    if url.is_empty() || url.contains(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | '<' | '>')) {
        format!("<{}>", url.replace('<', "%3C").replace('>', "%3E"))
    } else {
        url
    }
}

/// Leading and trailing spaces and tabs would be stripped by a reader;
/// they are written as character references instead.
fn protect_edges(text: &str) -> String {
    let is_edge = |c: char| c == ' ' || c == '\t';
    let entity = |c: char| if c == '\t' { "&#9;" } else { "&#32;" };

    let trimmed_start = text.trim_start_matches(is_edge);
    let leading = &text[..text.len() - trimmed_start.len()];
    let core = trimmed_start.trim_end_matches(is_edge);
    let trailing = &trimmed_start[core.len()..];

    let mut out = String::with_capacity(text.len() + 8);
    out.extend(leading.chars().map(entity));
    out.push_str(core);
    out.extend(trailing.chars().map(entity));
    out
}

/// Keeps the first characters of a paragraph from reading as block syntax.
fn escape_line_start(text: String) -> String {
    match text.chars().next() {
        Some('#' | '>' | '-' | '+' | '=') => format!("\\{text}"),
        Some(c) if c.is_ascii_digit() => {
            let digits = text.chars().take_while(char::is_ascii_digit).count();
            if text[digits..].starts_with(|c| c == '.' || c == ')') {
                format!("{}\\{}", &text[..digits], &text[digits..])
            } else {
                text
            }
        }
        _ => text,
    }
}

/// A trailing `#` would be read as a closing heading sequence.
fn escape_heading_end(mut content: String) -> String {
    if content.ends_with('#') && !content.ends_with("\\#") {
        content.insert(content.len() - 1, '\\');
    }
    content
}

fn indent_continuation(text: &str) -> String {
    text.lines()
        .enumerate()
        .map(|(index, line)| {
            if index == 0 || line.is_empty() {
                line.to_string()
            } else {
                format!("    {line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
