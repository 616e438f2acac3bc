//! Structural differ.
//!
//! Compares a base snapshot (the remote document) with a target snapshot
//! (the locally edited one) and emits the position-addressed operations that
//! turn base into target. Per segment the operations are ordered so that
//! index-based addressing stays valid while they are applied in sequence:
//!
//! 1. deletions, by descending start index, in base coordinates
//! 2. insertions, by ascending index, in target coordinates
//! 3. style updates, in target coordinates
//!
//! Each segment is linearized ([`crate::common::linearize`]) and compared
//! with a Myers edit script over word tokens. Contiguous deletions collapse
//! into one range and contiguous text insertions into one string. The last
//! paragraph end of a segment is never deleted: the remote service forbids
//! it, so the final paragraph is always matched and only restyled.
//!
//! Tables are matched by shape. Two tables of the same shape are diffed
//! cell by cell, each cell pinned on its own last paragraph end, so a cell
//! edit is a text edit at the cell's index. A table that is not matched
//! leaves or arrives whole: an arriving table is inserted empty and its
//! cells are then filled like any other inserted text.
//!
//! Hidden spans (suggestions and other opaque content) never take part in
//! matching. They stay in the remote document, so deletions are cut around
//! them and every target index is shifted past the ones that precede it.
//! A hidden span on a token boundary stays with the content before it.

pub mod myers;
pub mod ops;

pub use ops::{DeleteScope, EditOperation, InsertedNode, Location, StyleUpdate};

use crate::common::linearize::{linearize, LinearSegment, ObjectNode, StyleSpan, Token, TokenKind};
use crate::error::DocError;
use crate::ir::nodes::{DocumentTree, ListMembership, Paragraph, Segment, SegmentKey, StructuralNode};
use crate::ir::style::{NamedStyleType, ParagraphStyle, TextStyle};
use myers::Edit;
use std::ops::Range;
use tracing::debug;

/// Operations turning `base` into `target`. Identical content yields an
/// empty list.
pub fn diff(base: &DocumentTree, target: &DocumentTree) -> Result<Vec<EditOperation>, DocError> {
    let base_segments = segments(base);
    let target_segments = segments(target);
    let mut operations = Vec::new();

    for (key, target_segment) in &target_segments {
        let target_linear = linearize(&key.tab_id, target_segment, &target.named_styles);
        let base_linear = match base_segments.iter().find(|(base_key, _)| base_key == key) {
            Some((_, base_segment)) => linearize(&key.tab_id, base_segment, &base.named_styles),
            None => {
                operations.push(EditOperation::InsertStructural {
                    location: Location::new(key, 0),
                    node: InsertedNode::Segment(target_segment.kind),
                });
                let empty = Segment {
                    content: vec![StructuralNode::Paragraph(Paragraph::default())],
                    ..(*target_segment).clone()
                };
                linearize(&key.tab_id, &empty, &base.named_styles)
            }
        };
        let segment_operations = diff_segment(&base_linear, &target_linear)?;
        if !segment_operations.is_empty() {
            debug!(segment = %key, operations = segment_operations.len(), "segment changed");
        }
        operations.extend(segment_operations);
    }

    for (key, base_segment) in &base_segments {
        if target_segments.iter().any(|(target_key, _)| target_key == key) {
            continue;
        }
        let linear = linearize(&key.tab_id, base_segment, &base.named_styles);
        operations.push(EditOperation::DeleteRange {
            location: Location::new(key, linear.base),
            length: linear.remote_end() - linear.base,
            scope: DeleteScope::Segment,
        });
    }

    Ok(operations)
}

fn segments(doc: &DocumentTree) -> Vec<(SegmentKey, &Segment)> {
    doc.flatten_tabs()
        .into_iter()
        .flat_map(|tab| {
            tab.segments()
                .into_iter()
                .map(move |segment| (SegmentKey::new(&tab.id, segment.id.clone()), segment))
        })
        .collect()
}

/// Operations for one segment present in both snapshots.
pub fn diff_segment(
    base: &LinearSegment,
    target: &LinearSegment,
) -> Result<Vec<EditOperation>, DocError> {
    let mut steps = Vec::new();
    align(
        base,
        0..base.tokens.len(),
        target,
        0..target.tokens.len(),
        &mut steps,
    );

    let mut plan = SegmentPlan::new(base, target);
    plan.walk(&steps);
    plan.check_surrogates()?;
    Ok(plan.into_operations())
}

/// One step of the alignment between the two token streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Equal { old: usize, new: usize },
    Delete { old: usize },
    Insert { new: usize },
    /// A whole base table, hidden spans inside it included.
    DeleteTable { first: usize, last: usize },
}

/// Aligns two token ranges, keeping their last paragraph ends paired.
fn align(
    base: &LinearSegment,
    old: Range<usize>,
    target: &LinearSegment,
    new: Range<usize>,
    steps: &mut Vec<Step>,
) {
    let pinned = !old.is_empty()
        && !new.is_empty()
        && base.tokens[old.end - 1].is_paragraph_end()
        && target.tokens[new.end - 1].is_paragraph_end();
    let (old_body, new_body) = if pinned {
        (old.start..old.end - 1, new.start..new.end - 1)
    } else {
        (old.clone(), new.clone())
    };

    let old_units = base.units(old_body);
    let new_units = target.units(new_body);
    let edits = myers::diff(&old_units, &new_units, |a, b| {
        base.tokens[a.start].same_content(&target.tokens[b.start])
    });
    for edit in edits {
        match edit {
            Edit::Equal { old, new } => {
                align_unit(base, old_units[old].clone(), target, new_units[new].clone(), steps)
            }
            Edit::Delete { old } => {
                let unit = old_units[old].clone();
                if matches!(base.tokens[unit.start].kind, TokenKind::TableStart { .. }) {
                    steps.push(Step::DeleteTable {
                        first: unit.start,
                        last: unit.end - 1,
                    });
                } else {
                    steps.extend(unit.map(|old| Step::Delete { old }));
                }
            }
            Edit::Insert { new } => steps.extend(new_units[new].clone().map(|new| Step::Insert { new })),
        }
    }
    if pinned {
        steps.push(Step::Equal {
            old: old.end - 1,
            new: new.end - 1,
        });
    }
}

/// Steps for two matched units. Tables of one shape pair their sentinels
/// and align cell by cell.
fn align_unit(
    base: &LinearSegment,
    old: Range<usize>,
    target: &LinearSegment,
    new: Range<usize>,
    steps: &mut Vec<Step>,
) {
    let (
        TokenKind::TableStart {
            cells: old_cells, ..
        },
        TokenKind::TableStart {
            cells: new_cells, ..
        },
    ) = (&base.tokens[old.start].kind, &target.tokens[new.start].kind)
    else {
        steps.push(Step::Equal {
            old: old.start,
            new: new.start,
        });
        return;
    };

    let (mut old_at, mut new_at) = (old.start, new.start);
    for (old_cell, new_cell) in old_cells.iter().zip(new_cells) {
        while old_at < old_cell.start && new_at < new_cell.start {
            steps.push(Step::Equal {
                old: old_at,
                new: new_at,
            });
            old_at += 1;
            new_at += 1;
        }
        align(base, old_cell.clone(), target, new_cell.clone(), steps);
        old_at = old_cell.end;
        new_at = new_cell.end;
    }
    while old_at < old.end && new_at < new.end {
        steps.push(Step::Equal {
            old: old_at,
            new: new_at,
        });
        old_at += 1;
        new_at += 1;
    }
}

/// A maximal run of deleted and inserted tokens between two matches.
#[derive(Default)]
struct Hunk<'a> {
    /// Visible base ranges; `true` when hidden spans inside go too.
    deleted: Vec<(Range<usize>, bool)>,
    inserted: Vec<&'a Token>,
}

impl<'a> Hunk<'a> {
    fn delete(&mut self, range: Range<usize>, whole: bool) {
        if let Some((last, last_whole)) = self.deleted.last_mut() {
            if last.end == range.start && *last_whole == whole {
                last.end = range.end;
                return;
            }
        }
        self.deleted.push((range, whole));
    }

    fn insert(&mut self, token: &'a Token) {
        self.inserted.push(token);
    }

    fn is_empty(&self) -> bool {
        self.deleted.is_empty() && self.inserted.is_empty()
    }
}

/// Operations for one segment, collected in visible coordinates and
/// shifted onto remote indices at the end.
struct SegmentPlan<'a> {
    base: &'a LinearSegment,
    target: &'a LinearSegment,
    deletes: Vec<(Range<usize>, bool)>,
    inserts: Vec<EditOperation>,
    updates: Vec<EditOperation>,
    /// `(target index, length)` of every hidden span that survives.
    placed: Vec<(usize, usize)>,
}

impl<'a> SegmentPlan<'a> {
    fn new(base: &'a LinearSegment, target: &'a LinearSegment) -> Self {
        SegmentPlan {
            base,
            target,
            deletes: Vec::new(),
            inserts: Vec::new(),
            updates: Vec::new(),
            placed: Vec::new(),
        }
    }

    fn walk(&mut self, steps: &[Step]) {
        let (base, target) = (self.base, self.target);
        let mut hidden = base.hidden.iter().peekable();
        let mut hunk = Hunk::default();
        // Target index just past the last match.
        let mut gap = target.base;
        let mut anchor: Option<&Token> = None;

        for step in steps {
            match *step {
                Step::Equal { old, new } => {
                    let (old_token, new_token) = (&base.tokens[old], &target.tokens[new]);
                    self.flush(&mut hunk, anchor, Some(old));
                    while let Some(span) = hidden.next_if(|span| span.at < old_token.end()) {
                        let at = if span.at <= old_token.start {
                            gap
                        } else {
                            new_token.start + (span.at - old_token.start)
                        };
                        self.placed.push((at, span.len));
                    }
                    self.matched(old_token, new_token);
                    gap = new_token.end();
                    anchor = Some(old_token);
                }
                Step::Delete { old } => {
                    let token = &base.tokens[old];
                    hunk.delete(token.start..token.end(), false);
                    while let Some(span) = hidden.next_if(|span| span.at < token.end()) {
                        self.placed.push((gap, span.len));
                    }
                }
                Step::DeleteTable { first, last } => {
                    let range = base.tokens[first].start..base.tokens[last].end();
                    while let Some(span) = hidden.next_if(|span| span.at < range.end) {
                        if span.at <= range.start {
                            self.placed.push((gap, span.len));
                        }
                    }
                    hunk.delete(range, true);
                }
                Step::Insert { new } => hunk.insert(&target.tokens[new]),
            }
        }
        self.flush(&mut hunk, anchor, None);
        for span in hidden {
            self.placed.push((gap, span.len));
        }
    }

    /// Emits a hunk. `next` is the base token matched right after it.
    fn flush(&mut self, hunk: &mut Hunk<'a>, anchor: Option<&Token>, next: Option<usize>) {
        if hunk.is_empty() {
            return;
        }
        self.deletes.append(&mut hunk.deleted);

        // Inserted text takes the style of the character before it.
        let inherited = match anchor.map(|token| &token.kind) {
            Some(TokenKind::Word { spans, .. }) => spans
                .last()
                .map(|span| span.style.clone())
                .unwrap_or_else(plain_style),
            _ => plain_style(),
        };
        // Inserted paragraph ends split the base paragraph they land in.
        let split = next
            .map(|index| self.enclosing_paragraph(index))
            .unwrap_or_else(normal_paragraph);
        let fresh = normal_paragraph();
        // Depth inside tables inserted by this hunk.
        let mut depth = 0usize;

        let mut pending_text: Option<(usize, String)> = None;
        for token in std::mem::take(&mut hunk.inserted) {
            match &token.kind {
                TokenKind::Word { text, spans } => {
                    pending_text
                        .get_or_insert_with(|| (token.start, String::new()))
                        .1
                        .push_str(text);
                    let from = if depth > 0 { plain_style() } else { inherited.clone() };
                    let mut offset = token.start;
                    for span in spans {
                        self.text_update(offset, span.len, &from, &span.style);
                        offset += span.len;
                    }
                }
                TokenKind::ParagraphEnd {
                    paragraph_start,
                    style,
                    list,
                    closes_cell,
                } => {
                    if *closes_cell && depth > 0 {
                        // The empty table already holds this one.
                        self.push_text(pending_text.take());
                    } else {
                        pending_text
                            .get_or_insert_with(|| (token.start, String::new()))
                            .1
                            .push('\n');
                    }
                    let (old_style, old_list) = if depth > 0 { &fresh } else { &split };
                    self.paragraph_update(
                        *paragraph_start..token.end(),
                        (old_style, old_list.as_ref()),
                        (style, list.as_ref()),
                    );
                }
                TokenKind::Object { node, .. } => {
                    self.push_text(pending_text.take());
                    let node = match node {
                        ObjectNode::Inline(inline) => InsertedNode::Inline(inline.clone()),
                        ObjectNode::Block(block) => InsertedNode::Block(block.clone()),
                    };
                    self.inserts.push(EditOperation::InsertStructural {
                        location: Location::new(&self.target.key, token.start),
                        node,
                    });
                }
                TokenKind::TableStart { empty, .. } => {
                    self.push_text(pending_text.take());
                    self.inserts.push(EditOperation::InsertStructural {
                        location: Location::new(&self.target.key, token.start),
                        node: InsertedNode::Block(StructuralNode::Table(empty.clone())),
                    });
                    depth += 1;
                }
                TokenKind::RowStart | TokenKind::CellStart => self.push_text(pending_text.take()),
                TokenKind::TableEnd => {
                    self.push_text(pending_text.take());
                    depth = depth.saturating_sub(1);
                }
            }
        }
        self.push_text(pending_text);
    }

    /// Style and list of the base paragraph holding token `index`.
    fn enclosing_paragraph(&self, index: usize) -> (ParagraphStyle, Option<ListMembership>) {
        for token in &self.base.tokens[index..] {
            match &token.kind {
                TokenKind::ParagraphEnd { style, list, .. } => return (style.clone(), list.clone()),
                TokenKind::Word { .. }
                | TokenKind::Object {
                    node: ObjectNode::Inline(_),
                    ..
                } => continue,
                _ => break,
            }
        }
        normal_paragraph()
    }

    fn push_text(&mut self, pending: Option<(usize, String)>) {
        if let Some((index, text)) = pending {
            self.inserts.push(EditOperation::InsertText {
                location: Location::new(&self.target.key, index),
                text,
            });
        }
    }

    /// Style changes between two tokens with the same content.
    fn matched(&mut self, base: &Token, target: &Token) {
        match (&base.kind, &target.kind) {
            (TokenKind::Word { spans: old, .. }, TokenKind::Word { spans: new, .. }) => {
                for (offset, len, old_style, new_style) in aligned_spans(old, new) {
                    self.text_update(target.start + offset, len, old_style, new_style);
                }
            }
            (
                TokenKind::ParagraphEnd {
                    style: old_style,
                    list: old_list,
                    ..
                },
                TokenKind::ParagraphEnd {
                    paragraph_start,
                    style: new_style,
                    list: new_list,
                    ..
                },
            ) => self.paragraph_update(
                *paragraph_start..target.end(),
                (old_style, old_list.as_ref()),
                (new_style, new_list.as_ref()),
            ),
            _ => {}
        }
    }

    fn paragraph_update(
        &mut self,
        range: Range<usize>,
        (old_style, old_list): (&ParagraphStyle, Option<&ListMembership>),
        (new_style, new_list): (&ParagraphStyle, Option<&ListMembership>),
    ) {
        let location = Location::new(&self.target.key, range.start);
        let length = range.end - range.start;
        let fields = old_style.changed_fields(new_style);
        if !fields.is_empty() {
            self.updates.push(EditOperation::UpdateStyle {
                location: location.clone(),
                length,
                update: StyleUpdate::Paragraph {
                    style: new_style.clone(),
                    fields: fields.into_iter().map(str::to_string).collect(),
                },
            });
        }
        if !same_list(old_list, new_list) {
            self.updates.push(EditOperation::UpdateStyle {
                location,
                length,
                update: StyleUpdate::Bullets {
                    list: new_list.cloned(),
                },
            });
        }
    }

    fn text_update(&mut self, index: usize, length: usize, old: &TextStyle, new: &TextStyle) {
        let fields: Vec<String> = old
            .changed_fields(new)
            .into_iter()
            .map(str::to_string)
            .collect();
        if fields.is_empty() || length == 0 {
            return;
        }
        if let Some(EditOperation::UpdateStyle {
            location,
            length: previous_length,
            update: StyleUpdate::Text {
                style,
                fields: previous_fields,
            },
        }) = self.updates.last_mut()
        {
            if location.index + *previous_length == index && style == new && previous_fields == &fields {
                *previous_length += length;
                return;
            }
        }
        self.updates.push(EditOperation::UpdateStyle {
            location: Location::new(&self.target.key, index),
            length,
            update: StyleUpdate::Text {
                style: new.clone(),
                fields,
            },
        });
    }

    fn check_surrogates(&self) -> Result<(), DocError> {
        let split = |linear: &LinearSegment, index: usize| -> Result<(), DocError> {
            if linear.splits_surrogate(index) {
                return Err(DocError::SurrogateSplit {
                    segment: self.target.key.clone(),
                    index,
                });
            }
            Ok(())
        };
        for (range, _) in &self.deletes {
            split(self.base, range.start)?;
            split(self.base, range.end)?;
        }
        for operation in self.inserts.iter().chain(&self.updates) {
            let index = operation.location().index;
            split(self.target, index)?;
            if let EditOperation::UpdateStyle { length, .. } = operation {
                split(self.target, index + length)?;
            }
        }
        Ok(())
    }

    fn into_operations(self) -> Vec<EditOperation> {
        let SegmentPlan {
            base,
            target,
            deletes,
            inserts,
            updates,
            mut placed,
        } = self;
        let key = &target.key;

        let mut ranges: Vec<Range<usize>> = Vec::with_capacity(deletes.len());
        for (range, whole) in deletes {
            let mut from = range.start;
            let cuts = base
                .hidden
                .iter()
                .map(|span| span.at)
                .filter(|at| !whole && range.start < *at && *at < range.end);
            for cut in cuts.chain(std::iter::once(range.end)) {
                if cut > from {
                    ranges.push(base.remote_range(from..cut));
                }
                from = cut;
            }
        }
        ranges.sort_by_key(|range| range.start);
        let mut merged: Vec<Range<usize>> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match merged.last_mut() {
                Some(last) if last.end == range.start => last.end = range.end,
                _ => merged.push(range),
            }
        }

        placed.sort_by_key(|&(at, _)| at);
        let shift = |index: usize| {
            index
                + placed
                    .iter()
                    .take_while(|&&(at, _)| at <= index)
                    .map(|&(_, len)| len)
                    .sum::<usize>()
        };
        let shift_end = |index: usize| {
            index
                + placed
                    .iter()
                    .take_while(|&&(at, _)| at < index)
                    .map(|&(_, len)| len)
                    .sum::<usize>()
        };

        let mut operations: Vec<EditOperation> = merged
            .into_iter()
            .rev()
            .map(|range| EditOperation::DeleteRange {
                location: Location::new(key, range.start),
                length: range.end - range.start,
                scope: DeleteScope::Range,
            })
            .collect();

        let mut inserts: Vec<EditOperation> = inserts
            .into_iter()
            .map(|mut operation| {
                if let EditOperation::InsertText { location, .. }
                | EditOperation::InsertStructural { location, .. } = &mut operation
                {
                    location.index = shift(location.index);
                }
                operation
            })
            .collect();
        inserts.sort_by_key(|operation| operation.location().index);
        operations.extend(inserts);

        for operation in updates {
            let EditOperation::UpdateStyle {
                location,
                length,
                update,
            } = operation
            else {
                continue;
            };
            let range = location.index..location.index + length;
            if matches!(update, StyleUpdate::Text { .. }) {
                // Hidden content inside keeps its own style.
                let mut from = range.start;
                let cuts = placed
                    .iter()
                    .map(|&(at, _)| at)
                    .filter(|at| range.start < *at && *at < range.end);
                for cut in cuts.chain(std::iter::once(range.end)) {
                    if cut > from {
                        operations.push(EditOperation::UpdateStyle {
                            location: Location::new(key, shift(from)),
                            length: cut - from,
                            update: update.clone(),
                        });
                    }
                    from = cut;
                }
            } else {
                let start = shift(range.start);
                operations.push(EditOperation::UpdateStyle {
                    location: Location::new(key, start),
                    length: shift_end(range.end) - start,
                    update,
                });
            }
        }
        operations
    }
}

fn normal_paragraph() -> (ParagraphStyle, Option<ListMembership>) {
    (ParagraphStyle::named(NamedStyleType::NormalText), None)
}

fn plain_style() -> TextStyle {
    TextStyle::default().markup_projection()
}

fn same_list(a: Option<&ListMembership>, b: Option<&ListMembership>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.nesting_level == b.nesting_level && a.ordered == b.ordered,
        _ => false,
    }
}

/// Walks two span lists over the same text, yielding `(offset, len, old, new)`
/// pieces on the union of their boundaries.
fn aligned_spans<'a>(
    old: &'a [StyleSpan],
    new: &'a [StyleSpan],
) -> Vec<(usize, usize, &'a TextStyle, &'a TextStyle)> {
    let mut pieces = Vec::new();
    let (mut i, mut j) = (0, 0);
    let (mut old_left, mut new_left) = (
        old.first().map(|span| span.len).unwrap_or(0),
        new.first().map(|span| span.len).unwrap_or(0),
    );
    let mut offset = 0;
    while i < old.len() && j < new.len() {
        let len = old_left.min(new_left);
        if len > 0 {
            pieces.push((offset, len, &old[i].style, &new[j].style));
        }
        offset += len;
        old_left -= len;
        new_left -= len;
        if old_left == 0 {
            i += 1;
            old_left = old.get(i).map(|span| span.len).unwrap_or(0);
        }
        if new_left == 0 {
            j += 1;
            new_left = new.get(j).map(|span| span.len).unwrap_or(0);
        }
    }
    pieces
}
