//! Edit operations emitted by the differ.
//!
//! Operations are plain values; submitting them to the remote service is the
//! caller's job. They serialize to camelCase JSON with a `type` tag.

use crate::ir::nodes::{InlineNode, ListMembership, SegmentKey, SegmentKind, StructuralNode};
use crate::ir::style::{ParagraphStyle, TextStyle};
use serde::{Deserialize, Serialize};
use std::fmt;

/// `(tabId, segmentId, codeUnitIndex)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub tab_id: String,
    pub segment_id: String,
    pub index: usize,
}

impl Location {
    pub fn new(segment: &SegmentKey, index: usize) -> Self {
        Location {
            tab_id: segment.tab_id.clone(),
            segment_id: segment.segment_id.clone(),
            index,
        }
    }

    pub fn segment(&self) -> SegmentKey {
        SegmentKey::new(self.tab_id.clone(), self.segment_id.clone())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.segment(), self.index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeleteScope {
    /// A code-unit range inside a segment.
    Range,
    /// The whole segment, which no longer exists in the target.
    Segment,
}

/// Payload of an [`EditOperation::InsertStructural`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "node", rename_all = "camelCase")]
pub enum InsertedNode {
    Block(StructuralNode),
    Inline(InlineNode),
    /// Creates an empty segment (a single empty paragraph).
    Segment(SegmentKind),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StyleUpdate {
    Text {
        style: TextStyle,
        fields: Vec<String>,
    },
    Paragraph {
        style: ParagraphStyle,
        fields: Vec<String>,
    },
    /// Sets or clears list membership; `None` removes the bullets.
    Bullets { list: Option<ListMembership> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EditOperation {
    DeleteRange {
        location: Location,
        length: usize,
        scope: DeleteScope,
    },
    InsertText {
        location: Location,
        text: String,
    },
    InsertStructural {
        location: Location,
        node: InsertedNode,
    },
    UpdateStyle {
        location: Location,
        length: usize,
        update: StyleUpdate,
    },
}

impl EditOperation {
    pub fn location(&self) -> &Location {
        match self {
            EditOperation::DeleteRange { location, .. }
            | EditOperation::InsertText { location, .. }
            | EditOperation::InsertStructural { location, .. }
            | EditOperation::UpdateStyle { location, .. } => location,
        }
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, EditOperation::DeleteRange { .. })
    }

    pub fn is_insert(&self) -> bool {
        matches!(
            self,
            EditOperation::InsertText { .. } | EditOperation::InsertStructural { .. }
        )
    }
}
