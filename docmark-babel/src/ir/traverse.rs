//! Canonical depth-first, pre-order traversal of a document tree.
//!
//! Serializer, parser and differ all walk nodes in the order produced here:
//! tabs in document order (a tab before its children), and inside each tab
//! the body, header, footer, then footnotes by identifier. Inside a segment,
//! each structural node is visited before its inline elements and table
//! cells are visited row by row.

use crate::error::DocError;
use crate::ir::nodes::{
    DocumentTree, InlineNode, Segment, SegmentKey, StructuralNode, Tab,
};
use std::fmt;

/// One step below a segment root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStep {
    /// Index of a structural node within its container.
    Block(usize),
    /// Cell coordinates within a table.
    Cell { row: usize, column: usize },
    /// Index of an inline node within a paragraph.
    Element(usize),
}

/// Location of a node: its segment plus the steps from the segment root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePath {
    pub segment: SegmentKey,
    pub steps: Vec<PathStep>,
}

impl NodePath {
    /// Whether the node sits (at any depth) inside a table cell.
    pub fn in_table_cell(&self) -> bool {
        self.steps
            .iter()
            .any(|step| matches!(step, PathStep::Cell { .. }))
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segment)?;
        for step in &self.steps {
            match step {
                PathStep::Block(index) => write!(f, "/{index}")?,
                PathStep::Cell { row, column } => write!(f, "/[{row},{column}]")?,
                PathStep::Element(index) => write!(f, ":{index}")?,
            }
        }
        Ok(())
    }
}

/// A borrowed node of either level.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Structural(&'a StructuralNode),
    Inline(&'a InlineNode),
}

impl DocumentTree {
    /// Flat pre-order listing of every node in the document.
    pub fn walk(&self) -> Vec<(NodePath, NodeRef<'_>)> {
        let mut out = Vec::new();
        for tab in self.flatten_tabs() {
            walk_tab(tab, &mut out);
        }
        out
    }

    /// Checks the containment rules that the type system cannot express.
    pub fn validate(&self) -> Result<(), DocError> {
        if self.tabs().is_empty() {
            return Err(DocError::StructureViolation {
                path: "document".to_string(),
                reason: "a document needs at least one tab".to_string(),
            });
        }
        for (path, node) in self.walk() {
            if let NodeRef::Structural(node) = node {
                let forbidden_in_cell = matches!(
                    node,
                    StructuralNode::SectionBreak(_) | StructuralNode::TableOfContents(_)
                );
                if forbidden_in_cell && path.in_table_cell() {
                    return Err(DocError::StructureViolation {
                        path: path.to_string(),
                        reason: format!("{} is not allowed inside a table cell", node.kind_name()),
                    });
                }
            }
        }
        Ok(())
    }
}

fn walk_tab<'a>(tab: &'a Tab, out: &mut Vec<(NodePath, NodeRef<'a>)>) {
    for segment in tab.segments() {
        walk_segment(&tab.id, segment, out);
    }
}

/// Pre-order listing of the nodes of one segment.
pub fn walk_segment<'a>(
    tab_id: &str,
    segment: &'a Segment,
    out: &mut Vec<(NodePath, NodeRef<'a>)>,
) {
    let root = NodePath {
        segment: SegmentKey::new(tab_id, segment.id.clone()),
        steps: Vec::new(),
    };
    walk_blocks(&root, &segment.content, out);
}

fn walk_blocks<'a>(
    parent: &NodePath,
    blocks: &'a [StructuralNode],
    out: &mut Vec<(NodePath, NodeRef<'a>)>,
) {
    for (index, block) in blocks.iter().enumerate() {
        let mut path = parent.clone();
        path.steps.push(PathStep::Block(index));
        out.push((path.clone(), NodeRef::Structural(block)));

        match block {
            StructuralNode::Paragraph(paragraph) => {
                for (element_index, element) in paragraph.elements.iter().enumerate() {
                    let mut element_path = path.clone();
                    element_path.steps.push(PathStep::Element(element_index));
                    out.push((element_path, NodeRef::Inline(element)));
                }
            }
            StructuralNode::Table(table) => {
                for (row, column, cell) in table.iter_cells() {
                    let mut cell_path = path.clone();
                    cell_path.steps.push(PathStep::Cell { row, column });
                    walk_blocks(&cell_path, &cell.content, out);
                }
            }
            StructuralNode::TableOfContents(toc) => walk_blocks(&path, &toc.content, out),
            StructuralNode::SectionBreak(_)
            | StructuralNode::BlockEquation(_)
            | StructuralNode::Opaque(_) => {}
        }
    }
}

/// Footnote identifiers in first-reference order.
///
/// Ordinal `n` (1-based) of a footnote is its position in this list. Footnotes
/// never referenced from `content` follow in identifier order.
pub fn footnote_order(tab: &Tab) -> Vec<String> {
    let mut nodes = Vec::new();
    walk_segment(&tab.id, &tab.body, &mut nodes);

    let mut order: Vec<String> = Vec::new();
    for (_, node) in nodes {
        if let NodeRef::Inline(InlineNode::FootnoteRef(reference)) = node {
            if !order.contains(&reference.footnote_id) {
                order.push(reference.footnote_id.clone());
            }
        }
    }
    for id in tab.footnotes.keys() {
        if !order.contains(id) {
            order.push(id.clone());
        }
    }
    order
}
