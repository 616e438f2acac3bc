//! Replays operations over the body segment of a single-tab document.

use docmark_babel::diff::InsertedNode;
use docmark_babel::ir::nodes::{DocumentTree, InlineNode, StructuralNode, Table};
use docmark_babel::EditOperation;

/// Stand-ins for the code units a table spends on its own structure.
const TABLE_START: u16 = 0xE000;
const ROW_START: u16 = 0xE001;
const CELL_START: u16 = 0xE002;
const TABLE_END: u16 = 0xE003;

/// UTF-16 text of the body, as the remote service indexes it: one unit of
/// padding for the body's base index, then every paragraph with its end.
pub fn body_units(doc: &DocumentTree) -> Vec<u16> {
    let mut units = vec![0];
    blocks_units(&doc.tabs()[0].body.content, &mut units);
    units
}

fn blocks_units(blocks: &[StructuralNode], units: &mut Vec<u16>) {
    for block in blocks {
        match block {
            StructuralNode::Paragraph(paragraph) => {
                for element in &paragraph.elements {
                    if let InlineNode::TextRun(run) = element {
                        units.extend(run.content.encode_utf16());
                    }
                }
                units.push(u16::from(b'\n'));
            }
            StructuralNode::Table(table) => table_units(table, units),
            _ => {}
        }
    }
}

fn table_units(table: &Table, units: &mut Vec<u16>) {
    units.push(TABLE_START);
    for row in 0..table.rows() {
        units.push(ROW_START);
        for cell in table.row(row) {
            units.push(CELL_START);
            blocks_units(&cell.content, units);
        }
    }
    units.push(TABLE_END);
}

/// Applies deletes and inserts in order; style updates do not change the
/// text. Only tables can be inserted as structure.
pub fn apply(mut units: Vec<u16>, operations: &[EditOperation]) -> Vec<u16> {
    for operation in operations {
        match operation {
            EditOperation::DeleteRange {
                location, length, ..
            } => {
                units.drain(location.index..location.index + length);
            }
            EditOperation::InsertText { location, text } => {
                let inserted: Vec<u16> = text.encode_utf16().collect();
                units.splice(location.index..location.index, inserted);
            }
            EditOperation::InsertStructural {
                location,
                node: InsertedNode::Block(StructuralNode::Table(table)),
            } => {
                let mut inserted = Vec::new();
                table_units(table, &mut inserted);
                units.splice(location.index..location.index, inserted);
            }
            EditOperation::InsertStructural { .. } => {
                panic!("only tables are replayed as structure: {operation:?}")
            }
            EditOperation::UpdateStyle { .. } => {}
        }
    }
    units
}

/// Whether `index` points at the low half of a surrogate pair.
pub fn splits_pair(units: &[u16], index: usize) -> bool {
    units
        .get(index)
        .is_some_and(|unit| (0xDC00..=0xDFFF).contains(unit))
}
