//! Edit operations for common text changes.

use super::replay::{apply, body_units, splits_pair};
use crate::common::{para, single_tab};
use docmark_babel::diff::{DeleteScope, InsertedNode, Location, StyleUpdate};
use docmark_babel::ir::nodes::{InlineNode, Opaque, Paragraph, StructuralNode, Table, TextRun};
use docmark_babel::ir::style::TextStyle;
use docmark_babel::{diff, EditOperation};

fn body(index: usize) -> Location {
    Location {
        tab_id: "t.0".to_string(),
        segment_id: String::new(),
        index,
    }
}

#[test]
fn test_inserted_word_lands_after_its_anchor() {
    let base = single_tab(vec![para("hello world")]);
    let target = single_tab(vec![para("hello brave world")]);

    let operations = diff(&base, &target).unwrap();
    assert_eq!(
        operations,
        vec![EditOperation::InsertText {
            location: body(6),
            text: " brave".to_string(),
        }]
    );
}

#[test]
fn test_deletes_run_back_to_front_before_inserts() {
    let base = single_tab(vec![para("one two three four")]);
    let target = single_tab(vec![para("one 2 three 4")]);

    let operations = diff(&base, &target).unwrap();
    assert_eq!(
        operations,
        vec![
            EditOperation::DeleteRange {
                location: body(14),
                length: 5,
                scope: DeleteScope::Range,
            },
            EditOperation::DeleteRange {
                location: body(4),
                length: 4,
                scope: DeleteScope::Range,
            },
            EditOperation::InsertText {
                location: body(4),
                text: " 2".to_string(),
            },
            EditOperation::InsertText {
                location: body(12),
                text: " 4".to_string(),
            },
        ]
    );
    assert_eq!(apply(body_units(&base), &operations), body_units(&target));
}

#[test]
fn test_edits_after_an_emoji_keep_pairs_whole() {
    let base = single_tab(vec![para("😀 cat naps")]);
    let target = single_tab(vec![para("😀 dog naps 🐕")]);

    let operations = diff(&base, &target).unwrap();
    let base_units = body_units(&base);
    let target_units = body_units(&target);
    for operation in &operations {
        let units = if operation.is_delete() {
            &base_units
        } else {
            &target_units
        };
        assert!(
            !splits_pair(units, operation.location().index),
            "{operation:?} splits a surrogate pair"
        );
    }
    assert_eq!(apply(base_units, &operations), target_units);
}

#[test]
fn test_removed_paragraph_keeps_the_final_paragraph_end() {
    let base = single_tab(vec![para("first"), para("last")]);
    let target = single_tab(vec![para("last")]);

    let operations = diff(&base, &target).unwrap();
    assert!(operations.iter().all(|operation| match operation {
        EditOperation::DeleteRange {
            location, length, ..
        } => location.index + length < body_units(&base).len(),
        _ => true,
    }));
    assert_eq!(apply(body_units(&base), &operations), body_units(&target));
}

#[test]
fn test_bold_toggle_is_only_a_style_update() {
    let base = single_tab(vec![para("make this loud")]);
    let target = single_tab(vec![StructuralNode::Paragraph(Paragraph::new(vec![
        InlineNode::TextRun(TextRun::plain("make this ")),
        InlineNode::TextRun(TextRun::styled("loud", TextStyle::bold())),
    ]))]);

    let operations = diff(&base, &target).unwrap();
    assert_eq!(operations.len(), 1);
    let EditOperation::UpdateStyle {
        location,
        length,
        update: StyleUpdate::Text { fields, .. },
    } = &operations[0]
    else {
        panic!("expected a text style update, got {operations:?}");
    };
    assert_eq!((location.index, *length), (11, 4));
    assert_eq!(fields, &vec!["bold".to_string()]);
}

#[test]
fn test_edit_after_a_suggestion_is_shifted_past_it() {
    let base = single_tab(vec![StructuralNode::Paragraph(Paragraph::new(vec![
        InlineNode::TextRun(TextRun::plain("ab ")),
        InlineNode::Opaque(Opaque {
            kind: "suggestedInsertion".to_string(),
            length: 3,
        }),
        InlineNode::TextRun(TextRun::plain("cd")),
    ]))]);
    let target = single_tab(vec![para("ab cd more")]);

    let operations = diff(&base, &target).unwrap();
    assert_eq!(
        operations,
        vec![EditOperation::InsertText {
            location: body(9),
            text: " more".to_string(),
        }]
    );
    // The remote text still holds the suggested "XYZ".
    let remote = single_tab(vec![para("ab XYZcd")]);
    assert_eq!(
        apply(body_units(&remote), &operations),
        body_units(&single_tab(vec![para("ab XYZcd more")]))
    );
}

fn grid(rows: &[Vec<&str>]) -> StructuralNode {
    StructuralNode::Table(Table::from_text(rows).unwrap())
}

#[test]
fn test_cell_edit_touches_only_the_cell_text() {
    let base = single_tab(vec![grid(&[vec!["a", "b"], vec!["x", "y"]]), para("")]);
    let target = single_tab(vec![grid(&[vec!["a", "b"], vec!["x", "z"]]), para("")]);

    let operations = diff(&base, &target).unwrap();
    assert_eq!(
        operations,
        vec![
            EditOperation::DeleteRange {
                location: body(14),
                length: 1,
                scope: DeleteScope::Range,
            },
            EditOperation::InsertText {
                location: body(14),
                text: "z".to_string(),
            },
        ]
    );
    assert_eq!(apply(body_units(&base), &operations), body_units(&target));
}

#[test]
fn test_new_table_is_inserted_empty_then_filled() {
    let base = single_tab(vec![para("intro")]);
    let target = single_tab(vec![
        para("intro"),
        grid(&[vec!["ab", ""], vec!["c", "d"]]),
        para(""),
    ]);

    let operations = diff(&base, &target).unwrap();
    assert!(!operations.iter().any(EditOperation::is_delete), "{operations:?}");
    let inserted_tables: Vec<&Table> = operations
        .iter()
        .filter_map(|operation| match operation {
            EditOperation::InsertStructural {
                node: InsertedNode::Block(StructuralNode::Table(table)),
                ..
            } => Some(table),
            _ => None,
        })
        .collect();
    assert_eq!(inserted_tables.len(), 1);
    assert_eq!(
        *inserted_tables[0],
        Table::from_text(&[vec!["", ""], vec!["", ""]]).unwrap()
    );
    assert_eq!(apply(body_units(&base), &operations), body_units(&target));
}
