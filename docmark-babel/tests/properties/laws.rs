use crate::common::{exported_files, single_tab};
use crate::diff::replay::{apply, body_units};
use docmark_babel::ir::nodes::{DocumentTree, InlineNode, Paragraph, StructuralNode, TextRun};
use docmark_babel::ir::style::{ParagraphStyle, TextStyle};
use docmark_babel::{
    diff, export_document, import_document, plan_sync, ConvertOptions, EditOperation,
};
use proptest::prelude::*;

fn paragraph_text() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z]{1,8}", 1..5).prop_map(|words| words.join(" "))
}

fn styled_paragraph() -> impl Strategy<Value = StructuralNode> {
    (paragraph_text(), 0u8..=6, any::<bool>()).prop_map(|(text, level, bold)| {
        let run = if bold {
            TextRun::styled(text, TextStyle::bold())
        } else {
            TextRun::plain(text)
        };
        StructuralNode::Paragraph(
            Paragraph::new(vec![InlineNode::TextRun(run)]).with_style(ParagraphStyle::heading(level)),
        )
    })
}

fn document() -> impl Strategy<Value = DocumentTree> {
    prop::collection::vec(styled_paragraph(), 1..6).prop_map(single_tab)
}

fn marks() -> impl Strategy<Value = TextStyle> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(bold, italic, strikethrough, underline)| TextStyle {
            bold: bold.then_some(true),
            italic: italic.then_some(true),
            strikethrough: strikethrough.then_some(true),
            underline: underline.then_some(true),
            ..TextStyle::default()
        },
    )
}

/// Runs with their own marks. A run either glues onto the previous one
/// mid-word or sits apart behind a plain space.
fn marked_paragraph() -> impl Strategy<Value = StructuralNode> {
    prop::collection::vec(("[a-z]{1,3}( [a-z]{1,3})?", marks(), any::<bool>()), 1..6).prop_map(
        |runs| {
            let mut elements = Vec::new();
            for (text, style, spaced) in runs {
                if spaced && !elements.is_empty() {
                    elements.push(InlineNode::TextRun(TextRun::plain(" ")));
                }
                elements.push(InlineNode::TextRun(TextRun::styled(text, style)));
            }
            StructuralNode::Paragraph(Paragraph::new(elements))
        },
    )
}

fn marked_document() -> impl Strategy<Value = DocumentTree> {
    prop::collection::vec(marked_paragraph(), 1..4).prop_map(single_tab)
}

/// Words drawn from a small vocabulary so that base and target overlap.
fn sentence() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(vec!["a", "bb", "ccc", "😀", "dé"]), 0..8)
        .prop_map(|words| words.join(" "))
}

fn one_paragraph(text: &str) -> DocumentTree {
    single_tab(vec![StructuralNode::Paragraph(Paragraph::text(text))])
}

proptest! {
    #[test]
    fn test_export_is_deterministic(doc in document()) {
        let options = ConvertOptions::default();
        let first = export_document(&doc, &options).unwrap();
        let second = export_document(&doc, &options).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_export_then_import_preserves_content(doc in document()) {
        let options = ConvertOptions::default();
        let files = exported_files(&doc, &options);
        let imported = import_document(&doc, &files, &options).unwrap();
        prop_assert!(imported.failures.is_empty());
        prop_assert!(imported.tree.content_eq(&doc), "{:#?}\n{:?}", imported.tree, files);
    }

    #[test]
    fn test_mixed_marks_survive_export_and_import(doc in marked_document()) {
        let options = ConvertOptions::default();
        let files = exported_files(&doc, &options);
        let imported = import_document(&doc, &files, &options).unwrap();
        prop_assert!(imported.tree.content_eq(&doc), "{:#?}\n{:?}", imported.tree, files);
    }

    #[test]
    fn test_unchanged_export_plans_no_operations(doc in marked_document()) {
        let options = ConvertOptions::default();
        let files = exported_files(&doc, &options);
        let plan = plan_sync(&doc, &files, &options).unwrap();
        prop_assert!(plan.operations.is_empty(), "{:#?}\n{:?}", plan.operations, files);
    }

    #[test]
    fn test_identical_documents_diff_to_nothing(text in "[a-zé😀 ]{0,24}") {
        let doc = one_paragraph(&text);
        prop_assert_eq!(diff(&doc, &doc).unwrap(), Vec::<EditOperation>::new());
    }

    #[test]
    fn test_replaying_operations_reaches_the_target(base in sentence(), target in sentence()) {
        let base = one_paragraph(&base);
        let target = one_paragraph(&target);
        let operations = diff(&base, &target).unwrap();
        prop_assert_eq!(apply(body_units(&base), &operations), body_units(&target));
    }

    #[test]
    fn test_deletes_descend_and_precede_inserts(base in sentence(), target in sentence()) {
        let operations = diff(&one_paragraph(&base), &one_paragraph(&target)).unwrap();

        let first_insert = operations.iter().position(EditOperation::is_insert);
        let last_delete = operations.iter().rposition(EditOperation::is_delete);
        if let (Some(insert), Some(delete)) = (first_insert, last_delete) {
            prop_assert!(delete < insert);
        }

        let deletes: Vec<usize> = operations
            .iter()
            .filter(|operation| operation.is_delete())
            .map(|operation| operation.location().index)
            .collect();
        prop_assert!(deletes.windows(2).all(|pair| pair[0] > pair[1]));

        let inserts: Vec<usize> = operations
            .iter()
            .filter(|operation| operation.is_insert())
            .map(|operation| operation.location().index)
            .collect();
        prop_assert!(inserts.windows(2).all(|pair| pair[0] <= pair[1]));
    }
}
