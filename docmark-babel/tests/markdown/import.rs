//! Import tests for the Markdown format (Markdown → document)
//!
//! Hand-written markdown is read back against a base document and compared
//! by content equality, so run boundaries and volatile ids do not matter.

use crate::common::{notes_files, para, single_tab};
use docmark_babel::ir::equality::content_eq_blocks;
use docmark_babel::ir::nodes::{
    DocumentTree, FootnoteRef, InlineNode, Paragraph, PersonMention, PersonProperties, Segment,
    SegmentKind, StructuralNode, Tab, Table, TableCell, TextRun,
};
use docmark_babel::ir::style::{ParagraphStyle, TextStyle};
use docmark_babel::{import_document, ConvertOptions, ImportedDocument, SegmentFailure};
use std::path::PathBuf;

fn import(base: &DocumentTree, markdown: &str) -> ImportedDocument {
    import_document(base, &notes_files(markdown), &ConvertOptions::default())
        .expect("import to succeed")
}

fn body(imported: &ImportedDocument) -> &[StructuralNode] {
    &imported.tree.tabs()[0].body.content
}

fn run(text: &str, style: TextStyle) -> InlineNode {
    InlineNode::TextRun(TextRun::styled(text, style))
}

fn plain(text: &str) -> InlineNode {
    InlineNode::TextRun(TextRun::plain(text))
}

#[test]
fn test_inline_markup_becomes_run_styles() {
    let base = single_tab(vec![para("")]);
    let imported = import(
        &base,
        "# Title\n\nplain *it* **bold** ~~gone~~ <u>under</u> [link](https://x.test)\n",
    );

    let expected = single_tab(vec![
        StructuralNode::Paragraph(Paragraph::text("Title").with_style(ParagraphStyle::heading(1))),
        StructuralNode::Paragraph(Paragraph::new(vec![
            plain("plain "),
            run("it", TextStyle::italic()),
            plain(" "),
            run("bold", TextStyle::bold()),
            plain(" "),
            run(
                "gone",
                TextStyle {
                    strikethrough: Some(true),
                    ..TextStyle::default()
                },
            ),
            plain(" "),
            run(
                "under",
                TextStyle {
                    underline: Some(true),
                    ..TextStyle::default()
                },
            ),
            plain(" "),
            run("link", TextStyle::link("https://x.test")),
        ])),
    ]);
    assert!(imported.warnings.is_empty());
    assert!(
        imported.tree.content_eq(&expected),
        "unexpected body: {:#?}",
        body(&imported)
    );
}

#[test]
fn test_cell_line_breaks_split_paragraphs() {
    let base = single_tab(vec![para("")]);
    let imported = import(&base, "| a<br>b | c |\n| --- | --- |\n| d | |\n");

    let table = Table::new(vec![
        vec![
            TableCell::new(vec![para("a"), para("b")]),
            TableCell::text("c"),
        ],
        vec![TableCell::text("d"), TableCell::text("")],
    ])
    .unwrap();
    let expected = single_tab(vec![
        StructuralNode::Table(table),
        StructuralNode::Paragraph(Paragraph::default()),
    ]);
    assert!(
        imported.tree.content_eq(&expected),
        "unexpected body: {:#?}",
        body(&imported)
    );
}

#[test]
fn test_footnotes_reuse_base_ids_in_reference_order() {
    let mut tab = Tab::new(
        "t.0",
        "Notes",
        vec![StructuralNode::Paragraph(Paragraph::new(vec![
            plain("text"),
            InlineNode::FootnoteRef(FootnoteRef {
                footnote_id: "kix.fn9".to_string(),
                style: None,
            }),
        ]))],
    );
    tab.footnotes.insert(
        "kix.fn9".to_string(),
        Segment::new("kix.fn9", SegmentKind::Footnote, vec![para("old note")]),
    );
    let base = DocumentTree::new("doc-1", "Plan", vec![tab]).unwrap();

    let imported = import(&base, "text[^1]\n\n[^1]: new note\n");
    let footnotes = &imported.tree.tabs()[0].footnotes;
    assert_eq!(footnotes.keys().collect::<Vec<_>>(), vec!["kix.fn9"]);
    assert!(content_eq_blocks(
        &footnotes["kix.fn9"].content,
        &[para("new note")],
        &imported.tree.named_styles
    ));
    assert!(matches!(
        body(&imported)[0],
        StructuralNode::Paragraph(ref paragraph)
            if paragraph.elements.iter().any(|element| matches!(
                element,
                InlineNode::FootnoteRef(reference) if reference.footnote_id == "kix.fn9"
            ))
    ));
}

#[test]
fn test_wrapped_fallback_rebuilds_a_mention() {
    let base = single_tab(vec![para("")]);
    let imported = import(
        &base,
        "ask <!-- gdoc:{\"kind\":\"person\"} -->[Ada](mailto:ada@example.com)<!-- /gdoc -->\n",
    );

    let expected = single_tab(vec![StructuralNode::Paragraph(Paragraph::new(vec![
        plain("ask "),
        InlineNode::PersonMention(PersonMention {
            properties: PersonProperties {
                person_id: None,
                name: Some("Ada".to_string()),
                email: "ada@example.com".to_string(),
            },
            style: None,
        }),
    ]))]);
    assert!(
        imported.tree.content_eq(&expected),
        "unexpected body: {:#?}",
        body(&imported)
    );
}

#[test]
fn test_foreign_comments_are_ignored() {
    let base = single_tab(vec![para("")]);
    let imported = import(&base, "<!-- a note to self -->\n\nkept\n");
    assert!(imported.tree.content_eq(&single_tab(vec![para("kept")])));
}

#[test]
fn test_malformed_marker_fails_only_its_segment() {
    let base = single_tab(vec![para("remote text")]);
    let imported = import(&base, "first\n\nsecond <!-- gdoc:{kind} --> here\n");

    assert!(imported.tree.content_eq(&base));
    assert_eq!(imported.failures.len(), 1);
    let SegmentFailure { path, error, .. } = &imported.failures[0];
    assert_eq!(path, &PathBuf::from("Notes.md"));
    assert_eq!(error.line, 3);
}
