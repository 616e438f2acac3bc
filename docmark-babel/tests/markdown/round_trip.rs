//! Round-trip tests: export a document, read the files back, compare.

use crate::common::{exported_files, para};
use docmark_babel::ir::nodes::{
    DateMention, DateProperties, DocumentTree, FootnoteRef, InlineImage, InlineNode,
    ListMembership, Paragraph, PersonMention, PersonProperties, RichLink, RichLinkProperties,
    SectionBreak, Segment, SegmentKind, StructuralNode, Styled, Tab, Table, TextRun,
};
use docmark_babel::ir::style::{NamedStyleType, ParagraphStyle, TextStyle};
use docmark_babel::{import_document, plan_sync, ConvertOptions, MetadataMode};
use std::path::PathBuf;

fn inline(elements: Vec<InlineNode>) -> StructuralNode {
    StructuralNode::Paragraph(Paragraph::new(elements))
}

fn plain(text: &str) -> InlineNode {
    InlineNode::TextRun(TextRun::plain(text))
}

fn person() -> InlineNode {
    InlineNode::PersonMention(PersonMention {
        properties: PersonProperties {
            person_id: Some("p-42".to_string()),
            name: Some("Ada".to_string()),
            email: "ada@example.com".to_string(),
        },
        style: None,
    })
}

fn kitchensink() -> DocumentTree {
    let mut notes = Tab::new(
        "t.0",
        "Notes",
        vec![
            StructuralNode::SectionBreak(SectionBreak {
                section_type: Some("NEXT_PAGE".to_string()),
            }),
            StructuralNode::Paragraph(
                Paragraph::text("Guide").with_style(ParagraphStyle::named(NamedStyleType::Title)),
            ),
            StructuralNode::Paragraph(
                Paragraph::text("Birds").with_style(ParagraphStyle::heading(1)),
            ),
            inline(vec![
                plain("Most birds "),
                InlineNode::TextRun(TextRun::styled("fly", TextStyle::bold())),
                InlineNode::FootnoteRef(FootnoteRef {
                    footnote_id: "kix.fn1".to_string(),
                    style: None,
                }),
            ]),
            inline(vec![
                plain("Met "),
                person(),
                plain(" on "),
                InlineNode::DateMention(DateMention {
                    display_text: "Oct 18, 2026".to_string(),
                    properties: DateProperties {
                        timestamp: Some("2026-10-18T00:00:00Z".to_string()),
                        ..DateProperties::default()
                    },
                    style: None,
                }),
                plain(", see "),
                InlineNode::RichLink(RichLink {
                    properties: RichLinkProperties {
                        rich_link_id: Some("rl-1".to_string()),
                        title: "Design doc".to_string(),
                        uri: "https://example.com/design".to_string(),
                        mime_type: Some("text/html".to_string()),
                    },
                    style: None,
                }),
            ]),
            inline(vec![
                plain("before"),
                InlineNode::PageBreak(Styled::default()),
            ]),
            inline(vec![InlineNode::InlineImage(InlineImage {
                object_id: "kix.img1".to_string(),
                description: Some("A robin".to_string()),
                content_uri: Some("https://lh3.example/robin".to_string()),
                style: None,
            })]),
            StructuralNode::Paragraph(Paragraph::text("binoculars").with_list(ListMembership {
                list_id: "kix.list1".to_string(),
                nesting_level: 0,
                ordered: true,
            })),
            StructuralNode::Paragraph(Paragraph::text("notebook").with_list(ListMembership {
                list_id: "kix.list1".to_string(),
                nesting_level: 0,
                ordered: true,
            })),
            StructuralNode::Table(
                Table::from_text(&[vec!["Species", "Count"], vec!["Robin", "3"]]).unwrap(),
            ),
            para("done"),
        ],
    );
    notes.header = Some(Segment::new(
        "kix.h1",
        SegmentKind::Header,
        vec![para("Running head")],
    ));
    notes.footnotes.insert(
        "kix.fn1".to_string(),
        Segment::new("kix.fn1", SegmentKind::Footnote, vec![para("Except penguins.")]),
    );
    notes
        .children
        .push(Tab::new("t.1", "Appendix", vec![para("child body")]));

    DocumentTree::new("doc-1", "Field Guide", vec![notes]).unwrap()
}

fn round_trip(options: &ConvertOptions) {
    let doc = kitchensink();
    let files = exported_files(&doc, options);
    let imported = import_document(&doc, &files, options).unwrap();

    assert!(imported.warnings.is_empty(), "{:?}", imported.warnings);
    assert!(imported.failures.is_empty(), "{:?}", imported.failures);
    assert!(
        imported.tree.content_eq(&doc),
        "round trip changed the document: {:#?}",
        imported.tree
    );

    let plan = plan_sync(&doc, &files, options).unwrap();
    assert!(plan.operations.is_empty(), "{:#?}", plan.operations);
}

#[test]
fn test_embedded_round_trip() {
    let options = ConvertOptions::default();
    let files = exported_files(&kitchensink(), &options);
    assert_eq!(
        files.keys().cloned().collect::<Vec<_>>(),
        vec![
            PathBuf::from("Notes/Appendix.md"),
            PathBuf::from("Notes.header.md"),
            PathBuf::from("Notes.md"),
        ]
    );
    round_trip(&options);
}

#[test]
fn test_companion_round_trip() {
    let options = ConvertOptions {
        metadata: MetadataMode::Companion,
        ..ConvertOptions::default()
    };
    let files = exported_files(&kitchensink(), &options);
    assert!(files.contains_key(&PathBuf::from("Notes.meta.json")));
    assert!(!files[&PathBuf::from("Notes.md")].contains("gdoc-metadata"));
    round_trip(&options);
}

#[test]
fn test_disabled_metadata_loses_only_side_channel_fields() {
    let options = ConvertOptions {
        metadata: MetadataMode::Disabled,
        ..ConvertOptions::default()
    };
    let doc = DocumentTree::new(
        "doc-1",
        "Plan",
        vec![Tab::new("t.0", "Notes", vec![inline(vec![plain("ask "), person()])])],
    )
    .unwrap();
    let imported = import_document(&doc, &exported_files(&doc, &options), &options).unwrap();

    let StructuralNode::Paragraph(paragraph) = &imported.tree.tabs()[0].body.content[0] else {
        panic!("expected a paragraph");
    };
    let Some(InlineNode::PersonMention(mention)) = paragraph.elements.last() else {
        panic!("expected a mention, got {:?}", paragraph.elements);
    };
    assert_eq!(mention.properties.person_id, None);
    assert_eq!(mention.properties.name.as_deref(), Some("Ada"));
    assert_eq!(mention.properties.email, "ada@example.com");
}

fn assert_round_trip(body: Vec<StructuralNode>, expected_markdown: &str) {
    let doc = DocumentTree::new("doc-1", "Plan", vec![Tab::new("t.0", "Notes", body)]).unwrap();
    let options = ConvertOptions::default();
    let files = exported_files(&doc, &options);
    assert_eq!(files[&PathBuf::from("Notes.md")], expected_markdown);

    let imported = import_document(&doc, &files, &options).unwrap();
    assert!(
        imported.tree.content_eq(&doc),
        "round trip changed the document: {:#?}",
        imported.tree.tabs()[0].body.content
    );
}

#[test]
fn test_heading_round_trip() {
    assert_round_trip(
        vec![StructuralNode::Paragraph(
            Paragraph::text("Title").with_style(ParagraphStyle::heading(1)),
        )],
        "# Title\n",
    );
}

#[test]
fn test_bold_runs_merge_into_one_span() {
    assert_round_trip(
        vec![inline(vec![
            InlineNode::TextRun(TextRun::styled("a", TextStyle::bold())),
            InlineNode::TextRun(TextRun::styled("b", TextStyle::bold())),
        ])],
        "**ab**\n",
    );
}

#[test]
fn test_table_round_trip() {
    assert_round_trip(
        vec![
            StructuralNode::Table(Table::from_text(&[vec!["H1", "H2"], vec!["x", "y"]]).unwrap()),
            para(""),
        ],
        "| H1 | H2 |\n| --- | --- |\n| x | y |\n\n<br>\n",
    );
}

#[test]
fn test_rule_and_link_round_trip() {
    assert_round_trip(
        vec![
            inline(vec![InlineNode::Rule]),
            inline(vec![
                plain("read "),
                InlineNode::TextRun(TextRun::styled("this", TextStyle::link("https://example.com/a"))),
            ]),
        ],
        "---\n\nread [this](https://example.com/a)\n",
    );
}
