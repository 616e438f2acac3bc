//! Export tests for the Markdown format (document → Markdown)

use crate::common::{notes_markdown, para, single_tab};
use docmark_babel::ir::nodes::{
    InlineNode, ListMembership, Paragraph, PersonMention, PersonProperties, StructuralNode, Table,
    TextRun,
};
use docmark_babel::ir::style::{NamedStyleType, ParagraphStyle, TextStyle};
use docmark_babel::{export_document, ConvertOptions, MetadataMode, Warning};
use insta::assert_snapshot;

fn item(text: &str, list_id: &str, nesting_level: usize) -> StructuralNode {
    StructuralNode::Paragraph(Paragraph::text(text).with_list(ListMembership {
        list_id: list_id.to_string(),
        nesting_level,
        ordered: false,
    }))
}

fn mention() -> StructuralNode {
    StructuralNode::Paragraph(Paragraph::new(vec![
        InlineNode::TextRun(TextRun::plain("ask ")),
        InlineNode::PersonMention(PersonMention {
            properties: PersonProperties {
                person_id: Some("p-42".to_string()),
                name: Some("Ada".to_string()),
                email: "ada@example.com".to_string(),
            },
            style: None,
        }),
    ]))
}

#[test]
fn test_kitchensink_export() {
    let doc = single_tab(vec![
        StructuralNode::Paragraph(
            Paragraph::text("Guide").with_style(ParagraphStyle::named(NamedStyleType::Title)),
        ),
        StructuralNode::Paragraph(
            Paragraph::text("Field notes").with_style(ParagraphStyle::heading(2)),
        ),
        StructuralNode::Paragraph(Paragraph::new(vec![
            InlineNode::TextRun(TextRun::plain("Some ")),
            InlineNode::TextRun(TextRun::styled("bold", TextStyle::bold())),
            InlineNode::TextRun(TextRun::plain(" and ")),
            InlineNode::TextRun(TextRun::styled("code", TextStyle::code())),
        ])),
        item("one", "l1", 0),
        item("child", "l1", 1),
        item("two", "l1", 0),
        StructuralNode::Table(Table::from_text(&[vec!["H1", "H2"], vec!["x", "y"]]).unwrap()),
        StructuralNode::Paragraph(Paragraph::default()),
        para("end"),
    ]);

    let md = notes_markdown(&doc, &ConvertOptions::default());
    assert_snapshot!(md, @r##"
    # <!-- gdoc:{"kind":"title"} -->Guide

    ## Field notes

    Some **bold** and `code`

    - one
        - child
    - two

    | H1 | H2 |
    | --- | --- |
    | x | y |

    <br>

    end
    "##);
}

#[test]
fn test_adjacent_lists_get_a_separator() {
    let doc = single_tab(vec![item("a", "l1", 0), item("b", "l2", 0)]);
    let md = notes_markdown(&doc, &ConvertOptions::default());
    assert_eq!(md, "- a\n\n<!-- end list -->\n\n- b\n");
}

#[test]
fn test_skipped_list_levels_are_clamped() {
    let doc = single_tab(vec![item("top", "l1", 0), item("deep", "l1", 3)]);
    let md = notes_markdown(&doc, &ConvertOptions::default());
    assert_eq!(md, "- top\n    - deep\n");
}

#[test]
fn test_monospace_paragraphs_share_a_fence() {
    let code = |text: &str| {
        StructuralNode::Paragraph(Paragraph::new(vec![InlineNode::TextRun(TextRun::styled(
            text,
            TextStyle::code(),
        ))]))
    };
    let doc = single_tab(vec![code("fn main() {"), code("}"), para("after")]);
    let md = notes_markdown(&doc, &ConvertOptions::default());
    assert_eq!(md, "```\nfn main() {\n}\n```\n\nafter\n");
}

#[test]
fn test_block_syntax_at_line_start_is_escaped() {
    let doc = single_tab(vec![para("# not a heading"), para("1. not a list")]);
    let md = notes_markdown(&doc, &ConvertOptions::default());
    assert_eq!(md, "\\# not a heading\n\n1\\. not a list\n");
}

#[test]
fn test_embedded_metadata_carries_mention_ids() {
    let doc = single_tab(vec![mention()]);
    let md = notes_markdown(&doc, &ConvertOptions::default());

    assert!(md.starts_with(
        "ask <!-- gdoc:{\"kind\":\"person\",\"token\":\"n1\"} -->[Ada](mailto:ada@example.com)<!-- /gdoc -->\n"
    ));
    assert!(md.contains("<!-- gdoc-metadata -->\n```json\n"));
    assert!(md.contains("p-42"));
}

#[test]
fn test_disabled_metadata_warns_about_dropped_ids() {
    let options = ConvertOptions {
        metadata: MetadataMode::Disabled,
        ..ConvertOptions::default()
    };
    let exported = export_document(&single_tab(vec![mention()]), &options).unwrap();

    assert_eq!(exported.files.len(), 1);
    assert_eq!(
        exported.files[0].contents,
        "ask <!-- gdoc:{\"kind\":\"person\"} -->[Ada](mailto:ada@example.com)<!-- /gdoc -->\n"
    );
    assert!(matches!(
        exported.warnings.as_slice(),
        [Warning::UnrepresentableFeature { feature, .. }] if feature == "person"
    ));
}
