use docmark_babel::ir::nodes::{DocumentTree, InlineNode, StructuralNode};
use docmark_babel::snapshot;
use docmark_babel::{export_document, import_document, plan_sync, ConvertOptions, EditOperation};
use std::collections::BTreeMap;
use std::path::PathBuf;

const TABBED_DOCUMENT: &str = include_str!("../fixtures/tabbed_document.json");

fn load() -> DocumentTree {
    snapshot::from_json(TABBED_DOCUMENT).expect("fixture to map")
}

fn paragraph_texts(content: &[StructuralNode]) -> Vec<String> {
    content
        .iter()
        .filter_map(|block| match block {
            StructuralNode::Paragraph(paragraph) => Some(paragraph.plain_text()),
            _ => None,
        })
        .collect()
}

fn files(doc: &DocumentTree) -> BTreeMap<PathBuf, String> {
    export_document(doc, &ConvertOptions::default())
        .unwrap()
        .files
        .into_iter()
        .map(|file| (file.path, file.contents))
        .collect()
}

#[test]
fn test_tab_hierarchy_is_mapped() {
    let doc = load();
    assert_eq!(doc.document_id, "1AbC-d_9");
    assert_eq!(doc.title, "Field Guide");

    let ids: Vec<&str> = doc.flatten_tabs().iter().map(|tab| tab.id.as_str()).collect();
    assert_eq!(ids, vec!["t.0", "t.1"]);

    let overview = doc.find_tab("t.0").unwrap();
    assert_eq!(overview.title, "Overview");
    assert_eq!(overview.header.as_ref().map(|header| header.id.as_str()), Some("kix.h1"));
    assert_eq!(overview.footnotes.keys().collect::<Vec<_>>(), vec!["kix.fn1"]);
    assert_eq!(
        paragraph_texts(&overview.footnotes["kix.fn1"].content),
        vec!["Except penguins."]
    );
}

#[test]
fn test_body_content_follows_the_index_rules() {
    let doc = load();
    let overview = doc.find_tab("t.0").unwrap();

    // The leading section break and trailing newlines are implied.
    assert_eq!(overview.body.content.len(), 3);
    assert_eq!(
        paragraph_texts(&overview.body.content),
        vec!["Birds", "Most birds fly", ""]
    );

    let StructuralNode::Paragraph(image_paragraph) = &overview.body.content[2] else {
        panic!("expected a paragraph");
    };
    let [InlineNode::InlineImage(image)] = image_paragraph.elements.as_slice() else {
        panic!("expected a lone image, got {:?}", image_paragraph.elements);
    };
    assert_eq!(image.object_id, "kix.img1");
    assert_eq!(image.description.as_deref(), Some("A robin"));
    assert_eq!(image.content_uri.as_deref(), Some("https://lh3.example/robin"));
}

#[test]
fn test_child_tab_lists_hide_suggestions() {
    let doc = load();
    let checklist = doc.find_tab("t.1").unwrap();

    assert_eq!(
        paragraph_texts(&checklist.body.content),
        vec!["binoculars", "notebook"]
    );
    for block in &checklist.body.content {
        let StructuralNode::Paragraph(paragraph) = block else {
            panic!("expected list paragraphs only");
        };
        let list = paragraph.list.as_ref().expect("list membership");
        assert_eq!(list.list_id, "kix.list1");
        assert!(!list.ordered);
    }
}

#[test]
fn test_export_lays_out_every_segment() {
    let files = files(&load());

    assert_eq!(
        files.keys().cloned().collect::<Vec<_>>(),
        vec![
            PathBuf::from("Overview/Checklist.md"),
            PathBuf::from("Overview.header.md"),
            PathBuf::from("Overview.md"),
        ]
    );
    assert_eq!(files[&PathBuf::from("Overview/Checklist.md")], "- binoculars\n- notebook\n");
    assert_eq!(files[&PathBuf::from("Overview.header.md")], "Field notes\n");

    let overview = &files[&PathBuf::from("Overview.md")];
    assert!(overview.starts_with("# Birds\n\nMost birds **fly**[^1]\n\n"));
    assert!(overview.contains("![A robin](imgs/kix.img1.png)"));
    assert!(overview.contains("[^1]: Except penguins."));
    assert!(overview.contains("<!-- gdoc-metadata -->"));
}

#[test]
fn test_unchanged_export_syncs_to_nothing() {
    let doc = load();
    let files = files(&doc);
    let options = ConvertOptions::default();

    let imported = import_document(&doc, &files, &options).unwrap();
    assert!(imported.warnings.is_empty(), "{:?}", imported.warnings);
    assert!(imported.tree.content_eq(&doc));

    let plan = plan_sync(&doc, &files, &options).unwrap();
    assert!(plan.operations.is_empty(), "{:#?}", plan.operations);
}

#[test]
fn test_edit_in_a_child_tab_is_addressed_to_it() {
    let doc = load();
    let mut files = files(&doc);
    files.insert(
        PathBuf::from("Overview/Checklist.md"),
        "- binoculars\n- notebook\n- pencil\n".to_string(),
    );

    let plan = plan_sync(&doc, &files, &ConvertOptions::default()).unwrap();
    assert!(!plan.operations.is_empty());
    assert!(plan
        .operations
        .iter()
        .all(|operation| operation.location().tab_id == "t.1"));
}

#[test]
fn test_new_item_lands_after_the_hidden_suggestion() {
    let doc = load();
    let mut files = files(&doc);
    files.insert(
        PathBuf::from("Overview/Checklist.md"),
        "- binoculars\n- notebook\n- compass\n".to_string(),
    );

    let plan = plan_sync(&doc, &files, &ConvertOptions::default()).unwrap();
    // "notebook" ends at 20; the suggested " and pencil" holds 20..31.
    let [EditOperation::InsertText { location, text }] = plan.operations.as_slice() else {
        panic!("expected one insert, got {:#?}", plan.operations);
    };
    assert_eq!((location.tab_id.as_str(), location.index), ("t.1", 31));
    assert_eq!(text, "\ncompass");
}
