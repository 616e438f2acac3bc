//! Tab layout tests
//!
//! File names produced for a document's tab hierarchy and the reverse
//! mapping used on import.

use crate::common::para;
use docmark_babel::common::paths::{document_dir, TabLayout};
use docmark_babel::ir::nodes::{DocumentTree, SegmentKey, Tab};
use docmark_babel::DocError;
use std::path::{Path, PathBuf};

fn tab(id: &str, title: &str) -> Tab {
    Tab::new(id, title, vec![para("")])
}

#[test]
fn test_sibling_tabs_with_one_name_get_suffixes() {
    let doc = DocumentTree::new("doc", "Plan", vec![tab("t.1", "Notes"), tab("t.2", "Notes")]).unwrap();
    let layout = TabLayout::build(&doc, "md", "imgs").unwrap();

    assert_eq!(layout.body_path("t.1"), Some(Path::new("Notes.md")));
    assert_eq!(layout.body_path("t.2"), Some(Path::new("Notes_2.md")));
    assert_eq!(
        layout.resolve(Path::new("Notes_2.md")).map(|entry| &entry.key),
        Some(&SegmentKey::new("t.2", ""))
    );
}

#[test]
fn test_names_only_collide_among_siblings() {
    let mut first = tab("t.1", "Notes");
    first.children.push(tab("t.3", "Notes"));
    let doc = DocumentTree::new("doc", "Plan", vec![first, tab("t.2", "Notes")]).unwrap();
    let layout = TabLayout::build(&doc, "md", "imgs").unwrap();

    assert_eq!(layout.body_path("t.3"), Some(Path::new("Notes/Notes.md")));
    assert_eq!(layout.body_path("t.2"), Some(Path::new("Notes_2.md")));
}

#[test]
fn test_document_directory_uses_the_sanitized_title() {
    let doc = DocumentTree::new("doc", "Q3: Plan/Review", vec![tab("t.1", "Notes")]).unwrap();
    assert_eq!(document_dir(&doc), PathBuf::from("Q3_ Plan_Review"));
}

#[test]
fn test_missing_tab_id_has_no_path() {
    let doc = DocumentTree::new("doc", "Plan", vec![tab("t.1", "Notes")]).unwrap();
    let layout = TabLayout::build(&doc, "md", "imgs").unwrap();
    assert_eq!(layout.body_path("t.9"), None);
    assert!(layout.resolve(Path::new("Other.md")).is_none());
}

#[test]
fn test_empty_document_is_a_structure_violation() {
    let result = DocumentTree::new("doc", "Plan", Vec::new());
    assert!(matches!(result, Err(DocError::StructureViolation { .. })));
}
