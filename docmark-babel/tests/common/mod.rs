//! Builders shared by the integration tests.

#![allow(dead_code)]

use docmark_babel::ir::nodes::{DocumentTree, Paragraph, StructuralNode, Tab};
use docmark_babel::{export_document, ConvertOptions};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub fn para(text: &str) -> StructuralNode {
    StructuralNode::Paragraph(Paragraph::text(text))
}

/// A single-tab document titled "Plan" whose tab is called "Notes".
pub fn single_tab(body: Vec<StructuralNode>) -> DocumentTree {
    DocumentTree::new("doc-1", "Plan", vec![Tab::new("t.0", "Notes", body)])
        .expect("valid document")
}

/// Exported files keyed by path, the shape `import_document` reads.
pub fn exported_files(doc: &DocumentTree, options: &ConvertOptions) -> BTreeMap<PathBuf, String> {
    export_document(doc, options)
        .expect("export to succeed")
        .files
        .into_iter()
        .map(|file| (file.path, file.contents))
        .collect()
}

/// The markdown written for the "Notes" tab body.
pub fn notes_markdown(doc: &DocumentTree, options: &ConvertOptions) -> String {
    exported_files(doc, options)
        .remove(&PathBuf::from("Notes.md"))
        .expect("Notes.md to be exported")
}

pub fn notes_files(markdown: &str) -> BTreeMap<PathBuf, String> {
    let mut files = BTreeMap::new();
    files.insert(PathBuf::from("Notes.md"), markdown.to_string());
    files
}
