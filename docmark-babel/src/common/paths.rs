//! Segment/tab resolver.
//!
//! Maps the tab hierarchy of a document onto relative file paths and back.
//! A tab becomes `<stem>.<ext>` inside its parent's directory, where `<stem>`
//! is the sanitized tab title, deduplicated among siblings in document order
//! (`Notes`, `Notes_2`, `Notes_3`, ...). Child tabs live in a directory named
//! after the parent's stem. Headers and footers become
//! `<stem>.header.<ext>` / `<stem>.footer.<ext>`; footnotes travel inside the
//! body file.
//!
//! Comparisons are case-insensitive so the layout is stable on
//! case-folding file systems.

use crate::error::DocError;
use crate::ir::nodes::{DocumentTree, SegmentKey, SegmentKind, Tab};
use std::collections::{BTreeMap, HashSet};
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use url::Url;

const FALLBACK_NAME: &str = "Untitled";

/// One file of the layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutEntry {
    pub key: SegmentKey,
    pub kind: SegmentKind,
    /// Relative to the document directory.
    pub path: PathBuf,
}

/// Bidirectional mapping between segments and relative file paths.
#[derive(Debug, Clone, Default)]
pub struct TabLayout {
    entries: Vec<LayoutEntry>,
    by_path: BTreeMap<String, usize>,
}

impl TabLayout {
    /// Lays out every tab of `doc`. `images_dir` is reserved at the root so a
    /// tab called `imgs` cannot shadow the image directory.
    pub fn build(doc: &DocumentTree, extension: &str, images_dir: &str) -> Result<Self, DocError> {
        let mut layout = TabLayout::default();
        let mut used: HashSet<String> = HashSet::new();
        used.insert(images_dir.to_lowercase());
        layout.place_tabs(doc.tabs(), Path::new(""), extension, &mut used);
        layout.index()?;
        debug!(files = layout.entries.len(), "laid out document tabs");
        Ok(layout)
    }

    fn place_tabs(&mut self, tabs: &[Tab], dir: &Path, extension: &str, used: &mut HashSet<String>) {
        for tab in tabs {
            let stem = unique_stem(&sanitize_name(&tab.title), used);

            self.entries.push(LayoutEntry {
                key: SegmentKey::new(&tab.id, tab.body.id.clone()),
                kind: SegmentKind::Body,
                path: dir.join(format!("{stem}.{extension}")),
            });
            if let Some(header) = &tab.header {
                self.entries.push(LayoutEntry {
                    key: SegmentKey::new(&tab.id, header.id.clone()),
                    kind: SegmentKind::Header,
                    path: dir.join(format!("{stem}.header.{extension}")),
                });
            }
            if let Some(footer) = &tab.footer {
                self.entries.push(LayoutEntry {
                    key: SegmentKey::new(&tab.id, footer.id.clone()),
                    kind: SegmentKind::Footer,
                    path: dir.join(format!("{stem}.footer.{extension}")),
                });
            }

            if !tab.children.is_empty() {
                let mut child_used = HashSet::new();
                self.place_tabs(&tab.children, &dir.join(&stem), extension, &mut child_used);
            }
        }
    }

    fn index(&mut self) -> Result<(), DocError> {
        for (position, entry) in self.entries.iter().enumerate() {
            let folded = fold_path(&entry.path);
            if let Some(&existing) = self.by_path.get(&folded) {
                return Err(DocError::AmbiguousPath {
                    path: entry.path.display().to_string(),
                    tab_ids: vec![
                        self.entries[existing].key.tab_id.clone(),
                        entry.key.tab_id.clone(),
                    ],
                });
            }
            self.by_path.insert(folded, position);
        }
        Ok(())
    }

    pub fn entries(&self) -> &[LayoutEntry] {
        &self.entries
    }

    pub fn path_of(&self, key: &SegmentKey) -> Option<&Path> {
        self.entries
            .iter()
            .find(|entry| &entry.key == key)
            .map(|entry| entry.path.as_path())
    }

    /// Path of a tab's body file.
    pub fn body_path(&self, tab_id: &str) -> Option<&Path> {
        self.entries
            .iter()
            .find(|entry| entry.key.tab_id == tab_id && entry.kind == SegmentKind::Body)
            .map(|entry| entry.path.as_path())
    }

    /// Inverse mapping: which segment a relative path belongs to.
    pub fn resolve(&self, path: &Path) -> Option<&LayoutEntry> {
        self.by_path
            .get(&fold_path(path))
            .map(|&position| &self.entries[position])
    }
}

fn fold_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy().to_lowercase())
        .collect::<Vec<_>>()
        .join("/")
}

fn unique_stem(base: &str, used: &mut HashSet<String>) -> String {
    let mut candidate = base.to_string();
    let mut suffix = 2;
    while used.contains(&candidate.to_lowercase()) {
        candidate = format!("{base}_{suffix}");
        suffix += 1;
    }
    used.insert(candidate.to_lowercase());
    candidate
}

/// Turns a display name into a file-system-safe stem.
///
/// Letters, digits, spaces, `-` and `_` are kept; anything else becomes `_`.
/// Runs of whitespace collapse to one space and the result is trimmed.
pub fn sanitize_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else if c.is_whitespace() {
                ' '
            } else {
                '_'
            }
        })
        .collect();
    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        collapsed
    }
}

/// Directory name for a whole document.
pub fn document_dir(doc: &DocumentTree) -> PathBuf {
    PathBuf::from(sanitize_name(&doc.title))
}

/// First code-unit index of a segment: the body starts after its implicit
/// leading section break.
pub fn index_base(kind: SegmentKind) -> usize {
    match kind {
        SegmentKind::Body => 1,
        SegmentKind::Header | SegmentKind::Footer | SegmentKind::Footnote => 0,
    }
}

/// Extracts the document id from a document URI, or accepts a bare id.
pub fn extract_document_id(uri: &str) -> Option<String> {
    let is_id = |s: &str| {
        !s.is_empty()
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    };

    match Url::parse(uri) {
        Ok(url) => {
            let segments: Vec<&str> = url.path_segments()?.collect();
            segments
                .windows(3)
                .find(|window| window[0] == "document" && window[1] == "d" && is_id(window[2]))
                .map(|window| window[2].to_string())
        }
        Err(_) if is_id(uri.trim()) => Some(uri.trim().to_string()),
        Err(_) => None,
    }
}

/// Relative link from the markdown file at `file_path` to the placeholder of
/// an extracted image.
pub fn image_placeholder(file_path: &Path, images_dir: &str, object_id: &str) -> String {
    let image = Path::new(images_dir).join(format!("{object_id}.png"));
    let base = file_path.parent().unwrap_or_else(|| Path::new(""));
    let relative = pathdiff::diff_paths(&image, base).unwrap_or(image);
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Inverse of [`image_placeholder`]: the object id when `link` points at a
/// placeholder inside the image directory.
pub fn placeholder_object_id(file_path: &Path, images_dir: &str, link: &str) -> Option<String> {
    let base = file_path.parent().unwrap_or_else(|| Path::new(""));
    let mut resolved: Vec<String> = Vec::new();
    for component in base.join(link).components() {
        match component {
            Component::Normal(part) => resolved.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => {
                resolved.pop()?;
            }
            _ => {}
        }
    }
    let file = resolved.pop()?;
    if resolved.len() != 1 || !resolved[0].eq_ignore_ascii_case(images_dir) {
        return None;
    }
    file.strip_suffix(".png").map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::nodes::{Paragraph, Segment, StructuralNode};

    fn tab(id: &str, title: &str) -> Tab {
        Tab::new(id, title, vec![StructuralNode::Paragraph(Paragraph::default())])
    }

    fn layout(tabs: Vec<Tab>) -> TabLayout {
        let doc = DocumentTree::new("doc", "Doc Title", tabs).unwrap();
        TabLayout::build(&doc, "md", "imgs").unwrap()
    }

    #[test]
    fn test_sanitize_keeps_safe_characters() {
        assert_eq!(sanitize_name("Q&A: round 2"), "Q_A_ round 2");
        assert_eq!(sanitize_name("  spaced \t out  "), "spaced out");
        assert_eq!(sanitize_name("???"), "___");
        assert_eq!(sanitize_name("   "), "Untitled");
        assert_eq!(sanitize_name("v1.2"), "v1_2");
    }

    #[test]
    fn test_children_nest_under_parent_stem() {
        let mut parent = tab("t.1", "Tab 1");
        parent.children.push(tab("t.2", "Subtab A"));
        let layout = layout(vec![parent]);

        assert_eq!(layout.body_path("t.1"), Some(Path::new("Tab 1.md")));
        assert_eq!(layout.body_path("t.2"), Some(Path::new("Tab 1/Subtab A.md")));
    }

    #[test]
    fn test_duplicates_skip_names_already_taken() {
        let layout = layout(vec![
            tab("t.1", "Notes"),
            tab("t.2", "notes_2"),
            tab("t.3", "NOTES"),
        ]);
        assert_eq!(layout.body_path("t.1"), Some(Path::new("Notes.md")));
        assert_eq!(layout.body_path("t.2"), Some(Path::new("notes_2.md")));
        assert_eq!(layout.body_path("t.3"), Some(Path::new("NOTES_3.md")));
    }

    #[test]
    fn test_image_directory_is_reserved() {
        let layout = layout(vec![tab("t.1", "imgs")]);
        assert_eq!(layout.body_path("t.1"), Some(Path::new("imgs_2.md")));
    }

    #[test]
    fn test_headers_and_footers_share_the_stem() {
        let mut with_header = tab("t.1", "Intro");
        with_header.header = Some(Segment::new("kix.h1", SegmentKind::Header, vec![]));
        with_header.footer = Some(Segment::new("kix.f1", SegmentKind::Footer, vec![]));
        let layout = layout(vec![with_header]);

        let header = layout.resolve(Path::new("intro.HEADER.md")).unwrap();
        assert_eq!(header.key, SegmentKey::new("t.1", "kix.h1"));
        assert_eq!(header.kind, SegmentKind::Header);
        assert_eq!(
            layout.path_of(&SegmentKey::new("t.1", "kix.f1")),
            Some(Path::new("Intro.footer.md"))
        );
    }

    #[test]
    fn test_index_base_depends_on_segment_kind() {
        assert_eq!(index_base(SegmentKind::Body), 1);
        assert_eq!(index_base(SegmentKind::Header), 0);
        assert_eq!(index_base(SegmentKind::Footnote), 0);
    }

    #[test]
    fn test_document_ids_come_from_uris_or_bare_ids() {
        assert_eq!(
            extract_document_id("https://docs.google.com/document/d/1AbC-d_9/edit?usp=sharing"),
            Some("1AbC-d_9".to_string())
        );
        assert_eq!(extract_document_id("1AbC-d_9"), Some("1AbC-d_9".to_string()));
        assert_eq!(extract_document_id("https://example.com/other"), None);
        assert_eq!(extract_document_id("not an id"), None);
    }

    #[test]
    fn test_image_placeholders_are_relative_to_the_file() {
        let nested = Path::new("Tab 1/Subtab A.md");
        assert_eq!(image_placeholder(nested, "imgs", "kix.img1"), "../imgs/kix.img1.png");
        assert_eq!(
            image_placeholder(Path::new("Tab 1.md"), "imgs", "kix.img1"),
            "imgs/kix.img1.png"
        );
        assert_eq!(
            placeholder_object_id(nested, "imgs", "../imgs/kix.img1.png"),
            Some("kix.img1".to_string())
        );
        assert_eq!(placeholder_object_id(nested, "imgs", "photo.png"), None);
    }
}
