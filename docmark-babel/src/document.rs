//! Whole-document export, import and sync planning.
//!
//! These functions tie the layers together without touching the file
//! system: export returns the files to write as values, import takes the
//! files that were read. Paths are relative to the document directory
//! ([`crate::common::paths::document_dir`]).

use crate::common::paths::TabLayout;
use crate::diff::{self, EditOperation};
use crate::error::{DocError, ParseError, SegmentFailure, Warning};
use crate::formats::markdown::{
    parse_segment, serialize_segment, MarkdownOptions, ParseContext, SerializeContext,
};
use crate::ir::nodes::{
    DocumentTree, Paragraph, Segment, SegmentKey, SegmentKind, StructuralNode, Tab,
};
use crate::ir::traverse::footnote_order;
use crate::metadata::{self, MetadataMode, MetadataRecord};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Settings for export and import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    pub metadata: MetadataMode,
    /// Appended to a file's stem to name its companion record.
    pub companion_suffix: String,
    pub images_dir: String,
    /// Extension of segment files, without the dot.
    pub extension: String,
    pub cell_line_break: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            metadata: MetadataMode::Embedded,
            companion_suffix: ".meta.json".to_string(),
            images_dir: "imgs".to_string(),
            extension: "md".to_string(),
            cell_line_break: "<br>".to_string(),
        }
    }
}

impl ConvertOptions {
    pub fn markdown(&self) -> MarkdownOptions {
        MarkdownOptions {
            metadata: self.metadata,
            images_dir: self.images_dir.clone(),
            cell_line_break: self.cell_line_break.clone(),
        }
    }

    fn companion_path(&self, path: &Path) -> PathBuf {
        metadata::companion_path(path, &self.extension, &self.companion_suffix)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub contents: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportedDocument {
    /// Segment files and companion records, in layout order.
    pub files: Vec<ExportedFile>,
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportedDocument {
    pub tree: DocumentTree,
    pub warnings: Vec<Warning>,
    /// Segments that kept their base content because they failed to parse.
    pub failures: Vec<SegmentFailure>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncPlan {
    /// Ready to be submitted as one batch; empty when nothing changed.
    pub operations: Vec<EditOperation>,
    pub warnings: Vec<Warning>,
    pub failures: Vec<SegmentFailure>,
}

/// Renders every segment of `doc` to the files of its layout.
pub fn export_document(
    doc: &DocumentTree,
    options: &ConvertOptions,
) -> Result<ExportedDocument, DocError> {
    let layout = TabLayout::build(doc, &options.extension, &options.images_dir)?;
    let markdown = options.markdown();
    let mut exported = ExportedDocument::default();

    for entry in layout.entries() {
        let Some(tab) = doc.find_tab(&entry.key.tab_id) else {
            continue;
        };
        let Some(segment) = segment_of(tab, entry.kind) else {
            continue;
        };
        let ctx = SerializeContext {
            file_path: &entry.path,
            named_styles: &doc.named_styles,
            options: &markdown,
        };
        let rendered = serialize_segment(tab, segment, &ctx);
        exported.warnings.extend(rendered.warnings);

        let contents = match options.metadata {
            MetadataMode::Embedded => metadata::embed(&rendered.text, &rendered.metadata)?,
            MetadataMode::Companion => {
                if !rendered.metadata.is_empty() {
                    exported.files.push(ExportedFile {
                        path: options.companion_path(&entry.path),
                        contents: rendered.metadata.to_json()?,
                    });
                }
                rendered.text
            }
            MetadataMode::Disabled => rendered.text,
        };
        exported.files.push(ExportedFile {
            path: entry.path.clone(),
            contents,
        });
    }

    debug!(
        files = exported.files.len(),
        warnings = exported.warnings.len(),
        "exported document"
    );
    Ok(exported)
}

/// Rebuilds a local tree from edited files, using `base` for the layout,
/// footnote ids and everything markdown does not carry.
///
/// A segment whose file is missing or fails to parse keeps its base
/// content, so the differ leaves it alone.
pub fn import_document(
    base: &DocumentTree,
    files: &BTreeMap<PathBuf, String>,
    options: &ConvertOptions,
) -> Result<ImportedDocument, DocError> {
    let layout = TabLayout::build(base, &options.extension, &options.images_dir)?;
    let mut importer = Importer {
        layout: &layout,
        files,
        options,
        markdown: options.markdown(),
        warnings: Vec::new(),
        failures: Vec::new(),
        consumed: BTreeSet::new(),
    };
    let tabs: Vec<Tab> = base
        .tabs()
        .iter()
        .map(|tab| importer.tab(tab))
        .collect();

    for path in files.keys() {
        if !importer.consumed.contains(path) && !path.starts_with(&options.images_dir) {
            warn!(path = %path.display(), "file does not belong to any tab");
            importer
                .warnings
                .push(Warning::UnmappedFile { path: path.clone() });
        }
    }

    let tree = DocumentTree::new(base.document_id.clone(), base.title.clone(), tabs)?
        .with_named_styles(base.named_styles.clone());
    Ok(ImportedDocument {
        tree,
        warnings: importer.warnings,
        failures: importer.failures,
    })
}

/// Imports `files` and diffs the result against `base`.
pub fn plan_sync(
    base: &DocumentTree,
    files: &BTreeMap<PathBuf, String>,
    options: &ConvertOptions,
) -> Result<SyncPlan, DocError> {
    let imported = import_document(base, files, options)?;
    let operations = diff::diff(base, &imported.tree)?;
    if operations.is_empty() {
        debug!("no changes to submit");
    } else {
        debug!(operations = operations.len(), "planned sync");
    }
    Ok(SyncPlan {
        operations,
        warnings: imported.warnings,
        failures: imported.failures,
    })
}

fn segment_of(tab: &Tab, kind: SegmentKind) -> Option<&Segment> {
    match kind {
        SegmentKind::Body => Some(&tab.body),
        SegmentKind::Header => tab.header.as_ref(),
        SegmentKind::Footer => tab.footer.as_ref(),
        SegmentKind::Footnote => None,
    }
}

struct Importer<'a> {
    layout: &'a TabLayout,
    files: &'a BTreeMap<PathBuf, String>,
    options: &'a ConvertOptions,
    markdown: MarkdownOptions,
    warnings: Vec<Warning>,
    failures: Vec<SegmentFailure>,
    consumed: BTreeSet<PathBuf>,
}

/// Parsed replacement for one segment.
struct Imported {
    content: Vec<StructuralNode>,
    footnotes: Vec<(String, Vec<StructuralNode>)>,
}

impl Importer<'_> {
    fn tab(&mut self, base: &Tab) -> Tab {
        let mut tab = Tab {
            id: base.id.clone(),
            title: base.title.clone(),
            body: base.body.clone(),
            header: base.header.clone(),
            footer: base.footer.clone(),
            footnotes: base.footnotes.clone(),
            children: Vec::new(),
        };

        if let Some(imported) = self.segment(base, &base.body) {
            tab.body.content = imported.content;
            tab.footnotes = imported
                .footnotes
                .into_iter()
                .map(|(id, content)| {
                    let segment =
                        Segment::new(id.clone(), SegmentKind::Footnote, ends_with_paragraph(content));
                    (id, segment)
                })
                .collect();
        }
        if let Some(header) = &base.header {
            if let Some(imported) = self.segment(base, header) {
                tab.header = Some(Segment::new(header.id.clone(), header.kind, imported.content));
            }
        }
        if let Some(footer) = &base.footer {
            if let Some(imported) = self.segment(base, footer) {
                tab.footer = Some(Segment::new(footer.id.clone(), footer.kind, imported.content));
            }
        }

        tab.children = base.children.iter().map(|child| self.tab(child)).collect();
        tab
    }

    /// `None` keeps the base content.
    fn segment(&mut self, tab: &Tab, segment: &Segment) -> Option<Imported> {
        let key = SegmentKey::new(&tab.id, segment.id.clone());
        let path = self.layout.path_of(&key)?.to_path_buf();
        let Some(text) = self.files.get(&path) else {
            warn!(path = %path.display(), "segment file is missing");
            self.warnings.push(Warning::MissingFile { path });
            return None;
        };
        self.consumed.insert(path.clone());

        match self.parse(tab, &path, text) {
            Ok(imported) => {
                debug!(segment = %key, blocks = imported.content.len(), "imported segment");
                Some(imported)
            }
            Err(error) => {
                warn!(segment = %key, path = %path.display(), %error, "segment failed to parse");
                self.failures.push(SegmentFailure {
                    segment: key,
                    path,
                    error,
                });
                None
            }
        }
    }

    fn parse(&mut self, tab: &Tab, path: &Path, text: &str) -> Result<Imported, ParseError> {
        let companion = match self.options.metadata {
            MetadataMode::Companion => self.companion(path)?,
            _ => None,
        };
        let order = footnote_order(tab);
        let ctx = ParseContext {
            file_path: path,
            options: &self.markdown,
            companion: companion.as_ref(),
            footnote_order: &order,
        };
        let parsed = parse_segment(text, &ctx)?;
        Ok(Imported {
            content: ends_with_paragraph(parsed.content),
            footnotes: parsed.footnotes,
        })
    }

    fn companion(&mut self, path: &Path) -> Result<Option<MetadataRecord>, ParseError> {
        let companion_path = self.options.companion_path(path);
        let Some(text) = self.files.get(&companion_path) else {
            return Ok(None);
        };
        self.consumed.insert(companion_path);
        serde_json::from_str(text)
            .map(Some)
            .map_err(|err| ParseError::new(format!("malformed companion record: {err}"), err.line()))
    }
}

/// Segments always end with a paragraph on the remote side.
fn ends_with_paragraph(mut content: Vec<StructuralNode>) -> Vec<StructuralNode> {
    if !matches!(content.last(), Some(StructuralNode::Paragraph(_))) {
        content.push(StructuralNode::Paragraph(Paragraph::default()));
    }
    content
}
