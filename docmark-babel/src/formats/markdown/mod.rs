//! Markdown format implementation
//!
//! This module implements bidirectional conversion between document segments and
//! GitHub-flavoured Markdown.
//!
//! # Library Choice
//!
//! We use the `comrak` crate for Markdown parsing. Its AST carries source positions, which
//! parse errors report, and it supports the GFM extensions we rely on (tables,
//! strikethrough, footnotes). Writing goes through our own renderer instead of comrak's
//! formatter: the exported text must be byte-for-byte deterministic and every delimiter
//! choice has to survive the trip back through the parser.
//!
//! # Element Mapping Table
//!
//! | Document Element   | Markdown Equivalent              | Export Notes                          | Import Notes                          |
//! |--------------------|----------------------------------|---------------------------------------|---------------------------------------|
//! | Paragraph          | Paragraph                        | Empty paragraph → `<br>`              | Lone `<br>` → empty paragraph         |
//! | Heading 1-6        | `#` .. `######`                  | Direct mapping                        | Direct mapping                        |
//! | Title / Subtitle   | `#` / `##` + marker comment      | Marker right after the hashes         | Marker sets the named style           |
//! | List paragraph     | `- ` / `1. ` items               | 4 spaces per nesting level            | Depth from open lists                 |
//! | Adjacent lists     | `<!-- end list -->` between them | Keeps list ids apart                  | Comment ignored, lists stay separate  |
//! | Monospace lines    | Fenced code block                | Consecutive lines share one fence     | One paragraph per line                |
//! | Rule paragraph     | `---`                            | Only when the rule stands alone       | Direct mapping                        |
//! | Table              | GFM pipe table                   | Cell paragraphs joined by `<br>`      | `<br>` splits cell paragraphs         |
//! | Footnote           | `[^n]` + `[^n]: ...`             | Numbered in first-reference order     | Ids from the record or base order     |
//! | Section break, TOC | Block marker comment             | Record kept when it carries data      | Rebuilt from the record               |
//! | InlineContent:     |                                  |                                       |                                       |
//! |   Bold / Italic    | `**` / `*`                       | Relative to the named style           | Direct                                |
//! |   Strikethrough    | `~~`                             | Direct                                | Direct                                |
//! |   Underline        | `<u>...</u>`                     | Direct                                | Direct                                |
//! |   Link             | `[text](url)`                    | `<url>` when it needs it              | Direct                                |
//! |   Code             | `` `code` ``                     | Monospace font family                 | Monospace font family                 |
//! |   Image            | `![alt](imgs/<id>.png)`          | Placeholder relative to the file      | Placeholder → object id               |
//! |   Person, date,    | Wrapped marker comments          | Readable fallback inside the markers  | Record, else rebuilt from fallback    |
//! |   rich link, auto  |                                  |                                       |                                       |
//! |   Page/column break| Inline marker comment            | Direct                                | Direct                                |
//!
//! # Lossy Conversions
//!
//! The following conversions lose information on round-trip:
//! - Colours, fonts and sizes → dropped (markdown has no syntax for them)
//! - Emphasis on whitespace at the edge of a span → moved outside the span
//! - List levels deeper than the previous item + 1 → clamped
//! - Nested tables → flattened to text, with a warning
//! - Line breaks inside table cells → paragraph splits
//! - With metadata disabled, ids and properties of mentions, rich links and section
//!   breaks → dropped, with a warning per node
//!
//! # Architecture Notes
//!
//! Import goes through the flat event stream (`crate::ir::events`), folded back into
//! nodes by `crate::common::flat_to_nested`, so this module only deals with comrak's AST.
//! Export renders straight from the node tree.

pub mod markers;
pub mod parser;
pub mod serializer;

use crate::metadata::MetadataMode;

pub use parser::{parse_segment, ParseContext, ParsedSegment};
pub use serializer::{serialize_segment, SerializeContext, SerializedSegment};

/// Knobs shared by the reader and the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownOptions {
    pub metadata: MetadataMode,
    /// Image placeholder directory, relative to the document directory.
    pub images_dir: String,
    /// Joins the paragraphs of a table cell.
    pub cell_line_break: String,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        MarkdownOptions {
            metadata: MetadataMode::Embedded,
            images_dir: "imgs".to_string(),
            cell_line_break: "<br>".to_string(),
        }
    }
}
