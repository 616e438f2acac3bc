//! Defines the flat event stream produced by the markdown reader.
//!
//! The reader walks the markdown AST and emits these events in document
//! order; [`crate::common::flat_to_nested`] folds them back into structural
//! and inline nodes.

use crate::ir::nodes::InlineImage;

/// An inline span opened and closed around text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    Bold,
    Italic,
    Strikethrough,
    Underline,
    Link(String),
}

/// A reserved `gdoc:` comment, already decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub kind: String,
    pub token: Option<String>,
    /// Source line, for error reporting.
    pub line: usize,
}

/// Represents a single event in the document stream.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    StartParagraph,
    EndParagraph,
    /// A paragraph with no content (`<br>` on its own line).
    EmptyParagraph,
    StartHeading(u8),
    EndHeading,
    StartList {
        ordered: bool,
    },
    EndList,
    StartListItem,
    EndListItem,
    StartTable,
    EndTable,
    StartTableRow,
    EndTableRow,
    StartTableCell,
    EndTableCell,
    StartFootnoteDefinition(String),
    EndFootnoteDefinition,
    /// Literal contents of a fenced or indented code block.
    CodeBlock(String),
    ThematicBreak,
    StartSpan(Span),
    EndSpan(Span),
    Text(String),
    Code(String),
    /// `<br>`: a line break in a paragraph, a paragraph split in a table cell.
    LineBreak,
    Image(InlineImage),
    /// Footnote reference by its markdown label.
    FootnoteRef(String),
    Marker(Marker),
    CloseMarker,
}
