//! Markdown interoperability for tabbed remote documents
//!
//!     This crate converts a remote, tabbed rich-text document into one markdown file per tab
//!     segment and back, and computes the ordered, position-addressed edit operations that turn
//!     the remote copy into the locally edited one.
//!
//!     This is a pure lib: it never performs network or file-system I/O. The remote snapshot comes
//!     in as JSON, files go out and come back in as values, and edit operations are plain data for
//!     a caller to submit as one batch.
//!
//! Architecture
//!
//!     Everything goes through the document tree (./ir/nodes.rs). Format specific code only deals
//!     with its own AST; the heavy lifting is shared:
//!
//!     .
//!     ├── error.rs                # DocError, ParseError, warnings
//!     ├── snapshot.rs             # remote JSON → document tree
//!     ├── metadata.rs             # side-channel records (embedded or companion)
//!     ├── document.rs             # whole-document export / import / sync planning
//!     ├── ir                      # document tree, styles, traversal, equality, events
//!     ├── common
//!     │   ├── flat_to_nested.rs   # event stream → nodes
//!     │   ├── linearize.rs        # segment → index-addressed token stream
//!     │   └── paths.rs            # tab hierarchy ↔ file paths
//!     ├── formats
//!     │   └── markdown            # parser, serializer, marker comments
//!     └── diff                    # Myers edit script → edit operations
//!
//! Core Algorithms
//!
//!     Import reconstructs a nested tree from the flat markdown AST: the reader emits events and
//!     flat_to_nested folds them back with a stack of open containers. Sync linearizes both the
//!     remote and the imported segments into word and object tokens, runs Myers' algorithm over
//!     the tokens and turns the script into deletes (back to front), inserts (front to back) and
//!     style updates, all addressed in UTF-16 code units.
//!
//! Lossy Conversions
//!
//!     Markdown cannot carry everything a remote document holds. Nodes without a markdown form are
//!     written as a readable fallback tagged with a reserved comment, and their full data goes to a
//!     side-channel record (see ./metadata.rs). With the record disabled they degrade to the
//!     fallback and each one is reported as a warning.

pub mod common;
pub mod diff;
pub mod document;
pub mod error;
pub mod formats;
pub mod ir;
pub mod metadata;
pub mod snapshot;

pub use diff::{diff, EditOperation};
pub use document::{
    export_document, import_document, plan_sync, ConvertOptions, ExportedDocument, ExportedFile,
    ImportedDocument, SyncPlan,
};
pub use error::{DocError, ParseError, SegmentFailure, Warning};
pub use ir::nodes::DocumentTree;
pub use metadata::MetadataMode;
