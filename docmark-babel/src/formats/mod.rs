//! Format implementations
//!
//! This module contains the text formats a document segment can be
//! exported to and imported from. Markdown is the only one.

pub mod markdown;

pub use markdown::MarkdownOptions;
