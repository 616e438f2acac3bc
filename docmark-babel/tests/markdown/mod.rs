//! Markdown format tests
//!
//! Tests for bidirectional segment ↔ Markdown conversion through the
//! whole-document entry points.

mod export;
mod import;
mod round_trip;
