//! Differ tests
//!
//! Edit operations are checked by value and by replaying them over the
//! base text, which must reproduce the target text.

mod edits;
pub mod replay;
