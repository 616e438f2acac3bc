//! Remote snapshot tests
//!
//! A tabbed document with a child tab, a header, a footnote, an image and
//! a pending suggestion is mapped, exported and synced against itself and
//! against local edits.

mod tabbed;
