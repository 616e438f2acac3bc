//! Property tests for the export/import/diff laws.

mod laws;
