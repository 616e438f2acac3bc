//! Contains logic shared by the format, diff and sync layers: the event
//! fold, the linear index-space view of a segment and the file layout.

pub mod flat_to_nested;
pub mod linearize;
pub mod paths;
