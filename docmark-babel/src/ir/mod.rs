//! Document tree model.
//!
//! The typed, recursive in-memory form of a remote document: tabs own
//! segments, segments own structural nodes, paragraphs own inline nodes.
//! Everything else in the crate either produces one of these trees or
//! consumes two of them.

pub mod equality;
pub mod events;
pub mod nodes;
pub mod style;
pub mod traverse;
