//! Error and warning types shared by every stage of the pipeline.

use crate::ir::nodes::SegmentKey;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Malformed markup or metadata found while reading one segment.
///
/// Fatal for that segment only: whole-document import keeps going and
/// reports the failure next to its result.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {reason}")]
pub struct ParseError {
    pub reason: String,
    /// 1-based line in the markdown source.
    pub line: usize,
}

impl ParseError {
    pub fn new(reason: impl Into<String>, line: usize) -> Self {
        ParseError {
            reason: reason.into(),
            line,
        }
    }
}

#[derive(Error, Debug)]
pub enum DocError {
    #[error("structure violation at {path}: {reason}")]
    StructureViolation { path: String, reason: String },

    #[error("parse error at {0}")]
    Parse(#[from] ParseError),

    #[error("{path} is claimed by more than one tab: {tab_ids:?}")]
    AmbiguousPath { path: String, tab_ids: Vec<String> },

    #[error("index {index} in {segment} falls inside a surrogate pair")]
    SurrogateSplit { segment: SegmentKey, index: usize },

    #[error("invalid document snapshot: {0}")]
    Snapshot(#[source] serde_json::Error),

    #[error("invalid metadata record: {0}")]
    Metadata(#[source] serde_json::Error),
}

/// A degraded-but-complete conversion. Carried next to successful results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A node that has neither a markup form nor a side-channel record.
    UnrepresentableFeature { feature: String, position: String },
    /// A file expected by the layout was not supplied; base content is kept.
    MissingFile { path: PathBuf },
    /// A supplied file that no tab segment maps to.
    UnmappedFile { path: PathBuf },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnrepresentableFeature { feature, position } => {
                write!(f, "{feature} at {position} was reduced to its plain-text fallback")
            }
            Warning::MissingFile { path } => {
                write!(f, "{} is missing; keeping remote content", path.display())
            }
            Warning::UnmappedFile { path } => {
                write!(f, "{} does not belong to any tab", path.display())
            }
        }
    }
}

/// A segment that failed to parse during whole-document import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentFailure {
    pub segment: SegmentKey,
    pub path: PathBuf,
    pub error: ParseError,
}
