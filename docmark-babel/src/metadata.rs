//! Side-channel metadata records.
//!
//! Anything markdown cannot express is kept in a [`MetadataRecord`]: an
//! ordered list of node records keyed by position tokens (`n1`, `n2`, ...)
//! allocated in serialization order, plus the map from footnote ordinals
//! back to remote footnote ids. The record travels either embedded at the
//! end of the markdown file, after a reserved marker comment and inside a
//! fenced `json` block, or in a companion file next to it.

use crate::error::{DocError, ParseError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Comment line that introduces an embedded record.
pub const METADATA_MARKER: &str = "<!-- gdoc-metadata -->";

/// Where the side-channel record is stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataMode {
    /// Fenced `json` block at the end of the markdown file.
    #[default]
    Embedded,
    /// Separate file next to the markdown file.
    Companion,
    /// No record; unrepresentable features degrade with a warning.
    Disabled,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    /// Footnote ordinal (as written in `[^n]`) to remote footnote id.
    #[serde(default)]
    pub footnote_id_map: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub position_token: String,
    pub kind: String,
    pub fields: serde_json::Value,
}

impl MetadataRecord {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.footnote_id_map.is_empty()
    }

    /// Appends a node record and returns its freshly allocated token.
    pub fn push(&mut self, kind: &str, fields: serde_json::Value) -> String {
        let token = format!("n{}", self.nodes.len() + 1);
        self.nodes.push(NodeRecord {
            position_token: token.clone(),
            kind: kind.to_string(),
            fields,
        });
        token
    }

    pub fn find(&self, token: &str) -> Option<&NodeRecord> {
        self.nodes.iter().find(|node| node.position_token == token)
    }

    pub fn to_json(&self) -> Result<String, DocError> {
        serde_json::to_string_pretty(self).map_err(DocError::Metadata)
    }

    pub fn from_json(text: &str) -> Result<Self, DocError> {
        serde_json::from_str(text).map_err(DocError::Metadata)
    }
}

/// Appends `record` to `markdown` as an embedded block. Empty records are
/// not written.
pub fn embed(markdown: &str, record: &MetadataRecord) -> Result<String, DocError> {
    if record.is_empty() {
        return Ok(markdown.to_string());
    }
    let json = record.to_json()?;
    let mut out = String::with_capacity(markdown.len() + json.len() + 48);
    out.push_str(markdown);
    if !markdown.is_empty() {
        if !markdown.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
    }
    out.push_str(METADATA_MARKER);
    out.push_str("\n```json\n");
    out.push_str(&json);
    out.push_str("\n```\n");
    Ok(out)
}

/// Splits a file into its markdown part and its embedded record, if any.
pub fn extract(text: &str) -> Result<(&str, Option<MetadataRecord>), ParseError> {
    let Some(marker_at) = find_marker(text) else {
        return Ok((text, None));
    };
    let marker_line = text[..marker_at].matches('\n').count() + 1;
    let markdown = &text[..marker_at];

    let rest = text[marker_at + METADATA_MARKER.len()..].trim_start();
    let body = rest
        .strip_prefix("```json")
        .ok_or_else(|| ParseError::new("metadata marker is not followed by a json block", marker_line))?;
    let close = body
        .rfind("```")
        .ok_or_else(|| ParseError::new("unclosed metadata block", marker_line))?;

    let record: MetadataRecord = serde_json::from_str(&body[..close]).map_err(|err| {
        ParseError::new(
            format!("malformed metadata record: {err}"),
            marker_line + err.line().max(1),
        )
    })?;
    Ok((markdown, Some(record)))
}

/// Byte offset of a metadata marker that starts a line.
fn find_marker(text: &str) -> Option<usize> {
    let mut search_end = text.len();
    while let Some(at) = text[..search_end].rfind(METADATA_MARKER) {
        if at == 0 || text[..at].ends_with('\n') {
            return Some(at);
        }
        search_end = at;
    }
    None
}

/// Path of the companion record for a markdown file:
/// `Tab.md` becomes `Tab<suffix>`.
pub fn companion_path(path: &Path, extension: &str, suffix: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dotted = format!(".{extension}");
    let stem = name.strip_suffix(dotted.as_str()).unwrap_or(&name);
    path.with_file_name(format!("{stem}{suffix}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tokens_follow_push_order() {
        let mut record = MetadataRecord::default();
        assert_eq!(record.push("person", json!({})), "n1");
        assert_eq!(record.push("date", json!({})), "n2");
        assert_eq!(record.find("n2").map(|node| node.kind.as_str()), Some("date"));
    }

    #[test]
    fn test_embedded_record_is_split_back_out() {
        let mut record = MetadataRecord::default();
        record.push("richLink", json!({"mimeType": "text/html"}));
        record
            .footnote_id_map
            .insert("1".to_string(), "kix.fn1".to_string());

        let file = embed("Hello\n", &record).unwrap();
        let (markdown, extracted) = extract(&file).unwrap();
        assert_eq!(markdown, "Hello\n\n");
        assert_eq!(extracted, Some(record));
    }

    #[test]
    fn test_empty_record_is_not_embedded() {
        let file = embed("Hello\n", &MetadataRecord::default()).unwrap();
        assert_eq!(file, "Hello\n");
        assert_eq!(extract(&file).unwrap(), ("Hello\n", None));
    }

    #[test]
    fn test_malformed_record_reports_a_line() {
        let file = "Hello\n\n<!-- gdoc-metadata -->\n```json\n{ nope }\n```\n";
        let err = extract(file).unwrap_err();
        assert!(err.reason.contains("malformed metadata record"));
        assert!(err.line >= 3);
    }

    #[test]
    fn test_companion_path_replaces_the_extension() {
        assert_eq!(
            companion_path(Path::new("Doc/Notes.md"), "md", ".meta.json"),
            PathBuf::from("Doc/Notes.meta.json")
        );
        assert_eq!(
            companion_path(Path::new("Notes.header.md"), "md", ".meta.json"),
            PathBuf::from("Notes.header.meta.json")
        );
    }
}
