//! Reserved `gdoc:` comments.
//!
//! Nodes without a markdown form are tagged with an HTML comment carrying a
//! small JSON payload: `<!-- gdoc:{"kind":"person","token":"n3"} -->`. The
//! token links the node to its side-channel record and is only present when
//! one exists. Wrapped kinds enclose a readable fallback and end with
//! `<!-- /gdoc -->`.

use crate::error::ParseError;
use crate::ir::events::Marker;
use crate::ir::nodes::{
    AutoText, DateMention, InlineImage, InlineNode, PersonMention, PersonProperties, RichLink,
    RichLinkProperties, StructuralNode, Styled, TableOfContents,
};
use serde::{Deserialize, Serialize};

const OPEN_PREFIX: &str = "<!--";
const CLOSE_SUFFIX: &str = "-->";
const NAMESPACE: &str = "gdoc:";

pub const CLOSE_MARKER: &str = "<!-- /gdoc -->";

/// How a marker kind sits in the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerRole {
    /// Opens a fallback that runs to the closing marker.
    Wrapped,
    /// Stands alone inside a paragraph.
    Inline,
    /// Stands alone on its own line.
    Block,
    /// Tags a heading with its named style.
    Heading,
}

pub fn role(kind: &str) -> Option<MarkerRole> {
    match kind {
        "person" | "date" | "richLink" | "autoText" | "image" => Some(MarkerRole::Wrapped),
        "pageBreak" | "columnBreak" | "rule" | "equation" => Some(MarkerRole::Inline),
        "sectionBreak" | "tableOfContents" | "blockEquation" => Some(MarkerRole::Block),
        "title" | "subtitle" => Some(MarkerRole::Heading),
        _ => None,
    }
}

#[derive(Serialize, Deserialize)]
struct Payload {
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

pub fn render(kind: &str, token: Option<&str>) -> String {
    let payload = Payload {
        kind: kind.to_string(),
        token: token.map(str::to_string),
    };
    // A two-string struct always serializes.
    let json = serde_json::to_string(&payload).unwrap_or_default();
    format!("{OPEN_PREFIX} {NAMESPACE}{json} {CLOSE_SUFFIX}")
}

/// A decoded HTML comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Comment {
    Open(Marker),
    Close,
    /// Any comment outside the reserved namespace.
    Foreign,
}

/// Decodes one HTML comment. Reserved comments with bad JSON are errors;
/// everything else that is not reserved is [`Comment::Foreign`].
pub fn parse_comment(html: &str, line: usize) -> Result<Comment, ParseError> {
    let trimmed = html.trim();
    let Some(inner) = trimmed
        .strip_prefix(OPEN_PREFIX)
        .and_then(|rest| rest.strip_suffix(CLOSE_SUFFIX))
    else {
        return Ok(Comment::Foreign);
    };
    let inner = inner.trim();
    if inner == "/gdoc" {
        return Ok(Comment::Close);
    }
    let Some(json) = inner.strip_prefix(NAMESPACE) else {
        return Ok(Comment::Foreign);
    };
    let payload: Payload = serde_json::from_str(json)
        .map_err(|err| ParseError::new(format!("malformed marker comment: {err}"), line))?;
    Ok(Comment::Open(Marker {
        kind: payload.kind,
        token: payload.token,
        line,
    }))
}

/// Whether a raw HTML chunk opens with a reserved comment.
pub fn starts_with_marker(html: &str) -> bool {
    let trimmed = html.trim_start();
    trimmed.starts_with("<!-- gdoc:") || trimmed.starts_with(CLOSE_MARKER)
}

/// What the reader rebuilds from an inline node's markup alone. When this
/// equals the node, no side-channel record is needed.
pub fn degraded_inline(node: &InlineNode) -> InlineNode {
    match node {
        InlineNode::InlineImage(image) => InlineNode::InlineImage(InlineImage {
            object_id: image.object_id.clone(),
            description: image.description.clone().filter(|text| !text.is_empty()),
            content_uri: if image.object_id.is_empty() {
                image.content_uri.clone().filter(|uri| !uri.is_empty())
            } else {
                None
            },
            style: None,
        }),
        InlineNode::PersonMention(person) => InlineNode::PersonMention(PersonMention {
            properties: PersonProperties {
                person_id: None,
                name: person
                    .properties
                    .name
                    .clone()
                    .filter(|name| !name.is_empty() && name != &person.properties.email),
                email: person.properties.email.clone(),
            },
            style: None,
        }),
        InlineNode::RichLink(link) => InlineNode::RichLink(RichLink {
            properties: RichLinkProperties {
                rich_link_id: None,
                title: link.properties.title.clone(),
                uri: link.properties.uri.clone(),
                mime_type: None,
            },
            style: None,
        }),
        InlineNode::DateMention(date) => InlineNode::DateMention(DateMention {
            display_text: date.display_text.clone(),
            ..DateMention::default()
        }),
        InlineNode::AutoText(_) => InlineNode::AutoText(AutoText::default()),
        InlineNode::PageBreak(_) => InlineNode::PageBreak(Styled::default()),
        InlineNode::ColumnBreak(_) => InlineNode::ColumnBreak(Styled::default()),
        InlineNode::InlineEquation(_) => InlineNode::InlineEquation(Styled::default()),
        InlineNode::Rule => InlineNode::Rule,
        InlineNode::TextRun(_) | InlineNode::FootnoteRef(_) | InlineNode::Opaque(_) => {
            node.clone()
        }
    }
}

/// Block counterpart of [`degraded_inline`].
pub fn degraded_block(node: &StructuralNode) -> StructuralNode {
    match node {
        StructuralNode::SectionBreak(_) => StructuralNode::SectionBreak(Default::default()),
        StructuralNode::TableOfContents(_) => {
            StructuralNode::TableOfContents(TableOfContents::default())
        }
        StructuralNode::BlockEquation(_) => StructuralNode::BlockEquation(Default::default()),
        StructuralNode::Paragraph(_) | StructuralNode::Table(_) | StructuralNode::Opaque(_) => {
            node.clone()
        }
    }
}
