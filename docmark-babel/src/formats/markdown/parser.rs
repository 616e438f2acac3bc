//! Markdown reader.
//!
//! Pipeline: markdown text → metadata split → comrak AST → events → nodes.
//! The event fold lives in [`crate::common::flat_to_nested`]; this module
//! only knows about comrak.

use super::markers::{self, Comment, MarkerRole};
use super::MarkdownOptions;
use crate::common::flat_to_nested::{events_to_blocks, FoldContext};
use crate::common::paths::placeholder_object_id;
use crate::error::ParseError;
use crate::ir::events::{Event, Span};
use crate::ir::nodes::{InlineImage, StructuralNode};
use crate::metadata::{self, MetadataRecord};
use comrak::nodes::{AstNode, ListType, NodeValue};
use comrak::{parse_document, Arena, ComrakOptions};
use std::path::Path;
use tracing::debug;

pub struct ParseContext<'a> {
    /// Source file, relative to the document directory.
    pub file_path: &'a Path,
    pub options: &'a MarkdownOptions,
    /// Record read from a companion file, used when the text embeds none.
    pub companion: Option<&'a MetadataRecord>,
    /// Footnote ids of the base tab in first-reference order.
    pub footnote_order: &'a [String],
}

/// Content read back from one markdown file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSegment {
    pub content: Vec<StructuralNode>,
    /// Footnote definitions as `(footnote id, content)`.
    pub footnotes: Vec<(String, Vec<StructuralNode>)>,
}

/// Parses one segment file.
pub fn parse_segment(text: &str, ctx: &ParseContext<'_>) -> Result<ParsedSegment, ParseError> {
    let (markdown, embedded) = metadata::extract(text)?;
    check_fences(markdown)?;

    let arena = Arena::new();
    let options = comrak_options();
    let root = parse_document(&arena, markdown, &options);

    let mut reader = Reader {
        ctx,
        line_offset: 0,
        events: Vec::new(),
    };
    reader.block(root)?;
    debug!(
        file = %ctx.file_path.display(),
        events = reader.events.len(),
        "read markdown events"
    );

    let record = embedded.as_ref().or(ctx.companion);
    let folded = events_to_blocks(
        &reader.events,
        &FoldContext {
            record,
            footnote_order: ctx.footnote_order,
        },
    )?;
    Ok(ParsedSegment {
        content: folded.blocks,
        footnotes: folded.footnotes,
    })
}

fn comrak_options() -> ComrakOptions<'static> {
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.footnotes = true;
    options
}

/// Rejects a code fence that is never closed. comrak would silently run
/// it to the end of the file, swallowing everything after it.
fn check_fences(source: &str) -> Result<(), ParseError> {
    let mut open: Option<(char, usize, usize)> = None;
    for (index, line) in source.lines().enumerate() {
        let mut trimmed = line.trim_start();
        if trimmed.starts_with("[^") {
            if let Some(end) = trimmed.find("]: ") {
                trimmed = trimmed[end + 3..].trim_start();
            }
        }
        let fence = match trimmed.chars().next() {
            Some(c @ ('`' | '~')) => c,
            _ => continue,
        };
        let run = trimmed.chars().take_while(|c| *c == fence).count();
        if run < 3 {
            continue;
        }
        let rest = &trimmed[run..];
        match open {
            None => {
                if fence == '`' && rest.contains('`') {
                    continue;
                }
                open = Some((fence, run, index + 1));
            }
            Some((c, length, _)) if c == fence && run >= length && rest.trim().is_empty() => {
                open = None;
            }
            Some(_) => {}
        }
    }
    match open {
        Some((_, _, line)) => Err(ParseError::new("unclosed code fence", line)),
        None => Ok(()),
    }
}

struct Reader<'c> {
    ctx: &'c ParseContext<'c>,
    /// Added to comrak line numbers when reading a re-parsed fragment.
    line_offset: usize,
    events: Vec<Event>,
}

impl Reader<'_> {
    fn line<'a>(&self, node: &'a AstNode<'a>) -> usize {
        node.data.borrow().sourcepos.start.line + self.line_offset
    }

    fn children<'a>(&mut self, node: &'a AstNode<'a>) -> Result<(), ParseError> {
        for child in node.children() {
            self.block(child)?;
        }
        Ok(())
    }

    fn inlines<'a>(&mut self, node: &'a AstNode<'a>) -> Result<(), ParseError> {
        for child in node.children() {
            self.inline(child)?;
        }
        Ok(())
    }

    fn block<'a>(&mut self, node: &'a AstNode<'a>) -> Result<(), ParseError> {
        let value = node.data.borrow().value.clone();
        match value {
            NodeValue::Paragraph => {
                self.events.push(Event::StartParagraph);
                self.inlines(node)?;
                self.events.push(Event::EndParagraph);
            }
            NodeValue::Heading(heading) => {
                self.events.push(Event::StartHeading(heading.level));
                self.inlines(node)?;
                self.events.push(Event::EndHeading);
            }
            NodeValue::List(list) => {
                let ordered = matches!(list.list_type, ListType::Ordered);
                self.events.push(Event::StartList { ordered });
                self.children(node)?;
                self.events.push(Event::EndList);
            }
            NodeValue::Item(_) => {
                self.events.push(Event::StartListItem);
                self.children(node)?;
                self.events.push(Event::EndListItem);
            }
            NodeValue::CodeBlock(code) => self.events.push(Event::CodeBlock(code.literal)),
            NodeValue::HtmlBlock(html) => self.html_block(&html.literal, self.line(node))?,
            NodeValue::ThematicBreak => self.events.push(Event::ThematicBreak),
            NodeValue::Table(_) => {
                self.events.push(Event::StartTable);
                for row in node.children() {
                    self.events.push(Event::StartTableRow);
                    for cell in row.children() {
                        self.events.push(Event::StartTableCell);
                        self.inlines(cell)?;
                        self.events.push(Event::EndTableCell);
                    }
                    self.events.push(Event::EndTableRow);
                }
                self.events.push(Event::EndTable);
            }
            NodeValue::FootnoteDefinition(definition) => {
                self.events
                    .push(Event::StartFootnoteDefinition(definition.name.clone()));
                self.children(node)?;
                self.events.push(Event::EndFootnoteDefinition);
            }
            // Block quotes and anything else: keep the content, drop the wrapper.
            _ => self.children(node)?,
        }
        Ok(())
    }

    fn html_block(&mut self, literal: &str, line: usize) -> Result<(), ParseError> {
        let trimmed = literal.trim();
        if trimmed.is_empty() {
            return Ok(());
        }
        if markers::starts_with_marker(trimmed) {
            if let Some(comment) = lone_comment(trimmed) {
                match markers::parse_comment(comment, line)? {
                    Comment::Open(marker)
                        if markers::role(&marker.kind) == Some(MarkerRole::Block) =>
                    {
                        self.events.push(Event::Marker(marker));
                        return Ok(());
                    }
                    Comment::Close => return Ok(()),
                    _ => {}
                }
            }
            return self.marker_paragraph(literal, line);
        }
        if trimmed.starts_with("<!--") && trimmed.ends_with("-->") {
            return Ok(());
        }
        if is_line_break(trimmed) {
            self.events.push(Event::EmptyParagraph);
            return Ok(());
        }
        self.events.push(Event::StartParagraph);
        self.events.push(Event::Text(trimmed.to_string()));
        self.events.push(Event::EndParagraph);
        Ok(())
    }

    /// A paragraph that opens with a marker comment is an HTML block to
    /// comrak. Prefixing a letter turns it back into a paragraph.
    fn marker_paragraph(&mut self, literal: &str, line: usize) -> Result<(), ParseError> {
        let source = format!("x{}", literal.trim_end());
        let arena = Arena::new();
        let options = comrak_options();
        let root = parse_document(&arena, &source, &options);
        let Some(paragraph) = root
            .children()
            .find(|child| matches!(child.data.borrow().value, NodeValue::Paragraph))
        else {
            self.events.push(Event::StartParagraph);
            self.events.push(Event::Text(literal.trim().to_string()));
            self.events.push(Event::EndParagraph);
            return Ok(());
        };

        let saved_offset = self.line_offset;
        self.line_offset = line.saturating_sub(1);
        self.events.push(Event::StartParagraph);
        let first = self.events.len();
        let result = self.inlines(paragraph);
        self.line_offset = saved_offset;
        result?;

        if let Some(Event::Text(text)) = self.events.get_mut(first) {
            if let Some(rest) = text.strip_prefix('x') {
                *text = rest.to_string();
            }
            if text.is_empty() {
                self.events.remove(first);
            }
        }
        self.events.push(Event::EndParagraph);
        Ok(())
    }

    fn inline<'a>(&mut self, node: &'a AstNode<'a>) -> Result<(), ParseError> {
        let value = node.data.borrow().value.clone();
        match value {
            NodeValue::Text(text) => self.events.push(Event::Text(text)),
            NodeValue::SoftBreak => self.events.push(Event::Text(" ".to_string())),
            NodeValue::LineBreak => self.events.push(Event::LineBreak),
            NodeValue::Code(code) => self.events.push(Event::Code(code.literal)),
            NodeValue::HtmlInline(html) => self.html_inline(&html, self.line(node))?,
            NodeValue::Emph => self.span(node, Span::Italic)?,
            NodeValue::Strong => self.span(node, Span::Bold)?,
            NodeValue::Strikethrough => self.span(node, Span::Strikethrough)?,
            NodeValue::Link(link) => self.span(node, Span::Link(link.url))?,
            NodeValue::Image(link) => {
                let mut alt = String::new();
                collect_text(node, &mut alt);
                let object_id = placeholder_object_id(
                    self.ctx.file_path,
                    &self.ctx.options.images_dir,
                    &link.url,
                );
                let image = match object_id {
                    Some(object_id) => InlineImage {
                        object_id,
                        ..InlineImage::default()
                    },
                    None => InlineImage {
                        content_uri: (!link.url.is_empty()).then_some(link.url),
                        ..InlineImage::default()
                    },
                };
                self.events.push(Event::Image(InlineImage {
                    description: (!alt.is_empty()).then_some(alt),
                    ..image
                }));
            }
            NodeValue::FootnoteReference(reference) => {
                self.events.push(Event::FootnoteRef(reference.name))
            }
            _ => self.inlines(node)?,
        }
        Ok(())
    }

    fn span<'a>(&mut self, node: &'a AstNode<'a>, span: Span) -> Result<(), ParseError> {
        self.events.push(Event::StartSpan(span.clone()));
        self.inlines(node)?;
        self.events.push(Event::EndSpan(span));
        Ok(())
    }

    fn html_inline(&mut self, html: &str, line: usize) -> Result<(), ParseError> {
        let tag = html.trim().to_ascii_lowercase();
        if is_line_break(&tag) {
            self.events.push(Event::LineBreak);
        } else if tag == "<u>" {
            self.events.push(Event::StartSpan(Span::Underline));
        } else if tag == "</u>" {
            self.events.push(Event::EndSpan(Span::Underline));
        } else if tag.starts_with("<!--") {
            match markers::parse_comment(html, line)? {
                Comment::Open(marker) => self.events.push(Event::Marker(marker)),
                Comment::Close => self.events.push(Event::CloseMarker),
                Comment::Foreign => {}
            }
        } else {
            self.events.push(Event::Text(html.to_string()));
        }
        Ok(())
    }
}

fn is_line_break(tag: &str) -> bool {
    matches!(
        tag.to_ascii_lowercase().as_str(),
        "<br>" | "<br/>" | "<br />"
    )
}

/// The comment itself when `html` is exactly one comment.
fn lone_comment(html: &str) -> Option<&str> {
    let end = html.find("-->")? + 3;
    (end == html.len()).then_some(html)
}

fn collect_text<'a>(node: &'a AstNode<'a>, out: &mut String) {
    for child in node.children() {
        match &child.data.borrow().value {
            NodeValue::Text(text) => out.push_str(text),
            NodeValue::Code(code) => out.push_str(&code.literal),
            NodeValue::SoftBreak | NodeValue::LineBreak => out.push(' '),
            _ => collect_text(child, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::nodes::{InlineNode, Paragraph, TextRun};
    use crate::ir::style::{NamedStyleType, ParagraphStyle, TextStyle};

    fn parse(text: &str) -> Result<ParsedSegment, ParseError> {
        let options = MarkdownOptions::default();
        let ctx = ParseContext {
            file_path: Path::new("Notes.md"),
            options: &options,
            companion: None,
            footnote_order: &[],
        };
        parse_segment(text, &ctx)
    }

    fn paragraph(blocks: &[StructuralNode], index: usize) -> &Paragraph {
        match &blocks[index] {
            StructuralNode::Paragraph(paragraph) => paragraph,
            other => panic!("expected a paragraph, got {other:?}"),
        }
    }

    #[test]
    fn test_headings_and_empty_paragraphs() {
        let parsed = parse("# Title\n\n<br>\n\nBody\n").unwrap();
        assert_eq!(
            parsed.content,
            vec![
                StructuralNode::Paragraph(
                    Paragraph::text("Title").with_style(ParagraphStyle::heading(1))
                ),
                StructuralNode::Paragraph(Paragraph::default()),
                StructuralNode::Paragraph(Paragraph::text("Body")),
            ]
        );
    }

    #[test]
    fn test_title_marker_sets_the_named_style() {
        let parsed = parse("# <!-- gdoc:{\"kind\":\"title\"} -->Report\n").unwrap();
        let title = paragraph(&parsed.content, 0);
        assert_eq!(
            title.style.as_ref().and_then(|style| style.named_style),
            Some(NamedStyleType::Title)
        );
        assert_eq!(title.plain_text(), "Report");
    }

    #[test]
    fn test_marker_at_paragraph_start_stays_inline() {
        let parsed = parse(
            "<!-- gdoc:{\"kind\":\"person\"} -->[Ada](mailto:ada@example.com)<!-- /gdoc --> said hi\n",
        )
        .unwrap();
        let first = paragraph(&parsed.content, 0);
        assert!(matches!(first.elements[0], InlineNode::PersonMention(_)));
        assert_eq!(
            first.elements[1],
            InlineNode::TextRun(TextRun::plain(" said hi"))
        );
    }

    #[test]
    fn test_block_marker_on_its_own_line() {
        let parsed = parse("a\n\n<!-- gdoc:{\"kind\":\"sectionBreak\"} -->\n\nb\n").unwrap();
        assert_eq!(parsed.content.len(), 3);
        assert!(matches!(parsed.content[1], StructuralNode::SectionBreak(_)));
    }

    #[test]
    fn test_list_separator_splits_lists() {
        let parsed = parse("- a\n\n<!-- end list -->\n\n- b\n").unwrap();
        let ids: Vec<String> = parsed
            .content
            .iter()
            .filter_map(|block| match block {
                StructuralNode::Paragraph(p) => p.list.as_ref().map(|l| l.list_id.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }

    #[test]
    fn test_fenced_code_becomes_monospace_paragraphs() {
        let parsed = parse("```\nlet x = 1;\n\nx\n```\n").unwrap();
        assert_eq!(parsed.content.len(), 3);
        assert_eq!(
            paragraph(&parsed.content, 0).elements,
            vec![InlineNode::TextRun(TextRun::styled("let x = 1;", TextStyle::code()))]
        );
        assert_eq!(paragraph(&parsed.content, 1), &Paragraph::default());
    }

    #[test]
    fn test_unclosed_fence_reports_its_line() {
        let err = parse("intro\n\n```\ncode\n").unwrap_err();
        assert_eq!(err, ParseError::new("unclosed code fence", 3));
    }

    #[test]
    fn test_malformed_marker_reports_its_line() {
        let err = parse("a\n\nb <!-- gdoc:{nope} --> c\n").unwrap_err();
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_image_placeholders_map_back_to_object_ids() {
        let parsed = parse("![chart](imgs/kix.abc.png)\n\n![](https://example.com/a.png)\n").unwrap();
        let InlineNode::InlineImage(placeholder) = &paragraph(&parsed.content, 0).elements[0]
        else {
            panic!("expected an image");
        };
        assert_eq!(placeholder.object_id, "kix.abc");
        assert_eq!(placeholder.description.as_deref(), Some("chart"));

        let InlineNode::InlineImage(external) = &paragraph(&parsed.content, 1).elements[0] else {
            panic!("expected an image");
        };
        assert_eq!(external.object_id, "");
        assert_eq!(
            external.content_uri.as_deref(),
            Some("https://example.com/a.png")
        );
    }

    #[test]
    fn test_footnote_definitions_are_returned_separately() {
        let parsed = parse("See[^1].\n\n[^1]: Note text.\n").unwrap();
        assert_eq!(parsed.footnotes.len(), 1);
        assert_eq!(parsed.footnotes[0].0, "footnote-1");
        assert_eq!(
            parsed.footnotes[0].1,
            vec![StructuralNode::Paragraph(Paragraph::text("Note text."))]
        );
    }
}
