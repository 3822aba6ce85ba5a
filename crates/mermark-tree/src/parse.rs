//! Markdown to tree conversion.
//!
//! Folds the pulldown-cmark event stream into an owned [`Node`] tree. Each
//! start tag opens a frame on a stack; the matching end tag closes it into a
//! node appended to the enclosing frame. Byte ranges reported by the parser
//! are converted into line/column [`Position`]s.

use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};

use crate::node::{Node, Point, Position};

/// Parse Markdown into a [`Node::Root`] tree.
///
/// GitHub Flavored Markdown tables, strikethrough and task lists are enabled.
///
/// # Example
///
/// ```
/// use mermark_tree::{Node, parse_markdown};
///
/// let tree = parse_markdown("[chart](flow.mmd \"mermaid:\")");
/// let Node::Root { children } = &tree else { unreachable!() };
/// assert_eq!(children.len(), 1);
/// ```
#[must_use]
pub fn parse_markdown(markdown: &str) -> Node {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let parser = Parser::new_ext(markdown, options);
    let mut builder = TreeBuilder::new(markdown);
    for (event, range) in parser.into_offset_iter() {
        builder.event(event, range);
    }
    builder.finish()
}

/// Open container awaiting its end tag.
enum Pending {
    Paragraph,
    Heading(u8),
    BlockQuote,
    List { start: Option<u64> },
    Item { checked: Option<bool> },
    Table,
    TableRow { header: bool },
    TableCell,
    Emphasis,
    Strong,
    Delete,
    Link { url: String, title: Option<String> },
    Image { url: String, title: Option<String> },
    CodeBlock { lang: Option<String>, meta: Option<String> },
    HtmlBlock,
    /// Container without a tree counterpart; children are spliced into the parent.
    Transparent,
}

struct Frame {
    pending: Pending,
    children: Vec<Node>,
    /// Raw text collected by code and HTML blocks.
    literal: String,
    range: Range<usize>,
}

struct TreeBuilder {
    lines: LineIndex,
    root: Vec<Node>,
    stack: Vec<Frame>,
}

impl TreeBuilder {
    fn new(source: &str) -> Self {
        Self {
            lines: LineIndex::new(source),
            root: Vec::new(),
            stack: Vec::new(),
        }
    }

    fn finish(mut self) -> Node {
        // Unbalanced frames only occur on parser bugs; keep whatever was collected.
        while !self.stack.is_empty() {
            self.close();
        }
        Node::root(self.root)
    }

    fn event(&mut self, event: Event<'_>, range: Range<usize>) {
        match event {
            Event::Start(tag) => self.open(tag, range),
            Event::End(_) => self.close(),
            Event::Text(text) => {
                if let Some(frame) = self.literal_frame() {
                    frame.literal.push_str(&text);
                } else {
                    self.push_text(&text, range);
                }
            }
            Event::Code(code) => {
                let position = Some(self.lines.position(&range));
                self.push(Node::InlineCode {
                    value: code.into_string(),
                    position,
                });
            }
            Event::Html(html) => {
                if let Some(frame) = self.literal_frame() {
                    frame.literal.push_str(&html);
                } else {
                    let position = Some(self.lines.position(&range));
                    self.push(Node::Html {
                        value: html.into_string(),
                        position,
                    });
                }
            }
            Event::InlineHtml(html) => {
                let position = Some(self.lines.position(&range));
                self.push(Node::Html {
                    value: html.into_string(),
                    position,
                });
            }
            Event::SoftBreak => self.push_text("\n", range),
            Event::HardBreak => {
                let position = Some(self.lines.position(&range));
                self.push(Node::Break { position });
            }
            Event::Rule => {
                let position = Some(self.lines.position(&range));
                self.push(Node::ThematicBreak { position });
            }
            Event::TaskListMarker(checked) => {
                if let Some(frame) = self
                    .stack
                    .iter_mut()
                    .rev()
                    .find(|f| matches!(f.pending, Pending::Item { .. }))
                {
                    frame.pending = Pending::Item {
                        checked: Some(checked),
                    };
                }
            }
            Event::FootnoteReference(text) | Event::InlineMath(text) | Event::DisplayMath(text) => {
                self.push_text(&text, range);
            }
        }
    }

    fn open(&mut self, tag: Tag<'_>, range: Range<usize>) {
        let pending = match tag {
            Tag::Paragraph => Pending::Paragraph,
            Tag::Heading { level, .. } => Pending::Heading(heading_level_to_num(level)),
            Tag::BlockQuote(_) => Pending::BlockQuote,
            Tag::CodeBlock(kind) => {
                let (lang, meta) = match kind {
                    CodeBlockKind::Fenced(info) => parse_fence_info(&info),
                    CodeBlockKind::Indented => (None, None),
                };
                Pending::CodeBlock { lang, meta }
            }
            Tag::HtmlBlock => Pending::HtmlBlock,
            Tag::List(start) => Pending::List { start },
            Tag::Item => Pending::Item { checked: None },
            Tag::Table(_) => Pending::Table,
            Tag::TableHead => Pending::TableRow { header: true },
            Tag::TableRow => Pending::TableRow { header: false },
            Tag::TableCell => Pending::TableCell,
            Tag::Emphasis => Pending::Emphasis,
            Tag::Strong => Pending::Strong,
            Tag::Strikethrough => Pending::Delete,
            Tag::Link {
                dest_url, title, ..
            } => Pending::Link {
                url: dest_url.into_string(),
                title: non_empty(title.into_string()),
            },
            Tag::Image {
                dest_url, title, ..
            } => Pending::Image {
                url: dest_url.into_string(),
                title: non_empty(title.into_string()),
            },
            Tag::FootnoteDefinition(_)
            | Tag::MetadataBlock(_)
            | Tag::DefinitionList
            | Tag::DefinitionListTitle
            | Tag::DefinitionListDefinition
            | Tag::Superscript
            | Tag::Subscript => Pending::Transparent,
        };
        self.stack.push(Frame {
            pending,
            children: Vec::new(),
            literal: String::new(),
            range,
        });
    }

    fn close(&mut self) {
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let position = Some(self.lines.position(&frame.range));
        let children = frame.children;
        let node = match frame.pending {
            Pending::Paragraph => Node::Paragraph { children, position },
            Pending::Heading(depth) => Node::Heading {
                depth,
                children,
                position,
            },
            Pending::BlockQuote => Node::BlockQuote { children, position },
            Pending::List { start } => Node::List {
                ordered: start.is_some(),
                start,
                children,
                position,
            },
            Pending::Item { checked } => Node::ListItem {
                checked,
                children,
                position,
            },
            Pending::Table => Node::Table { children, position },
            Pending::TableRow { header } => Node::TableRow {
                header,
                children,
                position,
            },
            Pending::TableCell => Node::TableCell { children, position },
            Pending::Emphasis => Node::Emphasis { children, position },
            Pending::Strong => Node::Strong { children, position },
            Pending::Delete => Node::Delete { children, position },
            Pending::Link { url, title } => Node::Link {
                url,
                title,
                children,
                position,
            },
            Pending::Image { url, title } => Node::Image {
                url,
                title,
                alt: Node::root(children).text_content(),
                position,
            },
            Pending::CodeBlock { lang, meta } => {
                let mut value = frame.literal;
                let line_ending = if value.ends_with("\r\n") {
                    2
                } else {
                    usize::from(value.ends_with('\n'))
                };
                value.truncate(value.len() - line_ending);
                Node::Code {
                    lang,
                    meta,
                    value,
                    position,
                }
            }
            Pending::HtmlBlock => Node::Html {
                value: frame.literal,
                position,
            },
            Pending::Transparent => {
                for child in children {
                    self.push(child);
                }
                return;
            }
        };
        self.push(node);
    }

    /// Innermost frame collecting raw text, if any.
    fn literal_frame(&mut self) -> Option<&mut Frame> {
        self.stack
            .last_mut()
            .filter(|f| matches!(f.pending, Pending::CodeBlock { .. } | Pending::HtmlBlock))
    }

    fn siblings(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some(frame) => &mut frame.children,
            None => &mut self.root,
        }
    }

    fn push(&mut self, node: Node) {
        self.siblings().push(node);
    }

    /// Append text, merging with a directly preceding text node.
    fn push_text(&mut self, text: &str, range: Range<usize>) {
        let end = self.lines.point(range.end);
        let start = self.lines.point(range.start);
        if let Some(Node::Text { value, position }) = self.siblings().last_mut() {
            value.push_str(text);
            if let Some(position) = position {
                position.end = end;
            }
            return;
        }
        self.push(Node::Text {
            value: text.to_owned(),
            position: Some(Position { start, end }),
        });
    }
}

/// Split a fence info string into language and meta.
fn parse_fence_info(info: &str) -> (Option<String>, Option<String>) {
    let info = info.trim();
    match info.split_once(char::is_whitespace) {
        Some((lang, meta)) => (non_empty(lang.to_owned()), non_empty(meta.trim().to_owned())),
        None => (non_empty(info.to_owned()), None),
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Byte offset to line/column lookup.
struct LineIndex {
    source: String,
    /// Byte offset of the first character of each line.
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source: source.to_owned(),
            starts,
        }
    }

    fn point(&self, offset: usize) -> Point {
        let offset = offset.min(self.source.len());
        let line = self.starts.partition_point(|&start| start <= offset);
        let line_start = self.starts[line.saturating_sub(1)];
        let column = self
            .source
            .get(line_start..offset)
            .map_or(offset - line_start, |s| s.chars().count())
            + 1;
        Point {
            line,
            column,
            offset,
        }
    }

    fn position(&self, range: &Range<usize>) -> Position {
        Position {
            start: self.point(range.start),
            end: self.point(range.end),
        }
    }
}
