//! Tree node types and path-based addressing.
//!
//! The tree is an owned structure: containers own their children, and every
//! node can be addressed by a [`NodePath`] of child indices from the root.
//! Replacing a node at a path swaps it in place without touching siblings,
//! so paths collected before a batch of replacements stay valid.

use std::fmt;

/// A location in the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Point {
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed, in characters).
    pub column: usize,
    /// Byte offset from the start of the document (0-indexed).
    pub offset: usize,
}

/// Source span of a node, carried through for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Position {
    /// Start of the span (inclusive).
    pub start: Point,
    /// End of the span (exclusive).
    pub end: Point,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start.line, self.start.column)
    }
}

/// Discriminant of a [`Node`], used to select nodes by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    Paragraph,
    Heading,
    BlockQuote,
    List,
    ListItem,
    Table,
    TableRow,
    TableCell,
    Emphasis,
    Strong,
    Delete,
    Link,
    Image,
    Code,
    InlineCode,
    Html,
    Text,
    Break,
    ThematicBreak,
}

/// Document tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Document root.
    Root { children: Vec<Node> },
    Paragraph {
        children: Vec<Node>,
        position: Option<Position>,
    },
    Heading {
        /// Heading level (1-6).
        depth: u8,
        children: Vec<Node>,
        position: Option<Position>,
    },
    BlockQuote {
        children: Vec<Node>,
        position: Option<Position>,
    },
    List {
        ordered: bool,
        /// Start number for ordered lists.
        start: Option<u64>,
        children: Vec<Node>,
        position: Option<Position>,
    },
    ListItem {
        /// Task list state (`None` for plain items).
        checked: Option<bool>,
        children: Vec<Node>,
        position: Option<Position>,
    },
    Table {
        children: Vec<Node>,
        position: Option<Position>,
    },
    TableRow {
        /// True for the header row.
        header: bool,
        children: Vec<Node>,
        position: Option<Position>,
    },
    TableCell {
        children: Vec<Node>,
        position: Option<Position>,
    },
    Emphasis {
        children: Vec<Node>,
        position: Option<Position>,
    },
    Strong {
        children: Vec<Node>,
        position: Option<Position>,
    },
    Delete {
        children: Vec<Node>,
        position: Option<Position>,
    },
    Link {
        url: String,
        title: Option<String>,
        children: Vec<Node>,
        position: Option<Position>,
    },
    Image {
        url: String,
        title: Option<String>,
        alt: String,
        position: Option<Position>,
    },
    /// Fenced or indented code block.
    Code {
        /// First word of the fence info string.
        lang: Option<String>,
        /// Remainder of the fence info string.
        meta: Option<String>,
        value: String,
        position: Option<Position>,
    },
    InlineCode {
        value: String,
        position: Option<Position>,
    },
    /// Raw markup, emitted verbatim by serializers.
    Html {
        value: String,
        position: Option<Position>,
    },
    Text {
        value: String,
        position: Option<Position>,
    },
    Break { position: Option<Position> },
    ThematicBreak { position: Option<Position> },
}

impl Node {
    /// Create a root node.
    #[must_use]
    pub fn root(children: Vec<Node>) -> Self {
        Self::Root { children }
    }

    /// Create a raw markup node without source position.
    #[must_use]
    pub fn html(value: impl Into<String>) -> Self {
        Self::Html {
            value: value.into(),
            position: None,
        }
    }

    /// Create a text node without source position.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            value: value.into(),
            position: None,
        }
    }

    /// Kind of this node.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Root { .. } => NodeKind::Root,
            Self::Paragraph { .. } => NodeKind::Paragraph,
            Self::Heading { .. } => NodeKind::Heading,
            Self::BlockQuote { .. } => NodeKind::BlockQuote,
            Self::List { .. } => NodeKind::List,
            Self::ListItem { .. } => NodeKind::ListItem,
            Self::Table { .. } => NodeKind::Table,
            Self::TableRow { .. } => NodeKind::TableRow,
            Self::TableCell { .. } => NodeKind::TableCell,
            Self::Emphasis { .. } => NodeKind::Emphasis,
            Self::Strong { .. } => NodeKind::Strong,
            Self::Delete { .. } => NodeKind::Delete,
            Self::Link { .. } => NodeKind::Link,
            Self::Image { .. } => NodeKind::Image,
            Self::Code { .. } => NodeKind::Code,
            Self::InlineCode { .. } => NodeKind::InlineCode,
            Self::Html { .. } => NodeKind::Html,
            Self::Text { .. } => NodeKind::Text,
            Self::Break { .. } => NodeKind::Break,
            Self::ThematicBreak { .. } => NodeKind::ThematicBreak,
        }
    }

    /// Source position, if the node came from parsed input.
    #[must_use]
    pub fn position(&self) -> Option<&Position> {
        match self {
            Self::Root { .. } => None,
            Self::Paragraph { position, .. }
            | Self::Heading { position, .. }
            | Self::BlockQuote { position, .. }
            | Self::List { position, .. }
            | Self::ListItem { position, .. }
            | Self::Table { position, .. }
            | Self::TableRow { position, .. }
            | Self::TableCell { position, .. }
            | Self::Emphasis { position, .. }
            | Self::Strong { position, .. }
            | Self::Delete { position, .. }
            | Self::Link { position, .. }
            | Self::Image { position, .. }
            | Self::Code { position, .. }
            | Self::InlineCode { position, .. }
            | Self::Html { position, .. }
            | Self::Text { position, .. }
            | Self::Break { position }
            | Self::ThematicBreak { position } => position.as_ref(),
        }
    }

    /// Child nodes, or `None` for leaf nodes.
    #[must_use]
    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Self::Root { children }
            | Self::Paragraph { children, .. }
            | Self::Heading { children, .. }
            | Self::BlockQuote { children, .. }
            | Self::List { children, .. }
            | Self::ListItem { children, .. }
            | Self::Table { children, .. }
            | Self::TableRow { children, .. }
            | Self::TableCell { children, .. }
            | Self::Emphasis { children, .. }
            | Self::Strong { children, .. }
            | Self::Delete { children, .. }
            | Self::Link { children, .. } => Some(children),
            Self::Image { .. }
            | Self::Code { .. }
            | Self::InlineCode { .. }
            | Self::Html { .. }
            | Self::Text { .. }
            | Self::Break { .. }
            | Self::ThematicBreak { .. } => None,
        }
    }

    /// Mutable child nodes, or `None` for leaf nodes.
    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Self::Root { children }
            | Self::Paragraph { children, .. }
            | Self::Heading { children, .. }
            | Self::BlockQuote { children, .. }
            | Self::List { children, .. }
            | Self::ListItem { children, .. }
            | Self::Table { children, .. }
            | Self::TableRow { children, .. }
            | Self::TableCell { children, .. }
            | Self::Emphasis { children, .. }
            | Self::Strong { children, .. }
            | Self::Delete { children, .. }
            | Self::Link { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Node at `path`, where the empty path addresses `self`.
    #[must_use]
    pub fn get(&self, path: &NodePath) -> Option<&Node> {
        path.0
            .iter()
            .try_fold(self, |node, &index| node.children()?.get(index))
    }

    /// Mutable node at `path`.
    pub fn get_mut(&mut self, path: &NodePath) -> Option<&mut Node> {
        let mut node = self;
        for &index in &path.0 {
            node = node.children_mut()?.get_mut(index)?;
        }
        Some(node)
    }

    /// Replace the node at `path`, returning the previous node.
    ///
    /// Returns `None` and leaves the tree untouched if `path` does not
    /// address an existing node.
    pub fn replace(&mut self, path: &NodePath, replacement: Node) -> Option<Node> {
        let slot = self.get_mut(path)?;
        Some(std::mem::replace(slot, replacement))
    }

    /// Visit every node in pre-order (document order).
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&NodePath, &'a Node)) {
        let mut path = NodePath::root();
        self.walk_inner(&mut path, visit);
    }

    fn walk_inner<'a>(&'a self, path: &mut NodePath, visit: &mut dyn FnMut(&NodePath, &'a Node)) {
        visit(path, self);
        if let Some(children) = self.children() {
            for (index, child) in children.iter().enumerate() {
                path.0.push(index);
                child.walk_inner(path, visit);
                path.0.pop();
            }
        }
    }

    /// Paths of all nodes of the given kind, in document order.
    #[must_use]
    pub fn find(&self, kind: NodeKind) -> Vec<NodePath> {
        let mut found = Vec::new();
        self.walk(&mut |path, node| {
            if node.kind() == kind {
                found.push(path.clone());
            }
        });
        found
    }

    /// Concatenated text content of this node and its descendants.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        self.walk(&mut |_, node| match node {
            Node::Text { value, .. } | Node::InlineCode { value, .. } => text.push_str(value),
            Node::Image { alt, .. } => text.push_str(alt),
            _ => {}
        });
        text
    }
}

/// Address of a node as child indices from the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    /// Path addressing the root itself.
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path of the `index`-th child of the node at this path.
    #[must_use]
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }
}

impl From<Vec<usize>> for NodePath {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("root");
        }
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{index}")?;
        }
        Ok(())
    }
}
