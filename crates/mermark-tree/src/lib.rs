//! Document tree model for mermark.
//!
//! This crate provides the structures the diagram transformer operates on:
//! - [`Node`]: tagged tree node (mdast-shaped) with path-based addressing
//! - [`parse_markdown`]: builds a [`Node::Root`] from Markdown via pulldown-cmark
//! - [`to_html`]: serializes a tree to HTML
//! - [`DocumentContext`]: per-document paths, output mode and diagnostics
//!
//! # Example
//!
//! ```
//! use mermark_tree::{NodeKind, parse_markdown, to_html};
//!
//! let tree = parse_markdown("# Title\n\n```mermaid\ngraph TD; A-->B;\n```\n");
//! let code_blocks = tree.find(NodeKind::Code);
//! assert_eq!(code_blocks.len(), 1);
//!
//! let html = to_html(&tree);
//! assert!(html.starts_with("<h1>Title</h1>"));
//! ```

mod document;
mod html;
mod node;
mod parse;

pub use document::{Diagnostic, DocumentContext, OutputMode, Severity};
pub use html::{escape_html, to_html};
pub use node::{Node, NodeKind, NodePath, Point, Position};
pub use parse::parse_markdown;
