//! Mermaid diagram transformation for mermark document trees.
//!
//! The [`Transformer`] scans a tree in three sequential phases (code blocks,
//! then links, then images) for diagram references and rewrites each match:
//!
//! - a fenced code block tagged `mermaid` is rendered to an image (or inline
//!   markup) through a [`RenderGateway`](mermark_render::RenderGateway)
//! - a link or image titled `mermaid:` has its target rendered and retargeted
//!   to the generated image
//! - in `simple` mode every match becomes a `<div class="mermaid">` wrapper
//!   around the literal diagram text and nothing is rendered
//!
//! Every match ends either replaced (with an info diagnostic) or unchanged
//! with exactly one error diagnostic. Failures never abort sibling matches.
//!
//! # Example
//!
//! ```ignore
//! use mermark_render::{MermaidCli, RendererSettings};
//! use mermark_transform::{TransformOptions, Transformer};
//! use mermark_tree::{DocumentContext, parse_markdown};
//!
//! let renderer = MermaidCli::discover(&RendererSettings::default())?;
//! let transformer = Transformer::new(TransformOptions::default(), renderer);
//!
//! let mut ctx = DocumentContext::for_path("docs/guide.md");
//! let tree = transformer.transform(parse_markdown(source), &mut ctx).await;
//! ```

mod consts;
pub mod destination;
mod dispatch;
pub mod rewrite;
mod transformer;

pub use consts::{DIAGRAM_LANGUAGE, DIAGRAM_MARKER, IMAGE_CAPTION, ORIGIN, WRAPPER_CLASS};
pub use transformer::{TransformOptions, Transformer};
