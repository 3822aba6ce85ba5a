//! Mermaid diagram rendering for mermark.
//!
//! This crate wraps the external renderer behind a small port:
//! - [`Renderer`]: trait for "render this input file to that output file"
//! - [`MermaidCli`]: `mmdc` implementation, resolved once via search-path lookup
//! - [`RenderGateway`]: content-addressed naming and temp-file lifecycle around a render
//! - [`DiagramKey`]: keyed SHA-1 identifiers used as output file names
//! - [`MockRenderer`]: in-process test double (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use mermark_render::{MermaidCli, RenderGateway, RendererSettings};
//! use mermark_tree::OutputMode;
//!
//! let renderer = MermaidCli::discover(&RendererSettings::default())?;
//! let gateway = RenderGateway::new(renderer);
//! let result = gateway
//!     .render_from_text("graph TD; A-->B;", Path::new("public"), OutputMode::File)
//!     .await?;
//! ```

mod consts;
mod error;
mod gateway;
mod key;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod renderer;

pub use consts::{BACKGROUND, DEFAULT_EXECUTABLE, IMAGE_EXTENSION, SOURCE_EXTENSION};
pub use error::RenderError;
pub use gateway::{RenderGateway, RenderResult};
pub use key::DiagramKey;
#[cfg(any(test, feature = "mock"))]
pub use mock::{Invocation, MockRenderer};
pub use renderer::{MermaidCli, Renderer, RendererSettings};
