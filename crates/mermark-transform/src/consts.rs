//! Constants for diagram matching and rewriting.

/// Code block language tag that marks diagram source.
pub const DIAGRAM_LANGUAGE: &str = "mermaid";

/// Link and image title that marks a diagram reference.
pub const DIAGRAM_MARKER: &str = "mermaid:";

/// CSS class of the embeddable wrapper container.
pub const WRAPPER_CLASS: &str = "mermaid";

/// Alt text of generated image nodes.
pub const IMAGE_CAPTION: &str = "`mermaid` image";

/// Origin tag attached to every diagnostic.
pub const ORIGIN: &str = "mermark";
