//! Naming and invocation constants for diagram rendering.

/// Extension of temporary diagram source files.
pub const SOURCE_EXTENSION: &str = "mmd";

/// Extension of rendered diagram files.
pub const IMAGE_EXTENSION: &str = "svg";

/// Background color passed to the renderer.
pub const BACKGROUND: &str = "transparent";

/// Renderer executable looked up when none is configured.
pub const DEFAULT_EXECUTABLE: &str = "mmdc";

/// Key for the HMAC used to derive diagram identifiers.
pub(crate) const HASH_KEY: &[u8] = b"mermark";
