//! Content-addressed diagram identifiers.
//!
//! Provides [`DiagramKey`] for deriving the file name stem shared by a
//! diagram's temporary source file and its rendered output.

use std::path::Path;

use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::consts::HASH_KEY;

type HmacSha1 = Hmac<Sha1>;

/// Input a diagram identifier is derived from.
///
/// Identical inputs always produce the same identifier, independent of the
/// destination directory. This gives deterministic names; it does not skip
/// re-rendering.
#[derive(Debug, Clone, Copy)]
pub enum DiagramKey<'a> {
    /// Diagram source text (inline code blocks).
    Source(&'a str),
    /// Path of a diagram source file (linked diagrams).
    ///
    /// Keyed by the path string rather than the file content, so the same
    /// path always maps to the same name even if the file changes.
    Path(&'a Path),
}

impl DiagramKey<'_> {
    /// Compute the identifier for this key.
    ///
    /// # Hash Format
    ///
    /// Hex-encoded HMAC-SHA1 of the input, keyed with `"mermark"` (40 characters).
    #[must_use]
    pub fn compute_hash(&self) -> String {
        let mut mac =
            HmacSha1::new_from_slice(HASH_KEY).expect("HMAC accepts keys of any length");
        match self {
            Self::Source(source) => mac.update(source.as_bytes()),
            Self::Path(path) => mac.update(path.to_string_lossy().as_bytes()),
        }
        hex::encode(mac.finalize().into_bytes())
    }
}
