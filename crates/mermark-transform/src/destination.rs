//! Output directory resolution.

use std::path::Path;

use mermark_tree::DocumentContext;

/// Directory generated files for this document are written to.
///
/// The explicit output directory wins; otherwise files land next to the
/// source document.
#[must_use]
pub fn resolve(ctx: &DocumentContext) -> &Path {
    ctx.output_dir.as_deref().unwrap_or(ctx.source_dir())
}
