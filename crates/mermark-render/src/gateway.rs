//! Render gateway: naming and file lifecycle around one renderer call.
//!
//! Each render is a strictly sequential pipeline. For inline source text:
//!
//! 1. write the source to `{id}.mmd` in the destination directory
//! 2. invoke the renderer with `{id}.svg` as the requested output
//! 3. remove the temporary source file
//! 4. optionally read the rendered output back
//!
//! A failing step aborts the remaining ones. In particular the temporary
//! source file is left behind when the renderer fails.
//!
//! Renders that share an identifier share their file names, so the gateway
//! runs them one at a time. Different identifiers still render concurrently.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use mermark_tree::OutputMode;
use tokio::fs;
use tokio::sync::Mutex as AsyncMutex;

use crate::consts::{IMAGE_EXTENSION, SOURCE_EXTENSION};
use crate::error::RenderError;
use crate::key::DiagramKey;
use crate::renderer::Renderer;

/// Outcome of a successful render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderResult {
    /// Relative path of the generated image (e.g. `./{id}.svg`).
    Image(String),
    /// Rendered markup read back from the generated image.
    Markup(String),
}

/// Wraps a [`Renderer`] with content-addressed naming.
#[derive(Debug)]
pub struct RenderGateway<R> {
    renderer: R,
    /// One lock per identifier seen so far.
    key_locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl<R: Renderer> RenderGateway<R> {
    /// Create a gateway around the given renderer.
    #[must_use]
    pub fn new(renderer: R) -> Self {
        Self {
            renderer,
            key_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Underlying renderer.
    #[must_use]
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Render diagram source text into `dest_dir`.
    ///
    /// The identifier is derived from `source` alone, so the same text always
    /// yields the same file name in a given directory.
    ///
    /// # Errors
    ///
    /// Returns an error if writing the temporary file, rendering, removing the
    /// temporary file, or reading back the output fails.
    pub async fn render_from_text(
        &self,
        source: &str,
        dest_dir: &Path,
        mode: OutputMode,
    ) -> Result<RenderResult, RenderError> {
        let id = DiagramKey::Source(source).compute_hash();
        let input = dest_dir.join(format!("{id}.{SOURCE_EXTENSION}"));
        let output_name = format!("{id}.{IMAGE_EXTENSION}");
        let output = dest_dir.join(&output_name);

        let key_lock = self.key_lock(&id);
        let _guard = key_lock.lock().await;

        fs::create_dir_all(dest_dir)
            .await
            .map_err(|e| RenderError::io(dest_dir, e))?;
        fs::write(&input, source)
            .await
            .map_err(|e| RenderError::io(&input, e))?;

        self.renderer.render(&input, &output).await?;

        fs::remove_file(&input)
            .await
            .map_err(|e| RenderError::io(&input, e))?;
        tracing::debug!(id = %id, "Removed temporary diagram source");

        match mode {
            OutputMode::File => Ok(RenderResult::Image(format!("./{output_name}"))),
            OutputMode::Inline => {
                let markup = fs::read_to_string(&output)
                    .await
                    .map_err(|e| RenderError::io(&output, e))?;
                Ok(RenderResult::Markup(markup))
            }
        }
    }

    /// Render an existing diagram source file into `dest_dir`.
    ///
    /// Returns the relative path of the generated image. The identifier is
    /// derived from the path string, not the file content. No temporary file
    /// is created.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination cannot be created or rendering fails.
    pub async fn render_from_file(
        &self,
        source_path: &Path,
        dest_dir: &Path,
    ) -> Result<String, RenderError> {
        let id = DiagramKey::Path(source_path).compute_hash();
        let output_name = format!("{id}.{IMAGE_EXTENSION}");
        let output = dest_dir.join(&output_name);

        let key_lock = self.key_lock(&id);
        let _guard = key_lock.lock().await;

        fs::create_dir_all(dest_dir)
            .await
            .map_err(|e| RenderError::io(dest_dir, e))?;

        self.renderer.render(source_path, &output).await?;

        Ok(format!("./{output_name}"))
    }

    /// Lock serializing renders of the same identifier.
    fn key_lock(&self, id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self
            .key_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(id.to_owned()).or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockRenderer;
    use pretty_assertions::assert_eq;
    use regex::Regex;

    fn image_path(result: &RenderResult) -> &str {
        match result {
            RenderResult::Image(path) => path,
            RenderResult::Markup(_) => panic!("expected image result, got {result:?}"),
        }
    }

    #[tokio::test]
    async fn test_render_from_text_file_mode() {
        let temp_dir = tempfile::tempdir().unwrap();
        let gateway = RenderGateway::new(MockRenderer::new());

        let result = gateway
            .render_from_text("graph TD; A-->B;", temp_dir.path(), OutputMode::File)
            .await
            .unwrap();

        let path = image_path(&result);
        assert!(Regex::new(r"^\./[0-9a-f]{40}\.svg$").unwrap().is_match(path));
        assert!(temp_dir.path().join(&path[2..]).exists());
    }

    #[tokio::test]
    async fn test_render_from_text_removes_temp_source() {
        let temp_dir = tempfile::tempdir().unwrap();
        let gateway = RenderGateway::new(MockRenderer::new());
        let source = "graph TD; A-->B;";
        let id = DiagramKey::Source(source).compute_hash();

        gateway
            .render_from_text(source, temp_dir.path(), OutputMode::File)
            .await
            .unwrap();

        assert!(!temp_dir.path().join(format!("{id}.mmd")).exists());
        assert!(temp_dir.path().join(format!("{id}.svg")).exists());
    }

    #[tokio::test]
    async fn test_render_from_text_is_deterministic() {
        let temp_dir = tempfile::tempdir().unwrap();
        let gateway = RenderGateway::new(MockRenderer::new());

        let first = gateway
            .render_from_text("graph LR; X-->Y;", temp_dir.path(), OutputMode::File)
            .await
            .unwrap();
        let second = gateway
            .render_from_text("graph LR; X-->Y;", temp_dir.path(), OutputMode::File)
            .await
            .unwrap();
        let other = gateway
            .render_from_text("graph LR; Y-->X;", temp_dir.path(), OutputMode::File)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);
        // No caching: both identical renders invoked the renderer
        assert_eq!(gateway.renderer().invocations().len(), 3);
    }

    #[tokio::test]
    async fn test_render_from_text_inline_reads_output() {
        let temp_dir = tempfile::tempdir().unwrap();
        let gateway = RenderGateway::new(MockRenderer::new());

        let result = gateway
            .render_from_text("graph TD; A-->B;", temp_dir.path(), OutputMode::Inline)
            .await
            .unwrap();

        let RenderResult::Markup(markup) = result else {
            panic!("expected markup result");
        };
        assert!(markup.starts_with("<svg"));
        assert!(markup.contains("graph TD; A--&gt;B;"));
    }

    #[tokio::test]
    async fn test_render_from_text_failure_keeps_temp_source() {
        let temp_dir = tempfile::tempdir().unwrap();
        let gateway = RenderGateway::new(MockRenderer::new().fail_on("syntax error"));
        let source = "graph TD; syntax error";
        let id = DiagramKey::Source(source).compute_hash();

        let err = gateway
            .render_from_text(source, temp_dir.path(), OutputMode::File)
            .await
            .unwrap_err();

        assert!(matches!(err, RenderError::Failed { .. }));
        assert!(temp_dir.path().join(format!("{id}.mmd")).exists());
        assert!(!temp_dir.path().join(format!("{id}.svg")).exists());
    }

    #[tokio::test]
    async fn test_render_from_text_creates_dest_dir() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dest = temp_dir.path().join("public").join("diagrams");
        let gateway = RenderGateway::new(MockRenderer::new());

        let result = gateway
            .render_from_text("graph TD; A-->B;", &dest, OutputMode::File)
            .await
            .unwrap();

        assert!(dest.join(&image_path(&result)[2..]).exists());
    }

    #[tokio::test]
    async fn test_identical_sources_render_concurrently() {
        let temp_dir = tempfile::tempdir().unwrap();
        let gateway = RenderGateway::new(MockRenderer::new());
        let source = "graph TD; A-->B;";

        let (first, second) = tokio::join!(
            gateway.render_from_text(source, temp_dir.path(), OutputMode::File),
            gateway.render_from_text(source, temp_dir.path(), OutputMode::File),
        );

        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(gateway.renderer().invocations().len(), 2);
        let id = DiagramKey::Source(source).compute_hash();
        assert!(!temp_dir.path().join(format!("{id}.mmd")).exists());
    }

    /// Reports success without writing anything.
    struct SilentRenderer;

    impl Renderer for SilentRenderer {
        async fn render(&self, _input: &Path, _output: &Path) -> Result<(), RenderError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_render_from_text_inline_missing_output() {
        let temp_dir = tempfile::tempdir().unwrap();
        let gateway = RenderGateway::new(SilentRenderer);
        let source = "graph TD; A-->B;";
        let id = DiagramKey::Source(source).compute_hash();

        let err = gateway
            .render_from_text(source, temp_dir.path(), OutputMode::Inline)
            .await
            .unwrap_err();

        let RenderError::Io { path, .. } = err else {
            panic!("expected Io, got {err:?}");
        };
        assert_eq!(path, temp_dir.path().join(format!("{id}.svg")));
        // Cleanup ran before the read-back
        assert!(!temp_dir.path().join(format!("{id}.mmd")).exists());
    }

    #[tokio::test]
    async fn test_render_from_file_keys_by_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let a = temp_dir.path().join("a.mmd");
        let b = temp_dir.path().join("b.mmd");
        std::fs::write(&a, "graph TD; A-->B;").unwrap();
        std::fs::write(&b, "graph TD; A-->B;").unwrap();
        let gateway = RenderGateway::new(MockRenderer::new());

        let from_a = gateway.render_from_file(&a, temp_dir.path()).await.unwrap();
        let from_b = gateway.render_from_file(&b, temp_dir.path()).await.unwrap();

        // Identical content, different paths: different names
        assert_ne!(from_a, from_b);

        // Same path after the content changed: same name
        std::fs::write(&a, "graph TD; C-->D;").unwrap();
        let again = gateway.render_from_file(&a, temp_dir.path()).await.unwrap();
        assert_eq!(from_a, again);

        let expected = format!("./{}.svg", DiagramKey::Path(&a).compute_hash());
        assert_eq!(from_a, expected);
    }

    #[tokio::test]
    async fn test_render_from_file_leaves_source_in_place() {
        let temp_dir = tempfile::tempdir().unwrap();
        let source = temp_dir.path().join("flow.mmd");
        std::fs::write(&source, "graph TD; A-->B;").unwrap();
        let gateway = RenderGateway::new(MockRenderer::new());

        gateway
            .render_from_file(&source, temp_dir.path())
            .await
            .unwrap();

        assert!(source.exists());
        let invocations = gateway.renderer().invocations();
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].input, source);
    }

    #[tokio::test]
    async fn test_render_from_file_missing_source() {
        let temp_dir = tempfile::tempdir().unwrap();
        let gateway = RenderGateway::new(MockRenderer::new());

        let err = gateway
            .render_from_file(&temp_dir.path().join("missing.mmd"), temp_dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, RenderError::Io { .. }));
    }
}
