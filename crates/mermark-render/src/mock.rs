//! Mock renderer implementation for testing.
//!
//! Provides [`MockRenderer`] for exercising the render pipeline without the
//! Mermaid CLI installed.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use mermark_tree::escape_html;

use crate::error::RenderError;
use crate::renderer::Renderer;

/// One recorded renderer call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Mock renderer for testing.
///
/// Reads the input file and writes a small SVG that embeds the escaped
/// source text. Every call is recorded, including failed ones.
///
/// # Example
///
/// ```ignore
/// use mermark_render::{MockRenderer, RenderGateway};
///
/// let gateway = RenderGateway::new(MockRenderer::new().fail_on("bad syntax"));
/// ```
#[derive(Debug, Default)]
pub struct MockRenderer {
    fail_marker: Option<String>,
    invocations: Mutex<Vec<Invocation>>,
}

impl MockRenderer {
    /// Create a mock renderer that always succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any render whose input path or content contains `marker`.
    #[must_use]
    pub fn fail_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_marker = Some(marker.into());
        self
    }

    /// Calls made so far, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    fn should_fail(&self, input: &Path, content: &str) -> bool {
        self.fail_marker.as_deref().is_some_and(|marker| {
            content.contains(marker) || input.to_string_lossy().contains(marker)
        })
    }
}

impl Renderer for MockRenderer {
    async fn render(&self, input: &Path, output: &Path) -> Result<(), RenderError> {
        self.invocations.lock().unwrap().push(Invocation {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
        });

        let content = tokio::fs::read_to_string(input)
            .await
            .map_err(|e| RenderError::io(input, e))?;

        if self.should_fail(input, &content) {
            return Err(RenderError::Failed {
                status: "exit status: 1".to_owned(),
                stderr: format!("Parse error in {}", input.display()),
            });
        }

        let svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg"><text>{}</text></svg>"#,
            escape_html(&content)
        );
        tokio::fs::write(output, svg)
            .await
            .map_err(|e| RenderError::io(output, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_invocations() {
        let temp_dir = tempfile::tempdir().unwrap();
        let input = temp_dir.path().join("in.mmd");
        let output = temp_dir.path().join("out.svg");
        std::fs::write(&input, "graph TD; A-->B;").unwrap();
        let renderer = MockRenderer::new();

        renderer.render(&input, &output).await.unwrap();

        assert_eq!(
            renderer.invocations(),
            vec![Invocation {
                input,
                output: output.clone(),
            }]
        );
        assert!(std::fs::read_to_string(&output).unwrap().starts_with("<svg"));
    }

    #[tokio::test]
    async fn test_fail_on_marker_in_content() {
        let temp_dir = tempfile::tempdir().unwrap();
        let input = temp_dir.path().join("in.mmd");
        std::fs::write(&input, "graph TD; broken").unwrap();
        let renderer = MockRenderer::new().fail_on("broken");

        let err = renderer
            .render(&input, &temp_dir.path().join("out.svg"))
            .await
            .unwrap_err();

        assert!(matches!(err, RenderError::Failed { .. }));
        assert_eq!(renderer.invocations().len(), 1);
    }
}
