//! Transformer entry point.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use mermark_render::{RenderGateway, Renderer};
use mermark_tree::{DocumentContext, Node, OutputMode};
use serde::Deserialize;
use tokio::sync::Semaphore;

use crate::consts::DIAGRAM_LANGUAGE;
use crate::destination;
use crate::dispatch::{Match, Outcome, Phase, run_phase};
use crate::rewrite;

/// Transformation options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransformOptions {
    /// Embed-only mode: wrap diagram text for client-side rendering instead
    /// of invoking the renderer.
    pub simple: bool,
}

/// Rewrites Mermaid diagram references in document trees.
///
/// Holds a renderer resolved once at construction. Each
/// [`transform`](Self::transform) call runs the code, link and image phases
/// in that order; a phase starts only after the previous one settled.
#[derive(Debug)]
pub struct Transformer<R> {
    options: TransformOptions,
    gateway: RenderGateway<R>,
    gate: Option<Semaphore>,
}

impl<R: Renderer> Transformer<R> {
    /// Create a transformer with unbounded render concurrency.
    #[must_use]
    pub fn new(options: TransformOptions, renderer: R) -> Self {
        Self {
            options,
            gateway: RenderGateway::new(renderer),
            gate: None,
        }
    }

    /// Limit how many matches of one phase are processed at once.
    #[must_use]
    pub fn with_concurrency_limit(mut self, limit: NonZeroUsize) -> Self {
        self.gate = Some(Semaphore::new(limit.get()));
        self
    }

    /// Underlying renderer.
    #[must_use]
    pub fn renderer(&self) -> &R {
        self.gateway.renderer()
    }

    /// Transform `tree`, recording diagnostics in `ctx`.
    ///
    /// Per-node failures are recorded as error diagnostics and leave the node
    /// unchanged; they never abort the transformation.
    pub async fn transform(&self, mut tree: Node, ctx: &mut DocumentContext) -> Node {
        let dest_buf = destination::resolve(ctx).to_path_buf();
        let source_dir_buf = ctx.source_dir().to_path_buf();
        let (dest, source_dir) = (dest_buf.as_path(), source_dir_buf.as_path());
        let mode = ctx.output_mode;
        let gate = self.gate.as_ref();

        for phase in Phase::ALL {
            let summary = match phase {
                Phase::Code => {
                    run_phase(&mut tree, ctx, phase, gate, move |m| {
                        self.process_code(m, dest, mode)
                    })
                    .await
                }
                Phase::Link | Phase::Image => {
                    run_phase(&mut tree, ctx, phase, gate, move |m| {
                        self.process_reference(m, source_dir, dest)
                    })
                    .await
                }
            };
            if summary.replaced + summary.failed > 0 {
                tracing::info!(
                    %phase,
                    replaced = summary.replaced,
                    failed = summary.failed,
                    "Processed diagram phase"
                );
            }
        }

        tree
    }

    async fn process_code(&self, matched: Match, dest: &Path, mode: OutputMode) -> Outcome {
        if self.options.simple {
            return Outcome::replace(
                rewrite::wrap_as_embeddable(&matched.payload),
                format!("{DIAGRAM_LANGUAGE} code block replaced with div"),
            );
        }

        match self
            .gateway
            .render_from_text(&matched.payload, dest, mode)
            .await
        {
            Ok(result) => Outcome::replace(
                rewrite::from_render_result(result),
                format!("{DIAGRAM_LANGUAGE} code block replaced with graph"),
            ),
            Err(e) => Outcome::fail(e.to_string()),
        }
    }

    /// Handle a link or image whose target is a diagram source file.
    ///
    /// Embed-only mode reads the file and wraps its text; it does not render.
    async fn process_reference(&self, matched: Match, source_dir: &Path, dest: &Path) -> Outcome {
        let path = match resolve_target(source_dir, &matched.payload) {
            Ok(path) => path,
            Err(e) => {
                return Outcome::fail(format!(
                    "cannot resolve diagram reference `{}`: {e}",
                    matched.payload
                ));
            }
        };

        if self.options.simple {
            return match tokio::fs::read_to_string(&path).await {
                Ok(text) => Outcome::replace(
                    rewrite::wrap_as_embeddable(&text),
                    format!("{DIAGRAM_LANGUAGE} link replaced with div"),
                ),
                Err(e) => Outcome::fail(format!("I/O error on {}: {e}", path.display())),
            };
        }

        match self.gateway.render_from_file(&path, dest).await {
            Ok(target) => Outcome::replace(
                rewrite::retarget(matched.node, target),
                format!("{DIAGRAM_LANGUAGE} link replaced with link to graph"),
            ),
            Err(e) => Outcome::fail(e.to_string()),
        }
    }
}

/// Resolve a reference against the source directory into an absolute path.
fn resolve_target(source_dir: &Path, reference: &str) -> std::io::Result<PathBuf> {
    std::path::absolute(source_dir.join(reference))
}
