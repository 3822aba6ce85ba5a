//! Locate matching nodes and settle one unit of work per match.
//!
//! A phase collects every node of its kind whose discriminating field matches,
//! runs one future per match concurrently, then applies the outcomes to the
//! tree and the diagnostics list in document order.

use std::fmt;
use std::future::Future;

use futures::future::join_all;
use mermark_tree::{DocumentContext, Node, NodeKind, NodePath, Position};
use tokio::sync::Semaphore;

use crate::consts::{DIAGRAM_LANGUAGE, DIAGRAM_MARKER, ORIGIN};

/// One of the three sequential transformation passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Code,
    Link,
    Image,
}

impl Phase {
    /// All phases, in execution order.
    pub(crate) const ALL: [Self; 3] = [Self::Code, Self::Link, Self::Image];

    fn kind(self) -> NodeKind {
        match self {
            Self::Code => NodeKind::Code,
            Self::Link => NodeKind::Link,
            Self::Image => NodeKind::Image,
        }
    }

    /// Payload of a matching node: diagram source for code blocks, target
    /// reference for links and images. Matching is exact.
    fn select(self, node: &Node) -> Option<&str> {
        match (self, node) {
            (Self::Code, Node::Code { lang, value, .. })
                if lang.as_deref() == Some(DIAGRAM_LANGUAGE) =>
            {
                Some(value.as_str())
            }
            (Self::Link, Node::Link { title, url, .. })
            | (Self::Image, Node::Image { title, url, .. })
                if title.as_deref() == Some(DIAGRAM_MARKER) =>
            {
                Some(url.as_str())
            }
            _ => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code => f.write_str("code"),
            Self::Link => f.write_str("link"),
            Self::Image => f.write_str("image"),
        }
    }
}

/// A matched node handed to a unit of work.
#[derive(Debug, Clone)]
pub(crate) struct Match {
    /// Owned copy of the matched node.
    pub node: Node,
    /// Diagram source or target reference.
    pub payload: String,
}

/// Settled result of one unit of work.
#[derive(Debug)]
pub(crate) enum Outcome {
    /// Replace the node and record an info diagnostic.
    Replace { node: Node, message: String },
    /// Leave the node unchanged and record an error diagnostic.
    Fail { message: String },
}

impl Outcome {
    pub(crate) fn replace(node: Node, message: impl Into<String>) -> Self {
        Self::Replace {
            node,
            message: message.into(),
        }
    }

    pub(crate) fn fail(message: impl Into<String>) -> Self {
        Self::Fail {
            message: message.into(),
        }
    }
}

/// Counts reported after a phase settles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct PhaseSummary {
    pub replaced: usize,
    pub failed: usize,
}

/// Collect matches for `phase` in document order.
fn locate(tree: &Node, phase: Phase) -> Vec<(NodePath, Match)> {
    tree.find(phase.kind())
        .into_iter()
        .filter_map(|path| {
            let node = tree.get(&path)?;
            let payload = phase.select(node)?.to_owned();
            Some((
                path,
                Match {
                    node: node.clone(),
                    payload,
                },
            ))
        })
        .collect()
}

/// Run one phase over `tree`.
///
/// All units are started together and awaited as a group. When `gate` is
/// set, at most its permit count of units run at once. Outcomes are applied
/// only after every unit has settled, so diagnostics follow document order
/// regardless of completion order.
pub(crate) async fn run_phase<F, Fut>(
    tree: &mut Node,
    ctx: &mut DocumentContext,
    phase: Phase,
    gate: Option<&Semaphore>,
    work: F,
) -> PhaseSummary
where
    F: Fn(Match) -> Fut,
    Fut: Future<Output = Outcome>,
{
    let matches = locate(tree, phase);
    if matches.is_empty() {
        return PhaseSummary::default();
    }
    tracing::debug!(%phase, count = matches.len(), "Dispatching diagram matches");

    let units = matches.into_iter().map(|(path, matched)| {
        let position = matched.node.position().cloned();
        let unit = work(matched);
        async move {
            // Acquire only fails on a closed semaphore, which never happens here
            let _permit = match gate {
                Some(gate) => gate.acquire().await.ok(),
                None => None,
            };
            (path, position, unit.await)
        }
    });
    let settled: Vec<(NodePath, Option<Position>, Outcome)> = join_all(units).await;

    let mut summary = PhaseSummary::default();
    for (path, position, outcome) in settled {
        match outcome {
            Outcome::Replace { node, message } => {
                tree.replace(&path, node);
                tracing::debug!(%phase, path = %path, "{message}");
                ctx.info(message, position, ORIGIN);
                summary.replaced += 1;
            }
            Outcome::Fail { message } => {
                tracing::debug!(%phase, path = %path, error = %message, "Diagram match failed");
                ctx.error(message, position, ORIGIN);
                summary.failed += 1;
            }
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use mermark_tree::{Severity, parse_markdown};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_select_requires_exact_language() {
        let tree = parse_markdown("```mermaid\nA\n```\n\n```Mermaid\nB\n```\n\n```mermaidjs\nC\n```\n");

        let found = locate(&tree, Phase::Code);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].1.payload, "A");
    }

    #[test]
    fn test_select_requires_exact_marker() {
        let tree = parse_markdown(
            "[a](a.mmd \"mermaid:\") [b](b.mmd \"Mermaid:\") [c](c.mmd \"mermaid\") [d](d.mmd)\n\n\
             ![e](e.mmd \"mermaid:\") ![f](f.mmd \"mermaid: \")\n",
        );

        let links: Vec<_> = locate(&tree, Phase::Link)
            .into_iter()
            .map(|(_, m)| m.payload)
            .collect();
        let images: Vec<_> = locate(&tree, Phase::Image)
            .into_iter()
            .map(|(_, m)| m.payload)
            .collect();

        assert_eq!(links, vec!["a.mmd"]);
        assert_eq!(images, vec!["e.mmd"]);
    }

    #[tokio::test]
    async fn test_outcomes_applied_in_document_order() {
        let mut tree = parse_markdown("```mermaid\nfirst\n```\n\n```mermaid\nsecond\n```\n");
        let mut ctx = DocumentContext::new(".");

        let summary = run_phase(&mut tree, &mut ctx, Phase::Code, None, |m| async move {
            // Finish the second unit first
            if m.payload == "first" {
                tokio::task::yield_now().await;
                tokio::task::yield_now().await;
                Outcome::fail("first failed")
            } else {
                Outcome::replace(Node::html("ok"), "second replaced")
            }
        })
        .await;

        assert_eq!(summary, PhaseSummary { replaced: 1, failed: 1 });
        let messages: Vec<_> = ctx
            .diagnostics()
            .iter()
            .map(|d| (d.severity, d.message.as_str()))
            .collect();
        assert_eq!(
            messages,
            vec![
                (Severity::Error, "first failed"),
                (Severity::Info, "second replaced"),
            ]
        );
        assert!(matches!(tree.children().unwrap()[0], Node::Code { .. }));
        assert_eq!(tree.children().unwrap()[1], Node::html("ok"));
    }

    #[tokio::test]
    async fn test_diagnostics_carry_node_position() {
        let mut tree = parse_markdown("# Title\n\n```mermaid\nA\n```\n");
        let mut ctx = DocumentContext::new(".");

        run_phase(&mut tree, &mut ctx, Phase::Code, None, |_| async {
            Outcome::fail("boom")
        })
        .await;

        let position = ctx.diagnostics()[0].position.as_ref().unwrap();
        assert_eq!(position.start.line, 3);
        assert_eq!(position.start.column, 1);
    }

    #[tokio::test]
    async fn test_gate_limits_running_units() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let mut tree = parse_markdown("```mermaid\nA\n```\n\n```mermaid\nB\n```\n\n```mermaid\nC\n```\n");
        let mut ctx = DocumentContext::new(".");
        let gate = Semaphore::new(1);
        let running = &AtomicUsize::new(0);
        let peak = &AtomicUsize::new(0);

        let summary = run_phase(&mut tree, &mut ctx, Phase::Code, Some(&gate), move |_| async move {
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            running.fetch_sub(1, Ordering::SeqCst);
            Outcome::replace(Node::html("done"), "replaced")
        })
        .await;

        assert_eq!(summary.replaced, 3);
        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_matches_leaves_tree_untouched() {
        let source = "```python\nprint()\n```\n\n[doc](doc.md)\n";
        let mut tree = parse_markdown(source);
        let mut ctx = DocumentContext::new(".");

        for phase in Phase::ALL {
            run_phase(&mut tree, &mut ctx, phase, None, |_| async {
                Outcome::fail("unreachable")
            })
            .await;
        }

        assert_eq!(tree, parse_markdown(source));
        assert!(ctx.diagnostics().is_empty());
    }
}
