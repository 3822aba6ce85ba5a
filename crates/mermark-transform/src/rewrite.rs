//! Replacement node construction.

use mermark_render::RenderResult;
use mermark_tree::Node;

use crate::consts::{IMAGE_CAPTION, WRAPPER_CLASS};

/// Wrap literal diagram text in the embeddable container.
///
/// The text is not escaped: client-side Mermaid reads it from the container.
#[must_use]
pub fn wrap_as_embeddable(text: &str) -> Node {
    Node::html(format!(r#"<div class="{WRAPPER_CLASS}">{text}</div>"#))
}

/// Build the node that replaces a rendered code block.
///
/// Inline markup becomes a raw markup node; an image path becomes an image
/// node with the fixed caption.
#[must_use]
pub fn from_render_result(result: RenderResult) -> Node {
    match result {
        RenderResult::Markup(markup) => Node::html(markup),
        RenderResult::Image(url) => Node::Image {
            url,
            title: None,
            alt: IMAGE_CAPTION.to_owned(),
            position: None,
        },
    }
}

/// Point a link or image at a new target, keeping everything else.
///
/// Other node kinds are returned unchanged.
#[must_use]
pub fn retarget(node: Node, target: String) -> Node {
    match node {
        Node::Link {
            title,
            children,
            position,
            ..
        } => Node::Link {
            url: target,
            title,
            children,
            position,
        },
        Node::Image {
            title,
            alt,
            position,
            ..
        } => Node::Image {
            url: target,
            title,
            alt,
            position,
        },
        other => other,
    }
}
