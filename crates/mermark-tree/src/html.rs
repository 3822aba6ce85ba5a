//! HTML serialization of document trees.

use std::fmt::Write;

use crate::node::Node;

/// Serialize a tree to HTML.
///
/// Text and attribute values are escaped; [`Node::Html`] values are emitted
/// verbatim.
///
/// # Example
///
/// ```
/// use mermark_tree::{Node, to_html};
///
/// let tree = Node::root(vec![Node::Paragraph {
///     children: vec![Node::text("a < b")],
///     position: None,
/// }]);
/// assert_eq!(to_html(&tree), "<p>a &lt; b</p>\n");
/// ```
#[must_use]
pub fn to_html(node: &Node) -> String {
    let mut out = String::with_capacity(4096);
    write_node(node, &mut out);
    out
}

fn write_children(children: &[Node], out: &mut String) {
    for child in children {
        write_node(child, out);
    }
}

fn write_wrapped(tag: &str, children: &[Node], out: &mut String) {
    write!(out, "<{tag}>").unwrap();
    write_children(children, out);
    write!(out, "</{tag}>").unwrap();
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Root { children } => write_children(children, out),
        Node::Paragraph { children, .. } => {
            write_wrapped("p", children, out);
            out.push('\n');
        }
        Node::Heading {
            depth, children, ..
        } => {
            write_wrapped(&format!("h{depth}"), children, out);
            out.push('\n');
        }
        Node::BlockQuote { children, .. } => {
            out.push_str("<blockquote>\n");
            write_children(children, out);
            out.push_str("</blockquote>\n");
        }
        Node::List {
            ordered,
            start,
            children,
            ..
        } => {
            match (ordered, start) {
                (true, Some(n)) if *n != 1 => write!(out, r#"<ol start="{n}">"#).unwrap(),
                (true, _) => out.push_str("<ol>"),
                (false, _) => out.push_str("<ul>"),
            }
            out.push('\n');
            write_children(children, out);
            out.push_str(if *ordered { "</ol>\n" } else { "</ul>\n" });
        }
        Node::ListItem {
            checked, children, ..
        } => {
            out.push_str("<li>");
            match checked {
                Some(true) => out.push_str(r#"<input type="checkbox" checked disabled> "#),
                Some(false) => out.push_str(r#"<input type="checkbox" disabled> "#),
                None => {}
            }
            write_children(children, out);
            out.push_str("</li>\n");
        }
        Node::Table { children, .. } => {
            out.push_str("<table>\n");
            write_children(children, out);
            out.push_str("</table>\n");
        }
        Node::TableRow {
            header, children, ..
        } => {
            let cell = if *header { "th" } else { "td" };
            out.push_str("<tr>");
            for child in children {
                match child {
                    Node::TableCell { children, .. } => write_wrapped(cell, children, out),
                    other => write_node(other, out),
                }
            }
            out.push_str("</tr>\n");
        }
        Node::TableCell { children, .. } => write_wrapped("td", children, out),
        Node::Emphasis { children, .. } => write_wrapped("em", children, out),
        Node::Strong { children, .. } => write_wrapped("strong", children, out),
        Node::Delete { children, .. } => write_wrapped("del", children, out),
        Node::Link {
            url,
            title,
            children,
            ..
        } => {
            write!(out, r#"<a href="{}""#, escape_html(url)).unwrap();
            if let Some(title) = title {
                write!(out, r#" title="{}""#, escape_html(title)).unwrap();
            }
            out.push('>');
            write_children(children, out);
            out.push_str("</a>");
        }
        Node::Image {
            url, title, alt, ..
        } => {
            write!(out, r#"<img src="{}" alt="{}""#, escape_html(url), escape_html(alt)).unwrap();
            if let Some(title) = title {
                write!(out, r#" title="{}""#, escape_html(title)).unwrap();
            }
            out.push('>');
        }
        Node::Code { lang, value, .. } => {
            if let Some(lang) = lang {
                write!(
                    out,
                    r#"<pre><code class="language-{}">{}</code></pre>"#,
                    escape_html(lang),
                    escape_html(value)
                )
                .unwrap();
            } else {
                write!(out, "<pre><code>{}</code></pre>", escape_html(value)).unwrap();
            }
            out.push('\n');
        }
        Node::InlineCode { value, .. } => {
            write!(out, "<code>{}</code>", escape_html(value)).unwrap();
        }
        Node::Html { value, .. } => out.push_str(value),
        Node::Text { value, .. } => out.push_str(&escape_html(value)),
        Node::Break { .. } => out.push_str("<br>\n"),
        Node::ThematicBreak { .. } => out.push_str("<hr>\n"),
    }
}

/// Escape special HTML characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_markdown;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html(r#""quoted""#), "&quot;quoted&quot;");
        assert_eq!(escape_html("it's"), "it&#x27;s");
    }

    #[test]
    fn test_heading_and_paragraph() {
        let html = to_html(&parse_markdown("# Title\n\nSome *emphasis* and **bold**.\n"));

        assert_eq!(
            html,
            "<h1>Title</h1>\n<p>Some <em>emphasis</em> and <strong>bold</strong>.</p>\n"
        );
    }

    #[test]
    fn test_code_block_escaped() {
        let html = to_html(&parse_markdown("```mermaid\nA-->B\n```\n"));

        assert_eq!(
            html,
            "<pre><code class=\"language-mermaid\">A--&gt;B</code></pre>\n"
        );
    }

    #[test]
    fn test_raw_html_passthrough() {
        let tree = Node::root(vec![Node::html(r#"<div class="mermaid">A-->B</div>"#)]);

        assert_eq!(to_html(&tree), r#"<div class="mermaid">A-->B</div>"#);
    }

    #[test]
    fn test_link_and_image() {
        let html = to_html(&parse_markdown(
            "[doc](guide.md \"Guide\") ![chart](./abc.svg)\n",
        ));

        assert_eq!(
            html,
            "<p><a href=\"guide.md\" title=\"Guide\">doc</a> <img src=\"./abc.svg\" alt=\"chart\"></p>\n"
        );
    }

    #[test]
    fn test_ordered_list_start() {
        let html = to_html(&parse_markdown("3. three\n4. four\n"));

        assert_eq!(html, "<ol start=\"3\">\n<li>three</li>\n<li>four</li>\n</ol>\n");
    }

    #[test]
    fn test_table() {
        let html = to_html(&parse_markdown("| a |\n|---|\n| 1 |\n"));

        assert_eq!(html, "<table>\n<tr><th>a</th></tr>\n<tr><td>1</td></tr>\n</table>\n");
    }
}
