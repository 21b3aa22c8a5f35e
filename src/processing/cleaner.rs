use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;

use super::markup::{self, MarkupNode, NodeKind};

static EXCESS_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("static newline pattern"));

/// Render a detail cell's markup as readable text.
///
/// - `<br>`, `<p>`, `<li>` (and other blocks) → line breaks
/// - `<pre>`/`<code>` kept verbatim inside a ``` fence
/// - every other tag stripped, its text kept
/// - trailing whitespace trimmed per line, 3+ newlines collapsed to one blank line
pub fn clean_detail_markup(markup: &str) -> String {
    let fragment = markup::parse_fragment(markup);
    let mut out = String::new();
    render_children(fragment.root_element(), &mut out);
    normalize_lines(&out)
}

fn render_children(el: ElementRef<'_>, out: &mut String) {
    for node in markup::children(el) {
        render_node(node, out);
    }
}

fn render_node(node: MarkupNode<'_>, out: &mut String) {
    match node.kind() {
        NodeKind::Text => out.push_str(&node.text()),
        NodeKind::LineBreak => out.push('\n'),
        NodeKind::Preformatted => {
            out.push_str("\n```\n");
            out.push_str(node.text().trim_matches('\n'));
            out.push_str("\n```\n");
        }
        NodeKind::Block => {
            if let Some(el) = node.element() {
                out.push('\n');
                render_children(el, out);
                out.push('\n');
            }
        }
        NodeKind::Bold | NodeKind::Inline => {
            if let Some(el) = node.element() {
                render_children(el, out);
            }
        }
        NodeKind::Skipped | NodeKind::Other => {}
    }
}

/// Trim trailing whitespace per line, then collapse runs of blank lines.
pub fn normalize_lines(text: &str) -> String {
    let trimmed: Vec<&str> = text.split('\n').map(str::trim_end).collect();
    let joined = trimmed.join("\n");
    let collapsed = EXCESS_NEWLINES.replace_all(&joined, "\n\n");
    collapsed.trim_matches('\n').to_string()
}
