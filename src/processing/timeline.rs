//! Timeline — recover discrete actions from a ticket's detail markup.
//!
//! Headers are bold nodes reading `<YYYY/MM/DD HH:MM> <ACTION> by <actor>`.
//! An entry's content is everything between its header and the next header,
//! walked through the header's following siblings.

use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;

use super::markup::{self, NodeKind};
use crate::ticket::{ActionKind, Ticket, TimelineEntry};
use crate::time_utils::parse_export_timestamp;

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d{4}/\d{2}/\d{2}\s+\d{2}:\d{2})\s+(OPENED|ASSIGNED|EDITED|RESOLVED|CLOSED)\s+by\s+([^\n<]+)",
    )
    .expect("static timeline header pattern")
});

/// Header fields before timestamp validation.
struct Header<'t> {
    timestamp: &'t str,
    action: ActionKind,
    actor: &'t str,
}

fn match_header(text: &str) -> Option<Header<'_>> {
    let caps = HEADER.captures(text)?;
    let action = caps.get(2)?.as_str().parse().ok()?;
    Some(Header {
        timestamp: caps.get(1)?.as_str(),
        action,
        actor: caps.get(3)?.as_str().trim(),
    })
}

fn is_header(el: ElementRef<'_>) -> bool {
    markup::element_kind(el.value().name()) == NodeKind::Bold
        && match_header(markup::text_of(el).trim()).is_some()
}

/// Extract the ordered timeline of a ticket.
pub fn extract_timeline(ticket: &Ticket) -> Vec<TimelineEntry> {
    let entries = parse_timeline(&ticket.detail_markup);
    tracing::debug!(ticket = %ticket.id, entries = entries.len(), "Timeline extracted");
    entries
}

/// Parse timeline entries out of detail markup, in document order.
/// Markup without headers yields an empty timeline.
pub fn parse_timeline(detail_markup: &str) -> Vec<TimelineEntry> {
    let fragment = markup::parse_fragment(detail_markup);
    let mut entries = Vec::new();

    for bold in markup::descendant_elements(fragment.root_element())
        .filter(|el| markup::element_kind(el.value().name()) == NodeKind::Bold)
    {
        let header_text = markup::text_of(bold);
        let Some(header) = match_header(header_text.trim()) else {
            continue;
        };

        let timestamp = match parse_export_timestamp(header.timestamp) {
            Ok(ts) => ts,
            Err(e) => {
                tracing::warn!(header = %header_text.trim(), error = %e, "Skipping timeline entry");
                continue;
            }
        };

        entries.push(TimelineEntry {
            timestamp,
            action: header.action,
            actor: header.actor.to_string(),
            content: collect_content(bold),
        });
    }

    entries
}

/// Accumulate the text following a header up to the next header.
fn collect_content(header: ElementRef<'_>) -> String {
    let mut content = String::new();

    for node in markup::following_siblings(header) {
        match node.kind() {
            NodeKind::LineBreak => content.push('\n'),
            NodeKind::Bold => break,
            NodeKind::Skipped | NodeKind::Other => {}
            NodeKind::Text => content.push_str(&node.text()),
            NodeKind::Block | NodeKind::Preformatted | NodeKind::Inline => {
                let Some(el) = node.element() else { continue };
                // A wrapper holding the next header ends this entry.
                if markup::descendant_elements(el).any(is_header) {
                    break;
                }
                let text = node.text();
                if !text.trim().is_empty() {
                    let starts_line = matches!(node.kind(), NodeKind::Block | NodeKind::Preformatted);
                    if starts_line && !content.is_empty() && !content.ends_with('\n') {
                        content.push('\n');
                    }
                    content.push_str(&text);
                }
            }
        }
    }

    tidy(&content)
}

/// Outer whitespace only; preformatted indentation inside is kept.
fn tidy(content: &str) -> String {
    content.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::SAMPLE_DETAIL;

    #[test]
    fn test_single_header_with_free_text() {
        let entries = parse_timeline("<b>2025/01/07 17:45 OPENED by Alice</b>  Messages over 28KB fail to send.  ");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, ActionKind::Opened);
        assert_eq!(entries[0].actor, "Alice");
        assert_eq!(entries[0].content, "Messages over 28KB fail to send.");
        assert_eq!(entries[0].timestamp.format("%Y/%m/%d %H:%M").to_string(), "2025/01/07 17:45");
    }

    #[test]
    fn test_content_stops_at_next_header() {
        let entries = parse_timeline(
            "<b>2025/01/07 17:45 OPENED by Alice</b>first<br>second\
             <b>2025/01/07 18:00 ASSIGNED by Bob to CData Japan Support</b>",
        );
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].content, "first\nsecond");
        assert_eq!(entries[1].action, ActionKind::Assigned);
        assert_eq!(entries[1].actor, "Bob to CData Japan Support");
        assert_eq!(entries[1].content, "");
    }

    #[test]
    fn test_non_matching_bold_ignored() {
        let entries = parse_timeline(
            "<b>Note</b> header-less text <b>2025/01/07 17:45 EDITED by Alice</b> see <b>important</b> tail",
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, ActionKind::Edited);
        // Any bold node ends the walk, matching or not
        assert_eq!(entries[0].content, "see");
    }

    #[test]
    fn test_containers_contribute_full_text() {
        let entries = parse_timeline(
            "<b>2025/01/07 17:45 EDITED by Alice</b><div>Stack:<span> frame 1</span></div><pre>ERR-500\nat x</pre>",
        );
        assert_eq!(entries[0].content, "Stack: frame 1\nERR-500\nat x");
    }

    #[test]
    fn test_preformatted_indentation_kept() {
        let entries = parse_timeline(
            "<b>2025/01/07 17:45 EDITED by Alice</b>Trace:<pre>Exception\n    at Foo.bar()\n    at Baz.qux()</pre>",
        );
        assert_eq!(
            entries[0].content,
            "Trace:\nException\n    at Foo.bar()\n    at Baz.qux()"
        );
    }

    #[test]
    fn test_wrapper_with_next_header_ends_entry() {
        let entries = parse_timeline(
            "<b>2025/01/07 17:45 OPENED by Alice</b> hello\
             <div><b>2025/01/07 18:00 RESOLVED by CData Japan Support</b> fixed</div>",
        );
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].content, "hello");
        assert_eq!(entries[1].content, "fixed");
    }

    #[test]
    fn test_invalid_timestamp_skips_entry_only() {
        let entries = parse_timeline(
            "<b>2025/13/40 17:45 OPENED by Alice</b> a <b>2025/01/08 09:00 CLOSED by Support</b> b",
        );
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, ActionKind::Closed);
    }

    #[test]
    fn test_no_headers_is_empty() {
        assert!(parse_timeline("<p>plain text only</p>").is_empty());
        assert!(parse_timeline("").is_empty());
    }

    #[test]
    fn test_sample_detail_in_document_order() {
        let entries = parse_timeline(SAMPLE_DETAIL);
        let actions: Vec<ActionKind> = entries.iter().map(|e| e.action).collect();
        assert_eq!(
            actions,
            vec![ActionKind::Opened, ActionKind::Assigned, ActionKind::Edited, ActionKind::Resolved]
        );
        assert!(entries.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }
}
