//! Read-only view over parsed detail markup.
//!
//! Exposes just what the extractor, cleaner and timeline parser need: node
//! kind, text content, and ordered child / following-sibling traversal.
//! Backed by `scraper` (html5ever), so malformed export markup still yields a tree.

use scraper::{ElementRef, Html};

/// Coarse classification of a markup node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// `<br>`
    LineBreak,
    /// `<b>`, `<strong>` — timeline headers live here.
    Bold,
    /// Paragraphs, list items, divs, rows, headings.
    Block,
    /// `<pre>`, `<code>` — logs and stack traces.
    Preformatted,
    /// `<script>`, `<style>`, `<head>`: never rendered.
    Skipped,
    /// Any other element (span, a, font, td, ...).
    Inline,
    Text,
    /// Comments, doctype, processing instructions.
    Other,
}

/// One node of the markup tree.
#[derive(Debug, Clone, Copy)]
pub enum MarkupNode<'a> {
    Element(ElementRef<'a>),
    Text(&'a str),
    Other,
}

impl<'a> MarkupNode<'a> {
    fn from_parts(element: Option<ElementRef<'a>>, text: Option<&'a str>) -> Self {
        match (element, text) {
            (Some(el), _) => Self::Element(el),
            (None, Some(t)) => Self::Text(t),
            (None, None) => Self::Other,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Element(el) => element_kind(el.value().name()),
            Self::Text(_) => NodeKind::Text,
            Self::Other => NodeKind::Other,
        }
    }

    /// Full text content (all descendant text for elements).
    pub fn text(&self) -> String {
        match self {
            Self::Element(el) => text_of(*el),
            Self::Text(t) => (*t).to_string(),
            Self::Other => String::new(),
        }
    }

    pub fn element(&self) -> Option<ElementRef<'a>> {
        match self {
            Self::Element(el) => Some(*el),
            _ => None,
        }
    }
}

pub fn element_kind(name: &str) -> NodeKind {
    match name {
        "br" => NodeKind::LineBreak,
        "b" | "strong" => NodeKind::Bold,
        "p" | "li" | "div" | "tr" | "ul" | "ol" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            NodeKind::Block
        }
        "pre" | "code" => NodeKind::Preformatted,
        "script" | "style" | "head" => NodeKind::Skipped,
        _ => NodeKind::Inline,
    }
}

/// Parse a full export document.
pub fn parse_document(html: &str) -> Html {
    Html::parse_document(html)
}

/// Parse a markup fragment such as one detail cell.
pub fn parse_fragment(markup: &str) -> Html {
    Html::parse_fragment(markup)
}

/// Direct children, in document order.
pub fn children<'a>(el: ElementRef<'a>) -> impl Iterator<Item = MarkupNode<'a>> + 'a {
    el.children().map(|node| {
        MarkupNode::from_parts(ElementRef::wrap(node), node.value().as_text().map(|t| &**t))
    })
}

/// Siblings after `el`, in document order.
pub fn following_siblings<'a>(el: ElementRef<'a>) -> impl Iterator<Item = MarkupNode<'a>> + 'a {
    el.next_siblings().map(|node| {
        MarkupNode::from_parts(ElementRef::wrap(node), node.value().as_text().map(|t| &**t))
    })
}

/// All descendant elements of `root` (excluding `root`), in document order.
pub fn descendant_elements<'a>(root: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    root.descendants().skip(1).filter_map(ElementRef::wrap)
}

/// Direct child elements named `name`.
pub fn child_elements<'a>(
    el: ElementRef<'a>,
    name: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    el.children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == name)
}

/// First descendant element named `name`.
pub fn find_first<'a>(root: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    descendant_elements(root).find(|el| el.value().name() == name)
}

pub fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// Text pieces trimmed and concatenated, the way export cells are read.
pub fn stripped_text(el: ElementRef<'_>) -> String {
    el.text().map(str::trim).filter(|t| !t.is_empty()).collect()
}
