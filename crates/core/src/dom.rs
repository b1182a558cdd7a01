//! Helpers over the owned `scraper` tree.
//!
//! Every invocation parses the caller's snippet into a fresh [`Html`] tree,
//! which is the pipeline's private copy. Nothing here ever sees the caller's
//! original markup again.

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Node};

/// Tags that start a new block in flow layout.
pub(crate) const BLOCK_TAGS: &[&str] = &[
	"address",
	"article",
	"aside",
	"blockquote",
	"body",
	"dd",
	"details",
	"div",
	"dl",
	"dt",
	"figcaption",
	"figure",
	"footer",
	"h1",
	"h2",
	"h3",
	"h4",
	"h5",
	"h6",
	"header",
	"hr",
	"html",
	"li",
	"main",
	"nav",
	"ol",
	"p",
	"pre",
	"section",
	"summary",
	"table",
	"td",
	"th",
	"tr",
	"ul",
];

pub(crate) fn is_block_tag(name: &str) -> bool {
	BLOCK_TAGS.contains(&name)
}

/// Parses a response-container snippet into an owned tree.
pub fn parse_fragment(html: &str) -> Html {
	Html::parse_fragment(html)
}

/// The element standing for the caller's container inside a parsed fragment.
///
/// Fragments are wrapped in a synthetic `<html>` element; when the snippet
/// consists of exactly one element (ignoring whitespace) that element is the
/// container, otherwise the wrapper is.
pub fn container(html: &Html) -> ElementRef<'_> {
	let root = html.root_element();
	let mut elements = root.children().filter_map(ElementRef::wrap);
	let stray_text = root.children().any(|child| matches!(child.value(), Node::Text(t) if !t.trim().is_empty()));

	match (elements.next(), elements.next()) {
		(Some(only), None) if !stray_text => only,
		_ => root,
	}
}

/// Lower-cased `class` attribute, empty when absent.
pub(crate) fn class_attr(el: ElementRef<'_>) -> String {
	el.value().attr("class").unwrap_or_default().to_lowercase()
}

/// Whether any needle occurs as a substring of the element's class attribute.
pub(crate) fn class_contains<S: AsRef<str>>(el: ElementRef<'_>, needles: &[S]) -> bool {
	let class = class_attr(el);
	!class.is_empty() && needles.iter().any(|n| class.contains(n.as_ref()))
}

/// Whether the element carries one of the exact class tokens.
pub(crate) fn has_class_token<S: AsRef<str>>(el: ElementRef<'_>, tokens: &[S]) -> bool {
	let class = class_attr(el);
	class.split_whitespace().any(|c| tokens.iter().any(|t| t.as_ref() == c))
}

/// Element ancestors, nearest first, bounded by `depth`.
pub(crate) fn ancestors(el: ElementRef<'_>, depth: usize) -> impl Iterator<Item = ElementRef<'_>> {
	el.ancestors().filter_map(ElementRef::wrap).take(depth)
}

/// Raw concatenated text of all descendant text nodes.
pub(crate) fn raw_text(el: ElementRef<'_>) -> String {
	el.text().collect()
}

/// Text with runs of whitespace collapsed to single spaces and trimmed.
pub(crate) fn visible_text(el: ElementRef<'_>) -> String {
	collapse_spaces(&raw_text(el))
}

pub(crate) fn collapse_spaces(text: &str) -> String {
	text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Finds the first descendant element (depth-first, self excluded) matching `pred`.
pub(crate) fn find_descendant<'a>(el: ElementRef<'a>, pred: impl Fn(ElementRef<'a>) -> bool) -> Option<ElementRef<'a>> {
	el.descendants().skip(1).filter_map(ElementRef::wrap).find(|d| pred(*d))
}

/// Element children of `el`.
pub(crate) fn element_children(el: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
	el.children().filter_map(ElementRef::wrap)
}

/// Detaches every listed node from the tree and returns how many ids resolved.
pub(crate) fn detach_all(html: &mut Html, ids: &[NodeId]) -> usize {
	let mut removed = 0;
	for id in ids {
		if let Some(mut node) = html.tree.get_mut(*id) {
			node.detach();
			removed += 1;
		}
	}
	removed
}

/// Serializes the children of the container back to markup.
pub(crate) fn inner_markup(html: &Html) -> String {
	html.root_element().inner_html()
}
