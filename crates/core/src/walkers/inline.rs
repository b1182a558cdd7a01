//! Inline run collection shared by the walkers.

use std::sync::LazyLock;

use ego_tree::NodeRef;
use regex::Regex;
use scraper::{ElementRef, Node};

use crate::document::{Link, Run};
use crate::dom::{class_contains, find_descendant, has_class_token, visible_text};

static COLOR: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)(?:^|;)\s*color\s*:\s*(#[0-9a-f]{6}\b|#[0-9a-f]{3}\b|rgba?\(\s*\d{1,3}\s*,\s*\d{1,3}\s*,\s*\d{1,3}[^)]*\))").expect("COLOR should compile")
});
static RGB_PART: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{1,3}").expect("RGB_PART should compile"));

/// Math container vocabulary understood by every walker.
pub(crate) const MATH_CLASSES: &[&str] = &["katex", "katex-display", "math-inline", "math-block", "math-display", "mathjax"];
/// Subset of [`MATH_CLASSES`] rendered as display formulas.
pub(crate) const DISPLAY_MATH_CLASSES: &[&str] = &["katex-display", "math-block", "math-display"];

#[derive(Debug, Clone, Default)]
struct Style {
	bold: bool,
	italic: bool,
	code: bool,
	underline: bool,
	link: Option<Link>,
	color: Option<String>,
}

impl Style {
	fn run(&self, text: String) -> Run {
		Run {
			text,
			bold: self.bold,
			italic: self.italic,
			code: self.code,
			underline: self.underline,
			link: self.link.clone(),
			color: self.color.clone(),
		}
	}

	fn apply(&self, el: ElementRef<'_>) -> Style {
		let mut next = self.clone();
		match el.value().name() {
			"strong" | "b" => next.bold = true,
			"em" | "i" | "cite" => next.italic = true,
			"code" | "kbd" | "samp" | "tt" => next.code = true,
			"u" | "ins" => next.underline = true,
			"a" => {
				if let Some(href) = el.value().attr("href").map(str::trim).filter(|h| !h.is_empty()) {
					next.link = Some(Link {
						href: href.to_string(),
						title: el.value().attr("title").map(str::to_string),
					});
				}
			}
			_ => {}
		}
		if let Some(color) = el.value().attr("style").and_then(parse_color) {
			next.color = Some(color);
		}
		next
	}
}

pub(crate) fn is_math(el: ElementRef<'_>) -> bool {
	has_class_token(el, MATH_CLASSES)
}

pub(crate) fn is_display_math(el: ElementRef<'_>) -> bool {
	has_class_token(el, DISPLAY_MATH_CLASSES) || (el.value().name() == "div" && is_math(el))
}

/// LaTeX source of a math container.
///
/// Prefers the TeX annotation rendered alongside MathML, then explicit data
/// attributes, then the rendered text of the visual layer.
pub(crate) fn latex_source(el: ElementRef<'_>) -> String {
	let annotation = find_descendant(el, |d| {
		d.value().name() == "annotation" && d.value().attr("encoding").is_some_and(|enc| enc.to_ascii_lowercase().contains("tex"))
	});
	if let Some(annotation) = annotation {
		return annotation.text().collect::<String>().trim().to_string();
	}

	for attr in ["data-latex", "data-custom-copy-text", "data-tex"] {
		let value = std::iter::once(el)
			.chain(el.descendants().filter_map(ElementRef::wrap))
			.find_map(|d| d.value().attr(attr));
		if let Some(value) = value {
			return value.trim().trim_matches('$').trim().to_string();
		}
	}

	let visual = find_descendant(el, |d| has_class_token(d, &["katex-html"])).unwrap_or(el);
	visible_text(visual)
}

/// `#RRGGBB`-style colour from an inline style, without the `#`.
pub(crate) fn parse_color(style: &str) -> Option<String> {
	let value = COLOR.captures(style)?.get(1)?.as_str().to_ascii_uppercase();
	if let Some(hex) = value.strip_prefix('#') {
		return Some(match hex.len() {
			3 => hex.chars().flat_map(|c| [c, c]).collect(),
			_ => hex.to_string(),
		});
	}
	let parts: Vec<u8> = RGB_PART.find_iter(&value).take(3).filter_map(|m| m.as_str().parse().ok()).collect();
	match parts.as_slice() {
		[r, g, b] => Some(format!("{r:02X}{g:02X}{b:02X}")),
		_ => None,
	}
}

/// Styled runs for the descendants of `el`, whitespace collapsed outside code.
pub(crate) fn runs(el: ElementRef<'_>) -> Vec<Run> {
	runs_except(el, &[])
}

/// Like [`runs`], pruning descendants whose class contains one of `skip`.
pub(crate) fn runs_except(el: ElementRef<'_>, skip: &[&str]) -> Vec<Run> {
	let mut out = Vec::new();
	let style = Style::default().apply(el);
	collect(*el, &style, skip, &mut out);
	out
}

/// Runs for a single inline element including its own styling.
pub(crate) fn element_runs(el: ElementRef<'_>, skip: &[&str], out: &mut Vec<Run>) {
	if is_math(el) {
		out.push(Run::plain(format!("${}$", latex_source(el))));
		return;
	}
	if el.value().name() == "br" {
		out.push(Run::plain("\n"));
		return;
	}
	let style = Style::default().apply(el);
	collect(*el, &style, skip, out);
}

pub(crate) fn text_run(text: &str) -> Run {
	Run::plain(collapse(text))
}

fn collect(node: NodeRef<'_, Node>, style: &Style, skip: &[&str], out: &mut Vec<Run>) {
	for child in node.children() {
		match child.value() {
			Node::Text(text) => {
				let text = if style.code { text.to_string() } else { collapse(text) };
				if !text.is_empty() {
					out.push(style.run(text));
				}
			}
			Node::Element(_) => {
				let Some(el) = ElementRef::wrap(child) else {
					continue;
				};
				if class_contains(el, skip) {
					continue;
				}
				if el.value().name() == "br" {
					out.push(style.run("\n".to_string()));
					continue;
				}
				if is_math(el) {
					out.push(style.run(format!("${}$", latex_source(el))));
					continue;
				}
				collect(child, &style.apply(el), skip, out);
			}
			_ => {}
		}
	}
}

/// Collapses whitespace runs to one space, keeping a single leading or
/// trailing space so words from adjacent nodes stay separated.
fn collapse(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	let mut in_space = false;
	for ch in text.chars() {
		if ch.is_whitespace() {
			if !in_space {
				out.push(' ');
			}
			in_space = true;
		} else {
			out.push(ch);
			in_space = false;
		}
	}
	out
}
