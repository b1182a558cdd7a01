//! Plain-text rendering and markdown token stripping.

use std::sync::LazyLock;

use ego_tree::NodeRef;
use regex::Regex;
use scraper::{Html, Node};

use crate::document::{Block, Document, runs_text};
use crate::dom::is_block_tag;

static IMAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]*\)").expect("IMAGE should compile"));
static LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").expect("LINK should compile"));
static HEADING_MARK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[\s&&[^\n]]*(?:#+[ \t]*)+").expect("HEADING_MARK should compile"));
static QUOTE_MARK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^([ \t]*)>[ \t]?").expect("QUOTE_MARK should compile"));
static BULLET_MARK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^([ \t]*)[-*+][ \t]+").expect("BULLET_MARK should compile"));
static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*\n]+)\*").expect("EMPHASIS should compile"));
static UNDERSCORE_EMPHASIS: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"(^|[\s(])_([^_\n]+)_([\s).,!?]|$)").expect("UNDERSCORE_EMPHASIS should compile"));
static MULTI_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t\x{A0}\x{3000}]+").expect("MULTI_SPACE should compile"));
static BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{4,}").expect("BLANK_RUN should compile"));

const RULE_TEXT: &str = "————————";

/// Renders a document to normalized plain text.
pub fn document_to_text(doc: &Document) -> String {
	let mut parts = Vec::new();
	for block in &doc.blocks {
		parts.push(block_text(block, 0));
	}
	finish(&parts.join("\n\n"))
}

fn block_text(block: &Block, depth: usize) -> String {
	match block {
		Block::Heading { runs, .. } | Block::Paragraph { runs } | Block::Blockquote { runs } => runs_text(runs),
		Block::List { ordered, items, .. } => {
			let indent = "  ".repeat(depth);
			let mut lines = Vec::new();
			for (idx, item) in items.iter().enumerate() {
				let marker = if *ordered { format!("{}. ", idx + 1) } else { "• ".to_string() };
				let mut first = true;
				for child in item {
					match child {
						Block::List { .. } => lines.push(block_text(child, depth + 1)),
						_ if first => lines.push(format!("{indent}{marker}{}", block_text(child, depth))),
						_ => lines.push(format!("{indent}  {}", block_text(child, depth))),
					}
					first = false;
				}
			}
			lines.join("\n")
		}
		Block::CodeBlock { text } => text.trim_end().to_string(),
		Block::Table { rows } => rows
			.iter()
			.map(|row| row.iter().map(|cell| runs_text(&cell.runs)).collect::<Vec<_>>().join("\t"))
			.collect::<Vec<_>>()
			.join("\n"),
		Block::MathFormula { latex, display_mode: true } => format!("$${latex}$$"),
		Block::MathFormula { latex, display_mode: false } => format!("${latex}$"),
		Block::HorizontalRule => RULE_TEXT.to_string(),
	}
}

/// Extracts readable text from markup, skipping styles and the document head.
pub fn html_to_text(html: &str) -> String {
	let doc = Html::parse_document(html);
	let mut out = String::new();
	collect_text(*doc.root_element(), &mut out, &mut Vec::new());
	finish(&out)
}

fn newline(out: &mut String) {
	if !out.is_empty() && !out.ends_with('\n') {
		out.push('\n');
	}
}

fn blank_line(out: &mut String) {
	newline(out);
	if !out.is_empty() && !out.ends_with("\n\n") {
		out.push('\n');
	}
}

/// `lists` holds one counter per open list, `None` for unordered lists.
fn collect_text(node: NodeRef<'_, Node>, out: &mut String, lists: &mut Vec<Option<usize>>) {
	for child in node.children() {
		match child.value() {
			Node::Text(text) => {
				if text.trim().is_empty() && (out.is_empty() || out.ends_with('\n')) {
					continue;
				}
				out.push_str(&text.replace('\n', " "));
			}
			Node::Element(el) => {
				let name = el.name();
				match name {
					"style" | "script" | "head" | "title" | "template" => continue,
					"br" => {
						out.push('\n');
						continue;
					}
					_ => {}
				}

				let block = is_block_tag(name);
				if block {
					newline(out);
				}
				match name {
					"ol" => lists.push(Some(0)),
					"ul" => lists.push(None),
					"li" => {
						let indent = "  ".repeat(lists.len().saturating_sub(1));
						match lists.last_mut() {
							Some(Some(n)) => {
								*n += 1;
								out.push_str(&format!("{indent}{n}. "));
							}
							_ => out.push_str(&format!("{indent}• ")),
						}
					}
					"td" | "th" => out.push('\t'),
					_ => {}
				}

				collect_text(child, out, lists);

				if matches!(name, "ol" | "ul") {
					lists.pop();
				}
				if matches!(name, "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "blockquote" | "pre" | "table") {
					blank_line(out);
				} else if block {
					newline(out);
				}
			}
			_ => {}
		}
	}
}

/// Removes inline markdown syntax: emphasis, strike, code, links, images,
/// heading hashes, quote markers and `-`/`*`/`+` bullets.
pub fn strip_markdown(text: &str) -> String {
	let mut s = IMAGE.replace_all(text, "$1").into_owned();
	s = LINK.replace_all(&s, "$1").into_owned();
	s = remove_tokens(remove_line_marks(s));
	s = EMPHASIS.replace_all(&s, "$1").into_owned();
	s = UNDERSCORE_EMPHASIS.replace_all(&s, "$1$2$3").into_owned();
	loop {
		let next = remove_tokens(remove_line_marks(s.clone()));
		if next == s {
			return s;
		}
		s = next;
	}
}

/// Strips leading heading, quote and bullet marks until no line starts with one.
fn remove_line_marks(mut s: String) -> String {
	loop {
		let mut next = HEADING_MARK.replace_all(&s, "").into_owned();
		next = QUOTE_MARK.replace_all(&next, "$1").into_owned();
		next = BULLET_MARK.replace_all(&next, "$1").into_owned();
		if next == s {
			return s;
		}
		s = next;
	}
}

/// Removing one token can join the halves of another, so repeat until stable.
fn remove_tokens(mut s: String) -> String {
	loop {
		let next = s.replace('`', "").replace("~~", "").replace("**", "").replace("__", "");
		if next == s {
			return s;
		}
		s = next;
	}
}

/// Normalizes line endings and whitespace.
///
/// Spaces collapse within a line, line breaks are kept, and three or more
/// consecutive blank lines become one.
pub fn normalize_text(text: &str) -> String {
	let text = text.replace("\r\n", "\n").replace('\r', "\n");
	let lines: Vec<String> = text.lines().map(|line| MULTI_SPACE.replace_all(line, " ").trim().to_string()).collect();
	let joined = lines.join("\n");
	BLANK_RUN.replace_all(&joined, "\n\n").trim().to_string()
}

fn finish(text: &str) -> String {
	normalize_text(&strip_markdown(text))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::document::Run;

	#[test]
	fn strips_inline_markdown() {
		let text = "## Title\n**bold** and `code` and ~~gone~~\n> quoted\n- item\n[link](https://x.dev) ![alt](a.png)";
		assert_eq!(strip_markdown(text), "Title\nbold and code and gone\nquoted\nitem\nlink alt");
	}

	#[test]
	fn stripping_reaches_a_fixed_point() {
		let out = strip_markdown("a *~~* b ~`~ c");
		assert!(!out.contains("**"));
		assert!(!out.contains("~~"));
		assert!(!out.contains('`'));
	}

	#[test]
	fn snake_case_survives() {
		assert_eq!(strip_markdown("call my_fn_name now"), "call my_fn_name now");
	}

	#[test]
	fn normalizes_whitespace_and_blank_runs() {
		assert_eq!(normalize_text("a  \t b\r\n\r\n\r\n\r\n\r\nc"), "a b\n\nc");
		assert_eq!(normalize_text("x\n\ny"), "x\n\ny");
	}

	#[test]
	fn lists_use_bullets_and_numbers() {
		let doc = Document::new(vec![
			Block::List {
				ordered: true,
				items: vec![vec![Block::paragraph("one")], vec![Block::paragraph("two")]],
				level: 0,
			},
			Block::List {
				ordered: false,
				items: vec![vec![Block::paragraph("dot")]],
				level: 0,
			},
		]);
		assert_eq!(document_to_text(&doc), "1. one\n2. two\n\n• dot");
	}

	#[test]
	fn html_text_skips_head_and_style() {
		let html = "<html><head><title>t</title><style>p{color:red}</style></head><body><p>Hello&nbsp;&amp; world</p><ol><li>a</li><li>b</li></ol></body></html>";
		assert_eq!(html_to_text(html), "Hello & world\n\n1. a\n2. b");
	}

	#[test]
	fn heading_hashes_never_lead_a_line() {
		let doc = Document::new(vec![Block::CodeBlock {
			text: "#include <stdio.h>\n  # comment".into(),
		}]);
		let text = document_to_text(&doc);
		assert!(text.lines().all(|line| !line.starts_with('#')));
	}

	#[test]
	fn paragraph_runs_concatenate() {
		let doc = Document::new(vec![Block::Paragraph {
			runs: vec![Run::plain("a "), Run::plain("b")],
		}]);
		assert_eq!(document_to_text(&doc), "a b");
	}

	#[test]
	fn stacked_heading_marks_are_fully_removed() {
		let doc = Document::new(vec![
			Block::paragraph("# # # x"),
			Block::CodeBlock {
				text: "# # # comment\n> # - # nested".into(),
			},
		]);
		let text = document_to_text(&doc);
		assert_eq!(text, "x\n\ncomment\nnested");
		assert!(text.lines().all(|line| !line.starts_with('#')));

		let text = html_to_text("<p># # # x</p><pre>`# ## ### y</pre>");
		assert!(text.lines().all(|line| !line.trim_start().starts_with('#')), "{text}");
	}
}
