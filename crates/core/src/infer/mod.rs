//! Pattern-based reclassification of flat text lines.
//!
//! Lines are classified in a fixed order: quote lead-ins first, then
//! headings, then list items, then arithmetic quotes, and everything else is
//! a paragraph. Contiguous list items are grouped into one list whose
//! `ordered` flag is the strict majority of its items' markers.

mod patterns;

use crate::document::{Block, Run};
use crate::render::html::blocks_to_html;

pub use patterns::MarkerKind;
use patterns::{ARITHMETIC, HEADING_ROWS, HeadingLevel, LABEL_COLON_EXCLUSIONS, LIST_ROWS, QUOTE_LEAD_ROWS, first_match};

/// Headings longer than this are always ordinary sentences.
const HEADING_MAX_CHARS: usize = 100;

/// Category assigned to a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
	Heading(u8),
	ListItem(MarkerKind),
	Quote,
	Paragraph,
}

/// Marker kind of a list item line, if the line starts like one.
pub fn list_marker(text: &str) -> Option<MarkerKind> {
	list_match(text).map(|(kind, _)| kind)
}

fn list_match(text: &str) -> Option<(MarkerKind, Option<usize>)> {
	let (row, end) = first_match(&LIST_ROWS, text)?;
	if row.name == "label-colon" && LABEL_COLON_EXCLUSIONS.is_match(text) {
		return None;
	}
	Some((row.payload, end))
}

pub fn is_list_item_start(text: &str) -> bool {
	list_marker(text).is_some()
}

/// Heading level for `text`, or `None` when it is not heading-shaped.
pub fn heading_level(text: &str) -> Option<u8> {
	let text = text.trim();
	if text.is_empty() || text.chars().count() > HEADING_MAX_CHARS {
		return None;
	}

	let is_list = is_list_item_start(text);
	HEADING_ROWS.iter().find_map(|row| {
		if row.payload.unless_list && is_list {
			return None;
		}
		let caps = row.regex.captures(text)?;
		Some(match row.payload.level {
			HeadingLevel::Hashes => caps.name("marker").map_or(1, |m| m.as_str().len() as u8),
			HeadingLevel::Fixed(level) => level,
		})
	})
}

pub fn is_heading(text: &str) -> bool {
	heading_level(text).is_some()
}

fn is_quote_lead(text: &str) -> bool {
	QUOTE_LEAD_ROWS.iter().any(|row| row.regex.is_match(text))
}

pub fn is_block_quote(text: &str) -> bool {
	is_quote_lead(text) || ARITHMETIC.is_match(text)
}

/// Classifies one line in precedence order.
pub fn classify_line(text: &str) -> LineKind {
	let text = text.trim();
	if is_quote_lead(text) {
		return LineKind::Quote;
	}
	if let Some(level) = heading_level(text) {
		return LineKind::Heading(level);
	}
	if let Some(kind) = list_marker(text) {
		return LineKind::ListItem(kind);
	}
	if ARITHMETIC.is_match(text) {
		return LineKind::Quote;
	}
	LineKind::Paragraph
}

/// Item text with its recognized marker removed.
pub fn strip_list_marker(text: &str) -> &str {
	let text = text.trim();
	match list_match(text) {
		Some((_, Some(end))) => text[end..].trim_start(),
		_ => text,
	}
}

fn strip_heading_marker(text: &str) -> &str {
	let text = text.trim();
	match first_match(&HEADING_ROWS, text) {
		Some((_, Some(end))) => text[end..].trim_start(),
		_ => text,
	}
}

fn strip_quote_marker(text: &str) -> &str {
	let text = text.trim();
	match first_match(&QUOTE_LEAD_ROWS, text) {
		Some((_, Some(end))) => text[end..].trim_start(),
		_ => text,
	}
}

/// Groups list item lines into one list; `None` when no item has text.
pub fn list_block<S: AsRef<str>>(items: &[S]) -> Option<Block> {
	let items: Vec<&str> = items.iter().map(|s| s.as_ref().trim()).filter(|s| !s.is_empty()).collect();
	if items.is_empty() {
		return None;
	}

	let ordered_votes = items.iter().filter(|item| list_marker(item).is_some_and(MarkerKind::is_ordered)).count();
	let ordered = ordered_votes * 2 > items.len();

	Some(Block::List {
		ordered,
		items: items.iter().map(|item| vec![Block::paragraph(strip_list_marker(item))]).collect(),
		level: 0,
	})
}

fn line_block(text: &str, kind: LineKind) -> Block {
	match kind {
		LineKind::Heading(level) => Block::heading(level, vec![Run::plain(strip_heading_marker(text))]),
		LineKind::Quote => Block::Blockquote {
			runs: vec![Run::plain(strip_quote_marker(text))],
		},
		LineKind::Paragraph | LineKind::ListItem(_) => Block::paragraph(text.trim()),
	}
}

/// Turns flat lines into blocks, grouping contiguous list items.
///
/// Blank lines neither end a list nor produce output.
pub fn infer_blocks<S: AsRef<str>>(lines: &[S]) -> Vec<Block> {
	let mut blocks = Vec::new();
	let mut pending: Vec<&str> = Vec::new();

	for line in lines {
		let line = line.as_ref().trim();
		if line.is_empty() {
			continue;
		}
		match classify_line(line) {
			LineKind::ListItem(_) => pending.push(line),
			kind => {
				blocks.extend(list_block(&pending));
				pending.clear();
				blocks.push(line_block(line, kind));
			}
		}
	}
	blocks.extend(list_block(&pending));
	blocks
}

pub fn generate_list_html<S: AsRef<str>>(items: &[S]) -> String {
	list_block(items).map(|block| blocks_to_html(std::slice::from_ref(&block))).unwrap_or_default()
}

pub fn generate_heading_html(text: &str, level: u8) -> String {
	blocks_to_html(&[Block::heading(level, vec![Run::plain(strip_heading_marker(text))])])
}

pub fn generate_block_quote_html(text: &str) -> String {
	blocks_to_html(&[line_block(text, LineKind::Quote)])
}

pub fn generate_paragraph_html(text: &str) -> String {
	blocks_to_html(&[Block::paragraph(text.trim())])
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn recognizes_list_marker_families() {
		for line in [
			"• 项目",
			"\u{F0A7} wingdings bullet",
			"- dash item",
			"1. first",
			"2、第二",
			"3）第三",
			"(4) fourth",
			"① 圈号",
			"a. letter",
			"(b) letter",
			"iv. roman",
			"一、中文序号",
			"（二）中文括号",
			"优点：速度快",
			"Pros: fast",
			"作者：张三",
		] {
			assert!(is_list_item_start(line), "{line} should start a list item");
		}
	}

	#[test]
	fn rejects_non_list_lines() {
		for line in ["3.14 是圆周率", "访问 https://example.com 获取", "10:30 开会", "普通的一句话。", "5000 - 2000 = 3000元"] {
			assert!(!is_list_item_start(line), "{line} should not start a list item");
		}
	}

	#[test]
	fn heading_shapes() {
		assert_eq!(heading_level("## 安装步骤"), Some(2));
		assert_eq!(heading_level("第三章 总结"), Some(2));
		assert_eq!(heading_level("🚀 快速开始"), Some(2));
		assert_eq!(heading_level("1. 安装 (Installation)"), Some(2));
		assert_eq!(heading_level("主要特性："), Some(3));
		assert_eq!(heading_level("什么是所有权？"), Some(3));
	}

	#[test]
	fn long_lines_are_never_headings() {
		let line = format!("{}：", "很长的标题".repeat(25));
		assert!(!is_heading(&line));
		assert!(!is_heading(&format!("## {}", "x".repeat(120))));
	}

	#[test]
	fn list_markers_suppress_short_headings() {
		assert!(!is_heading("- 优点："));
		assert!(!is_heading("1. 为什么？"));
	}

	#[test]
	fn block_quote_triggers() {
		assert!(is_block_quote("5000 - 2000 = 3000元"));
		assert!(is_block_quote("注意：不要在生产环境运行"));
		assert!(is_block_quote("> quoted"));
		assert!(is_block_quote("「知之为知之」"));
		assert!(!is_block_quote("普通段落"));
	}

	#[test]
	fn arithmetic_quote_html() {
		assert_eq!(generate_block_quote_html("5000 - 2000 = 3000元"), "<blockquote><p>5000 - 2000 = 3000元</p></blockquote>");
	}

	#[test]
	fn numbered_lines_render_ordered_list() {
		assert_eq!(generate_list_html(&["1. 第一项", "2. 第二项"]), "<ol><li>第一项</li><li>第二项</li></ol>");
	}

	#[test]
	fn majority_decides_ordering() {
		assert!(generate_list_html(&["1. a", "2. b", "- c"]).starts_with("<ol>"));
		assert!(generate_list_html(&["1. a", "- b"]).starts_with("<ul>"));
		assert!(generate_list_html(&["- a", "- b", "3. c"]).starts_with("<ul>"));
	}

	#[test]
	fn item_count_ignores_blank_lines() {
		let html = generate_list_html(&["- a", "", "  ", "- b", "- c"]);
		assert_eq!(html.matches("<li>").count(), 3);
	}

	#[test]
	fn generated_text_is_escaped() {
		assert_eq!(generate_paragraph_html("a < b & c"), "<p>a &lt; b &amp; c</p>");
		assert_eq!(generate_heading_html("## <T>", 2), "<h2>&lt;T&gt;</h2>");
	}

	#[test]
	fn infers_mixed_blocks() {
		let lines = ["## 概述", "Rust 是一门系统编程语言。", "1. 安全", "2. 快速", "", "3. 并发", "注意：需要安装工具链"];
		let blocks = infer_blocks(&lines);
		assert_eq!(blocks.len(), 4);
		assert!(matches!(blocks[0], Block::Heading { level: 2, .. }));
		assert!(matches!(blocks[1], Block::Paragraph { .. }));
		match &blocks[2] {
			Block::List { ordered, items, .. } => {
				assert!(*ordered);
				assert_eq!(items.len(), 3);
			}
			other => panic!("expected list, got {other:?}"),
		}
		assert!(matches!(blocks[3], Block::Blockquote { .. }));
	}
}
