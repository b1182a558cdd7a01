//! Fallback walker for markup without a usable semantic structure.
//!
//! Text is grouped into lines by its nearest block ancestor, list items get
//! a textual marker, and the resulting lines are handed to
//! [`infer_blocks`](crate::infer::infer_blocks). Only code, headings, tables
//! and display math survive as structure from the markup itself.

use scraper::{ElementRef, Node};
use tracing::trace;

use super::inline::{is_display_math, is_math, latex_source, runs};
use super::semantic::{code_block, table_block};
use super::{GENERIC_KEY, WalkContext};
use crate::clean::clean_text;
use crate::document::{Block, Document};
use crate::dom::{collapse_spaces, element_children, is_block_tag};
use crate::error::Result;
use crate::infer::infer_blocks;

/// Text-first walker registered for every site.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericWalker;

impl GenericWalker {
	pub fn walk(&self, node: ElementRef<'_>, ctx: &WalkContext) -> Result<Document> {
		let mut scan = Scan::new(ctx);
		scan.children(node)?;
		let blocks = scan.finish();
		trace!(target = "chx.walker", walker = GENERIC_KEY, blocks = blocks.len(), "generic walk finished");
		Ok(Document::new(blocks))
	}
}

struct Scan<'c> {
	ctx: &'c WalkContext,
	blocks: Vec<Block>,
	lines: Vec<String>,
	line: String,
	/// List marker waiting for the first text of the current item.
	marker: Option<String>,
}

impl<'c> Scan<'c> {
	fn new(ctx: &'c WalkContext) -> Self {
		Self {
			ctx,
			blocks: Vec::new(),
			lines: Vec::new(),
			line: String::new(),
			marker: None,
		}
	}

	fn children(&mut self, el: ElementRef<'_>) -> Result<()> {
		for child in el.children() {
			match child.value() {
				Node::Text(text) => self.text(text),
				Node::Element(_) => {
					if let Some(child) = ElementRef::wrap(child) {
						self.element(child)?;
					}
				}
				_ => {}
			}
		}
		Ok(())
	}

	fn element(&mut self, el: ElementRef<'_>) -> Result<()> {
		self.ctx.checkpoint(GENERIC_KEY)?;

		if is_math(el) {
			if is_display_math(el) {
				self.push(Block::MathFormula {
					latex: latex_source(el),
					display_mode: true,
				});
			} else {
				self.text(&format!("${}$", latex_source(el)));
			}
			return Ok(());
		}

		let name = el.value().name();
		match name {
			"h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
				let level = name[1..].parse().unwrap_or(1);
				self.push(Block::heading(level, runs(el)));
			}
			"pre" => self.push(code_block(el)),
			"table" => self.push(table_block(el, &[])),
			"blockquote" => self.push(Block::Blockquote { runs: runs(el) }),
			"hr" => self.push(Block::HorizontalRule),
			"br" => self.end_line(),
			"li" => {
				self.end_line();
				self.marker = Some(item_marker(el));
				self.children(el)?;
				self.end_line();
				self.marker = None;
			}
			"img" | "video" | "audio" | "canvas" | "iframe" | "input" | "textarea" | "select" | "button" => {}
			_ if is_block_tag(name) => {
				self.end_line();
				self.children(el)?;
				self.end_line();
			}
			_ => self.children(el)?,
		}
		Ok(())
	}

	fn text(&mut self, text: &str) {
		let collapsed = collapse_spaces(text);
		if collapsed.is_empty() {
			if !self.line.is_empty() && text.chars().any(char::is_whitespace) {
				self.line.push(' ');
			}
			return;
		}
		if self.line.trim().is_empty() {
			self.line.clear();
			if let Some(marker) = self.marker.take() {
				self.line.push_str(&marker);
			}
		} else if text.starts_with(char::is_whitespace) && !self.line.ends_with(' ') {
			self.line.push(' ');
		}
		self.line.push_str(&collapsed);
		if text.ends_with(char::is_whitespace) {
			self.line.push(' ');
		}
	}

	fn end_line(&mut self) {
		let line = std::mem::take(&mut self.line);
		let line = line.trim();
		if !line.is_empty() {
			self.lines.push(line.to_string());
		}
	}

	/// Infers blocks for the lines gathered so far.
	fn flush_lines(&mut self) {
		self.end_line();
		if self.lines.is_empty() {
			return;
		}
		let lines = std::mem::take(&mut self.lines);
		let text = lines.join("\n");
		let text = if self.ctx.strip_follow_ups { clean_text(&text, &self.ctx.rules) } else { text };
		let lines: Vec<&str> = text.lines().collect();
		self.blocks.extend(infer_blocks(&lines));
	}

	fn push(&mut self, block: Block) {
		self.flush_lines();
		self.blocks.push(block);
	}

	fn finish(mut self) -> Vec<Block> {
		self.flush_lines();
		self.blocks
	}
}

/// `"n. "` for ordered parents, a bullet otherwise.
fn item_marker(li: ElementRef<'_>) -> String {
	let parent = li.parent().and_then(ElementRef::wrap);
	match parent {
		Some(list) if list.value().name() == "ol" => {
			let start = list.value().attr("start").and_then(|s| s.trim().parse::<usize>().ok()).unwrap_or(1);
			let index = element_children(list)
				.filter(|c| c.value().name() == "li")
				.position(|c| c.id() == li.id())
				.unwrap_or(0);
			format!("{}. ", start + index)
		}
		_ => "• ".to_string(),
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::*;
	use crate::config::Rules;
	use crate::document::{Run, runs_text};
	use crate::dom::{container, parse_fragment};

	fn walk(html: &str, strip_follow_ups: bool) -> Vec<Block> {
		let doc = parse_fragment(html);
		let mut ctx = WalkContext::new(Arc::new(Rules::builtin().clone()));
		ctx.strip_follow_ups = strip_follow_ups;
		GenericWalker.walk(container(&doc), &ctx).expect("walk").normalize().blocks
	}

	#[test]
	fn flat_lines_are_reclassified() {
		let blocks = walk("<div><div>## 总结</div><div>1. 第一项</div><div>2. 第二项</div><div>这是一个普通的段落。</div></div>", true);
		assert_eq!(
			blocks,
			vec![
				Block::heading(2, vec![Run::plain("总结")]),
				Block::List {
					ordered: true,
					items: vec![vec![Block::paragraph("第一项")], vec![Block::paragraph("第二项")]],
					level: 0,
				},
				Block::paragraph("这是一个普通的段落。"),
			]
		);
	}

	#[test]
	fn list_items_get_textual_markers() {
		let blocks = walk("<section><ul><li>苹果</li><li><span>香</span><span>蕉</span></li></ul></section>", true);
		assert_eq!(
			blocks,
			vec![Block::List {
				ordered: false,
				items: vec![vec![Block::paragraph("苹果")], vec![Block::paragraph("香蕉")]],
				level: 0,
			}]
		);
	}

	#[test]
	fn ordered_items_respect_start() {
		let doc = parse_fragment(r#"<ol start="3"><li>a</li><li>b</li></ol>"#);
		let items: Vec<String> = container(&doc).children().filter_map(ElementRef::wrap).map(item_marker).collect();
		assert_eq!(items, vec!["3. ", "4. "]);
	}

	#[test]
	fn follow_up_questions_are_stripped_when_enabled() {
		let html = "<div><p>这是主要回答内容，足够长以便算作正文内容了吧。</p><p>如何提高代码的运行效率呢？</p><p>为什么这个算法更快一些呢？</p></div>";
		assert_eq!(walk(html, true), vec![Block::paragraph("这是主要回答内容，足够长以便算作正文内容了吧。")]);
		assert_eq!(walk(html, false).len(), 3);
	}

	#[test]
	fn code_and_display_math_keep_structure() {
		let html = r#"<div><p>示例：</p><pre><code>let x = 1;
let y = 2;</code></pre><div class="math-display" data-latex="x^2">x2</div><p>完</p></div>"#;
		let blocks = walk(html, true);
		assert_eq!(blocks[1], Block::CodeBlock { text: "let x = 1;\nlet y = 2;".into() });
		assert_eq!(
			blocks[2],
			Block::MathFormula {
				latex: "x^2".into(),
				display_mode: true,
			}
		);
		assert!(matches!(&blocks[3], Block::Paragraph { runs } if runs_text(runs) == "完"));
	}

	#[test]
	fn inline_text_joins_across_elements() {
		let blocks = walk("<p>Hello <b>brave</b> new <i>world</i></p>", true);
		assert_eq!(blocks, vec![Block::paragraph("Hello brave new world")]);
	}
}
