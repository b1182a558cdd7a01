//! Recursive-descent engine shared by every site walker.
//!
//! Dispatches on tag identity. Generic containers are flattened unless the
//! profile marks them as paragraphs; stray inline content is buffered and
//! flushed as a paragraph at the next block boundary.

use scraper::{ElementRef, Node};
use tracing::trace;

use super::inline::{element_runs, is_display_math, is_math, latex_source, runs_except, text_run};
use super::sites::SiteProfile;
use super::WalkContext;
use crate::document::{Block, Cell, Document, Run, normalize_runs, runs_text};
use crate::dom::{class_contains, element_children, find_descendant, is_block_tag};
use crate::error::Result;

/// Accumulates blocks plus the inline content seen since the last block.
#[derive(Default)]
struct Sink {
	blocks: Vec<Block>,
	pending: Vec<Run>,
}

impl Sink {
	fn flush(&mut self) {
		let runs = normalize_runs(std::mem::take(&mut self.pending));
		if !runs.is_empty() {
			self.blocks.push(Block::Paragraph { runs });
		}
	}

	fn push(&mut self, block: Block) {
		self.flush();
		self.blocks.push(block);
	}

	fn finish(mut self) -> Vec<Block> {
		self.flush();
		self.blocks
	}
}

struct Engine<'a> {
	profile: &'static SiteProfile,
	ctx: &'a WalkContext,
}

pub(crate) fn walk(profile: &'static SiteProfile, node: ElementRef<'_>, ctx: &WalkContext) -> Result<Document> {
	let engine = Engine { profile, ctx };
	let mut sink = Sink::default();
	engine.children(node, &mut sink, 0)?;
	let blocks = sink.finish();
	trace!(target = "chx.walker", walker = profile.key, blocks = blocks.len(), "site walk finished");
	Ok(Document::new(blocks))
}

impl Engine<'_> {
	fn children(&self, el: ElementRef<'_>, sink: &mut Sink, depth: u8) -> Result<()> {
		for child in el.children() {
			match child.value() {
				Node::Text(text) => sink.pending.push(text_run(text)),
				Node::Element(_) => {
					if let Some(child) = ElementRef::wrap(child) {
						self.element(child, sink, depth)?;
					}
				}
				_ => {}
			}
		}
		Ok(())
	}

	fn element(&self, el: ElementRef<'_>, sink: &mut Sink, depth: u8) -> Result<()> {
		self.ctx.checkpoint(self.profile.key)?;

		if class_contains(el, self.profile.control_classes) {
			return Ok(());
		}
		if is_math(el) {
			if is_display_math(el) {
				sink.push(Block::MathFormula {
					latex: latex_source(el),
					display_mode: true,
				});
			} else {
				element_runs(el, self.profile.control_classes, &mut sink.pending);
			}
			return Ok(());
		}
		if self.profile.is_code_block(el) {
			sink.push(code_block(el));
			return Ok(());
		}
		if self.profile.is_table_wrapper(el) {
			match find_descendant(el, |d| d.value().name() == "table") {
				Some(table) => sink.push(table_block(table, self.profile.control_classes)),
				None => self.children(el, sink, depth)?,
			}
			return Ok(());
		}

		let name = el.value().name();
		match name {
			"h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
				let level = name[1..].parse().unwrap_or(1);
				sink.push(Block::heading(level, runs_except(el, self.profile.control_classes)));
			}
			"ul" | "ol" => sink.push(self.list(el, depth)?),
			"table" => sink.push(table_block(el, self.profile.control_classes)),
			"pre" => sink.push(code_block(el)),
			"blockquote" => sink.push(Block::Blockquote {
				runs: quote_runs(el, self.profile.control_classes),
			}),
			"hr" => sink.push(Block::HorizontalRule),
			"br" => sink.pending.push(Run::plain("\n")),
			"img" | "video" | "audio" | "canvas" | "iframe" | "input" | "textarea" | "select" | "button" => {}
			_ if self.profile.is_paragraph(el) => sink.push(Block::Paragraph {
				runs: runs_except(el, self.profile.control_classes),
			}),
			_ if is_block_tag(name) || self.has_block_child(el) => {
				sink.flush();
				self.children(el, sink, depth)?;
				sink.flush();
			}
			_ => element_runs(el, self.profile.control_classes, &mut sink.pending),
		}
		Ok(())
	}

	fn has_block_child(&self, el: ElementRef<'_>) -> bool {
		el.descendants().skip(1).filter_map(ElementRef::wrap).any(|d| {
			let name = d.value().name();
			(is_block_tag(name) && !is_math(d)) || self.profile.is_paragraph(d)
		})
	}

	fn list(&self, el: ElementRef<'_>, depth: u8) -> Result<Block> {
		let mut items = Vec::new();
		for li in element_children(el).filter(|c| c.value().name() == "li") {
			self.ctx.checkpoint(self.profile.key)?;
			let item = match self.sole_paragraph_wrapper(li) {
				Some(wrapper) => vec![Block::Paragraph {
					runs: runs_except(wrapper, self.profile.control_classes),
				}],
				None => {
					let mut sink = Sink::default();
					self.children(li, &mut sink, depth.saturating_add(1))?;
					sink.finish()
				}
			};
			items.push(item);
		}
		Ok(Block::List {
			ordered: el.value().name() == "ol",
			items,
			level: depth,
		})
	}

	/// The paragraph wrapper that is an item's only content, if any.
	fn sole_paragraph_wrapper<'a>(&self, li: ElementRef<'a>) -> Option<ElementRef<'a>> {
		let stray_text = li.children().any(|c| matches!(c.value(), Node::Text(t) if !t.trim().is_empty()));
		let mut elements = element_children(li);
		match (elements.next(), elements.next()) {
			(Some(only), None) if !stray_text && self.profile.is_paragraph(only) && !self.has_block_child(only) => Some(only),
			_ => None,
		}
	}
}

/// Code text from the nested code element when present, so highlighting
/// wrappers and banners around it are not captured.
pub(super) fn code_block(el: ElementRef<'_>) -> Block {
	let code = find_descendant(el, |d| d.value().name() == "code");
	let pre = find_descendant(el, |d| d.value().name() == "pre");
	let source = code.or(pre).unwrap_or(el);
	let text: String = source.text().collect();
	Block::CodeBlock {
		text: text.trim_end_matches('\n').to_string(),
	}
}

pub(super) fn table_block(table: ElementRef<'_>, skip: &[&str]) -> Block {
	let rows = table
		.descendants()
		.filter_map(ElementRef::wrap)
		.filter(|d| d.value().name() == "tr")
		.map(|tr| {
			element_children(tr)
				.filter(|c| matches!(c.value().name(), "td" | "th"))
				.map(|c| Cell {
					runs: runs_except(c, skip),
					is_header: c.value().name() == "th",
				})
				.collect::<Vec<_>>()
		})
		.filter(|row| !row.is_empty())
		.collect();
	Block::Table { rows }
}

/// Quote paragraphs joined with newlines into one run sequence.
fn quote_runs(el: ElementRef<'_>, skip: &[&str]) -> Vec<Run> {
	let paragraphs: Vec<ElementRef<'_>> = element_children(el).filter(|c| is_block_tag(c.value().name())).collect();
	if paragraphs.is_empty() {
		return runs_except(el, skip);
	}
	let mut out = Vec::new();
	for (idx, p) in paragraphs.into_iter().enumerate() {
		let runs = normalize_runs(runs_except(p, skip));
		if runs_text(&runs).trim().is_empty() {
			continue;
		}
		if idx > 0 && !out.is_empty() {
			out.push(Run::plain("\n"));
		}
		out.extend(runs);
	}
	out
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use super::*;
	use crate::config::Rules;
	use crate::dom::{container, parse_fragment};
	use crate::walkers::site_profile;

	fn walk_with(site: &str, html: &str) -> Vec<Block> {
		let doc = parse_fragment(html);
		let ctx = WalkContext::new(Arc::new(Rules::builtin().clone()));
		let profile = site_profile(site).expect("profile should exist");
		walk(profile, container(&doc), &ctx).expect("walk should succeed").normalize().blocks
	}

	#[test]
	fn unmarked_containers_flatten_into_parent() {
		let blocks = walk_with("doubao", r#"<div class="flow-markdown-body"><div><div class="paragraph-element">甲</div></div><div>乙</div></div>"#);
		assert_eq!(blocks, vec![Block::paragraph("甲"), Block::paragraph("乙")]);
	}

	#[test]
	fn list_item_paragraph_wrapper_is_unwrapped() {
		let blocks = walk_with("deepseek", r#"<div class="ds-markdown"><ol><li><p class="ds-markdown-paragraph">第一</p></li><li>第二</li></ol></div>"#);
		assert_eq!(
			blocks,
			vec![Block::List {
				ordered: true,
				items: vec![vec![Block::paragraph("第一")], vec![Block::paragraph("第二")]],
				level: 0,
			}]
		);
	}

	#[test]
	fn nested_lists_carry_depth() {
		let blocks = walk_with("chatgpt", r#"<div class="markdown prose"><ul><li><p>a</p><ul><li>b</li></ul></li></ul></div>"#);
		let Block::List { items, .. } = &blocks[0] else {
			panic!("expected list");
		};
		assert!(matches!(items[0][1], Block::List { level: 1, ordered: false, .. }));
	}

	#[test]
	fn display_math_becomes_formula() {
		let blocks = walk_with(
			"kimi",
			r#"<div class="markdown"><span class="katex-display"><span class="katex"><annotation encoding="application/x-tex">a^2+b^2=c^2</annotation></span></span></div>"#,
		);
		assert_eq!(
			blocks,
			vec![Block::MathFormula {
				latex: "a^2+b^2=c^2".into(),
				display_mode: true,
			}]
		);
	}

	#[test]
	fn blockquote_paragraphs_join_with_newlines() {
		let blocks = walk_with("chatgpt", "<div class='markdown prose'><blockquote><p>一</p><p>二</p></blockquote><hr></div>");
		let Block::Blockquote { runs } = &blocks[0] else {
			panic!("expected quote, got {:?}", blocks[0]);
		};
		assert_eq!(runs_text(runs), "一\n二");
		assert_eq!(blocks[1], Block::HorizontalRule);
	}

	#[test]
	fn control_classes_are_pruned() {
		let blocks = walk_with(
			"deepseek",
			r#"<div class="ds-markdown"><div class="md-code-block"><div class="md-code-block-banner">rust 复制</div><pre><span>fn main() {}</span></pre></div></div>"#,
		);
		assert_eq!(blocks, vec![Block::CodeBlock { text: "fn main() {}".into() }]);
	}

	#[test]
	fn table_wrapper_is_unwrapped() {
		let blocks = walk_with(
			"yuanbao",
			r#"<div class="hyc-common-markdown"><div class="hyc-common-markdown__table-wrapper"><div class="hyc-common-markdown__table-tools">复制表格</div><table><thead><tr><th>键</th></tr></thead><tbody><tr><td>值</td></tr></tbody></table></div></div>"#,
		);
		let Block::Table { rows } = &blocks[0] else {
			panic!("expected table");
		};
		assert!(rows[0][0].is_header);
		assert_eq!(runs_text(&rows[1][0].runs), "值");
	}
}
