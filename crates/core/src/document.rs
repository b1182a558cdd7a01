//! Canonical document model shared by every walker and renderer.
//!
//! Blocks never hold text directly: character content always lives in a
//! sequence of [`Run`]s so renderers only need one inline code path.

use serde::Serialize;

/// Hyperlink target attached to a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
	pub href: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
}

/// A contiguous piece of text sharing one set of character styles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Run {
	pub text: String,
	pub bold: bool,
	pub italic: bool,
	pub code: bool,
	pub underline: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub link: Option<Link>,
	/// Six-digit uppercase hex colour without the leading `#`.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub color: Option<String>,
}

impl Run {
	pub fn plain(text: impl Into<String>) -> Self {
		Self {
			text: text.into(),
			..Self::default()
		}
	}

	/// Whether two runs can be merged without changing formatting.
	pub fn same_style(&self, other: &Run) -> bool {
		self.bold == other.bold
			&& self.italic == other.italic
			&& self.code == other.code
			&& self.underline == other.underline
			&& self.link == other.link
			&& self.color == other.color
	}

	pub fn is_empty(&self) -> bool {
		self.text.is_empty()
	}
}

/// One table cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Cell {
	pub runs: Vec<Run>,
	pub is_header: bool,
}

/// Structural unit of a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Block {
	Heading { level: u8, runs: Vec<Run> },
	Paragraph { runs: Vec<Run> },
	List { ordered: bool, items: Vec<Vec<Block>>, level: u8 },
	Blockquote { runs: Vec<Run> },
	CodeBlock { text: String },
	Table { rows: Vec<Vec<Cell>> },
	MathFormula { latex: String, display_mode: bool },
	HorizontalRule,
}

impl Block {
	pub fn heading(level: u8, runs: Vec<Run>) -> Self {
		Self::Heading {
			level: level.clamp(1, 6),
			runs,
		}
	}

	pub fn paragraph(text: impl Into<String>) -> Self {
		Self::Paragraph { runs: vec![Run::plain(text)] }
	}

	/// Whether the block carries no visible content once empty runs are ignored.
	pub fn is_blank(&self) -> bool {
		match self {
			Self::Heading { runs, .. } | Self::Paragraph { runs } | Self::Blockquote { runs } => runs_blank(runs),
			Self::List { items, .. } => items.iter().all(|item| item.iter().all(Block::is_blank)),
			Self::CodeBlock { text } => text.trim().is_empty(),
			Self::Table { rows } => rows.iter().all(|row| row.iter().all(|cell| runs_blank(&cell.runs))),
			Self::MathFormula { latex, .. } => latex.trim().is_empty(),
			Self::HorizontalRule => false,
		}
	}
}

/// Ordered sequence of blocks extracted from one response container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Document {
	pub blocks: Vec<Block>,
}

impl Document {
	pub fn new(blocks: Vec<Block>) -> Self {
		Self { blocks }
	}

	/// A document is empty when it has no block with visible content.
	/// Horizontal rules alone do not count as content.
	pub fn is_empty(&self) -> bool {
		self.blocks.iter().all(|block| matches!(block, Block::HorizontalRule) || block.is_blank())
	}

	/// Drops empty runs and blank blocks, merging adjacent runs that share styling.
	pub fn normalize(mut self) -> Self {
		self.blocks = normalize_blocks(self.blocks);
		self
	}
}

fn runs_blank(runs: &[Run]) -> bool {
	runs.iter().all(|run| run.text.trim().is_empty())
}

fn normalize_blocks(blocks: Vec<Block>) -> Vec<Block> {
	blocks
		.into_iter()
		.filter_map(|block| {
			let block = match block {
				Block::Heading { level, runs } => Block::Heading {
					level,
					runs: normalize_runs(runs),
				},
				Block::Paragraph { runs } => Block::Paragraph { runs: normalize_runs(runs) },
				Block::Blockquote { runs } => Block::Blockquote { runs: normalize_runs(runs) },
				Block::List { ordered, items, level } => {
					let items: Vec<Vec<Block>> = items.into_iter().map(normalize_blocks).filter(|item| !item.is_empty()).collect();
					Block::List { ordered, items, level }
				}
				Block::Table { rows } => Block::Table {
					rows: rows
						.into_iter()
						.map(|row| {
							row.into_iter()
								.map(|cell| Cell {
									runs: normalize_runs(cell.runs),
									is_header: cell.is_header,
								})
								.collect::<Vec<_>>()
						})
						.filter(|row| !row.is_empty())
						.collect(),
				},
				other => other,
			};
			(matches!(block, Block::HorizontalRule) || !block.is_blank()).then_some(block)
		})
		.collect()
}

/// Removes empty runs, merges neighbours with identical styling and trims
/// the outer whitespace of the sequence.
pub fn normalize_runs(runs: Vec<Run>) -> Vec<Run> {
	let mut out: Vec<Run> = Vec::with_capacity(runs.len());
	for run in runs.into_iter().filter(|run| !run.is_empty()) {
		match out.last_mut() {
			Some(last) if last.same_style(&run) => last.text.push_str(&run.text),
			_ => out.push(run),
		}
	}

	if let Some(first) = out.first_mut().filter(|run| !run.code) {
		first.text = first.text.trim_start().to_string();
	}
	if let Some(last) = out.last_mut().filter(|run| !run.code) {
		last.text = last.text.trim_end().to_string();
	}
	out.retain(|run| !run.is_empty());
	out
}

/// Concatenated text of a run sequence.
pub fn runs_text(runs: &[Run]) -> String {
	runs.iter().map(|run| run.text.as_str()).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn bold(text: &str) -> Run {
		Run {
			text: text.to_string(),
			bold: true,
			..Run::default()
		}
	}

	#[test]
	fn normalize_merges_and_drops_empty_runs() {
		let runs = vec![Run::plain("  Hello"), Run::plain(""), Run::plain(" world "), bold("!")];
		let merged = normalize_runs(runs);
		assert_eq!(merged, vec![Run::plain("Hello world "), bold("!")]);
	}

	#[test]
	fn normalize_removes_blank_blocks_but_keeps_rules() {
		let doc = Document::new(vec![
			Block::paragraph("   "),
			Block::HorizontalRule,
			Block::CodeBlock { text: "\n".into() },
			Block::paragraph("kept"),
		])
		.normalize();
		assert_eq!(doc.blocks, vec![Block::HorizontalRule, Block::paragraph("kept")]);
	}

	#[test]
	fn rule_only_document_is_empty() {
		assert!(Document::new(vec![Block::HorizontalRule]).is_empty());
		assert!(!Document::new(vec![Block::paragraph("x")]).is_empty());
	}

	#[test]
	fn empty_list_items_are_pruned() {
		let doc = Document::new(vec![Block::List {
			ordered: false,
			items: vec![vec![Block::paragraph("a")], vec![Block::paragraph(" ")]],
			level: 0,
		}])
		.normalize();
		let Block::List { items, .. } = &doc.blocks[0] else {
			panic!("expected list");
		};
		assert_eq!(items.len(), 1);
	}

	#[test]
	fn heading_level_is_clamped() {
		assert!(matches!(Block::heading(9, vec![]), Block::Heading { level: 6, .. }));
		assert!(matches!(Block::heading(0, vec![]), Block::Heading { level: 1, .. }));
	}
}
