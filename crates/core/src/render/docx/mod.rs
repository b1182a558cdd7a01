//! Word-processing document rendering.
//!
//! A [`Document`] is first lowered into a flat [`WordDocument`] of
//! paragraphs and tables, which is then serialized into OOXML parts and
//! zipped. [`document_to_html`] maps the lowered form back to markup so the
//! copy and download paths can be checked against each other. Lists are
//! flattened on the way down, so blocks after the first paragraph of a list
//! item come back as top-level siblings.

mod xml;

use std::io::{Cursor, Write};

use tracing::debug;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::document::{Block, Cell, Document, Link, Run};
use crate::error::Result;
use crate::render::entities::escape_text;
use crate::render::html::write_runs;

/// MIME type of the produced archive.
pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

pub(crate) const QUOTE_FILL: &str = "F0F0F0";
pub(crate) const CODE_FILL: &str = "F5F5F5";
pub(crate) const HEADER_FILL: &str = "E0E0E0";
pub(crate) const MATH_FONT: &str = "Cambria Math";
pub(crate) const CODE_FONT: &str = "Consolas";
/// Word offers three indent levels per numbering definition.
const MAX_LIST_LEVEL: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberingKind {
	Bullet,
	Decimal,
}

/// Numbering reference of a list paragraph.
///
/// Every ordered list gets its own `instance` so numbering restarts at 1;
/// bullets share one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Numbering {
	pub kind: NumberingKind,
	pub level: u8,
	pub instance: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphKind {
	Body,
	Heading(u8),
	ListItem(Numbering),
	Quote,
	Code,
	Math { display: bool },
	Rule,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordRun {
	pub text: String,
	pub bold: bool,
	pub italic: bool,
	pub underline: bool,
	pub code: bool,
	pub color: Option<String>,
	pub font: Option<&'static str>,
	pub link: Option<Link>,
}

impl From<&Run> for WordRun {
	fn from(run: &Run) -> Self {
		Self {
			text: run.text.clone(),
			bold: run.bold,
			italic: run.italic,
			underline: run.underline,
			code: run.code,
			color: run.color.clone(),
			font: run.code.then_some(CODE_FONT),
			link: run.link.clone(),
		}
	}
}

impl WordRun {
	fn to_run(&self) -> Run {
		Run {
			text: self.text.clone(),
			bold: self.bold,
			italic: self.italic,
			code: self.code,
			underline: self.underline,
			link: self.link.clone(),
			color: self.color.clone(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordParagraph {
	pub kind: ParagraphKind,
	pub runs: Vec<WordRun>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordCell {
	pub runs: Vec<WordRun>,
	pub header: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordBlock {
	Paragraph(WordParagraph),
	Table(Vec<Vec<WordCell>>),
}

/// Flat paragraph/table form of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordDocument {
	pub blocks: Vec<WordBlock>,
	/// Highest ordered-list numbering instance in use.
	pub ordered_instances: u32,
}

impl WordDocument {
	pub fn from_document(doc: &Document) -> Self {
		let mut word = Self::default();
		for block in &doc.blocks {
			word.lower(block, 0);
		}
		word
	}

	fn push(&mut self, kind: ParagraphKind, runs: Vec<WordRun>) {
		self.blocks.push(WordBlock::Paragraph(WordParagraph { kind, runs }));
	}

	fn lower(&mut self, block: &Block, depth: u8) {
		match block {
			Block::Heading { level, runs } => self.push(ParagraphKind::Heading((*level).clamp(1, 4)), word_runs(runs)),
			Block::Paragraph { runs } => self.push(ParagraphKind::Body, word_runs(runs)),
			Block::Blockquote { runs } => self.push(ParagraphKind::Quote, word_runs(runs)),
			Block::CodeBlock { text } => self.push(
				ParagraphKind::Code,
				vec![WordRun {
					text: text.trim_end_matches('\n').to_string(),
					code: true,
					font: Some(CODE_FONT),
					..WordRun::default()
				}],
			),
			Block::MathFormula { latex, display_mode } => self.push(
				ParagraphKind::Math { display: *display_mode },
				vec![WordRun {
					text: latex.clone(),
					font: Some(MATH_FONT),
					..WordRun::default()
				}],
			),
			Block::HorizontalRule => self.push(ParagraphKind::Rule, Vec::new()),
			Block::Table { rows } => self.blocks.push(WordBlock::Table(rows.iter().map(|row| row.iter().map(word_cell).collect()).collect())),
			Block::List { ordered, items, .. } => self.lower_list(*ordered, items, depth),
		}
	}

	fn lower_list(&mut self, ordered: bool, items: &[Vec<Block>], depth: u8) {
		let numbering = if ordered {
			self.ordered_instances += 1;
			Numbering {
				kind: NumberingKind::Decimal,
				level: depth.min(MAX_LIST_LEVEL),
				instance: self.ordered_instances,
			}
		} else {
			Numbering {
				kind: NumberingKind::Bullet,
				level: depth.min(MAX_LIST_LEVEL),
				instance: 0,
			}
		};

		for item in items {
			let mut numbered = false;
			for child in item {
				match child {
					Block::Paragraph { runs } if !numbered => {
						self.push(ParagraphKind::ListItem(numbering), word_runs(runs));
						numbered = true;
					}
					Block::List { ordered, items, .. } => self.lower_list(*ordered, items, depth.saturating_add(1)),
					other => {
						if !numbered {
							self.push(ParagraphKind::ListItem(numbering), Vec::new());
							numbered = true;
						}
						self.lower(other, depth);
					}
				}
			}
		}
	}
}

fn word_runs(runs: &[Run]) -> Vec<WordRun> {
	runs.iter().map(WordRun::from).collect()
}

fn word_cell(cell: &Cell) -> WordCell {
	WordCell {
		runs: word_runs(&cell.runs),
		header: cell.is_header,
	}
}

/// Serializes a document into a `.docx` archive.
pub fn to_docx(doc: &Document) -> Result<Vec<u8>> {
	let word = WordDocument::from_document(doc);
	let bytes = write_package(&word)?;
	debug!(target = "chx.render", blocks = word.blocks.len(), bytes = bytes.len(), "rendered docx");
	Ok(bytes)
}

fn write_package(word: &WordDocument) -> Result<Vec<u8>> {
	let links = xml::collect_links(word);
	let parts = [
		("[Content_Types].xml", xml::content_types().to_string()),
		("_rels/.rels", xml::package_rels().to_string()),
		("word/document.xml", xml::document(word, &links)),
		("word/styles.xml", xml::styles().to_string()),
		("word/numbering.xml", xml::numbering(word.ordered_instances)),
		("word/_rels/document.xml.rels", xml::document_rels(&links)),
	];

	let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
	let opt = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
	for (name, body) in parts {
		zip.start_file(name, opt)?;
		zip.write_all(body.as_bytes())?;
	}
	Ok(zip.finish()?.into_inner())
}

/// Maps the lowered document back to plain markup.
pub fn document_to_html(word: &WordDocument) -> String {
	let mut out = String::new();
	let mut lists: Vec<NumberingKind> = Vec::new();

	for block in &word.blocks {
		let paragraph = match block {
			WordBlock::Paragraph(p) => p,
			WordBlock::Table(rows) => {
				close_lists(&mut out, &mut lists);
				out.push_str("<table>");
				for row in rows {
					out.push_str("<tr>");
					for cell in row {
						let tag = if cell.header { "th" } else { "td" };
						out.push_str(&format!("<{tag}>"));
						write_word_runs(&mut out, &cell.runs);
						out.push_str(&format!("</{tag}>"));
					}
					out.push_str("</tr>");
				}
				out.push_str("</table>");
				continue;
			}
		};

		if let ParagraphKind::ListItem(numbering) = paragraph.kind {
			open_item(&mut out, &mut lists, numbering);
			write_word_runs(&mut out, &paragraph.runs);
			continue;
		}
		close_lists(&mut out, &mut lists);

		let text: String = paragraph.runs.iter().map(|r| r.text.as_str()).collect();
		match paragraph.kind {
			ParagraphKind::Heading(level) => {
				out.push_str(&format!("<h{level}>"));
				write_word_runs(&mut out, &paragraph.runs);
				out.push_str(&format!("</h{level}>"));
			}
			ParagraphKind::Body | ParagraphKind::ListItem(_) => {
				out.push_str("<p>");
				write_word_runs(&mut out, &paragraph.runs);
				out.push_str("</p>");
			}
			ParagraphKind::Quote => {
				out.push_str("<blockquote><p>");
				write_word_runs(&mut out, &paragraph.runs);
				out.push_str("</p></blockquote>");
			}
			ParagraphKind::Code => out.push_str(&format!("<pre><code>{}</code></pre>", escape_text(&text))),
			ParagraphKind::Math { display: true } => out.push_str(&format!("<p class=\"math-display\">$${}$$</p>", escape_text(&text))),
			ParagraphKind::Math { display: false } => out.push_str(&format!("<p class=\"math-inline\">${}$</p>", escape_text(&text))),
			ParagraphKind::Rule => out.push_str("<hr>"),
		}
	}
	close_lists(&mut out, &mut lists);
	out
}

fn list_tag(kind: NumberingKind) -> &'static str {
	match kind {
		NumberingKind::Bullet => "ul",
		NumberingKind::Decimal => "ol",
	}
}

fn open_item(out: &mut String, lists: &mut Vec<NumberingKind>, numbering: Numbering) {
	let depth = usize::from(numbering.level) + 1;
	while lists.len() > depth {
		pop_list(out, lists);
	}
	if lists.len() == depth {
		if lists.last() == Some(&numbering.kind) {
			out.push_str("</li><li>");
			return;
		}
		pop_list(out, lists);
	}
	while lists.len() < depth {
		lists.push(numbering.kind);
		out.push_str(&format!("<{}><li>", list_tag(numbering.kind)));
	}
}

fn pop_list(out: &mut String, lists: &mut Vec<NumberingKind>) {
	if let Some(kind) = lists.pop() {
		out.push_str(&format!("</li></{}>", list_tag(kind)));
	}
}

fn close_lists(out: &mut String, lists: &mut Vec<NumberingKind>) {
	while !lists.is_empty() {
		pop_list(out, lists);
	}
}

fn write_word_runs(out: &mut String, runs: &[WordRun]) {
	let runs: Vec<Run> = runs.iter().map(WordRun::to_run).collect();
	write_runs(out, &runs);
}
