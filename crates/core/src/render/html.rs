//! Plain markup serialization of a [`Document`].
//!
//! The output is intentionally bare; all compatibility styling happens in
//! [`optimize`](super::optimize).

use crate::document::{Block, Cell, Document, Run};
use crate::render::entities::{escape_attr, escape_text};

/// Serializes the whole document.
pub fn render(doc: &Document) -> String {
	blocks_to_html(&doc.blocks)
}

pub fn blocks_to_html(blocks: &[Block]) -> String {
	let mut out = String::new();
	for block in blocks {
		write_block(&mut out, block);
	}
	out
}

fn write_block(out: &mut String, block: &Block) {
	match block {
		Block::Heading { level, runs } => {
			out.push_str(&format!("<h{level}>"));
			write_runs(out, runs);
			out.push_str(&format!("</h{level}>"));
		}
		Block::Paragraph { runs } => {
			out.push_str("<p>");
			write_runs(out, runs);
			out.push_str("</p>");
		}
		Block::List { ordered, items, .. } => {
			let tag = if *ordered { "ol" } else { "ul" };
			out.push_str(&format!("<{tag}>"));
			for item in items {
				out.push_str("<li>");
				write_item(out, item);
				out.push_str("</li>");
			}
			out.push_str(&format!("</{tag}>"));
		}
		Block::Blockquote { runs } => {
			out.push_str("<blockquote><p>");
			write_runs(out, runs);
			out.push_str("</p></blockquote>");
		}
		Block::CodeBlock { text } => {
			out.push_str("<pre><code>");
			out.push_str(&escape_text(text));
			out.push_str("</code></pre>");
		}
		Block::Table { rows } => {
			out.push_str("<table>");
			for row in rows {
				out.push_str("<tr>");
				for cell in row {
					write_cell(out, cell);
				}
				out.push_str("</tr>");
			}
			out.push_str("</table>");
		}
		Block::MathFormula { latex, display_mode } => {
			let escaped = escape_text(latex);
			if *display_mode {
				out.push_str(&format!("<p class=\"math-display\">$${escaped}$$</p>"));
			} else {
				out.push_str(&format!("<p class=\"math-inline\">${escaped}$</p>"));
			}
		}
		Block::HorizontalRule => out.push_str("<hr>"),
	}
}

/// A leading paragraph is written inline so `<li><p>x</p></li>` never appears.
fn write_item(out: &mut String, item: &[Block]) {
	let rest = match item.first() {
		Some(Block::Paragraph { runs }) => {
			write_runs(out, runs);
			&item[1..]
		}
		_ => item,
	};
	for block in rest {
		write_block(out, block);
	}
}

fn write_cell(out: &mut String, cell: &Cell) {
	let tag = if cell.is_header { "th" } else { "td" };
	out.push_str(&format!("<{tag}>"));
	write_runs(out, &cell.runs);
	out.push_str(&format!("</{tag}>"));
}

pub(crate) fn write_runs(out: &mut String, runs: &[Run]) {
	for run in runs {
		write_run(out, run);
	}
}

fn write_run(out: &mut String, run: &Run) {
	let mut html = escape_text(&run.text).replace('\n', "<br>");
	if run.code {
		html = format!("<code>{html}</code>");
	}
	if run.bold {
		html = format!("<strong>{html}</strong>");
	}
	if run.italic {
		html = format!("<em>{html}</em>");
	}
	if run.underline {
		html = format!("<u>{html}</u>");
	}
	if let Some(color) = &run.color {
		html = format!("<span style=\"color:#{color}\">{html}</span>");
	}
	if let Some(link) = &run.link {
		let href = escape_attr(&link.href);
		html = match &link.title {
			Some(title) => format!("<a href=\"{href}\" title=\"{}\">{html}</a>", escape_attr(title)),
			None => format!("<a href=\"{href}\">{html}</a>"),
		};
	}
	out.push_str(&html);
}
