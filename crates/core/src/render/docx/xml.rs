//! OOXML part serialization.

use super::{CODE_FILL, HEADER_FILL, NumberingKind, ParagraphKind, QUOTE_FILL, WordBlock, WordCell, WordDocument, WordParagraph, WordRun};
use crate::render::entities::{xml_attr as attr, xml_text as text};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const HYPERLINK_REL: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
/// Relationship ids 1 and 2 are styles and numbering.
const FIRST_LINK_REL: usize = 3;
const BULLET_NUM_ID: u32 = 1;
const LIST_INDENTS: [u32; 3] = [360, 720, 1080];

pub(super) fn content_types() -> &'static str {
	r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
  <Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/>
</Types>"#
}

pub(super) fn package_rels() -> &'static str {
	r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#
}

/// Distinct hyperlink targets in document order.
pub(super) fn collect_links(word: &WordDocument) -> Vec<String> {
	let mut links: Vec<String> = Vec::new();
	let mut visit = |runs: &[WordRun]| {
		for run in runs {
			let Some(link) = &run.link else {
				continue;
			};
			if !links.contains(&link.href) {
				links.push(link.href.clone());
			}
		}
	};
	for block in &word.blocks {
		match block {
			WordBlock::Paragraph(p) => visit(&p.runs),
			WordBlock::Table(rows) => rows.iter().flatten().for_each(|cell| visit(&cell.runs)),
		}
	}
	links
}

pub(super) fn document_rels(links: &[String]) -> String {
	let mut out = String::from(
		r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering" Target="numbering.xml"/>
"#,
	);
	for (idx, href) in links.iter().enumerate() {
		out.push_str(&format!(
			"  <Relationship Id=\"rId{}\" Type=\"{HYPERLINK_REL}\" Target=\"{}\" TargetMode=\"External\"/>\n",
			idx + FIRST_LINK_REL,
			attr(href)
		));
	}
	out.push_str("</Relationships>");
	out
}

pub(super) fn document(word: &WordDocument, links: &[String]) -> String {
	let mut body = String::new();
	for block in &word.blocks {
		match block {
			WordBlock::Paragraph(p) => write_paragraph(&mut body, p, links),
			WordBlock::Table(rows) => write_table(&mut body, rows, links),
		}
	}
	format!(
		r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NS}" xmlns:r="{R_NS}"><w:body>{body}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/></w:sectPr></w:body></w:document>"#
	)
}

fn num_id(kind: NumberingKind, instance: u32) -> u32 {
	match kind {
		NumberingKind::Bullet => BULLET_NUM_ID,
		NumberingKind::Decimal => BULLET_NUM_ID + instance,
	}
}

fn write_paragraph(out: &mut String, paragraph: &WordParagraph, links: &[String]) {
	let mut ppr = String::new();
	match paragraph.kind {
		ParagraphKind::Heading(level) => ppr.push_str(&format!("<w:pStyle w:val=\"Heading{level}\"/>")),
		ParagraphKind::Quote => ppr.push_str(&format!("<w:pStyle w:val=\"Quote\"/><w:shd w:val=\"clear\" w:color=\"auto\" w:fill=\"{QUOTE_FILL}\"/>")),
		ParagraphKind::Code => ppr.push_str(&format!("<w:pStyle w:val=\"Code\"/><w:shd w:val=\"clear\" w:color=\"auto\" w:fill=\"{CODE_FILL}\"/>")),
		ParagraphKind::ListItem(numbering) => ppr.push_str(&format!(
			"<w:numPr><w:ilvl w:val=\"{}\"/><w:numId w:val=\"{}\"/></w:numPr>",
			numbering.level,
			num_id(numbering.kind, numbering.instance)
		)),
		ParagraphKind::Math { display: true } => ppr.push_str("<w:jc w:val=\"center\"/>"),
		ParagraphKind::Rule => ppr.push_str("<w:pBdr><w:bottom w:val=\"single\" w:sz=\"6\" w:space=\"1\" w:color=\"auto\"/></w:pBdr>"),
		ParagraphKind::Body | ParagraphKind::Math { display: false } => {}
	}

	out.push_str("<w:p>");
	if !ppr.is_empty() {
		out.push_str(&format!("<w:pPr>{ppr}</w:pPr>"));
	}
	write_runs(out, &paragraph.runs, links, false);
	out.push_str("</w:p>");
}

fn write_table(out: &mut String, rows: &[Vec<WordCell>], links: &[String]) {
	let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
	out.push_str("<w:tbl><w:tblPr><w:tblW w:w=\"0\" w:type=\"auto\"/><w:tblBorders>");
	for side in ["top", "left", "bottom", "right", "insideH", "insideV"] {
		out.push_str(&format!("<w:{side} w:val=\"single\" w:sz=\"4\" w:space=\"0\" w:color=\"999999\"/>"));
	}
	out.push_str("</w:tblBorders></w:tblPr><w:tblGrid>");
	for _ in 0..columns {
		out.push_str("<w:gridCol/>");
	}
	out.push_str("</w:tblGrid>");

	for row in rows {
		out.push_str("<w:tr>");
		for cell in row {
			out.push_str("<w:tc>");
			if cell.header {
				out.push_str(&format!("<w:tcPr><w:shd w:val=\"clear\" w:color=\"auto\" w:fill=\"{HEADER_FILL}\"/></w:tcPr>"));
			}
			out.push_str("<w:p>");
			write_runs(out, &cell.runs, links, cell.header);
			out.push_str("</w:p></w:tc>");
		}
		for _ in row.len()..columns {
			out.push_str("<w:tc><w:p/></w:tc>");
		}
		out.push_str("</w:tr>");
	}
	out.push_str("</w:tbl>");
}

fn write_runs(out: &mut String, runs: &[WordRun], links: &[String], force_bold: bool) {
	for run in runs {
		let rel = run.link.as_ref().and_then(|link| links.iter().position(|href| *href == link.href));
		match rel {
			Some(idx) => {
				out.push_str(&format!("<w:hyperlink r:id=\"rId{}\">", idx + FIRST_LINK_REL));
				write_run(out, run, force_bold, true);
				out.push_str("</w:hyperlink>");
			}
			None => write_run(out, run, force_bold, false),
		}
	}
}

fn write_run(out: &mut String, run: &WordRun, force_bold: bool, hyperlink: bool) {
	let mut rpr = String::new();
	if hyperlink {
		rpr.push_str("<w:rStyle w:val=\"Hyperlink\"/>");
	}
	if let Some(font) = run.font {
		rpr.push_str(&format!("<w:rFonts w:ascii=\"{font}\" w:hAnsi=\"{font}\" w:cs=\"{font}\"/>"));
	}
	if run.bold || force_bold {
		rpr.push_str("<w:b/>");
	}
	if run.italic {
		rpr.push_str("<w:i/>");
	}
	if let Some(color) = &run.color {
		rpr.push_str(&format!("<w:color w:val=\"{}\"/>", attr(color)));
	}
	if run.underline {
		rpr.push_str("<w:u w:val=\"single\"/>");
	}

	out.push_str("<w:r>");
	if !rpr.is_empty() {
		out.push_str(&format!("<w:rPr>{rpr}</w:rPr>"));
	}
	for (idx, line) in run.text.split('\n').enumerate() {
		if idx > 0 {
			out.push_str("<w:br/>");
		}
		out.push_str(&format!("<w:t xml:space=\"preserve\">{}</w:t>", text(line)));
	}
	out.push_str("</w:r>");
}

pub(super) fn styles() -> &'static str {
	r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:docDefaults>
    <w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:eastAsia="Microsoft YaHei" w:cs="Calibri"/><w:sz w:val="22"/><w:szCs w:val="22"/></w:rPr></w:rPrDefault>
    <w:pPrDefault><w:pPr><w:spacing w:after="120" w:line="300" w:lineRule="auto"/></w:pPr></w:pPrDefault>
  </w:docDefaults>
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/></w:style>
  <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="360" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="36"/><w:szCs w:val="36"/></w:rPr></w:style>
  <w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:sz w:val="32"/><w:szCs w:val="32"/></w:rPr></w:style>
  <w:style w:type="paragraph" w:styleId="Heading3"><w:name w:val="heading 3"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="240" w:after="80"/><w:outlineLvl w:val="2"/></w:pPr><w:rPr><w:b/><w:sz w:val="28"/><w:szCs w:val="28"/></w:rPr></w:style>
  <w:style w:type="paragraph" w:styleId="Heading4"><w:name w:val="heading 4"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:spacing w:before="200" w:after="80"/><w:outlineLvl w:val="3"/></w:pPr><w:rPr><w:b/><w:sz w:val="24"/><w:szCs w:val="24"/></w:rPr></w:style>
  <w:style w:type="paragraph" w:styleId="Code"><w:name w:val="Code"/><w:basedOn w:val="Normal"/><w:pPr><w:spacing w:after="0" w:line="240" w:lineRule="auto"/></w:pPr><w:rPr><w:rFonts w:ascii="Consolas" w:hAnsi="Consolas" w:cs="Consolas"/><w:sz w:val="20"/><w:szCs w:val="20"/></w:rPr></w:style>
  <w:style w:type="paragraph" w:styleId="Quote"><w:name w:val="Quote"/><w:basedOn w:val="Normal"/><w:pPr><w:ind w:left="360" w:right="360"/></w:pPr><w:rPr><w:color w:val="404040"/></w:rPr></w:style>
  <w:style w:type="character" w:styleId="Hyperlink"><w:name w:val="Hyperlink"/><w:rPr><w:color w:val="0563C1"/><w:u w:val="single"/></w:rPr></w:style>
</w:styles>"#
}

fn abstract_num(id: u32, levels: [(&str, &str); 3]) -> String {
	let mut out = format!("<w:abstractNum w:abstractNumId=\"{id}\"><w:multiLevelType w:val=\"hybridMultilevel\"/>");
	for (level, ((format, glyph), indent)) in levels.iter().zip(LIST_INDENTS).enumerate() {
		out.push_str(&format!(
			"<w:lvl w:ilvl=\"{level}\"><w:start w:val=\"1\"/><w:numFmt w:val=\"{format}\"/><w:lvlText w:val=\"{glyph}\"/><w:lvlJc w:val=\"left\"/><w:pPr><w:ind w:left=\"{indent}\" w:hanging=\"360\"/></w:pPr></w:lvl>"
		));
	}
	out.push_str("</w:abstractNum>");
	out
}

/// Bullet definition plus one decimal instance per ordered list.
pub(super) fn numbering(ordered_instances: u32) -> String {
	let mut out = format!("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<w:numbering xmlns:w=\"{W_NS}\">");
	out.push_str(&abstract_num(0, [("bullet", "\u{2022}"), ("bullet", "\u{25E6}"), ("bullet", "\u{25AA}")]));
	out.push_str(&abstract_num(1, [("decimal", "%1."), ("lowerLetter", "%2."), ("lowerRoman", "%3.")]));
	out.push_str(&format!("<w:num w:numId=\"{BULLET_NUM_ID}\"><w:abstractNumId w:val=\"0\"/></w:num>"));
	for instance in 1..=ordered_instances.max(1) {
		out.push_str(&format!(
			"<w:num w:numId=\"{}\"><w:abstractNumId w:val=\"1\"/><w:lvlOverride w:ilvl=\"0\"><w:startOverride w:val=\"1\"/></w:lvlOverride></w:num>",
			num_id(NumberingKind::Decimal, instance)
		));
	}
	out.push_str("</w:numbering>");
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::document::Link;

	#[test]
	fn runs_split_lines_into_breaks() {
		let mut out = String::new();
		let run = WordRun {
			text: "a\nb<c>".into(),
			..WordRun::default()
		};
		write_run(&mut out, &run, false, false);
		assert_eq!(out, "<w:r><w:t xml:space=\"preserve\">a</w:t><w:br/><w:t xml:space=\"preserve\">b&lt;c&gt;</w:t></w:r>");
	}

	#[test]
	fn links_are_deduplicated() {
		let link = Some(Link {
			href: "https://a.dev".into(),
			title: None,
		});
		let run = WordRun {
			text: "x".into(),
			link,
			..WordRun::default()
		};
		let word = WordDocument {
			blocks: vec![WordBlock::Paragraph(WordParagraph {
				kind: ParagraphKind::Body,
				runs: vec![run.clone(), run],
			})],
			ordered_instances: 0,
		};
		assert_eq!(collect_links(&word), vec!["https://a.dev".to_string()]);
	}

	#[test]
	fn ordered_instances_restart_at_one() {
		let xml = numbering(2);
		assert!(xml.contains("<w:num w:numId=\"3\"><w:abstractNumId w:val=\"1\"/>"));
		assert_eq!(xml.matches("w:startOverride").count(), 2);
	}
}
