//! Ordered regex tables behind structure inference.
//!
//! Each row is `(name, pattern, payload)`. Rows are evaluated as a boolean OR
//! per table; the payload only matters for the row that produced a match.
//! List rows capture the marker prefix in a `marker` group so it can be
//! stripped; rows without the group keep the whole line.

use std::sync::LazyLock;

use regex::Regex;

/// How a list marker votes when a run of items is grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
	Bullet,
	Ordered,
	/// Colon-labelled items such as `优点：…`; counted as unordered.
	Descriptive,
}

impl MarkerKind {
	pub fn is_ordered(self) -> bool {
		matches!(self, MarkerKind::Ordered)
	}
}

/// Heading level assigned by a heading row; `Hashes` counts leading `#`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HeadingLevel {
	Hashes,
	Fixed(u8),
}

pub(crate) struct Row<P> {
	pub(crate) name: &'static str,
	pub(crate) regex: Regex,
	pub(crate) payload: P,
}

/// Heading rows flagged this way never match a line that starts like a list item.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HeadingRule {
	pub(crate) level: HeadingLevel,
	pub(crate) unless_list: bool,
}

fn table<P: Copy>(rows: &[(&'static str, &str, P)]) -> Vec<Row<P>> {
	rows.iter()
		.map(|&(name, pattern, payload)| Row {
			name,
			regex: Regex::new(pattern).unwrap_or_else(|err| panic!("{name} pattern should compile: {err}")),
			payload,
		})
		.collect()
}

pub(crate) static LIST_ROWS: LazyLock<Vec<Row<MarkerKind>>> = LazyLock::new(|| {
	table(&[
		(
			"glyph-bullet",
			r"^\s*(?P<marker>[•◦▪▫●○■□◆◇►▸▹▶➢➤‣⁃·\x{F0A7}\x{F0B7}\x{F076}\x{F0D8}\x{F0FC}\x{F06C}\x{F06E}])\s*\S",
			MarkerKind::Bullet,
		),
		("ascii-bullet", r"^\s*(?P<marker>[-*+])\s+\S", MarkerKind::Bullet),
		("numeric-dot", r"^\s*(?P<marker>\d{1,3}[.．])(?:\s+\S|[^\d\s.．])", MarkerKind::Ordered),
		("numeric-close", r"^\s*(?P<marker>\d{1,3}[)）、])\s*\S", MarkerKind::Ordered),
		("numeric-paren", r"^\s*(?P<marker>[(（]\d{1,3}[)）])\s*\S", MarkerKind::Ordered),
		("circled", r"^\s*(?P<marker>[\x{2460}-\x{2473}])\s*\S", MarkerKind::Ordered),
		("lettered", r"^\s*(?P<marker>[a-zA-Z][.)])\s+\S", MarkerKind::Ordered),
		("lettered-paren", r"^\s*(?P<marker>[(（][a-zA-Z][)）])\s*\S", MarkerKind::Ordered),
		(
			"roman",
			r"^\s*(?P<marker>(?:i{1,3}|iv|vi{0,3}|ix|x{1,3}|xi{1,3}|xiv|xv|I{1,3}|IV|VI{0,3}|IX|X{1,3}|XI{1,3}|XIV|XV)[.)、])\s+\S",
			MarkerKind::Ordered,
		),
		("cjk-numeral", r"^\s*(?P<marker>[一二三四五六七八九十]{1,3}[、.．])\s*\S", MarkerKind::Ordered),
		("cjk-numeral-paren", r"^\s*(?P<marker>[(（][一二三四五六七八九十]{1,3}[)）])\s*\S", MarkerKind::Ordered),
		(
			"descriptive",
			r"(?i)^\s*(?:优点|缺点|特点|步骤|原因|方法|优势|劣势|用途|示例|例如|pros|cons|advantages?|disadvantages?|features?|steps?|example)\s*[:：]\s*\S",
			MarkerKind::Descriptive,
		),
		("label-colon", r"^\s*[^\s:：/.,，。;；!！?？]{1,12}[:：]\s*\S", MarkerKind::Descriptive),
	])
});

/// Shapes that look like a label-colon item but are not list content.
pub(crate) static LABEL_COLON_EXCLUSIONS: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"://|^\s*\d{1,2}[:：]\d{2}").expect("LABEL_COLON_EXCLUSIONS should compile"));

pub(crate) static HEADING_ROWS: LazyLock<Vec<Row<HeadingRule>>> = LazyLock::new(|| {
	let rule = |level, unless_list| HeadingRule { level, unless_list };
	table(&[
		("markdown", r"^\s*(?P<marker>#{1,6})\s+\S", rule(HeadingLevel::Hashes, false)),
		("chapter", r"^\s*第[一二三四五六七八九十百\d]{1,4}[章节部分篇步]", rule(HeadingLevel::Fixed(2), false)),
		(
			"numbered-parenthetical",
			r"^\s*(?:\d{1,2}|[一二三四五六七八九十]{1,3})[.、．]\s*[^\s(（][^(（]{0,40}[(（][^)）]{1,30}[)）]\s*$",
			rule(HeadingLevel::Fixed(2), false),
		),
		("emoji", r"^\s*\p{Extended_Pictographic}\x{FE0F}?\s*\S.{0,48}$", rule(HeadingLevel::Fixed(2), true)),
		("colon", r"^[^:：]{2,30}[:：]\s*$", rule(HeadingLevel::Fixed(3), true)),
		("question", r"^[^?？]{2,30}[?？]\s*$", rule(HeadingLevel::Fixed(3), true)),
	])
});

/// Quote triggers checked before headings and lists.
pub(crate) static QUOTE_LEAD_ROWS: LazyLock<Vec<Row<()>>> = LazyLock::new(|| {
	table(&[
		("vocabulary", r"(?i)^\s*(?:重要|注意|提示|警告|说明|备注|note|important|warning|tip|caution)\s*[:：!！]", ()),
		("angle-glyph", r"^\s*(?P<marker>[>＞])\s*\S", ()),
		("quoted-line", r"^\s*[“「『][^”」』]+[”」』]\s*$", ()),
	])
});

/// Arithmetic lines, checked after lists so `- 1 + 1 = 2` stays a list item.
pub(crate) static ARITHMETIC: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^\s*[-+]?\d[\d,.]*\s*(?:[-+*/×÷]\s*\d[\d,.]*\s*)+[=＝]\s*[-+]?\d[\d,.]*\s*\S{0,6}\s*$").expect("ARITHMETIC should compile")
});

/// Returns the first row matching `text` together with the end of its marker group.
pub(crate) fn first_match<'a, P>(rows: &'a [Row<P>], text: &str) -> Option<(&'a Row<P>, Option<usize>)> {
	rows.iter().find_map(|row| {
		row.regex
			.captures(text)
			.map(|caps| (row, caps.name("marker").map(|m| m.end())))
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn every_table_compiles() {
		assert!(!LIST_ROWS.is_empty());
		assert!(!HEADING_ROWS.is_empty());
		assert!(!QUOTE_LEAD_ROWS.is_empty());
		assert!(ARITHMETIC.is_match("1 + 1 = 2"));
	}

	#[test]
	fn rows_report_marker_end() {
		let (row, end) = first_match(&LIST_ROWS, "12. item").expect("numbered line should match");
		assert_eq!(row.name, "numeric-dot");
		assert_eq!(end, Some(3));
	}

	#[test]
	fn private_use_bullets_match() {
		let (row, _) = first_match(&LIST_ROWS, "\u{F0B7} symbol font bullet").expect("glyph should match");
		assert_eq!(row.payload, MarkerKind::Bullet);
	}
}
