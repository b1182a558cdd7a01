//! Character escaping shared by the markup and OOXML serializers.

/// Escapes text content: `&`, `<` and `>`.
pub(crate) fn escape_text(s: &str) -> String {
	let mut out = String::with_capacity(s.len());
	for c in s.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			_ => out.push(c),
		}
	}
	out
}

/// Escapes a value placed inside a double-quoted attribute.
pub(crate) fn escape_attr(s: &str) -> String {
	escape_text(s).replace('"', "&quot;")
}

/// Whether `c` may appear in an XML 1.0 document at all.
pub(crate) fn is_xml_char(c: char) -> bool {
	matches!(c, '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}')
}

/// [`escape_text`] for OOXML parts, dropping characters XML cannot carry.
pub(crate) fn xml_text(s: &str) -> String {
	let kept: String = s.chars().filter(|c| is_xml_char(*c)).collect();
	escape_text(&kept)
}

/// [`escape_attr`] for OOXML parts, dropping characters XML cannot carry.
pub(crate) fn xml_attr(s: &str) -> String {
	let kept: String = s.chars().filter(|c| is_xml_char(*c)).collect();
	escape_attr(&kept)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn escapes_markup_characters() {
		assert_eq!(escape_text("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
		assert_eq!(escape_text("plain 文本"), "plain 文本");
	}

	#[test]
	fn attributes_also_escape_quotes() {
		assert_eq!(escape_attr(r#"say "hi" & go"#), "say &quot;hi&quot; &amp; go");
		assert_eq!(escape_text(r#""kept""#), r#""kept""#);
	}

	#[test]
	fn xml_escapes_drop_forbidden_characters() {
		assert_eq!(xml_text("\u{1b}[31mred\u{1b}[0m"), "[31mred[0m");
		assert_eq!(xml_text("a\u{8}b\u{b}\u{c}c\u{fffe}\u{ffff}"), "abc");
		assert_eq!(xml_text("tab\tkept 表 \u{1F600}"), "tab\tkept 表 \u{1F600}");
		assert_eq!(xml_attr("x\u{1}\"y\""), "x&quot;y&quot;");
	}
}
