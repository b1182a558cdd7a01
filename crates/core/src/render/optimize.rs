//! Clipboard compatibility pass over serialized markup.
//!
//! Word processors disagree on stylesheet support, tag-closure leniency and
//! default list rendering, so every fix lives here instead of in the walkers.
//! Passes run in order: tag balancing, inline styles, character references,
//! list-style types, then the standalone document shell.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9]*)([^>]*?)(/?)>").expect("TAG should compile"));
static STYLE_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\bstyle\s*=\s*"([^"]*)""#).expect("STYLE_ATTR should compile"));

const FONT_FAMILY: &str = "'Microsoft YaHei','PingFang SC',Arial,sans-serif";
const MONO_FAMILY: &str = "Consolas,'Courier New',monospace";

/// Tags whose nesting is balanced; anything else passes through untouched.
const TRACKED: &[&str] = &[
	"p",
	"li",
	"ul",
	"ol",
	"h1",
	"h2",
	"h3",
	"h4",
	"h5",
	"h6",
	"blockquote",
	"table",
	"tr",
	"th",
	"td",
	"pre",
	"code",
	"strong",
	"em",
	"u",
	"span",
	"a",
	"div",
];

const PARAGRAPH_BOUNDARIES: &[&str] = &["li", "blockquote", "td", "th", "div", "ul", "ol", "table"];
const BREAKS_PARAGRAPH: &[&str] = &["p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "blockquote", "table", "pre", "div"];

fn tag_style(name: &str) -> Option<String> {
	let style = match name {
		"p" => format!("margin:0 0 8pt 0;line-height:1.6;font-size:11pt;font-family:{FONT_FAMILY}"),
		"h1" => format!("margin:12pt 0 6pt 0;font-size:20pt;font-weight:bold;font-family:{FONT_FAMILY}"),
		"h2" => format!("margin:12pt 0 6pt 0;font-size:16pt;font-weight:bold;font-family:{FONT_FAMILY}"),
		"h3" => format!("margin:10pt 0 4pt 0;font-size:14pt;font-weight:bold;font-family:{FONT_FAMILY}"),
		"h4" | "h5" | "h6" => format!("margin:8pt 0 4pt 0;font-size:12pt;font-weight:bold;font-family:{FONT_FAMILY}"),
		"ul" | "ol" => "margin:0 0 8pt 0;padding-left:24pt".to_string(),
		"li" => format!("margin:0 0 4pt 0;line-height:1.6;font-size:11pt;font-family:{FONT_FAMILY}"),
		"blockquote" => "margin:8pt 0;padding:6pt 12pt;border-left:3pt solid #CCCCCC;background:#F0F0F0".to_string(),
		"pre" => format!("margin:8pt 0;padding:8pt;background:#F5F5F5;white-space:pre-wrap;font-size:10pt;font-family:{MONO_FAMILY}"),
		"code" => format!("font-size:10pt;font-family:{MONO_FAMILY}"),
		"table" => "border-collapse:collapse;margin:8pt 0".to_string(),
		"th" => "border:1px solid #999999;padding:4pt 8pt;background:#E0E0E0;font-weight:bold".to_string(),
		"td" => "border:1px solid #999999;padding:4pt 8pt".to_string(),
		_ => return None,
	};
	Some(style)
}

const ENTITIES: &[(char, &str)] = &[
	('\u{2014}', "&mdash;"),
	('\u{2013}', "&ndash;"),
	('\u{2018}', "&lsquo;"),
	('\u{2019}', "&rsquo;"),
	('\u{201C}', "&ldquo;"),
	('\u{201D}', "&rdquo;"),
	('\u{2026}', "&hellip;"),
	('\u{00A0}', "&nbsp;"),
	('\u{00B0}', "&deg;"),
	('\u{00A9}', "&copy;"),
	('\u{00AE}', "&reg;"),
	('\u{2122}', "&trade;"),
	('\u{00D7}', "&times;"),
	('\u{00F7}', "&divide;"),
	('\u{00B1}', "&plusmn;"),
	('\u{2260}', "&ne;"),
	('\u{2264}', "&le;"),
	('\u{2265}', "&ge;"),
	('\u{2248}', "&asymp;"),
	('\u{221E}', "&infin;"),
	('\u{221A}', "&radic;"),
	('\u{2211}', "&sum;"),
	('\u{220F}', "&prod;"),
	('\u{222B}', "&int;"),
	('\u{2202}', "&part;"),
	('\u{2208}', "&isin;"),
	('\u{2192}', "&rarr;"),
	('\u{2190}', "&larr;"),
	('\u{2191}', "&uarr;"),
	('\u{2193}', "&darr;"),
	('\u{2194}', "&harr;"),
	('\u{21D2}', "&rArr;"),
	('\u{21D4}', "&hArr;"),
	('\u{0391}', "&Alpha;"),
	('\u{0394}', "&Delta;"),
	('\u{0398}', "&Theta;"),
	('\u{039B}', "&Lambda;"),
	('\u{03A0}', "&Pi;"),
	('\u{03A3}', "&Sigma;"),
	('\u{03A6}', "&Phi;"),
	('\u{03A9}', "&Omega;"),
	('\u{03B1}', "&alpha;"),
	('\u{03B2}', "&beta;"),
	('\u{03B3}', "&gamma;"),
	('\u{03B4}', "&delta;"),
	('\u{03B5}', "&epsilon;"),
	('\u{03B6}', "&zeta;"),
	('\u{03B7}', "&eta;"),
	('\u{03B8}', "&theta;"),
	('\u{03BB}', "&lambda;"),
	('\u{03BC}', "&mu;"),
	('\u{03C0}', "&pi;"),
	('\u{03C1}', "&rho;"),
	('\u{03C3}', "&sigma;"),
	('\u{03C4}', "&tau;"),
	('\u{03C6}', "&phi;"),
	('\u{03C7}', "&chi;"),
	('\u{03C8}', "&psi;"),
	('\u{03C9}', "&omega;"),
];

const BASE_STYLE: &str = "body{font-family:'Microsoft YaHei','PingFang SC',Arial,sans-serif;font-size:11pt;line-height:1.6;color:#000000}\
table{border-collapse:collapse}th,td{border:1px solid #999999;padding:4pt 8pt}\
pre,code{font-family:Consolas,'Courier New',monospace}";

/// Runs every compatibility pass and returns a standalone document.
pub fn optimize(html: &str) -> String {
	let html = auto_close(html);
	let html = inline_styles(&html);
	let html = encode_symbols(&html);
	let html = list_style_types(&html);
	wrap_document(&html)
}

/// Index of the innermost open `targets` tag not shadowed by a boundary tag.
fn open_position(stack: &[String], targets: &[&str], boundaries: &[&str]) -> Option<usize> {
	for (idx, tag) in stack.iter().enumerate().rev() {
		if targets.contains(&tag.as_str()) {
			return Some(idx);
		}
		if boundaries.contains(&tag.as_str()) {
			return None;
		}
	}
	None
}

fn close_to(stack: &mut Vec<String>, out: &mut String, pos: usize) {
	while stack.len() > pos {
		if let Some(tag) = stack.pop() {
			out.push_str(&format!("</{tag}>"));
		}
	}
}

/// Closes unbalanced tracked tags and drops closers with no open tag.
pub fn auto_close(html: &str) -> String {
	let mut out = String::with_capacity(html.len());
	let mut stack: Vec<String> = Vec::new();
	let mut last = 0;

	for caps in TAG.captures_iter(html) {
		let Some(whole) = caps.get(0) else {
			continue;
		};
		out.push_str(&html[last..whole.start()]);
		last = whole.end();

		let name = caps[2].to_ascii_lowercase();
		if !TRACKED.contains(&name.as_str()) {
			out.push_str(whole.as_str());
			continue;
		}

		if !caps[1].is_empty() {
			if let Some(pos) = stack.iter().rposition(|t| *t == name) {
				close_to(&mut stack, &mut out, pos);
			}
			continue;
		}

		let implicit = match name.as_str() {
			"li" => open_position(&stack, &["li"], &["ul", "ol"]),
			"tr" => open_position(&stack, &["tr"], &["table"]),
			"td" | "th" => open_position(&stack, &["td", "th"], &["tr", "table"]),
			n if BREAKS_PARAGRAPH.contains(&n) => open_position(&stack, &["p"], PARAGRAPH_BOUNDARIES),
			_ => None,
		};
		if let Some(pos) = implicit {
			close_to(&mut stack, &mut out, pos);
		}

		out.push_str(whole.as_str());
		if caps[4].is_empty() {
			stack.push(name);
		}
	}

	out.push_str(&html[last..]);
	close_to(&mut stack, &mut out, 0);
	out
}

fn rewrite_open_tags(html: &str, mut style_for: impl FnMut(&str, bool) -> Option<String>) -> String {
	TAG.replace_all(html, |caps: &Captures<'_>| {
		let name = caps[2].to_ascii_lowercase();
		let closing = !caps[1].is_empty();
		match style_for(&name, closing) {
			Some(css) if !closing => format!("<{}{}{}>", &caps[2], with_style(&caps[3], &css), &caps[4]),
			_ => caps[0].to_string(),
		}
	})
	.into_owned()
}

/// Prepends `css` to an existing `style` attribute or adds one.
fn with_style(attrs: &str, css: &str) -> String {
	match STYLE_ATTR.captures(attrs) {
		Some(existing) => {
			let merged = format!("style=\"{};{}\"", css, &existing[1]);
			STYLE_ATTR.replace(attrs, merged.as_str()).into_owned()
		}
		None => format!("{attrs} style=\"{css}\""),
	}
}

/// Inlines presentational styling per tag type.
pub fn inline_styles(html: &str) -> String {
	rewrite_open_tags(html, |name, _| tag_style(name))
}

/// Replaces typographic and symbolic characters with named references.
pub fn encode_symbols(html: &str) -> String {
	let mut out = String::with_capacity(html.len());
	for ch in html.chars() {
		match ENTITIES.iter().find(|(c, _)| *c == ch) {
			Some((_, entity)) => out.push_str(entity),
			None => out.push(ch),
		}
	}
	out
}

/// Sets `list-style-type` on every list by nesting depth.
pub fn list_style_types(html: &str) -> String {
	let mut depth = 0usize;
	rewrite_open_tags(html, |name, closing| {
		if !matches!(name, "ul" | "ol") {
			return None;
		}
		if closing {
			depth = depth.saturating_sub(1);
			return None;
		}
		let styles: [&str; 3] = if name == "ul" { ["disc", "circle", "square"] } else { ["decimal", "lower-alpha", "lower-roman"] };
		let css = format!("list-style-type:{}", styles[depth % 3]);
		depth += 1;
		Some(css)
	})
}

/// Wraps a fragment in a standalone document with clipboard fragment markers.
pub fn wrap_document(fragment: &str) -> String {
	format!(
		"<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><style>{BASE_STYLE}</style></head><body>\n<!--StartFragment-->{fragment}<!--EndFragment-->\n</body></html>"
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn closes_unbalanced_list_items() {
		assert_eq!(auto_close("<ul><li>a<li>b</ul></p>"), "<ul><li>a</li><li>b</li></ul>");
	}

	#[test]
	fn paragraphs_close_before_blocks() {
		assert_eq!(auto_close("<p>x<p>y<ul><li>z</ul>"), "<p>x</p><p>y</p><ul><li>z</li></ul>");
	}

	#[test]
	fn nested_list_item_stays_open() {
		assert_eq!(auto_close("<ul><li>a<ul><li>b</ul></ul>"), "<ul><li>a<ul><li>b</li></ul></li></ul>");
	}

	#[test]
	fn void_and_unknown_tags_pass_through() {
		assert_eq!(auto_close("<p>a<br>b<hr/>"), "<p>a<br>b<hr/></p>");
	}

	#[test]
	fn inline_styles_merge_existing() {
		let html = inline_styles(r#"<td>v</td><span style="color:#FF0000">r</span><p class="x">t</p>"#);
		assert!(html.contains(r#"<td style="border:1px solid #999999;padding:4pt 8pt">"#));
		assert!(html.contains(r#"<span style="color:#FF0000">"#));
		assert!(html.contains(r#"<p class="x" style="margin:0 0 8pt 0;"#));
	}

	#[test]
	fn symbols_become_references() {
		assert_eq!(encode_symbols("a—b “q” … α≤β →"), "a&mdash;b &ldquo;q&rdquo; &hellip; &alpha;&le;&beta; &rarr;");
	}

	#[test]
	fn list_styles_follow_depth() {
		let html = list_style_types("<ul><li>a<ul><li>b<ol><li>c</li></ol></li></ul></li></ul><ol><li>d</li></ol>");
		assert_eq!(
			html,
			"<ul style=\"list-style-type:disc\"><li>a<ul style=\"list-style-type:circle\"><li>b<ol style=\"list-style-type:lower-roman\"><li>c</li></ol></li></ul></li></ul><ol style=\"list-style-type:decimal\"><li>d</li></ol>"
		);
	}

	#[test]
	fn full_pass_produces_standalone_document() {
		let out = optimize("<p>a — b");
		assert!(out.starts_with("<!DOCTYPE html>"));
		assert!(out.contains("<!--StartFragment--><p style="));
		assert!(out.contains("a &mdash; b</p><!--EndFragment-->"));
	}
}
