//! Detection of "thinking" scratch-work that must never reach any output.

use scraper::ElementRef;

use crate::config::{Rules, ThinkingRules};
use crate::dom::{ancestors, class_contains, visible_text};

/// Ancestor levels inspected in addition to the node itself.
const THINKING_DEPTH: usize = 3;

/// Whether `node` belongs to a thinking subtree.
///
/// Matches on the thinking class vocabulary or thinking attributes of the
/// node or any ancestor within three levels. Ambiguous containers (collapsible
/// panels, quotes) are additionally judged by their text.
pub fn is_thinking_content(node: ElementRef<'_>, rules: &Rules) -> bool {
	let thinking = &rules.thinking;

	if std::iter::once(node).chain(ancestors(node, THINKING_DEPTH)).any(|el| marks_thinking(el, thinking)) {
		return true;
	}

	if is_ambiguous(node, thinking) {
		return is_thinking_text_content(&visible_text(node), rules);
	}

	false
}

fn marks_thinking(el: ElementRef<'_>, thinking: &ThinkingRules) -> bool {
	if class_contains(el, &thinking.classes) {
		return true;
	}

	thinking.attributes.iter().any(|(name, expected)| match (el.value().attr(name), expected) {
		(Some(_), None) => true,
		(Some(actual), Some(expected)) => actual.eq_ignore_ascii_case(expected),
		(None, _) => false,
	})
}

fn is_ambiguous(el: ElementRef<'_>, thinking: &ThinkingRules) -> bool {
	let name = el.value().name();
	thinking.ambiguous_tags.iter().any(|t| t == name) || class_contains(el, &thinking.ambiguous_classes)
}

/// Text-only judgement used for containers whose markup is inconclusive.
///
/// Any of three checks suffices: self-referential planning phrases, at least
/// `keyword_threshold` distinct thinking keywords, or a short text opening
/// like a self-instruction.
pub fn is_thinking_text_content(text: &str, rules: &Rules) -> bool {
	let thinking = &rules.thinking;
	let text = text.trim();
	if text.is_empty() {
		return false;
	}

	if thinking.text_patterns.iter().any(|re| re.is_match(text)) {
		return true;
	}

	let lower = text.to_lowercase();
	let distinct = thinking.keywords.iter().filter(|kw| lower.contains(kw.as_str())).count();
	if distinct >= thinking.keyword_threshold {
		return true;
	}

	text.chars().count() <= thinking.pure_process_max_chars && thinking.pure_process_patterns.iter().any(|re| re.is_match(text))
}
