//! The four scoring signals combined by [`classify`](super::classify).

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Selector};

use super::{Geometry, Score};
use crate::config::ClassifierRules;
use crate::dom::{ancestors, class_attr, element_children};

/// Weight of an explicit role/author attribute.
const ROLE_ATTRIBUTE_WEIGHT: f32 = 5.0;
/// Attribute signal inspects the node plus this many ancestors.
const ATTRIBUTE_DEPTH: usize = 5;
/// Lexical scores are capped per side so phrasing never outweighs an explicit role attribute.
const LEXICAL_CAP: f32 = 4.0;
const FINGERPRINT_WEIGHT: f32 = 3.0;
const GEOMETRY_WEIGHT: f32 = 2.0;

static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[。！？!?]|\.(\s|$)").expect("SENTENCE_END should compile"));
static BULLET_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*([-*•]|\d+[.)、])\s+\S").expect("BULLET_LINE should compile"));

/// Role attributes and class-name vocabulary on the node or its nearest ancestors.
///
/// The nearest element carrying any authorship marker decides; outer page
/// wrappers are not consulted once a closer marker was found.
pub(crate) fn attribute_signal(node: ElementRef<'_>, rules: &ClassifierRules) -> Score {
	let mut score = Score::default();

	for el in std::iter::once(node).chain(ancestors(node, ATTRIBUTE_DEPTH)) {
		for name in &rules.role_attributes {
			let Some(value) = el.value().attr(name) else {
				continue;
			};
			let value = value.trim().to_lowercase();
			if rules.human_attribute_values.contains(&value) {
				score.human(ROLE_ATTRIBUTE_WEIGHT, format!("attr:{name}={value}"));
			} else if rules.ai_attribute_values.contains(&value) {
				score.ai(ROLE_ATTRIBUTE_WEIGHT, format!("attr:{name}={value}"));
			}
		}

		let class = class_attr(el);
		if !class.is_empty() {
			if let Some(rule) = rules.human_classes.iter().find(|r| class.contains(&r.pattern)) {
				score.human(rule.weight, format!("class:{}", rule.pattern));
			}
			if let Some(rule) = rules.ai_classes.iter().find(|r| class.contains(&r.pattern)) {
				score.ai(rule.weight, format!("class:{}", rule.pattern));
			}
		}

		if score.human > 0.0 || score.ai > 0.0 {
			break;
		}
	}

	score
}

/// Characteristic phrasing of answers versus prompts.
pub(crate) fn lexical_signal(text: &str, rules: &ClassifierRules) -> Score {
	let mut score = Score::default();

	for rule in &rules.human_phrases {
		let hits = rule.regex.find_iter(text).count();
		if hits > 0 {
			score.human(rule.weight * hits as f32, format!("lexical-human:{}", rule.regex.as_str()));
		}
	}
	for rule in &rules.ai_phrases {
		let hits = rule.regex.find_iter(text).count();
		if hits > 0 {
			score.ai(rule.weight * hits as f32, format!("lexical-ai:{}", rule.regex.as_str()));
		}
	}

	score.human = score.human.min(LEXICAL_CAP);
	score.ai = score.ai.min(LEXICAL_CAP);
	score
}

/// Layout position supplied by the host plus structural fingerprints.
pub(crate) fn structural_signal(node: ElementRef<'_>, geometry: Option<&Geometry>, rules: &ClassifierRules) -> Score {
	let mut score = Score::default();

	if let Some(geometry) = geometry {
		match geometry.width_ratio() {
			Some(ratio) if ratio < 0.6 && geometry.right_aligned() => score.human(GEOMETRY_WEIGHT, "geometry:narrow-right"),
			Some(ratio) if ratio > 0.7 => score.ai(GEOMETRY_WEIGHT, "geometry:wide"),
			_ => {}
		}
	}

	let fingerprint = node.descendants().filter_map(ElementRef::wrap).find_map(|el| {
		let class = class_attr(el);
		rules.ai_fingerprints.iter().find(|f| class.contains(f.as_str()))
	});
	if let Some(fingerprint) = fingerprint {
		score.ai(FINGERPRINT_WEIGHT, format!("fingerprint:{fingerprint}"));
	}

	if near_input_control(node, rules) {
		score.human(1.0, "near-input");
	}

	score
}

fn near_input_control(node: ElementRef<'_>, rules: &ClassifierRules) -> bool {
	let selectors: Vec<Selector> = rules.input_controls.iter().filter_map(|s| Selector::parse(s).ok()).collect();
	if selectors.is_empty() {
		return false;
	}

	let mut current = node;
	for parent in ancestors(node, 2) {
		for sibling in element_children(parent).filter(|s| s.id() != current.id()) {
			if selectors.iter().any(|sel| sel.matches(&sibling) || sibling.select(sel).next().is_some()) {
				return true;
			}
		}
		current = parent;
	}
	false
}

/// Length, sentence count and structure of the text.
pub(crate) fn complexity_signal(node: ElementRef<'_>, text: &str) -> Score {
	let mut score = Score::default();
	let chars = text.chars().count();

	if chars > 200 {
		score.ai(1.0, "long-text");
	}
	if chars > 500 {
		score.ai(1.0, "very-long-text");
	}
	if SENTENCE_END.find_iter(text).count() >= 3 {
		score.ai(1.0, "multi-sentence");
	}

	let raw = crate::dom::raw_text(node);
	let has_list = node.descendants().filter_map(ElementRef::wrap).any(|el| el.value().name() == "li");
	if has_list || raw.contains(":\n") || raw.contains("：\n") || BULLET_LINE.is_match(&raw) {
		score.ai(1.0, "structured");
	}

	let has_code_or_link = node.descendants().filter_map(ElementRef::wrap).any(|el| matches!(el.value().name(), "code" | "pre" | "a"));
	if has_code_or_link {
		score.ai(1.0, "code-or-links");
	}

	if chars < 20 {
		score.human(1.0, "short-text");
	}

	score
}
